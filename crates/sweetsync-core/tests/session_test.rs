#![allow(clippy::unwrap_used)]
// End-to-end session tests: wiremock for REST, a channel-fed connector for
// push frames.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt, stream};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sweetsync_api::{Connector, Error, FrameStream, PushFrame};
use sweetsync_core::{
    AuthCredentials, ChannelState, CoreError, InventorySession, ItemId, SearchFilter,
    SessionConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Hands the test's frame receiver to the first connection; later
/// connections idle forever.
struct ChannelConnector {
    frames: Mutex<Option<mpsc::UnboundedReceiver<PushFrame>>>,
}

impl Connector for ChannelConnector {
    fn connect(&self) -> BoxFuture<'_, Result<FrameStream, Error>> {
        let rx = self.frames.lock().unwrap().take();
        async move {
            Ok(match rx {
                Some(rx) => UnboundedReceiverStream::new(rx).map(Ok).boxed(),
                None => stream::pending().boxed(),
            })
        }
        .boxed()
    }
}

struct Harness {
    server: MockServer,
    session: InventorySession,
    push: mpsc::UnboundedSender<PushFrame>,
}

impl Harness {
    async fn start(initial: serde_json::Value) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sweets"))
            .and(header("authorization", "Bearer tok-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(initial))
            .mount(&server)
            .await;

        let (push, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(ChannelConnector {
            frames: Mutex::new(Some(rx)),
        });
        let session = InventorySession::with_connector(config(&server), connector);
        session.connect().await.unwrap();

        let mut state = session.channel_state().unwrap();
        within(state.wait_for(|s| s.is_open())).await.unwrap();

        Self {
            server,
            session,
            push,
        }
    }

    fn send(&self, frame: &serde_json::Value) {
        self.push.send(PushFrame::Text(frame.to_string())).unwrap();
    }

    fn quantity(&self, id: i64) -> Option<u32> {
        self.session.get(&ItemId::Numeric(id)).map(|i| i.quantity)
    }

    /// Wait until the store satisfies `pred`.
    async fn settle(&self, pred: impl Fn(&InventorySession) -> bool) {
        let mut items = self.session.subscribe_items();
        within(async {
            while !pred(&self.session) {
                if items.changed().await.is_none() {
                    break;
                }
            }
        })
        .await;
        assert!(pred(&self.session), "store never reached the expected state");
    }
}

fn config(server: &MockServer) -> SessionConfig {
    let url = Url::parse(&format!("{}/api", server.uri())).unwrap();
    SessionConfig::new(url).with_auth(AuthCredentials::Token("tok-test".to_string().into()))
}

async fn within<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out")
}

fn sweet(id: i64, name: &str, category: &str, quantity: u32) -> serde_json::Value {
    json!({"id": id, "name": name, "category": category, "price": 2.5, "quantity": quantity})
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_initial_fetch_then_push_purchase() {
    let h = Harness::start(json!([sweet(1, "Fudge", "Candy", 5)])).await;
    assert_eq!(h.quantity(1), Some(5));
    assert!(h.session.is_live());

    h.send(&json!({"type": "purchased", "data": sweet(1, "Fudge", "Candy", 4)}));
    h.settle(|s| s.get(&ItemId::Numeric(1)).is_some_and(|i| i.quantity == 4))
        .await;

    assert_eq!(h.session.items().len(), 1);
    assert!(h.session.store().last_push_event().is_some());
    assert!(h.session.store().last_full_refresh().is_some());
}

#[tokio::test]
async fn test_push_create_and_delete() {
    let h = Harness::start(json!([sweet(1, "Fudge", "Candy", 5)])).await;

    h.send(&json!({"type": "created", "data": sweet(2, "Toffee", "Candy", 3)}));
    h.send(&json!({"type": "deleted", "data": {"id": 1}}));
    h.send(&json!({"type": "deleted", "data": {"id": 999}}));
    h.settle(|s| s.items().len() == 1 && s.get(&ItemId::Numeric(2)).is_some())
        .await;

    assert_eq!(h.quantity(1), None);
}

#[tokio::test]
async fn test_malformed_frame_does_not_break_the_channel() {
    let h = Harness::start(json!([sweet(1, "Fudge", "Candy", 5)])).await;

    h.push.send(PushFrame::Text("definitely not json".into())).unwrap();
    h.send(&json!({"type": "restocked", "data": sweet(1, "Fudge", "Candy", 50)}));
    h.settle(|s| s.get(&ItemId::Numeric(1)).is_some_and(|i| i.quantity == 50))
        .await;

    assert_eq!(
        *h.session.channel_state().unwrap().borrow(),
        ChannelState::Open
    );
}

#[tokio::test]
async fn test_local_purchase_applies_response() {
    let h = Harness::start(json!([sweet(1, "Fudge", "Candy", 5)])).await;

    Mock::given(method("POST"))
        .and(path("/api/sweets/1/purchase"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sweet(1, "Fudge", "Candy", 4)))
        .mount(&h.server)
        .await;

    let item = h.session.purchase(ItemId::Numeric(1)).await.unwrap();

    assert_eq!(item.quantity, 4);
    assert_eq!(h.quantity(1), Some(4));
}

#[tokio::test]
async fn test_rejected_purchase_leaves_store_untouched() {
    let h = Harness::start(json!([sweet(1, "Fudge", "Candy", 0)])).await;
    assert!(!h.session.can_purchase(&ItemId::Numeric(1)));
    let before = h.session.store().version();

    Mock::given(method("POST"))
        .and(path("/api/sweets/1/purchase"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Out of stock"})))
        .mount(&h.server)
        .await;

    let err = h.session.purchase(ItemId::Numeric(1)).await.unwrap_err();

    assert!(
        matches!(err, CoreError::Rejected { status: 400, ref message } if message == "Out of stock"),
        "got: {err:?}"
    );
    assert_eq!(h.quantity(1), Some(0));
    assert_eq!(h.session.store().version(), before);
}

#[tokio::test]
async fn test_update_of_missing_item_reports_its_id() {
    let h = Harness::start(json!([])).await;

    Mock::given(method("PUT"))
        .and(path("/api/sweets/41"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Sweet not found"})))
        .mount(&h.server)
        .await;

    let update = sweetsync_core::UpdateItemRequest {
        price: Some(1.0),
        ..Default::default()
    };
    let err = h
        .session
        .update_item(ItemId::Numeric(41), update)
        .await
        .unwrap_err();

    assert!(
        matches!(err, CoreError::ItemNotFound { ref identifier } if identifier == "41"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn test_delete_removes_from_store() {
    let h = Harness::start(json!([sweet(1, "Fudge", "Candy", 5), sweet(2, "Toffee", "Candy", 1)])).await;

    Mock::given(method("DELETE"))
        .and(path("/api/sweets/2"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    h.session.delete_item(ItemId::Numeric(2)).await.unwrap();

    assert_eq!(h.session.items().len(), 1);
    assert_eq!(h.quantity(2), None);
}

#[tokio::test]
async fn test_search_projects_without_touching_store() {
    let h = Harness::start(json!([
        sweet(1, "Fudge", "Candy", 5),
        sweet(2, "Lemonade", "Drink", 8)
    ]))
    .await;

    Mock::given(method("GET"))
        .and(path("/api/sweets/search"))
        .and(query_param("category", "Candy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([sweet(1, "Fudge", "Candy", 5)])))
        .mount(&h.server)
        .await;

    let mut displayed = h.session.subscribe_displayed();
    assert_eq!(displayed.current().len(), 2);

    let found = h
        .session
        .search(SearchFilter {
            category: Some("Candy".into()),
            ..SearchFilter::default()
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(h.session.items().len(), 2);
    let view = within(displayed.changed()).await.unwrap();
    assert_eq!(view.len(), 1);

    // Live updates to matching items flow into the projection.
    h.send(&json!({"type": "updated", "data": sweet(1, "Fudge", "Candy", 9)}));
    within(async {
        loop {
            let view = displayed.changed().await.unwrap();
            if view.first().is_some_and(|i| i.quantity == 9) {
                break;
            }
        }
    })
    .await;

    h.session.reset_search();
    assert_eq!(h.session.displayed().len(), 2);
}

#[tokio::test]
async fn test_teardown_clears_everything() {
    let h = Harness::start(json!([sweet(1, "Fudge", "Candy", 5)])).await;
    let state = h.session.channel_state().unwrap();

    h.session.teardown().await;

    assert!(h.session.items().is_empty());
    assert!(state.borrow().is_terminal());
    assert!(!h.session.is_live());
    assert!(matches!(
        h.session.purchase(ItemId::Numeric(1)).await,
        Err(CoreError::Disconnected)
    ));
    assert!(matches!(h.session.connect().await, Err(CoreError::Disconnected)));
}

#[tokio::test]
async fn test_mutation_finishing_after_teardown_is_not_applied() {
    let h = Harness::start(json!([sweet(1, "Fudge", "Candy", 5)])).await;

    Mock::given(method("POST"))
        .and(path("/api/sweets/1/purchase"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sweet(1, "Fudge", "Candy", 4))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&h.server)
        .await;

    let session = h.session.clone();
    let in_flight = tokio::spawn(async move { session.purchase(ItemId::Numeric(1)).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    h.session.teardown().await;
    let item = within(in_flight).await.unwrap().unwrap();

    assert_eq!(item.quantity, 4);
    assert!(h.session.items().is_empty());
    assert!(h.session.get(&ItemId::Numeric(1)).is_none());
}

#[tokio::test]
async fn test_credentials_are_exchanged_for_a_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-test",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sweets"))
        .and(header("authorization", "Bearer tok-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([sweet(3, "Nougat", "Candy", 2)])))
        .mount(&server)
        .await;

    let cfg = config(&server).with_auth(AuthCredentials::Credentials {
        username: "admin@shop.test".into(),
        password: "pw".to_string().into(),
    });

    let count = InventorySession::oneshot(cfg, |session| async move {
        assert!(session.channel_state().is_none());
        Ok(session.items().len())
    })
    .await
    .unwrap();

    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_bad_credentials_fail_connect() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect email or password"})),
        )
        .mount(&server)
        .await;

    let cfg = config(&server).with_auth(AuthCredentials::Credentials {
        username: "admin@shop.test".into(),
        password: "nope".to_string().into(),
    });
    let session = InventorySession::new(cfg.without_push());

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }), "got: {err:?}");
}
