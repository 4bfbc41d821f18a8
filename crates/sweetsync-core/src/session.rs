// ── Inventory session ──
//
// Full lifecycle for one connection to an inventory service: token
// acquisition, initial fetch, push channel + reconciler, command routing,
// the displayed projection, and teardown.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use sweetsync_api::transport::{TlsMode, TransportConfig};
use sweetsync_api::websocket::derive_ws_url;
use sweetsync_api::{
    ChannelState, Connector, InventoryClient, PushChannel, ReconnectConfig, SearchParams,
    SweetPatch, SweetPayload, WsConnector,
};

use crate::command::{Command, CommandResult, CreateItemRequest, UpdateItemRequest};
use crate::config::{AuthCredentials, SessionConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{Item, ItemId, User};
use crate::reconcile::Reconciler;
use crate::store::InventoryStore;
use crate::stream::{DisplayedStream, EntityStream, ItemFilter, SearchFilter, Snapshot};

// ── InventorySession ─────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`. A session is single-use:
/// after [`teardown`](Self::teardown) it can't be reconnected.
#[derive(Clone)]
pub struct InventorySession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    store: Arc<InventoryStore>,
    /// Applies local mutation results. The push-side reconciler runs on
    /// its own task.
    reconciler: Reconciler,
    filter: watch::Sender<Arc<ItemFilter>>,
    cancel: CancellationToken,
    connector: Option<Arc<dyn Connector>>,
    client: Mutex<Option<Arc<InventoryClient>>>,
    push: Mutex<Option<PushChannel>>,
    channel_state: OnceLock<watch::Receiver<ChannelState>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl InventorySession {
    /// Create a session from configuration. Does NOT connect; call
    /// [`connect()`](Self::connect) to authenticate and start syncing.
    pub fn new(config: SessionConfig) -> Self {
        Self::build(config, None)
    }

    /// Like [`new`](Self::new), but push frames come from `connector`
    /// instead of a WebSocket.
    pub fn with_connector(config: SessionConfig, connector: Arc<dyn Connector>) -> Self {
        Self::build(config, Some(connector))
    }

    fn build(config: SessionConfig, connector: Option<Arc<dyn Connector>>) -> Self {
        let store = Arc::new(InventoryStore::new());
        let (filter, _) = watch::channel(Arc::new(ItemFilter::All));

        Self {
            inner: Arc::new(SessionInner {
                config,
                reconciler: Reconciler::new(Arc::clone(&store)),
                store,
                filter,
                cancel: CancellationToken::new(),
                connector,
                client: Mutex::new(None),
                push: Mutex::new(None),
                channel_state: OnceLock::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<InventoryStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Authenticate, open the push channel (when enabled), and load the
    /// full inventory.
    ///
    /// The push channel is started before the initial fetch so changes
    /// committed while the listing is in flight still arrive.
    pub async fn connect(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Disconnected);
        }
        if self.inner.client.lock().await.is_some() {
            debug!("session already connected");
            return Ok(());
        }

        let config = &self.inner.config;
        let client = InventoryClient::new(config.url.clone(), &build_transport(config))?;

        match &config.auth {
            AuthCredentials::Anonymous => debug!("no credentials configured, connecting anonymously"),
            AuthCredentials::Token(token) => client.set_token(token.clone()),
            AuthCredentials::Credentials { username, password } => {
                let token = client.login(username, password).await?;
                client.set_token(token.into_secret());
            }
        }

        let client = Arc::new(client);
        *self.inner.client.lock().await = Some(Arc::clone(&client));

        if config.push_enabled {
            self.start_push(&client).await?;
        }

        if let Err(e) = self.refresh().await {
            self.teardown().await;
            return Err(e);
        }

        info!(items = self.inner.store.len(), url = %config.url, "session connected");
        Ok(())
    }

    async fn start_push(&self, client: &InventoryClient) -> Result<(), CoreError> {
        let config = &self.inner.config;
        let connector: Arc<dyn Connector> = match &self.inner.connector {
            Some(connector) => Arc::clone(connector),
            None => {
                let ws_url = match &config.ws_url {
                    Some(url) => url.clone(),
                    None => derive_ws_url(&config.url)?,
                };
                Arc::new(WsConnector::new(ws_url, client.token()))
            }
        };

        let cancel = self.inner.cancel.child_token();
        let reconnect = ReconnectConfig {
            delay: config.reconnect_delay,
        };
        let (channel, notifications) = PushChannel::spawn(connector, reconnect, cancel.clone());

        let state = channel.state();
        let _ = self.inner.channel_state.set(state.clone());

        let reconciler = Reconciler::new(Arc::clone(&self.inner.store)).with_channel_state(state);
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(reconciler.run(notifications, cancel)));
        *self.inner.push.lock().await = Some(channel);

        debug!("push channel started");
        Ok(())
    }

    /// Tear the session down.
    ///
    /// Stops the push channel (no reconnect fires afterwards), waits for
    /// the reconciler, forgets the token, and clears the store. Mutations
    /// still in flight complete for their callers but are not applied.
    pub async fn teardown(&self) {
        self.inner.cancel.cancel();

        let channel = self.inner.push.lock().await.take();
        if let Some(channel) = channel {
            channel.shutdown();
            channel.join().await;
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        let client = self.inner.client.lock().await.take();
        if let Some(client) = client {
            client.clear_token();
        }

        self.inner.store.clear();
        self.inner.filter.send_replace(Arc::new(ItemFilter::All));
        debug!("session torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Re-fetch the whole inventory and swap it into the store.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let client = self.client().await?;
        let items: Vec<Item> = client
            .list_sweets()
            .await?
            .into_iter()
            .map(Item::from)
            .collect();

        if self.is_torn_down() {
            debug!("session torn down, dropping refresh result");
            return Ok(());
        }

        self.inner.store.apply_full_snapshot(items);
        debug!(items = self.inner.store.len(), "inventory refresh complete");
        Ok(())
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a write against the service and apply its result to the
    /// store before returning.
    ///
    /// Commands are not validated here; call [`Command::validate`] first.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let client = self.client().await?;
        let target = cmd.target().cloned();

        let result = route_command(&client, cmd).await.map_err(|e| match &target {
            Some(id) => e.for_item(id),
            None => e,
        })?;

        // Teardown takes the client before clearing the store, so applying
        // under the client lock never lands in a cleared store.
        let live = self.inner.client.lock().await;
        if live.is_none() || self.is_torn_down() {
            debug!("session torn down, mutation result not applied");
        } else {
            self.inner.reconciler.apply_local(&result);
        }
        drop(live);
        Ok(result)
    }

    pub async fn create_item(&self, req: CreateItemRequest) -> Result<Item, CoreError> {
        expect_item(self.execute(Command::CreateItem(req)).await?)
    }

    pub async fn update_item(&self, id: ItemId, update: UpdateItemRequest) -> Result<Item, CoreError> {
        expect_item(self.execute(Command::UpdateItem { id, update }).await?)
    }

    pub async fn delete_item(&self, id: ItemId) -> Result<(), CoreError> {
        self.execute(Command::DeleteItem { id }).await.map(drop)
    }

    pub async fn purchase(&self, id: ItemId) -> Result<Item, CoreError> {
        expect_item(self.execute(Command::PurchaseItem { id }).await?)
    }

    pub async fn restock(&self, id: ItemId, quantity: u32) -> Result<Item, CoreError> {
        expect_item(self.execute(Command::RestockItem { id, quantity }).await?)
    }

    // ── Search & displayed projection ────────────────────────────

    /// Ask the service for matching items and make `filter` the displayed
    /// projection. The store itself is left alone.
    pub async fn search(&self, filter: SearchFilter) -> Result<Vec<Item>, CoreError> {
        let client = self.client().await?;
        let items: Vec<Item> = client
            .search_sweets(&SearchParams::from(&filter))
            .await?
            .into_iter()
            .map(Item::from)
            .collect();

        let projection = if filter.is_empty() {
            ItemFilter::All
        } else {
            ItemFilter::Search(filter)
        };
        self.inner.filter.send_replace(Arc::new(projection));
        Ok(items)
    }

    /// Back to the unfiltered view.
    pub fn reset_search(&self) {
        self.set_filter(ItemFilter::All);
    }

    /// Replace the displayed projection with an arbitrary filter.
    pub fn set_filter(&self, filter: ItemFilter) {
        self.inner.filter.send_replace(Arc::new(filter));
    }

    pub fn filter(&self) -> Arc<ItemFilter> {
        self.inner.filter.borrow().clone()
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn items(&self) -> Snapshot<Item> {
        self.inner.store.all()
    }

    /// The store seen through the active filter.
    pub fn displayed(&self) -> Snapshot<Item> {
        DisplayedStream::new(self.inner.store.subscribe_raw(), self.inner.filter.subscribe()).latest()
    }

    pub fn get(&self, id: &ItemId) -> Option<Arc<Item>> {
        self.inner.store.get(id)
    }

    /// Client-side purchase pre-check: the item is known and in stock.
    /// Advisory only; purchases are never blocked on it.
    pub fn can_purchase(&self, id: &ItemId) -> bool {
        self.inner.store.get(id).is_some_and(|item| item.in_stock())
    }

    pub fn subscribe_items(&self) -> EntityStream<Item> {
        self.inner.store.subscribe()
    }

    pub fn subscribe_displayed(&self) -> DisplayedStream {
        DisplayedStream::new(self.inner.store.subscribe_raw(), self.inner.filter.subscribe())
    }

    // ── State observation ────────────────────────────────────────

    /// Push channel state, once the channel has been started.
    pub fn channel_state(&self) -> Option<watch::Receiver<ChannelState>> {
        self.inner.channel_state.get().cloned()
    }

    /// True only while the push channel is open.
    pub fn is_live(&self) -> bool {
        self.inner
            .channel_state
            .get()
            .is_some_and(|rx| rx.borrow().is_open())
    }

    /// The account the session's token belongs to.
    pub async fn whoami(&self) -> Result<User, CoreError> {
        let client = self.client().await?;
        Ok(client.me().await?.into())
    }

    // ── Account helpers ──────────────────────────────────────────

    /// Exchange credentials for a bearer token without opening a session.
    pub async fn authenticate(
        config: &SessionConfig,
        username: &str,
        password: &SecretString,
    ) -> Result<SecretString, CoreError> {
        let client = InventoryClient::new(config.url.clone(), &build_transport(config))?;
        Ok(client.login(username, password).await?.into_secret())
    }

    /// Create an account.
    pub async fn register(
        config: &SessionConfig,
        email: &str,
        password: &SecretString,
    ) -> Result<User, CoreError> {
        let client = InventoryClient::new(config.url.clone(), &build_transport(config))?;
        let registered = client.register(email, password).await?;
        Ok(User {
            id: registered.id.to_string(),
            email: registered.email,
            role: None,
        })
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, tear down.
    ///
    /// Disables the push channel since a single request/response cycle
    /// doesn't need it.
    pub async fn oneshot<F, Fut, T>(config: SessionConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(InventorySession) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let session = InventorySession::new(config.without_push());
        session.connect().await?;
        let result = f(session.clone()).await;
        session.teardown().await;
        result
    }

    async fn client(&self) -> Result<Arc<InventoryClient>, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(CoreError::Disconnected)
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(client: &InventoryClient, cmd: Command) -> Result<CommandResult, CoreError> {
    match cmd {
        Command::CreateItem(req) => {
            let sweet = client.create_sweet(&SweetPayload::from(&req)).await?;
            Ok(CommandResult::Item(sweet.into()))
        }
        Command::UpdateItem { id, update } => {
            let sweet = client
                .update_sweet(&id.to_string(), &SweetPatch::from(&update))
                .await?;
            Ok(CommandResult::Item(sweet.into()))
        }
        Command::DeleteItem { id } => {
            client.delete_sweet(&id.to_string()).await?;
            Ok(CommandResult::Deleted(id))
        }
        Command::PurchaseItem { id } => {
            let sweet = client.purchase_sweet(&id.to_string()).await?;
            Ok(CommandResult::Item(sweet.into()))
        }
        Command::RestockItem { id, quantity } => {
            let sweet = client.restock_sweet(&id.to_string(), quantity).await?;
            Ok(CommandResult::Item(sweet.into()))
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn expect_item(result: CommandResult) -> Result<Item, CoreError> {
    match result {
        CommandResult::Item(item) => Ok(item),
        CommandResult::Deleted(id) => Err(CoreError::Internal(format!(
            "expected an item, got deletion of {id}"
        ))),
    }
}

fn build_transport(config: &SessionConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
