// Wire types for the inventory service.
//
// These mirror the JSON the service sends and accepts. Unknown fields are
// ignored so that server-side additions don't break decoding.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned identifier. The reference service emits integers, but
/// nothing in the protocol forbids string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Int(i64),
    Str(String),
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// An inventory item as returned by `/sweets` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweet {
    pub id: RemoteId,
    pub name: String,
    pub category: String,
    #[serde(deserialize_with = "non_negative_price")]
    pub price: f64,
    pub quantity: u32,
}

fn non_negative_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let price = f64::deserialize(deserializer)?;
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(serde::de::Error::custom(format!(
            "price must be a non-negative number, got {price}"
        )))
    }
}

/// Body for `POST /sweets`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweetPayload {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: u32,
}

/// Body for `PUT /sweets/{id}`. Unset fields are omitted from the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// Body for `POST /sweets/{id}/restock`.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct RestockBody {
    pub quantity: u32,
}

/// Query parameters for `GET /sweets/search`. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

// ── Auth ────────────────────────────────────────────────────────────

/// Response from `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".into()
}

/// The authenticated account, from `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: RemoteId,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Response from `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredUser {
    pub id: RemoteId,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

// ── Push ────────────────────────────────────────────────────────────

/// Payload of a `deleted` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRef {
    pub id: RemoteId,
}

/// A decoded push frame: `{"type": <kind>, "data": <payload>}`.
///
/// Any other `type` value fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    Created(Sweet),
    Updated(Sweet),
    Purchased(Sweet),
    Restocked(Sweet),
    Deleted(DeletedRef),
}

impl PushMessage {
    /// The notification kind as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Purchased(_) => "purchased",
            Self::Restocked(_) => "restocked",
            Self::Deleted(_) => "deleted",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_item_notification_and_ignores_extra_fields() {
        let raw = r#"{"type":"purchased","data":{"id":1,"name":"Fudge","category":"Candy","price":2.5,"quantity":4,"owner_id":7}}"#;
        let msg: PushMessage = serde_json::from_str(raw).unwrap();
        let PushMessage::Purchased(sweet) = msg else {
            panic!("expected purchased, got {msg:?}");
        };
        assert_eq!(sweet.id, RemoteId::Int(1));
        assert_eq!(sweet.quantity, 4);
    }

    #[test]
    fn decodes_deleted_notification() {
        let msg: PushMessage = serde_json::from_str(r#"{"type":"deleted","data":{"id":"abc"}}"#).unwrap();
        assert_eq!(
            msg,
            PushMessage::Deleted(DeletedRef {
                id: RemoteId::Str("abc".into())
            })
        );
        assert_eq!(msg.kind(), "deleted");
    }

    #[test]
    fn rejects_unknown_kind_and_bad_payloads() {
        assert!(serde_json::from_str::<PushMessage>(r#"{"type":"renamed","data":{"id":1}}"#).is_err());
        assert!(serde_json::from_str::<PushMessage>(r#"{"type":"created","data":{"id":1}}"#).is_err());
        assert!(
            serde_json::from_str::<PushMessage>(
                r#"{"type":"updated","data":{"id":1,"name":"X","category":"Y","price":1.0,"quantity":-2}}"#
            )
            .is_err()
        );
        assert!(serde_json::from_str::<PushMessage>("not json").is_err());
    }

    #[test]
    fn rejects_negative_price() {
        let raw = r#"{"type":"restocked","data":{"id":1,"name":"X","category":"Y","price":-0.5,"quantity":2}}"#;
        let err = serde_json::from_str::<PushMessage>(raw).unwrap_err();
        assert!(err.to_string().contains("non-negative"), "got: {err}");

        let free = r#"{"id":1,"name":"X","category":"Y","price":0,"quantity":2}"#;
        assert!(serde_json::from_str::<Sweet>(free).unwrap().price.abs() < f64::EPSILON);
    }

    #[test]
    fn patch_omits_unset_fields() {
        let patch = SweetPatch {
            price: Some(3.0),
            ..SweetPatch::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"price":3.0}"#);
    }
}
