// ── Wire ↔ domain conversions ──

use sweetsync_api::{
    PushMessage, RemoteId, SearchParams, Sweet, SweetPatch, SweetPayload, UserProfile,
};

use crate::command::{CreateItemRequest, UpdateItemRequest};
use crate::model::{Item, ItemId, Notification, User};
use crate::stream::SearchFilter;

impl From<RemoteId> for ItemId {
    fn from(id: RemoteId) -> Self {
        match id {
            RemoteId::Int(n) => Self::Numeric(n),
            RemoteId::Str(s) => Self::from(s),
        }
    }
}

impl From<Sweet> for Item {
    fn from(s: Sweet) -> Self {
        Self {
            id: s.id.into(),
            name: s.name,
            category: s.category,
            price: s.price,
            quantity: s.quantity,
        }
    }
}

impl From<PushMessage> for Notification {
    fn from(msg: PushMessage) -> Self {
        match msg {
            PushMessage::Created(s) => Self::Created(s.into()),
            PushMessage::Updated(s) => Self::Updated(s.into()),
            PushMessage::Purchased(s) => Self::Purchased(s.into()),
            PushMessage::Restocked(s) => Self::Restocked(s.into()),
            PushMessage::Deleted(r) => Self::Deleted { id: r.id.into() },
        }
    }
}

impl From<UserProfile> for User {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id.to_string(),
            email: p.email,
            role: p.role,
        }
    }
}

impl From<&CreateItemRequest> for SweetPayload {
    fn from(req: &CreateItemRequest) -> Self {
        Self {
            name: req.name.clone(),
            category: req.category.clone(),
            price: req.price,
            quantity: req.quantity,
        }
    }
}

impl From<&UpdateItemRequest> for SweetPatch {
    fn from(req: &UpdateItemRequest) -> Self {
        Self {
            name: req.name.clone(),
            category: req.category.clone(),
            price: req.price,
            quantity: req.quantity,
        }
    }
}

impl From<&SearchFilter> for SearchParams {
    fn from(f: &SearchFilter) -> Self {
        Self {
            name: f.name().map(str::to_owned),
            category: f.category().map(str::to_owned),
            min_price: f.min_price,
            max_price: f.max_price,
        }
    }
}
