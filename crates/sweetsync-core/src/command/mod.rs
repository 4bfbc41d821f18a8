// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The session
// routes each variant to its REST endpoint and applies the result to the
// store.

pub mod requests;

use crate::error::CoreError;
use crate::model::{Item, ItemId};

pub use requests::{CreateItemRequest, UpdateItemRequest, validate_restock_quantity};

/// All possible write operations against the inventory service.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateItem(CreateItemRequest),
    UpdateItem {
        id: ItemId,
        update: UpdateItemRequest,
    },
    DeleteItem {
        id: ItemId,
    },
    PurchaseItem {
        id: ItemId,
    },
    RestockItem {
        id: ItemId,
        quantity: u32,
    },
}

impl Command {
    /// Check the payload before sending it. Callers invoke this; execution
    /// doesn't.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::CreateItem(req) => req.validate(),
            Self::UpdateItem { update, .. } => update.validate(),
            Self::RestockItem { quantity, .. } => validate_restock_quantity(*quantity),
            Self::DeleteItem { .. } | Self::PurchaseItem { .. } => Ok(()),
        }
    }

    /// The item this command targets, if it already exists.
    pub fn target(&self) -> Option<&ItemId> {
        match self {
            Self::CreateItem(_) => None,
            Self::UpdateItem { id, .. }
            | Self::DeleteItem { id }
            | Self::PurchaseItem { id }
            | Self::RestockItem { id, .. } => Some(id),
        }
    }
}

/// Outcome of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// The item as the service reports it after the change.
    Item(Item),
    Deleted(ItemId),
}
