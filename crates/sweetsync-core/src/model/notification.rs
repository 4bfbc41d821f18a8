// ── Push notifications ──
//
// A decoded change report from the service: a kind plus either the full
// item after the change or, for deletions, just its id.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::item::{Item, ItemId};

/// What happened to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Created,
    Updated,
    Purchased,
    Restocked,
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Created(Item),
    Updated(Item),
    Purchased(Item),
    Restocked(Item),
    Deleted { id: ItemId },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::Created(_) => NotificationKind::Created,
            Self::Updated(_) => NotificationKind::Updated,
            Self::Purchased(_) => NotificationKind::Purchased,
            Self::Restocked(_) => NotificationKind::Restocked,
            Self::Deleted { .. } => NotificationKind::Deleted,
        }
    }

    pub fn item_id(&self) -> &ItemId {
        match self {
            Self::Created(item)
            | Self::Updated(item)
            | Self::Purchased(item)
            | Self::Restocked(item) => &item.id,
            Self::Deleted { id } => id,
        }
    }
}
