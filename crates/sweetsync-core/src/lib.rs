// sweetsync-core: reactive inventory store, reconciliation and session
// management on top of sweetsync-api.

pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{
    Command, CommandResult, CreateItemRequest, UpdateItemRequest, validate_restock_quantity,
};
pub use config::{AuthCredentials, SessionConfig, TlsVerification};
pub use error::CoreError;
pub use model::{Item, ItemId, Notification, NotificationKind, User};
pub use reconcile::Reconciler;
pub use session::InventorySession;
pub use store::InventoryStore;
pub use stream::{DisplayedStream, EntityStream, EntityWatchStream, ItemFilter, SearchFilter, Snapshot};

// Push channel types surface through the session API.
pub use sweetsync_api::ChannelState;
