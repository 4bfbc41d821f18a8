// ── Domain model ──

mod item;
mod notification;
mod user;

pub use item::{Item, ItemId};
pub use notification::{Notification, NotificationKind};
pub use user::User;
