// sweetsync-api: Async Rust client for the sweets inventory service (REST + push)

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod sweets;
pub mod transport;
pub mod websocket;

pub use auth::AccessToken;
pub use client::InventoryClient;
pub use error::Error;
pub use models::{
    DeletedRef, PushMessage, RegisteredUser, RemoteId, SearchParams, Sweet, SweetPatch,
    SweetPayload, UserProfile,
};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{
    ChannelState, Connector, FrameStream, NotificationStream, PushChannel, PushFrame,
    ReconnectConfig, WsConnector,
};
