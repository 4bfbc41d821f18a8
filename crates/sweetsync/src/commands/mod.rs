//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod items;
pub mod util;
pub mod watch;

use sweetsync_core::InventorySession;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &InventorySession,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Items(args) => items::handle(session, args, global).await,
        Command::Watch(args) => watch::handle(session, args, global).await,
        Command::Whoami => auth::whoami(session, global).await,
        // Handled before a session exists
        Command::Login(_) | Command::Register(_) | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Internal(
                "command does not run inside a session".into(),
            ))
        }
    }
}
