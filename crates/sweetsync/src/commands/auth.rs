//! Account command handlers: login, register, whoami.

use std::fmt::Write as _;

use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};

use sweetsync_core::{InventorySession, User};

use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util;

fn user_detail(user: &User) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:     {}", user.id);
    let _ = write!(out, "Email:  {}", user.email);
    if let Some(ref role) = user.role {
        let _ = write!(out, "\nRole:   {role}");
    }
    out
}

fn print_user(global: &GlobalOpts, user: &User) -> Result<(), CliError> {
    let out = output::render_single(global.output, user, user_detail, |u| u.email.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Password from `SWEETSYNC_PASSWORD`, else an interactive prompt.
fn read_password() -> Result<SecretString, CliError> {
    if let Ok(pw) = std::env::var("SWEETSYNC_PASSWORD") {
        return Ok(SecretString::from(pw));
    }
    util::prompt_secret("Password: ").map(SecretString::from)
}

pub async fn login(args: LoginArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let (profile_name, profile) = config::effective_profile(global, cfg)?;
    let endpoint = sweetsync_config::profile_endpoint(&profile)?;

    let username = match args.username.or(profile.username) {
        Some(username) => username,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(util::prompt_err)?,
    };
    let password = read_password()?;

    let spinner = util::spinner(format!("Logging in as {username}"), global.quiet);
    let token = InventorySession::authenticate(&endpoint, &username, &password).await;
    spinner.finish_and_clear();
    let token = token?;

    if args.save {
        sweetsync_config::store_token(&profile_name, token.expose_secret())?;
        if !global.quiet {
            eprintln!("✓ Token stored in system keyring for profile '{profile_name}'");
        }
    } else {
        output::print_output(token.expose_secret(), global.quiet);
    }
    Ok(())
}

pub async fn register(args: RegisterArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let endpoint = config::resolve_endpoint(global, cfg)?;

    let password = read_password()?;
    if std::env::var("SWEETSYNC_PASSWORD").is_err() {
        let again = util::prompt_secret("Repeat password: ")?;
        if again != *password.expose_secret() {
            return Err(CliError::Validation {
                field: "password".into(),
                reason: "passwords do not match".into(),
            });
        }
    }

    let user = InventorySession::register(&endpoint, &args.email, &password).await?;
    if !global.quiet {
        eprintln!("✓ Account created. Log in with: sweetsync login -u {}", user.email);
    }
    print_user(global, &user)
}

pub async fn whoami(session: &InventorySession, global: &GlobalOpts) -> Result<(), CliError> {
    let user = session.whoami().await?;
    print_user(global, &user)
}
