//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// A copy of the config safe to print: plaintext secrets are masked.
fn redacted(cfg: &Config) -> Config {
    let mask = |secret: Option<&String>| secret.map(|_| MASK.to_string());
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: sweetsync_config::Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            ..cfg.defaults
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                let mut p = p.clone();
                p.password = mask(p.password.as_ref());
                p.token = mask(p.token.as_ref());
                (name.clone(), p)
            })
            .collect(),
    }
}

/// TOML-ish view for the table format. Expects an already redacted config.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out, "\n[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "reconnect_delay_secs = {}", cfg.defaults.reconnect_delay_secs);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out, "\n[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        let optional = [
            ("ws_url", p.ws_url.clone()),
            ("username", p.username.clone()),
            ("password", p.password.clone()),
            ("token", p.token.clone()),
            ("token_env", p.token_env.clone()),
            ("ca_cert", p.ca_cert.as_ref().map(|c| c.display().to_string())),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                let _ = writeln!(out, "{key} = \"{value}\"");
            }
        }
        let flags = [
            ("insecure", p.insecure.map(|v| v.to_string())),
            ("timeout", p.timeout.map(|v| v.to_string())),
            ("reconnect_delay_secs", p.reconnect_delay_secs.map(|v| v.to_string())),
            ("push", p.push.map(|v| v.to_string())),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                let _ = writeln!(out, "{key} = {value}");
            }
        }
    }

    out.trim_end().to_string()
}

fn keyring_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "keyring".into(),
        reason: e.to_string(),
    }
}

/// Offer to keep a secret in the keyring. Returns `Some(secret)` if the
/// user chose the config file instead.
fn prompt_storage(
    secret: String,
    label: &str,
    store: impl FnOnce(&str) -> Result<(), sweetsync_config::ConfigError>,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(util::prompt_err)?;

    if selection == 0 {
        store(&secret).map_err(keyring_err)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::SetToken { name } => {
            let cfg = config::load_config_or_default();
            let profile_name = name.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: config::available_profiles(&cfg),
                });
            }

            let token = util::prompt_secret("Token: ")?;
            sweetsync_config::store_token(&profile_name, &token).map_err(keyring_err)?;
            eprintln!("✓ Token stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("sweetsync configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(util::prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Service API URL")
        .default("http://127.0.0.1:8000/api".into())
        .interact_text()
        .map_err(util::prompt_err)?;
    sweetsync_config::parse_url("server", &server)?;

    let auth_choices = &[
        "Email + password (token fetched on connect)",
        "Existing bearer token",
        "None (read-only)",
    ];
    let auth_selection = Select::new()
        .with_prompt("Authentication")
        .items(auth_choices)
        .default(0)
        .interact()
        .map_err(util::prompt_err)?;

    let mut profile = Profile::new(server);
    match auth_selection {
        0 => {
            let username: String = Input::new()
                .with_prompt("Email")
                .interact_text()
                .map_err(util::prompt_err)?;
            let password = util::prompt_secret("Password: ")?;
            profile.password = prompt_storage(password, "password", |pw| {
                sweetsync_config::store_password(&profile_name, pw)
            })?;
            profile.username = Some(username);
        }
        1 => {
            let token = util::prompt_secret("Token: ")?;
            profile.token = prompt_storage(token, "token", |t| {
                sweetsync_config::store_token(&profile_name, t)
            })?;
        }
        _ => {}
    }

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: sweetsync items list");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_secrets() {
        let mut cfg = Config::default();
        let mut profile = Profile::new("http://shop/api");
        profile.username = Some("admin@shop.test".into());
        profile.password = Some("hunter2".into());
        profile.token = Some("tok-123".into());
        profile.push = Some(false);
        cfg.profiles.insert("shop".into(), profile);

        let text = format_config(&redacted(&cfg));

        assert!(!text.contains("hunter2"));
        assert!(!text.contains("tok-123"));
        assert!(text.contains("password = \"****\""));
        assert!(text.contains("username = \"admin@shop.test\""));
        assert!(text.contains("[profiles.shop]"));
        assert!(text.contains("push = false"));
    }
}
