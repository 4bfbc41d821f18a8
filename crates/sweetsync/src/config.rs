//! CLI configuration: a thin wrapper around `sweetsync_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--server, --token, --timeout, --insecure).

use secrecy::SecretString;

use sweetsync_core::{AuthCredentials, SessionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use sweetsync_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile with flag overrides and file-wide defaults folded in.
///
/// Without a matching profile, `--server` alone is enough.
pub fn effective_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);

    let mut profile = match (config.profiles.get(&name), global.server.as_deref()) {
        (Some(profile), _) => profile.clone(),
        (None, Some(server)) => Profile::new(server),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(config),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    profile.insecure = Some(global.insecure || profile.insecure.unwrap_or(config.defaults.insecure));
    profile.timeout = global
        .timeout
        .or(profile.timeout)
        .or(Some(config.defaults.timeout));
    profile.reconnect_delay_secs = profile
        .reconnect_delay_secs
        .or(Some(config.defaults.reconnect_delay_secs));

    Ok((name, profile))
}

/// Connection settings only, for commands that authenticate themselves.
pub fn resolve_endpoint(global: &GlobalOpts, config: &Config) -> Result<SessionConfig, CliError> {
    let (_, profile) = effective_profile(global, config)?;
    Ok(sweetsync_config::profile_endpoint(&profile)?)
}

/// Full session config: endpoint plus credentials (`--token` first).
pub fn resolve_session_config(
    global: &GlobalOpts,
    config: &Config,
) -> Result<SessionConfig, CliError> {
    let (name, profile) = effective_profile(global, config)?;
    let endpoint = sweetsync_config::profile_endpoint(&profile)?;

    let auth = match global.token {
        Some(ref token) => AuthCredentials::Token(SecretString::from(token.clone())),
        None => sweetsync_config::resolve_auth(&profile, &name)?,
    };

    Ok(endpoint.with_auth(auth))
}

pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["sweetsync"];
        argv.extend_from_slice(args);
        argv.push("whoami");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with(name: &str, profile: Profile) -> Config {
        let mut config = Config::default();
        config.profiles.insert(name.into(), profile);
        config
    }

    #[test]
    fn server_flag_works_without_a_profile() {
        let (name, profile) =
            effective_profile(&global(&["--server", "http://127.0.0.1:8000/api"]), &Config::default())
                .unwrap();

        assert_eq!(name, "default");
        assert_eq!(profile.server, "http://127.0.0.1:8000/api");
        assert_eq!(profile.timeout, Some(30));
        assert_eq!(profile.reconnect_delay_secs, Some(3));
    }

    #[test]
    fn missing_everything_is_no_config() {
        let err = effective_profile(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }), "got: {err:?}");
    }

    #[test]
    fn unknown_named_profile_is_reported() {
        let config = config_with("shop", Profile::new("http://shop/api"));
        let err = effective_profile(&global(&["--profile", "nope"]), &config).unwrap_err();
        assert!(
            matches!(err, CliError::ProfileNotFound { ref available, .. } if available == "shop"),
            "got: {err:?}"
        );
    }

    #[test]
    fn flags_override_profile_values() {
        let mut profile = Profile::new("http://shop/api");
        profile.timeout = Some(5);
        let config = config_with("default", profile);

        let (_, merged) = effective_profile(
            &global(&["--server", "http://other/api", "--timeout", "9", "-k"]),
            &config,
        )
        .unwrap();

        assert_eq!(merged.server, "http://other/api");
        assert_eq!(merged.timeout, Some(9));
        assert_eq!(merged.insecure, Some(true));
    }

    #[test]
    fn token_flag_wins() {
        let config = config_with("default", Profile::new("http://shop/api"));
        let session = resolve_session_config(&global(&["--token", "abc"]), &config).unwrap();

        assert!(matches!(session.auth, AuthCredentials::Token(_)));
        assert_eq!(session.tls, sweetsync_core::TlsVerification::SystemDefaults);
        assert_eq!(session.timeout, std::time::Duration::from_secs(30));
    }
}
