//! CLI configuration: thin wrapper around `busmap_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--profile, --base-url, --timeout, --poll-interval).

use std::time::Duration;

use busmap_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use busmap_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_tile_api_key,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Validate a poll interval given in seconds.
pub fn poll_interval(secs: u64, field: &str) -> Result<Duration, CliError> {
    if secs == 0 {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Build a `ControllerConfig` from the config file, profile, and CLI
/// overrides.
///
/// Without a config file the built-in PVTA defaults apply, so every
/// command works out of the box. Naming a profile that doesn't exist is
/// an error.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    let mut config = busmap_config::profile_to_controller_config(&profile, &profile_name)?;

    // 1. Base URL (flag > env > profile)
    if let Some(ref url_str) = global.base_url {
        config.base_url = url_str.parse().map_err(|_| CliError::Validation {
            field: "base-url".into(),
            reason: format!("invalid URL: {url_str}"),
        })?;
    }

    // 2. Timeout (flag > profile > defaults)
    let timeout_secs = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(cfg.defaults.timeout);
    config.timeout = Duration::from_secs(timeout_secs);

    // 3. Poll interval (flag > profile); one-shot commands ignore it
    if let Some(secs) = global.poll_interval {
        config.poll_interval = poll_interval(secs, "poll-interval")?;
    }

    // Commands that need traces load them explicitly.
    config.trace_loading = false;

    Ok(config)
}
