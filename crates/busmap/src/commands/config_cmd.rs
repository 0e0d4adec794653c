//! Config subcommand handlers.

use dialoguer::{Input, Select};

use busmap_core::config::DEFAULT_BASE_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_tile_key() -> Result<String, CliError> {
    let key = rpassword::prompt_password("Tile API key: ").map_err(prompt_err)?;
    if key.trim().is_empty() {
        return Err(CliError::Validation {
            field: "tile_api_key".into(),
            reason: "tile API key cannot be empty".into(),
        });
    }
    Ok(key.trim().to_owned())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("busmap configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. InfoPoint URL
            let base_url: String = Input::new()
                .with_prompt("InfoPoint URL")
                .default(DEFAULT_BASE_URL.into())
                .interact_text()
                .map_err(prompt_err)?;
            if url::Url::parse(&base_url).is_err() {
                return Err(CliError::Validation {
                    field: "base_url".into(),
                    reason: format!("invalid URL: {base_url}"),
                });
            }

            // 3. Optional tile key
            let key_choices = &[
                "No tile API key",
                "Store key in system keyring (recommended)",
                "Save key to config file (plaintext)",
            ];
            let key_selection = Select::new()
                .with_prompt("Map tile API key")
                .items(key_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let tile_api_key = match key_selection {
                1 => {
                    let key = prompt_tile_key()?;
                    config::store_tile_api_key(&profile_name, &key)?;
                    eprintln!("   Tile API key stored in system keyring");
                    None
                }
                2 => Some(prompt_tile_key()?),
                _ => None,
            };

            // 4. Build profile and config, keeping any other profiles
            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    base_url,
                    tile_api_key,
                    ..Profile::default()
                },
            );
            cfg.default_profile = Some(profile_name.clone());

            config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: busmap routes list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                global.output,
                &cfg,
                |c| show_detail(c, global),
                |_| "config".into(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Set tile key ────────────────────────────────────────────
        ConfigCommand::SetTileKey => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let key = prompt_tile_key()?;
            config::store_tile_api_key(&profile_name, &key)?;
            if !global.quiet {
                eprintln!("Tile API key stored for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}

fn show_detail(cfg: &Config, global: &GlobalOpts) -> String {
    let active = config::active_profile_name(global, cfg);
    let mut lines = vec![
        format!("Config file:     {}", config::config_path().display()),
        format!("Active profile:  {active}"),
        format!("Output:          {}", cfg.defaults.output),
        format!("Timeout:         {}s", cfg.defaults.timeout),
    ];

    let mut names: Vec<&String> = cfg.profiles.keys().collect();
    names.sort();
    if names.is_empty() {
        lines.push(format!("Profiles:        (none; using {DEFAULT_BASE_URL})"));
    }
    for name in names {
        let p = &cfg.profiles[name];
        let marker = if *name == active { " *" } else { "" };
        lines.push(format!("\n[{name}]{marker}"));
        lines.push(format!("  base_url:      {}", p.base_url));
        if let Some(secs) = p.poll_interval_secs {
            lines.push(format!("  poll_interval: {secs}s"));
        }
        if let Some(ref tiles) = p.tile_url {
            lines.push(format!("  tile_url:      {tiles}"));
        }
        let key = match (&p.tile_api_key, &p.tile_api_key_env) {
            (Some(_), _) => "(plaintext)".to_owned(),
            (None, Some(env)) => format!("${env}"),
            (None, None) => "(keyring or none)".to_owned(),
        };
        lines.push(format!("  tile_api_key:  {key}"));
    }
    lines.join("\n")
}
