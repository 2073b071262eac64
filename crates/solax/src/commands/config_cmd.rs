//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;
use serde::Serialize;
use tabled::Tabled;

use solax_api::{Credentials, LocalTarget, SiteList, endpoint::DEFAULT_LOCAL_PORT};
use solax_core::{ConfigFlow, FlowResult, SiteTarget, UserInput};

use crate::cli::{AddSiteArgs, ConfigArgs, ConfigCommand, GlobalOpts, KindArg};
use crate::config::{self, Config, SiteKind, SiteProfile};
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

fn missing(field: &str) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: "required with --non-interactive".into(),
    }
}

/// Use `value` if given, otherwise prompt for it.
fn value_or_prompt(
    value: Option<String>,
    field: &str,
    prompt: &str,
    interactive: bool,
) -> Result<String, CliError> {
    match value {
        Some(v) => Ok(v),
        None if interactive => Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(prompt_err),
        None => Err(missing(field)),
    }
}

fn site_not_found(cfg: &Config, name: String) -> CliError {
    CliError::SiteNotFound {
        name,
        available: config::available_sites(cfg),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Add(add) => add_site(add, global).await,

        // ── List ────────────────────────────────────────────────────
        ConfigCommand::List => {
            let cfg = config::load(global)?;
            if cfg.sites.is_empty() {
                eprintln!("No sites configured. Run: solax config add");
                return Ok(());
            }
            let rows: Vec<SiteRow> = cfg
                .sites
                .iter()
                .map(|(name, profile)| SiteRow::new(name, profile, cfg.default_site.as_deref()))
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                SiteRow::clone,
                |r| {
                    let marker = if r.default { " *" } else { "" };
                    format!("{}{marker}", r.name)
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Remove <name> ───────────────────────────────────────────
        ConfigCommand::Remove { name } => {
            let mut cfg = config::load(global)?;
            if cfg.sites.remove(&name).is_none() {
                return Err(site_not_found(&cfg, name));
            }
            if cfg.default_site.as_deref() == Some(name.as_str()) {
                cfg.default_site = None;
            }
            if let Err(e) = solax_config::delete_token(&name) {
                tracing::warn!(site = %name, error = %e, "could not remove keyring token");
            }
            config::save(global, &cfg)?;
            eprintln!("✓ Removed site '{name}'");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |_| config::config_file(global).display().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load(global)?;
            if !cfg.sites.contains_key(&name) {
                return Err(site_not_found(&cfg, name));
            }
            cfg.default_site = Some(name.clone());
            config::save(global, &cfg)?;
            eprintln!("✓ Default site set to '{name}'");
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_file(global).display());
            Ok(())
        }
    }
}

// ── Add ─────────────────────────────────────────────────────────────

/// Collect the site's values, run them through the config flow, and save
/// the resulting profile.
async fn add_site(args: AddSiteArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let interactive = !args.non_interactive;
    let mut cfg = config::load(global)?;

    let kind = match args.kind {
        Some(kind) => kind,
        None if interactive => {
            let choices = &["Cloud battery list", "Cloud inverter list", "Local inverter"];
            let selection = Select::new()
                .with_prompt("Endpoint kind")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            [KindArg::Battery, KindArg::Inverter, KindArg::Local]
                .get(selection)
                .copied()
                .unwrap_or(KindArg::Battery)
        }
        None => return Err(missing("kind")),
    };

    let mut token = None;
    let target = if kind == KindArg::Local {
        let host = value_or_prompt(
            args.ip_address.clone(),
            "ip_address",
            "Inverter address",
            interactive,
        )?;
        let port = args.port.unwrap_or(DEFAULT_LOCAL_PORT);
        SiteTarget::Local(LocalTarget::new(host, port))
    } else {
        let site_id = value_or_prompt(args.site_id.clone(), "site_id", "Site id", interactive)?;
        let secret = match (&args.token, &args.token_env) {
            (Some(t), _) => t.clone(),
            (None, Some(var)) => std::env::var(var).map_err(|_| CliError::Validation {
                field: "token_env".into(),
                reason: format!("environment variable {var} is not set"),
            })?,
            (None, None) if interactive => {
                rpassword::prompt_password("Access token: ").map_err(prompt_err)?
            }
            (None, None) => return Err(missing("token")),
        };
        if secret.is_empty() {
            return Err(CliError::Validation {
                field: "token".into(),
                reason: "token cannot be empty".into(),
            });
        }
        let list = if kind == KindArg::Battery {
            SiteList::Battery
        } else {
            SiteList::Inverter
        };
        token = Some(secret.clone());
        SiteTarget::Cloud {
            list,
            credentials: Credentials::new(site_id, SecretString::from(secret)),
        }
    };

    let defaults = config::effective_defaults(global, &cfg);
    let configured: Vec<String> = cfg
        .sites
        .values()
        .filter_map(config::profile_unique_id)
        .collect();
    let flow = ConfigFlow::new(config::client(&defaults)?, configured);
    let input = UserInput {
        name: args.name.clone(),
        target,
    };
    let endpoint = input.target.to_string();
    let unique_id = input.target.unique_id();

    let entry = if args.no_verify {
        flow.step_import(input)
    } else {
        eprintln!("Probing {endpoint}...");
        flow.step_user(input).await
    };
    let entry = match entry {
        FlowResult::CreateEntry(entry) => entry,
        FlowResult::ShowForm { errors } => {
            let reason = errors
                .iter()
                .map(|(field, error)| format!("{field}: {error}"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CliError::ProbeFailed {
                target: endpoint,
                reason,
            });
        }
        FlowResult::Abort { .. } => {
            return Err(CliError::AlreadyConfigured { unique_id });
        }
    };

    let name = entry.title.clone();
    if cfg.sites.contains_key(&name) {
        return Err(CliError::AlreadyConfigured { unique_id: name });
    }

    let mut profile = match &entry.target {
        SiteTarget::Local(t) => SiteProfile::local(t.host.clone(), t.port),
        SiteTarget::Cloud { list, credentials } => {
            let kind = if *list == SiteList::Battery {
                SiteKind::Battery
            } else {
                SiteKind::Inverter
            };
            SiteProfile::cloud(kind, credentials.site_id())
        }
    };
    profile.scan_interval = args.scan_interval;
    profile.topology = args.topology.map(Into::into);

    if let Some(secret) = token {
        store_secret(&args, &name, &secret, &mut profile, interactive)?;
    }

    cfg.sites.insert(name.clone(), profile);
    if cfg.default_site.is_none() {
        cfg.default_site = Some(name.clone());
    }
    config::save(global, &cfg)?;

    if entry.metrics > 0 {
        eprintln!("✓ Added site '{name}' ({} metrics)", entry.metrics);
    } else {
        eprintln!("✓ Added site '{name}'");
    }
    eprintln!("  Config path: {}", config::config_file(global).display());
    Ok(())
}

/// Put the token where the user asked: env var reference, keyring, or
/// plaintext in the config file.
fn store_secret(
    args: &AddSiteArgs,
    name: &str,
    secret: &str,
    profile: &mut SiteProfile,
    interactive: bool,
) -> Result<(), CliError> {
    if let Some(ref var) = args.token_env {
        profile.token_env = Some(var.clone());
        return Ok(());
    }

    let use_keyring = if args.keyring || !interactive {
        args.keyring
    } else {
        let choices = &[
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
        ];
        Select::new()
            .with_prompt("Where to store the token?")
            .items(choices)
            .default(0)
            .interact()
            .map_err(prompt_err)?
            == 0
    };

    if use_keyring {
        solax_config::store_token(name, secret)?;
        eprintln!("   ✓ Token stored in system keyring");
    } else {
        profile.token = Some(secret.to_owned());
    }
    Ok(())
}

// ── List / Show rendering ───────────────────────────────────────────

#[derive(Clone, Serialize, Tabled)]
struct SiteRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Default")]
    default: bool,
}

impl SiteRow {
    fn new(name: &str, profile: &SiteProfile, default_site: Option<&str>) -> Self {
        let kind = match profile.kind {
            SiteKind::Battery => "battery",
            SiteKind::Inverter => "inverter",
            SiteKind::Local => "local",
        };
        Self {
            name: name.to_owned(),
            kind: kind.into(),
            endpoint: config::profile_unique_id(profile).unwrap_or_else(|| "(incomplete)".into()),
            default: default_site == Some(name),
        }
    }
}

/// Copy of `cfg` with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    Config {
        default_site: cfg.default_site.clone(),
        defaults: cfg.defaults.clone(),
        sites: cfg
            .sites
            .iter()
            .map(|(name, profile)| {
                let mut profile = profile.clone();
                if profile.token.is_some() {
                    profile.token = Some("********".into());
                }
                (name.clone(), profile)
            })
            .collect(),
    }
}
