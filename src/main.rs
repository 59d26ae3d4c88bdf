//! Route ACL
//!
//! Command-line front end: validate a policy, check a single request, or
//! serve forward-auth decisions.

use clap::{Parser, Subcommand};
use route_acl::{
    access_control::{Action, PolicyHandle, load_policy_file},
    adapter::{AclState, RoleChain},
    config::{AppConfig, LogFormat, load_config},
    transport::{HttpConfig, run_http, spawn_reload_on_hangup},
};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Route ACL - role-based access control for HTTP routes
#[derive(Parser, Debug)]
#[command(name = "route-acl")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "ROUTE_ACL_CONFIG")]
    config: Option<String>,

    /// Policy file (overrides policy.path)
    #[arg(short, long, env = "ROUTE_ACL_POLICY")]
    policy: Option<String>,

    /// Base URL prefix (overrides policy.base_url)
    #[arg(long, env = "ROUTE_ACL_BASE_URL")]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ROUTE_ACL_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the policy and report what it contains
    Validate,

    /// Decide a single request; exits 0 when allowed, 1 when denied
    Check {
        /// Subject role
        #[arg(short, long)]
        role: Option<String>,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, e.g. /api/mangoes/42?ripe=true
        path: String,
    },

    /// Serve forward-auth decisions over HTTP
    Serve {
        /// HTTP server host
        #[arg(long, env = "ROUTE_ACL_HTTP_HOST")]
        host: Option<String>,

        /// HTTP server port
        #[arg(long, env = "ROUTE_ACL_HTTP_PORT")]
        port: Option<u16>,
    },
}

fn init_logging(config: &AppConfig, cli_level: Option<&str>) {
    let level = cli_level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(path) = args.policy {
        config.policy.path = path;
    }
    if let Some(base_url) = args.base_url {
        config.policy.base_url = Some(base_url);
    }

    init_logging(&config, args.log_level.as_deref());

    let policy_path = config.policy.resolved_path();
    let base_url = config.policy.base_url.clone();

    let document = load_policy_file(&policy_path, base_url.as_deref())
        .inspect_err(|e| error!(error = %e, "Failed to load policy"))?;

    match args.command {
        Command::Validate => {
            println!(
                "{}: ok ({} roles, {} rules, base URL {})",
                policy_path.display(),
                document.group_count(),
                document.rule_count(),
                document.base_url()
            );
            for role in document.roles() {
                let rules = document.group(role).map_or(0, |g| g.rules().len());
                println!("  {}: {} rules", role, rules);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { role, method, path } => {
            let acl = AclState::from_config(
                PolicyHandle::new(document),
                RoleChain::new(),
                &config.acl,
            );
            let (decision, action) = acl.evaluate(role.as_deref(), &method, &path);
            println!("{}", serde_json::to_string_pretty(&decision)?);
            Ok(match action {
                Action::Allow => ExitCode::SUCCESS,
                Action::Deny => ExitCode::FAILURE,
            })
        }
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let http_config = HttpConfig::from_host_port(&host, port)?;

            let policy = PolicyHandle::new(document);
            let roles = RoleChain::forwarded(&config.acl)?;
            let acl = AclState::from_config(policy.clone(), roles, &config.acl);

            let reload = spawn_reload_on_hangup(policy, policy_path, base_url)?;

            info!(
                version = env!("CARGO_PKG_VERSION"),
                "Starting route-acl forward-auth server"
            );
            run_http(acl, http_config).await?;

            reload.abort();
            Ok(ExitCode::SUCCESS)
        }
    }
}
