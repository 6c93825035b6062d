//! Clap derive structures for the `shopdesk` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// shopdesk -- admin backend client for the shop dashboard
#[derive(Debug, Parser)]
#[command(
    name = "shopdesk",
    version,
    about = "Talk to the shop admin backend from the command line",
    long_about = "Sign in to the shop admin backend, check the session, and query\n\
        dashboard resources (orders, products, customers, reports, ...).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend base URL (overrides config and host detection)
    #[arg(long, env = "SHOPDESK_API_BASE_URL", global = true)]
    pub api_url: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, env = "SHOPDESK_SESSION_DIR", global = true, hide_env = true)]
    pub session_dir: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SHOPDESK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login(LoginArgs),

    /// End the session (notifies the backend when reachable)
    Logout,

    /// Show the signed-in admin and their permissions
    Whoami,

    /// Ask the backend whether the stored session is still valid
    Verify,

    /// Wait for the backend to answer its health probe
    Health(HealthArgs),

    /// Check whether the signed-in admin holds a permission
    Can(CanArgs),

    /// GET a dashboard resource by endpoint name or raw path
    Get(GetArgs),

    /// List the named endpoints
    Endpoints,

    /// Inspect configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct LoginArgs {
    /// Admin email address
    #[arg(long, short = 'e', env = "SHOPDESK_EMAIL")]
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(long, env = "SHOPDESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Keep the session only for this invocation
    #[arg(long)]
    pub no_remember: bool,

    /// Poll the health endpoint before signing in
    #[arg(long)]
    pub wait: bool,
}

impl std::fmt::Debug for LoginArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginArgs")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("no_remember", &self.no_remember)
            .field("wait", &self.wait)
            .finish()
    }
}

#[derive(Debug, Args)]
pub struct HealthArgs {
    /// Maximum number of probes
    #[arg(long, default_value = "10")]
    pub attempts: u32,

    /// Seconds between probes
    #[arg(long, default_value = "3")]
    pub delay: u64,

    /// Per-probe timeout in seconds
    #[arg(long, default_value = "5")]
    pub timeout: u64,
}

#[derive(Debug, Args)]
pub struct CanArgs {
    /// Permission name, e.g. `view_orders` or `delete_product`
    pub permission: String,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Endpoint name (`orders`, `orderById`, ...) or a raw path (`/admin/orders`)
    pub endpoint: String,

    /// Id for parameterized endpoints
    #[arg(long)]
    pub id: Option<String>,

    /// Query parameter as key=value (repeatable; empty values are dropped)
    #[arg(long = "param", short = 'P', value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size (clamped to the configured maximum)
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
