//! Clap derive structures for the `sweetsync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sweetsync -- live inventory for a sweets shop
#[derive(Debug, Parser)]
#[command(
    name = "sweetsync",
    version,
    about = "Browse and manage a sweets inventory with live updates",
    long_about = "A client for a sweets inventory service.\n\n\
        Reads and writes go over HTTP; `watch` keeps a push channel open\n\
        and prints every change as other clients buy, restock, or edit items.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "SWEETSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service API base URL (overrides profile)
    #[arg(long, short = 's', env = "SWEETSYNC_SERVER", global = true)]
    pub server: Option<String>,

    /// Bearer token (overrides profile credentials)
    #[arg(long, env = "SWEETSYNC_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SWEETSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SWEETSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SWEETSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color if the terminal is interactive
    Auto,
    Always,
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, search and modify inventory items
    #[command(alias = "i")]
    Items(ItemsArgs),

    /// Follow the inventory live until Ctrl-C
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Exchange credentials for a bearer token
    Login(LoginArgs),

    /// Create an account
    Register(RegisterArgs),

    /// Show the account the current token belongs to
    Whoami,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ITEMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub command: ItemsCommand,
}

/// Search criteria shared by `items search` and `watch`.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    /// Case-insensitive substring of the item name
    #[arg(long)]
    pub name: Option<String>,

    /// Exact category
    #[arg(long)]
    pub category: Option<String>,

    /// Lowest price, inclusive
    #[arg(long)]
    pub min_price: Option<f64>,

    /// Highest price, inclusive
    #[arg(long)]
    pub max_price: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum ItemsCommand {
    /// List every item
    #[command(alias = "ls")]
    List {
        /// Only items with stock left
        #[arg(long)]
        in_stock: bool,

        /// Only items in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Ask the service for items matching the criteria
    Search(SearchArgs),

    /// Show one item
    Get {
        /// Item id
        id: String,
    },

    /// Add a new item
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        price: f64,

        /// Starting stock
        #[arg(long, default_value = "0")]
        quantity: u32,
    },

    /// Change some fields of an item
    Update {
        /// Item id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        quantity: Option<u32>,
    },

    /// Remove an item
    #[command(alias = "rm")]
    Delete {
        /// Item id
        id: String,
    },

    /// Buy one unit
    #[command(alias = "buy")]
    Purchase {
        /// Item id
        id: String,
    },

    /// Add stock
    Restock {
        /// Item id
        id: String,

        /// Units to add (at least 1)
        #[arg(long, short = 'n', value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Narrow the displayed items; matching is done locally
    #[command(flatten)]
    pub search: SearchArgs,

    /// Only items with stock left
    #[arg(long)]
    pub in_stock: bool,

    /// Print the full listing on every change instead of a diff
    #[arg(long)]
    pub full: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ACCOUNT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (defaults to the profile's username)
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Store the token in the system keyring for the active profile
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account email
    pub email: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Store a bearer token in the system keyring
    SetToken {
        /// Profile to store it for (defaults to the active profile)
        name: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
