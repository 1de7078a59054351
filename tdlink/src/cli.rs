use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// tdlink: talk to a tagged-union JSON engine from the command line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine executable speaking JSON lines on stdin/stdout.
    #[arg(long, env = "TDLINK_ENGINE", global = true)]
    pub engine: Option<PathBuf>,

    /// Extra argument passed to the engine (repeatable).
    #[arg(long = "engine-arg", global = true, allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Client settings as a JSON file.
    #[arg(long, env = "TDLINK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in milliseconds; 0 waits forever (overrides the config file).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log every raw payload at TRACE level.
    #[arg(long, global = true)]
    pub wire_log: bool,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one raw request and print its response.
    Call(CallArgs),
    /// Print incoming updates as JSON lines.
    Watch(WatchArgs),
    /// Walk through the authorization flow interactively.
    Login(LoginArgs),
    /// Print the current authorization phase.
    State,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// The request object, e.g. '{"@type":"getOption","name":"version"}'. Use '-' to read stdin.
    pub request: String,

    /// Print the response on a single line.
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Only print updates with these tags (e.g. updateNewMessage).
    #[arg(long = "tag", short)]
    pub tags: Vec<String>,

    /// Stop after this many updates.
    #[arg(long, short)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Application identifier.
    #[arg(long, env = "TDLINK_API_ID")]
    pub api_id: i32,

    /// Application hash.
    #[arg(long, env = "TDLINK_API_HASH", hide_env_values = true)]
    pub api_hash: String,

    /// Directory for the engine's persistent data.
    #[arg(long, env = "TDLINK_DATABASE_DIR", default_value = "tdlink-db")]
    pub database_dir: PathBuf,

    /// Use the test data centers.
    #[arg(long)]
    pub test_dc: bool,
}
