use anyhow::Result;
use clap::Parser;
use tdlink::app::App;
use tdlink::cli::{Cli, Commands};
use tdlink::commands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env file if present
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let app = App::start(&cli).await?;
    let result = match cli.command {
        Commands::Call(args) => commands::handle_call(args, &app).await,
        Commands::Watch(args) => commands::handle_watch(args, &app).await,
        Commands::Login(args) => commands::handle_login(args, &app).await,
        Commands::State => commands::handle_state(&app).await,
    };
    app.stop().await?;
    result
}

// RUST_LOG wins over the -v/-q flags when set.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
