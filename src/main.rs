use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    CatalogCommand, ConfigCommand, Context, ExportCommand, ImportCommand, OutputFormat,
    RecipeCommand, SyncCommand,
};
use recetario::config::Config;

#[derive(Parser)]
#[command(name = "recetario")]
#[command(version)]
#[command(about = "A recipe book with remote mirroring and web import", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage recipes
    Recipe(RecipeCommand),

    /// Import a recipe from a web page
    Import(ImportCommand),

    /// Export a recipe as PDF or share text
    Export(ExportCommand),

    /// Pull recipes from the remote store
    Sync(SyncCommand),

    /// Sign in with the configured API key
    Login,

    /// Forget the cached session
    Logout,

    /// Show the signed-in user
    Whoami {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Browse the pet-store catalog
    Catalog(CatalogCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

impl Commands {
    fn is_read(&self) -> bool {
        matches!(self, Commands::Recipe(cmd) if cmd.command.is_read())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recetario=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    // Commands that never touch the local store.
    match &command {
        Commands::Config(cmd) => return cmd.run(&config),
        Commands::Catalog(cmd) => return cmd.run(&config).await,
        _ => {}
    }

    let ctx = Context::open(config).await?;

    if command.is_read() {
        commands::try_auto_sync(&ctx).await;
    }

    match &command {
        Commands::Recipe(cmd) => cmd.run(&ctx).await,
        Commands::Import(cmd) => cmd.run(&ctx).await,
        Commands::Export(cmd) => cmd.run(&ctx).await,
        Commands::Sync(cmd) => cmd.run(&ctx).await,
        Commands::Login => commands::login(&ctx).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Whoami { format } => commands::whoami(&ctx, *format).await,
        Commands::Config(_) | Commands::Catalog(_) => Ok(()),
    }
}
