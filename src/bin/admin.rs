//! Recetario Admin CLI
//!
//! Manages the users of a `recetario-server` data directory.
//!
//! # Usage
//!
//! ```bash
//! recetario-admin user add ana@example.com --name Ana
//! recetario-admin user list
//! recetario-admin user remove ana@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `RECETARIO_SERVER_DATA_DIR`: Directory where the server stores data
//!   (default: ~/.local/share/recetario-server)

use clap::{Args, Parser, Subcommand};
use recetario::server::UserStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recetario-admin")]
#[command(version)]
#[command(about = "Recetario server administration tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User(UserCommand),
}

#[derive(Args)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand)]
enum UserSubcommand {
    /// Add a new user and print its API key
    Add {
        /// User's email address
        email: String,
        /// User's display name (defaults to the email's local part)
        #[arg(long, short)]
        name: Option<String>,
    },
    /// List all users
    List,
    /// Remove a user by email or uid
    Remove {
        user: String,
    },
}

fn data_dir() -> PathBuf {
    std::env::var("RECETARIO_SERVER_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("recetario-server")
        })
}

fn add_user(email: String, name: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = UserStore::open(&data_dir())?;
    let name = name.unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let (user, key) = store.add(&name, &email)?;
    store.save()?;

    println!("Added user: {}", user.email);
    println!("  UID:  {}", user.uid);
    println!("  Name: {}", user.name);
    println!();
    println!("API key (shown once, store it now):");
    println!("  {}", key);

    Ok(())
}

fn list_users() -> Result<(), Box<dyn std::error::Error>> {
    let store = UserStore::open(&data_dir())?;
    let users = store.list();

    if users.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("{:<34} {:<32} {:<20} {:<20}", "UID", "EMAIL", "NAME", "LAST SEEN");
    println!("{}", "-".repeat(108));
    for user in &users {
        println!(
            "{:<34} {:<32} {:<20} {:<20}",
            user.uid,
            user.email,
            user.name,
            user.last_seen_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("Total: {} user(s)", users.len());

    Ok(())
}

fn remove_user(user: String) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = UserStore::open(&data_dir())?;
    let removed = store.remove(&user)?;
    store.save()?;

    println!("Removed user: {}", removed.email);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::User(user_cmd) => match user_cmd.command {
            UserSubcommand::Add { email, name } => add_user(email, name),
            UserSubcommand::List => list_users(),
            UserSubcommand::Remove { user } => remove_user(user),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
