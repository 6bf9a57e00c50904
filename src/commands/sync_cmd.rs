//! Sync and session commands.

use clap::{Args, Subcommand};

use super::{Context, OutputFormat};
use recetario::sync::{pull, SyncError};

/// Pull your recipes from the remote store
#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Subcommand)]
enum SyncSubcommand {
    /// Show remote store configuration and connectivity
    Status,
}

impl SyncCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => self.sync(ctx).await,
            Some(SyncSubcommand::Status) => self.status(ctx).await,
        }
    }

    async fn sync(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        ctx.require_remote()?;
        let user = ctx
            .auth
            .current_user()
            .await?
            .ok_or(SyncError::NotAuthenticated)?;

        println!("Syncing with remote store...");
        let report = pull(ctx.remote.as_ref(), &ctx.repo, &user).await?;

        println!();
        println!("  fetched:  {}", report.fetched);
        println!("  inserted: {}", report.inserted);
        println!("  updated:  {}", report.updated);
        println!();
        if report.inserted + report.updated > 0 {
            println!("Sync complete.");
        } else {
            println!("Already up to date.");
        }
        Ok(())
    }

    async fn status(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        let remote = &ctx.config.remote;
        println!("Remote Store");
        println!("============");
        println!();

        let (Some(server_url), Some(api_key)) = (&remote.server_url, &remote.api_key) else {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  remote:");
            println!("    server_url: \"http://localhost:8080\"");
            println!("    api_key: \"your-api-key\"");
            println!("    auto_sync: false");
            println!();
            println!("Or set environment variables:");
            println!("  RECETARIO_SERVER_URL");
            println!("  RECETARIO_API_KEY");
            return Ok(());
        };

        let prefix: String = api_key.chars().take(8).collect();
        println!("Server:    {}", server_url);
        println!("API Key:   {}...", prefix);
        println!(
            "Auto-sync: {}",
            if remote.auto_sync { "enabled" } else { "disabled" }
        );
        println!();

        print!("Server status: ");
        match ctx.remote.current_user().await {
            Ok(user) => println!("✓ connected as {}", user.email),
            Err(recetario::remote::RemoteError::NotAuthenticated) => println!("✗ API key rejected"),
            Err(recetario::remote::RemoteError::Http(_)) => println!("✗ unreachable"),
            Err(e) => println!("✗ error: {}", e),
        }
        Ok(())
    }
}

/// Pulls before a read command when auto-sync is on. Failures are logged only.
pub async fn try_auto_sync(ctx: &Context) {
    if !ctx.config.remote.auto_sync || !ctx.config.remote.is_configured() {
        return;
    }

    let user = match ctx.auth.current_user().await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!("Auto-sync skipped: not authenticated");
            return;
        }
        Err(e) => {
            tracing::debug!("Auto-sync skipped: {}", e);
            return;
        }
    };

    if let Err(e) = pull(ctx.remote.as_ref(), &ctx.repo, &user).await {
        tracing::debug!("Auto-sync failed: {}", e);
    }
}

pub async fn login(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    ctx.require_remote()?;
    let user = ctx.auth.login().await?;
    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    ctx.auth.logout().await?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(ctx: &Context, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let Some(user) = ctx.auth.current_user().await? else {
        return Err(SyncError::NotAuthenticated.into());
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
        OutputFormat::Text => {
            println!("{} <{}>", user.name, user.email);
            println!("  uid:        {}", user.uid);
            println!("  registered: {}", user.registered_at.format("%Y-%m-%d"));
            println!("  last seen:  {}", user.last_seen_at.format("%Y-%m-%d %H:%M"));
        }
    }
    Ok(())
}
