use clap::{Args, Subcommand};

use super::OutputFormat;
use recetario::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(not set)")
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        let mut value = serde_json::to_value(config)?;
                        if let Some(key) = value.pointer_mut("/remote/api_key") {
                            if !key.is_null() {
                                *key = serde_json::Value::from("********");
                            }
                        }
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("database_path: {}", config.database_path.value.display());
                        println!("  source: {}", config.database_path.source);
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        println!("remote.server_url: {}", or_unset(&config.remote.server_url));
                        println!(
                            "remote.api_key: {}",
                            if config.remote.api_key.is_some() { "********" } else { "(not set)" }
                        );
                        println!("remote.auto_sync: {}", config.remote.auto_sync);
                        println!();

                        println!("catalog.base_url: {}", or_unset(&config.catalog.base_url));
                        println!("catalog.feed_path: {}", config.catalog.feed_path);
                    }
                }
                Ok(())
            }
        }
    }
}
