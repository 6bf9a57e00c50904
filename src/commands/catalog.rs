use clap::{Args, Subcommand};

use super::{truncate, OutputFormat};
use recetario::catalog::{CatalogClient, Product};
use recetario::config::Config;

/// Browse the pet-store catalog
#[derive(Args)]
pub struct CatalogCommand {
    /// Backend base URL (overrides catalog.base_url)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// List product categories
    Categories {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List products, optionally of one category
    Products {
        /// Category name
        category: Option<String>,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn print_products(products: &[&Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    println!("{:<6}  {:<28}  {:>10}  IMAGE", "ID", "NAME", "PRICE");
    println!("{}", "-".repeat(80));
    for product in products {
        println!(
            "{:<6}  {:<28}  {:>10}  {}",
            product.id,
            truncate(&product.name, 28),
            product.price,
            product.image_url
        );
    }
    println!("\nTotal: {} product(s)", products.len());
}

impl CatalogCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let base_url = self
            .url
            .clone()
            .or_else(|| config.catalog.base_url.clone())
            .ok_or("Catalog URL not configured. Set catalog.base_url or RECETARIO_CATALOG_URL")?;

        let catalog = CatalogClient::new(&base_url)?
            .with_feed_path(config.catalog.feed_path.clone())
            .fetch()
            .await?;

        match &self.command {
            CatalogSubcommand::Categories { format } => match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&catalog.category_names())?)
                }
                OutputFormat::Text => {
                    for category in &catalog.categories {
                        println!("{} ({})", category.name, category.products.len());
                    }
                    println!("\nLoaded: {} categories", catalog.categories.len());
                }
            },
            CatalogSubcommand::Products { category, format } => {
                let products: Vec<&Product> = match category {
                    Some(name) => catalog
                        .products_in(name)
                        .ok_or_else(|| format!("Category not found: {}", name))?
                        .iter()
                        .collect(),
                    None => catalog.all_products(),
                };
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&products)?),
                    OutputFormat::Text => print_products(&products),
                }
            }
        }
        Ok(())
    }
}
