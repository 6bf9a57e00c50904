use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::Context;
use recetario::export::{share_subject, share_text, PdfExporter};

#[derive(Args)]
pub struct ExportCommand {
    #[command(subcommand)]
    pub command: ExportSubcommand,
}

#[derive(Subcommand)]
pub enum ExportSubcommand {
    /// Write a recipe as a PDF document
    Pdf {
        /// Recipe id
        id: i64,

        /// Output directory (defaults to <data_dir>/pdf)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print a recipe as shareable plain text
    Share {
        /// Recipe id
        id: i64,
    },
}

impl ExportCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        let id = match &self.command {
            ExportSubcommand::Pdf { id, .. } | ExportSubcommand::Share { id } => *id,
        };
        let recipe = ctx
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| format!("Recipe not found: {}", id))?;

        match &self.command {
            ExportSubcommand::Pdf { output, .. } => {
                let dir = output.clone().unwrap_or_else(|| ctx.config.pdf_dir());
                let path = PdfExporter::new(dir).export(&recipe).await?;
                println!("PDF written to {}", path.display());
            }
            ExportSubcommand::Share { .. } => {
                println!("Subject: {}", share_subject(&recipe));
                println!();
                println!("{}", share_text(&recipe));
            }
        }
        Ok(())
    }
}
