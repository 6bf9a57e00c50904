//! Sharing and PDF export of recipes.

mod pdf;
mod share;

use thiserror::Error;

pub use pdf::{sanitize_file_name, PdfExporter};
pub use share::{share_subject, share_text, SHARE_FOOTER};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export task failed: {0}")]
    Task(String),
}
