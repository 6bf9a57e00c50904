//! Best-effort recipe import from web pages.
//!
//! Video pages are read from their Open Graph metadata; every other page goes
//! through the prioritized rule lists in [`rules`]. Nothing here is a real
//! recipe parser: a fetched page always yields an [`ImportedRecipe`], possibly
//! with empty fields.

mod generic;
pub mod rules;
pub mod text;
mod video;

use reqwest::{Client, Url};
use scraper::Html;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Category, Ingredient, Recipe, Step};
pub use rules::{Field, RuleMatch};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportedRecipe {
    pub source_url: String,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    pub prep_time: u32,
    pub servings: u32,
    pub image_url: Option<String>,
    pub origin: String,
    /// Category as found on the page, before normalization.
    pub raw_category: Option<String>,
    pub category: Category,
    /// Winning rule per extracted field.
    pub provenance: BTreeMap<Field, RuleMatch>,
}

impl ImportedRecipe {
    pub(crate) fn empty(source_url: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            name: String::new(),
            description: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            prep_time: 0,
            servings: 0,
            image_url: None,
            origin: generic::ORIGIN.to_string(),
            raw_category: None,
            category: Category::Other,
            provenance: BTreeMap::new(),
        }
    }

    /// An unsaved recipe carrying everything that was extracted.
    pub fn into_recipe(self) -> Recipe {
        let mut recipe = Recipe::new(self.name, self.description)
            .with_ingredients(self.ingredients)
            .with_steps(self.steps)
            .with_prep_time(self.prep_time)
            .with_servings(self.servings)
            .with_category(self.category.label())
            .with_origin(self.origin);
        recipe.cover_image = self.image_url;
        recipe
    }
}

/// Runs the extraction path that matches `url` over already fetched HTML.
pub fn extract(url: &str, html: &str) -> ImportedRecipe {
    let doc = Html::parse_document(html);
    let mut recipe = ImportedRecipe::empty(url);

    let is_video = Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(video::is_video_host))
        .unwrap_or(false);
    if is_video {
        video::extract(&doc, &mut recipe);
    } else {
        generic::extract(&doc, &mut recipe);
    }

    let raw = recipe
        .raw_category
        .clone()
        .unwrap_or_else(|| recipe.origin.clone());
    recipe.category = Category::normalize(&raw);
    recipe
}

pub struct WebImporter {
    http: Client,
}

impl WebImporter {
    pub fn new() -> Result<Self, ImportError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ImportError::Fetch {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { http })
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String, ImportError> {
        let parsed = Url::parse(url).map_err(|_| ImportError::InvalidUrl(url.to_string()))?;
        let fetch_error = |reason: String| ImportError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }
        response.text().await.map_err(|e| fetch_error(e.to_string()))
    }

    pub async fn import(&self, url: &str) -> Result<ImportedRecipe, ImportError> {
        let html = self.fetch_html(url).await.inspect_err(|e| {
            tracing::warn!("Import failed: {}", e);
        })?;
        let recipe = extract(url, &html);
        tracing::info!(
            url,
            origin = %recipe.origin,
            ingredients = recipe.ingredients.len(),
            steps = recipe.steps.len(),
            "Imported recipe"
        );
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_dispatches_video_hosts() {
        let html = r#"<meta property="og:title" content="Video title"><h1>Heading</h1>"#;

        let video = extract("https://www.youtube.com/watch?v=abc", html);
        assert_eq!(video.origin, "YouTube");
        assert_eq!(video.name, "Video title");
        assert_eq!(video.category, Category::Other);

        let web = extract("https://example.com/recipe", html);
        assert_eq!(web.origin, "Web");
        assert_eq!(web.name, "Video title");
    }

    #[test]
    fn test_category_normalized_from_raw_category() {
        let html = r#"<span itemprop="recipeCategory">Sopas y cremas</span>"#;
        let recipe = extract("https://example.com/r", html);
        assert_eq!(recipe.raw_category.as_deref(), Some("Sopas y cremas"));
        assert_eq!(recipe.category, Category::Soups);
    }

    #[test]
    fn test_into_recipe() {
        let html = r#"<h1>Limonada</h1>
            <ul class="ingredients"><li>4 limones</li></ul>
            <ol><li>Exprimir los limones en una jarra.</li></ol>
            <meta property="og:image" content="https://example.com/l.jpg">"#;
        let recipe = extract("https://example.com/limonada", html).into_recipe();
        assert_eq!(recipe.id, 0);
        assert_eq!(recipe.name, "Limonada");
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.steps.len(), 1);
        assert_eq!(recipe.category.as_deref(), Some("Other"));
        assert_eq!(recipe.origin.as_deref(), Some("Web"));
        assert_eq!(recipe.cover_image.as_deref(), Some("https://example.com/l.jpg"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let importer = WebImporter::new().unwrap();
        assert!(matches!(
            importer.fetch_html("not a url").await,
            Err(ImportError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fetch_error() {
        let importer = WebImporter::new().unwrap();
        assert!(matches!(
            importer.fetch_html("http://127.0.0.1:9/recipe").await,
            Err(ImportError::Fetch { .. })
        ));
    }
}
