//! Read-only client for the pet-store product feed.
//!
//! The feed is a JSON array of categories, each carrying its products:
//!
//! ```json
//! [{ "categoria": "Perros", "productos": [
//!     { "id": 1, "nombre": "Collar", "descripcion": "...",
//!       "precio": "12.50", "imagen_url": "collar.jpg" }
//! ]}]
//! ```

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FEED_PATH: &str = "productos.php";
const IMAGE_DIR: &str = "imagenes";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Connection error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Response format error: {0}")]
    Format(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Kept as text, the feed sends prices either quoted or bare.
    pub price: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCategory {
    pub name: String,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    pub categories: Vec<ProductCategory>,
}

impl Catalog {
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Products of the named category, compared case-insensitively.
    pub fn products_in(&self, name: &str) -> Option<&[Product]> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .map(|c| c.products.as_slice())
    }

    pub fn all_products(&self) -> Vec<&Product> {
        self.categories.iter().flat_map(|c| &c.products).collect()
    }

    pub fn product_count(&self) -> usize {
        self.categories.iter().map(|c| c.products.len()).sum()
    }
}

#[derive(Deserialize)]
struct FeedCategory {
    categoria: String,
    productos: Vec<FeedProduct>,
}

#[derive(Deserialize)]
struct FeedProduct {
    id: FeedNumber,
    nombre: String,
    #[serde(default)]
    descripcion: String,
    precio: FeedNumber,
    #[serde(default)]
    imagen_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FeedNumber {
    fn as_text(&self) -> String {
        match self {
            FeedNumber::Int(n) => n.to_string(),
            FeedNumber::Float(n) => n.to_string(),
            FeedNumber::Text(s) => s.trim().to_string(),
        }
    }

    fn as_id(&self) -> Result<i64, CatalogError> {
        match self {
            FeedNumber::Int(n) => Ok(*n),
            FeedNumber::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| CatalogError::Format(format!("invalid product id '{}'", s))),
            FeedNumber::Float(n) => Err(CatalogError::Format(format!("invalid product id '{}'", n))),
        }
    }
}

/// Absolute URLs are kept; bare file names live under the backend's image directory.
pub fn resolve_image_url(base_url: &str, image: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        image.to_string()
    } else {
        format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            IMAGE_DIR,
            image.trim_start_matches('/')
        )
    }
}

/// Parses a feed body, resolving image names against `base_url`.
pub fn parse_feed(base_url: &str, body: &str) -> Result<Catalog, CatalogError> {
    let feed: Vec<FeedCategory> =
        serde_json::from_str(body).map_err(|e| CatalogError::Format(e.to_string()))?;

    let mut categories = Vec::with_capacity(feed.len());
    for category in feed {
        let mut products = Vec::with_capacity(category.productos.len());
        for product in category.productos {
            products.push(Product {
                id: product.id.as_id()?,
                name: product.nombre,
                description: product.descripcion,
                price: product.precio.as_text(),
                image_url: resolve_image_url(base_url, &product.imagen_url),
            });
        }
        categories.push(ProductCategory {
            name: category.categoria,
            products,
        });
    }
    Ok(Catalog { categories })
}

pub struct CatalogClient {
    http: Client,
    base_url: String,
    feed_path: String,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("recetario/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            feed_path: DEFAULT_FEED_PATH.to_string(),
        })
    }

    pub fn with_feed_path(mut self, path: impl Into<String>) -> Self {
        self.feed_path = path.into();
        self
    }

    pub fn feed_url(&self) -> String {
        format!("{}/{}", self.base_url, self.feed_path.trim_start_matches('/'))
    }

    pub async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let url = self.feed_url();
        tracing::debug!(url = %url, "Fetching catalog");

        let response = self.http.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let catalog = parse_feed(&self.base_url, &body)?;

        tracing::info!(
            categories = catalog.categories.len(),
            products = catalog.product_count(),
            "Catalog loaded"
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"[
        {"categoria": "Perros", "productos": [
            {"id": 1, "nombre": "Collar", "descripcion": "Collar de cuero",
             "precio": "12.50", "imagen_url": "collar.jpg"},
            {"id": "2", "nombre": "Pelota", "descripcion": "Goma",
             "precio": 3, "imagen_url": "https://cdn.example.com/pelota.png"}
        ]},
        {"categoria": "Gatos", "productos": []}
    ]"#;

    #[test]
    fn test_resolve_image_url() {
        assert_eq!(
            resolve_image_url("http://shop.local/api/", "a.jpg"),
            "http://shop.local/api/imagenes/a.jpg"
        );
        assert_eq!(
            resolve_image_url("http://shop.local", "https://x.com/a.jpg"),
            "https://x.com/a.jpg"
        );
    }

    #[test]
    fn test_parse_feed() {
        let catalog = parse_feed("http://shop.local", FEED).unwrap();
        assert_eq!(catalog.category_names(), vec!["Perros", "Gatos"]);
        assert_eq!(catalog.product_count(), 2);

        let dogs = catalog.products_in("perros").unwrap();
        assert_eq!(dogs[0].price, "12.50");
        assert_eq!(dogs[0].image_url, "http://shop.local/imagenes/collar.jpg");
        assert_eq!(dogs[1].id, 2);
        assert_eq!(dogs[1].price, "3");
        assert_eq!(dogs[1].image_url, "https://cdn.example.com/pelota.png");

        assert!(catalog.products_in("Gatos").unwrap().is_empty());
        assert!(catalog.products_in("Peces").is_none());
        assert_eq!(catalog.all_products().len(), 2);
    }

    #[test]
    fn test_malformed_feed_is_format_error() {
        assert!(matches!(
            parse_feed("http://x", r#"{"categoria": "no array"}"#),
            Err(CatalogError::Format(_))
        ));
        assert!(matches!(
            parse_feed("http://x", r#"[{"categoria": "A", "productos": [{"id": 1}]}]"#),
            Err(CatalogError::Format(_))
        ));
    }

    #[test]
    fn test_feed_url() {
        let client = CatalogClient::new("http://shop.local/")
            .unwrap()
            .with_feed_path("/api/productos.php");
        assert_eq!(client.feed_url(), "http://shop.local/api/productos.php");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_http_error() {
        let client = CatalogClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(client.fetch().await, Err(CatalogError::Http(_))));
    }
}
