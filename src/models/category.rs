use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of recipe categories offered by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Desserts,
    MainDishes,
    Appetizers,
    Bakery,
    Drinks,
    Salads,
    Soups,
    Other,
}

/// Keyword table used to map free-form categories (scraped pages, imports)
/// onto the predefined ones. Scanned top to bottom; first substring hit wins.
const KEYWORDS: &[(&str, Category)] = &[
    ("postre", Category::Desserts),
    ("dulce", Category::Desserts),
    ("dessert", Category::Desserts),
    ("tarta", Category::Desserts),
    ("pastel", Category::Desserts),
    ("galleta", Category::Desserts),
    ("helado", Category::Desserts),
    ("principal", Category::MainDishes),
    ("plato", Category::MainDishes),
    ("carne", Category::MainDishes),
    ("pescado", Category::MainDishes),
    ("pollo", Category::MainDishes),
    ("arroz", Category::MainDishes),
    ("pasta", Category::MainDishes),
    ("main", Category::MainDishes),
    ("aperitivo", Category::Appetizers),
    ("entrante", Category::Appetizers),
    ("tapa", Category::Appetizers),
    ("snack", Category::Appetizers),
    ("appetizer", Category::Appetizers),
    ("panaderia", Category::Bakery),
    ("bolleria", Category::Bakery),
    ("masa", Category::Bakery),
    ("bread", Category::Bakery),
    ("pan", Category::Bakery),
    ("bebida", Category::Drinks),
    ("drink", Category::Drinks),
    ("zumo", Category::Drinks),
    ("batido", Category::Drinks),
    ("cocktail", Category::Drinks),
    ("coctel", Category::Drinks),
    ("ensalada", Category::Salads),
    ("salad", Category::Salads),
    ("vegetal", Category::Salads),
    ("sopa", Category::Soups),
    ("caldo", Category::Soups),
    ("crema", Category::Soups),
    ("soup", Category::Soups),
];

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Desserts,
        Category::MainDishes,
        Category::Appetizers,
        Category::Bakery,
        Category::Drinks,
        Category::Salads,
        Category::Soups,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Desserts => "Desserts",
            Category::MainDishes => "Main dishes",
            Category::Appetizers => "Appetizers",
            Category::Bakery => "Bakery",
            Category::Drinks => "Drinks",
            Category::Salads => "Salads",
            Category::Soups => "Soups",
            Category::Other => "Other",
        }
    }

    /// Maps an external category string onto a predefined category.
    ///
    /// Empty input and input without a known keyword map to [`Category::Other`].
    pub fn normalize(raw: &str) -> Category {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return Category::Other;
        }

        KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, category)| *category)
            .unwrap_or(Category::Other)
    }

    /// True when `label` is exactly one of the predefined labels.
    pub fn is_valid(label: &str) -> bool {
        let label = label.trim();
        Category::ALL.iter().any(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .find(|c| c.label().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| {
                let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
                format!(
                    "Invalid category '{}'. Valid options: {}",
                    s,
                    labels.join(", ")
                )
            })
    }
}
