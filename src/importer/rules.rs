//! Prioritized extraction rules for generic recipe pages.
//!
//! Each field has an ordered rule list. Rules are tried by rank (1 first);
//! the first one that yields a non-empty value wins and is recorded as the
//! field's provenance.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::text::normalize_whitespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Description,
    Ingredients,
    Steps,
    PrepTime,
    Servings,
    Image,
    Category,
}

/// Which rule produced a field, and its rank in that field's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    pub rule: &'static str,
    pub rank: usize,
}

/// Where a rule reads its value from.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// Text of the first (or every) element matching the selector.
    Text(&'static str),
    /// An attribute of the first (or every) element matching the selector.
    Attr(&'static str, &'static str),
    /// `src` of an `<img>`, otherwise the `content` attribute.
    Image(&'static str),
    /// Items of any `<ul>` that has an item mentioning the word.
    ListMentioning(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub source: Source,
}

const fn rule(name: &'static str, source: Source) -> Rule {
    Rule { name, source }
}

pub const TITLE_RULES: &[Rule] = &[
    rule("schema-name", Source::Text(r#"[itemtype*="Recipe"] [itemprop="name"]"#)),
    rule("og-title", Source::Attr(r#"meta[property="og:title"]"#, "content")),
    rule("first-heading", Source::Text("h1")),
    rule("document-title", Source::Text("title")),
];

pub const DESCRIPTION_RULES: &[Rule] = &[
    rule("schema-description", Source::Text(r#"[itemprop="description"]"#)),
    rule("meta-description", Source::Attr(r#"meta[name="description"]"#, "content")),
    rule("first-paragraph", Source::Text("p")),
];

pub const INGREDIENT_RULES: &[Rule] = &[
    rule("schema-ingredient", Source::Text(r#"[itemprop="recipeIngredient"]"#)),
    rule("ingredient-class", Source::Text(".ingredient")),
    rule("ingredients-list", Source::Text(".ingredients li")),
    rule("ingredient-container", Source::Text(r#"[class*="ingredient"] li"#)),
    rule("list-with-grams", Source::ListMentioning("gr")),
    rule("list-with-spoons", Source::ListMentioning("cucharada")),
];

pub const STEP_RULES: &[Rule] = &[
    rule("schema-instruction-items", Source::Text(r#"[itemprop="recipeInstructions"] li"#)),
    rule("schema-instruction-paragraphs", Source::Text(r#"[itemprop="recipeInstructions"] p"#)),
    rule("instructions-list", Source::Text(".instructions li")),
    rule("steps-list", Source::Text(".steps li")),
    rule("step-container", Source::Text(r#"[class*="step"] li"#)),
    rule("ordered-list", Source::Text("ol li")),
];

pub const DURATION_RULES: &[Rule] = &[rule(
    "schema-duration",
    Source::Attr(r#"[itemprop="totalTime"], [itemprop="cookTime"]"#, "content"),
)];

/// Free-text duration scan over the page body, ranked after [`DURATION_RULES`].
pub const TEXT_DURATION_RULE: &str = "text-duration";

pub const SERVINGS_RULES: &[Rule] = &[
    rule("schema-yield", Source::Text(r#"[itemprop="recipeYield"]"#)),
    rule("schema-yield-content", Source::Attr(r#"[itemprop="recipeYield"]"#, "content")),
];

pub const IMAGE_RULES: &[Rule] = &[
    rule("schema-image", Source::Image(r#"[itemprop="image"]"#)),
    rule("og-image", Source::Attr(r#"meta[property="og:image"]"#, "content")),
];

pub const CATEGORY_RULES: &[Rule] = &[
    rule("schema-category", Source::Text(r#"[itemprop="recipeCategory"]"#)),
    rule("article-section", Source::Attr(r#"meta[property="article:section"]"#, "content")),
    rule("category-class", Source::Text(r#".category, .recipe-category, [class*="category"]"#)),
];

fn select<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => doc.select(&selector).collect(),
        Err(e) => {
            tracing::error!("Invalid selector {}: {:?}", css, e);
            Vec::new()
        }
    }
}

pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn read(element: &ElementRef<'_>, source: Source) -> String {
    match source {
        Source::Text(_) | Source::ListMentioning(_) => element_text(element),
        Source::Attr(_, attr) => element.value().attr(attr).unwrap_or_default().trim().to_string(),
        Source::Image(_) => {
            let attr = if element.value().name() == "img" { "src" } else { "content" };
            element.value().attr(attr).unwrap_or_default().trim().to_string()
        }
    }
}

/// The value of the first element the rule's selector matches.
pub fn first_value(doc: &Html, rule: &Rule) -> Option<String> {
    match rule.source {
        Source::Text(css) | Source::Attr(css, _) | Source::Image(css) => select(doc, css)
            .first()
            .map(|element| read(element, rule.source)),
        Source::ListMentioning(_) => all_values(doc, rule).into_iter().next(),
    }
}

/// The values of every element the rule's selector matches, in document order.
pub fn all_values(doc: &Html, rule: &Rule) -> Vec<String> {
    match rule.source {
        Source::Text(css) | Source::Attr(css, _) | Source::Image(css) => select(doc, css)
            .iter()
            .map(|element| read(element, rule.source))
            .collect(),
        Source::ListMentioning(word) => {
            let word = word.to_lowercase();
            select(doc, "ul")
                .into_iter()
                .filter(|list| {
                    select_children(list)
                        .iter()
                        .any(|item| element_text(item).to_lowercase().contains(&word))
                })
                .flat_map(|list| select_children(&list))
                .map(|item| element_text(&item))
                .collect()
        }
    }
}

fn select_children<'a>(list: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    match Selector::parse("li") {
        Ok(selector) => list.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Tries single-valued rules in rank order; returns the first non-empty value
/// that `accept` turns into a result.
pub fn first_match<T>(
    doc: &Html,
    rules: &[Rule],
    mut accept: impl FnMut(String) -> Option<T>,
) -> Option<(T, RuleMatch)> {
    rules.iter().enumerate().find_map(|(index, rule)| {
        let value = first_value(doc, rule).filter(|v| !v.is_empty())?;
        let accepted = accept(value)?;
        Some((
            accepted,
            RuleMatch {
                rule: rule.name,
                rank: index + 1,
            },
        ))
    })
}

/// Tries list rules in rank order; the first rule whose items survive
/// `convert` as a non-empty list wins.
pub fn first_list_match<T>(
    doc: &Html,
    rules: &[Rule],
    mut convert: impl FnMut(Vec<String>) -> Vec<T>,
) -> Option<(Vec<T>, RuleMatch)> {
    rules.iter().enumerate().find_map(|(index, rule)| {
        let items = convert(all_values(doc, rule));
        if items.is_empty() {
            return None;
        }
        Some((
            items,
            RuleMatch {
                rule: rule.name,
                rank: index + 1,
            },
        ))
    })
}
