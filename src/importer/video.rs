use scraper::{Html, Selector};

use super::rules::{Field, RuleMatch};
use super::text::{parse_ingredient_line, MIN_STEP_LEN};
use super::ImportedRecipe;
use crate::models::Step;
use crate::parser::strip_numbering;

pub const ORIGIN: &str = "YouTube";

const INGREDIENT_ANCHORS: &[&str] = &["ingrediente", "ingredient"];
const STEP_ANCHORS: &[&str] = &[
    "preparación",
    "preparacion",
    "paso",
    "instruccion",
    "instrucción",
    "instruction",
    "step",
];

pub fn is_video_host(host: &str) -> bool {
    let host = host.trim_start_matches("www.").trim_start_matches("m.");
    host == "youtube.com" || host.ends_with(".youtube.com") || host == "youtu.be"
}

fn og(doc: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="og:{}"]"#, property)).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn provenance(rule: &'static str) -> RuleMatch {
    RuleMatch { rule, rank: 1 }
}

/// Video pages carry no recipe markup: use the Open Graph metadata and split
/// the description into sections by keyword anchors.
pub fn extract(doc: &Html, recipe: &mut ImportedRecipe) {
    recipe.origin = ORIGIN.to_string();

    if let Some(title) = og(doc, "title") {
        recipe.name = title;
        recipe.provenance.insert(Field::Title, provenance("og-title"));
    }

    if let Some(description) = og(doc, "description") {
        split_sections(&description, recipe);
        recipe.description = description;
        recipe
            .provenance
            .insert(Field::Description, provenance("og-description"));
    }

    if let Some(image) = og(doc, "image") {
        recipe.image_url = Some(image);
        recipe.provenance.insert(Field::Image, provenance("og-image"));
    }
}

#[derive(PartialEq)]
enum Section {
    None,
    Ingredients,
    Steps,
}

/// A line mentioning an anchor switches section and is itself skipped.
fn split_sections(description: &str, recipe: &mut ImportedRecipe) {
    let mut section = Section::None;

    for line in description.lines().map(str::trim) {
        let lower = line.to_lowercase();
        if INGREDIENT_ANCHORS.iter().any(|anchor| lower.contains(anchor)) {
            section = Section::Ingredients;
            continue;
        }
        if STEP_ANCHORS.iter().any(|anchor| lower.contains(anchor)) {
            section = Section::Steps;
            continue;
        }
        if line.is_empty() {
            continue;
        }

        match section {
            Section::Ingredients => recipe.ingredients.push(parse_ingredient_line(line)),
            Section::Steps if line.chars().count() >= MIN_STEP_LEN => {
                let number = recipe.steps.len() as u32 + 1;
                recipe.steps.push(Step::new(number, strip_numbering(line)));
            }
            _ => {}
        }
    }

    if !recipe.ingredients.is_empty() {
        recipe
            .provenance
            .insert(Field::Ingredients, provenance("description-sections"));
    }
    if !recipe.steps.is_empty() {
        recipe
            .provenance
            .insert(Field::Steps, provenance("description-sections"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <meta property="og:title" content="Pan casero fácil">
        <meta property="og:description" content="Receta de pan.
Ingredientes:
500 g harina
10 g sal
Preparación:
1. Mezclar la harina con la sal y el agua.
Amasar
2. Dejar reposar durante una hora.">
        <meta property="og:image" content="https://i.ytimg.com/vi/abc/hq.jpg">
        </head><body></body></html>"#;

    #[test]
    fn test_is_video_host() {
        assert!(is_video_host("www.youtube.com"));
        assert!(is_video_host("m.youtube.com"));
        assert!(is_video_host("music.youtube.com"));
        assert!(is_video_host("youtu.be"));
        assert!(!is_video_host("notyoutube.com"));
        assert!(!is_video_host("example.com"));
    }

    #[test]
    fn test_video_page() {
        let mut recipe = ImportedRecipe::empty("https://youtu.be/abc");
        extract(&Html::parse_document(PAGE), &mut recipe);

        assert_eq!(recipe.name, "Pan casero fácil");
        assert_eq!(recipe.origin, "YouTube");
        assert_eq!(recipe.image_url.as_deref(), Some("https://i.ytimg.com/vi/abc/hq.jpg"));

        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].quantity, "500 g");
        assert_eq!(recipe.ingredients[0].name, "harina");

        assert_eq!(recipe.steps.len(), 2);
        assert_eq!(recipe.steps[0], Step::new(1, "Mezclar la harina con la sal y el agua."));
        assert_eq!(recipe.steps[1], Step::new(2, "Dejar reposar durante una hora."));
        assert_eq!(recipe.provenance[&Field::Steps].rule, "description-sections");
    }

    #[test]
    fn test_description_without_anchors() {
        let mut recipe = ImportedRecipe::empty("https://youtu.be/abc");
        let page = r#"<meta property="og:description" content="Just a vlog">"#;
        extract(&Html::parse_document(page), &mut recipe);
        assert_eq!(recipe.description, "Just a vlog");
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.steps.is_empty());
    }
}
