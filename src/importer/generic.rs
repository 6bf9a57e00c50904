use scraper::{Html, Selector};

use super::rules::{self, Field, RuleMatch};
use super::text::{find_text_duration, first_integer, ingredients_from_items, parse_iso_duration, steps_from_items};
use super::ImportedRecipe;

pub const ORIGIN: &str = "Web";

/// Extracts a recipe from an arbitrary page using the prioritized rule lists.
pub fn extract(doc: &Html, recipe: &mut ImportedRecipe) {
    recipe.origin = ORIGIN.to_string();

    if let Some((title, matched)) = rules::first_match(doc, rules::TITLE_RULES, Some) {
        recipe.name = title;
        recipe.provenance.insert(Field::Title, matched);
    }

    if let Some((description, matched)) = rules::first_match(doc, rules::DESCRIPTION_RULES, Some) {
        recipe.description = description;
        recipe.provenance.insert(Field::Description, matched);
    }

    if let Some((ingredients, matched)) =
        rules::first_list_match(doc, rules::INGREDIENT_RULES, ingredients_from_items)
    {
        recipe.ingredients = ingredients;
        recipe.provenance.insert(Field::Ingredients, matched);
    }

    if let Some((steps, matched)) = rules::first_list_match(doc, rules::STEP_RULES, steps_from_items) {
        recipe.steps = steps;
        recipe.provenance.insert(Field::Steps, matched);
    }

    if let Some((minutes, matched)) = prep_time(doc) {
        recipe.prep_time = minutes;
        recipe.provenance.insert(Field::PrepTime, matched);
    }

    if let Some((servings, matched)) =
        rules::first_match(doc, rules::SERVINGS_RULES, |text| first_integer(&text))
    {
        recipe.servings = servings;
        recipe.provenance.insert(Field::Servings, matched);
    }

    if let Some((image, matched)) = rules::first_match(doc, rules::IMAGE_RULES, Some) {
        recipe.image_url = Some(image);
        recipe.provenance.insert(Field::Image, matched);
    }

    if let Some((category, matched)) = rules::first_match(doc, rules::CATEGORY_RULES, Some) {
        recipe.raw_category = Some(category);
        recipe.provenance.insert(Field::Category, matched);
    }
}

fn prep_time(doc: &Html) -> Option<(u32, RuleMatch)> {
    let iso = rules::first_match(doc, rules::DURATION_RULES, |value| {
        Some(parse_iso_duration(&value)).filter(|minutes| *minutes > 0)
    });
    if iso.is_some() {
        return iso;
    }

    let body = Selector::parse("body").ok()?;
    let text = doc
        .select(&body)
        .next()
        .map(|body| rules::element_text(&body))?;
    let minutes = find_text_duration(&text)?;
    Some((
        minutes,
        RuleMatch {
            rule: rules::TEXT_DURATION_RULE,
            rank: rules::DURATION_RULES.len() + 1,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;

    fn extract_html(html: &str) -> ImportedRecipe {
        let mut recipe = ImportedRecipe::empty("https://example.com/recipe");
        extract(&Html::parse_document(html), &mut recipe);
        recipe
    }

    const SCHEMA_PAGE: &str = r#"
        <html><head>
          <title>Best Recipes Site</title>
          <meta property="og:image" content="https://example.com/og.jpg">
        </head><body>
          <div itemscope itemtype="https://schema.org/Recipe">
            <h1 itemprop="name">Tarta de queso</h1>
            <p itemprop="description">Creamy   baked cheesecake.</p>
            <meta itemprop="totalTime" content="PT1H15M">
            <span itemprop="recipeYield">8 porciones</span>
            <span itemprop="recipeCategory">Postres</span>
            <img itemprop="image" src="https://example.com/cake.jpg">
            <ul>
              <li itemprop="recipeIngredient">500 g queso crema</li>
              <li itemprop="recipeIngredient">4 huevos</li>
            </ul>
            <ol itemprop="recipeInstructions">
              <li>1. Precalentar el horno a 180 grados.</li>
              <li>Mezclar todos los ingredientes.</li>
              <li>Hornear</li>
            </ol>
          </div>
        </body></html>"#;

    #[test]
    fn test_schema_page() {
        let recipe = extract_html(SCHEMA_PAGE);
        assert_eq!(recipe.name, "Tarta de queso");
        assert_eq!(recipe.description, "Creamy baked cheesecake.");
        assert_eq!(recipe.prep_time, 75);
        assert_eq!(recipe.servings, 8);
        assert_eq!(recipe.image_url.as_deref(), Some("https://example.com/cake.jpg"));
        assert_eq!(recipe.raw_category.as_deref(), Some("Postres"));
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].quantity, "500 g");
        assert_eq!(recipe.ingredients[0].name, "queso crema");
        assert_eq!(
            recipe.steps,
            vec![
                Step::new(1, "Precalentar el horno a 180 grados."),
                Step::new(2, "Mezclar todos los ingredientes."),
            ]
        );
        assert_eq!(recipe.origin, "Web");

        assert_eq!(recipe.provenance[&Field::Title].rule, "schema-name");
        assert_eq!(recipe.provenance[&Field::Ingredients].rank, 1);
        assert_eq!(recipe.provenance[&Field::Steps].rule, "schema-instruction-items");
        assert_eq!(recipe.provenance[&Field::PrepTime].rule, "schema-duration");
    }

    #[test]
    fn test_fallback_rules() {
        let recipe = extract_html(
            r#"<html><head>
                 <title>Gazpacho | Cocina</title>
                 <meta name="description" content="Sopa fría andaluza">
                 <meta property="og:image" content="https://example.com/g.jpg">
               </head><body>
                 <h1>Gazpacho andaluz</h1>
                 <p>Listo en 20 minutos.</p>
                 <div class="recipe-ingredients"><ul>
                   <li>1 kg tomates</li><li>1 pepino</li>
                 </ul></div>
                 <ol><li>Triturar todas las verduras juntas.</li></ol>
               </body></html>"#,
        );
        assert_eq!(recipe.name, "Gazpacho andaluz");
        assert_eq!(recipe.provenance[&Field::Title].rule, "first-heading");
        assert_eq!(recipe.description, "Sopa fría andaluza");
        assert_eq!(recipe.provenance[&Field::Description].rule, "meta-description");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.provenance[&Field::Ingredients].rule, "ingredient-container");
        assert_eq!(recipe.steps.len(), 1);
        assert_eq!(recipe.provenance[&Field::Steps].rule, "ordered-list");
        assert_eq!(recipe.prep_time, 20);
        assert_eq!(recipe.provenance[&Field::PrepTime].rule, "text-duration");
        assert_eq!(recipe.provenance[&Field::PrepTime].rank, 2);
        assert_eq!(recipe.image_url.as_deref(), Some("https://example.com/g.jpg"));
        assert!(recipe.raw_category.is_none());
    }

    #[test]
    fn test_list_mentioning_grams() {
        let recipe = extract_html(
            "<html><body><ul><li>Inicio</li></ul>\
             <ul><li>250 gr arroz</li><li>1 litro de caldo</li></ul></body></html>",
        );
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.provenance[&Field::Ingredients].rule, "list-with-grams");
    }

    #[test]
    fn test_unrecognizable_page_is_empty_not_error() {
        let recipe = extract_html("<html><body><div>nothing here</div></body></html>");
        assert_eq!(recipe.name, "");
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.steps.is_empty());
        assert_eq!(recipe.prep_time, 0);
        assert!(recipe.provenance.is_empty());
    }
}
