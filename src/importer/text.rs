//! Small text heuristics shared by the extraction paths.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Ingredient, Step};
use crate::parser::strip_numbering;

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .inspect_err(|e| tracing::error!("Invalid pattern {}: {}", pattern, e))
        .ok()
}

// Leading amount with an optional known unit: "200g", "1/2 taza", "3 cucharadas".
static QUANTITY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(
        r"(?i)^(\d+(?:[.,/]\d+)?\s*(?:kg|g|gr|grs|mg|ml|cl|dl|l|oz|lb|lbs|cups?|tazas?|cucharadas?|cucharaditas?|tbsp|tsp|pizcas?|dientes?|latas?|vasos?)?)\.?\s+(.+)$",
    )
});

static ISO_DURATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"PT(?:(\d+)H)?(?:(\d+)M)?"));

static TEXT_DURATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?i)(\d+)\s*(minuto|min|hora)"));

static FIRST_INTEGER: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"(\d+)"));

/// Ingredient items longer than this are page prose, not ingredients.
pub const MAX_INGREDIENT_LEN: usize = 199;
/// Step items this short are headings or labels.
pub const MIN_STEP_LEN: usize = 11;

/// Splits "200g flour" into quantity and name. Lines without a leading
/// amount become a name with an empty quantity.
pub fn parse_ingredient_line(line: &str) -> Ingredient {
    let line = line.trim();
    let captures = QUANTITY.as_ref().and_then(|re| re.captures(line));
    match captures {
        Some(caps) => {
            let quantity = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let name = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            let name = name
                .strip_prefix("de ")
                .or_else(|| name.strip_prefix("of "))
                .unwrap_or(name);
            Ingredient::new(name, quantity)
        }
        None => Ingredient::new(line, ""),
    }
}

/// Minutes in an ISO-8601 duration such as "PT1H30M"; 0 when absent.
pub fn parse_iso_duration(value: &str) -> u32 {
    let Some(caps) = ISO_DURATION.as_ref().and_then(|re| re.captures(value)) else {
        return 0;
    };
    let number = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    number(1).saturating_mul(60).saturating_add(number(2))
}

/// First "N min", "N minutos" or "N horas" in free text, in minutes.
pub fn find_text_duration(text: &str) -> Option<u32> {
    let caps = TEXT_DURATION.as_ref()?.captures(text)?;
    let value: u32 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_lowercase();
    if unit == "hora" {
        Some(value.saturating_mul(60))
    } else {
        Some(value)
    }
}

pub fn first_integer(text: &str) -> Option<u32> {
    FIRST_INTEGER
        .as_ref()?
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Collapses runs of whitespace into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ingredient candidates: non-empty and short enough.
pub fn ingredients_from_items<I, S>(items: I) -> Vec<Ingredient>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().trim().to_string())
        .filter(|item| !item.is_empty() && item.chars().count() <= MAX_INGREDIENT_LEN)
        .map(|item| parse_ingredient_line(&item))
        .collect()
}

/// Step candidates: long enough to be an instruction, with numbering removed,
/// numbered densely from 1.
pub fn steps_from_items<I, S>(items: I) -> Vec<Step>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().trim().to_string())
        .filter(|item| item.chars().count() >= MIN_STEP_LEN)
        .map(|item| strip_numbering(&item).to_string())
        .filter(|item| !item.is_empty())
        .enumerate()
        .map(|(index, text)| Step::new(index as u32 + 1, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredient_line() {
        let i = parse_ingredient_line("200g harina");
        assert_eq!((i.quantity.as_str(), i.name.as_str()), ("200g", "harina"));

        let i = parse_ingredient_line("2 huevos");
        assert_eq!((i.quantity.as_str(), i.name.as_str()), ("2", "huevos"));

        let i = parse_ingredient_line("3 cucharadas de azúcar");
        assert_eq!((i.quantity.as_str(), i.name.as_str()), ("3 cucharadas", "azúcar"));

        let i = parse_ingredient_line("1/2 cup milk");
        assert_eq!((i.quantity.as_str(), i.name.as_str()), ("1/2 cup", "milk"));

        let i = parse_ingredient_line("2 gallinas");
        assert_eq!((i.quantity.as_str(), i.name.as_str()), ("2", "gallinas"));

        let i = parse_ingredient_line("Sal al gusto");
        assert_eq!((i.quantity.as_str(), i.name.as_str()), ("", "Sal al gusto"));
    }

    #[test]
    fn test_parse_iso_duration() {
        assert_eq!(parse_iso_duration("PT1H30M"), 90);
        assert_eq!(parse_iso_duration("PT45M"), 45);
        assert_eq!(parse_iso_duration("PT2H"), 120);
        assert_eq!(parse_iso_duration("soon"), 0);
        assert_eq!(parse_iso_duration(""), 0);
    }

    #[test]
    fn test_find_text_duration() {
        assert_eq!(find_text_duration("Listo en 25 minutos"), Some(25));
        assert_eq!(find_text_duration("Takes 40 MIN total"), Some(40));
        assert_eq!(find_text_duration("Reposar 2 horas"), Some(120));
        assert_eq!(find_text_duration("No time given"), None);
    }

    #[test]
    fn test_first_integer() {
        assert_eq!(first_integer("Serves 4-6 people"), Some(4));
        assert_eq!(first_integer("para 8"), Some(8));
        assert_eq!(first_integer("a few"), None);
    }

    #[test]
    fn test_item_filters() {
        let long = "x".repeat(200);
        let ingredients = ingredients_from_items(["100 g rice", "", long.as_str(), "salt"]);
        assert_eq!(ingredients.len(), 2);

        let steps = steps_from_items(["Step one", "1. Heat the oil in a pan", "2) Fry the onions slowly"]);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], Step::new(1, "Heat the oil in a pan"));
        assert_eq!(steps[1], Step::new(2, "Fry the onions slowly"));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }
}
