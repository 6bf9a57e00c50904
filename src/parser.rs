//! Conversion between the multi-line text used by the create/edit forms and
//! the structured ingredient and step lists.

use crate::models::{Ingredient, Step};

/// One ingredient per non-empty line. The first word is the quantity and the
/// rest the name; a single word is a name without quantity.
pub fn parse_ingredients(text: &str) -> Vec<Ingredient> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(char::is_whitespace) {
            Some((quantity, name)) => Ingredient::new(name.trim(), quantity),
            None => Ingredient::new(line, ""),
        })
        .collect()
}

/// One step per non-empty line, numbered from 1. Existing "N." prefixes are dropped.
pub fn parse_steps(text: &str) -> Vec<Step> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(strip_numbering)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| Step::new(index as u32 + 1, line))
        .collect()
}

/// One ingredient per line, notes included in parentheses.
pub fn ingredients_to_text(ingredients: &[Ingredient]) -> String {
    ingredients
        .iter()
        .map(Ingredient::full_text)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn steps_to_text(steps: &[Step]) -> String {
    steps
        .iter()
        .map(|s| format!("{}. {}", s.number, s.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Strips a leading "12." or "12)" with its trailing whitespace.
pub(crate) fn strip_numbering(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return line;
    }
    let rest = &line[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredients() {
        let ingredients = parse_ingredients("200g flour\n\n  2 eggs  \nsalt\n1 cup warm milk");
        assert_eq!(ingredients.len(), 4);
        assert_eq!(ingredients[0].quantity, "200g");
        assert_eq!(ingredients[0].name, "flour");
        assert_eq!(ingredients[1].quantity, "2");
        assert_eq!(ingredients[1].name, "eggs");
        assert_eq!(ingredients[2].quantity, "");
        assert_eq!(ingredients[2].name, "salt");
        assert_eq!(ingredients[3].name, "cup warm milk");
    }

    #[test]
    fn test_parse_steps_strips_numbering() {
        let steps = parse_steps("1. Preheat the oven\n\n2. Mix\nBake for 20 minutes\n4) Serve");
        let texts: Vec<&str> = steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Preheat the oven", "Mix", "Bake for 20 minutes", "Serve"]
        );
        let numbers: Vec<u32> = steps.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_parse_steps_keeps_leading_numbers_that_are_quantities() {
        let steps = parse_steps("200 grams of sugar go in");
        assert_eq!(steps[0].text, "200 grams of sugar go in");
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(parse_ingredients("").is_empty());
        assert!(parse_steps("  \n \n").is_empty());
    }

    #[test]
    fn test_text_formatters_are_inverse() {
        let text = "200g flour\nsalt";
        assert_eq!(ingredients_to_text(&parse_ingredients(text)), text);

        let steps = parse_steps("Mix\nBake");
        let formatted = steps_to_text(&steps);
        assert_eq!(formatted, "1. Mix\n\n2. Bake");
        assert_eq!(parse_steps(&formatted), steps);
    }

    #[test]
    fn test_ingredients_to_text_keeps_notes() {
        let ingredients = vec![
            Ingredient::new("tomatoes", "4").with_note("ripe"),
            Ingredient::new("salt", ""),
        ];
        let text = ingredients_to_text(&ingredients);
        assert_eq!(text, "4 tomatoes (ripe)\nsalt");

        // Editing without changes keeps the note text.
        assert_eq!(ingredients_to_text(&parse_ingredients(&text)), text);
    }
}
