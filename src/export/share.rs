use crate::models::Recipe;

pub const SHARE_FOOTER: &str = "📱 Shared from Recetario";

/// Subject line used when handing the share text to another app.
pub fn share_subject(recipe: &Recipe) -> String {
    recipe.name.clone()
}

/// Plain-text rendering of a recipe for messaging apps.
pub fn share_text(recipe: &Recipe) -> String {
    let mut text = String::new();

    text.push_str(&format!("📖 {}\n\n", recipe.name));

    if !recipe.description.is_empty() {
        text.push_str(&recipe.description);
        text.push_str("\n\n");
    }

    text.push_str(&format!("⏱️ Time: {}\n", recipe.formatted_prep_time()));
    text.push_str(&format!("👥 Servings: {}\n", recipe.servings));
    let difficulty = recipe
        .difficulty
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    text.push_str(&format!("📊 Difficulty: {}\n\n", difficulty));

    text.push_str("🥘 INGREDIENTS:\n");
    for ingredient in &recipe.ingredients {
        text.push_str(&format!("• {}\n", ingredient.full_text()));
    }

    text.push_str("\n👨‍🍳 PREPARATION:\n");
    for (index, step) in recipe.steps.iter().enumerate() {
        text.push_str(&format!("{}. {}\n\n", index + 1, step.text));
    }

    text.push('\n');
    text.push_str(SHARE_FOOTER);
    text
}
