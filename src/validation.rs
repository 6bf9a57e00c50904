use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name is required")]
    MissingName,
    #[error("Ingredients are required")]
    MissingIngredients,
    #[error("Steps are required")]
    MissingSteps,
}

/// Checks the create/edit form fields in display order and reports the first
/// blank one.
pub fn validate_recipe_form(
    name: &str,
    ingredients_text: &str,
    steps_text: &str,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if ingredients_text.trim().is_empty() {
        return Err(ValidationError::MissingIngredients);
    }
    if steps_text.trim().is_empty() {
        return Err(ValidationError::MissingSteps);
    }
    Ok(())
}

pub fn parse_int_or_default(text: &str, default: u32) -> u32 {
    text.trim().parse().unwrap_or(default)
}
