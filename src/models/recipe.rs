use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::difficulty::Difficulty;
use super::ingredient::Ingredient;
use super::step::Step;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    /// Local id assigned by the local store; 0 until the recipe is saved.
    pub id: i64,
    /// Id of the remote counterpart, once mirrored.
    pub external_id: Option<String>,
    pub name: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub prep_time: u32, // minutes
    pub servings: u32,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub origin: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorite: bool,
    pub owner_id: Option<String>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            external_id: None,
            name: name.into(),
            description: description.into(),
            cover_image: None,
            prep_time: 0,
            servings: 0,
            difficulty: None,
            category: None,
            origin: None,
            ingredients: Vec::new(),
            steps: Vec::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            favorite: false,
            owner_id: None,
        }
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    /// Replaces the steps and renumbers them densely from 1.
    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self.renumber_steps();
        self
    }

    pub fn with_prep_time(mut self, minutes: u32) -> Self {
        self.prep_time = minutes;
        self
    }

    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = servings;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_cover_image(mut self, path: impl Into<String>) -> Self {
        self.cover_image = Some(path.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Vec::new();
        for tag in tags {
            self.add_tag(tag);
        }
        self
    }

    pub fn add_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.push(ingredient);
    }

    /// Appends a step, numbering it after the current last step.
    pub fn add_step(&mut self, text: impl Into<String>) {
        let number = self.steps.len() as u32 + 1;
        self.steps.push(Step::new(number, text));
    }

    /// Adds a tag unless it is already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn renumber_steps(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.number = index as u32 + 1;
        }
    }

    /// "35 min" below an hour, "1h 30min" or "2h" above.
    pub fn formatted_prep_time(&self) -> String {
        if self.prep_time < 60 {
            return format!("{} min", self.prep_time);
        }
        let hours = self.prep_time / 60;
        let minutes = self.prep_time % 60;
        if minutes > 0 {
            format!("{}h {}min", hours, minutes)
        } else {
            format!("{}h", hours)
        }
    }

    /// A recipe with neither ingredients nor steps is considered incomplete.
    pub fn is_complete(&self) -> bool {
        !self.ingredients.is_empty() && !self.steps.is_empty()
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = if self.favorite {
            format!("{} ★", self.name)
        } else {
            self.name.clone()
        };
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.chars().count()))?;

        if !self.description.is_empty() {
            writeln!(f, "{}\n", self.description)?;
        }

        if self.prep_time > 0 {
            writeln!(f, "Time: {}", self.formatted_prep_time())?;
        }
        if self.servings > 0 {
            writeln!(f, "Servings: {}", self.servings)?;
        }
        if let Some(difficulty) = self.difficulty {
            writeln!(f, "Difficulty: {}", difficulty)?;
        }
        if let Some(category) = &self.category {
            writeln!(f, "Category: {}", category)?;
        }
        if let Some(origin) = &self.origin {
            writeln!(f, "Origin: {}", origin)?;
        }
        if !self.tags.is_empty() {
            writeln!(f, "Tags: {}", self.tags.join(", "))?;
        }
        if let Some(image) = &self.cover_image {
            writeln!(f, "Image: {}", image)?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.steps.is_empty() {
            writeln!(f, "\nSteps:")?;
            for step in &self.steps {
                writeln!(f, "  {}. {}", step.number, step.text)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_new() {
        let recipe = Recipe::new("Tortilla", "Spanish omelette");
        assert_eq!(recipe.id, 0);
        assert_eq!(recipe.name, "Tortilla");
        assert!(recipe.external_id.is_none());
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.steps.is_empty());
        assert!(!recipe.favorite);
        assert_eq!(recipe.created_at, recipe.updated_at);
    }

    #[test]
    fn test_add_step_numbers_densely() {
        let mut recipe = Recipe::new("Soup", "");
        recipe.add_step("Boil water");
        recipe.add_step("Add vegetables");
        assert_eq!(recipe.steps[0].number, 1);
        assert_eq!(recipe.steps[1].number, 2);
    }

    #[test]
    fn test_with_steps_renumbers() {
        let recipe = Recipe::new("Soup", "").with_steps(vec![
            Step::new(7, "first"),
            Step::new(3, "second"),
            Step::new(3, "third"),
        ]);
        let numbers: Vec<u32> = recipe.steps.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_add_tag_dedupes() {
        let mut recipe = Recipe::new("Salad", "");
        recipe.add_tag("quick");
        recipe.add_tag("vegan");
        recipe.add_tag("quick");
        assert_eq!(recipe.tags, vec!["quick", "vegan"]);

        let recipe = Recipe::new("Salad", "").with_tags(vec!["a".into(), "a".into()]);
        assert_eq!(recipe.tags, vec!["a"]);
    }

    #[test]
    fn test_formatted_prep_time() {
        assert_eq!(Recipe::new("a", "").with_prep_time(35).formatted_prep_time(), "35 min");
        assert_eq!(Recipe::new("a", "").with_prep_time(90).formatted_prep_time(), "1h 30min");
        assert_eq!(Recipe::new("a", "").with_prep_time(120).formatted_prep_time(), "2h");
        assert_eq!(Recipe::new("a", "").formatted_prep_time(), "0 min");
    }

    #[test]
    fn test_is_complete() {
        let mut recipe = Recipe::new("a", "");
        assert!(!recipe.is_complete());
        recipe.add_ingredient(Ingredient::new("egg", "1"));
        assert!(!recipe.is_complete());
        recipe.add_step("Cook it");
        assert!(recipe.is_complete());
    }

    #[test]
    fn test_recipe_display() {
        let mut recipe = Recipe::new("Pancakes", "Fluffy")
            .with_servings(4)
            .with_prep_time(20)
            .with_difficulty(Difficulty::Easy)
            .with_ingredients(vec![Ingredient::new("flour", "200g")]);
        recipe.add_step("Mix everything");

        let output = format!("{}", recipe);
        assert!(output.contains("Pancakes"));
        assert!(output.contains("Servings: 4"));
        assert!(output.contains("Time: 20 min"));
        assert!(output.contains("Difficulty: easy"));
        assert!(output.contains("200g flour"));
        assert!(output.contains("1. Mix everything"));
    }
}
