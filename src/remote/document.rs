use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::models::{Ingredient, Recipe, Step};

/// A recipe as stored remotely: a loosely typed JSON object with camelCase keys.
///
/// Documents may have been written by other clients, so reading is lenient:
/// missing or mistyped fields fall back to defaults instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeDocument(pub Map<String, Value>);

/// One entry of a remote listing: the document with its remote id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecipe {
    pub id: String,
    pub data: RecipeDocument,
}

impl RecipeDocument {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        let mut map = Map::new();
        map.insert("name".into(), json!(recipe.name));
        map.insert("description".into(), json!(recipe.description));
        map.insert("coverImage".into(), json!(recipe.cover_image));
        map.insert("prepTime".into(), json!(recipe.prep_time));
        map.insert("servings".into(), json!(recipe.servings));
        map.insert(
            "difficulty".into(),
            json!(recipe.difficulty.map(|d| d.as_str())),
        );
        map.insert("category".into(), json!(recipe.category));
        map.insert("origin".into(), json!(recipe.origin));
        map.insert(
            "ingredients".into(),
            Value::Array(
                recipe
                    .ingredients
                    .iter()
                    .map(|i| json!({ "name": i.name, "quantity": i.quantity, "note": i.note }))
                    .collect(),
            ),
        );
        map.insert(
            "steps".into(),
            Value::Array(
                recipe
                    .steps
                    .iter()
                    .map(|s| json!({ "number": s.number, "text": s.text }))
                    .collect(),
            ),
        );
        map.insert("tags".into(), json!(recipe.tags));
        map.insert(
            "createdAt".into(),
            json!(recipe.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        map.insert(
            "updatedAt".into(),
            json!(recipe.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        map.insert("favorite".into(), json!(recipe.favorite));
        map.insert("ownerId".into(), json!(recipe.owner_id));
        Self(map)
    }

    /// Builds a local recipe (unsaved, `id == 0`) carrying `external_id`.
    pub fn to_recipe(&self, external_id: &str) -> Recipe {
        let mut recipe = Recipe::new(self.string("name"), self.string("description"));
        recipe.external_id = Some(external_id.to_string());
        recipe.cover_image = self.opt_string("coverImage");
        recipe.prep_time = self.uint("prepTime");
        recipe.servings = self.uint("servings");
        recipe.difficulty = self
            .opt_string("difficulty")
            .and_then(|d| d.parse().ok());
        recipe.category = self.opt_string("category");
        recipe.origin = self.opt_string("origin");
        recipe.ingredients = self.ingredients();
        recipe.steps = self.steps();
        recipe.tags = Vec::new();
        for tag in self.list("tags").iter().filter_map(scalar_to_string) {
            recipe.add_tag(tag);
        }
        if let Some(created) = self.timestamp("createdAt") {
            recipe.created_at = created;
        }
        recipe.updated_at = self.timestamp("updatedAt").unwrap_or(recipe.created_at);
        recipe.favorite = self.boolean("favorite");
        recipe.owner_id = self.opt_string("ownerId");
        recipe
    }

    pub fn owner_id(&self) -> Option<String> {
        self.opt_string("ownerId")
    }

    pub fn set_owner_id(&mut self, owner_id: &str) {
        self.0.insert("ownerId".into(), json!(owner_id));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn string(&self, key: &str) -> String {
        self.opt_string(key).unwrap_or_default()
    }

    pub fn opt_string(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(scalar_to_string)
    }

    /// Any JSON number (or numeric string) truncated into `u32`; 0 otherwise.
    pub fn uint(&self, key: &str) -> u32 {
        self.0.get(key).map(value_to_u32).unwrap_or(0)
    }

    pub fn boolean(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn list(&self, key: &str) -> &[Value] {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }

    fn ingredients(&self) -> Vec<Ingredient> {
        self.list("ingredients")
            .iter()
            .filter_map(|item| match item {
                Value::Object(fields) => {
                    let name = fields.get("name").and_then(scalar_to_string)?;
                    let quantity = fields
                        .get("quantity")
                        .and_then(scalar_to_string)
                        .unwrap_or_default();
                    let mut ingredient = Ingredient::new(name, quantity);
                    ingredient.note = fields
                        .get("note")
                        .and_then(scalar_to_string)
                        .filter(|n| !n.is_empty());
                    Some(ingredient)
                }
                // Older documents stored plain strings.
                Value::String(name) => Some(Ingredient::new(name.as_str(), "")),
                _ => None,
            })
            .collect()
    }

    fn steps(&self) -> Vec<Step> {
        let mut steps: Vec<Step> = self
            .list("steps")
            .iter()
            .filter_map(|item| match item {
                Value::Object(fields) => {
                    let text = fields.get("text").and_then(scalar_to_string)?;
                    let number = fields.get("number").map(value_to_u32).unwrap_or(0);
                    Some(Step::new(number, text))
                }
                Value::String(text) => Some(Step::new(0, text.as_str())),
                _ => None,
            })
            .collect();
        for (index, step) in steps.iter_mut().enumerate() {
            step.number = index as u32 + 1;
        }
        steps
    }

    /// RFC 3339 strings or epoch milliseconds.
    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.0.get(key)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
            _ => None,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_to_u32(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    fn doc(value: Value) -> RecipeDocument {
        match value {
            Value::Object(map) => RecipeDocument(map),
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_document_preserves_recipe_fields() {
        let mut recipe = Recipe::new("Flan", "Caramel custard")
            .with_ingredients(vec![Ingredient::new("eggs", "4").with_note("large")])
            .with_prep_time(50)
            .with_servings(6)
            .with_difficulty(Difficulty::Medium)
            .with_category("Desserts")
            .with_tags(vec!["classic".into()]);
        recipe.add_step("Make the caramel");
        recipe.favorite = true;
        recipe.owner_id = Some("u1".into());

        let document = RecipeDocument::from_recipe(&recipe);
        assert_eq!(document.get("prepTime"), Some(&json!(50)));
        assert_eq!(document.get("ownerId"), Some(&json!("u1")));

        let back = document.to_recipe("ext-9");
        assert_eq!(back.external_id.as_deref(), Some("ext-9"));
        assert_eq!(back.name, "Flan");
        assert_eq!(back.ingredients, recipe.ingredients);
        assert_eq!(back.steps, recipe.steps);
        assert_eq!(back.difficulty, Some(Difficulty::Medium));
        assert_eq!(back.tags, vec!["classic"]);
        assert!(back.favorite);
        assert_eq!(
            back.created_at.timestamp_millis(),
            recipe.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_lenient_getters() {
        let document = doc(json!({
            "name": 42,
            "prepTime": 12.7,
            "servings": "3",
            "favorite": 1,
            "difficulty": "Fácil",
            "tags": ["a", 2, null, "a"],
        }));
        let recipe = document.to_recipe("x");
        assert_eq!(recipe.name, "42");
        assert_eq!(recipe.prep_time, 12);
        assert_eq!(recipe.servings, 3);
        assert!(recipe.favorite);
        assert_eq!(recipe.difficulty, Some(Difficulty::Easy));
        assert_eq!(recipe.tags, vec!["a", "2"]);
        assert_eq!(recipe.description, "");
    }

    #[test]
    fn test_malformed_list_items_are_skipped() {
        let document = doc(json!({
            "name": "Soup",
            "ingredients": [{"name": "water", "quantity": 1}, {"quantity": "2"}, 7, "salt"],
            "steps": [{"number": 5, "text": "Boil"}, {"number": 6}, {"text": "Serve"}],
        }));
        let recipe = document.to_recipe("x");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].quantity, "1");
        assert_eq!(recipe.ingredients[1].name, "salt");
        assert_eq!(recipe.steps, vec![Step::new(1, "Boil"), Step::new(2, "Serve")]);
    }

    #[test]
    fn test_missing_fields_default() {
        let recipe = RecipeDocument::default().to_recipe("x");
        assert_eq!(recipe.name, "");
        assert_eq!(recipe.prep_time, 0);
        assert!(!recipe.favorite);
        assert!(recipe.owner_id.is_none());
        assert_eq!(recipe.created_at, recipe.updated_at);
    }

    #[test]
    fn test_epoch_millis_timestamp() {
        let document = doc(json!({ "createdAt": 1_700_000_000_000i64 }));
        let recipe = document.to_recipe("x");
        assert_eq!(recipe.created_at.timestamp(), 1_700_000_000);
    }
}
