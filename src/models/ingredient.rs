use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    pub name: String,
    /// Free-form amount as typed or scraped ("200g", "2 cups", "").
    #[serde(default)]
    pub quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Single-line rendering: quantity, name, then the note in parentheses.
    pub fn full_text(&self) -> String {
        let mut text = String::new();
        if !self.quantity.is_empty() {
            text.push_str(&self.quantity);
            text.push(' ');
        }
        text.push_str(&self.name);
        if let Some(note) = self.note.as_deref().filter(|n| !n.is_empty()) {
            text.push_str(" (");
            text.push_str(note);
            text.push(')');
        }
        text
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_text())
    }
}
