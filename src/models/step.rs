use serde::{Deserialize, Serialize};
use std::fmt;

/// One instruction in a recipe. Numbers are 1-based and dense within a recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub number: u32,
    pub text: String,
}

impl Step {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.number, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_display() {
        let step = Step::new(2, "Whisk the eggs");
        assert_eq!(format!("{}", step), "Step 2: Whisk the eggs");
    }
}
