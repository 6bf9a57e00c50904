mod category;
mod difficulty;
mod ingredient;
mod recipe;
mod step;
mod user;

pub use category::Category;
pub use difficulty::Difficulty;
pub use ingredient::Ingredient;
pub use recipe::Recipe;
pub use step::Step;
pub use user::User;
