use clap::{Args, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use super::{truncate, Context, OutputFormat};
use recetario::db::RecipeFilter;
use recetario::images::ImageStore;
use recetario::models::{Category, Difficulty, Recipe};
use recetario::parser::{parse_ingredients, parse_steps};
use recetario::sync::WriteOutcome;
use recetario::validation::{parse_int_or_default, validate_recipe_form};

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// Create a new recipe
    Create {
        /// Name of the recipe
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Ingredient line, e.g. "200g flour" (can be repeated)
        #[arg(long = "ingredient", value_name = "LINE")]
        ingredients: Vec<String>,

        /// Preparation step (can be repeated)
        #[arg(long = "step", value_name = "TEXT")]
        steps: Vec<String>,

        /// Prep time in minutes
        #[arg(long, default_value = "")]
        prep_time: String,

        /// Number of servings
        #[arg(long, default_value = "")]
        servings: String,

        #[arg(long)]
        difficulty: Option<Difficulty>,

        #[arg(long)]
        category: Option<Category>,

        /// Tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Cover image file to attach
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// List all recipes, newest first
    List {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only favorites
        #[arg(long)]
        favorites: bool,
    },

    /// Show a recipe's details
    Show {
        /// Recipe id
        id: i64,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing recipe
    Update {
        /// Recipe id
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Replace all ingredients (can be repeated)
        #[arg(long = "ingredient", value_name = "LINE")]
        ingredients: Vec<String>,

        /// Replace all steps (can be repeated)
        #[arg(long = "step", value_name = "TEXT")]
        steps: Vec<String>,

        #[arg(long)]
        prep_time: Option<u32>,

        #[arg(long)]
        servings: Option<u32>,

        #[arg(long)]
        difficulty: Option<Difficulty>,

        #[arg(long)]
        category: Option<Category>,

        /// Add a tag (can be repeated)
        #[arg(long = "add-tag", value_name = "TAG")]
        add_tags: Vec<String>,

        /// Remove a tag (can be repeated)
        #[arg(long = "remove-tag", value_name = "TAG")]
        remove_tags: Vec<String>,
    },

    /// Delete a recipe
    Delete {
        /// Recipe id
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Mark or unmark a recipe as favorite
    Fav {
        /// Recipe id
        id: i64,

        /// Remove the favorite mark instead
        #[arg(long)]
        off: bool,
    },

    /// Search recipes by name
    Search {
        query: String,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Filter recipes by several criteria at once
    Filter {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// Maximum prep time in minutes (0 means no limit)
        #[arg(long)]
        max_time: Option<u32>,

        #[arg(long)]
        favorites: bool,

        /// Name must contain this text
        #[arg(long)]
        query: Option<String>,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List categories in use
    Categories,

    /// Count stored recipes
    Count,

    /// Delete recipes without ingredients or steps
    Cleanup {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Attach a cover image to a recipe
    AttachImage {
        /// Recipe id
        id: i64,

        /// Image file (JPEG, PNG, GIF, WebP or BMP)
        path: PathBuf,
    },
}

impl RecipeSubcommand {
    /// Commands that only read the local store.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            RecipeSubcommand::List { .. }
                | RecipeSubcommand::Show { .. }
                | RecipeSubcommand::Search { .. }
                | RecipeSubcommand::Filter { .. }
                | RecipeSubcommand::Categories
                | RecipeSubcommand::Count
        )
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn report_mirror(outcome: &WriteOutcome) {
    if let Some(e) = &outcome.remote_error {
        eprintln!("Warning: saved locally but not mirrored to the remote store: {}", e);
    }
}

pub(crate) fn print_recipes(recipes: &[Recipe], format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(recipes)?);
        }
        OutputFormat::Text => {
            if recipes.is_empty() {
                println!("No recipes found");
                return Ok(());
            }
            println!(
                "{:<6}  {:<30}  {:<12}  {:<8}  {:<6}  FAV",
                "ID", "NAME", "CATEGORY", "TIME", "LEVEL"
            );
            println!("{}", "-".repeat(80));
            for recipe in recipes {
                println!(
                    "{:<6}  {:<30}  {:<12}  {:<8}  {:<6}  {}",
                    recipe.id,
                    truncate(&recipe.name, 30),
                    truncate(recipe.category.as_deref().unwrap_or("-"), 12),
                    recipe.formatted_prep_time(),
                    recipe.difficulty.map(|d| d.as_str()).unwrap_or("-"),
                    if recipe.favorite { "★" } else { "" }
                );
            }
            println!("\nTotal: {} recipe(s)", recipes.len());
        }
    }
    Ok(())
}

async fn find(ctx: &Context, id: i64) -> Result<Recipe, Box<dyn std::error::Error>> {
    ctx.repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| format!("Recipe not found: {}", id).into())
}

impl RecipeCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            RecipeSubcommand::Create {
                name,
                description,
                ingredients,
                steps,
                prep_time,
                servings,
                difficulty,
                category,
                tags,
                image,
            } => {
                let ingredients_text = ingredients.join("\n");
                let steps_text = steps.join("\n");
                validate_recipe_form(name, &ingredients_text, &steps_text)?;

                let mut recipe = Recipe::new(name.trim(), description.trim())
                    .with_ingredients(parse_ingredients(&ingredients_text))
                    .with_steps(parse_steps(&steps_text))
                    .with_prep_time(parse_int_or_default(prep_time, 0))
                    .with_servings(parse_int_or_default(servings, 0))
                    .with_tags(tags.clone());
                if let Some(difficulty) = difficulty {
                    recipe = recipe.with_difficulty(*difficulty);
                }
                if let Some(category) = category {
                    recipe = recipe.with_category(category.label());
                }
                let outcome = match image {
                    Some(path) => {
                        let store = ImageStore::new(ctx.config.images_dir());
                        ctx.service.create_with_cover(recipe, &store, path).await?
                    }
                    None => ctx.service.create(recipe).await?,
                };
                report_mirror(&outcome);
                println!("Created recipe:");
                println!("{}", outcome.recipe);
                Ok(())
            }

            RecipeSubcommand::List { format, favorites } => {
                let recipes = if *favorites {
                    ctx.repo.favorites().await?
                } else {
                    ctx.repo.list().await?
                };
                print_recipes(&recipes, *format)
            }

            RecipeSubcommand::Show { id, format } => {
                let recipe = find(ctx, *id).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&recipe)?),
                    OutputFormat::Text => println!("{}", recipe),
                }
                Ok(())
            }

            RecipeSubcommand::Update {
                id,
                name,
                description,
                ingredients,
                steps,
                prep_time,
                servings,
                difficulty,
                category,
                add_tags,
                remove_tags,
            } => {
                let has_updates = name.is_some()
                    || description.is_some()
                    || !ingredients.is_empty()
                    || !steps.is_empty()
                    || prep_time.is_some()
                    || servings.is_some()
                    || difficulty.is_some()
                    || category.is_some()
                    || !add_tags.is_empty()
                    || !remove_tags.is_empty();
                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut recipe = find(ctx, *id).await?;

                if let Some(new_name) = name {
                    recipe.name = new_name.trim().to_string();
                }
                if let Some(new_description) = description {
                    recipe.description = new_description.trim().to_string();
                }
                if !ingredients.is_empty() {
                    recipe.ingredients = parse_ingredients(&ingredients.join("\n"));
                }
                if !steps.is_empty() {
                    recipe.steps = parse_steps(&steps.join("\n"));
                }
                if let Some(minutes) = prep_time {
                    recipe.prep_time = *minutes;
                }
                if let Some(count) = servings {
                    recipe.servings = *count;
                }
                if let Some(level) = difficulty {
                    recipe.difficulty = Some(*level);
                }
                if let Some(category) = category {
                    recipe.category = Some(category.label().to_string());
                }
                for tag in add_tags {
                    recipe.add_tag(tag.clone());
                }
                for tag in remove_tags {
                    let tag_lower = tag.to_lowercase();
                    recipe.tags.retain(|t| t.to_lowercase() != tag_lower);
                }

                let outcome = ctx.service.update(recipe).await?;
                report_mirror(&outcome);
                println!("Updated recipe:");
                println!("{}", outcome.recipe);
                Ok(())
            }

            RecipeSubcommand::Delete { id, force } => {
                let recipe = find(ctx, *id).await?;

                if !force && !confirm(&format!("Delete recipe '{}'?", recipe.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                let cover = recipe.cover_image.clone();
                let outcome = ctx.service.delete(recipe).await?;
                report_mirror(&outcome);

                if let Some(path) = cover {
                    let store = ImageStore::new(ctx.config.images_dir());
                    let path = PathBuf::from(path);
                    if path.starts_with(store.dir()) {
                        store.remove(&path)?;
                    }
                }

                println!("Deleted recipe: {}", outcome.recipe.name);
                Ok(())
            }

            RecipeSubcommand::Fav { id, off } => {
                let recipe = find(ctx, *id).await?;
                ctx.service.set_favorite(recipe.id, !off).await?;
                if *off {
                    println!("Removed '{}' from favorites", recipe.name);
                } else {
                    println!("Added '{}' to favorites", recipe.name);
                }
                Ok(())
            }

            RecipeSubcommand::Search { query, format } => {
                let recipes = ctx.repo.search_by_name(query).await?;
                print_recipes(&recipes, *format)
            }

            RecipeSubcommand::Filter {
                category,
                difficulty,
                max_time,
                favorites,
                query,
                format,
            } => {
                let filter = RecipeFilter {
                    category: category.clone(),
                    difficulty: *difficulty,
                    max_prep_time: *max_time,
                    favorites_only: *favorites,
                    query: query.clone(),
                };
                let recipes = ctx.repo.filter(&filter).await?;
                print_recipes(&recipes, *format)
            }

            RecipeSubcommand::Categories => {
                let categories = ctx.repo.categories().await?;
                if categories.is_empty() {
                    println!("No categories in use");
                }
                for category in categories {
                    println!("{}", category);
                }
                Ok(())
            }

            RecipeSubcommand::Count => {
                println!("{}", ctx.repo.count().await?);
                Ok(())
            }

            RecipeSubcommand::Cleanup { force } => {
                if !force && !confirm("Delete every recipe without ingredients or steps?")? {
                    println!("Cleanup cancelled.");
                    return Ok(());
                }
                let removed = ctx.repo.delete_incomplete().await?;
                println!("Removed {} incomplete recipe(s)", removed);
                Ok(())
            }

            RecipeSubcommand::AttachImage { id, path } => {
                let mut recipe = find(ctx, *id).await?;
                let store = ImageStore::new(ctx.config.images_dir());
                let stored = store.save_file(path)?;

                let previous = recipe.cover_image.replace(stored.to_string_lossy().into_owned());
                let outcome = ctx.service.update(recipe).await?;
                report_mirror(&outcome);

                if let Some(old) = previous.map(PathBuf::from) {
                    if old != stored && old.starts_with(store.dir()) {
                        store.remove(&old)?;
                    }
                }

                println!("Attached image: {}", stored.display());
                Ok(())
            }
        }
    }
}
