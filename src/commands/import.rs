use clap::Args;

use super::{Context, OutputFormat};
use recetario::importer::{ImportedRecipe, WebImporter};

/// Import a recipe from a web page
#[derive(Args)]
pub struct ImportCommand {
    /// Page URL (recipe sites or YouTube videos)
    url: String,

    /// Save the result as a new recipe
    #[arg(long)]
    save: bool,

    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn print_imported(imported: &ImportedRecipe) {
    println!("Source:  {}", imported.source_url);
    println!("Origin:  {}", imported.origin);
    println!("Name:    {}", imported.name);
    println!("Category: {}", imported.category);
    if imported.prep_time > 0 {
        println!("Time:    {} min", imported.prep_time);
    }
    if imported.servings > 0 {
        println!("Servings: {}", imported.servings);
    }
    if let Some(image) = &imported.image_url {
        println!("Image:   {}", image);
    }

    println!("\nIngredients ({}):", imported.ingredients.len());
    for ingredient in &imported.ingredients {
        println!("  - {}", ingredient.full_text());
    }
    println!("\nSteps ({}):", imported.steps.len());
    for step in &imported.steps {
        println!("  {}. {}", step.number, step.text);
    }

    if !imported.provenance.is_empty() {
        println!("\nMatched rules:");
        for (field, matched) in &imported.provenance {
            println!("  {:<12} {} (#{})", format!("{:?}", field), matched.rule, matched.rank);
        }
    }
}

impl ImportCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        let importer = WebImporter::new()?;
        let imported = importer.import(&self.url).await?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&imported)?),
            OutputFormat::Text => print_imported(&imported),
        }

        if !self.save {
            return Ok(());
        }

        let recipe = imported.into_recipe();
        if recipe.name.trim().is_empty() {
            return Err("Imported page has no recipe name; not saved".into());
        }
        if !recipe.is_complete() {
            eprintln!("Warning: imported recipe has no ingredients or no steps");
        }

        let outcome = ctx.service.create(recipe).await?;
        if let Some(e) = &outcome.remote_error {
            eprintln!("Warning: saved locally but not mirrored to the remote store: {}", e);
        }
        println!("\nSaved as recipe {}", outcome.recipe.id);
        Ok(())
    }
}
