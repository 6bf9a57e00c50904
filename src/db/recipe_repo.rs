use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::{Difficulty, Recipe};

/// Combined search criteria. `None` means "any"; a max time of 0 means no limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub max_prep_time: Option<u32>,
    pub favorites_only: bool,
    pub query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Updated(i64),
}

impl UpsertOutcome {
    pub fn id(&self) -> i64 {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => *id,
        }
    }
}

#[derive(Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
    changes: Arc<watch::Sender<u64>>,
}

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: i64,
    external_id: Option<String>,
    name: String,
    description: String,
    cover_image: Option<String>,
    prep_time: i64,
    servings: i64,
    difficulty: Option<String>,
    category: Option<String>,
    origin: Option<String>,
    ingredients: String,
    steps: String,
    tags: String,
    created_at: String,
    updated_at: String,
    favorite: bool,
    owner_id: Option<String>,
}

impl RecipeRow {
    fn into_recipe(self) -> Recipe {
        Recipe {
            id: self.id,
            external_id: self.external_id,
            name: self.name,
            description: self.description,
            cover_image: self.cover_image,
            prep_time: u32::try_from(self.prep_time).unwrap_or(0),
            servings: u32::try_from(self.servings).unwrap_or(0),
            difficulty: self.difficulty.and_then(|d| d.parse().ok()),
            category: self.category,
            origin: self.origin,
            ingredients: serde_json::from_str(&self.ingredients).unwrap_or_default(),
            steps: serde_json::from_str(&self.steps).unwrap_or_default(),
            tags: serde_json::from_str(&self.tags).unwrap_or_default(),
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
            favorite: self.favorite,
            owner_id: self.owner_id,
        }
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// Fixed width so that ORDER BY on the text column is chronological.
fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Column values shared by INSERT and UPDATE.
struct Columns {
    ingredients: String,
    steps: String,
    tags: String,
    difficulty: Option<&'static str>,
    created_at: String,
    updated_at: String,
}

impl Columns {
    fn of(recipe: &Recipe) -> Self {
        Self {
            ingredients: serde_json::to_string(&recipe.ingredients)
                .unwrap_or_else(|_| "[]".to_string()),
            steps: serde_json::to_string(&recipe.steps).unwrap_or_else(|_| "[]".to_string()),
            tags: serde_json::to_string(&recipe.tags).unwrap_or_else(|_| "[]".to_string()),
            difficulty: recipe.difficulty.map(|d| d.as_str()),
            created_at: format_timestamp(&recipe.created_at),
            updated_at: format_timestamp(&recipe.updated_at),
        }
    }
}

async fn insert_with(conn: &mut SqliteConnection, recipe: &Recipe) -> Result<i64, sqlx::Error> {
    let cols = Columns::of(recipe);

    let result = sqlx::query(
        r#"
        INSERT INTO recipes (external_id, name, description, cover_image, prep_time, servings,
            difficulty, category, origin, ingredients, steps, tags, created_at, updated_at,
            favorite, owner_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&recipe.external_id)
    .bind(&recipe.name)
    .bind(&recipe.description)
    .bind(&recipe.cover_image)
    .bind(i64::from(recipe.prep_time))
    .bind(i64::from(recipe.servings))
    .bind(cols.difficulty)
    .bind(&recipe.category)
    .bind(&recipe.origin)
    .bind(&cols.ingredients)
    .bind(&cols.steps)
    .bind(&cols.tags)
    .bind(&cols.created_at)
    .bind(&cols.updated_at)
    .bind(recipe.favorite)
    .bind(&recipe.owner_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn update_with(
    conn: &mut SqliteConnection,
    id: i64,
    recipe: &Recipe,
) -> Result<u64, sqlx::Error> {
    let cols = Columns::of(recipe);

    let result = sqlx::query(
        r#"
        UPDATE recipes
        SET external_id = ?, name = ?, description = ?, cover_image = ?, prep_time = ?,
            servings = ?, difficulty = ?, category = ?, origin = ?, ingredients = ?, steps = ?,
            tags = ?, created_at = ?, updated_at = ?, favorite = ?, owner_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&recipe.external_id)
    .bind(&recipe.name)
    .bind(&recipe.description)
    .bind(&recipe.cover_image)
    .bind(i64::from(recipe.prep_time))
    .bind(i64::from(recipe.servings))
    .bind(cols.difficulty)
    .bind(&recipe.category)
    .bind(&recipe.origin)
    .bind(&cols.ingredients)
    .bind(&cols.steps)
    .bind(&cols.tags)
    .bind(&cols.created_at)
    .bind(&cols.updated_at)
    .bind(recipe.favorite)
    .bind(&recipe.owner_id)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

async fn upsert_with(
    conn: &mut SqliteConnection,
    recipe: &Recipe,
) -> Result<UpsertOutcome, sqlx::Error> {
    let existing: Option<(i64, bool)> = match &recipe.external_id {
        Some(external_id) => {
            sqlx::query_as("SELECT id, favorite FROM recipes WHERE external_id = ?")
                .bind(external_id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => None,
    };

    match existing {
        // Favorites are never mirrored, so the local flag survives the overwrite.
        Some((id, favorite)) => {
            let merged = Recipe {
                favorite,
                ..recipe.clone()
            };
            update_with(conn, id, &merged).await?;
            Ok(UpsertOutcome::Updated(id))
        }
        None => insert_with(conn, recipe).await.map(UpsertOutcome::Inserted),
    }
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            pool,
            changes: Arc::new(changes),
        }
    }

    /// Receiver whose value is bumped after every committed write. Screens
    /// that show query results re-run their query when it changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    /// Inserts a recipe and returns its new local id. `recipe.id` is ignored.
    pub async fn insert(&self, recipe: &Recipe) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_with(&mut *conn, recipe).await?;
        self.notify();
        Ok(id)
    }

    pub async fn insert_all(&self, recipes: &[Recipe]) -> Result<Vec<i64>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            ids.push(insert_with(&mut *tx, recipe).await?);
        }
        tx.commit().await?;
        self.notify();
        Ok(ids)
    }

    /// Overwrites the row with `recipe.id`. Timestamps are stored as carried.
    pub async fn update(&self, recipe: &Recipe) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        let affected = update_with(&mut *conn, recipe.id, recipe).await?;
        if affected == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        self.notify();
        Ok(())
    }

    pub async fn set_external_id(&self, id: i64, external_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE recipes SET external_id = ? WHERE id = ?")
            .bind(external_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.notify();
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.notify();
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM recipes")
            .execute(&self.pool)
            .await?;
        self.notify();
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Recipe>, sqlx::Error> {
        let row: Option<RecipeRow> = sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RecipeRow::into_recipe))
    }

    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Recipe>, sqlx::Error> {
        let row: Option<RecipeRow> =
            sqlx::query_as("SELECT * FROM recipes WHERE external_id = ?")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(RecipeRow::into_recipe))
    }

    /// All recipes, newest first.
    pub async fn list(&self) -> Result<Vec<Recipe>, sqlx::Error> {
        self.fetch("SELECT * FROM recipes ORDER BY created_at DESC, id DESC")
            .await
    }

    pub async fn favorites(&self) -> Result<Vec<Recipe>, sqlx::Error> {
        self.fetch("SELECT * FROM recipes WHERE favorite = 1 ORDER BY created_at DESC, id DESC")
            .await
    }

    pub async fn set_favorite(&self, id: i64, favorite: bool) -> Result<(), sqlx::Error> {
        let result = sqlx::query("UPDATE recipes SET favorite = ? WHERE id = ?")
            .bind(favorite)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        self.notify();
        Ok(())
    }

    /// Case-insensitive substring match on the name.
    pub async fn search_by_name(&self, query: &str) -> Result<Vec<Recipe>, sqlx::Error> {
        self.filter(&RecipeFilter {
            query: Some(query.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<Recipe>, sqlx::Error> {
        self.filter(&RecipeFilter {
            category: Some(category.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn by_difficulty(&self, difficulty: Difficulty) -> Result<Vec<Recipe>, sqlx::Error> {
        self.filter(&RecipeFilter {
            difficulty: Some(difficulty),
            ..Default::default()
        })
        .await
    }

    /// Recipes that take at most `max` minutes, quickest first.
    pub async fn by_max_prep_time(&self, max: u32) -> Result<Vec<Recipe>, sqlx::Error> {
        let rows: Vec<RecipeRow> = sqlx::query_as(
            "SELECT * FROM recipes WHERE prep_time <= ? ORDER BY prep_time ASC, id ASC",
        )
        .bind(i64::from(max))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RecipeRow::into_recipe).collect())
    }

    pub async fn filter(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM recipes WHERE 1 = 1");

        if let Some(category) = &filter.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(difficulty) = filter.difficulty {
            builder
                .push(" AND difficulty = ")
                .push_bind(difficulty.as_str());
        }
        if let Some(max) = filter.max_prep_time.filter(|max| *max > 0) {
            builder
                .push(" AND prep_time <= ")
                .push_bind(i64::from(max));
        }
        if filter.favorites_only {
            builder.push(" AND favorite = 1");
        }
        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows: Vec<RecipeRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let recipes = rows.into_iter().map(RecipeRow::into_recipe);

        // SQLite's LOWER only folds ASCII, so names are matched here instead.
        match filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                let needle = query.to_lowercase();
                Ok(recipes
                    .filter(|recipe| recipe.name.to_lowercase().contains(&needle))
                    .collect())
            }
            None => Ok(recipes.collect()),
        }
    }

    /// Distinct non-empty categories in use, sorted.
    pub async fn categories(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT category FROM recipes WHERE category IS NOT NULL AND category != '' ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Removes recipes without ingredients or without steps. Returns how many.
    pub async fn delete_incomplete(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recipes WHERE ingredients = '[]' OR steps = '[]'")
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            self.notify();
        }
        Ok(result.rows_affected())
    }

    /// Updates the row holding `recipe.external_id`, keeping its local id, or
    /// inserts a new row when there is none.
    pub async fn upsert_by_external_id(&self, recipe: &Recipe) -> Result<UpsertOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let outcome = upsert_with(&mut *tx, recipe).await?;
        tx.commit().await?;
        self.notify();
        Ok(outcome)
    }

    /// Merges a batch by external id in a single transaction; nothing is
    /// written if any row fails.
    pub async fn upsert_all_by_external_id(
        &self,
        recipes: &[Recipe],
    ) -> Result<Vec<UpsertOutcome>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            outcomes.push(upsert_with(&mut *tx, recipe).await?);
        }
        tx.commit().await?;
        self.notify();
        Ok(outcomes)
    }

    async fn fetch(&self, sql: &'static str) -> Result<Vec<Recipe>, sqlx::Error> {
        let rows: Vec<RecipeRow> = sqlx::query_as(sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(RecipeRow::into_recipe).collect())
    }
}
