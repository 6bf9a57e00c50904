use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    uid: String,
    name: String,
    email: String,
    registered_at: String,
    last_seen_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            uid: row.uid,
            name: row.name,
            email: row.email,
            registered_at: parse_timestamp(&row.registered_at),
            last_seen_at: parse_timestamp(&row.last_seen_at),
        }
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts the user or replaces the cached copy with the same uid.
    pub async fn upsert(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (uid, name, email, registered_at, last_seen_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(uid) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                registered_at = excluded.registered_at,
                last_seen_at = excluded.last_seen_at
            "#,
        )
        .bind(&user.uid)
        .bind(&user.name)
        .bind(&user.email)
        .bind(format_timestamp(&user.registered_at))
        .bind(format_timestamp(&user.last_seen_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, uid: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE uid = ?")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    /// The cached user seen most recently; used as the identity while offline.
    pub async fn most_recent(&self) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users ORDER BY last_seen_at DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    pub async fn touch(&self, uid: &str, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_seen_at = ? WHERE uid = ?")
            .bind(format_timestamp(&at))
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, uid: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM users WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_upsert_and_get() {
        let repo = UserRepository::new(init_memory_db().await.unwrap());

        let mut user = User::new("u1", "Ana", "ana@example.com");
        repo.upsert(&user).await.unwrap();

        user.name = "Ana María".to_string();
        repo.upsert(&user).await.unwrap();

        let fetched = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(fetched.name, "Ana María");
        assert_eq!(fetched.email, "ana@example.com");
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_most_recent_follows_touch() {
        let repo = UserRepository::new(init_memory_db().await.unwrap());

        repo.upsert(&User::new("a", "A", "a@example.com")).await.unwrap();
        repo.upsert(&User::new("b", "B", "b@example.com")).await.unwrap();

        repo.touch("a", Utc::now() + Duration::minutes(5)).await.unwrap();
        assert_eq!(repo.most_recent().await.unwrap().unwrap().uid, "a");

        repo.touch("b", Utc::now() + Duration::minutes(10)).await.unwrap();
        assert_eq!(repo.most_recent().await.unwrap().unwrap().uid, "b");
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = UserRepository::new(init_memory_db().await.unwrap());

        repo.upsert(&User::new("a", "A", "")).await.unwrap();
        repo.upsert(&User::new("b", "B", "")).await.unwrap();

        repo.delete("a").await.unwrap();
        assert!(repo.get("a").await.unwrap().is_none());

        repo.delete_all().await.unwrap();
        assert!(repo.most_recent().await.unwrap().is_none());
    }
}
