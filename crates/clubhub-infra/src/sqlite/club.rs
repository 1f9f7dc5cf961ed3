//! SQLite club directory.
//!
//! Names are unique ignoring case: the lower-cased name is stored in
//! `name_key`, which carries the UNIQUE constraint. Field lengths are
//! enforced by CHECK constraints and surface as `ClubError::Validation`.

use sqlx::Row;
use uuid::Uuid;

use clubhub_core::club::ClubDirectory;
use clubhub_types::club::{Club, ClubQuery, NewClub};
use clubhub_types::error::ClubError;

use super::pool::DatabasePool;
use super::session::{format_datetime, parse_datetime, parse_uuid};

pub struct SqliteClubDirectory {
    pool: DatabasePool,
}

impl SqliteClubDirectory {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ClubRow {
    id: String,
    name: String,
    description: String,
    category: String,
    city: Option<String>,
    owner_id: String,
    created_at: String,
}

impl ClubRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            city: row.try_get("city")?,
            owner_id: row.try_get("owner_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_club(self) -> Result<Club, ClubError> {
        Ok(Club {
            id: parse_uuid(&self.id, "club id")?,
            name: self.name,
            description: self.description,
            category: self.category,
            city: self.city,
            owner_id: self.owner_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn storage_err(e: sqlx::Error) -> ClubError {
    ClubError::Storage(e.to_string())
}

fn into_clubs(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Club>, ClubError> {
    let mut clubs = Vec::with_capacity(rows.len());
    for row in rows {
        clubs.push(ClubRow::from_row(row).map_err(storage_err)?.into_club()?);
    }
    Ok(clubs)
}

impl ClubDirectory for SqliteClubDirectory {
    async fn create_club(&self, club: &NewClub) -> Result<Club, ClubError> {
        let created = Club {
            id: Uuid::now_v7(),
            name: club.name.clone(),
            description: club.description.clone(),
            category: club.category.clone(),
            city: club.city.clone(),
            owner_id: club.owner_id.clone(),
            created_at: chrono::Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO clubs (id, name, name_key, description, category, city, owner_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(created.id.to_string())
        .bind(&created.name)
        .bind(created.name.to_lowercase())
        .bind(&created.description)
        .bind(&created.category)
        .bind(&created.city)
        .bind(&created.owner_id)
        .bind(format_datetime(&created.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ClubError::DuplicateName(club.name.clone())
            }
            sqlx::Error::Database(db) if db.is_check_violation() => {
                ClubError::Validation(db.message().to_string())
            }
            other => storage_err(other),
        })?;

        Ok(created)
    }

    async fn search_clubs(&self, query: &ClubQuery) -> Result<Vec<Club>, ClubError> {
        let text = query.text.as_deref().map(str::to_lowercase);
        let rows = sqlx::query(
            r#"SELECT * FROM clubs
               WHERE (?1 IS NULL OR instr(name_key, ?1) > 0 OR instr(lower(description), ?1) > 0)
                 AND (?2 IS NULL OR lower(category) = lower(?2))
                 AND (?3 IS NULL OR lower(city) = lower(?3))
               ORDER BY created_at DESC, rowid DESC
               LIMIT ?4"#,
        )
        .bind(text)
        .bind(&query.category)
        .bind(&query.city)
        .bind(query.limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(storage_err)?;

        into_clubs(&rows)
    }

    async fn clubs_owned_by(&self, owner_id: &str) -> Result<Vec<Club>, ClubError> {
        let rows = sqlx::query("SELECT * FROM clubs WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC")
            .bind(owner_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(storage_err)?;

        into_clubs(&rows)
    }
}
