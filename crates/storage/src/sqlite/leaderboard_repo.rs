use quiz_core::model::LeaderboardEntry;
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{LeaderboardRepository, LeaderboardRow, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn map_entry_row(row: &sqlx::sqlite::SqliteRow) -> Result<LeaderboardRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let name: String = row.try_get("name").map_err(ser)?;
    let email: String = row.try_get("email").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let max_score = u32_from_i64(
        "max_score",
        row.try_get::<i64, _>("max_score").map_err(ser)?,
    )?;
    let date: String = row.try_get("date").map_err(ser)?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;

    let entry = LeaderboardEntry::from_persisted(name, email, score, max_score, date, recorded_at)
        .map_err(ser)?;
    Ok(LeaderboardRow::new(id, entry))
}

#[async_trait::async_trait]
impl LeaderboardRepository for SqliteRepository {
    async fn append_entry(&self, entry: &LeaderboardEntry) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO leaderboard_entries (
                    name, email, score, max_score, date, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(entry.name())
        .bind(entry.email())
        .bind(i64::from(entry.score()))
        .bind(i64::from(entry.max_score()))
        .bind(entry.date())
        .bind(entry.recorded_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn top_entries(&self, limit: u32) -> Result<Vec<LeaderboardRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, name, email, score, max_score, date, recorded_at
                FROM leaderboard_entries
                ORDER BY score DESC, id ASC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_entry_row(&row)?);
        }
        Ok(out)
    }

    async fn list_entries(&self) -> Result<Vec<LeaderboardRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, name, email, score, max_score, date, recorded_at
                FROM leaderboard_entries
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_entry_row(&row)?);
        }
        Ok(out)
    }
}
