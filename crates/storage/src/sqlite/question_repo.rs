use quiz_core::model::{Question, QuestionId};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{QuestionRecord, QuestionRepository, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let id = u64::try_from(id).map_err(|_| ser(format!("invalid question id: {id}")))?;
    let image: String = row.try_get("image").map_err(ser)?;
    let canonical_answer: String = row.try_get("canonical_answer").map_err(ser)?;
    let raw_answers: String = row.try_get("acceptable_answers").map_err(ser)?;
    let acceptable_answers: Vec<String> = serde_json::from_str(&raw_answers).map_err(ser)?;

    Question::new(QuestionId::new(id), image, canonical_answer, acceptable_answers).map_err(ser)
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn append_question(&self, record: &QuestionRecord) -> Result<i64, StorageError> {
        let answers = serde_json::to_string(&record.acceptable_answers).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO questions (date, image, canonical_answer, acceptable_answers)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(&record.date)
        .bind(&record.image)
        .bind(&record.canonical_answer)
        .bind(answers)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, image, canonical_answer, acceptable_answers
                FROM questions
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }
}
