use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use services::session::LEADERBOARD_PAGE_SIZE;
use storage::repository::{LeaderboardRow, QuestionRecord, Storage};

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
}

/// Build the router: the score read paths plus the admin question feed.
#[must_use]
pub fn app(storage: Storage) -> Router {
    Router::new()
        .route("/scores", get(list_scores))
        .route("/scores/top", get(top_scores))
        .route("/input", post(submit_question))
        .with_state(AppState { storage })
}

/// Wire shape for one leaderboard entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBody {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub score: u32,
    pub max_score: u32,
    pub date: String,
}

impl From<LeaderboardRow> for ScoreBody {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            id: row.id,
            name: row.entry.name().to_owned(),
            email: row.entry.email().to_owned(),
            score: row.entry.score(),
            max_score: row.entry.max_score(),
            date: row.entry.date().to_owned(),
        }
    }
}

async fn list_scores(State(state): State<AppState>) -> Result<Json<Vec<ScoreBody>>, ApiError> {
    let rows = state.storage.leaderboard.list_entries().await?;
    Ok(Json(rows.into_iter().map(ScoreBody::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<u32>,
}

async fn top_scores(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<ScoreBody>>, ApiError> {
    let limit = query.limit.unwrap_or(LEADERBOARD_PAGE_SIZE);
    let rows = state.storage.leaderboard.top_entries(limit).await?;
    Ok(Json(rows.into_iter().map(ScoreBody::from).collect()))
}

/// Wire shape for a question submission, field names as the admin feed sends
/// them.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub date: String,
    pub image: String,
    pub correct_answers: String,
    pub acceptable_answers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionCreated {
    pub id: i64,
}

async fn submit_question(
    State(state): State<AppState>,
    Json(input): Json<QuestionInput>,
) -> Result<Json<QuestionCreated>, ApiError> {
    let record = QuestionRecord {
        date: input.date,
        image: input.image,
        canonical_answer: input.correct_answers,
        acceptable_answers: input.acceptable_answers,
    };
    let id = state.storage.questions.append_question(&record).await?;
    tracing::info!(id, image = %record.image, "question appended");
    Ok(Json(QuestionCreated { id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use quiz_core::model::{LeaderboardEntry, Player};
    use quiz_core::time::fixed_now;
    use std::sync::Arc;
    use storage::repository::{LeaderboardRepository, StorageError};
    use tower::ServiceExt;

    fn entry(name: &str, score: u32) -> LeaderboardEntry {
        let player = Player::new(name, format!("{name}@x.com")).unwrap();
        LeaderboardEntry::new(&player, score, 6, fixed_now()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn scores_returns_the_full_entry_set() {
        let storage = Storage::in_memory();
        storage
            .leaderboard
            .append_entry(&entry("Victor", 6))
            .await
            .unwrap();
        storage
            .leaderboard
            .append_entry(&entry("Ada", 4))
            .await
            .unwrap();

        let response = app(storage)
            .oneshot(Request::get("/scores").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["name"], "Victor");
        assert_eq!(json[0]["maxScore"], 6);
        assert_eq!(json[0]["date"], "2023-11-14");
        assert_eq!(json[1]["name"], "Ada");
    }

    #[tokio::test]
    async fn top_scores_orders_and_limits() {
        let storage = Storage::in_memory();
        storage
            .leaderboard
            .append_entry(&entry("low", 1))
            .await
            .unwrap();
        storage
            .leaderboard
            .append_entry(&entry("high", 6))
            .await
            .unwrap();
        storage
            .leaderboard
            .append_entry(&entry("mid", 3))
            .await
            .unwrap();

        let response = app(storage)
            .oneshot(
                Request::get("/scores/top?limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["name"], "high");
        assert_eq!(json[1]["name"], "mid");
    }

    #[tokio::test]
    async fn input_appends_a_question_record() {
        let storage = Storage::in_memory();
        let payload = serde_json::json!({
            "date": "2024-01-20",
            "image": "itel.jpg",
            "correctAnswers": "Itel",
            "acceptableAnswers": ["itel", "itel store"],
        });

        let response = app(storage.clone())
            .oneshot(
                Request::post("/input")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["id"], 1);

        let questions = storage.questions.list_questions().await.unwrap();
        assert_eq!(questions.len(), 1);
        assert!(questions[0].matches("Itel Store"));
    }

    /// Leaderboard double whose reads always fail.
    struct OfflineLeaderboard;

    #[async_trait]
    impl LeaderboardRepository for OfflineLeaderboard {
        async fn append_entry(&self, _entry: &LeaderboardEntry) -> Result<i64, StorageError> {
            Err(StorageError::Connection("backend offline".into()))
        }

        async fn top_entries(&self, _limit: u32) -> Result<Vec<LeaderboardRow>, StorageError> {
            Err(StorageError::Connection("backend offline".into()))
        }

        async fn list_entries(&self) -> Result<Vec<LeaderboardRow>, StorageError> {
            Err(StorageError::Connection("backend offline".into()))
        }
    }

    #[tokio::test]
    async fn storage_failures_map_to_json_error_bodies() {
        let mut storage = Storage::in_memory();
        storage.leaderboard = Arc::new(OfflineLeaderboard);

        let response = app(storage)
            .oneshot(Request::get("/scores").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"], true);
        assert_eq!(json["message"], "connection error: backend offline");
    }
}
