use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::AppError;
use crate::health::{health_path, HEALTH_ROOT, SYSTEM_HEALTH_PATH};
use crate::selector::{h2h_path, team_stats_path};
use crate::state::StoreHandle;
use crate::types::{HealthRecord, HeadToHeadSummary, SystemHealthRecord, TeamStatsSummary};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<StoreHandle>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/health/:job", get(get_job_health))
        .route("/h2h/:match_id", get(get_head_to_head))
        .route("/team_stats/:team_id", get(get_team_stats))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthOverview {
    pub system: Option<SystemHealthRecord>,
    pub jobs: BTreeMap<String, HealthRecord>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Result<Json<HealthOverview>, AppError> {
    let system = state.store.get_as::<SystemHealthRecord>(SYSTEM_HEALTH_PATH).await?;

    let mut jobs = BTreeMap::new();
    if let Some(Value::Object(records)) = state.store.get(HEALTH_ROOT).await? {
        for (job, raw) in records {
            if health_path(&job) == SYSTEM_HEALTH_PATH {
                continue;
            }
            match serde_json::from_value::<HealthRecord>(raw) {
                Ok(record) => {
                    jobs.insert(job, record);
                }
                Err(e) => warn!("[API] unreadable health record for {job}: {e}"),
            }
        }
    }

    Ok(Json(HealthOverview { system, jobs }))
}

async fn get_job_health(
    State(state): State<ApiState>,
    Path(job): Path<String>,
) -> Result<Json<HealthRecord>, AppError> {
    state
        .store
        .get_as::<HealthRecord>(&health_path(&job))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no health record for {job}")))
}

async fn get_head_to_head(
    State(state): State<ApiState>,
    Path(match_id): Path<String>,
) -> Result<Json<HeadToHeadSummary>, AppError> {
    state
        .store
        .get_as::<HeadToHeadSummary>(&h2h_path(&match_id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no head-to-head for match {match_id}")))
}

async fn get_team_stats(
    State(state): State<ApiState>,
    Path(team_id): Path<i64>,
) -> Result<Json<TeamStatsSummary>, AppError> {
    state
        .store
        .get_as::<TeamStatsSummary>(&team_stats_path(team_id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no stats for team {team_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    async fn app() -> Router {
        let store = StoreHandle::in_memory();
        store
            .set(
                "health/h2h",
                &json!({"last_run": "2026-10-19T10:00:00Z", "status": "success", "processed_count": 2, "pending_count": 0}),
            )
            .await
            .unwrap();
        store
            .set(
                "health/system",
                &json!({"last_check": "2026-10-19T11:00:00Z", "status": "healthy", "issues": []}),
            )
            .await
            .unwrap();
        router(ApiState { store: Arc::new(store) })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_overview_splits_system_and_jobs() {
        let (status, body) = get_json(app().await, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["system"]["status"], "healthy");
        assert_eq!(body["jobs"]["h2h"]["processed_count"], 2);
        assert!(body["jobs"].get("system").is_none());
    }

    #[tokio::test]
    async fn job_health_and_missing_records() {
        let (status, body) = get_json(app().await, "/health/h2h").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let (status, _) = get_json(app().await, "/health/team_stats").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_json(app().await, "/h2h/m404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_team_id_is_rejected() {
        let (status, _) = get_json(app().await, "/team_stats/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
