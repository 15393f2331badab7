use super::openai::{ModelEntry, ModelList};
use super::state::AppState;
use axum::{extract::State, Json};

/// `GET /v1/models`: the single configured model
pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList {
        object: "list",
        data: vec![ModelEntry {
            id: state.model_id(),
            object: "model",
            created: state.started_at,
            owned_by: "local",
        }],
    })
}
