use axum::{Json, Router, extract::State, routing::get};
use axum_helpers::AppError;
use database::mongodb::bson::{doc, oid::ObjectId};
use database::{DatabaseError, Model};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// A stored note, persisted in the collection registered for it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub text: String,
}

impl Model for Note {
    const NAME: &'static str = "Note";
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct NoteResponse {
    pub id: Option<String>,
    pub text: String,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id.map(|id| id.to_hex()),
            text: note.text,
        }
    }
}

async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<NoteResponse>>, AppError> {
    let notes = state
        .db
        .collection::<Note>()?
        .find(doc! {})
        .await
        .map_err(DatabaseError::from)?
        .try_collect::<Vec<_>>()
        .await
        .map_err(DatabaseError::from)?;

    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/", get(list_notes))
        .with_state(state.clone())
}
