//! Exercise recording, delegated to a remote function.

use axum::{Json, body::Bytes, extract::rejection::BytesRejection};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use taskgate_identity::ProviderError;

use crate::auth::RequireUser;
use crate::error::ApiError;

/// Remote function that stores a new exercise.
pub const NEW_EXERCISE_FUNCTION: &str = "new-exercise";

pub const EXERCISE_UNEXPECTED: &str = "An unexpected server error occurred.";

const TIMES_REQUIRED: &str = "Start time and end time are required.";
const INVOKE_FAILED: &str = "Failed to invoke exercise function.";

/// Request body for `POST /api/exercise`.
///
/// Values are forwarded as sent; only presence is checked. A field is
/// `None` only when its key is missing, so an explicit `null` survives.
#[derive(Debug, Default)]
pub struct ExerciseRequest {
    pub start_time: Option<JsonValue>,
    pub end_time: Option<JsonValue>,
    pub description: Option<JsonValue>,
}

/// Payload handed to the remote function.
#[derive(Debug, Serialize)]
pub struct NewExercise {
    pub start_time: JsonValue,
    pub end_time: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<JsonValue>,
    pub user_id: String,
}

/// Missing, `null`, and `""` all count as absent.
fn is_present(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::String(s) => !s.is_empty(),
        _ => true,
    }
}

impl ExerciseRequest {
    /// Reads the named fields from a JSON body.
    ///
    /// Arrays and scalars have no named fields, so every field is absent.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure if the body is not JSON or is `null`.
    pub fn from_body(body: &[u8]) -> Result<Self, String> {
        let value: JsonValue =
            serde_json::from_slice(body).map_err(|e| format!("unreadable exercise body: {e}"))?;

        match value {
            JsonValue::Object(fields) => Ok(Self::from_fields(fields)),
            JsonValue::Null => Err("exercise body is null".to_string()),
            _ => Ok(Self::default()),
        }
    }

    fn from_fields(mut fields: Map<String, JsonValue>) -> Self {
        Self {
            start_time: fields.remove("startTime"),
            end_time: fields.remove("endTime"),
            description: fields.remove("description"),
        }
    }

    /// Builds the remote payload for `user_id`, or `None` if either time is absent.
    #[must_use]
    pub fn into_new_exercise(self, user_id: impl Into<String>) -> Option<NewExercise> {
        let start_time = self.start_time.filter(is_present)?;
        let end_time = self.end_time.filter(is_present)?;
        Some(NewExercise {
            start_time,
            end_time,
            description: self.description,
            user_id: user_id.into(),
        })
    }
}

/// Records an exercise for the authenticated user.
pub async fn record_exercise(
    RequireUser { user, client }: RequireUser,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<JsonValue>, ApiError> {
    let body = body.map_err(|e| ApiError::Unexpected {
        message: EXERCISE_UNEXPECTED,
        details: format!("failed to read exercise body: {e}"),
    })?;

    let request = ExerciseRequest::from_body(&body).map_err(|details| ApiError::Unexpected {
        message: EXERCISE_UNEXPECTED,
        details,
    })?;

    let exercise = request
        .into_new_exercise(user.id.as_str())
        .ok_or(ApiError::BadRequest(TIMES_REQUIRED))?;

    let payload = serde_json::to_value(&exercise).map_err(|e| ApiError::Unexpected {
        message: EXERCISE_UNEXPECTED,
        details: e.to_string(),
    })?;

    let result = client
        .invoke_function(NEW_EXERCISE_FUNCTION, &payload)
        .await
        .map_err(|e| match e {
            ProviderError::Rejected { message, .. } => {
                tracing::error!(user_id = %user.id, %message, "exercise function failed");
                ApiError::ProviderDetailed {
                    summary: INVOKE_FAILED,
                    message,
                }
            }
            other => ApiError::Unexpected {
                message: EXERCISE_UNEXPECTED,
                details: other.to_string(),
            },
        })?;

    tracing::info!(user_id = %user.id, "exercise recorded");
    Ok(Json(result))
}
