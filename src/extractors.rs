use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};

use crate::error::AppError;
use crate::protocol::FieldError;

/// JSON extractor whose rejection is the API's own 400 envelope instead of
/// axum's plain-text body.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = format!("Failed to parse JSON request body: {}", rejection.body_text());
                tracing::warn!(target: "analysis", "{}", message);
                Err(AppError::Validation(vec![FieldError::new("body", message)]))
            }
        }
    }
}
