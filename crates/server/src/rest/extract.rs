use std::collections::HashMap;

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use shared_types::AppError;

/// `Json<T>` whose rejections are reported as a 400 `ValidationError`
/// instead of axum's plain-text 415/422.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                let mut fields = HashMap::new();
                fields.insert("body".to_string(), rejection.body_text());
                Err(AppError::validation("Invalid request body", fields))
            }
        }
    }
}
