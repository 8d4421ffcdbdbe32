use std::convert::Infallible;

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Request body decoded from JSON or from a urlencoded form.
///
/// Holds `None` when the body is missing or cannot be decoded, so handlers
/// answer with their own 400 message instead of the extractor's rejection.
pub(crate) struct Payload<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        let decoded = if is_form {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| value)
                .map_err(|rejection| rejection.body_text())
        } else {
            Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| value)
                .map_err(|rejection| rejection.body_text())
        };

        match decoded {
            Ok(value) => Ok(Self(Some(value))),
            Err(reason) => {
                warn!("Unreadable request body: {}", reason);
                Ok(Self(None))
            }
        }
    }
}
