//! Request body extraction shared by the create and update handlers.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};

use crate::server::api_error::ApiError;
use crate::server::validation::{Validate, ValidationError};

/// A validated request body, read as JSON or as `application/x-www-form-urlencoded`
/// depending on the `Content-Type` header.
///
/// Handlers usually take `Result<Payload<T>, PayloadError>` so they can attach
/// their own failure message to the 400 response.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

/// Why a body could not be turned into a [`Payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The body did not parse into the expected shape.
    Malformed(String),
    /// The body parsed but violated a field constraint.
    Invalid(ValidationError),
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::Malformed(detail) => write!(f, "{detail}"),
            PayloadError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PayloadError {}

impl From<ValidationError> for PayloadError {
    fn from(err: ValidationError) -> Self {
        PayloadError::Invalid(err)
    }
}

impl IntoResponse for PayloadError {
    fn into_response(self) -> Response {
        ApiError::bad_request("invalid request body", self.to_string()).into_response()
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// An id field as it arrives: a JSON number, or text from a form body.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

/// `deserialize_with` helper for optional id fields.
///
/// Accepts a number or numeric text; an empty value (`id=` in a form) counts
/// as not supplied. Pair it with `#[serde(default)]` so a missing field is `None`.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<i64>()
                .map(Some)
                .map_err(|e| de::Error::custom(format!("invalid id {text:?}: {e}")))
        }
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = PayloadError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let value = if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| PayloadError::Malformed(rejection.body_text()))?;
            value
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| PayloadError::Malformed(rejection.body_text()))?;
            value
        };

        value.validate()?;
        Ok(Payload(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    use crate::server::validation::{validate_name, ValidationResult};

    #[derive(Debug, Deserialize)]
    struct NameBody {
        name: String,
    }

    impl Validate for NameBody {
        fn validate(&self) -> ValidationResult<()> {
            validate_name(&self.name, "name")
        }
    }

    fn request(content_type: &str, body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[derive(Debug, Deserialize)]
    struct IdBody {
        #[serde(default, deserialize_with = "optional_id")]
        id: Option<i64>,
    }

    impl Validate for IdBody {
        fn validate(&self) -> ValidationResult<()> {
            Ok(())
        }
    }

    async fn read_id(content_type: &str, body: &str) -> Result<Option<i64>, PayloadError> {
        let req = request(content_type, body);
        Payload::<IdBody>::from_request(req, &())
            .await
            .map(|Payload(body)| body.id)
    }

    #[tokio::test]
    async fn optional_id_from_form_and_json() {
        let form = "application/x-www-form-urlencoded";
        assert_eq!(read_id(form, "id=7").await.unwrap(), Some(7));
        assert_eq!(read_id(form, "id=").await.unwrap(), None);
        assert_eq!(read_id(form, "").await.unwrap(), None);
        assert!(read_id(form, "id=seven").await.is_err());

        let json = "application/json";
        assert_eq!(read_id(json, r#"{"id":7}"#).await.unwrap(), Some(7));
        assert_eq!(read_id(json, r#"{"id":null}"#).await.unwrap(), None);
        assert_eq!(read_id(json, "{}").await.unwrap(), None);
    }

    #[tokio::test]
    async fn reads_json_body() {
        let req = request("application/json", r#"{"name":"North"}"#);
        let Payload(body) = Payload::<NameBody>::from_request(req, &()).await.unwrap();
        assert_eq!(body.name, "North");
    }

    #[tokio::test]
    async fn reads_form_body() {
        let req = request("application/x-www-form-urlencoded", "name=South+Bay");
        let Payload(body) = Payload::<NameBody>::from_request(req, &()).await.unwrap();
        assert_eq!(body.name, "South Bay");
    }

    #[tokio::test]
    async fn missing_field_is_malformed() {
        let req = request("application/json", "{}");
        let err = Payload::<NameBody>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[tokio::test]
    async fn empty_name_is_invalid() {
        let req = request("application/json", r#"{"name":""}"#);
        let err = Payload::<NameBody>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.to_string(), "name: cannot be empty");
    }
}
