//! HTTP client of the remote irrigation backend.
//!
//! Every endpoint answers with the envelope `{success, data, error, message}`,
//! which is folded into a plain `Result` before it reaches the caller.

use crate::error::BackendError;
use parking_lot::RwLock;
use reqwest::{header, Client, Method, RequestBuilder};
use riego_core::{Farm, Plot, Valve};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const TIMEOUT: Duration = Duration::from_secs(10);

pub struct BackendClient {
    base_url: String,
    client: Client,
    token: RwLock<Option<String>>,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        Ok(BackendClient {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token sent with every following request
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<dto::LoginResponse, BackendError> {
        let body = dto::LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let response = self
            .request(Method::POST, "/auth/login")
            .json(&body)
            .send()
            .await?;
        handle_response(response).await
    }

    pub async fn farms(&self) -> Result<Vec<Farm>, BackendError> {
        self.get("/fincas").await
    }

    pub async fn plots(&self) -> Result<Vec<Plot>, BackendError> {
        self.get("/lotes").await
    }

    pub async fn valves(&self) -> Result<Vec<Valve>, BackendError> {
        self.get("/valvulas").await
    }

    pub async fn sensor_history(
        &self,
        sensor_id: i32,
    ) -> Result<Vec<dto::SensorReading>, BackendError> {
        self.get(&format!("/sensores/{}/historial", sensor_id)).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.request(Method::GET, path).send().await?;
        handle_response(response).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Backend request");
        let builder = self.client.request(method, url);
        match self.token.read().as_ref() {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&body)
            .ok()
            .and_then(Envelope::reason)
            .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
        return Err(BackendError::Server {
            status: status.as_u16(),
            message,
        });
    }

    let envelope: Envelope<T> = serde_json::from_slice(&body)?;
    envelope.into_result()
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn reason(self) -> Option<String> {
        self.error.or(self.message)
    }

    fn into_result(self) -> Result<T, BackendError> {
        if !self.success {
            let reason = self.reason().unwrap_or_else(|| "unknown error".to_owned());
            return Err(BackendError::Rejected(reason));
        }
        self.data.ok_or(BackendError::MissingData)
    }
}

pub mod dto {
    use chrono::{DateTime, Utc};
    use riego_core::User;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub user: User,
        pub token: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    pub struct SensorReading {
        pub timestamp: DateTime<Utc>,
        pub value: f64,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, BackendError> {
        let envelope: Envelope<T> = serde_json::from_str(raw)?;
        envelope.into_result()
    }

    #[test]
    fn test_envelope_with_data() {
        let readings: Vec<dto::SensorReading> = parse(
            r#"{"success": true, "data": [{"timestamp": "2024-05-01T10:00:00Z", "value": 61.5}]}"#,
        )
        .unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, 61.5);
    }

    #[test]
    fn test_envelope_rejection_prefers_error() {
        let res: Result<Vec<Farm>, _> =
            parse(r#"{"success": false, "error": "token expired", "message": "ignored"}"#);
        match res {
            Err(BackendError::Rejected(reason)) => assert_eq!(reason, "token expired"),
            other => panic!("Unexpected: {:?}", other),
        }

        let res: Result<Vec<Farm>, _> = parse(r#"{"success": false, "message": "bad input"}"#);
        assert!(matches!(res, Err(BackendError::Rejected(reason)) if reason == "bad input"));
    }

    #[test]
    fn test_envelope_without_data() {
        let res: Result<Vec<Farm>, _> = parse(r#"{"success": true}"#);
        assert!(matches!(res, Err(BackendError::MissingData)));
    }

    #[test]
    fn test_envelope_invalid_json() {
        let res: Result<Vec<Farm>, _> = parse("<html>");
        assert!(matches!(res, Err(BackendError::Parse(_))));
    }

    #[test]
    fn test_token_and_base_url() {
        let client = BackendClient::new("http://localhost:8000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert!(!client.has_token());

        client.set_token(Some("abc".to_owned()));
        assert!(client.has_token());
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client = BackendClient::new("http://127.0.0.1:9").unwrap();
        let res = client.farms().await;
        assert!(matches!(res, Err(BackendError::Http(_))));
    }
}
