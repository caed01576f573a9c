//! Lifecycle client for a remote focusmode server.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{EndSession, SessionLifecycle, SessionStarted, StartSession};
use crate::error::{SessionError, ValidationError};
use crate::storage::SessionRecord;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to `POST /start` and `POST /end`.
///
/// Connection failures and unexpected statuses become
/// [`SessionError::Transport`]; 400 and 404 map back to the server's
/// validation and not-found errors.
#[derive(Debug, Clone)]
pub struct HttpLifecycle {
    client: Client,
    base: Url,
}

impl HttpLifecycle {
    pub fn new(base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }

    /// Parse `base` as the server URL, e.g. `http://127.0.0.1:3000`.
    pub fn from_base_url(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(base)?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, SessionError> {
        self.base
            .join(path)
            .map_err(|e| SessionError::Transport(format!("invalid endpoint '{path}': {e}")))
    }

    async fn post<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
        session_id: Option<&str>,
    ) -> Result<reqwest::Response, SessionError> {
        let resp = self
            .client
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = resp
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| status.to_string());
        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ValidationError::Rejected(message).into()
            }
            StatusCode::NOT_FOUND => SessionError::not_found(session_id.unwrap_or(path)),
            _ => SessionError::Transport(format!("{path} returned {status}: {message}")),
        })
    }
}

#[async_trait]
impl SessionLifecycle for HttpLifecycle {
    async fn start_session(&self, request: StartSession) -> Result<String, SessionError> {
        let resp = self.post("start", &request, None).await?;
        let started: SessionStarted = resp.json().await?;
        Ok(started.session_id)
    }

    async fn end_session(&self, request: EndSession) -> Result<SessionRecord, SessionError> {
        let resp = self
            .post("end", &request, Some(request.session_id.as_str()))
            .await?;
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn start_request() -> StartSession {
        StartSession {
            user_id: "u1".into(),
            session_type: "focus".into(),
            duration_requested: 1500,
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn start_returns_session_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/start")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sessionId":"abc-123"}"#)
            .create_async()
            .await;

        let client = HttpLifecycle::from_base_url(&server.url()).unwrap();
        let id = client.start_session(start_request()).await.unwrap();
        assert_eq!(id, "abc-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn bad_request_maps_to_validation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/start")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"durationRequested must be positive"}"#)
            .create_async()
            .await;

        let client = HttpLifecycle::from_base_url(&server.url()).unwrap();
        let err = client.start_session(start_request()).await.unwrap_err();
        match err {
            SessionError::Validation(ValidationError::Rejected(msg)) => {
                assert!(msg.contains("durationRequested"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_maps_to_session_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/end")
            .with_status(404)
            .with_body(r#"{"error":"Session not found: s-1"}"#)
            .create_async()
            .await;

        let client = HttpLifecycle::from_base_url(&server.url()).unwrap();
        let err = client
            .end_session(EndSession {
                session_id: "s-1".into(),
                ended_at: Utc::now(),
                duration_actual: 60,
                completed: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound { id } if id == "s-1"));
    }

    #[tokio::test]
    async fn server_error_is_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/start")
            .with_status(503)
            .create_async()
            .await;

        let client = HttpLifecycle::from_base_url(&server.url()).unwrap();
        let err = client.start_session(start_request()).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = HttpLifecycle::from_base_url(&format!("http://127.0.0.1:{port}")).unwrap();
        let err = client.start_session(start_request()).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }
}
