//! FCM HTTP v1 client.

use super::{Messaging, MessagingError};
use crate::app::{AccessToken, App};
use crate::rest::ApiError;
use async_trait::async_trait;
use firekit_types::Message;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const FCM_ERROR_TYPE: &str = "google.firebase.fcm.v1.FcmError";

/// Messaging client for the FCM HTTP v1 API.
#[derive(Debug, Clone)]
pub struct FcmClient {
    http: reqwest::Client,
    send_url: String,
    token: AccessToken,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a Message,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    validate_only: bool,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

impl FcmClient {
    /// Build a client from an initialized app.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Client`] if the app has no project id.
    pub fn from_app(app: &App) -> Result<Self, MessagingError> {
        let project = app.project_id().filter(|p| !p.is_empty()).ok_or_else(|| {
            MessagingError::Client("project id is required to access the messaging service".into())
        })?;
        let endpoint = app.messaging_endpoint();
        Ok(Self {
            http: app.http().clone(),
            send_url: format!("{}/v1/projects/{}/messages:send", endpoint.base, project),
            token: endpoint.token.clone(),
        })
    }

    /// URL messages are posted to.
    pub fn send_url(&self) -> &str {
        &self.send_url
    }

    async fn post(&self, message: &Message, validate_only: bool) -> Result<String, MessagingError> {
        tracing::debug!(
            "POST {} (target={}, validate_only={})",
            self.send_url,
            message.target.kind(),
            validate_only
        );

        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(self.token.secret())
            .json(&SendRequest {
                message,
                validate_only,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_from_response(status, &body);
            tracing::warn!("Messaging request failed: {}", err);
            return Err(err);
        }

        let body: SendResponse = response
            .json()
            .await
            .map_err(|e| MessagingError::Decode(e.to_string()))?;
        Ok(body.name)
    }
}

#[async_trait]
impl Messaging for FcmClient {
    async fn send(&self, message: &Message) -> Result<String, MessagingError> {
        self.post(message, false).await
    }

    async fn send_dry_run(&self, message: &Message) -> Result<String, MessagingError> {
        self.post(message, true).await
    }
}

/// Classify a failed send by its FCM error code, falling back to the status.
fn error_from_response(status: StatusCode, body: &str) -> MessagingError {
    let error = ApiError::parse(status, body);
    if status == StatusCode::UNAUTHORIZED {
        return MessagingError::Unauthenticated(error.message);
    }
    let code = error
        .detail_code(FCM_ERROR_TYPE)
        .unwrap_or(error.status.as_str());
    let message = error.message.clone();
    match code {
        "INVALID_ARGUMENT" => MessagingError::InvalidArgument(message),
        "UNREGISTERED" => MessagingError::Unregistered(message),
        "SENDER_ID_MISMATCH" => MessagingError::SenderIdMismatch(message),
        "QUOTA_EXCEEDED" | "RESOURCE_EXHAUSTED" => MessagingError::QuotaExceeded(message),
        "UNAVAILABLE" => MessagingError::Unavailable(message),
        "INTERNAL" => MessagingError::Internal(message),
        "THIRD_PARTY_AUTH_ERROR" => MessagingError::ThirdPartyAuth(message),
        "UNAUTHENTICATED" => MessagingError::Unauthenticated(message),
        _ => MessagingError::Status {
            code: error.code,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, ClientOptions, Credentials};
    use crate::initialize_app;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> FcmClient {
        let config = AppConfig::new("demo").with_credentials(Credentials::AccessToken {
            token: "test-token".into(),
        });
        let options = ClientOptions {
            messaging_endpoint: server.url(),
            ..ClientOptions::default()
        };
        initialize_app(config, options).unwrap().messaging().unwrap()
    }

    fn fcm_error(code: u16, status: &str, error_code: &str) -> String {
        json!({"error": {
            "code": code,
            "message": "rejected",
            "status": status,
            "details": [{
                "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                "errorCode": error_code
            }]
        }})
        .to_string()
    }

    #[test]
    fn factory_requires_project() {
        let app = initialize_app(
            AppConfig::default().with_credentials(Credentials::AccessToken {
                token: "test-token".into(),
            }),
            ClientOptions::default(),
        )
        .unwrap();
        let err = FcmClient::from_app(&app).unwrap_err();
        assert!(matches!(err, MessagingError::Client(_)));
        assert!(err.to_string().starts_with("messaging client: "));
    }

    #[tokio::test]
    async fn send_posts_message_and_returns_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/projects/demo/messages:send")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::Json(json!({
                "message": {"token": "device-1", "notification": {"title": "Hi", "body": "there"}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"projects/demo/messages/0:1500415314455276%31bd1c9631bd1c96"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let message = Message::to_token("device-1").with_notification("Hi", "there");
        let id = client.send(&message).await.unwrap();

        assert_eq!(id, "projects/demo/messages/0:1500415314455276%31bd1c9631bd1c96");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn dry_run_sets_validate_only() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/projects/demo/messages:send")
            .match_body(Matcher::PartialJson(json!({"validate_only": true})))
            .with_status(200)
            .with_body(r#"{"name":"projects/demo/messages/fake"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let id = client.send_dry_run(&Message::to_topic("news")).await.unwrap();
        assert_eq!(id, "projects/demo/messages/fake");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fcm_error_codes_are_classified() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/projects/demo/messages:send")
            .with_status(404)
            .with_body(fcm_error(404, "NOT_FOUND", "UNREGISTERED"))
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.send(&Message::to_token("stale")).await.unwrap_err();
        assert!(matches!(err, MessagingError::Unregistered(_)));
    }

    #[tokio::test]
    async fn unauthorized_is_unauthenticated() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/projects/demo/messages:send")
            .with_status(401)
            .with_body(r#"{"error":{"code":401,"message":"bad token","status":"UNAUTHENTICATED"}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.send(&Message::to_topic("news")).await.unwrap_err();
        assert!(matches!(err, MessagingError::Unauthenticated(m) if m == "bad token"));
    }

    #[tokio::test]
    async fn unparseable_success_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/projects/demo/messages:send")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.send(&Message::to_topic("news")).await.unwrap_err();
        assert!(matches!(err, MessagingError::Decode(_)));
    }

    #[test]
    fn status_fallback_classification() {
        let body = r#"{"error":{"code":503,"message":"try later","status":"UNAVAILABLE"}}"#;
        assert!(matches!(
            error_from_response(StatusCode::SERVICE_UNAVAILABLE, body),
            MessagingError::Unavailable(_)
        ));

        let body = fcm_error(400, "INVALID_ARGUMENT", "SENDER_ID_MISMATCH");
        assert!(matches!(
            error_from_response(StatusCode::BAD_REQUEST, &body),
            MessagingError::SenderIdMismatch(_)
        ));

        assert!(matches!(
            error_from_response(StatusCode::IM_A_TEAPOT, "teapot"),
            MessagingError::Status { code: 418, .. }
        ));
    }
}
