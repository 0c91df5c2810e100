//! Project API endpoint client
//!
//! Single choke point for every HTTP call the workflows make. Each verb
//! method turns (path, optional body, optional extra headers) into an
//! `ApiResponse` without judging whether the status was the one the caller
//! wanted; that decision belongs to the workflow layer.

use crate::client::envelope::{
    ApiResponse, ContainerKey, DeleteResponse, ErrorDetails, ListResponse, Outcome,
    SingleResponse,
};
use crate::client::retry::{NoRetry, RetryPolicy};
use crate::config::ApiConfig;
use crate::credential::BearerCredential;
use crate::error::AppError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Content type for POST bodies
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type for PATCH bodies
pub const PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// Extra headers for a single call, merged over the session defaults
pub type ExtraHeaders = HashMap<String, String>;

struct RequestBody {
    bytes: Vec<u8>,
    content_type: &'static str,
}

struct RawResponse {
    status: StatusCode,
    content: String,
}

/// HTTP client bound to one base URL and one credential
///
/// Default headers are computed once at construction and cloned per call, so
/// per-call extras never leak into later requests.
#[derive(Debug, Clone)]
pub struct EndpointClient {
    http: reqwest::Client,
    base_url: String,
    default_headers: HeaderMap,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl EndpointClient {
    /// Build a client for the configured API using the given credential
    ///
    /// # Errors
    /// * `AppError::Config` if the API configuration is invalid
    /// * `AppError::InvalidHeader` if the accept type or credential is not a valid header value
    /// * `AppError::Transport` if the underlying HTTP client cannot be built
    pub fn new(api: &ApiConfig, credential: &BearerCredential) -> Result<Self, AppError> {
        api.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_str(&api.accept)
                .map_err(|e| AppError::InvalidHeader(format!("Accept: {}", e)))?,
        );
        let mut auth = HeaderValue::from_str(&credential.header_value())
            .map_err(|e| AppError::InvalidHeader(format!("Authorization: {}", e)))?;
        auth.set_sensitive(true);
        default_headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            default_headers,
            retry_policy: Arc::new(NoRetry),
        })
    }

    /// Replace the retry policy consulted after every response
    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a list of resources nested under `key.plural`
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        key: ContainerKey,
        extra_headers: Option<&ExtraHeaders>,
    ) -> Result<ListResponse<T>, AppError> {
        let raw = self.send(Method::GET, path, None, extra_headers).await?;
        if raw.status != StatusCode::OK {
            return Ok(error_response(raw));
        }

        let outcome = match parse_success_body(&raw)? {
            Some(body) => Outcome::Payload(decode_container::<Vec<T>>(
                raw.status,
                &body,
                key.plural,
            )?),
            None => Outcome::Empty,
        };

        if let Outcome::Payload(items) = &outcome {
            tracing::debug!(path = %path, count = items.len(), "Decoded list response");
        }
        Ok(ApiResponse::new(raw.status, raw.content, outcome))
    }

    /// GET one resource nested under `key.singular`
    pub async fn get_single<T: DeserializeOwned>(
        &self,
        path: &str,
        key: ContainerKey,
        extra_headers: Option<&ExtraHeaders>,
    ) -> Result<SingleResponse<T>, AppError> {
        let raw = self.send(Method::GET, path, None, extra_headers).await?;
        if raw.status != StatusCode::OK {
            return Ok(error_response(raw));
        }
        self.singular_response(raw, key)
    }

    /// POST a JSON body and decode the created resource
    ///
    /// A 201 decodes `key.singular`. An empty 2xx body is an acknowledgment
    /// without a document: the request body is echoed back as the payload,
    /// so any server-assigned field (such as `id`) is absent.
    pub async fn post<B, T>(
        &self,
        path: &str,
        key: ContainerKey,
        body: &B,
        extra_headers: Option<&ExtraHeaders>,
    ) -> Result<SingleResponse<T>, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestBody {
            bytes: serde_json::to_vec(body)?,
            content_type: JSON_CONTENT_TYPE,
        };
        let echo = request.bytes.clone();
        let raw = self
            .send(Method::POST, path, Some(request), extra_headers)
            .await?;

        if raw.content.trim().is_empty() && raw.status.is_success() {
            let outcome = match serde_json::from_slice::<T>(&echo) {
                Ok(instance) => Outcome::Payload(instance),
                Err(e) => {
                    tracing::debug!(path = %path, error = %e, "Request body could not be echoed as response type");
                    Outcome::Empty
                }
            };
            return Ok(ApiResponse::new(raw.status, raw.content, outcome));
        }

        if raw.status != StatusCode::CREATED {
            return Ok(error_response(raw));
        }
        self.singular_response(raw, key)
    }

    /// POST without a body; 200 is an acknowledgment with nothing to decode
    pub async fn post_empty<T>(
        &self,
        path: &str,
        extra_headers: Option<&ExtraHeaders>,
    ) -> Result<SingleResponse<T>, AppError> {
        let raw = self.send(Method::POST, path, None, extra_headers).await?;
        if raw.status != StatusCode::OK {
            return Ok(error_response(raw));
        }
        Ok(ApiResponse::new(raw.status, raw.content, Outcome::Empty))
    }

    /// PATCH a partial body and decode the updated resource
    pub async fn patch<B, T>(
        &self,
        path: &str,
        key: ContainerKey,
        body: &B,
        extra_headers: Option<&ExtraHeaders>,
    ) -> Result<SingleResponse<T>, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestBody {
            bytes: serde_json::to_vec(body)?,
            content_type: PATCH_CONTENT_TYPE,
        };
        let raw = self
            .send(Method::PATCH, path, Some(request), extra_headers)
            .await?;
        if raw.status != StatusCode::OK {
            return Ok(error_response(raw));
        }
        self.singular_response(raw, key)
    }

    /// DELETE a resource; 204 carries no body
    pub async fn delete(
        &self,
        path: &str,
        extra_headers: Option<&ExtraHeaders>,
    ) -> Result<DeleteResponse, AppError> {
        let raw = self.send(Method::DELETE, path, None, extra_headers).await?;
        if raw.status != StatusCode::NO_CONTENT {
            return Ok(error_response(raw));
        }
        Ok(ApiResponse::new(raw.status, raw.content, Outcome::Empty))
    }

    fn singular_response<T: DeserializeOwned>(
        &self,
        raw: RawResponse,
        key: ContainerKey,
    ) -> Result<SingleResponse<T>, AppError> {
        let outcome = match parse_success_body(&raw)? {
            Some(body) => Outcome::Payload(decode_container::<T>(raw.status, &body, key.singular)?),
            None => Outcome::Empty,
        };
        Ok(ApiResponse::new(raw.status, raw.content, outcome))
    }

    fn build_headers(&self, extra_headers: Option<&ExtraHeaders>) -> Result<HeaderMap, AppError> {
        let mut headers = self.default_headers.clone();
        for (name, value) in extra_headers.into_iter().flatten() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::InvalidHeader(format!("{}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AppError::InvalidHeader(format!("{}: {}", name, e)))?;
            headers.append(name, value);
        }
        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        extra_headers: Option<&ExtraHeaders>,
    ) -> Result<RawResponse, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let headers = self.build_headers(extra_headers)?;
        let mut attempt: u32 = 1;

        loop {
            tracing::debug!(
                method = %method,
                url = %url,
                attempt = attempt,
                body_len = body.as_ref().map(|b| b.bytes.len()).unwrap_or(0),
                "Sending request"
            );

            let mut request = self.http.request(method.clone(), &url).headers(headers.clone());
            if let Some(body) = &body {
                request = request
                    .header(CONTENT_TYPE, body.content_type)
                    .body(body.bytes.clone());
            }

            let response = request.send().await?;
            let status = response.status();
            let content = response.text().await?;

            tracing::debug!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                content_len = content.len(),
                "Received response"
            );

            if status == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!(method = %method, url = %url, attempt = attempt, "API rate limit hit (HTTP 429)");
            }

            match self.retry_policy.retry_after(status, attempt) {
                Some(delay) => {
                    tracing::info!(
                        method = %method,
                        url = %url,
                        status = status.as_u16(),
                        delay_ms = delay.as_millis() as u64,
                        "Retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Ok(RawResponse { status, content }),
            }
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetails>,
}

/// Build the response for any status other than the expected success status
///
/// Non-JSON bodies (gateway pages, empty 429s) yield `Outcome::Empty`; the
/// raw text stays available in `content`.
fn error_response<P>(raw: RawResponse) -> ApiResponse<P> {
    let outcome = if raw.content.trim().is_empty() {
        Outcome::Empty
    } else {
        match serde_json::from_str::<ErrorEnvelope>(&raw.content) {
            Ok(ErrorEnvelope { error: Some(detail) }) => Outcome::Error(detail),
            Ok(_) => Outcome::Empty,
            Err(e) => {
                tracing::debug!(status = raw.status.as_u16(), error = %e, "Error body is not a JSON error envelope");
                Outcome::Empty
            }
        }
    };
    ApiResponse::new(raw.status, raw.content, outcome)
}

/// Parse a success body; `None` when the server sent no content
fn parse_success_body(raw: &RawResponse) -> Result<Option<Value>, AppError> {
    if raw.content.trim().is_empty() {
        tracing::debug!(status = raw.status.as_u16(), "Success response without a body");
        return Ok(None);
    }
    serde_json::from_str(&raw.content)
        .map(Some)
        .map_err(|e| AppError::MalformedResponse {
            status: raw.status,
            reason: format!("body is not valid JSON: {}", e),
        })
}

fn decode_container<T: DeserializeOwned>(
    status: StatusCode,
    body: &Value,
    key: &str,
) -> Result<T, AppError> {
    let container = body.get(key).ok_or_else(|| AppError::MalformedResponse {
        status,
        reason: format!("missing `{}` container", key),
    })?;
    T::deserialize(container).map_err(|e| AppError::MalformedResponse {
        status,
        reason: format!("`{}` container has unexpected shape: {}", key, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde::{Deserialize, Serialize};
    use serial_test::serial;

    const WIDGET: ContainerKey = ContainerKey::new("widget", "widgets");

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Widget {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        display_name: String,
    }

    fn client_for(server: &Server) -> EndpointClient {
        let api = ApiConfig {
            base_url: server.url(),
            ..Default::default()
        };
        EndpointClient::new(&api, &BearerCredential::from_token("test-token")).unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn test_get_list_sends_default_and_extra_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/widgets")
            .match_header("accept", crate::config::DEFAULT_ACCEPT)
            .match_header("authorization", "Bearer test-token")
            .match_header("prefer", "return=representation")
            .with_status(200)
            .with_body(r#"{"widgets": [{"id": "1", "displayName": "a"}, {"id": "2", "displayName": "b"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let extra = ExtraHeaders::from([("Prefer".to_string(), "return=representation".to_string())]);
        let response = client
            .get_list::<Widget>("/widgets", WIDGET, Some(&extra))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::OK);
        let items = response.into_payload().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id.as_deref(), Some("1"));
        assert_eq!(items[1].display_name, "b");
    }

    #[tokio::test]
    #[serial]
    async fn test_extra_headers_do_not_persist() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/widgets/1")
            .match_header("prefer", "return=representation")
            .with_status(200)
            .with_body(r#"{"widget": {"id": "1", "displayName": "a"}}"#)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/widgets/2")
            .match_header("prefer", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"widget": {"id": "2", "displayName": "b"}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let extra = ExtraHeaders::from([("Prefer".to_string(), "return=representation".to_string())]);
        client
            .get_single::<Widget>("/widgets/1", WIDGET, Some(&extra))
            .await
            .unwrap();
        let response = client
            .get_single::<Widget>("/widgets/2", WIDGET, None)
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(response.payload().and_then(|w| w.id.as_deref()), Some("2"));
    }

    #[tokio::test]
    #[serial]
    async fn test_get_list_empty_container() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/widgets")
            .with_status(200)
            .with_body(r#"{"widgets": []}"#)
            .create_async()
            .await;

        let response = client_for(&server)
            .get_list::<Widget>("/widgets", WIDGET, None)
            .await
            .unwrap();
        assert_eq!(response.payload().map(Vec::len), Some(0));
    }

    #[tokio::test]
    #[serial]
    async fn test_get_list_without_body_is_empty_not_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/widgets")
            .with_status(200)
            .create_async()
            .await;

        let response = client_for(&server)
            .get_list::<Widget>("/widgets", WIDGET, None)
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.outcome, Outcome::Empty);
    }

    #[tokio::test]
    #[serial]
    async fn test_success_with_invalid_json_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/widgets/1")
            .with_status(200)
            .with_body("This is not JSON")
            .create_async()
            .await;

        let err = client_for(&server)
            .get_single::<Widget>("/widgets/1", WIDGET, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse { status, .. } if status == StatusCode::OK));
    }

    #[tokio::test]
    #[serial]
    async fn test_success_missing_container_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/widgets/1")
            .with_status(200)
            .with_body(r#"{"gadget": {"id": "1"}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_single::<Widget>("/widgets/1", WIDGET, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing `widget` container"));
    }

    #[tokio::test]
    #[serial]
    async fn test_error_status_decodes_error_object() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/widgets/missing")
            .with_status(404)
            .with_body(r#"{"error": {"code": "WidgetNotFound", "message": "Requested widget is not available."}}"#)
            .create_async()
            .await;

        let response = client_for(&server)
            .get_single::<Widget>("/widgets/missing", WIDGET, None)
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.payload().is_none());
        let detail = response.error_details().unwrap();
        assert_eq!(detail.code, "WidgetNotFound");
        assert_eq!(detail.message, "Requested widget is not available.");
    }

    #[tokio::test]
    #[serial]
    async fn test_error_status_with_html_body_has_no_detail() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/widgets/1")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let response = client_for(&server).delete("/widgets/1", None).await.unwrap();
        assert_eq!(response.status, StatusCode::BAD_GATEWAY);
        assert_eq!(response.outcome, Outcome::Empty);
        assert!(response.content.contains("Bad Gateway"));
    }

    #[tokio::test]
    #[serial]
    async fn test_rate_limited_call_returns_normally() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/widgets")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let response = client_for(&server)
            .get_list::<Widget>("/widgets", WIDGET, None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.is_rate_limited());
        assert!(response.payload().is_none());
        assert!(response.error_details().is_none());
    }

    #[derive(Debug)]
    struct RetryOnce;

    impl RetryPolicy for RetryOnce {
        fn retry_after(&self, status: StatusCode, attempt: u32) -> Option<Duration> {
            (status == StatusCode::TOO_MANY_REQUESTS && attempt == 1)
                .then(|| Duration::from_millis(1))
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_retry_policy_seam_reissues_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/widgets")
            .with_status(429)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server).with_retry_policy(Arc::new(RetryOnce));
        let response = client
            .get_list::<Widget>("/widgets", WIDGET, None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    #[serial]
    async fn test_post_serializes_camel_case_and_omits_unset() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/widgets")
            .match_header("content-type", JSON_CONTENT_TYPE)
            .match_body(Matcher::Json(serde_json::json!({"displayName": "new"})))
            .with_status(201)
            .with_body(r#"{"widget": {"id": "w-1", "displayName": "new"}}"#)
            .create_async()
            .await;

        let body = Widget {
            id: None,
            display_name: "new".to_string(),
        };
        let response = client_for(&server)
            .post::<_, Widget>("/widgets", WIDGET, &body, None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.payload().and_then(|w| w.id.as_deref()), Some("w-1"));
    }

    #[tokio::test]
    #[serial]
    async fn test_post_empty_ack_echoes_request_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/widgets")
            .with_status(200)
            .create_async()
            .await;

        let body = Widget {
            id: None,
            display_name: "echoed".to_string(),
        };
        let response = client_for(&server)
            .post::<_, Widget>("/widgets", WIDGET, &body, None)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.payload(), Some(&body));
    }

    #[tokio::test]
    #[serial]
    async fn test_post_error_with_empty_body_is_not_echoed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/widgets")
            .with_status(429)
            .create_async()
            .await;

        let body = Widget {
            id: None,
            display_name: "throttled".to_string(),
        };
        let response = client_for(&server)
            .post::<_, Widget>("/widgets", WIDGET, &body, None)
            .await
            .unwrap();

        assert_eq!(response.outcome, Outcome::Empty);
    }

    #[tokio::test]
    #[serial]
    async fn test_post_empty_acknowledged() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/widgets/favorites/1")
            .with_status(200)
            .create_async()
            .await;

        let response = client_for(&server)
            .post_empty::<Widget>("/widgets/favorites/1", None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.outcome, Outcome::Empty);
    }

    #[tokio::test]
    #[serial]
    async fn test_patch_uses_patch_media_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/widgets/1")
            .match_header("content-type", PATCH_CONTENT_TYPE)
            .match_body(Matcher::Json(serde_json::json!({"displayName": "renamed"})))
            .with_status(200)
            .with_body(r#"{"widget": {"id": "1", "displayName": "renamed"}}"#)
            .create_async()
            .await;

        let body = serde_json::json!({"displayName": "renamed"});
        let response = client_for(&server)
            .patch::<_, Widget>("/widgets/1", WIDGET, &body, None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.payload().map(|w| w.display_name.as_str()), Some("renamed"));
    }

    #[tokio::test]
    #[serial]
    async fn test_delete_no_content() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/widgets/1")
            .with_status(204)
            .create_async()
            .await;

        let response = client_for(&server).delete("/widgets/1", None).await.unwrap();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(response.outcome, Outcome::Empty);
    }

    #[tokio::test]
    async fn test_invalid_extra_header_is_rejected() {
        let api = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let client = EndpointClient::new(&api, &BearerCredential::from_token("t")).unwrap();
        let extra = ExtraHeaders::from([("bad header".to_string(), "x".to_string())]);
        let err = client
            .get_list::<Widget>("/widgets", WIDGET, Some(&extra))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidHeader(_)));
    }
}
