use std::{path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::rest_types::{ApiResponse, HealthResponse, SendMessageRequest};

const SEND_MESSAGE_ROUTE: &str = "api/messages/send";
const MEDIA_UPLOAD_ROUTE: &str = "api/media/upload";
const HEALTH_ROUTE: &str = "api/health";

const API_KEY_HEADER: &str = "X-API-Key";

const ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "mp4", "avi", "mov", "pdf", "doc", "docx",
];

/// Validate a media file before it is sent: extension must be in the
/// allowed set and the size must not exceed `max_bytes`. Returns the file
/// size in bytes.
pub fn check_media_file(media: &Path, max_bytes: u64) -> Result<u64> {
    let extension = media
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => bail!(
            "File type not allowed: {} (allowed: {})",
            media.display(),
            ALLOWED_EXTENSIONS.join(", ")
        ),
    }

    let file_size = std::fs::metadata(media)
        .context("Failed to get file metadata")?
        .len();

    if file_size > max_bytes {
        bail!(
            "File size ({} bytes) exceeds maximum uploadable size ({} bytes)",
            file_size,
            max_bytes
        );
    }

    Ok(file_size)
}

pub struct DashboardClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl DashboardClient {
    pub fn new(base_url: Url, api_key: String, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn check_response_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            bail!(
                "Request failed: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            );
        }
        Ok(response)
    }

    // Read the body first so an unparseable payload surfaces as a serde
    // error with the offending text available, not as a reqwest error.
    async fn parse_json_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let text = response.text().await?;
        let parsed = serde_json::from_str::<T>(&text)
            .with_context(|| format!("Response is not valid JSON: {}", text))?;
        Ok(parsed)
    }

    /// Send a text message through `POST api/messages/send`.
    pub async fn send_message(&self, message: &str, recipient: &str) -> Result<ApiResponse> {
        let url = self
            .base_url
            .join(SEND_MESSAGE_ROUTE)
            .context("Failed to construct send message URL")?;

        let request = SendMessageRequest {
            message: message.to_string(),
            recipient: recipient.to_string(),
        };

        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        let response = Self::check_response_status(response).await?;
        Self::parse_json_response(response).await
    }

    /// Upload a media file through `POST api/media/upload` as a multipart
    /// form with `file`, `recipient` and `caption` fields.
    pub async fn upload_media(
        &self,
        media: &Path,
        recipient: &str,
        caption: &str,
    ) -> Result<ApiResponse> {
        let url = self
            .base_url
            .join(MEDIA_UPLOAD_ROUTE)
            .context("Failed to construct media upload URL")?;

        let media_part = reqwest::multipart::Part::file(media)
            .await
            .context("Unable to read media file")?;

        let form = reqwest::multipart::Form::new()
            .text("recipient", recipient.to_string())
            .text("caption", caption.to_string())
            .part("file", media_part);

        debug!("POST {} ({})", url, media.display());
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let response = Self::check_response_status(response).await?;
        Self::parse_json_response(response).await
    }

    /// Fetch the backend health document. The endpoint is unauthenticated.
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self
            .base_url
            .join(HEALTH_ROUTE)
            .context("Failed to construct health URL")?;

        let response = self.client.get(url).send().await?;

        let response = Self::check_response_status(response).await?;
        Self::parse_json_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(server: &mockito::Server) -> DashboardClient {
        DashboardClient::new(
            Url::parse(&server.url()).unwrap(),
            "secret".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn send_message_posts_exact_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/messages/send")
            .match_header("x-api-key", "secret")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Exact(
                r#"{"message":"hi","recipient":"123"}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"success":true,"message":"Message sent","data":null}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let response = client.send_message("hi", "123").await.unwrap();

        mock.assert_async().await;
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("Message sent"));
    }

    #[tokio::test]
    async fn send_message_surfaces_success_false() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/messages/send")
            .with_status(200)
            .with_body(r#"{"success":false,"message":"Bot not logged in"}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let response = client.send_message("hi", "123").await.unwrap();

        mock.assert_async().await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn send_message_fails_on_error_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/messages/send")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client.send_message("hi", "123").await;

        mock.assert_async().await;
        let error = result.unwrap_err();
        assert!(error.to_string().contains("500"));
    }

    #[tokio::test]
    async fn send_message_fails_on_non_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/messages/send")
            .with_status(200)
            .with_body("<html>gateway error</html>")
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client.send_message("hi", "123").await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn upload_media_posts_multipart_form() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("photo.png");
        std::fs::write(&media, b"not really a png").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/media/upload")
            .match_header("x-api-key", "secret")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("^multipart/form-data.*".to_string()),
            )
            .with_status(200)
            .with_body(r#"{"success":true,"message":"Media sent"}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let response = client.upload_media(&media, "123", "a caption").await.unwrap();

        mock.assert_async().await;
        assert!(response.success);
    }

    #[tokio::test]
    async fn health_fetches_status_document() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/health")
            .with_status(200)
            .with_body(
                r#"{"status":"healthy","bot_status":"available","login_status":"logged_in","timestamp":"2024-01-01T00:00:00"}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let health = client.health().await.unwrap();

        mock.assert_async().await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.bot_status.as_deref(), Some("available"));
        assert_eq!(health.login_status.as_deref(), Some("logged_in"));
    }

    #[tokio::test]
    async fn parse_json_response_rejects_invalid_json() {
        let response = http::Response::builder()
            .status(200)
            .body("not valid json")
            .unwrap();
        let response = reqwest::Response::from(response);

        let result: Result<ApiResponse> = DashboardClient::parse_json_response(response).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn parse_json_response_ignores_extra_fields() {
        let response = http::Response::builder()
            .status(200)
            .body(r#"{"success":true,"message":"ok","data":{"id":7},"extra":"ignored"}"#)
            .unwrap();
        let response = reqwest::Response::from(response);

        let parsed: ApiResponse = DashboardClient::parse_json_response(response).await.unwrap();
        assert!(parsed.success);
    }

    #[test]
    fn media_file_with_allowed_extension_passes() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("photo.png");
        std::fs::write(&media, b"data").unwrap();

        let size = check_media_file(&media, 1024).unwrap();
        assert_eq!(size, 4);
    }

    #[test]
    fn media_file_extension_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("PHOTO.PNG");
        std::fs::write(&media, b"data").unwrap();

        assert!(check_media_file(&media, 1024).is_ok());
    }

    #[test]
    fn media_file_with_disallowed_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("script.exe");
        std::fs::write(&media, b"data").unwrap();

        let error = check_media_file(&media, 1024).unwrap_err();
        assert!(error.to_string().contains("File type not allowed"));
    }

    #[test]
    fn media_file_without_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("noext");
        std::fs::write(&media, b"data").unwrap();

        assert!(check_media_file(&media, 1024).is_err());
    }

    #[test]
    fn oversized_media_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("big.mp4");
        std::fs::write(&media, vec![0u8; 32]).unwrap();

        let error = check_media_file(&media, 16).unwrap_err();
        assert!(error.to_string().contains("exceeds maximum"));
    }
}
