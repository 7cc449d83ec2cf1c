//! Network fetching for images
//!
//! The [`Fetcher`] trait is the seam between the loader and the network.
//! [`HttpFetcher`] issues one blocking `ureq` GET per call on Tokio's
//! blocking pool; there is no retry.

use crate::config::schema::NetworkConfig;
use crate::error::{FetchError, FetchResult};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// A complete HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Mime type without parameters, lowercased
    pub fn mime_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Filename from `Content-Disposition`, if the server suggested one
    pub fn suggested_filename(&self) -> Option<String> {
        let disposition = self.content_disposition.as_deref()?;
        disposition
            .split(';')
            .map(str::trim)
            .find_map(|part| part.strip_prefix("filename="))
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    }
}

/// Abstract GET interface so the loader can run against any transport
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue a single GET. Transport problems are `TransportFailure`;
    /// non-2xx statuses are returned as responses, not errors.
    async fn get(&self, url: &Url) -> FetchResult<HttpResponse>;
}

/// Check status and content type, handing back the body of an acceptable
/// image response
pub fn validate_response(response: HttpResponse) -> FetchResult<Vec<u8>> {
    if !(200..=299).contains(&response.status) {
        return Err(FetchError::InvalidResponse(format!(
            "status {}",
            response.status
        )));
    }

    match response.mime_type() {
        Some(mime) if mime.starts_with("image/") => Ok(response.body),
        Some(mime) => Err(FetchError::InvalidResponse(format!(
            "content type {} is not an image",
            mime
        ))),
        None => Err(FetchError::InvalidResponse(
            "missing content type".to_string(),
        )),
    }
}

/// `ureq`-backed fetcher
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    max_body_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            agent: build_agent(config),
            user_agent: config.user_agent.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Agent with the configured timeout that hands back non-2xx responses
/// instead of turning them into errors
pub(crate) fn build_agent(config: &NetworkConfig) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
        .http_status_as_error(false)
        .build()
        .into()
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> FetchResult<HttpResponse> {
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let limit = self.max_body_bytes;
        let url = url.to_string();

        tokio::task::spawn_blocking(move || {
            let mut response = agent
                .get(&url)
                .header("User-Agent", &user_agent)
                .call()
                .map_err(|e| FetchError::TransportFailure(e.to_string()))?;

            let header = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let status = response.status().as_u16();
            let content_type = header("content-type");
            let content_disposition = header("content-disposition");

            let body = response
                .body_mut()
                .with_config()
                .limit(limit)
                .read_to_vec()
                .map_err(|e| FetchError::TransportFailure(e.to_string()))?;

            Ok(HttpResponse {
                status,
                content_type,
                content_disposition,
                body,
            })
        })
        .await
        .map_err(|e| FetchError::TransportFailure(format!("fetch task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, content_type: Option<&str>) -> HttpResponse {
        HttpResponse {
            status,
            content_type: content_type.map(str::to_string),
            content_disposition: None,
            body: b"body".to_vec(),
        }
    }

    #[test]
    fn accepts_2xx_image() {
        assert!(validate_response(response(200, Some("image/png"))).is_ok());
        assert!(validate_response(response(204, Some("IMAGE/JPEG; q=1"))).is_ok());
    }

    #[test]
    fn rejects_404() {
        let err = validate_response(response(404, Some("image/png"))).unwrap_err();
        assert_eq!(err, FetchError::InvalidResponse("status 404".into()));
    }

    #[test]
    fn rejects_html_with_200() {
        let err = validate_response(response(200, Some("text/html; charset=utf-8"))).unwrap_err();
        assert!(err.to_string().contains("text/html"));
    }

    #[test]
    fn rejects_missing_content_type() {
        assert!(validate_response(response(200, None)).is_err());
    }

    #[test]
    fn suggested_filename_from_disposition() {
        let mut r = response(200, Some("image/png"));
        assert_eq!(r.suggested_filename(), None);

        r.content_disposition = Some(r#"attachment; filename="lunch.png""#.into());
        assert_eq!(r.suggested_filename().as_deref(), Some("lunch.png"));
    }
}
