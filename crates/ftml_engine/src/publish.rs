use std::path::Path;
use std::time::Duration;

use ftml_logging::{ftml_debug, ftml_info};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use url::Url;

use crate::{PublishError, PublishFailure};

const LOGIN_PATH: &[&str] = &["api", "authentication", "login"];
const SOURCES_PATH: &[&str] = &["api", "admin", "khub", "sources"];

#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            // Uploads of large archives are slow; keep this generous.
            request_timeout: Duration::from_secs(300),
        }
    }
}

/// Where and as whom an archive is published.
#[derive(Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub portal_url: String,
    pub login: String,
    pub password: String,
    pub source_id: String,
    /// Prefixed to the uploaded file name.
    pub customer: String,
}

impl std::fmt::Debug for PublishTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishTarget")
            .field("portal_url", &self.portal_url)
            .field("login", &self.login)
            .field("password", &"XXX")
            .field("source_id", &self.source_id)
            .field("customer", &self.customer)
            .finish()
    }
}

impl PublishTarget {
    /// Name the portal sees for the uploaded archive.
    pub fn upload_name(&self, archive: &Path) -> String {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.customer.is_empty() {
            name
        } else {
            format!("{}_{}", self.customer, name)
        }
    }
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Uploads `archive` and returns the portal's acknowledgment unchanged.
    async fn publish(&self, archive: &Path, target: &PublishTarget) -> Result<Value, PublishError>;
}

/// Login, sources check, upload; one cookie session per call, no retries.
#[derive(Debug, Clone)]
pub struct ReqwestPublisher {
    settings: PublishSettings,
}

impl ReqwestPublisher {
    pub fn new(settings: PublishSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, PublishError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|err| PublishError::new(PublishFailure::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Publisher for ReqwestPublisher {
    async fn publish(&self, archive: &Path, target: &PublishTarget) -> Result<Value, PublishError> {
        let base = Url::parse(&target.portal_url)
            .map_err(|err| PublishError::new(PublishFailure::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;
        ftml_debug!("uploading to {base}");

        let login_url = endpoint(&base, LOGIN_PATH)?;
        let response = client
            .post(login_url.clone())
            .json(&json!({ "login": target.login, "password": target.password }))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::new(
                PublishFailure::LoginRejected(status.as_u16()),
                format!(
                    "cannot log in to {login_url} (user={}, password=XXX): {body}",
                    target.login
                ),
            ));
        }

        let sources_url = endpoint(&base, SOURCES_PATH)?;
        let response = client
            .get(sources_url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let code = response.status().as_u16();
                return Err(PublishError::new(
                    PublishFailure::Unauthorized(code),
                    format!("server rejected credentials ({code})"),
                ));
            }
            StatusCode::NOT_FOUND => {
                return Err(PublishError::new(
                    PublishFailure::SourceNotFound,
                    format!("the instance id or the api in {sources_url} is not found (404)"),
                ));
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(PublishError::new(
                    PublishFailure::HttpStatus(status.as_u16()),
                    body,
                ));
            }
            _ => {}
        }

        let bytes = tokio::fs::read(archive)
            .await
            .map_err(|err| PublishError::new(PublishFailure::Io, format!("{archive:?}: {err}")))?;
        let part = Part::bytes(bytes)
            .file_name(target.upload_name(archive))
            .mime_str("application/zip")
            .map_err(map_reqwest_error)?;
        let form = Form::new().part("file", part);

        let mut upload_path: Vec<&str> = SOURCES_PATH.to_vec();
        upload_path.extend([target.source_id.as_str(), "upload"]);
        let upload_url = endpoint(&base, &upload_path)?;
        let response = client
            .post(upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::new(
                PublishFailure::HttpStatus(status.as_u16()),
                body,
            ));
        }
        let answer: Value = response.json().await.map_err(|err| {
            PublishError::new(PublishFailure::InvalidResponse, err.to_string())
        })?;
        ftml_info!("{:?} published on {}", archive, target.portal_url);
        Ok(answer)
    }
}

/// `base` with `segments` appended as escaped path segments.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, PublishError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| PublishError::new(PublishFailure::InvalidUrl, format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn map_reqwest_error(err: reqwest::Error) -> PublishError {
    if err.is_timeout() {
        return PublishError::new(PublishFailure::Timeout, err.to_string());
    }
    PublishError::new(PublishFailure::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{endpoint, PublishTarget, SOURCES_PATH};
    use std::path::Path;
    use url::Url;

    fn target(customer: &str) -> PublishTarget {
        PublishTarget {
            portal_url: "https://portal.example.com".into(),
            login: "bot".into(),
            password: "secret".into(),
            source_id: "src 1".into(),
            customer: customer.into(),
        }
    }

    #[test]
    fn endpoints_append_to_base_path() {
        let base = Url::parse("https://portal.example.com/tenant/").unwrap();
        let mut segments = SOURCES_PATH.to_vec();
        segments.extend(["src 1", "upload"]);
        let url = endpoint(&base, &segments).unwrap();
        assert_eq!(
            url.as_str(),
            "https://portal.example.com/tenant/api/admin/khub/sources/src%201/upload"
        );
    }

    #[test]
    fn upload_name_carries_customer_prefix() {
        let archive = Path::new("/tmp/en/B1.zip");
        assert_eq!(target("acme").upload_name(archive), "acme_B1.zip");
        assert_eq!(target("").upload_name(archive), "B1.zip");
    }

    #[test]
    fn debug_output_hides_password() {
        assert!(!format!("{:?}", target("acme")).contains("secret"));
    }
}
