use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    error::{DecodeError, ServiceErrorBody},
    protocol::{
        ContentSuggestRequest, ContentSuggestResponse, ConvertResponse, Endpoint, UploadResponse,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{error::ClientError, types::UploadedFile};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// The conversion/suggestion service as seen by the client.
///
/// Every call fires once; there are no retries and no timeouts.
#[async_trait]
pub trait UpTeachApi: Send + Sync {
    async fn upload(&self, file: &UploadedFile, subject: &str) -> Result<String, ClientError>;
    async fn content_suggest(&self, filename: &str, subject: &str)
        -> Result<String, ClientError>;
    async fn convert(&self, file: &UploadedFile, subject: &str)
        -> Result<Vec<String>, ClientError>;
    async fn lesson_plan(&self, file: &UploadedFile, subject: &str) -> Result<Value, ClientError>;
}

pub struct HttpUpTeachApi {
    http: Client,
    base_url: Url,
}

impl HttpUpTeachApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        let trimmed = base_url.trim();
        // Url::join drops the last path segment unless it ends with '/'.
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let base_url = Url::parse(&normalized).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, ClientError> {
        self.base_url
            .join(endpoint.path())
            .map_err(|source| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                source,
            })
    }

    fn file_form(file: &UploadedFile, subject: &str) -> Result<Form, ClientError> {
        let part = file_part(&file.filename, file.bytes.clone(), file.mime_type())?;
        Ok(Form::new()
            .part("file", part)
            .text("subject", subject.to_string()))
    }

    async fn send(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, ClientError> {
        info!(endpoint = endpoint.path(), "sending request");
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<ServiceErrorBody>(&body)
                .ok()
                .and_then(|body| body.error);
            warn!(
                endpoint = endpoint.path(),
                status = status.as_u16(),
                error = message.as_deref().unwrap_or_default(),
                "service returned an error status"
            );
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        debug!(endpoint = endpoint.path(), len = body.len(), "received response body");
        Ok(body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let body = self.send(endpoint, request).await?;
        serde_json::from_slice(&body).map_err(|err| {
            ClientError::InvalidResponse(format!(
                "malformed response from /{}: {err}",
                endpoint.path()
            ))
        })
    }
}

fn file_part(filename: &str, bytes: Vec<u8>, mime: &str) -> Result<Part, ClientError> {
    Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str(mime)
        .map_err(|err| ClientError::BuildRequest(format!("invalid content type '{mime}': {err}")))
}

#[async_trait]
impl UpTeachApi for HttpUpTeachApi {
    async fn upload(&self, file: &UploadedFile, subject: &str) -> Result<String, ClientError> {
        let url = self.endpoint_url(Endpoint::Upload)?;
        let form = Self::file_form(file, subject)?;
        let response: UploadResponse = self
            .send_json(Endpoint::Upload, self.http.post(url).multipart(form))
            .await?;
        Ok(response.filename)
    }

    async fn content_suggest(
        &self,
        filename: &str,
        subject: &str,
    ) -> Result<String, ClientError> {
        let url = self.endpoint_url(Endpoint::ContentSuggest)?;
        let request = self.http.post(url).json(&ContentSuggestRequest {
            filename: filename.to_string(),
            subject: subject.to_string(),
        });
        let response: ContentSuggestResponse =
            self.send_json(Endpoint::ContentSuggest, request).await?;
        Ok(response.suggestion)
    }

    async fn convert(
        &self,
        file: &UploadedFile,
        subject: &str,
    ) -> Result<Vec<String>, ClientError> {
        let endpoint = Endpoint::convert_for(file.kind());
        let url = self.endpoint_url(endpoint)?;
        let form = Self::file_form(file, subject)?;
        let response: ConvertResponse = self
            .send_json(endpoint, self.http.post(url).multipart(form))
            .await?;
        let slides = response
            .slide_urls()
            .ok_or_else(|| ClientError::InvalidResponse("Invalid response format".to_string()))?;
        if slides.is_empty() {
            warn!(filename = %file.filename, "no slides were converted");
        }
        Ok(slides)
    }

    async fn lesson_plan(&self, file: &UploadedFile, subject: &str) -> Result<Value, ClientError> {
        let url = self.endpoint_url(Endpoint::LessonPlan)?;
        let form = Self::file_form(file, subject)?;
        let body = self
            .send(Endpoint::LessonPlan, self.http.post(url).multipart(form))
            .await?;
        serde_json::from_slice(&body).map_err(|err| {
            ClientError::Decode(DecodeError::InvalidJson {
                message: err.to_string(),
            })
        })
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
