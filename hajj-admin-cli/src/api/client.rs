//! REST collaborator for entity collections
//!
//! `ResourceApi` is the seam the table controller and the import pipeline
//! talk through. `HttpResourceApi` implements it over reqwest; tests use the
//! recording double in `api::mock`.

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::error::ApiError;
use super::models::UploadFile;
use super::session::BearerToken;

/// Raw outcome of a create call; the controller only reloads on 201
#[derive(Debug, Clone, PartialEq)]
pub struct CreateResponse {
    pub status: u16,
    pub body: Value,
}

impl CreateResponse {
    pub fn is_created(&self) -> bool {
        self.status == 201
    }
}

/// Operations of the logistics REST API used by the admin console
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// `GET /<endpoint>`; the token is attached when present
    async fn list(&self, endpoint: &str, token: Option<&BearerToken>) -> Result<Value, ApiError>;

    /// `POST /<endpoint>` with a JSON draft
    async fn create(
        &self,
        endpoint: &str,
        body: &Value,
        token: &BearerToken,
    ) -> Result<CreateResponse, ApiError>;

    /// `PUT /<endpoint>/<id>` with the full record
    async fn update(
        &self,
        endpoint: &str,
        id: &str,
        body: &Value,
        token: &BearerToken,
    ) -> Result<Value, ApiError>;

    /// `DELETE /<endpoint>/<id>`
    async fn delete(&self, endpoint: &str, id: &str, token: &BearerToken) -> Result<(), ApiError>;

    /// `POST /<endpoint>/bulk-upload` with the spreadsheet as multipart field `file`
    async fn bulk_upload(
        &self,
        endpoint: &str,
        file: &UploadFile,
        token: &BearerToken,
    ) -> Result<Value, ApiError>;

    /// `POST /<endpoint>` with a single file as multipart field `part`; used for
    /// assets such as country flags whose URL is then stored on a record
    async fn upload_file(
        &self,
        endpoint: &str,
        part: &str,
        file: &UploadFile,
        token: &BearerToken,
    ) -> Result<Value, ApiError>;

    /// `POST /<endpoint>/bulk-update` with `{ids, status}`
    async fn bulk_update(
        &self,
        endpoint: &str,
        body: &Value,
        token: &BearerToken,
    ) -> Result<(), ApiError>;
}

/// reqwest implementation against `<base_url>/<endpoint>`
#[derive(Debug, Clone)]
pub struct HttpResourceApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpResourceApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_matches('/'))
    }

    fn record_url(&self, endpoint: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(endpoint),
            urlencoding::encode(id)
        )
    }
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    async fn list(&self, endpoint: &str, token: Option<&BearerToken>) -> Result<Value, ApiError> {
        let url = self.collection_url(endpoint);
        debug!("GET {}", url);

        let mut request = self.http.get(&url);
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, token.header_value());
        }
        let response = request.send().await?;
        read_json(response).await
    }

    async fn create(
        &self,
        endpoint: &str,
        body: &Value,
        token: &BearerToken,
    ) -> Result<CreateResponse, ApiError> {
        let url = self.collection_url(endpoint);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, token.header_value())
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = read_json(response).await?;
        Ok(CreateResponse { status, body })
    }

    async fn update(
        &self,
        endpoint: &str,
        id: &str,
        body: &Value,
        token: &BearerToken,
    ) -> Result<Value, ApiError> {
        let url = self.record_url(endpoint, id);
        debug!("PUT {}", url);

        let response = self
            .http
            .put(&url)
            .header(reqwest::header::AUTHORIZATION, token.header_value())
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete(&self, endpoint: &str, id: &str, token: &BearerToken) -> Result<(), ApiError> {
        let url = self.record_url(endpoint, id);
        debug!("DELETE {}", url);

        let response = self
            .http
            .delete(&url)
            .header(reqwest::header::AUTHORIZATION, token.header_value())
            .send()
            .await?;
        read_json(response).await.map(|_| ())
    }

    async fn bulk_upload(
        &self,
        endpoint: &str,
        file: &UploadFile,
        token: &BearerToken,
    ) -> Result<Value, ApiError> {
        let url = format!("{}/bulk-upload", self.collection_url(endpoint));
        self.post_file(&url, "file", file, token).await
    }

    async fn upload_file(
        &self,
        endpoint: &str,
        part: &str,
        file: &UploadFile,
        token: &BearerToken,
    ) -> Result<Value, ApiError> {
        let url = self.collection_url(endpoint);
        self.post_file(&url, part, file, token).await
    }

    async fn bulk_update(
        &self,
        endpoint: &str,
        body: &Value,
        token: &BearerToken,
    ) -> Result<(), ApiError> {
        let url = format!("{}/bulk-update", self.collection_url(endpoint));
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, token.header_value())
            .json(body)
            .send()
            .await?;
        read_json(response).await.map(|_| ())
    }
}

impl HttpResourceApi {
    async fn post_file(
        &self,
        url: &str,
        part: &str,
        file: &UploadFile,
        token: &BearerToken,
    ) -> Result<Value, ApiError> {
        debug!("POST {} ({} bytes, {})", url, file.bytes.len(), file.name);

        let body = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part(part.to_string(), body);

        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, token.header_value())
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }
}

/// Check the status and parse the body; an empty body reads as `null`
async fn read_json(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        debug!("Request failed with {}: {}", status, text);
        return Err(ApiError::rejected(status.as_u16(), &text));
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}
