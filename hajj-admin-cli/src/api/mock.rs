//! Test doubles for the REST collaborator and the credential store

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

use super::client::{CreateResponse, ResourceApi};
use super::error::ApiError;
use super::models::UploadFile;
use super::session::{BearerToken, CredentialStore};

/// One call observed by `MockApi`
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { endpoint: String, authorized: bool },
    Create { endpoint: String, body: Value },
    Update { endpoint: String, id: String, body: Value },
    Delete { endpoint: String, id: String },
    BulkUpload { endpoint: String, file_name: String },
    UploadFile { endpoint: String, part: String, file_name: String },
    BulkUpdate { endpoint: String, body: Value },
}

/// Recording `ResourceApi` with scripted responses
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    lists: Mutex<HashMap<String, Result<Value, ApiError>>>,
    create_response: Mutex<Option<Result<CreateResponse, ApiError>>>,
    update_failure: Mutex<Option<ApiError>>,
    delete_failures: Mutex<HashMap<String, ApiError>>,
    upload_response: Mutex<Option<Result<Value, ApiError>>>,
    file_response: Mutex<Option<Result<Value, ApiError>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response of `GET /<endpoint>`; unscripted endpoints return `[]`
    pub fn with_list(self, endpoint: &str, value: Value) -> Self {
        self.set_list(endpoint, value);
        self
    }

    pub fn set_list(&self, endpoint: &str, value: Value) {
        self.lists.lock().unwrap().insert(endpoint.to_string(), Ok(value));
    }

    pub fn fail_list(&self, endpoint: &str, err: ApiError) {
        self.lists.lock().unwrap().insert(endpoint.to_string(), Err(err));
    }

    pub fn set_create_response(&self, response: Result<CreateResponse, ApiError>) {
        *self.create_response.lock().unwrap() = Some(response);
    }

    pub fn fail_update(&self, err: ApiError) {
        *self.update_failure.lock().unwrap() = Some(err);
    }

    pub fn fail_delete(&self, id: &str, err: ApiError) {
        self.delete_failures.lock().unwrap().insert(id.to_string(), err);
    }

    pub fn set_upload_response(&self, response: Result<Value, ApiError>) {
        *self.upload_response.lock().unwrap() = Some(response);
    }

    /// Script the response of single-file uploads; by default `{url}` on a fake CDN
    pub fn set_file_response(&self, response: Result<Value, ApiError>) {
        *self.file_response.lock().unwrap() = Some(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self, endpoint: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List { endpoint: e, .. } if e == endpoint))
            .count()
    }

    /// Calls other than reads
    pub fn write_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ResourceApi for MockApi {
    async fn list(&self, endpoint: &str, token: Option<&BearerToken>) -> Result<Value, ApiError> {
        self.record(Call::List {
            endpoint: endpoint.to_string(),
            authorized: token.is_some(),
        });
        self.lists
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Ok(json!([])))
    }

    async fn create(
        &self,
        endpoint: &str,
        body: &Value,
        _token: &BearerToken,
    ) -> Result<CreateResponse, ApiError> {
        self.record(Call::Create {
            endpoint: endpoint.to_string(),
            body: body.clone(),
        });
        self.create_response.lock().unwrap().clone().unwrap_or_else(|| {
            let mut created = body.clone();
            created["_id"] = json!("new-id");
            Ok(CreateResponse {
                status: 201,
                body: created,
            })
        })
    }

    async fn update(
        &self,
        endpoint: &str,
        id: &str,
        body: &Value,
        _token: &BearerToken,
    ) -> Result<Value, ApiError> {
        self.record(Call::Update {
            endpoint: endpoint.to_string(),
            id: id.to_string(),
            body: body.clone(),
        });
        match self.update_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(body.clone()),
        }
    }

    async fn delete(&self, endpoint: &str, id: &str, _token: &BearerToken) -> Result<(), ApiError> {
        self.record(Call::Delete {
            endpoint: endpoint.to_string(),
            id: id.to_string(),
        });
        match self.delete_failures.lock().unwrap().get(id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn bulk_upload(
        &self,
        endpoint: &str,
        file: &UploadFile,
        _token: &BearerToken,
    ) -> Result<Value, ApiError> {
        self.record(Call::BulkUpload {
            endpoint: endpoint.to_string(),
            file_name: file.name.clone(),
        });
        self.upload_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(json!({ "count": 0 })))
    }

    async fn upload_file(
        &self,
        endpoint: &str,
        part: &str,
        file: &UploadFile,
        _token: &BearerToken,
    ) -> Result<Value, ApiError> {
        self.record(Call::UploadFile {
            endpoint: endpoint.to_string(),
            part: part.to_string(),
            file_name: file.name.clone(),
        });
        self.file_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(json!({ "url": format!("https://cdn.example.com/{}", file.name) })))
    }

    async fn bulk_update(
        &self,
        endpoint: &str,
        body: &Value,
        _token: &BearerToken,
    ) -> Result<(), ApiError> {
        self.record(Call::BulkUpdate {
            endpoint: endpoint.to_string(),
            body: body.clone(),
        });
        Ok(())
    }
}

/// In-memory `CredentialStore`
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load_token(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap().clone())
    }

    async fn store_token(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    async fn clear_token(&self) -> Result<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}
