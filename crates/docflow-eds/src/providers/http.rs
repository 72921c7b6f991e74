//! Drive v3 / Docs v1 REST provider.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use docflow_core::config::EdsConfig;
use docflow_core::config::eds::PermissionPolicy;
use docflow_core::error::{AppError, ErrorKind};
use docflow_core::result::AppResult;
use docflow_core::traits::document_store::FOLDER_MIME_TYPE;
use docflow_core::traits::{DocumentContent, DocumentStore, FileMeta, FileUpload};
use docflow_core::types::ExternalId;

use crate::docs::{DocsDocument, replace_range_request};

const DEFAULT_UPLOAD_MIME: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
struct IdResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParentsResponse {
    #[serde(default)]
    parents: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataResponse {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
}

/// Provider talking to the Drive and Docs REST APIs with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: Client,
    drive_url: String,
    upload_url: String,
    docs_url: String,
    access_token: String,
    permission: PermissionPolicy,
}

impl HttpDocumentStore {
    /// Create a provider from configuration.
    pub fn new(config: &EdsConfig) -> AppResult<Self> {
        if config.access_token.trim().is_empty() {
            return Err(AppError::configuration(
                "eds.access_token must be set for the http provider",
            ));
        }
        let client = Client::builder().build().map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
        })?;
        Ok(Self {
            client,
            drive_url: config.drive_base_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_base_url.trim_end_matches('/').to_string(),
            docs_url: config.docs_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            permission: config.permission.clone(),
        })
    }

    fn file_url(&self, id: &ExternalId, suffix: &str) -> String {
        format!("{}/files/{}{suffix}", self.drive_url, id.as_str())
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> AppResult<Response> {
        debug!(action, "Calling external document store");
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| transport_error(action, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(action, status, &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> AppResult<T> {
        self.send(request, action)
            .await?
            .json::<T>()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("{action}: malformed response"),
                    e,
                )
            })
    }

    async fn fetch_document(&self, document_id: &ExternalId) -> AppResult<DocsDocument> {
        let url = format!("{}/documents/{}", self.docs_url, document_id.as_str());
        self.send_json(self.client.get(url), "get document").await
    }

    async fn batch_update(
        &self,
        document_id: &ExternalId,
        requests: Vec<Value>,
        action: &str,
    ) -> AppResult<()> {
        if requests.is_empty() {
            debug!(document_id = %document_id, action, "No document updates to send");
            return Ok(());
        }
        let url = format!(
            "{}/documents/{}:batchUpdate",
            self.docs_url,
            document_id.as_str()
        );
        self.send(
            self.client.post(url).json(&json!({ "requests": requests })),
            action,
        )
        .await?;
        Ok(())
    }

    async fn rename(&self, id: &ExternalId, name: &str, action: &str) -> AppResult<()> {
        let url = self.file_url(id, "?supportsAllDrives=true");
        self.send(self.client.patch(url).json(&json!({ "name": name })), action)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    fn provider_type(&self) -> &str {
        "http"
    }

    async fn copy_file(
        &self,
        template_id: &ExternalId,
        dest_folder_id: &ExternalId,
        new_name: &str,
    ) -> AppResult<Option<ExternalId>> {
        let url = self.file_url(template_id, "/copy?supportsAllDrives=true");
        let body = json!({ "name": new_name, "parents": [dest_folder_id] });
        let response: IdResponse = self
            .send_json(self.client.post(url).json(&body), "copy file")
            .await?;
        Ok(ExternalId::from_reported(response.id))
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_ids: &[ExternalId],
    ) -> AppResult<Option<ExternalId>> {
        let url = format!("{}/files?supportsAllDrives=true", self.drive_url);
        let body = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": parent_ids,
        });
        let response: IdResponse = self
            .send_json(self.client.post(url).json(&body), "create folder")
            .await?;
        Ok(ExternalId::from_reported(response.id))
    }

    async fn move_file(&self, file_id: &ExternalId, new_parent_id: &ExternalId) -> AppResult<()> {
        let current: ParentsResponse = self
            .send_json(
                self.client
                    .get(self.file_url(file_id, "?fields=parents&supportsAllDrives=true")),
                "read parents",
            )
            .await?;

        let url = self.file_url(
            file_id,
            &format!(
                "?addParents={}&removeParents={}&supportsAllDrives=true",
                new_parent_id.as_str(),
                current.parents.join(",")
            ),
        );
        self.send(self.client.patch(url).json(&json!({})), "move file")
            .await?;
        Ok(())
    }

    async fn trash(&self, id: &ExternalId) -> AppResult<()> {
        let url = self.file_url(id, "?supportsAllDrives=true");
        self.send(
            self.client.patch(url).json(&json!({ "trashed": true })),
            "trash",
        )
        .await?;
        Ok(())
    }

    async fn get_file_metadata(&self, id: &ExternalId) -> AppResult<FileMeta> {
        let url = self.file_url(id, "?fields=id,name,mimeType&supportsAllDrives=true");
        let meta: MetadataResponse = self.send_json(self.client.get(url), "get metadata").await?;
        Ok(FileMeta {
            id: ExternalId::new(meta.id),
            name: meta.name,
            mime_type: meta.mime_type,
        })
    }

    async fn update_file_metadata(&self, id: &ExternalId, name: &str) -> AppResult<()> {
        self.rename(id, name, "rename file").await
    }

    async fn update_folder_metadata(&self, id: &ExternalId, name: &str) -> AppResult<()> {
        self.rename(id, name, "rename folder").await
    }

    async fn upload_file(
        &self,
        upload: &FileUpload,
        parent_folder_id: &ExternalId,
    ) -> AppResult<Option<ExternalId>> {
        let mime_type = upload.mime_type.as_deref().unwrap_or(DEFAULT_UPLOAD_MIME);
        let metadata = json!({
            "name": upload.name,
            "mimeType": mime_type,
            "parents": [parent_folder_id],
        });
        let boundary = format!("docflow-{}", Uuid::new_v4().simple());
        let body = multipart_related(&boundary, &metadata, mime_type, &upload.data);

        let url = format!(
            "{}/files?uploadType=multipart&supportsAllDrives=true",
            self.upload_url
        );
        let response: IdResponse = self
            .send_json(
                self.client
                    .post(url)
                    .header(
                        CONTENT_TYPE,
                        format!("multipart/related; boundary={boundary}"),
                    )
                    .body(body),
                "upload file",
            )
            .await?;
        Ok(ExternalId::from_reported(response.id))
    }

    async fn create_permissions(&self, file_id: &ExternalId) -> AppResult<()> {
        let mut body = json!({
            "type": self.permission.grantee_type,
            "role": self.permission.role,
        });
        if let Some(domain) = &self.permission.domain {
            body["domain"] = json!(domain);
        }
        let url = self.file_url(file_id, "/permissions?supportsAllDrives=true");
        self.send(self.client.post(url).json(&body), "create permissions")
            .await?;
        Ok(())
    }

    async fn get_document(&self, document_id: &ExternalId) -> AppResult<DocumentContent> {
        Ok(self.fetch_document(document_id).await?.to_content())
    }

    async fn create_named_ranges_from_tags(&self, document_id: &ExternalId) -> AppResult<()> {
        let document = self.fetch_document(document_id).await?;
        let requests = document.tag_range_requests();
        debug!(document_id = %document_id, tags = requests.len(), "Creating named ranges from tags");
        self.batch_update(document_id, requests, "create named ranges")
            .await
    }

    async fn clear_named_ranges(&self, document_id: &ExternalId) -> AppResult<()> {
        let document = self.fetch_document(document_id).await?;
        self.batch_update(
            document_id,
            document.clear_range_requests(),
            "clear named ranges",
        )
        .await
    }

    async fn fill_named_range(
        &self,
        document_id: &ExternalId,
        range_name: &str,
        text: &str,
    ) -> AppResult<()> {
        self.batch_update(
            document_id,
            vec![replace_range_request(range_name, text)],
            "fill named range",
        )
        .await
    }
}

/// Map a failed send to the error taxonomy. Anything that never produced
/// a response is treated as transient, except malformed requests.
fn transport_error(action: &str, err: reqwest::Error) -> AppError {
    if err.is_builder() {
        AppError::with_source(
            ErrorKind::Internal,
            format!("{action}: invalid request"),
            err,
        )
    } else {
        AppError::with_source(
            ErrorKind::EdsTransient,
            format!("{action}: store unreachable"),
            err,
        )
    }
}

/// Map a non-success status to the error taxonomy.
fn status_error(action: &str, status: StatusCode, body: &str) -> AppError {
    let detail: String = body.chars().take(300).collect();
    let message = format!("{action} failed with {status}: {detail}");

    let rate_limited = status == StatusCode::FORBIDDEN
        && (body.contains("rateLimitExceeded") || body.contains("userRateLimitExceeded"));

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() || rate_limited {
        AppError::eds_transient(message)
    } else if status == StatusCode::NOT_FOUND {
        AppError::not_found(message)
    } else {
        AppError::external_service(message)
    }
}

fn multipart_related(boundary: &str, metadata: &Value, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
             --{boundary}\r\nContent-Type: {mime_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
