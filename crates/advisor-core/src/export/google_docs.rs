use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::{classify_status, CredentialProvider, DocumentExporter, ExportReceipt};
use crate::constants::{endpoints, keys, texts};
use crate::context::KeyValueStore;
use crate::error::ExportError;

/// Appends messages to a single "main" Google Doc, creating it on first use.
/// The document id is remembered under `main_document_id`.
pub struct GoogleDocsExporter {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
    store: Arc<dyn KeyValueStore>,
    docs_url: String,
    drive_url: String,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedDocument {
    document_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    #[serde(default)]
    web_view_link: Option<String>,
}

impl GoogleDocsExporter {
    pub fn new(credentials: Arc<dyn CredentialProvider>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            store,
            docs_url: endpoints::GOOGLE_DOCS_URL.to_string(),
            drive_url: endpoints::GOOGLE_DRIVE_FILES_URL.to_string(),
            title: texts::MAIN_DOCUMENT_TITLE.to_string(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Point the Docs and Drive calls at other base URLs.
    pub fn with_endpoints(mut self, docs_url: impl Into<String>, drive_url: impl Into<String>) -> Self {
        self.docs_url = docs_url.into();
        self.drive_url = drive_url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn remembered_document_id(&self) -> Option<String> {
        match self.store.get(keys::MAIN_DOCUMENT_ID) {
            Ok(id) => id.filter(|id| !id.trim().is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read main document id: {e}");
                None
            }
        }
    }

    fn remember_document_id(&self, id: &str) {
        if let Err(e) = self.store.set(keys::MAIN_DOCUMENT_ID, id) {
            tracing::warn!("Failed to remember main document id: {e}");
        }
    }

    async fn fetch_document(&self, token: &str, id: &str) -> Result<Value, ExportError> {
        let response = self
            .client
            .get(format!("{}/{}", self.docs_url, id))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }
        Ok(response.json().await?)
    }

    async fn create_document(&self, token: &str) -> Result<String, ExportError> {
        tracing::info!(title = %self.title, "Creating main export document");
        let response = self
            .client
            .post(&self.docs_url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "title": self.title }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        let created: CreatedDocument = response.json().await?;
        self.remember_document_id(&created.document_id);
        Ok(created.document_id)
    }

    /// Returns the main document id and its current content.
    async fn main_document(&self, token: &str) -> Result<(String, Value), ExportError> {
        if let Some(id) = self.remembered_document_id() {
            match self.fetch_document(token, &id).await {
                Ok(doc) => return Ok((id, doc)),
                Err(ExportError::AuthExpired) => return Err(ExportError::AuthExpired),
                Err(e) => {
                    tracing::warn!(document_id = %id, "Main document unavailable, creating a new one: {e}");
                }
            }
        }

        let id = self.create_document(token).await?;
        let doc = self.fetch_document(token, &id).await?;
        Ok((id, doc))
    }

    async fn insert_text(&self, token: &str, id: &str, index: u64, text: &str) -> Result<(), ExportError> {
        let body = serde_json::json!({
            "requests": [{
                "insertText": {
                    "location": { "index": index },
                    "text": text,
                }
            }]
        });

        let response = self
            .client
            .post(format!("{}/{}:batchUpdate", self.docs_url, id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }
        Ok(())
    }

    async fn web_view_link(&self, token: &str, id: &str) -> Result<Option<String>, ExportError> {
        let response = self
            .client
            .get(format!("{}/{}", self.drive_url, id))
            .query(&[("fields", "webViewLink")])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        let file: DriveFile = response.json().await?;
        Ok(file.web_view_link)
    }
}

#[async_trait::async_trait]
impl DocumentExporter for GoogleDocsExporter {
    async fn save(&self, text: &str) -> Result<ExportReceipt, ExportError> {
        let token = self
            .credentials
            .access_token()
            .ok_or(ExportError::NotAuthenticated)?;

        let (id, document) = self.main_document(&token).await?;
        let index = insert_index(&document);
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        self.insert_text(&token, &id, index, &export_block(&stamp, text))
            .await?;
        tracing::info!(document_id = %id, index, "Message appended to document");

        let url = self.web_view_link(&token, &id).await?;
        Ok(ExportReceipt {
            document_id: id,
            document_url: url,
        })
    }
}

/// Index just before the trailing newline of the document body.
/// Empty documents start at 1.
pub(crate) fn insert_index(document: &Value) -> u64 {
    document
        .pointer("/body/content")
        .and_then(|c| c.as_array())
        .and_then(|c| c.last())
        .and_then(|last| last.get("endIndex"))
        .and_then(|i| i.as_u64())
        .map(|end| end.saturating_sub(1).max(1))
        .unwrap_or(1)
}

pub(crate) fn export_block(stamp: &str, text: &str) -> String {
    format!("\n\n--- Message from {} ---\n\n{}", stamp, text)
}
