//! Note repository backed by Azure Table Storage
//!
//! Every request URI is `{table}{sas_token}`, optionally followed by a
//! filter (`&$filter=...`) or preceded by an entity key
//! (`{table}(PartitionKey='..',RowKey='..')`).

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Response;

use crate::error::{ClientError, ErrorCategory, RepositoryError, STORAGE_UNRESPONSIVE_MESSAGE};
use crate::http::{HttpService, MediaType, classify};
use crate::models::{Note, NoteCollection, ODataError};
use crate::odata::{ODataFilter, table_filter};

pub const NOTE_TIMEOUT: Duration = Duration::from_secs(30);

pub const NOTE_SAVED_MESSAGE: &str = "Note Saved!";
pub const NOTE_UPDATED_MESSAGE: &str = "Note Updated!";
pub const NOTE_DELETED_MESSAGE: &str = "Delete Successful";

/// Storage account and table of the notes
#[derive(Debug, Clone, Default)]
pub struct NoteSettings {
    pub account_name: String,
    /// Starts with `?`, e.g. `?sv=2019-12-12&ss=t&sig=...`
    pub sas_token: String,
    pub table_name: String,
    /// Replaces `https://{account}.table.core.windows.net/`
    pub endpoint: Option<String>,
}

impl NoteSettings {
    fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}.table.core.windows.net/", self.account_name),
        }
    }
}

/// Keep the first line of a table error and only ASCII letters and spaces
fn format_table_error(message: &str) -> String {
    let first_line = message.split('\n').next().unwrap_or_default();
    first_line
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
        .collect()
}

#[derive(Debug, Clone)]
pub struct NoteClient {
    http: HttpService,
    sas_token: String,
    table_name: String,
}

impl NoteClient {
    pub fn new(settings: NoteSettings) -> Result<Self, ClientError> {
        Self::with_timeout(settings, NOTE_TIMEOUT)
    }

    pub fn with_timeout(settings: NoteSettings, timeout: Duration) -> Result<Self, ClientError> {
        if settings.endpoint.is_none() && settings.account_name.is_empty() {
            return Err(ClientError::MissingSetting("account name"));
        }
        if settings.table_name.is_empty() {
            return Err(ClientError::MissingSetting("table name"));
        }
        let http = HttpService::new(
            &settings.base_url(),
            timeout,
            MediaType::Json,
            HeaderMap::new(),
        )?;
        Ok(Self {
            http,
            sas_token: settings.sas_token,
            table_name: settings.table_name,
        })
    }

    fn table_path(&self) -> String {
        format!("{}{}", self.table_name, self.sas_token)
    }

    fn entity_path(&self, note: &Note) -> String {
        format!(
            "{}(PartitionKey='{}',RowKey='{}'){}",
            self.table_name, note.partition_key, note.row_key, self.sas_token
        )
    }

    fn transport(error: ClientError) -> RepositoryError {
        RepositoryError::from_client_error(error, STORAGE_UNRESPONSIVE_MESSAGE)
    }

    fn checked_keys(note: &Note) -> Result<(), RepositoryError> {
        if note.has_keys() {
            return Ok(());
        }
        tracing::error!(
            partition_key = %note.partition_key,
            row_key = %note.row_key,
            "Note is missing a key"
        );
        Err(RepositoryError::invalid_field())
    }

    /// Error reported by the table service, in its OData error envelope
    async fn table_error(response: Response) -> RepositoryError {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read table error body");
                String::new()
            }
        };
        match serde_json::from_str::<ODataError>(&body) {
            Ok(error) => {
                tracing::warn!(
                    status = %status,
                    code = error.error.code.as_deref().unwrap_or_default(),
                    "Table service rejected the request"
                );
                RepositoryError::new(
                    ErrorCategory::from_status(status),
                    format_table_error(&error.error.message.value),
                )
            }
            Err(_) => classify(status, &body),
        }
    }

    async fn expect_success(
        response: Result<Response, ClientError>,
        message: &str,
    ) -> Result<String, RepositoryError> {
        let response = response.map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(Self::table_error(response).await);
        }
        Ok(message.to_string())
    }

    /// Notes matching every filter; at least one filter is required
    pub async fn query_notes(&self, filters: &[ODataFilter]) -> Result<Vec<Note>, RepositoryError> {
        if filters.is_empty() {
            tracing::error!("Note query without filters");
            return Err(RepositoryError::invalid_field());
        }
        let path = format!("{}{}", self.table_path(), table_filter(filters));
        let response = self.http.query(&path).await.map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(Self::table_error(response).await);
        }

        let collection: NoteCollection = self
            .http
            .read_body(response)
            .await
            .map_err(Self::transport)?;
        Ok(collection
            .value
            .into_iter()
            .map(|mut note| {
                note.strip_annotations();
                note
            })
            .collect())
    }

    pub async fn insert_note(&self, note: &Note) -> Result<String, RepositoryError> {
        Self::checked_keys(note)?;
        let response = self.http.insert(&self.table_path(), note).await;
        Self::expect_success(response, NOTE_SAVED_MESSAGE).await
    }

    pub async fn update_note(&self, note: &Note) -> Result<String, RepositoryError> {
        Self::checked_keys(note)?;
        let response = self.http.update(&self.entity_path(note), note).await;
        Self::expect_success(response, NOTE_UPDATED_MESSAGE).await
    }

    pub async fn delete_note(&self, note: &Note) -> Result<String, RepositoryError> {
        Self::checked_keys(note)?;
        let response = self.http.delete(&self.entity_path(note)).await;
        Self::expect_success(response, NOTE_DELETED_MESSAGE).await
    }
}
