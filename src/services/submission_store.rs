use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value as JsonValue;
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result, StoreError};
use crate::models::submission::Submission;

/// PostgREST's error code for "single object requested, zero or many rows found".
const PGRST_NO_SINGLE_ROW: &str = "PGRST116";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Read access to the submissions table.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Every row, newest `created_at` first.
    async fn fetch_all(&self) -> std::result::Result<Vec<Submission>, StoreError>;

    /// The row with the given id, `Error::NotFound` when there is none.
    async fn fetch_by_id(&self, id: &str) -> Result<Submission>;
}

/// `SubmissionStore` backed by the Supabase REST endpoint.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: Url,
    api_key: String,
    table: String,
}

impl SupabaseStore {
    pub fn new(client: Client, supabase_url: &str, api_key: String, table: String) -> Result<Self> {
        let mut base_url = Url::parse(supabase_url)
            .map_err(|e| Error::Config(format!("Invalid SUPABASE_URL: {}", e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            api_key,
            table,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.store_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Self::new(
            client,
            &config.supabase_url,
            config.supabase_anon_key.clone(),
            config.submissions_table.clone(),
        )
    }

    fn table_url(&self) -> Result<Url> {
        self.base_url
            .join(&format!("rest/v1/{}", self.table))
            .map_err(|e| Error::Config(format!("Invalid table url: {}", e)))
    }

    pub fn list_url(&self) -> Result<Url> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        Ok(url)
    }

    pub fn by_id_url(&self, id: &str) -> Result<Url> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

async fn rejection(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<JsonValue>(&text).unwrap_or(JsonValue::String(text));
    StoreError::Rejected { status, body }
}

#[async_trait]
impl SubmissionStore for SupabaseStore {
    #[instrument(skip(self), fields(table = %self.table))]
    async fn fetch_all(&self) -> std::result::Result<Vec<Submission>, StoreError> {
        let url = self
            .list_url()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let response = self.get(url).send().await.map_err(|e| {
            error!(error = %e, "Submission list request failed");
            StoreError::Transport(e)
        })?;

        if !response.status().is_success() {
            let err = rejection(response).await;
            error!(error = %err, details = %err.details(), "Store rejected submission list query");
            return Err(err);
        }

        let rows = response
            .json::<Vec<Submission>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        debug!(rows = rows.len(), "Fetched submissions");
        Ok(rows)
    }

    #[instrument(skip(self), fields(table = %self.table))]
    async fn fetch_by_id(&self, id: &str) -> Result<Submission> {
        let url = self.by_id_url(id)?;
        let response = self
            .get(url)
            .header(header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await
            .map_err(StoreError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let err = rejection(response).await;
            if status == StatusCode::NOT_ACCEPTABLE || err.code() == Some(PGRST_NO_SINGLE_ROW) {
                debug!(details = %err.details(), "No single submission matched");
                return Err(Error::NotFound(format!("Submission {} not found", id)));
            }
            error!(error = %err, details = %err.details(), "Store rejected submission lookup");
            return Err(err.into());
        }

        // Proxies that drop the Accept header get an array back.
        let body = response
            .json::<JsonValue>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let row = match body {
            JsonValue::Array(mut rows) => match rows.len() {
                0 => return Err(Error::NotFound(format!("Submission {} not found", id))),
                1 => rows.remove(0),
                n => {
                    return Err(StoreError::Decode(format!(
                        "expected one row for id {}, got {}",
                        id, n
                    ))
                    .into())
                }
            },
            other => other,
        };
        serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()).into())
    }
}
