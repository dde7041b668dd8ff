//! Paginated Notion API client
//!
//! Only the handful of endpoints the exporter needs: block children,
//! database retrieval (to find its data source), and data source queries.

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::page::Page;
use crate::block::Block;
use crate::children::ChildLoader;
use crate::config::NotionConfig;
use crate::error::NotionError;

/// One page of a list endpoint
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatabaseResponse {
    #[serde(default)]
    data_sources: Vec<DataSourceRef>,
}

#[derive(Debug, Deserialize)]
struct DataSourceRef {
    id: String,
}

#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    token: String,
    api_version: String,
    base_url: String,
    page_size: u32,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &NotionConfig) -> Self {
        Self {
            http,
            token: config.token.clone(),
            api_version: config.api_version.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/v1/{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.api_version)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NotionError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotionError::Api { status, body });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Every child block of `block_id`, following cursors until exhausted
    pub async fn list_children(&self, block_id: &str) -> Result<Vec<Block>, NotionError> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("page_size", self.page_size.to_string())];
            if let Some(cursor) = &cursor {
                query.push(("start_cursor", cursor.clone()));
            }

            let request = self
                .request(reqwest::Method::GET, &format!("blocks/{}/children", block_id))
                .query(&query);
            let page: ListResponse<Block> = self.send(request).await?;
            debug!(
                "Fetched {} children of {} (has_more: {})",
                page.results.len(),
                block_id,
                page.has_more
            );

            blocks.extend(page.results);
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }

    /// Data source id for a database id. Ids that already name a data
    /// source (`ntn_` prefix) are returned as is.
    pub async fn resolve_data_source_id(&self, id: &str) -> Result<String, NotionError> {
        if id.starts_with("ntn_") {
            return Ok(id.to_string());
        }

        let request = self.request(reqwest::Method::GET, &format!("databases/{}", id));
        let database: DatabaseResponse = self.send(request).await?;

        database
            .data_sources
            .into_iter()
            .next()
            .map(|ds| ds.id)
            .ok_or_else(|| NotionError::NoDataSource {
                database_id: id.to_string(),
            })
    }

    /// Every page row of a data source
    pub async fn query_pages(&self, data_source_id: &str) -> Result<Vec<Page>, NotionError> {
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": self.page_size });
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }

            let request = self
                .request(
                    reqwest::Method::POST,
                    &format!("data_sources/{}/query", data_source_id),
                )
                .json(&body);
            let page: ListResponse<Value> = self.send(request).await?;

            for result in page.results {
                let is_page = result.get("object").and_then(Value::as_str) == Some("page")
                    && result.get("properties").is_some_and(|p| !p.is_null());
                if is_page {
                    pages.push(serde_json::from_value(result)?);
                }
            }

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        debug!("Data source {} returned {} pages", data_source_id, pages.len());
        Ok(pages)
    }
}

#[async_trait]
impl ChildLoader for NotionClient {
    async fn load_children(&self, block_id: &str) -> Result<Vec<Block>> {
        Ok(self.list_children(block_id).await?)
    }
}
