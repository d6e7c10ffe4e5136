use async_trait::async_trait;
use herald_models::{ContentKind, MediaItem};
use reqwest::Client;
use tracing::debug;

use crate::error::SourceError;
use crate::jellyfin::api::{ItemsResponse, ScheduledTaskDto};
use crate::traits::{EpisodeFilter, ItemPage, MediaServer};

const ITEM_FIELDS: &str = "DateCreated,Overview,ProviderIds,MediaSources,PremiereDate";

/// HTTP client for a Jellyfin-compatible media server.
#[derive(Clone)]
pub struct JellyfinClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl JellyfinClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_items(&self, query: &[(&str, String)]) -> Result<ItemsResponse, SourceError> {
        let response = self
            .client
            .get(self.url("/Items"))
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status("jellyfin", status.as_u16(), "/Items"));
        }
        response
            .json::<ItemsResponse>()
            .await
            .map_err(|e| SourceError::decode("jellyfin", e.to_string()))
    }
}

#[async_trait]
impl MediaServer for JellyfinClient {
    async fn get_item(&self, item_id: &str) -> Result<Option<MediaItem>, SourceError> {
        let query = [
            ("Ids", item_id.to_string()),
            ("Recursive", "true".to_string()),
            ("Fields", ITEM_FIELDS.to_string()),
        ];
        let response = self.get_items(&query).await?;
        Ok(response
            .items
            .into_iter()
            .next()
            .map(|dto| dto.into_media_item()))
    }

    async fn list_items(
        &self,
        kind: ContentKind,
        start_index: u32,
        limit: u32,
    ) -> Result<ItemPage, SourceError> {
        let query = [
            ("IncludeItemTypes", kind.wire_name().to_string()),
            ("Recursive", "true".to_string()),
            ("Fields", ITEM_FIELDS.to_string()),
            ("SortBy", "DateCreated".to_string()),
            ("SortOrder", "Descending".to_string()),
            ("StartIndex", start_index.to_string()),
            ("Limit", limit.to_string()),
        ];
        let response = self.get_items(&query).await?;
        debug!(
            kind = kind.wire_name(),
            start_index,
            page_len = response.items.len(),
            total = response.total_record_count,
            "Fetched catalog page"
        );
        Ok(ItemPage {
            items: response
                .items
                .into_iter()
                .map(|dto| dto.into_media_item())
                .collect(),
            total: response.total_record_count,
        })
    }

    async fn count_episodes(
        &self,
        season_id: &str,
        filter: EpisodeFilter,
    ) -> Result<u32, SourceError> {
        let is_missing = matches!(filter, EpisodeFilter::Missing);
        let query = [
            ("ParentId", season_id.to_string()),
            ("IncludeItemTypes", "Episode".to_string()),
            ("Recursive", "true".to_string()),
            ("IsMissing", is_missing.to_string()),
            // Limit=0 still reports TotalRecordCount, making counts cheap
            ("Limit", "0".to_string()),
        ];
        let response = self.get_items(&query).await?;
        Ok(response.total_record_count)
    }

    async fn list_episodes(&self, season_id: &str) -> Result<Vec<MediaItem>, SourceError> {
        let query = [
            ("ParentId", season_id.to_string()),
            ("IncludeItemTypes", "Episode".to_string()),
            ("Recursive", "true".to_string()),
            ("Fields", ITEM_FIELDS.to_string()),
            ("SortBy", "IndexNumber".to_string()),
            ("SortOrder", "Ascending".to_string()),
        ];
        let response = self.get_items(&query).await?;
        Ok(response
            .items
            .into_iter()
            .map(|dto| dto.into_media_item())
            .collect())
    }

    async fn is_scanning(&self) -> Result<bool, SourceError> {
        let response = self
            .client
            .get(self.url("/ScheduledTasks"))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status(
                "jellyfin",
                status.as_u16(),
                "/ScheduledTasks",
            ));
        }
        let tasks = response
            .json::<Vec<ScheduledTaskDto>>()
            .await
            .map_err(|e| SourceError::decode("jellyfin", e.to_string()))?;
        Ok(tasks.iter().any(|t| t.is_running_library_scan()))
    }

    async fn primary_image(&self, item_id: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let url = self.url(&format!("/Items/{}/Images/Primary", item_id));
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status("jellyfin", status.as_u16(), url));
        }
        let bytes = response.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }
}
