use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<SearchItemId>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

/// Trailer search against the YouTube Data API.
pub struct YoutubeClient {
    client: Client,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Watch URL of the first search hit for "<title> Trailer <year>".
    pub async fn trailer_url(&self, title: &str, year: Option<i32>) -> Option<String> {
        let query = match year {
            Some(year) => format!("{} Trailer {}", title, year),
            None => format!("{} Trailer", title),
        };
        let response = match self
            .client
            .get("https://www.googleapis.com/youtube/v3/search")
            .query(&[
                ("part", "snippet"),
                ("q", &query),
                ("type", "video"),
                ("key", &self.api_key),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(query, error = %e, "YouTube search failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(
                query,
                status = response.status().as_u16(),
                "YouTube returned an error status"
            );
            return None;
        }
        let body: SearchResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(query, error = %e, "Failed to decode YouTube response");
                return None;
            }
        };
        let video_id = body.items.into_iter().next()?.id?.video_id?;
        Some(format!("https://www.youtube.com/watch?v={}", video_id))
    }
}
