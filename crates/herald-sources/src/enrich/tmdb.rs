use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct SearchTvResponse {
    #[serde(default)]
    results: Vec<SearchTvResult>,
}

#[derive(Debug, Deserialize)]
struct SearchTvResult {
    id: i64,
}

/// TMDB series lookup, used when the webhook did not carry a TMDB id
/// (seasons rarely do) so the ratings enrichment can still run.
pub struct TmdbClient {
    client: Client,
    api_key: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    pub async fn find_tv_id(&self, series_name: &str, first_air_year: Option<i32>) -> Option<String> {
        let mut query: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("query", series_name.to_string()),
            ("language", "en-US".to_string()),
            ("page", "1".to_string()),
        ];
        if let Some(year) = first_air_year {
            query.push(("first_air_date_year", year.to_string()));
        }

        let response = match self
            .client
            .get("https://api.themoviedb.org/3/search/tv")
            .query(&query)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(series_name, error = %e, "TMDB search failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(
                series_name,
                status = response.status().as_u16(),
                "TMDB returned an error status"
            );
            return None;
        }
        let body: SearchTvResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(series_name, error = %e, "Failed to decode TMDB response");
                return None;
            }
        };
        let first = body.results.into_iter().next()?;
        Some(first.id.to_string())
    }
}
