use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct MdblistResponse {
    #[serde(default)]
    ratings: Vec<MdblistRating>,
}

#[derive(Debug, Deserialize)]
struct MdblistRating {
    source: Option<String>,
    value: Option<serde_json::Value>,
}

/// Ratings lookup keyed by TMDB id.
pub struct MdblistClient {
    client: Client,
    api_key: String,
}

impl MdblistClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Formatted "- Source: value" lines for a movie or show, or `None` when
    /// nothing useful came back. `media_type` is "movie" or "show".
    pub async fn ratings(&self, media_type: &str, tmdb_id: &str) -> Option<String> {
        let url = format!(
            "https://api.mdblist.com/tmdb/{}/{}?apikey={}",
            media_type, tmdb_id, self.api_key
        );
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(media_type, tmdb_id, error = %e, "MDBList request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(
                media_type,
                tmdb_id,
                status = response.status().as_u16(),
                "MDBList returned an error status"
            );
            return None;
        }
        let body: MdblistResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(media_type, tmdb_id, error = %e, "Failed to decode MDBList response");
                return None;
            }
        };

        let lines: Vec<String> = body
            .ratings
            .iter()
            .filter_map(|r| {
                let source = r.source.as_deref()?;
                let value = r.value.as_ref()?;
                if value.is_null() {
                    return None;
                }
                Some(format!("- {}: {}", source, render_value(value)))
            })
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_value_strips_string_quotes() {
        assert_eq!(render_value(&serde_json::json!("84%")), "84%");
        assert_eq!(render_value(&serde_json::json!(7.8)), "7.8");
    }
}
