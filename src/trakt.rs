//! Trakt ratings lookup.

use log::warn;
use serde_json::{json, Value};

use crate::api_client::ApiClient;
use crate::scraper_settings::ScraperSettings;

const TRAKT_API_KEY: &str = "90901c6be3b2de5a4fa0edf9ab5c75e9a5a0fef2b4ee7373d8b63dcf61f95697";
const USER_AGENT: &str = "Kodi TV Show scraper by Team Kodi; contact pkscout@kodi.tv";

/// A single Trakt rating with its vote count.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct TraktRating {
    pub rating: f64,
    pub votes: u64,
}

fn trakt_headers() -> Vec<(String, String)> {
    vec![
        ("User-Agent".to_string(), USER_AGENT.to_string()),
        ("Accept".to_string(), "application/json".to_string()),
        ("trakt-api-key".to_string(), TRAKT_API_KEY.to_string()),
        ("trakt-api-version".to_string(), "2".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]
}

/// Request target for a ratings lookup: episode endpoint when both season and
/// episode are given, otherwise the full show record.
fn ratings_request(
    settings: &ScraperSettings,
    imdb_id: &str,
    season: Option<u32>,
    episode: Option<u32>,
) -> (String, Vec<(&'static str, &'static str)>) {
    let show_url = settings.trakt_show_url(imdb_id);
    match (season, episode) {
        (Some(season), Some(episode)) => (
            format!("{}/seasons/{}/episodes/{}/ratings", show_url, season, episode),
            Vec::new(),
        ),
        _ => (show_url, vec![("extended", "full")]),
    }
}

fn rating_from_response(response: &Value) -> Option<TraktRating> {
    let rating = response["rating"].as_f64()?;
    let votes = response["votes"].as_u64()?;
    if rating == 0.0 || votes == 0 {
        return None;
    }
    Some(TraktRating { rating, votes })
}

/// Fetches the Trakt rating for a show, or for one episode when both season
/// and episode are supplied. Failures degrade to `None`; the host treats
/// ratings as optional enrichment.
pub fn fetch_ratings(
    client: &mut ApiClient,
    settings: &ScraperSettings,
    imdb_id: &str,
    season: Option<u32>,
    episode: Option<u32>,
) -> Option<TraktRating> {
    let (url, params) = ratings_request(settings, imdb_id, season, episode);
    let previous_headers = client.set_headers(trakt_headers());
    let response = client.get_json(&url, &params);
    client.set_headers(previous_headers);
    match response {
        Ok(payload) => rating_from_response(&payload),
        Err(error) => {
            warn!("Trakt ratings lookup for {} failed: {}", imdb_id, error);
            None
        }
    }
}

/// Renders the host-facing ratings aggregation payload.
pub fn ratings_payload(rating: &TraktRating) -> Value {
    json!({
        "ratings": {
            "trakt": { "rating": rating.rating, "votes": rating.votes }
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{rating_from_response, ratings_payload, ratings_request, TraktRating};
    use crate::scraper_settings::ScraperSettings;
    use crate::settings_store::TomlSettingsStore;
    use crate::source_settings::SourceOverrides;

    fn default_settings() -> ScraperSettings {
        ScraperSettings::resolve(&SourceOverrides::default(), &TomlSettingsStore::default())
    }

    #[test]
    fn test_show_request_uses_extended_full() {
        let (url, params) = ratings_request(&default_settings(), "tt0903747", None, None);
        assert_eq!(url, "https://api.trakt.tv/shows/tt0903747");
        assert_eq!(params, vec![("extended", "full")]);
    }

    #[test]
    fn test_episode_request_targets_ratings_endpoint() {
        let (url, params) = ratings_request(&default_settings(), "tt0903747", Some(2), Some(5));
        assert_eq!(
            url,
            "https://api.trakt.tv/shows/tt0903747/seasons/2/episodes/5/ratings"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_season_without_episode_falls_back_to_show_request() {
        let (url, params) = ratings_request(&default_settings(), "tt0903747", Some(2), None);
        assert_eq!(url, "https://api.trakt.tv/shows/tt0903747");
        assert_eq!(params, vec![("extended", "full")]);
    }

    #[test]
    fn test_rating_requires_both_rating_and_votes() {
        let payload = json!({ "rating": 8.7, "votes": 1234 });
        assert_eq!(
            rating_from_response(&payload),
            Some(TraktRating {
                rating: 8.7,
                votes: 1234
            })
        );

        assert_eq!(rating_from_response(&json!({ "rating": 8.7 })), None);
        assert_eq!(rating_from_response(&json!({ "votes": 1234 })), None);
        assert_eq!(
            rating_from_response(&json!({ "rating": 0.0, "votes": 1234 })),
            None
        );
        assert_eq!(
            rating_from_response(&json!({ "rating": 8.7, "votes": 0 })),
            None
        );
    }

    #[test]
    fn test_ratings_payload_shape() {
        let payload = ratings_payload(&TraktRating {
            rating: 8.7,
            votes: 1234,
        });
        assert_eq!(payload["ratings"]["trakt"]["rating"], 8.7);
        assert_eq!(payload["ratings"]["trakt"]["votes"], 1234);
    }
}
