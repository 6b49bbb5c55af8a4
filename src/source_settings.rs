//! Call-scoped source override payload parsing.
//!
//! The host passes a second process argument containing a URL-encoded query
//! string; its `pathSettings` parameter carries a JSON object of per-source
//! setting overrides. Any parse failure degrades to the empty override set so
//! resolution falls through to addon-level defaults.

use log::{debug, warn};

/// Query parameter that carries the JSON override payload.
pub const PATH_SETTINGS_PARAM: &str = "pathSettings";

/// Per-source setting overrides decoded from the invocation argument.
///
/// Field names follow Rust conventions; serde renames map them back to the
/// wire keys the host emits. Absent keys mean "no override".
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct SourceOverrides {
    #[serde(rename = "keeporiginaltitle")]
    pub keep_original_title: Option<bool>,
    pub cat_landscape: Option<bool>,
    pub studio_country: Option<bool>,
    #[serde(rename = "enab_trailer")]
    pub enable_trailer: Option<bool>,
    pub players_opt: Option<String>,
    #[serde(rename = "verboselog")]
    pub verbose_log: Option<bool>,
    #[serde(rename = "tmdbcertcountry")]
    pub cert_country: Option<String>,
    #[serde(rename = "keywordsastags")]
    pub save_tags: Option<bool>,
    #[serde(rename = "languageDetails")]
    pub lang_details: Option<String>,
    #[serde(rename = "usedifferentlangforimages")]
    pub use_different_lang_for_images: Option<bool>,
    #[serde(rename = "languageImages")]
    pub lang_images: Option<String>,
    #[serde(rename = "usecertprefix")]
    pub use_cert_prefix: Option<bool>,
    #[serde(rename = "certprefix")]
    pub cert_prefix: Option<String>,
    #[serde(rename = "ratings")]
    pub primary_rating: Option<String>,
    #[serde(rename = "imdbanyway")]
    pub imdb_anyway: Option<bool>,
    #[serde(rename = "traktanyway")]
    pub trakt_anyway: Option<bool>,
    #[serde(rename = "tmdbanyway")]
    pub tmdb_anyway: Option<bool>,
    #[serde(rename = "enable_fanarttv")]
    pub fanarttv_enable: Option<bool>,
    #[serde(rename = "fanarttv_clientkey")]
    pub fanarttv_client_key: Option<String>,
    pub tmdb_api_base_url: Option<String>,
    pub image_proxy_prefix: Option<String>,
    pub fanart_base_url: Option<String>,
    pub imdb_base_url: Option<String>,
    pub trakt_base_url: Option<String>,
    pub dns_tmdb_api: Option<String>,
    pub dns_fanart_tv: Option<String>,
    pub dns_imdb_www: Option<String>,
    pub dns_trakt_tv: Option<String>,
}

fn path_settings_payload(raw: &str) -> Option<String> {
    let query = raw.trim().trim_start_matches('?');
    for key_value in query.split('&') {
        let Some((key, encoded)) = key_value.split_once('=') else {
            continue;
        };
        if key != PATH_SETTINGS_PARAM {
            continue;
        }
        // Query-string encoding uses '+' for spaces; literal plus arrives as %2B.
        let spaced = encoded.replace('+', " ");
        match urlencoding::decode(&spaced) {
            Ok(decoded) => return Some(decoded.into_owned()),
            Err(error) => {
                warn!("Ignoring undecodable {} parameter: {}", PATH_SETTINGS_PARAM, error);
                return None;
            }
        }
    }
    None
}

impl SourceOverrides {
    /// Parses overrides from the raw invocation argument.
    pub fn from_invocation_arg(raw: &str) -> Self {
        let Some(payload) = path_settings_payload(raw) else {
            debug!("No {} payload in invocation argument", PATH_SETTINGS_PARAM);
            return Self::default();
        };
        match serde_json::from_str::<Self>(&payload) {
            Ok(overrides) => {
                debug!("Decoded source overrides: {:?}", overrides);
                overrides
            }
            Err(error) => {
                warn!("Ignoring malformed source settings payload: {}", error);
                Self::default()
            }
        }
    }

    /// Reads the override payload from the second process argument.
    pub fn from_process_args() -> Self {
        match std::env::args().nth(2) {
            Some(raw) => Self::from_invocation_arg(&raw),
            None => {
                debug!("No source settings argument supplied");
                Self::default()
            }
        }
    }
}
