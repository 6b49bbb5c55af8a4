//! Merged scraper settings resolution.
//!
//! Per-source overrides from the invocation payload take precedence over
//! addon-level values from the persistent settings store, which in turn take
//! precedence over hard defaults.

use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};

use crate::settings_store::SettingsStore;
use crate::source_settings::SourceOverrides;

/// Default TMDb API host used when no base override is configured.
pub const DEFAULT_TMDB_API_BASE: &str = "api.tmdb.org";
/// Default Trakt API host used when no base override is configured.
pub const DEFAULT_TRAKT_API_BASE: &str = "api.trakt.tv";

/// Domains that accept a DNS override, keyed by their setting id.
const DNS_SETTING_DOMAINS: [(&str, &str); 4] = [
    ("dns_tmdb_api", "api.tmdb.org"),
    ("dns_fanart_tv", "webservice.fanart.tv"),
    ("dns_imdb_www", "www.imdb.com"),
    ("dns_trakt_tv", "trakt.tv"),
];

/// Rating providers the host settings UI can select or append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingProvider {
    Tmdb,
    Imdb,
    Trakt,
}

impl RatingProvider {
    /// Parses a provider name case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tmdb" => Some(Self::Tmdb),
            "imdb" => Some(Self::Imdb),
            "trakt" => Some(Self::Trakt),
            _ => None,
        }
    }

    /// Lowercase provider identifier used in host-facing payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tmdb => "tmdb",
            Self::Imdb => "imdb",
            Self::Trakt => "trakt",
        }
    }
}

impl fmt::Display for RatingProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Effective scraper settings after merging source overrides with addon
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperSettings {
    pub keep_original_title: bool,
    pub cat_landscape: bool,
    pub studio_country: bool,
    pub enable_trailer: bool,
    /// Lowercased trailer-player preference.
    pub players_opt: String,
    pub verbose_log: bool,
    /// Lowercased certification country code.
    pub cert_country: String,
    pub save_tags: bool,
    pub lang_details: String,
    /// Image language; equals `lang_details` unless a separate image language
    /// is enabled.
    pub lang_images: String,
    /// Certification prefix; empty unless prefixing is enabled.
    pub cert_prefix: String,
    /// Ratings aggregation: primary provider first, then explicitly enabled
    /// extras, no duplicates.
    pub rating_types: Vec<RatingProvider>,
    pub fanarttv_enable: bool,
    pub fanarttv_client_key: String,
    /// API/proxy base overrides; empty string means "use the default host".
    pub tmdb_api_base_url: String,
    pub image_proxy_prefix: String,
    pub fanart_base_url: String,
    pub imdb_base_url: String,
    pub trakt_base_url: String,
    /// Domain-to-IP DNS overrides; empty entries are omitted.
    pub dns_overrides: HashMap<String, String>,
}

fn resolve_bool(override_value: Option<bool>, store: &dyn SettingsStore, id: &str) -> bool {
    override_value.unwrap_or_else(|| store.get_bool(id))
}

fn resolve_string(override_value: Option<&str>, store: &dyn SettingsStore, id: &str) -> String {
    match override_value {
        Some(override_value) => override_value.to_string(),
        None => store.get_string(id),
    }
}

fn build_rating_types(
    primary: RatingProvider,
    imdb_anyway: bool,
    trakt_anyway: bool,
    tmdb_anyway: bool,
) -> Vec<RatingProvider> {
    let mut rating_types = vec![primary];
    if imdb_anyway && primary != RatingProvider::Imdb {
        rating_types.push(RatingProvider::Imdb);
    }
    if trakt_anyway && primary != RatingProvider::Trakt {
        rating_types.push(RatingProvider::Trakt);
    }
    if tmdb_anyway && primary != RatingProvider::Tmdb {
        rating_types.push(RatingProvider::Tmdb);
    }
    rating_types
}

fn dns_override_from_source(overrides: &SourceOverrides, setting_id: &str) -> Option<String> {
    match setting_id {
        "dns_tmdb_api" => overrides.dns_tmdb_api.clone(),
        "dns_fanart_tv" => overrides.dns_fanart_tv.clone(),
        "dns_imdb_www" => overrides.dns_imdb_www.clone(),
        "dns_trakt_tv" => overrides.dns_trakt_tv.clone(),
        _ => None,
    }
}

fn build_dns_overrides(
    overrides: &SourceOverrides,
    store: &dyn SettingsStore,
) -> HashMap<String, String> {
    let mut dns_overrides = HashMap::new();
    for (setting_id, domain) in DNS_SETTING_DOMAINS {
        let configured = dns_override_from_source(overrides, setting_id)
            .unwrap_or_else(|| store.get_string(setting_id));
        let configured = configured.trim();
        if !configured.is_empty() {
            dns_overrides.insert(domain.to_string(), configured.to_string());
        }
    }
    dns_overrides
}

impl ScraperSettings {
    /// Resolves the effective settings from source overrides and the addon
    /// settings store.
    pub fn resolve(overrides: &SourceOverrides, store: &dyn SettingsStore) -> Self {
        let lang_details = resolve_string(overrides.lang_details.as_deref(), store, "languageDetails");
        let lang_images =
            if resolve_bool(overrides.use_different_lang_for_images, store, "usedifferentlangforimages") {
                resolve_string(overrides.lang_images.as_deref(), store, "languageImages")
            } else {
                lang_details.clone()
            };
        let cert_prefix = if resolve_bool(overrides.use_cert_prefix, store, "usecertprefix") {
            resolve_string(overrides.cert_prefix.as_deref(), store, "certprefix")
        } else {
            String::new()
        };

        let primary_name = resolve_string(overrides.primary_rating.as_deref(), store, "ratings")
            .to_ascii_lowercase();
        let primary = RatingProvider::parse(&primary_name).unwrap_or_else(|| {
            if !primary_name.is_empty() {
                warn!(
                    "Unrecognized primary rating provider '{}', falling back to tmdb",
                    primary_name
                );
            }
            RatingProvider::Tmdb
        });
        let rating_types = build_rating_types(
            primary,
            resolve_bool(overrides.imdb_anyway, store, "imdbanyway"),
            resolve_bool(overrides.trakt_anyway, store, "traktanyway"),
            resolve_bool(overrides.tmdb_anyway, store, "tmdbanyway"),
        );

        let settings = Self {
            keep_original_title: resolve_bool(
                overrides.keep_original_title,
                store,
                "keeporiginaltitle",
            ),
            cat_landscape: overrides.cat_landscape.unwrap_or(true),
            studio_country: overrides.studio_country.unwrap_or(false),
            enable_trailer: resolve_bool(overrides.enable_trailer, store, "enab_trailer"),
            players_opt: resolve_string(overrides.players_opt.as_deref(), store, "players_opt")
                .to_ascii_lowercase(),
            verbose_log: resolve_bool(overrides.verbose_log, store, "verboselog"),
            cert_country: resolve_string(overrides.cert_country.as_deref(), store, "tmdbcertcountry")
                .to_ascii_lowercase(),
            save_tags: resolve_bool(overrides.save_tags, store, "keywordsastags"),
            lang_details,
            lang_images,
            cert_prefix,
            rating_types,
            fanarttv_enable: resolve_bool(overrides.fanarttv_enable, store, "enable_fanarttv"),
            fanarttv_client_key: resolve_string(
                overrides.fanarttv_client_key.as_deref(),
                store,
                "fanarttv_clientkey",
            ),
            tmdb_api_base_url: resolve_string(
                overrides.tmdb_api_base_url.as_deref(),
                store,
                "tmdb_api_base_url",
            ),
            image_proxy_prefix: resolve_string(
                overrides.image_proxy_prefix.as_deref(),
                store,
                "image_proxy_prefix",
            ),
            fanart_base_url: resolve_string(
                overrides.fanart_base_url.as_deref(),
                store,
                "fanart_base_url",
            ),
            imdb_base_url: resolve_string(
                overrides.imdb_base_url.as_deref(),
                store,
                "imdb_base_url",
            ),
            trakt_base_url: resolve_string(
                overrides.trakt_base_url.as_deref(),
                store,
                "trakt_base_url",
            ),
            dns_overrides: build_dns_overrides(overrides, store),
        };
        debug!("Resolved scraper settings: {:?}", settings);
        settings
    }

    /// Effective TMDb API host.
    pub fn tmdb_api_base(&self) -> String {
        let base = self.tmdb_api_base_url.trim();
        if base.is_empty() {
            DEFAULT_TMDB_API_BASE.to_string()
        } else {
            base.to_string()
        }
    }

    /// Trakt show URL for an IMDb id, applying the base fallback and scheme
    /// normalization.
    pub fn trakt_show_url(&self, imdb_id: &str) -> String {
        let mut base = self.trakt_base_url.trim().to_string();
        if base.is_empty() {
            base = DEFAULT_TRAKT_API_BASE.to_string();
        }
        if !base.starts_with("http") {
            base = format!("https://{}", base);
        }
        format!("{}/shows/{}", base.trim_end_matches('/'), imdb_id)
    }
}
