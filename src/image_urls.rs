//! Image base-URL caching and proxy prefixing.
//!
//! The remote image configuration is fetched at most once every 30 days; the
//! resulting base URLs live in the settings store between runs. Both returned
//! roots are prefixed with the configured image proxy.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::warn;
use serde_json::Value;

use crate::api_client::ApiClient;
use crate::scraper_settings::ScraperSettings;
use crate::settings_store::SettingsStore;

const TMDB_API_KEY: &str = "af3a53eb387d57fc935e9128468b1899";

/// Upper bound on artwork entries kept per art category.
pub const MAX_IMAGES: usize = 200;
/// Proxy prefix used when neither source nor addon settings configure one.
pub const DEFAULT_IMAGE_PROXY_PREFIX: &str = "https://wsrv.nl/?url=";

const ORIGINAL_URL_KEY: &str = "originalUrl";
const PREVIEW_URL_KEY: &str = "previewUrl";
const LAST_UPDATED_KEY: &str = "lastUpdated";
const CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
const FULL_SIZE_PATH: &str = "original";
const PREVIEW_SIZE_PATH: &str = "w780";

/// Maps a fanart.tv art kind to the art category the host understands.
pub fn fanarttv_art_category(kind: &str) -> Option<&'static str> {
    match kind {
        "showbackground" => Some("backdrops"),
        "tvposter" => Some("posters"),
        "tvbanner" => Some("banner"),
        "hdtvlogo" | "clearlogo" => Some("clearlogo"),
        "hdclearart" | "clearart" => Some("clearart"),
        "tvthumb" => Some("landscape"),
        "characterart" => Some("characterart"),
        "seasonposter" => Some("seasonposters"),
        "seasonbanner" => Some("seasonbanner"),
        "seasonthumb" => Some("seasonlandscape"),
        _ => None,
    }
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

fn cache_is_stale(image_root: &str, preview_root: &str, last_updated: &str, now_secs: u64) -> bool {
    if image_root.is_empty() || preview_root.is_empty() || last_updated.is_empty() {
        return true;
    }
    match last_updated.parse::<f64>() {
        Ok(stamp) => stamp < now_secs.saturating_sub(CACHE_TTL.as_secs()) as f64,
        Err(_) => true,
    }
}

fn secure_base_url(configuration: &Value) -> Option<String> {
    configuration["images"]["secure_base_url"]
        .as_str()
        .map(str::to_string)
}

fn fetch_image_configuration(
    client: &ApiClient,
    settings: &ScraperSettings,
) -> Result<Value, String> {
    let url = format!("https://{}/3/configuration", settings.tmdb_api_base());
    client.get_json(&url, &[("api_key", TMDB_API_KEY)])
}

/// Effective image proxy prefix: resolved setting, else the built-in default.
pub fn resolve_image_proxy_prefix(settings: &ScraperSettings) -> String {
    let configured = settings.image_proxy_prefix.trim();
    if configured.is_empty() {
        DEFAULT_IMAGE_PROXY_PREFIX.to_string()
    } else {
        configured.to_string()
    }
}

/// Returns proxy-prefixed `(full_size_root, preview_root)` image URLs.
///
/// The cached configuration is refreshed when any cache key is missing or the
/// timestamp exceeds the TTL; a failed refresh keeps whatever cached values
/// exist.
pub fn load_base_urls(
    store: &mut dyn SettingsStore,
    settings: &ScraperSettings,
    client: &ApiClient,
) -> (String, String) {
    let mut image_root = store.get_string(ORIGINAL_URL_KEY);
    let mut preview_root = store.get_string(PREVIEW_URL_KEY);
    let last_updated = store.get_string(LAST_UPDATED_KEY);
    let now_secs = now_epoch_secs();

    if cache_is_stale(&image_root, &preview_root, &last_updated, now_secs) {
        match fetch_image_configuration(client, settings) {
            Ok(configuration) => {
                if let Some(base) = secure_base_url(&configuration) {
                    image_root = format!("{}{}", base, FULL_SIZE_PATH);
                    preview_root = format!("{}{}", base, PREVIEW_SIZE_PATH);
                    store.set_string(ORIGINAL_URL_KEY, &image_root);
                    store.set_string(PREVIEW_URL_KEY, &preview_root);
                    store.set_string(LAST_UPDATED_KEY, &now_secs.to_string());
                } else {
                    warn!("Image configuration response is missing images.secure_base_url");
                }
            }
            Err(error) => {
                warn!(
                    "Keeping cached image base URLs; configuration refresh failed: {}",
                    error
                );
            }
        }
    }

    let proxy = resolve_image_proxy_prefix(settings);
    (
        format!("{}{}", proxy, image_root),
        format!("{}{}", proxy, preview_root),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        cache_is_stale, fanarttv_art_category, resolve_image_proxy_prefix, secure_base_url,
        CACHE_TTL, DEFAULT_IMAGE_PROXY_PREFIX,
    };
    use crate::scraper_settings::ScraperSettings;
    use crate::settings_store::TomlSettingsStore;
    use crate::source_settings::SourceOverrides;

    const NOW_SECS: u64 = 1_756_000_000;

    #[test]
    fn test_cache_is_stale_when_any_key_is_missing() {
        assert!(cache_is_stale("", "preview", "123", NOW_SECS));
        assert!(cache_is_stale("full", "", "123", NOW_SECS));
        assert!(cache_is_stale("full", "preview", "", NOW_SECS));
    }

    #[test]
    fn test_cache_is_stale_after_ttl() {
        let fresh = (NOW_SECS - 60).to_string();
        assert!(!cache_is_stale("full", "preview", &fresh, NOW_SECS));

        let expired = (NOW_SECS - CACHE_TTL.as_secs() - 1).to_string();
        assert!(cache_is_stale("full", "preview", &expired, NOW_SECS));
    }

    #[test]
    fn test_cache_is_stale_accepts_fractional_timestamps() {
        // The host historically stored the timestamp as a float string.
        let fresh = format!("{}.5", NOW_SECS - 60);
        assert!(!cache_is_stale("full", "preview", &fresh, NOW_SECS));
        assert!(cache_is_stale("full", "preview", "not-a-number", NOW_SECS));
    }

    #[test]
    fn test_secure_base_url_extraction() {
        let configuration = json!({
            "images": { "secure_base_url": "https://image.tmdb.org/t/p/" }
        });
        assert_eq!(
            secure_base_url(&configuration).as_deref(),
            Some("https://image.tmdb.org/t/p/")
        );
        assert_eq!(secure_base_url(&json!({})), None);
    }

    #[test]
    fn test_proxy_prefix_resolution_precedence() {
        let settings =
            ScraperSettings::resolve(&SourceOverrides::default(), &TomlSettingsStore::default());
        assert_eq!(resolve_image_proxy_prefix(&settings), DEFAULT_IMAGE_PROXY_PREFIX);

        let store =
            TomlSettingsStore::from_toml_str("image_proxy_prefix = \"https://addon.proxy/?u=\"\n")
                .expect("settings text should parse");
        let settings = ScraperSettings::resolve(&SourceOverrides::default(), &store);
        assert_eq!(resolve_image_proxy_prefix(&settings), "https://addon.proxy/?u=");

        let overrides = SourceOverrides {
            image_proxy_prefix: Some("https://source.proxy/?u=".to_string()),
            ..SourceOverrides::default()
        };
        let settings = ScraperSettings::resolve(&overrides, &store);
        assert_eq!(resolve_image_proxy_prefix(&settings), "https://source.proxy/?u=");
    }

    #[test]
    fn test_fanarttv_art_category_mapping() {
        assert_eq!(fanarttv_art_category("showbackground"), Some("backdrops"));
        assert_eq!(fanarttv_art_category("hdtvlogo"), Some("clearlogo"));
        assert_eq!(fanarttv_art_category("clearlogo"), Some("clearlogo"));
        assert_eq!(fanarttv_art_category("seasonthumb"), Some("seasonlandscape"));
        assert_eq!(fanarttv_art_category("musiclogo"), None);
    }
}
