//! Settings resolution and metadata-lookup helper for a TV-show scraper addon.
//!
//! Merges call-scoped source overrides with addon-level defaults from the
//! persistent settings store, derives proxy-prefixed image base URLs and DNS
//! override maps, builds the ratings-aggregation provider list, and performs
//! the Trakt ratings lookup.

pub mod api_client;
pub mod image_urls;
pub mod scraper_settings;
pub mod settings_store;
pub mod source_settings;
pub mod trakt;

pub use api_client::ApiClient;
pub use scraper_settings::{RatingProvider, ScraperSettings};
pub use settings_store::{SettingsStore, TomlSettingsStore};
pub use source_settings::SourceOverrides;
pub use trakt::TraktRating;
