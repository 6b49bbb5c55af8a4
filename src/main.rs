//! Diagnostic CLI: resolves scraper settings the way the host addon would and
//! optionally performs the Trakt ratings lookup.

use std::path::Path;
use std::process::ExitCode;

use log::{error, info};
use showscraper::{
    image_urls, trakt, ApiClient, ScraperSettings, SourceOverrides, TomlSettingsStore,
};

const USAGE: &str =
    "usage: showscraper <settings.toml> [invocation-arg] [imdb-id [season episode]]";

fn parse_index(raw: &str, label: &str) -> Result<u32, String> {
    raw.parse::<u32>()
        .map_err(|error| format!("invalid {}: {} ({})", label, raw, error))
}

fn run() -> Result<(), String> {
    let mut args = std::env::args().skip(1);
    let settings_path = args.next().ok_or_else(|| USAGE.to_string())?;
    let invocation_arg = args.next().unwrap_or_default();
    let imdb_id = args.next();
    let season = args.next();
    let episode = args.next();

    let settings_path = Path::new(&settings_path);
    let mut store = TomlSettingsStore::load(settings_path);
    let overrides = SourceOverrides::from_invocation_arg(&invocation_arg);
    let settings = ScraperSettings::resolve(&overrides, &store);
    println!("{:#?}", settings);

    let mut client = ApiClient::new(&settings.dns_overrides, settings.verbose_log);
    let (full_size_root, preview_root) = image_urls::load_base_urls(&mut store, &settings, &client);
    println!(
        "image roots:\n  full:    {}\n  preview: {}",
        full_size_root, preview_root
    );

    if let Some(imdb_id) = imdb_id {
        let season = season
            .map(|raw| parse_index(&raw, "season"))
            .transpose()?;
        let episode = episode
            .map(|raw| parse_index(&raw, "episode"))
            .transpose()?;
        match trakt::fetch_ratings(&mut client, &settings, &imdb_id, season, episode) {
            Some(rating) => println!("{}", trakt::ratings_payload(&rating)),
            None => info!("No Trakt rating available for {}", imdb_id),
        }
    }

    store.persist(settings_path)
}

fn main() -> ExitCode {
    colog::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}
