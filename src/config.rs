//! Command line and actor input.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::sheet::{SheetTarget, DEFAULT_HEADER_ROW};

/// Where an actor host leaves the run input.
pub const DEFAULT_INPUT: &str = "storage/key_value_stores/default/INPUT.json";
/// Seed used when the input names none.
pub const DEFAULT_START_URL: &str = "https://apify.com";

/// Page loading backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Fetch markup over HTTP; nothing is rendered.
    Http,
    /// Drive headless Chromium (requires the `chromium` feature).
    Chromium,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "catalog_crawler",
    about = "Crawl product listings and append product details to an xlsx import sheet"
)]
pub struct Cli {
    /// Actor input JSON with `start_urls` and `max_depth`
    #[arg(long, env = "CATALOG_INPUT", default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Workbook the products are appended to
    #[arg(long, env = "CATALOG_WORKBOOK", default_value = "./import_template.xlsx")]
    pub workbook: PathBuf,

    /// Row holding the column names
    #[arg(
        long,
        env = "CATALOG_HEADER_ROW",
        default_value_t = DEFAULT_HEADER_ROW,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub header_row: u32,

    /// How pages are loaded
    #[arg(long, env = "CATALOG_BACKEND", value_enum, default_value_t = Backend::Http)]
    pub backend: Backend,

    /// Also write the scraped products to this JSON file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Loads the actor input and assembles the run configuration.
    pub fn into_config(self) -> Result<RunConfig> {
        let input = ActorInput::load(&self.input)?;
        Ok(RunConfig {
            input,
            sheet: SheetTarget {
                path: self.workbook,
                header_row: self.header_row,
            },
            backend: self.backend,
            json_out: self.json,
        })
    }
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: ActorInput,
    pub sheet: SheetTarget,
    pub backend: Backend,
    pub json_out: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StartUrl {
    pub url: String,
}

/// Run input as an actor host stores it. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActorInput {
    pub start_urls: Vec<StartUrl>,
    /// Listing pages at this depth or deeper are not expanded.
    pub max_depth: u32,
    /// Chromium backend only.
    pub headless: bool,
}

impl Default for ActorInput {
    fn default() -> Self {
        Self {
            start_urls: vec![StartUrl {
                url: DEFAULT_START_URL.to_string(),
            }],
            max_depth: 1,
            headless: true,
        }
    }
}

impl ActorInput {
    /// Reads `path`; a missing file means default input.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw)
                .wrap_err_with(|| format!("Invalid actor input in {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No actor input; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).wrap_err_with(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Start URLs that parse; the others are logged and dropped.
    pub fn seed_urls(&self) -> Vec<Url> {
        self.start_urls
            .iter()
            .filter_map(|start| match Url::parse(&start.url) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(url = %start.url, "Ignoring start URL: {e}");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_actor_input() {
        let input = ActorInput::from_json(
            r#"{
                "start_urls": [
                    {"url": "https://shop.example.com/catalog/drills", "method": "GET"},
                    {"url": "not a url"}
                ],
                "max_depth": 3,
                "proxy": {"useApifyProxy": true}
            }"#,
        )
        .unwrap();

        assert_eq!(input.max_depth, 3);
        assert!(input.headless);
        let seeds: Vec<_> = input.seed_urls().into_iter().map(String::from).collect();
        assert_eq!(seeds, ["https://shop.example.com/catalog/drills"]);
    }

    #[test]
    fn empty_input_falls_back_to_defaults() {
        let input = ActorInput::from_json("{}").unwrap();
        assert_eq!(input, ActorInput::default());
        assert_eq!(input.seed_urls()[0].as_str(), "https://apify.com/");
    }

    #[test]
    fn missing_input_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let input = ActorInput::load(&dir.path().join("INPUT.json")).unwrap();
        assert_eq!(input, ActorInput::default());
    }

    #[test]
    fn malformed_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("INPUT.json");
        fs::write(&path, r#"{"max_depth": "deep"}"#).unwrap();
        assert!(ActorInput::load(&path).is_err());
    }

    #[test]
    fn cli_builds_run_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("INPUT.json");
        fs::write(&input, r#"{"max_depth": 2}"#).unwrap();

        let cli = Cli::try_parse_from([
            "catalog_crawler",
            "--input",
            input.to_str().unwrap(),
            "--workbook",
            "products.xlsx",
            "--header-row",
            "4",
            "--json",
            "out.json",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.input.max_depth, 2);
        assert_eq!(config.sheet.path, PathBuf::from("products.xlsx"));
        assert_eq!(config.sheet.header_row, 4);
        assert_eq!(config.backend, Backend::Http);
        assert_eq!(config.json_out, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn header_row_zero_is_rejected() {
        let parsed = Cli::try_parse_from(["catalog_crawler", "--header-row", "0"]);
        assert!(parsed.is_err());
    }
}
