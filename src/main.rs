use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use catalog_crawler::browser::Browser;
use catalog_crawler::config::{Backend, Cli, RunConfig};
use catalog_crawler::{logging, CrawlReport, Crawler, HttpBrowser, ProductRecord, Workbook};
use clap::Parser;
use eyre::{Result, WrapErr};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;
    let config = cli.into_config()?;

    let mut workbook = Workbook::open(config.sheet.clone())?;

    let report = match config.backend {
        Backend::Http => crawl(HttpBrowser::new()?, &config).await?,
        Backend::Chromium => crawl_chromium(&config).await?,
    };

    if let Some(path) = &config.json_out {
        export_json(path, &report.records)?;
    }

    workbook.append(&report.records)?;
    workbook.save()?;
    info!(path = %config.sheet.path.display(), "Data successfully appended");
    Ok(())
}

async fn crawl<B: Browser>(browser: B, config: &RunConfig) -> Result<CrawlReport> {
    let mut crawler = Crawler::new(browser, config.input.max_depth);
    crawler.seed(config.input.seed_urls());
    crawler.run().await
}

#[cfg(feature = "chromium")]
async fn crawl_chromium(config: &RunConfig) -> Result<CrawlReport> {
    info!("Launching Chromium...");
    let browser = catalog_crawler::ChromiumBrowser::launch(config.input.headless).await?;
    crawl(browser, config).await
}

#[cfg(not(feature = "chromium"))]
async fn crawl_chromium(_config: &RunConfig) -> Result<CrawlReport> {
    eyre::bail!("Built without the `chromium` feature; use `--backend http`")
}

fn export_json(path: &Path, records: &[ProductRecord]) -> Result<()> {
    let file =
        File::create(path).wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    info!(path = %path.display(), count = records.len(), "Records exported");
    Ok(())
}
