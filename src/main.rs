// src/main.rs
// =============================================================================
// Entry point of the omni-crawler CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the settings file and start logging
// 3. Build the HTTP transport (direct or through the SOCKS proxy)
// 4. Dispatch to the crawl or scrape handler
// 5. Save the results and exit with a proper code
//    (0 = success, 1 = error, 2 = nothing to crawl)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod error;
mod extract;
mod output;
mod scrape;
mod telemetry;
mod transport;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, CommonArgs};
use config::Settings;
use crawl::{Engine, Fetcher, UrlFilter};
use output::OutputHandler;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use transport::ReqwestTransport;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("[-] Failed: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    telemetry::init_logging(&settings.logging.level);

    match cli.command {
        Commands::Crawl {
            seeds,
            max_depth,
            max_pages,
            concurrency,
            scope_suffix,
            common,
        } => {
            let overrides = CrawlOverrides {
                max_depth,
                max_pages,
                concurrency,
                scope_suffix,
            };
            handle_crawl(&settings, seeds, overrides, &common).await
        }
        Commands::Scrape {
            urls,
            save_html,
            common,
        } => handle_scrape(&settings, &urls, save_html, &common).await,
    }
}

struct CrawlOverrides {
    max_depth: Option<usize>,
    max_pages: Option<usize>,
    concurrency: Option<usize>,
    scope_suffix: Option<String>,
}

async fn handle_crawl(
    settings: &Settings,
    seeds: Vec<String>,
    overrides: CrawlOverrides,
    common: &CommonArgs,
) -> Result<i32> {
    let seeds = if seeds.is_empty() {
        settings.crawler.seeds.clone()
    } else {
        seeds
    };
    if seeds.is_empty() {
        println!("No seeds. Example: omni-crawler crawl http://example.onion");
        return Ok(2);
    }

    let mut config = settings.crawl_config();
    common.apply(&mut config);
    if let Some(depth) = overrides.max_depth {
        config.max_depth = depth;
    }
    if let Some(pages) = overrides.max_pages {
        config.max_pages = pages;
    }
    if let Some(workers) = overrides.concurrency {
        config.concurrency = workers;
    }
    if let Some(suffix) = overrides.scope_suffix {
        config.scope_suffix = suffix;
    }

    println!("[+] Crawling seeds: {:?}", seeds);
    println!(
        "    depth <= {}, pages <= {}, workers = {}, proxy = {}",
        config.max_depth,
        config.max_pages,
        config.concurrency,
        if config.use_proxy {
            config.proxy_url()
        } else {
            "off".to_string()
        }
    );

    let transport = Arc::new(ReqwestTransport::new(&config).context("building HTTP transport")?);
    let engine = Engine::new(config, transport)
        .context("starting crawl engine")?
        .with_cancellation(cancel_on_interrupt());

    let pages = engine.run(&seeds).await;
    println!("[+] Crawled {} page(s)", pages.len());

    let output = OutputHandler::new(common.output_format(settings), common.output_dir(settings));
    let path = output
        .save("crawl_results", &pages)
        .context("saving crawl results")?;
    println!("[+] Saved to {}", path.display());

    Ok(0)
}

async fn handle_scrape(
    settings: &Settings,
    urls: &[String],
    save_html: bool,
    common: &CommonArgs,
) -> Result<i32> {
    let mut config = settings.crawl_config();
    common.apply(&mut config);

    println!("[+] Scraping {} URL(s)", urls.len());

    let transport = Arc::new(ReqwestTransport::new(&config).context("building HTTP transport")?);
    let fetcher = Fetcher::new(transport, &config);
    let filter = UrlFilter::new(&config.scope_suffix);

    let output_dir = common.output_dir(settings);
    let html_dir: Option<PathBuf> = save_html.then(|| output_dir.join("html"));

    let reports = scrape::scrape_all(
        &fetcher,
        &filter,
        urls,
        html_dir.as_deref(),
        config.concurrency,
        &cancel_on_interrupt(),
    )
    .await;

    for report in &reports {
        match &report.error {
            None => println!(
                "    {} -> {} email(s), {} link(s)",
                report.url,
                report.emails.len(),
                report.links.len()
            ),
            Some(e) => println!("    {} -> {}", report.url, e),
        }
    }

    let output = OutputHandler::new(common.output_format(settings), output_dir);
    let path = output
        .save("scrape_results", &reports)
        .context("saving scrape results")?;
    println!("[+] Saved to {}", path.display());

    Ok(0)
}

/// A token cancelled on Ctrl-C. The command stops early but still saves
/// what it gathered.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping");
            cancel.cancel();
        }
    });
    token
}
