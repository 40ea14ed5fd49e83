// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: follow links outward from one or more seed URLs
// - scrape: fetch specific pages only, no link following
//
// Every crawl knob is optional here. Anything left unset falls back to the
// settings file, and from there to the built-in defaults (see config.rs).
// Flags can also be given as OMNI_* environment variables.
// =============================================================================

use crate::config::{CrawlConfig, Settings};
use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "omni-crawler",
    version,
    about = "Crawl and scrape .onion sites through a SOCKS proxy",
    long_about = "omni-crawler follows links between hidden-service pages, collecting emails \
                  and text snippets, with bounded depth, page count and concurrency."
)]
pub struct Cli {
    /// YAML settings file (default: config/default.yaml if present)
    #[arg(long, global = true, env = "OMNI_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl outward from seed URLs
    ///
    /// Example: omni-crawler crawl http://example.onion -d 2 -m 50
    Crawl {
        /// Seed URLs (default: crawler.seeds from the settings file)
        seeds: Vec<String>,

        /// Maximum link depth from a seed
        #[arg(short = 'd', long, env = "OMNI_MAX_DEPTH")]
        max_depth: Option<usize>,

        /// Maximum number of pages to visit
        #[arg(short = 'm', long, env = "OMNI_MAX_PAGES")]
        max_pages: Option<usize>,

        /// Number of concurrent workers
        #[arg(short = 'c', long, env = "OMNI_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Only follow links whose host ends with this suffix
        #[arg(long, env = "OMNI_SCOPE_SUFFIX")]
        scope_suffix: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Scrape pages without following links
    ///
    /// Example: omni-crawler scrape http://example.onion --save-html
    Scrape {
        /// URLs to scrape
        #[arg(required = true)]
        urls: Vec<String>,

        /// Also save each page's raw HTML next to the results
        #[arg(short = 's', long)]
        save_html: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Options shared by both subcommands
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Connect directly instead of through the SOCKS proxy
    #[arg(long, env = "OMNI_NO_PROXY")]
    pub no_proxy: bool,

    /// SOCKS proxy port (Tor listens on 9050 by default)
    #[arg(long, env = "OMNI_PROXY_PORT")]
    pub proxy_port: Option<u16>,

    /// Per-request timeout in seconds
    #[arg(long, env = "OMNI_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Delay after each request, in milliseconds
    #[arg(long, env = "OMNI_DELAY_MS")]
    pub delay_ms: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long, env = "OMNI_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Output file format
    #[arg(long, value_enum, env = "OMNI_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Directory results are written to
    #[arg(long, env = "OMNI_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
}

impl CommonArgs {
    /// Applies the transport-related overrides to a config
    pub fn apply(&self, config: &mut CrawlConfig) {
        if self.no_proxy {
            config.use_proxy = false;
        }
        if let Some(port) = self.proxy_port {
            config.proxy_port = port;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.delay_ms {
            config.request_delay = Duration::from_millis(ms);
        }
        if let Some(agent) = &self.user_agent {
            config.user_agent = agent.clone();
        }
    }

    pub fn output_format(&self, settings: &Settings) -> OutputFormat {
        self.format.unwrap_or(settings.output.format)
    }

    pub fn output_dir(&self, settings: &Settings) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| settings.output.directory.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crawl() {
        let cli = Cli::try_parse_from([
            "omni-crawler",
            "crawl",
            "http://a.onion",
            "http://b.onion",
            "-d",
            "2",
            "-m",
            "50",
            "-c",
            "8",
            "--no-proxy",
            "--format",
            "csv",
        ])
        .unwrap();

        match cli.command {
            Commands::Crawl {
                seeds,
                max_depth,
                max_pages,
                concurrency,
                common,
                ..
            } => {
                assert_eq!(seeds, vec!["http://a.onion", "http://b.onion"]);
                assert_eq!(max_depth, Some(2));
                assert_eq!(max_pages, Some(50));
                assert_eq!(concurrency, Some(8));
                assert!(common.no_proxy);
                assert_eq!(common.format, Some(OutputFormat::Csv));
            }
            other => panic!("expected crawl, got {:?}", other),
        }
    }

    #[test]
    fn test_crawl_without_seeds_parses() {
        let cli = Cli::try_parse_from(["omni-crawler", "crawl"]).unwrap();
        assert!(matches!(cli.command, Commands::Crawl { ref seeds, .. } if seeds.is_empty()));
    }

    #[test]
    fn test_scrape_requires_url() {
        assert!(Cli::try_parse_from(["omni-crawler", "scrape"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from([
            "omni-crawler",
            "scrape",
            "http://a.onion",
            "--config",
            "custom.yaml",
            "-s",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        assert!(matches!(cli.command, Commands::Scrape { save_html: true, .. }));
    }

    #[test]
    fn test_common_args_override_config() {
        let cli = Cli::try_parse_from([
            "omni-crawler",
            "scrape",
            "http://a.onion",
            "--proxy-port",
            "9150",
            "--timeout-secs",
            "5",
            "--delay-ms",
            "250",
            "--user-agent",
            "Custom/1.0",
        ])
        .unwrap();
        let Commands::Scrape { common, .. } = cli.command else {
            panic!("expected scrape");
        };

        let mut config = CrawlConfig::default();
        common.apply(&mut config);

        assert!(config.use_proxy);
        assert_eq!(config.proxy_port, 9150);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.request_delay, Duration::from_millis(250));
        assert_eq!(config.user_agent, "Custom/1.0");
    }
}
