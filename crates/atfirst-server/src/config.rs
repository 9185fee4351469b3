use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use url::Url;

/// Server configuration. Every flag can also be set through the environment
/// (a `.env` file is loaded first).
#[derive(Debug, Clone, Parser)]
#[command(name = "atfirst")]
#[command(about = "Show the oldest records of an AT Protocol repository as a web page")]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "ATFIRST_LISTEN_ADDR", default_value = "0.0.0.0:8787")]
    pub listen_addr: SocketAddr,

    /// Appview used for handle resolution and post hydration
    #[arg(long, env = "ATFIRST_APPVIEW_URL", default_value = "https://public.api.bsky.app")]
    pub appview_url: Url,

    /// PLC directory used to resolve did:plc documents
    #[arg(long, env = "ATFIRST_PLC_URL", default_value = "https://plc.directory")]
    pub plc_url: Url,

    /// Number of records shown per feed
    #[arg(
        long,
        env = "ATFIRST_RECORD_LIMIT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub record_limit: u32,

    /// Feed cache time-to-live in seconds; 0 disables the cache
    #[arg(long, env = "ATFIRST_CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached feeds
    #[arg(long, env = "ATFIRST_CACHE_CAPACITY", default_value_t = 1000)]
    pub cache_capacity: u64,
}

impl Config {
    /// `None` when caching is disabled.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}
