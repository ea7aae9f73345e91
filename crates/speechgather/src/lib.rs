pub mod client;
pub mod fallback;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod truncation;
pub mod types;

pub use client::{ClientError, RecordClient};
pub use fallback::{FullTextFetcher, FullTextSource};
pub use pipeline::{Reconciler, SpeechGatherer};

pub(crate) const API_URL: &str = "https://www.openaustralia.org.au/api";
pub(crate) const BASE_URL: &str = "https://www.openaustralia.org.au";
pub(crate) const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub const UNAVAILABLE_SPEECH: &str = "Unable to retrieve full speech.";

pub const UNAVAILABLE_URL: &str = "No URL available";

pub(crate) fn build_http_client(
    timeout: std::time::Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}
