//! SEC EDGAR access: rate-limited fetching, filing lookup and N-PORT parsing

pub mod fetcher;
pub mod locator;
pub mod nport;
pub mod xml;

pub use fetcher::{FetchError, SecFetcher, UserAgent};
pub use locator::FilingLocator;
pub use nport::{Extraction, extract_holdings};
