//! Content fetchers: web pages and uploaded documents to bounded plain text.
//!
//! Both fetchers produce [`FetchedContent`](chathub_core::FetchedContent)
//! no longer than the configured character budget. The URL fetcher reports
//! failures as `FetchError`; the file fetcher reports them inline.

pub mod file;
pub mod html;
pub mod url;

pub use file::FileFetcher;
pub use html::html_to_text;
pub use url::UrlFetcher;
