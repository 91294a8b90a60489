pub mod dates;
pub mod document;
pub mod fetcher;
pub mod parser;

pub use dates::{normalize_date, DateFormat, DateParseError, DATE_FORMATS};
pub use document::{FeedDocument, FeedItem};
pub use fetcher::{
    CancelToken, FeedFetcher, FetchContext, FetchError, HttpFeedFetcher, DEFAULT_FETCH_TIMEOUT,
    USER_AGENT,
};
pub use parser::{parse_document, ParseError};
