use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::feed::document::FeedDocument;
use crate::feed::parser::{parse_document, ParseError};

/// Sent as the `User-Agent` header on every feed request.
pub const USER_AGENT: &str = "gator";

/// Same as reqwest's blocking client default.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How often an in-flight fetch looks at its cancel token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to send request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("response failed with status code: {0}")]
    Status(u16),

    #[error("fetch worker stopped without a response")]
    WorkerLost,

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Shared flag a caller flips to abandon in-flight fetches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bounds a single fetch: how long it may take and whether the caller
/// still wants the result. A cancel is noticed within
/// `CANCEL_POLL_INTERVAL`, even while the request is in flight; the
/// abandoned request runs on until its timeout.
#[derive(Debug, Clone)]
pub struct FetchContext {
    timeout: Duration,
    cancel: CancelToken,
}

impl FetchContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait FeedFetcher: Send + Sync {
    /// Retrieve and parse the feed at `url`. Has no side effects, so a
    /// failed fetch can simply be tried again later.
    fn fetch(&self, url: &str, ctx: &FetchContext) -> Result<FeedDocument, FetchError>;
}

pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn request_error(err: reqwest::Error, timeout: Duration) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Request(err)
        }
    }

    fn download(client: &Client, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let response = client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| Self::request_error(e, timeout))?;

        let status = response.status().as_u16();
        if status >= 300 {
            return Err(FetchError::Status(status));
        }

        let body = response
            .bytes()
            .map_err(|e| Self::request_error(e, timeout))?;
        Ok(body.to_vec())
    }
}

impl Default for HttpFeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch(&self, url: &str, ctx: &FetchContext) -> Result<FeedDocument, FetchError> {
        if ctx.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let (tx, rx) = mpsc::channel();
        let client = self.client.clone();
        let target = url.to_string();
        let timeout = ctx.timeout();
        thread::spawn(move || {
            // The receiver is gone if the fetch was cancelled meanwhile.
            let _ = tx.send(Self::download(&client, &target, timeout));
        });

        let body = loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => break result?,
                Err(RecvTimeoutError::Timeout) if ctx.is_cancelled() => {
                    return Err(FetchError::Cancelled);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(FetchError::WorkerLost),
            }
        };

        if ctx.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        Ok(parse_document(&body)?)
    }
}
