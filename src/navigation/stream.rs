//! Per-stream fetch state with stale-response protection.
//!
//! Each request is tagged with a sequence number from its stream. Only the
//! response carrying the most recently issued tag is applied; anything older
//! is dropped on arrival. Nothing is cancelled at the transport.

use std::fmt;

use tracing::debug;

/// Identifies one issued request within its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTag(u64);

impl RequestTag {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of one fetch stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStatus<T> {
    Idle,
    Loading,
    Loaded(T),
    /// User-visible message
    Error(String),
}

/// One independently fetched slice of dashboard state.
#[derive(Debug, Clone)]
pub struct FetchStream<T> {
    name: &'static str,
    status: StreamStatus<T>,
    issued: u64,
    pending: Option<RequestTag>,
}

impl<T> FetchStream<T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            status: StreamStatus::Idle,
            issued: 0,
            pending: None,
        }
    }

    /// Start a new request, superseding any in flight.
    ///
    /// Previously loaded data is dropped while the new request is pending.
    pub fn begin(&mut self) -> RequestTag {
        self.issued += 1;
        let tag = RequestTag(self.issued);
        if let Some(old) = self.pending.replace(tag) {
            debug!(stream = self.name, %old, new = %tag, "superseding in-flight request");
        }
        self.status = StreamStatus::Loading;
        tag
    }

    /// Whether `tag` is the request this stream is waiting on.
    #[must_use]
    pub fn is_current(&self, tag: RequestTag) -> bool {
        self.pending == Some(tag)
    }

    /// Apply a response. Returns `false` (and changes nothing) when the
    /// response is for a superseded or already-settled request.
    pub fn resolve(&mut self, tag: RequestTag, result: std::result::Result<T, String>) -> bool {
        if !self.is_current(tag) {
            debug!(stream = self.name, %tag, "discarding stale response");
            return false;
        }
        self.pending = None;
        self.status = match result {
            Ok(data) => StreamStatus::Loaded(data),
            Err(message) => StreamStatus::Error(message),
        };
        true
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn status(&self) -> &StreamStatus<T> {
        &self.status
    }

    /// Loaded data, if the stream is in `Loaded`.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match &self.status {
            StreamStatus::Loaded(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, StreamStatus::Loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            StreamStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}
