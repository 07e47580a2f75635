use std::collections::VecDeque;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::veridian_api::types::{extract_status_message, ApiError, PageInfo, ResponseStatus};

/// Default caller-side record cap for fixed-limit list calls.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Largest page size the server accepts. A caller limit above this is
/// enforced purely client-side and the `limit` query parameter is not
/// forwarded.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Envelope shape of every paginated list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct PageEnvelope<T> {
    #[serde(default)]
    pub status: Option<ResponseStatus>,
    #[serde(default)]
    pub pagination: Option<PageInfo>,
    pub data: Vec<T>,
}

/// Lazy, forward-only sequence over a cursor-paginated list endpoint.
///
/// A cursor fetches page N+1 only once the consumer has drained page N,
/// decodes each page's `data` array into records in server order, and
/// chains pages through the opaque `pagination.after_cursor` token.
/// Restarting requires constructing a new cursor, which re-issues the
/// first-page request.
///
/// The cursor owns a clone of the HTTP client and a snapshot of the
/// Authorization header taken at construction, so it can be driven
/// independently of the client that created it.
#[derive(Debug)]
pub struct Cursor<T> {
    http: reqwest::Client,
    url: String,
    params: Vec<(String, String)>,
    auth_header: String,
    buffer: VecDeque<T>,
    after_cursor: Option<String>,
    started: bool,
    exhausted: bool,
    cap: Option<u32>,
    yielded: u32,
}

impl<T: DeserializeOwned> Cursor<T> {
    pub(crate) fn new(
        http: reqwest::Client,
        url: String,
        params: Vec<(String, String)>,
        auth_header: String,
    ) -> Self {
        Self {
            http,
            url,
            params,
            auth_header,
            buffer: VecDeque::new(),
            after_cursor: None,
            started: false,
            exhausted: false,
            cap: None,
            yielded: 0,
        }
    }

    /// Caps the total number of records yielded across however many pages
    /// are needed. Once the cap is reached mid-page, the rest of the
    /// buffered page is discarded and no further page is fetched.
    pub(crate) fn with_limit(mut self, limit: u32) -> Self {
        self.cap = Some(limit);
        self
    }

    /// Whether another record may still be produced. A `true` here is a
    /// hint; the definitive answer comes from `next_record`.
    pub fn has_more(&self) -> bool {
        if self.exhausted {
            return false;
        }
        if let Some(cap) = self.cap {
            if self.yielded >= cap {
                return false;
            }
        }
        !self.buffer.is_empty() || !self.started || self.after_cursor.is_some()
    }

    /// Pulls the next record, fetching the next page on demand.
    ///
    /// Returns `Ok(None)` once the sequence is exhausted. A failed page
    /// fetch marks the cursor exhausted and surfaces the error; subsequent
    /// calls return `Ok(None)` without attempting further fetches.
    pub async fn next_record(&mut self) -> Result<Option<T>, ApiError> {
        if let Some(cap) = self.cap {
            if self.yielded >= cap {
                // cap reached mid-page: drop the remainder of the buffer
                self.buffer.clear();
                self.exhausted = true;
                return Ok(None);
            }
        }
        if self.buffer.is_empty() {
            if self.exhausted || (self.started && self.after_cursor.is_none()) {
                self.exhausted = true;
                return Ok(None);
            }
            self.fetch_page().await?;
        }
        match self.buffer.pop_front() {
            Some(record) => {
                self.yielded += 1;
                Ok(Some(record))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Drains the cursor into a vector, in server order.
    pub async fn collect_all(mut self) -> Result<Vec<T>, ApiError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    async fn fetch_page(&mut self) -> Result<(), ApiError> {
        let mut params = self.params.clone();
        if let Some(cursor) = &self.after_cursor {
            params.push(("after_cursor".to_string(), cursor.clone()));
        }

        tracing::debug!("fetching page from {}", self.url);

        let response = self
            .http
            .get(&self.url)
            .header("Authorization", &self.auth_header)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                self.exhausted = true;
                ApiError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            self.exhausted = true;
            ApiError::from(e)
        })?;

        if !status.is_success() {
            self.exhausted = true;
            tracing::warn!("page fetch from {} returned HTTP {}", self.url, status);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: extract_status_message(&body),
            });
        }

        let envelope: PageEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            self.exhausted = true;
            ApiError::Shape(format!("malformed list envelope: {}", e))
        })?;

        self.after_cursor = envelope.pagination.and_then(|p| p.after_cursor);
        self.buffer = envelope.data.into();
        self.started = true;

        tracing::debug!(
            "page held {} records, continuation {}",
            self.buffer.len(),
            if self.after_cursor.is_some() {
                "present"
            } else {
                "absent"
            }
        );

        Ok(())
    }
}
