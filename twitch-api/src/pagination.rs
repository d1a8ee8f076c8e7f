//! Cursor pagination for Helix list endpoints

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{ApiError, Result};
use helix_client::{ApiCallOptions, HelixCaller};

#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    pagination: Option<PaginationCursor>,
}

#[derive(Debug, Deserialize)]
struct PaginationCursor {
    #[serde(default)]
    cursor: Option<String>,
}

/// A request that walks a cursor-paginated Helix endpoint.
///
/// Each call to [`get_next`](Self::get_next) fetches one page and advances the
/// cursor. An empty page is returned once the endpoint has no more data.
pub struct HelixPaginatedRequest<T> {
    caller: Arc<dyn HelixCaller>,
    options: ApiCallOptions,
    cursor: Option<String>,
    finished: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> HelixPaginatedRequest<T> {
    pub fn new(caller: Arc<dyn HelixCaller>, options: ApiCallOptions) -> Self {
        Self {
            caller,
            options,
            cursor: None,
            finished: false,
            _marker: PhantomData,
        }
    }

    pub fn current_cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetch the next page.
    pub async fn get_next(&mut self) -> Result<Vec<T>> {
        if self.finished {
            return Ok(Vec::new());
        }

        let mut options = self.options.clone();
        if let Some(cursor) = &self.cursor {
            options = options.with_query("after", cursor.clone());
        }

        let url = options.url.clone();
        let body = self
            .caller
            .call_api(options)
            .await?
            .ok_or(ApiError::EmptyResponse(url))?;
        let page: Page<T> = serde_json::from_value(body)?;

        self.cursor = page
            .pagination
            .and_then(|p| p.cursor)
            .filter(|c| !c.is_empty());
        if self.cursor.is_none() || page.data.is_empty() {
            self.finished = true;
        }
        tracing::trace!(
            url = %self.options.url,
            items = page.data.len(),
            finished = self.finished,
            "Fetched Helix page"
        );

        Ok(page.data)
    }

    /// Fetch every remaining page and concatenate the results.
    pub async fn get_all(&mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while !self.finished {
            all.extend(self.get_next().await?);
        }
        Ok(all)
    }

    /// Restart from the first page.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.finished = false;
    }
}

/// Extract the `data` array of a non-paginated response.
pub(crate) fn data_array<T: DeserializeOwned>(body: Option<Value>, url: &str) -> Result<Vec<T>> {
    let body = body.ok_or_else(|| ApiError::EmptyResponse(url.to_string()))?;
    let page: Page<T> = serde_json::from_value(body)?;
    Ok(page.data)
}
