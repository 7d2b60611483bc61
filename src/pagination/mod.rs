//! Pagination traversal strategies.
//!
//! Three server-side pagination conventions are supported behind one closed
//! interface: offset/limit, page number, and has-more/cursor. Each strategy
//! decides, per iteration, the next request's query parameters and whether to
//! stop. Computing next-params, extracting items, and deciding stop are kept
//! separate so the driver never knows which convention is in play.
//!
//! Stop bounds default to unbounded: termination normally relies on the
//! empty-page or has-more signal alone.

use serde_json::Value;

/// Default top-level response key holding the item collection.
pub const DEFAULT_ITEMS_KEY: &str = "orders";

/// Default page size for offset pagination.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Offset/limit pagination configuration.
#[derive(Debug, Clone)]
pub struct OffsetPagination {
    /// Page size sent as the limit parameter.
    pub limit: u64,
    /// Query parameter name for the offset.
    pub offset_param: String,
    /// Query parameter name for the limit.
    pub limit_param: String,
    /// Response key holding the item collection.
    pub items_key: String,
    /// Stop once the offset would reach this bound. `None` = unbounded.
    pub max_offset: Option<u64>,
}

impl Default for OffsetPagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset_param: "offset".to_string(),
            limit_param: "limit".to_string(),
            items_key: DEFAULT_ITEMS_KEY.to_string(),
            max_offset: None,
        }
    }
}

impl OffsetPagination {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the offset parameter name.
    pub fn with_offset_param(mut self, name: impl Into<String>) -> Self {
        self.offset_param = name.into();
        self
    }

    /// Sets the limit parameter name.
    pub fn with_limit_param(mut self, name: impl Into<String>) -> Self {
        self.limit_param = name.into();
        self
    }

    /// Sets the response key holding the items.
    pub fn with_items_key(mut self, key: impl Into<String>) -> Self {
        self.items_key = key.into();
        self
    }

    /// Caps retrieval at the given offset.
    pub fn with_max_offset(mut self, max: u64) -> Self {
        self.max_offset = Some(max);
        self
    }
}

/// Page-number pagination configuration. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct PagePagination {
    /// Query parameter name for the page number.
    pub page_param: String,
    /// Response key holding the item collection.
    pub items_key: String,
    /// Stop once this many pages were fetched. `None` = unbounded.
    pub max_pages: Option<u64>,
}

impl Default for PagePagination {
    fn default() -> Self {
        Self {
            page_param: "page".to_string(),
            items_key: DEFAULT_ITEMS_KEY.to_string(),
            max_pages: None,
        }
    }
}

impl PagePagination {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page parameter name.
    pub fn with_page_param(mut self, name: impl Into<String>) -> Self {
        self.page_param = name.into();
        self
    }

    /// Sets the response key holding the items.
    pub fn with_items_key(mut self, key: impl Into<String>) -> Self {
        self.items_key = key.into();
        self
    }

    /// Caps retrieval at the given page count.
    pub fn with_max_pages(mut self, max: u64) -> Self {
        self.max_pages = Some(max);
        self
    }
}

/// Has-more/cursor pagination configuration.
#[derive(Debug, Clone)]
pub struct CursorPagination {
    /// Query parameter carrying the continuation cursor.
    pub cursor_param: String,
    /// Response key for the continuation flag.
    pub has_more_key: String,
    /// Response key for the next cursor.
    pub cursor_key: String,
    /// Response key holding the item collection.
    pub items_key: String,
    /// Stop after this many iterations. `None` = unbounded.
    pub max_iterations: Option<u64>,
}

impl Default for CursorPagination {
    fn default() -> Self {
        Self {
            cursor_param: "cursor".to_string(),
            has_more_key: "has_more".to_string(),
            cursor_key: "next_cursor".to_string(),
            items_key: DEFAULT_ITEMS_KEY.to_string(),
            max_iterations: None,
        }
    }
}

impl CursorPagination {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cursor parameter name.
    pub fn with_cursor_param(mut self, name: impl Into<String>) -> Self {
        self.cursor_param = name.into();
        self
    }

    /// Sets the response key for the continuation flag.
    pub fn with_has_more_key(mut self, key: impl Into<String>) -> Self {
        self.has_more_key = key.into();
        self
    }

    /// Sets the response key for the next cursor.
    pub fn with_cursor_key(mut self, key: impl Into<String>) -> Self {
        self.cursor_key = key.into();
        self
    }

    /// Sets the response key holding the items.
    pub fn with_items_key(mut self, key: impl Into<String>) -> Self {
        self.items_key = key.into();
        self
    }

    /// Caps retrieval at the given iteration count.
    pub fn with_max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }
}

/// Pagination strategy, selected once per paginated fetch.
#[derive(Debug, Clone)]
pub enum PaginationStrategy {
    /// Offset/limit traversal.
    Offset(OffsetPagination),
    /// Page-number traversal.
    Page(PagePagination),
    /// Has-more flag with optional cursor.
    HasMore(CursorPagination),
}

/// Per-fetch accumulator state. Initialized once per paginated fetch,
/// discarded when the fetch terminates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationState {
    /// Offset traversal state.
    Offset {
        /// Items skipped so far.
        offset: u64,
    },
    /// Page traversal state.
    Page {
        /// Next page to request, 1-based.
        page: u64,
    },
    /// Cursor traversal state.
    Cursor {
        /// Completed iterations.
        iteration: u64,
        /// Continuation token from the last response, if any.
        cursor: Option<String>,
    },
}

impl PaginationStrategy {
    /// Initial state for this strategy.
    pub fn initial_state(&self) -> PaginationState {
        match self {
            Self::Offset(_) => PaginationState::Offset { offset: 0 },
            Self::Page(_) => PaginationState::Page { page: 1 },
            Self::HasMore(_) => PaginationState::Cursor {
                iteration: 0,
                cursor: None,
            },
        }
    }

    /// Response key holding the item collection.
    pub fn items_key(&self) -> &str {
        match self {
            Self::Offset(config) => &config.items_key,
            Self::Page(config) => &config.items_key,
            Self::HasMore(config) => &config.items_key,
        }
    }

    /// Query parameters for the next request.
    pub fn next_params(&self, state: &PaginationState) -> Vec<(String, String)> {
        match (self, state) {
            (Self::Offset(config), PaginationState::Offset { offset }) => vec![
                (config.offset_param.clone(), offset.to_string()),
                (config.limit_param.clone(), config.limit.to_string()),
            ],
            (Self::Page(config), PaginationState::Page { page }) => {
                vec![(config.page_param.clone(), page.to_string())]
            }
            (Self::HasMore(config), PaginationState::Cursor { cursor, .. }) => cursor
                .iter()
                .map(|c| (config.cursor_param.clone(), c.clone()))
                .collect(),
            // State from a different strategy: no parameters to contribute.
            _ => Vec::new(),
        }
    }

    /// Extracts the item collection from a response body. A missing key
    /// reads as an empty page, not an error.
    pub fn extract_items(&self, response: &Value) -> Vec<Value> {
        response
            .get(self.items_key())
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    /// Decides whether traversal ends after this response.
    pub fn should_stop(&self, state: &PaginationState, response: &Value) -> bool {
        let items = self.extract_items(response);

        match (self, state) {
            (Self::Offset(config), PaginationState::Offset { offset }) => {
                if items.is_empty() {
                    return true;
                }
                // Stop once the advanced offset would reach the bound.
                config
                    .max_offset
                    .map_or(false, |max| offset + items.len() as u64 >= max)
            }
            (Self::Page(config), PaginationState::Page { page }) => {
                items.is_empty() || config.max_pages.map_or(false, |max| *page >= max)
            }
            (Self::HasMore(config), PaginationState::Cursor { iteration, .. }) => {
                let has_more = response
                    .get(&config.has_more_key)
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                !has_more
                    || config
                        .max_iterations
                        .map_or(false, |max| iteration + 1 >= max)
            }
            // State from a different strategy: stop rather than loop.
            _ => true,
        }
    }

    /// Advances the state after a response.
    pub fn advance(&self, state: &PaginationState, response: &Value) -> PaginationState {
        match (self, state) {
            (Self::Offset(_), PaginationState::Offset { offset }) => {
                let fetched = self.extract_items(response).len() as u64;
                PaginationState::Offset {
                    offset: offset + fetched,
                }
            }
            (Self::Page(_), PaginationState::Page { page }) => {
                PaginationState::Page { page: page + 1 }
            }
            (Self::HasMore(config), PaginationState::Cursor { iteration, .. }) => {
                let cursor = response
                    .get(&config.cursor_key)
                    .and_then(Value::as_str)
                    .map(String::from);
                PaginationState::Cursor {
                    iteration: iteration + 1,
                    cursor,
                }
            }
            _ => state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_offset_params_and_advance() {
        let strategy = PaginationStrategy::Offset(OffsetPagination::new().with_limit(5));
        let state = strategy.initial_state();

        let params = strategy.next_params(&state);
        assert!(params.contains(&("offset".to_string(), "0".to_string())));
        assert!(params.contains(&("limit".to_string(), "5".to_string())));

        let response = json!({"orders": [1, 2]});
        assert!(!strategy.should_stop(&state, &response));

        let state = strategy.advance(&state, &response);
        assert_eq!(state, PaginationState::Offset { offset: 2 });

        // Empty page ends the traversal and leaves the offset unchanged.
        let empty = json!({"orders": []});
        assert!(strategy.should_stop(&state, &empty));
        assert_eq!(
            strategy.advance(&state, &empty),
            PaginationState::Offset { offset: 2 }
        );
    }

    #[test]
    fn test_offset_bound_enforced() {
        let strategy =
            PaginationStrategy::Offset(OffsetPagination::new().with_limit(5).with_max_offset(25));
        let full_page = json!({"orders": [1, 2, 3, 4, 5]});

        let mut state = strategy.initial_state();
        let mut calls = 0;
        loop {
            calls += 1;
            if strategy.should_stop(&state, &full_page) {
                break;
            }
            state = strategy.advance(&state, &full_page);
        }

        // Offsets 0, 5, 10, 15, 20; the advance past 20 would reach 25.
        assert_eq!(calls, 5);
        assert_eq!(state, PaginationState::Offset { offset: 20 });
    }

    #[test]
    fn test_offset_missing_items_key_is_empty_page() {
        let strategy = PaginationStrategy::Offset(OffsetPagination::new());
        let state = strategy.initial_state();
        let response = json!({"total_count": 10});

        assert!(strategy.extract_items(&response).is_empty());
        assert!(strategy.should_stop(&state, &response));
    }

    #[test]
    fn test_custom_items_key() {
        let strategy =
            PaginationStrategy::Page(PagePagination::new().with_items_key("results"));
        let response = json!({"results": ["a", "b"]});
        assert_eq!(strategy.extract_items(&response).len(), 2);
    }

    #[test]
    fn test_page_advances_until_empty() {
        let strategy = PaginationStrategy::Page(PagePagination::new());
        let mut state = strategy.initial_state();

        let non_empty = json!({"orders": [1]});
        assert!(!strategy.should_stop(&state, &non_empty));
        state = strategy.advance(&state, &non_empty);
        assert_eq!(state, PaginationState::Page { page: 2 });

        let empty = json!({"orders": []});
        assert!(strategy.should_stop(&state, &empty));
    }

    #[test]
    fn test_page_cap() {
        let strategy = PaginationStrategy::Page(PagePagination::new().with_max_pages(3));
        let non_empty = json!({"orders": [1]});

        let state = PaginationState::Page { page: 3 };
        assert!(strategy.should_stop(&state, &non_empty));

        let state = PaginationState::Page { page: 2 };
        assert!(!strategy.should_stop(&state, &non_empty));
    }

    #[test]
    fn test_cursor_flow() {
        let strategy = PaginationStrategy::HasMore(CursorPagination::new());
        let state = strategy.initial_state();

        // First request carries no cursor.
        assert!(strategy.next_params(&state).is_empty());

        let response = json!({"orders": [1], "has_more": true, "next_cursor": "a"});
        assert!(!strategy.should_stop(&state, &response));

        let state = strategy.advance(&state, &response);
        assert_eq!(
            state,
            PaginationState::Cursor {
                iteration: 1,
                cursor: Some("a".to_string())
            }
        );
        assert_eq!(
            strategy.next_params(&state),
            vec![("cursor".to_string(), "a".to_string())]
        );

        // has_more false or absent stops the traversal.
        let done = json!({"orders": [2], "has_more": false});
        assert!(strategy.should_stop(&state, &done));
        let absent = json!({"orders": [2]});
        assert!(strategy.should_stop(&state, &absent));
    }

    #[test]
    fn test_cursor_cleared_when_absent() {
        let strategy = PaginationStrategy::HasMore(CursorPagination::new());
        let state = PaginationState::Cursor {
            iteration: 1,
            cursor: Some("a".to_string()),
        };

        let response = json!({"orders": [1], "has_more": true});
        let state = strategy.advance(&state, &response);
        assert_eq!(
            state,
            PaginationState::Cursor {
                iteration: 2,
                cursor: None
            }
        );
    }

    #[test]
    fn test_cursor_iteration_cap() {
        let strategy =
            PaginationStrategy::HasMore(CursorPagination::new().with_max_iterations(3));
        let endless = json!({"orders": [1], "has_more": true});

        let state = PaginationState::Cursor {
            iteration: 2,
            cursor: None,
        };
        assert!(strategy.should_stop(&state, &endless));

        let state = PaginationState::Cursor {
            iteration: 1,
            cursor: None,
        };
        assert!(!strategy.should_stop(&state, &endless));
    }

    #[test]
    fn test_custom_continuation_keys() {
        let strategy = PaginationStrategy::HasMore(
            CursorPagination::new()
                .with_has_more_key("more")
                .with_cursor_key("continuation")
                .with_cursor_param("after"),
        );
        let state = strategy.initial_state();
        let response = json!({"orders": [1], "more": true, "continuation": "c9"});

        assert!(!strategy.should_stop(&state, &response));
        let state = strategy.advance(&state, &response);
        assert_eq!(
            strategy.next_params(&state),
            vec![("after".to_string(), "c9".to_string())]
        );
    }
}
