//! Query and result types shared by every store backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Widest expiry window a filter will look ahead, about a century.
///
/// Larger requested windows are capped so every backend can still do the
/// date arithmetic.
pub const MAX_EXPIRY_DAYS: u32 = 36_500;

/// A single predicate narrowing a list query.
///
/// Filters in a [`ListQuery`] compose with logical AND. Field names refer to
/// top-level keys of the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    /// Field equals the value exactly (strings, booleans, numbers).
    Equals { field: String, value: Value },
    /// Case-insensitive substring match against any of the fields.
    Contains { fields: Vec<String>, needle: String },
    /// Numeric field is less than or equal to another numeric field of the
    /// same record (`quantity <= reorder_threshold`).
    AtMost { field: String, limit_field: String },
    /// Date field falls on or before `today + days`. Records without a
    /// parseable date never match. Backends treat `days` above
    /// [`MAX_EXPIRY_DAYS`] as [`MAX_EXPIRY_DAYS`].
    ExpiresWithin { field: String, days: u32 },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::Contains {
            fields: vec![field.into()],
            needle: needle.into(),
        }
    }

    pub fn contains_any<I, S>(fields: I, needle: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Contains {
            fields: fields.into_iter().map(Into::into).collect(),
            needle: needle.into(),
        }
    }

    pub fn at_most(field: impl Into<String>, limit_field: impl Into<String>) -> Self {
        Self::AtMost {
            field: field.into(),
            limit_field: limit_field.into(),
        }
    }

    /// `days` is capped at [`MAX_EXPIRY_DAYS`].
    pub fn expires_within(field: impl Into<String>, days: u32) -> Self {
        Self::ExpiresWithin {
            field: field.into(),
            days: days.min(MAX_EXPIRY_DAYS),
        }
    }

    /// `quantity <= reorder_threshold`
    pub fn low_stock() -> Self {
        Self::at_most("quantity", "reorder_threshold")
    }
}

/// Descending sort on a timestamp-like field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortParam {
    pub field: String,
    pub descending: bool,
}

impl SortParam {
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Filter, sort and page window for a list operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub sort: Option<SortParam>,
    /// 1-based page number.
    pub page: u32,
    /// Page size, always at least 1.
    pub limit: u32,
}

impl ListQuery {
    /// Creates a query for the given page window. `page` and `limit` are
    /// raised to 1 when smaller.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            filters: Vec::new(),
            sort: None,
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn with_optional_filter(mut self, filter: Option<Filter>) -> Self {
        if let Some(filter) = filter {
            self.filters.push(filter);
        }
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: Option<SortParam>) -> Self {
        self.sort = sort;
        self
    }

    /// Index of the first record of the page: `(page - 1) * limit`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(1, 50)
    }
}

/// One page of records plus the filtered, unpaginated total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Value>,
    pub total: u64,
}

impl Page {
    #[must_use]
    pub fn new(items: Vec<Value>, total: u64) -> Self {
        Self { items, total }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
