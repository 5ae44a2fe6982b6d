//! Query-string building and the pagination envelope

use crate::models::ListFilters;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Ordered list of query parameters.
///
/// Absent values and empty strings are skipped, so filter structs can push
/// every field unconditionally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a text value, skipping `None` and blank strings
    pub fn push_str(&mut self, key: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !v.trim().is_empty() {
                self.pairs.push((key.to_string(), v.to_string()));
            }
        }
    }

    /// Push any displayable value, skipping `None`
    pub fn push<T: Display>(&mut self, key: &str, value: Option<T>) {
        if let Some(v) = value {
            self.push_str(key, Some(&v.to_string()));
        }
    }

    /// Push a calendar date as `YYYY-MM-DD`
    pub fn push_date(&mut self, key: &str, value: Option<NaiveDate>) {
        self.push(key, value.map(|d| d.format("%Y-%m-%d")));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Parameters for a plain (non-paginated) list call
    pub fn for_list<F: ListFilters>(filters: &F) -> Self {
        let mut params = Self::new();
        params.push("includeDeleted", filters.paging().include_deleted);
        filters.push_filters(&mut params);
        params
    }

    /// Parameters for a `/paginated` call; page and limit are always sent
    pub fn for_page<F: ListFilters>(filters: &F) -> Self {
        let paging = filters.paging();
        let mut params = Self::new();
        params.push("page", Some(paging.page_or_default()));
        params.push("limit", Some(paging.limit_or_default()));
        params.push("includeDeleted", paging.include_deleted);
        filters.push_filters(&mut params);
        params
    }
}

/// Pagination envelope returned by every `/paginated` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Records in the current page
    pub data: Vec<T>,
    /// Total count of records matching the filter
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> PaginatedResponse<T> {
    /// Build an envelope from a slice of results, deriving page counts
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = total.div_ceil(limit as u64) as u32;
        Self {
            data,
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Create an empty first page
    pub fn empty(limit: u32) -> Self {
        Self::new(Vec::new(), 0, 1, limit)
    }
}

/// What a paginated cache query hands back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: u64,
}
