//! Pagination utilities for service layer
//!
//! `Window` is the clamped offset/limit pair handed to stores; `Pagination`
//! is the page-based form HTTP clients send.

/// Largest offset a relational store can bind (signed 64-bit).
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Resolved slice of a listing. `offset` never exceeds [`MAX_OFFSET`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    /// Clamp raw values: `limit` into `[0, max_limit]`, `offset` to `>= 0`.
    pub fn clamped(limit: i64, offset: i64, max_limit: u64) -> Self {
        let max = i64::try_from(max_limit).unwrap_or(i64::MAX);
        Self { offset: offset.max(0) as u64, limit: limit.clamp(0, max) as u64 }
    }
}

/// Pagination parameters
#[derive(Clone, Copy, Debug, Default)]
pub struct Pagination {
    /// 1-based page index
    pub page: Option<i64>,
    /// items per page
    pub limit: Option<i64>,
}

impl Pagination {
    /// Fill defaults, clamp, and convert to `offset = (page - 1) * limit`,
    /// saturating at [`MAX_OFFSET`].
    pub fn normalize(self, default_limit: u64, max_limit: u64) -> Window {
        let default_limit = i64::try_from(default_limit).unwrap_or(i64::MAX);
        let page = self.page.unwrap_or(1).max(1);
        let window = Window::clamped(self.limit.unwrap_or(default_limit), 0, max_limit);
        let offset = ((page - 1) as u64).saturating_mul(window.limit).min(MAX_OFFSET);
        Window { offset, ..window }
    }
}
