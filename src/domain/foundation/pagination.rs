//! Offset/limit pagination.

use serde::Serialize;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 200;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Builds a request from optional query values, clamping the limit.
    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Applies the window to an in-memory, already ordered list.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            offset: request.offset,
            limit: request.limit,
        }
    }

    /// Converts each item, keeping the paging fields.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_fifty() {
        let req = PageRequest::default();
        assert_eq!(req.offset, 0);
        assert_eq!(req.limit, 50);
    }

    #[test]
    fn clamps_limit() {
        assert_eq!(PageRequest::new(None, Some(10_000)).limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(None, Some(0)).limit, 1);
    }

    #[test]
    fn slice_applies_window() {
        let req = PageRequest::new(Some(2), Some(2));
        assert_eq!(req.slice(&[1, 2, 3, 4, 5]), vec![3, 4]);
    }
}
