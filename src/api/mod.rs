//! Response envelopes and paging query handling shared by the handlers.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::validation::Validator;

/// Single-object success envelope: `{"data": ...}`
#[derive(Debug, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

/// List success envelope: `{"data": [...], "paging": {...}}`
#[derive(Debug, Serialize)]
pub struct PageBody<T> {
    pub data: Vec<T>,
    pub paging: Paging,
}

/// Echoed paging window. No total count is computed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Paging {
    pub page: i64,
    pub size: i64,
}

impl Paging {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.size
    }
}

/// Raw `page`/`size` (and optional `search`) query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageQuery {
    /// Apply defaults (page 1, size 10) and validate bounds (page >= 1,
    /// size 1..=100).
    pub fn resolve(&self) -> Result<Paging, ApiError> {
        let paging = Paging {
            page: self.page.unwrap_or(1),
            size: self.size.unwrap_or(10),
        };

        let mut v = Validator::new();
        v.min_i64("page", paging.page, 1);
        v.min_i64("size", paging.size, 1);
        v.max_i64("size", paging.size, 100);
        v.finish()?;

        Ok(paging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_page_one_size_ten() {
        let paging = PageQuery::default().resolve().unwrap();
        assert_eq!(paging.page, 1);
        assert_eq!(paging.size, 10);
        assert_eq!(paging.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let query = PageQuery {
            page: Some(3),
            size: Some(25),
            search: None,
        };
        assert_eq!(query.resolve().unwrap().offset(), 50);
    }

    #[test]
    fn size_is_capped_at_one_hundred() {
        let query = PageQuery {
            page: Some(1),
            size: Some(101),
            search: None,
        };
        assert!(query.resolve().is_err());
    }

    #[test]
    fn zero_page_is_rejected() {
        let query = PageQuery {
            page: Some(0),
            size: Some(10),
            search: None,
        };
        assert!(query.resolve().is_err());
    }
}
