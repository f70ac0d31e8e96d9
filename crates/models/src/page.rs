//! Spring-style pagination envelope used by every list endpoint.

use serde::{Deserialize, Serialize};

/// One page of a paginated listing.
///
/// Callers advance by requesting [`next_page`](Self::next_page) until it
/// returns `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub empty: bool,
    pub first: bool,
    pub last: bool,
    /// Zero-based page index.
    pub number: i32,
    pub number_of_elements: i32,
    pub size: i32,
    pub total_elements: i64,
    pub total_pages: i32,
    pub pageable: Pageable,
    pub sort: Sort,
}

impl<T> Page<T> {
    /// Index of the page after this one, or `None` on the last page.
    pub fn next_page(&self) -> Option<i32> {
        if self.last { None } else { Some(self.pageable.page_number + 1) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub offset: i64,
    pub page_number: i32,
    pub page_size: i32,
    pub paged: bool,
    pub unpaged: bool,
    pub sort: Sort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sort {
    pub empty: bool,
    pub sorted: bool,
    pub unsorted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(last: bool, page_number: i32) -> Page<String> {
        serde_json::from_value(serde_json::json!({
            "content": ["a", "b"],
            "empty": false,
            "first": page_number == 0,
            "last": last,
            "number": page_number,
            "numberOfElements": 2,
            "size": 20,
            "totalElements": 42,
            "totalPages": 3,
            "pageable": {
                "offset": i64::from(page_number) * 20,
                "pageNumber": page_number,
                "pageSize": 20,
                "paged": true,
                "unpaged": false,
                "sort": { "empty": true, "sorted": false, "unsorted": true }
            },
            "sort": { "empty": true, "sorted": false, "unsorted": true }
        }))
        .unwrap()
    }

    #[test]
    fn test_next_page_advances_until_last() {
        assert_eq!(page(false, 0).next_page(), Some(1));
        assert_eq!(page(false, 1).next_page(), Some(2));
        assert_eq!(page(true, 2).next_page(), None);
    }
}
