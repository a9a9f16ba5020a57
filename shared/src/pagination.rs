use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 200;

/// One page of an ordered result set. `page` is 1-indexed; the derived
/// fields follow a fixed convention: `pages = ceil(total / page_size)` (so
/// zero when the filtered set is empty), `has_next = page < pages`,
/// `has_previous = page > 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PaginatedResponse<T> {
    /// Assemble a page from an already-sliced item list and the total count
    /// computed against the same filter predicate. `page` and `page_size`
    /// must have passed parameter validation (`page >= 1`, `page_size >= 1`).
    pub fn new(items: Vec<T>, total: i64, page: u32, page_size: u32) -> Self {
        let pages = if page_size == 0 {
            0
        } else {
            (total.max(0) as u64).div_ceil(page_size as u64) as u32
        };
        Self {
            items,
            total,
            page,
            page_size,
            pages,
            has_next: page < pages,
            has_previous: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(count: usize, total: i64, page: u32, page_size: u32) -> PaginatedResponse<u32> {
        PaginatedResponse::new(vec![0; count], total, page, page_size)
    }

    #[test]
    fn derived_fields_match_ceil_convention() {
        let response = page_of(10, 15, 1, 10);
        assert_eq!(response.pages, 2);
        assert!(response.has_next);
        assert!(!response.has_previous);

        let response = page_of(5, 15, 2, 10);
        assert_eq!(response.pages, 2);
        assert!(!response.has_next);
        assert!(response.has_previous);
    }

    #[test]
    fn exact_multiple_has_no_phantom_page() {
        let response = page_of(10, 20, 2, 10);
        assert_eq!(response.pages, 2);
        assert!(!response.has_next);
    }

    #[test]
    fn empty_result_set_has_zero_pages() {
        let response = page_of(0, 0, 1, 20);
        assert_eq!(response.pages, 0);
        assert!(!response.has_next);
        assert!(!response.has_previous);
    }

    #[test]
    fn has_next_is_equivalent_to_page_times_size_below_total() {
        for total in [0_i64, 1, 19, 20, 21, 199, 200, 201] {
            for page in 1_u32..=12 {
                let response = page_of(0, total, page, 20);
                assert_eq!(
                    response.has_next,
                    (page as i64) * 20 < total,
                    "total={total} page={page}"
                );
                assert_eq!(response.pages as i64, (total + 19) / 20);
            }
        }
    }
}
