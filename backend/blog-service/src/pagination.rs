/// Page selection for post listings
///
/// Listings are cut into fixed pages of `POSTS_PER_PAGE`. Page numbers come
/// straight from the query string and are forgiving: garbage selects the
/// first page and anything past the end selects the last one.
use serde::Serialize;

/// Posts shown per listing page
pub const POSTS_PER_PAGE: i64 = 10;

/// Resolved position of one page within a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
}

impl PageWindow {
    /// Resolve a raw `?page=` value against the total number of rows.
    pub fn resolve(raw: Option<&str>, count: i64, per_page: i64) -> Self {
        let num_pages = if count <= 0 {
            1
        } else {
            (count + per_page - 1) / per_page
        };

        let number = match raw.map(str::trim) {
            Some(value) => match value.parse::<i64>() {
                Ok(n) if (1..=num_pages).contains(&n) => n,
                Ok(_) => num_pages,
                // Integers too large for i64 are still past the end
                Err(_) if is_integer(value) => num_pages,
                Err(_) => 1,
            },
            None => 1,
        };

        Self {
            number,
            num_pages,
            count: count.max(0),
            per_page,
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One page of results with navigation metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(object_list: Vec<T>, window: PageWindow) -> Self {
        Self {
            object_list,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_next: window.number < window.num_pages,
            has_previous: window.number > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_listing_has_one_page() {
        let window = PageWindow::resolve(None, 0, POSTS_PER_PAGE);
        assert_eq!(window.number, 1);
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(PageWindow::resolve(None, 10, 10).num_pages, 1);
        assert_eq!(PageWindow::resolve(None, 11, 10).num_pages, 2);
        assert_eq!(PageWindow::resolve(None, 25, 10).num_pages, 3);
    }

    #[test]
    fn test_non_integer_page_selects_first() {
        let window = PageWindow::resolve(Some("abc"), 35, 10);
        assert_eq!(window.number, 1);
    }

    #[test]
    fn test_out_of_range_page_selects_last() {
        let window = PageWindow::resolve(Some("99"), 35, 10);
        assert_eq!(window.number, 4);
        assert_eq!(window.offset(), 30);

        let window = PageWindow::resolve(Some("0"), 35, 10);
        assert_eq!(window.number, 4);
    }

    #[test]
    fn test_overflowing_page_number_selects_last() {
        let window = PageWindow::resolve(Some("99999999999999999999"), 35, 10);
        assert_eq!(window.number, 4);

        let window = PageWindow::resolve(Some("-99999999999999999999"), 35, 10);
        assert_eq!(window.number, 4);

        let window = PageWindow::resolve(Some("9999999999999999999x"), 35, 10);
        assert_eq!(window.number, 1);
    }

    #[test]
    fn test_page_navigation_flags() {
        let middle = Page::new(vec![1, 2], PageWindow::resolve(Some("2"), 30, 10));
        assert!(middle.has_next);
        assert!(middle.has_previous);

        let first = Page::new(vec![1], PageWindow::resolve(Some("1"), 5, 10));
        assert!(!first.has_next);
        assert!(!first.has_previous);
    }
}
