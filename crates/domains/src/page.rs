//! Pagination primitives shared by the stores, services and templates.

/// A validated request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    per_page: u32,
}

impl PageRequest {
    /// Builds a request, clamping `page` up to 1 and `per_page` to at
    /// least one row so LIMIT/OFFSET stay sane.
    pub fn new(page: i64, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit()
    }
}

/// The number of the last page that still holds rows (page 1 when empty).
pub fn last_page(total: u64, per_page: u32) -> i64 {
    let per_page = u64::from(per_page.max(1));
    ((total.saturating_sub(1) / per_page) + 1) as i64
}

/// One page of items plus enough bookkeeping to render pagination controls.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: u32,
    pub total: u64,
}

// Window sizes for the page-number strip rendered under listings.
const LEFT_EDGE: i64 = 2;
const LEFT_CURRENT: i64 = 2;
const RIGHT_CURRENT: i64 = 5;
const RIGHT_EDGE: i64 = 2;

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            per_page: request.per_page(),
            total,
        }
    }

    /// Total number of pages; an empty result still counts as one page.
    pub fn pages(&self) -> i64 {
        last_page(self.total, self.per_page)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    pub fn prev(&self) -> Option<i64> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn next(&self) -> Option<i64> {
        self.has_next().then(|| self.page + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }

    /// Page numbers for the pager strip: both edges plus a window around
    /// the current page, with `None` marking each skipped run.
    pub fn iter_pages(&self) -> Vec<Option<i64>> {
        let pages = self.pages();
        let mut out = Vec::new();
        let mut last = 0;
        for num in 1..=pages {
            let in_left_edge = num <= LEFT_EDGE;
            let in_window =
                num > self.page - LEFT_CURRENT - 1 && num < self.page + RIGHT_CURRENT;
            let in_right_edge = num > pages - RIGHT_EDGE;
            if in_left_edge || in_window || in_right_edge {
                if last + 1 != num {
                    out.push(None);
                }
                out.push(Some(num));
                last = num;
            }
        }
        out
    }
}
