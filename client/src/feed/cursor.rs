/// Pagination bookkeeping for the feed.
///
/// `fetching` guards against a second page request while one is in flight;
/// `exhausted` is sticky until the cursor is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    page: u32,
    exhausted: bool,
    fetching: bool,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self {
            page: 1,
            exhausted: false,
            fetching: false,
        }
    }
}

impl PaginationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last page requested (1 before anything was requested).
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn can_request(&self) -> bool {
        !self.fetching && !self.exhausted
    }

    /// Mark `page` as in flight. The page counter moves immediately so a
    /// repeated trigger before completion cannot ask for it again.
    pub fn request(&mut self, page: u32) -> Option<u32> {
        if !self.can_request() {
            return None;
        }
        self.fetching = true;
        self.page = page;
        Some(page)
    }

    /// Request the page after the last one requested.
    pub fn request_next(&mut self) -> Option<u32> {
        let next = self.page.saturating_add(1);
        self.request(next)
    }

    /// A page came back with `received` items. A short page ends the feed.
    pub fn complete(&mut self, received: usize, page_size: usize) {
        self.fetching = false;
        if received < page_size {
            self.exhausted = true;
        }
    }

    /// A failed fetch is treated as the end of the feed.
    pub fn fail(&mut self) {
        self.fetching = false;
        self.exhausted = true;
    }
}
