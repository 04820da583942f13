//! Paged candidate list for the phrase span under the cursor.

use std::ops::Range;

/// A paginated list of candidate phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList {
    candidates: Vec<String>,
    page_size: usize,
    current_page: usize,
}

impl CandidateList {
    /// Create a candidate list with the given page size (at least 1).
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            candidates: Vec::new(),
            page_size: page_size.max(1),
            current_page: 0,
        }
    }

    pub fn from_candidates(candidates: Vec<String>, page_size: usize) -> Self {
        let mut list = Self::with_page_size(page_size);
        list.set_candidates(candidates);
        list
    }

    /// Set the page size, clamping the current page into range.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        if self.current_page >= self.num_pages() {
            self.current_page = 0;
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Set the candidates, resetting to the first page.
    pub fn set_candidates(&mut self, candidates: Vec<String>) {
        self.candidates = candidates;
        self.current_page = 0;
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn num_pages(&self) -> usize {
        self.candidates.len().div_ceil(self.page_size)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    fn current_page_range(&self) -> Range<usize> {
        let start = (self.current_page * self.page_size).min(self.candidates.len());
        let end = (start + self.page_size).min(self.candidates.len());
        start..end
    }

    pub fn current_page_candidates(&self) -> &[String] {
        &self.candidates[self.current_page_range()]
    }

    /// Move to the previous page. Returns true if the page changed.
    pub fn page_up(&mut self) -> bool {
        if self.current_page > 0 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Move to the next page. Returns true if the page changed.
    pub fn page_down(&mut self) -> bool {
        if self.current_page + 1 < self.num_pages() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    pub fn first_page(&mut self) {
        self.current_page = 0;
    }

    pub fn last_page(&mut self) {
        self.current_page = self.num_pages().saturating_sub(1);
    }

    /// Global index for a position on the current page.
    pub fn global_index(&self, page_index: usize) -> Option<usize> {
        let range = self.current_page_range();
        let idx = range.start + page_index;
        (idx < range.end).then_some(idx)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.candidates.get(index).map(String::as_str)
    }
}

impl Default for CandidateList {
    fn default() -> Self {
        Self::with_page_size(10)
    }
}
