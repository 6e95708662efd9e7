//! Page Cache: the rows currently on screen plus their pagination metadata.

/// Row count reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Total {
    Exact(u64),
    /// The endpoint did not count; paging falls back to the "full page means
    /// there is more" heuristic.
    Unknown,
}

impl Total {
    /// Wire convention: a missing or negative count means unknown.
    pub fn from_wire(raw: Option<i64>) -> Self {
        match raw {
            Some(n) if n >= 0 => Self::Exact(n as u64),
            _ => Self::Unknown,
        }
    }

    pub fn exact(&self) -> Option<u64> {
        match self {
            Self::Exact(n) => Some(*n),
            Self::Unknown => None,
        }
    }
}

/// The server's answer to one query. Rows keep the server's order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<R> {
    pub rows: Vec<R>,
    pub total: Total,
    /// Echo of the request, for reconciliation.
    pub page_index: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageCache<R> {
    rows: Vec<R>,
    total: Total,
    /// Offset of `rows[0]` in the full result set.
    start: usize,
    page_index: usize,
    page_size: usize,
    has_more: bool,
    loaded: bool,
}

impl<R> Default for PageCache<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            total: Total::Unknown,
            start: 0,
            page_index: 0,
            page_size: 0,
            has_more: false,
            loaded: false,
        }
    }
}

impl<R> PageCache<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a whole new page.
    pub fn replace(&mut self, result: PageResult<R>) {
        self.start = result.page_index.saturating_mul(result.page_size);
        self.has_more = match result.total {
            Total::Exact(total) => (self.start.saturating_add(result.rows.len()) as u64) < total,
            Total::Unknown => result.page_size > 0 && result.rows.len() == result.page_size,
        };
        self.rows = result.rows;
        self.total = result.total;
        self.page_index = result.page_index;
        self.page_size = result.page_size;
        self.loaded = true;
    }

    /// "Load more": extend the current rows with the next page.
    pub fn append(&mut self, result: PageResult<R>) {
        self.has_more = result.page_size > 0 && result.rows.len() == result.page_size;
        self.rows.extend(result.rows);
        self.total = result.total;
        self.page_index = result.page_index;
        self.page_size = result.page_size;
        self.loaded = true;
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn total(&self) -> Total {
        self.total
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// False until the first result has been applied.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// 1-based inclusive `(from, to)` of the visible rows, `None` when empty.
    pub fn range(&self) -> Option<(usize, usize)> {
        if self.rows.is_empty() {
            return None;
        }
        Some((
            self.start.saturating_add(1),
            self.start.saturating_add(self.rows.len()),
        ))
    }

    /// `"26–50 of 120"` with an exact total, `"26–50"` without one.
    pub fn range_label(&self) -> String {
        let (from, to) = self.range().unwrap_or((0, 0));
        match self.total {
            Total::Exact(total) => format!("{from}–{to} of {total}"),
            Total::Unknown => format!("{from}–{to}"),
        }
    }

    /// Number of pages, known only with an exact total.
    pub fn page_count(&self) -> Option<u64> {
        let total = self.total.exact()?;
        if self.page_size == 0 {
            return None;
        }
        Some(total.div_ceil(self.page_size as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(rows: std::ops::Range<u32>, total: Total, page_index: usize, page_size: usize) -> PageResult<u32> {
        PageResult {
            rows: rows.collect(),
            total,
            page_index,
            page_size,
        }
    }

    #[test]
    fn wire_totals_map_negative_and_missing_to_unknown() {
        assert_eq!(Total::from_wire(Some(12)), Total::Exact(12));
        assert_eq!(Total::from_wire(Some(0)), Total::Exact(0));
        assert_eq!(Total::from_wire(Some(-1)), Total::Unknown);
        assert_eq!(Total::from_wire(None), Total::Unknown);
    }

    #[test]
    fn exact_total_renders_full_label() {
        let mut cache = PageCache::new();
        cache.replace(page(25..50, Total::Exact(120), 1, 25));
        assert_eq!(cache.range(), Some((26, 50)));
        assert_eq!(cache.range_label(), "26–50 of 120");
        assert_eq!(cache.page_count(), Some(5));
        assert!(cache.has_more());

        cache.replace(page(100..120, Total::Exact(120), 4, 25));
        assert_eq!(cache.range_label(), "101–120 of 120");
        assert!(!cache.has_more());
    }

    #[test]
    fn unknown_total_uses_full_page_heuristic() {
        let mut cache = PageCache::new();
        cache.replace(page(0..25, Total::Unknown, 0, 25));
        assert!(cache.has_more());
        assert_eq!(cache.range_label(), "1–25");
        assert_eq!(cache.page_count(), None);

        cache.replace(page(25..35, Total::Unknown, 1, 25));
        assert!(!cache.has_more());
        assert_eq!(cache.range_label(), "26–35");
    }

    #[test]
    fn append_extends_rows_and_recomputes_has_more() {
        let mut cache = PageCache::new();
        cache.replace(page(0..50, Total::Unknown, 0, 50));
        cache.append(page(50..100, Total::Unknown, 1, 50));
        assert_eq!(cache.rows().len(), 100);
        assert!(cache.has_more());
        assert_eq!(cache.range(), Some((1, 100)));

        cache.append(page(100..107, Total::Unknown, 2, 50));
        assert_eq!(cache.rows().len(), 107);
        assert_eq!(cache.rows()[106], 106);
        assert!(!cache.has_more());
    }

    #[test]
    fn empty_cache_is_not_loaded() {
        let cache: PageCache<u32> = PageCache::new();
        assert!(!cache.is_loaded());
        assert_eq!(cache.range(), None);
        assert_eq!(cache.range_label(), "0–0");

        let mut cache = PageCache::new();
        cache.replace(page(0..0, Total::Exact(0), 0, 25));
        assert!(cache.is_loaded());
        assert_eq!(cache.range_label(), "0–0 of 0");
        assert_eq!(cache.page_count(), Some(0));
        assert!(!cache.has_more());
    }
}
