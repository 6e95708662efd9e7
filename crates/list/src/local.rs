//! Client-side search, filtering, sorting and paging for endpoints that return
//! their whole dataset in one response.

use std::cmp::Ordering;

use tracing::warn;

use crate::cache::{PageResult, Total};
use crate::query::{FilterValue, QueryDescriptor, SortOrder};

/// A row that can be filtered and sorted without the server.
pub trait LocalRow {
    /// `needle` is already lower-cased and trimmed.
    fn matches_search(&self, needle: &str) -> bool;
    fn matches_filter(&self, name: &str, value: &FilterValue) -> bool;
    fn compare_by(&self, other: &Self, field: &str) -> Ordering;
}

/// Case-insensitive substring test against any of `haystacks`.
pub fn contains_folded<'a>(needle: &str, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
    haystacks
        .into_iter()
        .any(|h| h.to_lowercase().contains(needle))
}

/// Narrow, order and slice `rows` the way the server would for `query`.
pub fn apply<R: LocalRow>(
    list: &str,
    mut rows: Vec<R>,
    query: &QueryDescriptor,
    max_rows: usize,
) -> PageResult<R> {
    if rows.len() > max_rows {
        warn!(
            list,
            rows = rows.len(),
            max_rows,
            "filtering a large dataset locally; this endpoint should paginate on the server"
        );
    }

    let needle = query.search().map(str::to_lowercase);
    rows.retain(|row| {
        needle.as_deref().is_none_or(|n| row.matches_search(n))
            && query
                .filters
                .iter()
                .all(|(name, value)| row.matches_filter(name, value))
    });

    rows.sort_by(|a, b| {
        let ord = a.compare_by(b, &query.sort_by);
        match query.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let total = rows.len();
    let start = query.offset().min(total);
    let end = start.saturating_add(query.page_size).min(total);
    let page: Vec<R> = rows.drain(start..end).collect();

    PageResult {
        rows: page,
        total: Total::Exact(total as u64),
        page_index: query.page_index,
        page_size: query.page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        bot: &'static str,
        flag: bool,
        at: i64,
    }

    impl LocalRow for Row {
        fn matches_search(&self, needle: &str) -> bool {
            contains_folded(needle, [self.name])
        }

        fn matches_filter(&self, name: &str, value: &FilterValue) -> bool {
            match (name, value) {
                ("bot", FilterValue::Text(t)) => contains_folded(&t.to_lowercase(), [self.bot]),
                ("is_follower", FilterValue::Bool(b)) => self.flag == *b,
                _ => true,
            }
        }

        fn compare_by(&self, other: &Self, field: &str) -> Ordering {
            match field {
                "user_name" => self.name.cmp(other.name),
                _ => self.at.cmp(&other.at),
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Alice", bot: "Kuro", flag: true, at: 3 },
            Row { name: "bob", bot: "Shiro", flag: false, at: 1 },
            Row { name: "Alina", bot: "kuro", flag: false, at: 2 },
            Row { name: "carol", bot: "Kuro", flag: true, at: 4 },
        ]
    }

    #[test]
    fn search_is_case_insensitive_and_filters_combine() {
        let mut q = schemas::follower_cache().initial_query();
        q.search_text = " ALI ".into();
        let page = apply("test", rows(), &q, 500);
        assert_eq!(page.total, Total::Exact(2));
        // default sort is newest first
        assert_eq!(page.rows[0].name, "Alice");

        q.filters.insert("is_follower".into(), false.into());
        q.filters.insert("bot".into(), "KURO".into());
        let page = apply("test", rows(), &q, 500);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].name, "Alina");
    }

    #[test]
    fn pages_are_sliced_after_sorting() {
        let mut q = schemas::follower_cache().initial_query();
        q.sort_by = "user_name".into();
        q.sort_order = SortOrder::Asc;
        q.page_size = 3;
        q.page_index = 1;
        let page = apply("test", rows(), &q, 500);
        assert_eq!(page.total, Total::Exact(4));
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].name, "carol");
        assert_eq!(page.page_index, 1);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let mut q = schemas::follower_cache().initial_query();
        q.page_index = 9;
        let page = apply("test", rows(), &q, 2);
        assert!(page.rows.is_empty());
        assert_eq!(page.total, Total::Exact(4));
    }
}
