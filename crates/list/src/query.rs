//! What a list view asks the server for.
//!
//! A [`QueryDescriptor`] is a plain value: the store builds a fresh one for
//! every change and the coordinator only ever sees clones, so a dispatched
//! query can never be edited afterwards. [`ListSchema`] describes the fixed
//! shape of one admin page (which filters exist, which fields sort, which page
//! sizes are offered).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub use replydesk_api::SortOrder;

/// Highest page index a view will ask for. Keeps 1-based page numbers
/// inside a `u32` on the wire.
pub const MAX_PAGE_INDEX: usize = (u32::MAX - 1) as usize;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]{1,64}$").expect("identifier regex should compile"));

/// Value of one enum/boolean filter. A filter absent from
/// [`QueryDescriptor::filters`] means "any".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Bool(bool),
    Text(String),
}

impl FilterValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bool(_) => None,
        }
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Normalized snapshot of "what to fetch".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// Committed search text; empty means no text filter.
    pub search_text: String,
    pub filters: BTreeMap<String, FilterValue>,
    pub sort_by: String,
    pub sort_order: SortOrder,
    /// 0-based.
    pub page_index: usize,
    pub page_size: usize,
}

impl QueryDescriptor {
    /// Row offset of the page, saturating instead of overflowing.
    pub fn offset(&self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }

    /// The search term to send, or `None` when the text filter is off.
    pub fn search(&self) -> Option<&str> {
        let trimmed = self.search_text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn filter_bool(&self, name: &str) -> Option<bool> {
        self.filters.get(name).and_then(FilterValue::as_bool)
    }

    pub fn filter_text(&self, name: &str) -> Option<&str> {
        self.filters
            .get(name)
            .and_then(FilterValue::as_text)
            .filter(|s| !s.is_empty())
    }

    /// True when anything narrows the result set beyond paging and sorting.
    pub fn has_active_filters(&self) -> bool {
        self.search().is_some() || !self.filters.is_empty()
    }
}

/// Allow-list of page sizes offered by a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSizes {
    allowed: Vec<usize>,
    default: usize,
}

impl PageSizes {
    /// Zero sizes are dropped; an empty list degrades to just `default`.
    pub fn new(allowed: &[usize], default: usize) -> Self {
        let mut sizes: Vec<usize> = allowed.iter().copied().filter(|&n| n > 0).collect();
        sizes.sort_unstable();
        sizes.dedup();
        if sizes.is_empty() {
            sizes.push(default.max(1));
        }
        let mut this = Self {
            allowed: sizes,
            default: 0,
        };
        this.default = this.snap(default);
        this
    }

    /// Nearest allowed size; ties go to the smaller one.
    pub fn snap(&self, requested: usize) -> usize {
        let mut best = self.allowed[0];
        for &candidate in &self.allowed[1..] {
            if candidate.abs_diff(requested) < best.abs_diff(requested) {
                best = candidate;
            }
        }
        best
    }

    pub fn allowed(&self) -> &[usize] {
        &self.allowed
    }

    pub fn default_size(&self) -> usize {
        self.default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Bool,
    /// Exact-match token: lower-case letters, digits and `_`, at most 64 chars.
    Identifier,
    /// Free text, matched as a substring.
    Text,
}

impl FilterKind {
    fn expected(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Identifier | Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: &'static str,
    pub kind: FilterKind,
}

/// How successive pages are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Numbered pages; each fetch replaces the rows.
    Paged,
    /// "Load more": later pages are appended to the rows already shown.
    LoadMore,
}

/// Where search and filters are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filtering {
    Server,
    /// The endpoint returns the whole (small) set; the client filters and pages.
    Client,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),
    #[error("filter `{name}` expects a {expected} value")]
    KindMismatch {
        name: String,
        expected: &'static str,
    },
    #[error("`{value}` is not valid for `{name}`: use lower-case letters, digits and `_` (at most 64)")]
    InvalidIdentifier { name: String, value: String },
    #[error("`{0}` is not a bot public key (expected 64 lower-case hex characters)")]
    InvalidPubkey(String),
}

/// Fixed description of one admin list page.
#[derive(Debug, Clone)]
pub struct ListSchema {
    pub name: &'static str,
    pub filters: &'static [FilterSpec],
    pub sort_fields: &'static [&'static str],
    pub default_sort_by: &'static str,
    pub default_sort_order: SortOrder,
    pub page_sizes: PageSizes,
    pub paging: Paging,
    pub filtering: Filtering,
}

impl ListSchema {
    pub fn filter(&self, name: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// Canonical sort field name, falling back to the default for unknown names.
    pub fn resolve_sort_field(&self, requested: &str) -> &'static str {
        self.sort_fields
            .iter()
            .copied()
            .find(|f| *f == requested)
            .unwrap_or(self.default_sort_by)
    }

    /// Check a filter value against the schema before it reaches the store.
    pub fn validate_filter(&self, name: &str, value: &FilterValue) -> Result<(), InputError> {
        let def = self
            .filter(name)
            .ok_or_else(|| InputError::UnknownFilter(name.to_string()))?;
        match (def.kind, value) {
            (FilterKind::Bool, FilterValue::Bool(_)) | (FilterKind::Text, FilterValue::Text(_)) => {
                Ok(())
            }
            (FilterKind::Identifier, FilterValue::Text(text)) => {
                if IDENTIFIER_RE.is_match(text) {
                    Ok(())
                } else {
                    Err(InputError::InvalidIdentifier {
                        name: name.to_string(),
                        value: text.clone(),
                    })
                }
            }
            (kind, _) => Err(InputError::KindMismatch {
                name: name.to_string(),
                expected: kind.expected(),
            }),
        }
    }

    pub fn initial_query(&self) -> QueryDescriptor {
        QueryDescriptor {
            search_text: String::new(),
            filters: BTreeMap::new(),
            sort_by: self.default_sort_by.to_string(),
            sort_order: self.default_sort_order,
            page_index: 0,
            page_size: self.page_sizes.default_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTERS: &[FilterSpec] = &[
        FilterSpec {
            name: "has_embedding",
            kind: FilterKind::Bool,
        },
        FilterSpec {
            name: "event_type",
            kind: FilterKind::Identifier,
        },
        FilterSpec {
            name: "bot",
            kind: FilterKind::Text,
        },
    ];

    fn schema() -> ListSchema {
        ListSchema {
            name: "test",
            filters: FILTERS,
            sort_fields: &["created_at", "kind"],
            default_sort_by: "created_at",
            default_sort_order: SortOrder::Desc,
            page_sizes: PageSizes::new(&[10, 25, 50, 100], 50),
            paging: Paging::Paged,
            filtering: Filtering::Server,
        }
    }

    #[test]
    fn snap_picks_nearest_allowed_size() {
        let sizes = PageSizes::new(&[100, 10, 50, 25, 25], 30);
        assert_eq!(sizes.allowed(), &[10, 25, 50, 100]);
        assert_eq!(sizes.default_size(), 25);
        assert_eq!(sizes.snap(0), 10);
        assert_eq!(sizes.snap(26), 25);
        assert_eq!(sizes.snap(75), 50);
        assert_eq!(sizes.snap(76), 100);
        assert_eq!(sizes.snap(10_000), 100);
    }

    #[test]
    fn empty_allow_list_degrades_to_default() {
        let sizes = PageSizes::new(&[0], 0);
        assert_eq!(sizes.allowed(), &[1]);
        assert_eq!(sizes.snap(40), 1);
    }

    #[test]
    fn search_ignores_surrounding_whitespace() {
        let mut q = schema().initial_query();
        assert_eq!(q.search(), None);
        q.search_text = "   ".into();
        assert_eq!(q.search(), None);
        assert!(!q.has_active_filters());
        q.search_text = " kuro ".into();
        assert_eq!(q.search(), Some("kuro"));
        assert!(q.has_active_filters());
    }

    #[test]
    fn offset_follows_page_index() {
        let mut q = schema().initial_query();
        q.page_index = 3;
        q.page_size = 25;
        assert_eq!(q.offset(), 75);

        q.page_index = usize::MAX / 2;
        assert_eq!(q.offset(), usize::MAX);
    }

    #[test]
    fn validate_filter_checks_name_kind_and_identifier_shape() {
        let s = schema();
        assert!(s.validate_filter("has_embedding", &true.into()).is_ok());
        assert!(s.validate_filter("event_type", &"bot_reply".into()).is_ok());
        assert!(s.validate_filter("bot", &"Any Text!".into()).is_ok());

        assert_eq!(
            s.validate_filter("nope", &true.into()),
            Err(InputError::UnknownFilter("nope".into()))
        );
        assert_eq!(
            s.validate_filter("has_embedding", &"yes".into()),
            Err(InputError::KindMismatch {
                name: "has_embedding".into(),
                expected: "boolean"
            })
        );
        assert!(matches!(
            s.validate_filter("event_type", &"Bot Reply".into()),
            Err(InputError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            s.validate_filter("event_type", &"".into()),
            Err(InputError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn unknown_sort_field_falls_back_to_default() {
        let s = schema();
        assert_eq!(s.resolve_sort_field("kind"), "kind");
        assert_eq!(s.resolve_sort_field("DROP TABLE"), "created_at");
    }
}
