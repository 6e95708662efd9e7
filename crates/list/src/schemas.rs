//! Built-in list pages of the admin console.

use crate::query::{FilterKind, FilterSpec, Filtering, ListSchema, PageSizes, Paging, SortOrder};

pub const EVENT_FILTERS: &[FilterSpec] = &[
    FilterSpec {
        name: "has_embedding",
        kind: FilterKind::Bool,
    },
    FilterSpec {
        name: "is_japanese",
        kind: FilterKind::Bool,
    },
    FilterSpec {
        name: "event_type",
        kind: FilterKind::Identifier,
    },
];

pub const FOLLOWER_CACHE_FILTERS: &[FilterSpec] = &[
    FilterSpec {
        name: "bot",
        kind: FilterKind::Text,
    },
    FilterSpec {
        name: "is_follower",
        kind: FilterKind::Bool,
    },
];

/// Vectorized events: server-side search, filters and numbered pages.
pub fn events() -> ListSchema {
    ListSchema {
        name: "events",
        filters: EVENT_FILTERS,
        sort_fields: &["created_at", "received_at", "content", "kind"],
        default_sort_by: "created_at",
        default_sort_order: SortOrder::Desc,
        page_sizes: PageSizes::new(&[10, 25, 50, 100], 50),
        paging: Paging::Paged,
        filtering: Filtering::Server,
    }
}

/// Conversation summaries of one bot. The endpoint never reports a total.
pub fn summaries() -> ListSchema {
    ListSchema {
        name: "summaries",
        filters: &[],
        sort_fields: &["created_at", "from_timestamp", "to_timestamp", "user_input"],
        default_sort_by: "created_at",
        default_sort_order: SortOrder::Desc,
        page_sizes: PageSizes::new(&[25, 50, 100], 25),
        paging: Paging::Paged,
        filtering: Filtering::Server,
    }
}

/// Reply history of one bot, newest first, grown with "load more".
pub fn replies() -> ListSchema {
    ListSchema {
        name: "replies",
        filters: &[],
        sort_fields: &["created_at"],
        default_sort_by: "created_at",
        default_sort_order: SortOrder::Desc,
        page_sizes: PageSizes::new(&[50], 50),
        paging: Paging::LoadMore,
        filtering: Filtering::Server,
    }
}

/// Per-call token usage rows, newest first.
pub fn token_usage() -> ListSchema {
    ListSchema {
        name: "token_usage",
        filters: &[],
        sort_fields: &["created_at"],
        default_sort_by: "created_at",
        default_sort_order: SortOrder::Desc,
        page_sizes: PageSizes::new(&[10, 25, 50, 100], 25),
        paging: Paging::Paged,
        filtering: Filtering::Server,
    }
}

/// Follower cache: the endpoint returns every entry, so search, filters,
/// sorting and paging happen locally.
pub fn follower_cache() -> ListSchema {
    ListSchema {
        name: "follower_cache",
        filters: FOLLOWER_CACHE_FILTERS,
        sort_fields: &["cached_at", "user_name", "bot_name"],
        default_sort_by: "cached_at",
        default_sort_order: SortOrder::Desc,
        page_sizes: PageSizes::new(&[10, 25, 50, 100], 25),
        paging: Paging::Paged,
        filtering: Filtering::Client,
    }
}
