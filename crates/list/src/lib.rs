//! Paginated, filtered list controller for the replydesk admin console.
//!
//! A list page is a [`FilterStore`] (what the user asked for) mounted into a
//! [`ListView`] (what the server answered), with a [`PageSource`] in between.

pub mod cache;
pub mod coordinator;
pub mod local;
pub mod mutation;
pub mod query;
pub mod resources;
pub mod schemas;
pub mod source;
pub mod store;
pub mod view;

pub use cache::{PageCache, PageResult, Total};
pub use coordinator::{Directive, Dispatch, FetchCoordinator};
pub use mutation::{MutationError, apply_mutation};
pub use query::{FilterValue, InputError, ListSchema, MAX_PAGE_INDEX, QueryDescriptor, SortOrder};
pub use resources::{
    BotPubkey, EventsSource, FollowerCacheSource, RepliesSource, SummariesSource,
    TokenUsageSource,
};
pub use source::{FetchError, PageSource};
pub use store::{ApplyMode, FilterStore, StoreChange, Trigger};
pub use view::{ListOptions, ListView, Notice, NoticeLevel, Phase, ViewState};
