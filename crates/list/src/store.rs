//! Filter State Store: the authoritative filter/sort/page values of one view.
//!
//! Every mutation that changes what should be fetched is published to the
//! store's subscribers as a [`StoreChange`] carrying an immutable
//! [`QueryDescriptor`] snapshot. Edits made while an IME composition is in
//! progress only touch the displayed text and publish nothing.

use tokio::sync::mpsc;
use tracing::trace;

use crate::query::{
    FilterValue, InputError, ListSchema, MAX_PAGE_INDEX, Paging, QueryDescriptor, SortOrder,
};

/// How soon a change should turn into a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fire on the next tick.
    Immediate,
    /// Plain keystroke in the search box: wait for the quiet period.
    Debounced,
}

/// What to do with the rows of the resulting page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Replace,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub descriptor: QueryDescriptor,
    pub trigger: Trigger,
    pub mode: ApplyMode,
}

pub struct FilterStore {
    schema: ListSchema,
    query: QueryDescriptor,
    display_text: String,
    composing: bool,
    subscribers: Vec<mpsc::UnboundedSender<StoreChange>>,
}

impl FilterStore {
    pub fn new(schema: ListSchema) -> Self {
        let query = schema.initial_query();
        Self {
            schema,
            query,
            display_text: String::new(),
            composing: false,
            subscribers: Vec::new(),
        }
    }

    pub fn schema(&self) -> &ListSchema {
        &self.schema
    }

    /// Immutable snapshot of the current query.
    pub fn descriptor(&self) -> QueryDescriptor {
        self.query.clone()
    }

    /// What the search box shows, which may run ahead of the committed term.
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Register a listener. Closed receivers are pruned on the next publish.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn set_search_text(&mut self, raw: &str) {
        self.display_text = raw.to_string();
        if self.composing || self.query.search_text == raw {
            return;
        }
        self.query.search_text = raw.to_string();
        self.query.page_index = 0;
        self.publish(Trigger::Debounced, ApplyMode::Replace);
    }

    pub fn composition_start(&mut self) {
        self.composing = true;
    }

    /// Commit the composed text and request a fetch right away.
    pub fn composition_end(&mut self, final_raw: &str) {
        self.composing = false;
        self.display_text = final_raw.to_string();
        self.query.search_text = final_raw.to_string();
        self.query.page_index = 0;
        self.publish(Trigger::Immediate, ApplyMode::Replace);
    }

    /// Set one filter. Invalid input is rejected before anything changes.
    pub fn set_filter(
        &mut self,
        name: &str,
        value: impl Into<FilterValue>,
    ) -> Result<(), InputError> {
        let value = value.into();
        self.schema.validate_filter(name, &value)?;
        let before = self.query.filters.insert(name.to_string(), value);
        let changed = before.as_ref() != self.query.filters.get(name);
        self.reset_page_and_publish(changed);
        Ok(())
    }

    /// Back to "any" for one filter.
    pub fn clear_filter(&mut self, name: &str) {
        let changed = self.query.filters.remove(name).is_some();
        self.reset_page_and_publish(changed);
    }

    pub fn set_sort(&mut self, field: &str, order: SortOrder) {
        let field = self.schema.resolve_sort_field(field);
        let changed = self.query.sort_by != field || self.query.sort_order != order;
        self.query.sort_by = field.to_string();
        self.query.sort_order = order;
        self.reset_page_and_publish(changed);
    }

    /// Indexes past [`MAX_PAGE_INDEX`] are clamped.
    pub fn set_page(&mut self, index: usize) {
        let index = index.min(MAX_PAGE_INDEX);
        if self.query.page_index == index {
            return;
        }
        self.query.page_index = index;
        self.publish(Trigger::Immediate, ApplyMode::Replace);
    }

    /// Snaps to the nearest allowed size.
    pub fn set_page_size(&mut self, size: usize) {
        let size = self.schema.page_sizes.snap(size);
        let changed = self.query.page_size != size;
        self.query.page_size = size;
        self.reset_page_and_publish(changed);
    }

    /// Re-fetch page 0 with the current filters, e.g. after a mutation.
    pub fn refresh(&mut self) {
        self.query.page_index = 0;
        self.publish(Trigger::Immediate, ApplyMode::Replace);
    }

    /// Next page appended below the current rows on "load more" views;
    /// a plain next-page step elsewhere.
    ///
    /// The view decides which page an append actually requests from the rows
    /// it holds, so a failed append is retried rather than skipped.
    pub fn load_more(&mut self) {
        self.query.page_index = (self.query.page_index + 1).min(MAX_PAGE_INDEX);
        let mode = match self.schema.paging {
            Paging::LoadMore => ApplyMode::Append,
            Paging::Paged => ApplyMode::Replace,
        };
        self.publish(Trigger::Immediate, mode);
    }

    fn reset_page_and_publish(&mut self, changed: bool) {
        if !changed && self.query.page_index == 0 {
            return;
        }
        self.query.page_index = 0;
        self.publish(Trigger::Immediate, ApplyMode::Replace);
    }

    fn publish(&mut self, trigger: Trigger, mode: ApplyMode) {
        let change = StoreChange {
            descriptor: self.query.clone(),
            trigger,
            mode,
        };
        trace!(list = self.schema.name, ?trigger, ?mode, "store change");
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}
