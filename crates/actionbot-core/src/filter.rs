//! Per-category counts and single-category filtering of the inbox.
//!
//! Everything here is derived from the [`ClassificationIndex`] and the
//! listing; nothing is cached, so recomputing after every classification is
//! always consistent.

use std::collections::HashMap;

use crate::model::{Category, MessageId, MessageSummary};
use crate::pipeline::ClassificationIndex;

/// Number of messages classified into one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCount {
    /// The category.
    pub category: Category,
    /// Messages in it. Always greater than zero.
    pub count: usize,
}

/// Count messages per category.
///
/// Only categories with at least one message are listed, most frequent
/// first. Ties keep the declaration order of [`Category`].
#[must_use]
pub fn summarize(index: &ClassificationIndex) -> Vec<CategoryCount> {
    let mut counts: HashMap<Category, usize> = HashMap::new();
    for category in index.categories() {
        *counts.entry(category).or_insert(0) += 1;
    }

    let mut summary: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    summary.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));
    summary
}

/// Messages visible under the selected category, in listing order.
///
/// With no selection every message is visible. Unclassified messages never
/// match a category.
#[must_use]
pub fn filtered_messages<'a>(
    selected: Option<Category>,
    all: &'a [MessageSummary],
    index: &ClassificationIndex,
) -> Vec<&'a MessageSummary> {
    match selected {
        None => all.iter().collect(),
        Some(category) => all
            .iter()
            .filter(|message| index.get(&message.id) == Some(category))
            .collect(),
    }
}

/// The category the user is currently looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    selected: Option<Category>,
}

impl CategoryFilter {
    /// A filter showing every message.
    #[must_use]
    pub const fn new() -> Self {
        Self { selected: None }
    }

    /// Currently selected category.
    #[must_use]
    pub const fn selected(&self) -> Option<Category> {
        self.selected
    }

    /// Toggle a category.
    ///
    /// Selecting the active category clears the filter; any other category
    /// replaces it. When a category ends up selected, returns the first
    /// matching message so it can be opened right away.
    pub fn select(
        &mut self,
        category: Category,
        messages: &[MessageSummary],
        index: &ClassificationIndex,
    ) -> Option<MessageId> {
        if self.selected == Some(category) {
            self.selected = None;
            return None;
        }

        self.selected = Some(category);
        messages
            .iter()
            .find(|message| index.get(&message.id) == Some(category))
            .map(|message| message.id.clone())
    }

    /// Show every message again.
    pub const fn clear(&mut self) {
        self.selected = None;
    }

    /// Apply the filter to a listing.
    #[must_use]
    pub fn apply<'a>(
        &self,
        messages: &'a [MessageSummary],
        index: &ClassificationIndex,
    ) -> Vec<&'a MessageSummary> {
        filtered_messages(self.selected, messages, index)
    }
}
