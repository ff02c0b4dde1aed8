//! Classification index and run progress.

use std::collections::HashMap;
use std::fmt;

use crate::model::{Category, Classification, MessageId};

/// Identifier of one pipeline run. Strictly increasing per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Category of every successfully classified message.
///
/// A message is either absent or present with its full category; there is
/// at most one entry per message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationIndex {
    entries: HashMap<MessageId, Category>,
}

impl ClassificationIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Category of a message, if it was classified.
    #[must_use]
    pub fn get(&self, message_id: &MessageId) -> Option<Category> {
        self.entries.get(message_id).copied()
    }

    /// Whether a message was classified.
    #[must_use]
    pub fn contains(&self, message_id: &MessageId) -> bool {
        self.entries.contains_key(message_id)
    }

    /// Number of classified messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(message, category)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&MessageId, Category)> {
        self.entries.iter().map(|(id, category)| (id, *category))
    }

    /// Iterate over the categories of all entries.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.values().copied()
    }

    pub(crate) fn insert(&mut self, classification: &Classification) {
        self.entries
            .insert(classification.message_id.clone(), classification.category);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl FromIterator<(MessageId, Category)> for ClassificationIndex {
    fn from_iter<I: IntoIterator<Item = (MessageId, Category)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Progress of one classification sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineRun {
    /// Run this progress belongs to.
    pub run_id: RunId,
    /// Number of messages in the sweep.
    pub total: usize,
    /// Messages whose batch has fully settled.
    pub completed: usize,
    /// Requests issued and not yet settled.
    pub in_flight: usize,
}

impl PipelineRun {
    pub(crate) const fn new(run_id: RunId, total: usize) -> Self {
        Self {
            run_id,
            total,
            completed: 0,
            in_flight: 0,
        }
    }

    /// Whether every message has been accounted for.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(id: &str, category: Category) -> Classification {
        Classification {
            message_id: MessageId::from(id),
            category,
            action: None,
            justification: None,
        }
    }

    #[test]
    fn test_insert_keeps_one_entry_per_message() {
        let mut index = ClassificationIndex::new();
        index.insert(&classification("m1", Category::Spam));
        index.insert(&classification("m1", Category::Invoice));

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&MessageId::from("m1")), Some(Category::Invoice));
    }

    #[test]
    fn test_clear() {
        let mut index: ClassificationIndex = [(MessageId::from("m1"), Category::Spam)]
            .into_iter()
            .collect();
        assert!(index.contains(&MessageId::from("m1")));

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.get(&MessageId::from("m1")), None);
    }

    #[test]
    fn test_progress_completion() {
        let mut run = PipelineRun::new(RunId(1), 4);
        assert!(!run.is_complete());
        run.completed = 4;
        assert!(run.is_complete());

        let empty = PipelineRun::new(RunId(2), 0);
        assert!(empty.is_complete());
    }

    #[test]
    fn test_run_id_display() {
        assert_eq!(RunId(7).to_string(), "run-7");
    }
}
