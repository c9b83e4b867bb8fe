// Sequence ID Generator - decimal string ids that never repeat within a process

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::EventId;

/// Hands out ids strictly above every id it has seen, including ones that have
/// since been deleted, so a freed id is never reissued.
#[derive(Debug)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Next id issued will be `last + 1`
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Seed from existing ids; non-numeric ids are ignored
    pub fn from_existing<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a EventId>,
    {
        let max = ids
            .into_iter()
            .filter_map(|id| id.as_sequence())
            .max()
            .unwrap_or(0);
        Self::starting_after(max)
    }

    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_event_id(&self) -> EventId {
        EventId::new(self.next_id().to_string())
    }

    /// Last id handed out (or the seed value if none yet)
    pub fn last_issued(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let generator = IdGenerator::new();

        let id1 = generator.next_id();
        let id2 = generator.next_id();
        let id3 = generator.next_id();

        assert_eq!((id1, id2, id3), (1, 2, 3));
        assert_eq!(generator.last_issued(), 3);
    }

    #[test]
    fn test_seeded_from_existing_ids() {
        let existing = vec![EventId::from("3"), EventId::from("12"), EventId::from("legacy")];
        let generator = IdGenerator::from_existing(&existing);

        assert_eq!(generator.next_event_id(), EventId::from("13"));
    }
}
