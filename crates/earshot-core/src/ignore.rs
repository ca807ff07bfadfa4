use std::collections::BTreeSet;

use crate::ParticipantId;

/// Participants excluded from per-frame processing entirely.
#[derive(Clone, Debug, Default)]
pub struct IgnoreSet {
    ids: BTreeSet<ParticipantId>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, participant: ParticipantId) -> bool {
        self.ids.insert(participant)
    }

    pub fn remove(&mut self, participant: ParticipantId) -> bool {
        self.ids.remove(&participant)
    }

    #[inline]
    pub fn contains(&self, participant: ParticipantId) -> bool {
        self.ids.contains(&participant)
    }

    /// Ignored participants, ascending.
    pub fn iter(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

impl FromIterator<ParticipantId> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = ParticipantId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
