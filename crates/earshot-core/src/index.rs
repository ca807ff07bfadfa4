use std::collections::BTreeMap;

use log::debug;

use crate::{OverrideRegistry, ParticipantId};

/// Participant -> registry map for every participant except the local one.
///
/// Keys stay sorted and unique; a participant only has a slot while its
/// registry holds at least one live Override.
#[derive(Debug, Default)]
pub struct OverrideIndex {
    slots: BTreeMap<ParticipantId, OverrideRegistry>,
}

impl OverrideIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for `participant`, created on first use.
    pub fn override_slot(&mut self, participant: ParticipantId) -> &mut OverrideRegistry {
        self.slots.entry(participant).or_insert_with(|| {
            debug!("[index] new slot for {participant}");
            OverrideRegistry::new()
        })
    }

    /// Drop the slot once its registry has no live entries. Returns true if dropped.
    pub fn clear_slot_if_empty(&mut self, participant: ParticipantId) -> bool {
        let empty = match self.slots.get_mut(&participant) {
            Some(registry) => registry.is_empty(),
            None => return false,
        };
        if empty {
            self.slots.remove(&participant);
            debug!("[index] dropped empty slot for {participant}");
        }
        empty
    }

    /// Remove the slot regardless of contents.
    pub fn remove_slot(&mut self, participant: ParticipantId) -> Option<OverrideRegistry> {
        self.slots.remove(&participant)
    }

    pub fn lookup(&self, participant: ParticipantId) -> Option<&OverrideRegistry> {
        self.slots.get(&participant)
    }

    pub fn lookup_mut(&mut self, participant: ParticipantId) -> Option<&mut OverrideRegistry> {
        self.slots.get_mut(&participant)
    }

    /// Participants with a slot, ascending.
    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Compact every registry and drop the slots that end up empty.
    pub fn consolidate_all(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, registry| !registry.is_empty());
        before - self.slots.len()
    }
}
