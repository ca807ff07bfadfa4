use log::debug;

use crate::{OverrideHandle, OverrideRef, ParticipantId};

/// Priority-ordered Overrides affecting one participant.
///
/// Entries are kept in non-increasing priority order; among equal
/// priorities the most recent insert ranks first. The registry may hold
/// stale references between calls. Every public operation compacts them
/// away first, keeping the relative order of the live entries.
#[derive(Debug, Default)]
pub struct OverrideRegistry {
    entries: Vec<OverrideRef>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `ov` at its priority position. An entry that is already
    /// present is moved rather than duplicated, which is how priority
    /// changes at runtime are picked up. Returns `false` if `ov` is stale.
    pub fn add(&mut self, ov: &OverrideRef) -> bool {
        let Some(handle) = ov.upgrade() else {
            return false;
        };
        let priority = handle.borrow().priority();

        self.consolidate();
        if let Some(pos) = self.position(ov) {
            self.entries.remove(pos);
        }

        // Stop at the first entry not strictly above us: ties favour the newest insert.
        let at = self
            .entries
            .iter()
            .position(|e| e.priority().is_some_and(|p| p <= priority))
            .unwrap_or(self.entries.len());
        self.entries.insert(at, ov.clone());
        true
    }

    /// Remove `ov` and return the number of live entries left.
    pub fn remove(&mut self, ov: &OverrideRef) -> usize {
        if let Some(pos) = self.position(ov) {
            self.entries.remove(pos);
        }
        self.consolidate();
        self.entries.len()
    }

    pub fn get(&mut self, index: usize) -> Option<OverrideHandle> {
        self.consolidate();
        self.entries.get(index).and_then(OverrideRef::upgrade)
    }

    /// Highest-priority Override whose blacklist does not exclude `listener`.
    pub fn highest_unblacklisted_for(&mut self, listener: ParticipantId) -> Option<OverrideHandle> {
        self.consolidate();
        self.entries
            .iter()
            .filter_map(OverrideRef::upgrade)
            .find(|handle| !handle.borrow().is_blacklisted(listener))
    }

    pub fn contains(&mut self, ov: &OverrideRef) -> bool {
        self.consolidate();
        ov.is_live() && self.position(ov).is_some()
    }

    pub fn len(&mut self) -> usize {
        self.consolidate();
        self.entries.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Live entries in priority order, without compacting.
    pub fn iter_live(&self) -> impl Iterator<Item = OverrideHandle> + '_ {
        self.entries.iter().filter_map(OverrideRef::upgrade)
    }

    /// Drop stale entries, shifting live ones forward. Returns how many were dropped.
    pub fn consolidate(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(OverrideRef::is_live);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!("[registry] compacted {dropped} stale override(s)");
        }
        dropped
    }

    fn position(&self, ov: &OverrideRef) -> Option<usize> {
        self.entries.iter().position(|e| e.ptr_eq(ov))
    }
}
