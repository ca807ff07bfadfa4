//! Entry point for authoring components that attach Overrides to participants.
//!
//! The directory keeps each Override's `affected` set and the per-participant
//! registries in step. The local participant has its own registry, evaluated
//! every frame; everyone else lives in the [`OverrideIndex`].

use log::{debug, warn};

use crate::{
    EngineError, EngineResult, OverrideHandle, OverrideIndex, OverrideRef, OverrideRegistry,
    ParticipantId,
};

#[derive(Debug)]
pub struct OverrideDirectory {
    local_id: ParticipantId,
    local: OverrideRegistry,
    index: OverrideIndex,
}

impl OverrideDirectory {
    pub fn new(local_id: ParticipantId) -> Self {
        Self {
            local_id,
            local: OverrideRegistry::new(),
            index: OverrideIndex::new(),
        }
    }

    pub fn local_id(&self) -> ParticipantId {
        self.local_id
    }

    pub fn is_local(&self, participant: ParticipantId) -> bool {
        participant == self.local_id
    }

    /// Put `participant` under the effect of `ov`. Re-adding relocates the
    /// entry rather than duplicating it.
    pub fn try_add_participant(
        &mut self,
        ov: &OverrideRef,
        participant: ParticipantId,
    ) -> EngineResult<()> {
        let handle = ov.upgrade().ok_or(EngineError::StaleOverride)?;
        handle.borrow_mut().mark_affected(participant);

        let registry = if self.is_local(participant) {
            &mut self.local
        } else {
            self.index.override_slot(participant)
        };
        if registry.add(ov) {
            debug!("[directory] {participant} now under {handle:?}");
            Ok(())
        } else {
            Err(EngineError::StaleOverride)
        }
    }

    pub fn add_participant(&mut self, ov: &OverrideHandle, participant: ParticipantId) -> bool {
        match self.try_add_participant(&ov.downgrade(), participant) {
            Ok(()) => true,
            Err(err) => {
                warn!("[directory] add {participant}: {err}");
                false
            }
        }
    }

    /// Take `participant` out of `ov`'s effect. Returns the number of live
    /// Overrides still affecting the participant.
    pub fn try_remove_participant(
        &mut self,
        ov: &OverrideRef,
        participant: ParticipantId,
    ) -> EngineResult<usize> {
        let was_marked = ov
            .upgrade()
            .is_some_and(|handle| handle.borrow_mut().unmark_affected(participant));

        if self.is_local(participant) {
            return Ok(self.local.remove(ov));
        }
        match self.index.lookup_mut(participant) {
            Some(registry) => {
                let remaining = registry.remove(ov);
                if remaining == 0 {
                    self.index.clear_slot_if_empty(participant);
                }
                Ok(remaining)
            }
            None if was_marked => Ok(0),
            None => Err(EngineError::UnknownParticipant(participant)),
        }
    }

    pub fn remove_participant(&mut self, ov: &OverrideHandle, participant: ParticipantId) -> bool {
        match self.try_remove_participant(&ov.downgrade(), participant) {
            Ok(_) => true,
            Err(err) => {
                warn!("[directory] remove {participant}: {err}");
                false
            }
        }
    }

    /// Detach `ov` from every participant it affects, for teardown of its
    /// owner. A stale reference triggers a full compaction instead.
    /// Returns the number of participants detached.
    pub fn remove_override(&mut self, ov: &OverrideRef) -> usize {
        let Some(handle) = ov.upgrade() else {
            self.local.consolidate();
            self.index.consolidate_all();
            return 0;
        };
        let affected = handle.borrow().affected().collect::<Vec<_>>();
        let mut detached = 0;
        for participant in affected {
            if self.try_remove_participant(ov, participant).is_ok() {
                detached += 1;
            }
        }
        debug!("[directory] detached {handle:?} from {detached} participant(s)");
        detached
    }

    /// Forget a disconnected participant so its id can be reused.
    pub fn participant_left(&mut self, participant: ParticipantId) {
        if self.is_local(participant) {
            warn!("[directory] ignoring leave for local participant {participant}");
            return;
        }
        if let Some(registry) = self.index.remove_slot(participant) {
            for handle in registry.iter_live() {
                handle.borrow_mut().unmark_affected(participant);
            }
            debug!("[directory] released slot for {participant}");
        }
    }

    /// Change `ov`'s priority and re-sort it in every registry it occupies.
    /// Returns the number of registries updated.
    pub fn try_set_priority(&mut self, ov: &OverrideRef, priority: i32) -> EngineResult<usize> {
        let handle = ov.upgrade().ok_or(EngineError::StaleOverride)?;
        handle.borrow_mut().set_priority(priority);

        let affected = handle.borrow().affected().collect::<Vec<_>>();
        let mut moved = 0;
        for participant in affected {
            if let Some(registry) = self.registry_mut(participant) {
                if registry.contains(ov) && registry.add(ov) {
                    moved += 1;
                }
            }
        }
        debug!("[directory] {handle:?} re-sorted in {moved} registries");
        Ok(moved)
    }

    pub fn set_priority(&mut self, ov: &OverrideHandle, priority: i32) -> bool {
        match self.try_set_priority(&ov.downgrade(), priority) {
            Ok(_) => true,
            Err(err) => {
                warn!("[directory] set priority: {err}");
                false
            }
        }
    }

    /// Active Override of `participant` as seen by `listener`. A remote slot
    /// whose registry compacted to nothing is dropped from the index.
    pub fn resolve(
        &mut self,
        participant: ParticipantId,
        listener: ParticipantId,
    ) -> Option<OverrideHandle> {
        if self.is_local(participant) {
            return self.local.highest_unblacklisted_for(listener);
        }
        let found = self
            .index
            .lookup_mut(participant)?
            .highest_unblacklisted_for(listener);
        if found.is_none() {
            self.index.clear_slot_if_empty(participant);
        }
        found
    }

    /// Active Override of the local participant.
    pub fn resolve_local(&mut self) -> Option<OverrideHandle> {
        let local_id = self.local_id;
        self.local.highest_unblacklisted_for(local_id)
    }

    pub fn registry_mut(&mut self, participant: ParticipantId) -> Option<&mut OverrideRegistry> {
        if self.is_local(participant) {
            Some(&mut self.local)
        } else {
            self.index.lookup_mut(participant)
        }
    }

    pub fn local_registry_mut(&mut self) -> &mut OverrideRegistry {
        &mut self.local
    }

    pub fn index(&self) -> &OverrideIndex {
        &self.index
    }

    /// True if `participant` currently has a registry (the local one always does).
    pub fn is_tracked(&self, participant: ParticipantId) -> bool {
        self.is_local(participant) || self.index.lookup(participant).is_some()
    }
}
