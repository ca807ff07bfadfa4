//! Spherical trigger zones that attach an Override to whoever stands inside.

use std::collections::BTreeSet;

use earshot_core::{Override, OverrideDirectory, OverrideHandle, ParticipantId};
use glam::Vec3;
use log::debug;

use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneEvent {
    Entered(ParticipantId),
    Exited(ParticipantId),
}

/// Owns one Override and keeps its affected set in step with the
/// participants whose body root is inside the sphere.
///
/// Dropping the zone drops the Override; registries purge it lazily.
pub struct OverrideZone {
    center: Vec3,
    radius: f32,
    handle: OverrideHandle,
    occupants: BTreeSet<ParticipantId>,
    live: Vec<ParticipantId>,
}

impl OverrideZone {
    pub fn new(center: Vec3, radius: f32, ov: Override) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            handle: OverrideHandle::new(ov),
            occupants: BTreeSet::new(),
            live: Vec::new(),
        }
    }

    pub fn handle(&self) -> &OverrideHandle {
        &self.handle
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }

    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    pub fn occupants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.occupants.iter().copied()
    }

    pub fn is_occupied_by(&self, participant: ParticipantId) -> bool {
        self.occupants.contains(&participant)
    }

    /// Diff current positions against the occupant set, attaching and
    /// detaching the Override as participants cross the boundary.
    /// Participants that left the session are forgotten without touching
    /// the directory; their slots are released by `participant_left`.
    pub fn update<S: Session + ?Sized>(
        &mut self,
        session: &S,
        directory: &mut OverrideDirectory,
        out_events: &mut Vec<ZoneEvent>,
    ) {
        self.live.clear();
        session.live_participants(&mut self.live);

        let live = &self.live;
        self.occupants.retain(|p| live.contains(p));

        for &participant in &self.live {
            let inside = self.contains_point(session.body_pose(participant).position);
            let occupant = self.occupants.contains(&participant);
            if inside && !occupant {
                if directory.add_participant(&self.handle, participant) {
                    self.occupants.insert(participant);
                    out_events.push(ZoneEvent::Entered(participant));
                }
            } else if !inside && occupant {
                directory.remove_participant(&self.handle, participant);
                self.occupants.remove(&participant);
                out_events.push(ZoneEvent::Exited(participant));
            }
        }
    }

    /// Detach the Override from every participant, for explicit teardown.
    pub fn teardown(&mut self, directory: &mut OverrideDirectory) {
        let detached = directory.remove_override(&self.handle.downgrade());
        debug!(
            "[zone] teardown of {:?} detached {detached} participant(s)",
            self.handle
        );
        self.occupants.clear();
    }
}
