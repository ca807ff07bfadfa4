use earshot_core::{BodyPose, ParticipantId, Pose};

/// Live view of the shared session, provided by the host.
pub trait Session {
    /// Fill `out` with the connected participants in a stable order.
    fn live_participants(&self, out: &mut Vec<ParticipantId>);

    /// Tracked head pose, `None` when the host has no head tracking for `participant`.
    fn head_pose(&self, participant: ParticipantId) -> Option<Pose>;

    fn body_pose(&self, participant: ParticipantId) -> BodyPose;
}
