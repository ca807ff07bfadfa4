//! Head and body poses used as listener/emitter inputs.

use glam::{Quat, Vec3};

use crate::constants::{HEAD_POSITION_EPSILON, UP};

/// World-space position and orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Root pose of a participant's body plus its eye height above the root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub eye_height: f32,
}

impl BodyPose {
    /// Head pose synthesized from the body: eye height straight above the root.
    pub fn synthesized_head(&self) -> Pose {
        Pose {
            position: self.position + UP * self.eye_height,
            rotation: self.rotation,
        }
    }
}

/// Tracked head pose, falling back to the body when tracking is missing or
/// reports a position at the origin.
pub fn resolve_head_pose(tracked: Option<Pose>, body: &BodyPose) -> Pose {
    match tracked {
        Some(head) if head.position.length() > HEAD_POSITION_EPSILON => head,
        _ => body.synthesized_head(),
    }
}
