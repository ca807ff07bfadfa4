//! Occlusion, directionality and range-reduction math.
//!
//! Every factor is in \[0, 1\]. Occlusion and directionality are multiplied
//! into a single combined reduction which then shortens the voice and
//! avatar far ranges independently via [`range_reduction`].

use glam::{Quat, Vec3};
use smallvec::SmallVec;

use crate::constants::*;
use crate::{AttenuationParams, HeightCurve, LayerMask, Pose};

/// What a ray query struck, as classified by the host physics adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitKind {
    /// A level surface.
    Environment,
    /// A participant capsule the host hides from scripts.
    FilteredParticipant,
    /// Anything the adapter could not classify; treated as environment.
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub kind: HitKind,
}

impl RayHit {
    pub fn environment(distance: f32) -> Self {
        Self {
            distance,
            kind: HitKind::Environment,
        }
    }

    pub fn participant(distance: f32) -> Self {
        Self {
            distance,
            kind: HitKind::FilteredParticipant,
        }
    }
}

/// At most two hits are ever considered.
pub type RayHits = SmallVec<[RayHit; 2]>;

/// Host physics ray query.
pub trait RayQuery {
    /// Cast from `origin` along the unit vector `direction` up to
    /// `max_distance`, against the categories in `mask`. Implementations
    /// return at most two hits, nearest first.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> RayHits;
}

/// Occlusion factor between a listener head and an emitter `distance`
/// away along `direction`.
pub fn occlusion<Q: RayQuery + ?Sized>(
    physics: &Q,
    listener_head: Vec3,
    direction: Vec3,
    distance: f32,
    params: &AttenuationParams,
    emitter_margin: f32,
) -> f32 {
    if params.occlusion_disabled() || params.occlusion_mask.is_empty() || distance <= 0.0 {
        return 1.0;
    }
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO {
        return 1.0;
    }
    let hits = physics.raycast(listener_head, dir, distance, params.occlusion_mask);
    occlusion_from_hits(
        &hits,
        distance,
        params.occlusion_factor,
        params.player_occlusion_factor,
        params.occlusion_mask,
        emitter_margin,
    )
}

/// Classify a finished ray query into an occlusion factor.
pub fn occlusion_from_hits(
    hits: &[RayHit],
    distance: f32,
    occlusion_factor: f32,
    player_occlusion_factor: f32,
    mask: LayerMask,
    emitter_margin: f32,
) -> f32 {
    let factor = match hits {
        [] => 1.0,
        _ if !mask.contains_layer(PARTICIPANT_LAYER) => occlusion_factor,
        [hit] => {
            // A lone hit next to the emitter is the emitter's own capsule.
            if hit.distance >= distance - emitter_margin {
                1.0
            } else {
                match hit.kind {
                    HitKind::FilteredParticipant => player_occlusion_factor,
                    HitKind::Environment | HitKind::Unknown => occlusion_factor,
                }
            }
        }
        [first, second, ..] => {
            if first.kind == HitKind::FilteredParticipant
                && second.kind == HitKind::FilteredParticipant
            {
                player_occlusion_factor
            } else {
                occlusion_factor
            }
        }
    };
    factor.clamp(0.0, 1.0)
}

/// Facing factor for a listener looking toward a speaker along `direction`
/// (listener to speaker).
///
/// Each side maps its alignment from \[-1, 1\] to \[0, 1\], adds the slack
/// `1 - strength` and is clamped before the two are multiplied. A strength
/// of 0 disables that side.
pub fn directionality(
    listener_rot: Quat,
    speaker_rot: Quat,
    direction: Vec3,
    listener_strength: f32,
    speaker_strength: f32,
) -> f32 {
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO {
        return 1.0;
    }
    let listener_forward = listener_rot * FORWARD;
    let speaker_forward = speaker_rot * FORWARD;

    let listener_alignment = 0.5 * (1.0 + listener_forward.dot(dir));
    let speaker_alignment = 0.5 * (1.0 + speaker_forward.dot(-dir));

    let listener_factor =
        (listener_alignment + (1.0 - listener_strength.clamp(0.0, 1.0))).clamp(0.0, 1.0);
    let speaker_factor =
        (speaker_alignment + (1.0 - speaker_strength.clamp(0.0, 1.0))).clamp(0.0, 1.0);
    listener_factor * speaker_factor
}

/// Multiplier for a far range of `max_audible_range` given the combined
/// reduction. The remaining distance to the far edge shrinks linearly with
/// `combined_reduction`; 0 pulls the far edge in to the current distance.
pub fn range_reduction(distance: f32, combined_reduction: f32, max_audible_range: f32) -> f32 {
    if max_audible_range <= 0.0 || (combined_reduction - 1.0).abs() < RANGE_REDUCTION_EPSILON {
        return 1.0;
    }
    let remaining = max_audible_range - distance;
    if remaining <= 0.0 {
        // Already out of range; nothing left to reduce.
        return 1.0;
    }
    let occluded_remaining = remaining * combined_reduction.clamp(0.0, 1.0);
    ((distance.max(0.0) + occluded_remaining) / max_audible_range).clamp(0.0, 1.0)
}

pub fn height_scale(curve: &HeightCurve, emitter_height: f32) -> f32 {
    curve.evaluate(emitter_height).max(0.0)
}

/// All factors computed for one listener/emitter pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub distance: f32,
    pub occlusion: f32,
    pub directionality: f32,
    pub combined: f32,
    pub height_scale: f32,
    pub voice_range: f32,
    pub avatar_range: f32,
}

impl Attenuation {
    pub const NONE: Attenuation = Attenuation {
        distance: 0.0,
        occlusion: 1.0,
        directionality: 1.0,
        combined: 1.0,
        height_scale: 1.0,
        voice_range: 1.0,
        avatar_range: 1.0,
    };
}

/// Evaluate every factor for `speaker` as heard by `listener`.
pub fn attenuate<Q: RayQuery + ?Sized>(
    physics: &Q,
    listener: &Pose,
    speaker: &Pose,
    speaker_height: f32,
    params: &AttenuationParams,
    emitter_margin: f32,
) -> Attenuation {
    let delta = speaker.position - listener.position;
    let distance = delta.length();

    let occlusion = occlusion(
        physics,
        listener.position,
        delta,
        distance,
        params,
        emitter_margin,
    );
    let directionality = directionality(
        listener.rotation,
        speaker.rotation,
        delta,
        params.listener_directionality,
        params.speaker_directionality,
    );
    let combined = occlusion * directionality;
    let height_scale = height_scale(&params.height_to_range_curve, speaker_height);

    Attenuation {
        distance,
        occlusion,
        directionality,
        combined,
        height_scale,
        voice_range: range_reduction(
            distance,
            combined,
            params.voice_distance_far * height_scale,
        ),
        avatar_range: range_reduction(distance, combined, params.avatar_far_radius),
    }
}
