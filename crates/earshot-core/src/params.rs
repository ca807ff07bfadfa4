use crate::constants::*;
use crate::LayerMask;

/// Mapping from emitter body height to a range multiplier.
///
/// `Constant(1.0)` is the identity curve and disables the effect. Keyed
/// curves interpolate linearly and hold their end values outside the keyed
/// range; they need not be monotonic.
#[derive(Clone, Debug, PartialEq)]
pub enum HeightCurve {
    Constant(f32),
    Linear(Vec<CurveKey>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveKey {
    pub height: f32,
    pub value: f32,
}

impl Default for HeightCurve {
    fn default() -> Self {
        HeightCurve::Constant(1.0)
    }
}

impl HeightCurve {
    /// Build a keyed curve. Keys are sorted by height; an empty key set yields the identity curve.
    pub fn from_keys(keys: &[(f32, f32)]) -> Self {
        if keys.is_empty() {
            return Self::default();
        }
        let mut keys = keys
            .iter()
            .map(|&(height, value)| CurveKey { height, value })
            .collect::<Vec<_>>();
        keys.sort_by(|a, b| a.height.total_cmp(&b.height));
        HeightCurve::Linear(keys)
    }

    pub fn evaluate(&self, height: f32) -> f32 {
        match self {
            HeightCurve::Constant(v) => *v,
            HeightCurve::Linear(keys) => {
                let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
                    return 1.0;
                };
                if height <= first.height {
                    return first.value;
                }
                if height >= last.height {
                    return last.value;
                }
                for pair in keys.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    if height <= b.height {
                        let span = b.height - a.height;
                        if span <= f32::EPSILON {
                            return b.value;
                        }
                        let t = (height - a.height) / span;
                        return a.value + (b.value - a.value) * t;
                    }
                }
                last.value
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, HeightCurve::Constant(v) if (*v - 1.0).abs() <= f32::EPSILON)
    }
}

/// Attenuation values shared by Overrides and the ambient configuration.
///
/// Factors are in \[0, 1\]: 1 means the effect never shortens the audible
/// range, 0 means it can shorten it down to the current distance.
#[derive(Clone, Debug, PartialEq)]
pub struct AttenuationParams {
    pub occlusion_factor: f32,
    pub player_occlusion_factor: f32,
    pub occlusion_mask: LayerMask,
    pub listener_directionality: f32,
    pub speaker_directionality: f32,

    pub voice_gain: f32,
    pub voice_distance_near: f32,
    pub voice_distance_far: f32,
    pub voice_volumetric_radius: f32,
    pub enable_voice_lowpass: bool,

    pub avatar_gain: f32,
    pub avatar_near_radius: f32,
    pub avatar_far_radius: f32,
    pub avatar_volumetric_radius: f32,
    pub force_avatar_spatial: bool,
    pub allow_avatar_custom_curves: bool,

    pub height_to_range_curve: HeightCurve,
}

impl Default for AttenuationParams {
    fn default() -> Self {
        Self {
            occlusion_factor: DEFAULT_OCCLUSION_FACTOR,
            player_occlusion_factor: DEFAULT_PLAYER_OCCLUSION_FACTOR,
            occlusion_mask: LayerMask::from_layers(&[ENVIRONMENT_LAYER, PARTICIPANT_LAYER]),
            listener_directionality: DEFAULT_LISTENER_DIRECTIONALITY,
            speaker_directionality: DEFAULT_SPEAKER_DIRECTIONALITY,
            voice_gain: DEFAULT_VOICE_GAIN,
            voice_distance_near: DEFAULT_VOICE_DISTANCE_NEAR,
            voice_distance_far: DEFAULT_VOICE_DISTANCE_FAR,
            voice_volumetric_radius: DEFAULT_VOICE_VOLUMETRIC_RADIUS,
            enable_voice_lowpass: true,
            avatar_gain: DEFAULT_AVATAR_GAIN,
            avatar_near_radius: DEFAULT_AVATAR_NEAR_RADIUS,
            avatar_far_radius: DEFAULT_AVATAR_FAR_RADIUS,
            avatar_volumetric_radius: DEFAULT_AVATAR_VOLUMETRIC_RADIUS,
            force_avatar_spatial: false,
            allow_avatar_custom_curves: true,
            height_to_range_curve: HeightCurve::default(),
        }
    }
}

impl AttenuationParams {
    /// Parameters with occlusion and directionality switched off.
    pub fn unattenuated() -> Self {
        Self {
            occlusion_factor: 1.0,
            player_occlusion_factor: 1.0,
            listener_directionality: 0.0,
            speaker_directionality: 0.0,
            ..Self::default()
        }
    }

    /// Clamp every value into its valid range.
    pub fn sanitized(&self) -> Self {
        let mut p = self.clone();
        p.occlusion_factor = clamp01(p.occlusion_factor);
        p.player_occlusion_factor = clamp01(p.player_occlusion_factor);
        p.listener_directionality = clamp01(p.listener_directionality);
        p.speaker_directionality = clamp01(p.speaker_directionality);

        p.voice_gain = finite_or(p.voice_gain, DEFAULT_VOICE_GAIN).clamp(0.0, MAX_VOICE_GAIN);
        p.voice_distance_far = non_negative(p.voice_distance_far);
        p.voice_distance_near = non_negative(p.voice_distance_near).min(p.voice_distance_far);
        p.voice_volumetric_radius = non_negative(p.voice_volumetric_radius);

        p.avatar_gain = finite_or(p.avatar_gain, DEFAULT_AVATAR_GAIN).clamp(0.0, MAX_AVATAR_GAIN);
        p.avatar_far_radius = non_negative(p.avatar_far_radius);
        p.avatar_near_radius = non_negative(p.avatar_near_radius).min(p.avatar_far_radius);
        p.avatar_volumetric_radius = non_negative(p.avatar_volumetric_radius);
        p
    }

    pub fn is_sane(&self) -> bool {
        *self == self.sanitized()
    }

    /// True when no query can change the occlusion factor.
    #[inline]
    pub fn occlusion_disabled(&self) -> bool {
        self.occlusion_factor >= 1.0 && self.player_occlusion_factor >= 1.0
    }
}

/// Ambient reverb applied to the local listener while an Override is active.
#[derive(Clone, Debug, PartialEq)]
pub struct ReverbSettings {
    pub decay_time_sec: f32,
    pub room_level: f32, // 0..1
    pub dry_level: f32,  // 0..1
    pub diffusion: f32,  // 0..1
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            decay_time_sec: 1.5,
            room_level: 0.3,
            dry_level: 1.0,
            diffusion: 1.0,
        }
    }
}

#[inline]
fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        1.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[inline]
fn non_negative(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.max(0.0)
    }
}

#[inline]
fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}
