//! Audio sink side of the engine: the settings pushed to each emitter and
//! the trait the host implements to apply them.

use earshot_core::{Attenuation, AttenuationParams, ParticipantId, ReverbSettings};

/// Values applied to one participant's voice and avatar sound emitters.
#[derive(Clone, Debug, PartialEq)]
pub struct EmitterSettings {
    pub voice_gain: f32,
    pub voice_distance_near: f32,
    pub voice_distance_far: f32,
    pub voice_volumetric_radius: f32,
    pub enable_lowpass: bool,
    pub avatar_gain: f32,
    pub avatar_near: f32,
    pub avatar_far: f32,
    pub avatar_volumetric_radius: f32,
    pub force_spatial: bool,
    pub allow_custom_curves: bool,
}

impl EmitterSettings {
    /// Fully muted emitter. Sent explicitly rather than skipping the update.
    pub fn muted() -> Self {
        Self {
            voice_gain: 0.0,
            voice_distance_near: 0.0,
            voice_distance_far: 0.0,
            voice_volumetric_radius: 0.0,
            enable_lowpass: false,
            avatar_gain: 0.0,
            avatar_near: 0.0,
            avatar_far: 0.0,
            avatar_volumetric_radius: 0.0,
            force_spatial: true,
            allow_custom_curves: false,
        }
    }

    /// Apply the computed range factors to `params`.
    ///
    /// Far distances are scaled by the range reduction (and the voice far
    /// distance by the height curve); near distances never exceed far.
    /// Out-of-range params are clamped to host limits first.
    pub fn from_params(params: &AttenuationParams, attenuation: &Attenuation) -> Self {
        let clamped;
        let params = if params.is_sane() {
            params
        } else {
            clamped = params.sanitized();
            &clamped
        };
        let voice_far =
            params.voice_distance_far * attenuation.height_scale * attenuation.voice_range;
        let avatar_far = params.avatar_far_radius * attenuation.avatar_range;
        Self {
            voice_gain: params.voice_gain,
            voice_distance_near: params.voice_distance_near.min(voice_far),
            voice_distance_far: voice_far,
            voice_volumetric_radius: params.voice_volumetric_radius,
            enable_lowpass: params.enable_voice_lowpass,
            avatar_gain: params.avatar_gain,
            avatar_near: params.avatar_near_radius.min(avatar_far),
            avatar_far,
            avatar_volumetric_radius: params.avatar_volumetric_radius,
            force_spatial: params.force_avatar_spatial,
            allow_custom_curves: params.allow_avatar_custom_curves,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.voice_gain <= 0.0 && self.voice_distance_far <= 0.0 && self.avatar_gain <= 0.0
    }
}

/// Host-side setter for per-emitter audio properties.
///
/// Calls are fire-and-forget and made at most once per participant per frame.
pub trait AudioSink {
    fn apply(&mut self, participant: ParticipantId, settings: &EmitterSettings);

    /// Reverb for the local listener; `None` restores the host default.
    fn apply_reverb(&mut self, reverb: Option<&ReverbSettings>);
}
