use glam::Vec3;

// Shared attenuation defaults and host limits used by the engine and frontends.

// Voice defaults
pub const DEFAULT_VOICE_GAIN: f32 = 15.0; // dB
pub const DEFAULT_VOICE_DISTANCE_NEAR: f32 = 0.0;
pub const DEFAULT_VOICE_DISTANCE_FAR: f32 = 25.0;
pub const DEFAULT_VOICE_VOLUMETRIC_RADIUS: f32 = 0.0;

// Avatar sound defaults
pub const DEFAULT_AVATAR_GAIN: f32 = 10.0; // dB
pub const DEFAULT_AVATAR_NEAR_RADIUS: f32 = 0.0;
pub const DEFAULT_AVATAR_FAR_RADIUS: f32 = 40.0;
pub const DEFAULT_AVATAR_VOLUMETRIC_RADIUS: f32 = 0.0;

// Host limits
pub const MAX_VOICE_GAIN: f32 = 24.0;
pub const MAX_AVATAR_GAIN: f32 = 10.0;

// Occlusion and directionality defaults
pub const DEFAULT_OCCLUSION_FACTOR: f32 = 0.7; // 1 = walls never shorten range
pub const DEFAULT_PLAYER_OCCLUSION_FACTOR: f32 = 0.85;
pub const DEFAULT_LISTENER_DIRECTIONALITY: f32 = 0.5; // 0 = facing away costs nothing
pub const DEFAULT_SPEAKER_DIRECTIONALITY: f32 = 0.5;

// Physics categories. The participant layer is the one the host filters from scripts.
pub const ENVIRONMENT_LAYER: u32 = 0;
pub const PARTICIPANT_LAYER: u32 = 9;

// A single hit closer than this to the emitter is the emitter's own capsule.
// Independent of avatar scale.
pub const OCCLUSION_EMITTER_MARGIN: f32 = 1.0;

// Range reduction is skipped when the combined factor is this close to 1.
pub const RANGE_REDUCTION_EPSILON: f32 = 0.01;

// Tracked head positions shorter than this are treated as untracked.
pub const HEAD_POSITION_EPSILON: f32 = 0.001;
pub const DEFAULT_EYE_HEIGHT: f32 = 1.6;

// Host convention: +Z is forward, +Y is up.
pub const FORWARD: Vec3 = Vec3::Z;
pub const UP: Vec3 = Vec3::Y;
