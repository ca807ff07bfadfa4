//! Per-frame spatial voice resolution for shared real-time sessions.
//!
//! The host owns the frame loop and calls [`FrameScheduler::tick`] once per
//! frame with its session, physics and audio sink. Authoring components
//! (zones, doors, toggles) attach Overrides through the scheduler's
//! [`OverrideDirectory`].

pub mod audio;
pub mod config;
pub mod constants;
pub mod events;
pub mod frame;
pub mod session;

pub use audio::*;
pub use config::*;
pub use earshot_core::*;
pub use events::*;
pub use frame::*;
pub use session::*;
