//! Ambient attenuation configuration and scheduler settings.
//!
//! The ambient bundle applies to every emitter without an Override. It
//! exists in two copies: one edited locally and one pushed by whoever holds
//! authority over the session. Replication itself happens elsewhere; this
//! type only records what arrived and which copy is active.

use std::time::Duration;

use earshot_core::{AttenuationParams, OCCLUSION_EMITTER_MARGIN};
use log::{info, warn};

use crate::constants::{DEFAULT_PARTICIPANTS_PER_FRAME, DEFAULT_START_DELAY};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigMode {
    #[default]
    Local,
    /// Follow the replicated master bundle once one has arrived.
    Master,
}

#[derive(Clone, Debug, Default)]
pub struct AmbientConfig {
    local: AttenuationParams,
    master: Option<AttenuationParams>,
    mode: ConfigMode,
    dirty: bool,
}

impl AmbientConfig {
    pub fn new(local: AttenuationParams) -> Self {
        Self {
            local: sanitize("local", local),
            master: None,
            mode: ConfigMode::Local,
            dirty: true,
        }
    }

    /// Bundle currently in effect. Master mode falls back to the local
    /// bundle until a master bundle has been received.
    pub fn active(&self) -> &AttenuationParams {
        match (self.mode, &self.master) {
            (ConfigMode::Master, Some(master)) => master,
            _ => &self.local,
        }
    }

    pub fn mode(&self) -> ConfigMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ConfigMode) {
        if self.mode != mode {
            info!("[config] ambient mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            self.dirty = true;
        }
    }

    pub fn set_local(&mut self, params: AttenuationParams) {
        self.local = sanitize("local", params);
        self.dirty = true;
    }

    /// Store a replicated master bundle.
    pub fn set_master(&mut self, params: AttenuationParams) {
        self.master = Some(sanitize("master", params));
        if self.mode == ConfigMode::Master {
            self.dirty = true;
        }
    }

    pub fn has_master(&self) -> bool {
        self.master.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the change flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

fn sanitize(which: &str, params: AttenuationParams) -> AttenuationParams {
    let clean = params.sanitized();
    if clean != params {
        warn!("[config] {which} ambient parameters out of range, clamped");
    }
    clean
}

/// Scheduler tuning.
#[derive(Clone, Debug)]
pub struct SchedulerSettings {
    /// Participants visited per frame; 0 visits everyone every frame.
    pub participants_per_frame: usize,
    pub start_delay: Duration,
    /// A single occlusion hit this close to the emitter is ignored.
    pub occlusion_margin: f32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            participants_per_frame: DEFAULT_PARTICIPANTS_PER_FRAME,
            start_delay: DEFAULT_START_DELAY,
            occlusion_margin: OCCLUSION_EMITTER_MARGIN,
        }
    }
}
