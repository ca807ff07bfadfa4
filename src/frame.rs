//! Per-frame scheduler.
//!
//! Once active, each `tick` refreshes the local participant's Override
//! (pushing reverb only when it changes), then visits a bounded number of
//! participants round-robin and forwards their resolved emitter settings to
//! the audio sink. Every participant is reached within
//! `ceil(count / participants_per_frame)` frames.

use std::time::Duration;

use earshot_core::{
    attenuate, resolve_audibility, resolve_head_pose, Audibility, AttenuationParams,
    EngineError, IgnoreSet, ListenerPrivacy, OverrideDirectory, OverrideHandle, OverrideRef,
    ParticipantId, Pose, RayQuery,
};
use log::{debug, error, info};

use crate::audio::{AudioSink, EmitterSettings};
use crate::config::{AmbientConfig, SchedulerSettings};
use crate::constants::PARTICIPANT_BUFFER_CAPACITY;
use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the start delay or for ambient configuration.
    Idle,
    Active,
    /// Torn down; ticks are no-ops until re-enabled.
    Disabled,
}

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub visited: usize,
    pub applied: usize,
    pub muted: usize,
    /// Self and ignored participants.
    pub skipped: usize,
    pub local_override_changed: bool,
    /// The active ambient bundle changed since the previous active tick.
    pub ambient_changed: bool,
}

pub struct FrameScheduler {
    settings: SchedulerSettings,
    directory: OverrideDirectory,
    ignored: IgnoreSet,
    ambient: Option<AmbientConfig>,
    state: SchedulerState,
    since_start: Duration,
    missing_config_reported: bool,
    cursor: usize,
    participants: Vec<ParticipantId>,
    local_active: Option<OverrideRef>,
}

impl FrameScheduler {
    pub fn new(local_id: ParticipantId, settings: SchedulerSettings) -> Self {
        Self {
            settings,
            directory: OverrideDirectory::new(local_id),
            ignored: IgnoreSet::new(),
            ambient: None,
            state: SchedulerState::Idle,
            since_start: Duration::ZERO,
            missing_config_reported: false,
            cursor: 0,
            participants: Vec::with_capacity(PARTICIPANT_BUFFER_CAPACITY),
            local_active: None,
        }
    }

    pub fn with_ambient(mut self, ambient: AmbientConfig) -> Self {
        self.set_ambient(ambient);
        self
    }

    pub fn set_ambient(&mut self, ambient: AmbientConfig) {
        self.ambient = Some(ambient);
    }

    pub fn ambient(&self) -> Option<&AmbientConfig> {
        self.ambient.as_ref()
    }

    pub fn ambient_mut(&mut self) -> Option<&mut AmbientConfig> {
        self.ambient.as_mut()
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn set_participants_per_frame(&mut self, rate: usize) {
        self.settings.participants_per_frame = rate;
    }

    pub fn directory(&self) -> &OverrideDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut OverrideDirectory {
        &mut self.directory
    }

    pub fn ignored(&self) -> &IgnoreSet {
        &self.ignored
    }

    pub fn ignored_mut(&mut self) -> &mut IgnoreSet {
        &mut self.ignored
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn local_id(&self) -> ParticipantId {
        self.directory.local_id()
    }

    /// Participants seen on the last active tick.
    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    /// Stop processing. A start delay still pending never fires afterwards.
    pub fn disable(&mut self) {
        if self.state != SchedulerState::Disabled {
            info!("[scheduler] disabled");
        }
        self.state = SchedulerState::Disabled;
    }

    /// Re-arm after `disable`; the start delay runs again.
    pub fn enable(&mut self) {
        if self.state == SchedulerState::Disabled {
            self.state = SchedulerState::Idle;
            self.since_start = Duration::ZERO;
            self.missing_config_reported = false;
            self.local_active = None;
        }
    }

    /// Advance by `dt` and run one frame if active.
    pub fn tick<S, P, A>(&mut self, dt: Duration, session: &S, physics: &P, sink: &mut A) -> FrameStats
    where
        S: Session + ?Sized,
        P: RayQuery + ?Sized,
        A: AudioSink + ?Sized,
    {
        match self.state {
            SchedulerState::Disabled => return FrameStats::default(),
            SchedulerState::Idle => {
                self.since_start = self.since_start.saturating_add(dt);
                if self.since_start < self.settings.start_delay || !self.try_activate() {
                    return FrameStats::default();
                }
            }
            SchedulerState::Active => {}
        }
        self.run_frame(session, physics, sink)
    }

    fn try_activate(&mut self) -> bool {
        if self.ambient.is_none() {
            if !self.missing_config_reported {
                error!(
                    "[scheduler] {}",
                    EngineError::ConfigurationMissing("no ambient attenuation parameters")
                );
                self.missing_config_reported = true;
            }
            return false;
        }
        info!(
            "[scheduler] active after {:.2}s, local={}",
            self.since_start.as_secs_f32(),
            self.directory.local_id()
        );
        self.state = SchedulerState::Active;
        true
    }

    fn run_frame<S, P, A>(&mut self, session: &S, physics: &P, sink: &mut A) -> FrameStats
    where
        S: Session + ?Sized,
        P: RayQuery + ?Sized,
        A: AudioSink + ?Sized,
    {
        let mut stats = FrameStats::default();
        let local_id = self.directory.local_id();

        let local_active = self.refresh_local_override(sink, &mut stats);
        let privacy = match &local_active {
            Some(handle) => ListenerPrivacy::from_override(Some(&*handle.borrow())),
            None => ListenerPrivacy::default(),
        };

        if let Some(ambient) = self.ambient.as_mut() {
            if ambient.take_dirty() {
                info!("[scheduler] ambient configuration changed ({:?})", ambient.mode());
                stats.ambient_changed = true;
            }
        }

        self.participants.clear();
        session.live_participants(&mut self.participants);
        let count = self.participants.len();
        if count < 2 {
            return stats;
        }

        let visits = match self.settings.participants_per_frame {
            0 => count,
            rate => rate.clamp(1, count),
        };

        let Some(ambient) = self.ambient.as_ref() else {
            return stats;
        };
        let ambient = ambient.active();

        let listener = resolve_head_pose(session.head_pose(local_id), &session.body_pose(local_id));
        let margin = self.settings.occlusion_margin;

        for _ in 0..visits {
            self.cursor = (self.cursor + 1) % count;
            let participant = self.participants[self.cursor];
            stats.visited += 1;

            if participant == local_id || self.ignored.contains(participant) {
                stats.skipped += 1;
                continue;
            }

            let settings = resolve_emitter(
                &mut self.directory,
                participant,
                &listener,
                &privacy,
                ambient,
                margin,
                session,
                physics,
            );
            if settings.is_muted() {
                stats.muted += 1;
            }
            sink.apply(participant, &settings);
            stats.applied += 1;
        }
        stats
    }

    /// Resolve the local Override and push reverb when its identity changed.
    fn refresh_local_override<A: AudioSink + ?Sized>(
        &mut self,
        sink: &mut A,
        stats: &mut FrameStats,
    ) -> Option<OverrideHandle> {
        let current = self.directory.resolve_local();
        let changed = match (&self.local_active, &current) {
            (None, None) => false,
            (Some(prev), Some(cur)) => !cur.refers_to(prev),
            _ => true,
        };
        if changed {
            match &current {
                Some(handle) => {
                    let ov = handle.borrow();
                    info!("[scheduler] local override -> {:?} (priority {})", ov.name, ov.priority());
                    sink.apply_reverb(ov.reverb.as_ref());
                }
                None => {
                    info!("[scheduler] local override cleared");
                    sink.apply_reverb(None);
                }
            }
            self.local_active = current.as_ref().map(OverrideHandle::downgrade);
            stats.local_override_changed = true;
        }
        current
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_emitter<S, P>(
    directory: &mut OverrideDirectory,
    participant: ParticipantId,
    listener: &Pose,
    privacy: &ListenerPrivacy,
    ambient: &AttenuationParams,
    margin: f32,
    session: &S,
    physics: &P,
) -> EmitterSettings
where
    S: Session + ?Sized,
    P: RayQuery + ?Sized,
{
    let other = directory.resolve(participant, directory.local_id());
    let other_ov = other.as_ref().map(OverrideHandle::borrow);

    let params = match resolve_audibility(other_ov.as_deref(), privacy) {
        Audibility::Muted => {
            debug!("[scheduler] {participant} muted by privacy rules");
            return EmitterSettings::muted();
        }
        Audibility::Override => match other_ov.as_deref() {
            Some(ov) => &ov.params,
            None => ambient,
        },
        Audibility::Ambient => ambient,
    };

    let body = session.body_pose(participant);
    let speaker = resolve_head_pose(session.head_pose(participant), &body);
    let attenuation = attenuate(physics, listener, &speaker, body.eye_height, params, margin);
    debug!(
        "[scheduler] {participant} d={:.2} occ={:.2} dir={:.2} voice={:.2} avatar={:.2}",
        attenuation.distance,
        attenuation.occlusion,
        attenuation.directionality,
        attenuation.voice_range,
        attenuation.avatar_range
    );
    EmitterSettings::from_params(params, &attenuation)
}
