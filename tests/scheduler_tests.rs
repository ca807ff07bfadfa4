// Frame scheduler: activation, round-robin coverage and end-to-end resolution.

use std::cell::Cell;
use std::collections::HashMap;
use std::time::Duration;

use earshot::*;
use glam::{Quat, Vec3};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Default)]
struct FakeSession {
    order: Vec<ParticipantId>,
    heads: HashMap<ParticipantId, Pose>,
    bodies: HashMap<ParticipantId, BodyPose>,
}

impl FakeSession {
    /// Participants `1..=count` spaced 2 units apart along +Z, heads tracked.
    fn line(count: u32) -> Self {
        let mut s = Self::default();
        for i in 1..=count {
            s.place(ParticipantId(i), Vec3::new(0.0, 0.0, (i - 1) as f32 * 2.0), true);
        }
        s
    }

    fn place(&mut self, id: ParticipantId, feet: Vec3, tracked: bool) {
        if !self.order.contains(&id) {
            self.order.push(id);
        }
        let body = BodyPose {
            position: feet,
            rotation: Quat::IDENTITY,
            eye_height: 1.6,
        };
        self.bodies.insert(id, body);
        if tracked {
            self.heads.insert(id, body.synthesized_head());
        } else {
            self.heads.remove(&id);
        }
    }
}

impl Session for FakeSession {
    fn live_participants(&self, out: &mut Vec<ParticipantId>) {
        out.extend_from_slice(&self.order);
    }

    fn head_pose(&self, participant: ParticipantId) -> Option<Pose> {
        self.heads.get(&participant).copied()
    }

    fn body_pose(&self, participant: ParticipantId) -> BodyPose {
        self.bodies.get(&participant).copied().unwrap_or(BodyPose {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            eye_height: 1.6,
        })
    }
}

#[derive(Default)]
struct OpenSpace {
    calls: Cell<usize>,
    last_distance: Cell<f32>,
}

impl RayQuery for OpenSpace {
    fn raycast(&self, _origin: Vec3, _dir: Vec3, max_distance: f32, _mask: LayerMask) -> RayHits {
        self.calls.set(self.calls.get() + 1);
        self.last_distance.set(max_distance);
        RayHits::new()
    }
}

#[derive(Default)]
struct RecordingSink {
    applied: Vec<(ParticipantId, EmitterSettings)>,
    reverbs: Vec<Option<ReverbSettings>>,
}

impl RecordingSink {
    fn ids(&self) -> Vec<ParticipantId> {
        self.applied.iter().map(|(p, _)| *p).collect()
    }

    fn last_for(&self, participant: ParticipantId) -> Option<&EmitterSettings> {
        self.applied
            .iter()
            .rev()
            .find(|(p, _)| *p == participant)
            .map(|(_, s)| s)
    }
}

impl AudioSink for RecordingSink {
    fn apply(&mut self, participant: ParticipantId, settings: &EmitterSettings) {
        self.applied.push((participant, settings.clone()));
    }

    fn apply_reverb(&mut self, reverb: Option<&ReverbSettings>) {
        self.reverbs.push(reverb.cloned());
    }
}

fn scheduler(local: u32, rate: usize) -> FrameScheduler {
    FrameScheduler::new(
        ParticipantId(local),
        SchedulerSettings {
            participants_per_frame: rate,
            start_delay: Duration::ZERO,
            ..SchedulerSettings::default()
        },
    )
    .with_ambient(AmbientConfig::new(AttenuationParams::unattenuated()))
}

#[test]
fn stays_idle_until_start_delay_elapses() {
    let session = FakeSession::line(3);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = FrameScheduler::new(
        ParticipantId(1),
        SchedulerSettings {
            participants_per_frame: 0,
            start_delay: Duration::from_millis(40),
            ..SchedulerSettings::default()
        },
    )
    .with_ambient(AmbientConfig::new(AttenuationParams::unattenuated()));

    s.tick(FRAME, &session, &physics, &mut sink);
    s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(s.state(), SchedulerState::Idle);
    assert!(sink.applied.is_empty());

    let stats = s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(s.state(), SchedulerState::Active);
    assert_eq!(stats.applied, 2);
}

#[test]
fn missing_configuration_keeps_scheduler_idle() {
    let session = FakeSession::line(3);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = FrameScheduler::new(
        ParticipantId(1),
        SchedulerSettings {
            start_delay: Duration::ZERO,
            ..SchedulerSettings::default()
        },
    );
    for _ in 0..5 {
        assert_eq!(s.tick(FRAME, &session, &physics, &mut sink), FrameStats::default());
    }
    assert_eq!(s.state(), SchedulerState::Idle);
    assert!(sink.applied.is_empty());

    s.set_ambient(AmbientConfig::default());
    s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(s.state(), SchedulerState::Active);
}

#[test]
fn round_robin_covers_everyone_once_per_sweep() {
    let count = 5;
    let session = FakeSession::line(count);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 1);

    for sweep in 0..3 {
        sink.applied.clear();
        for _ in 0..count {
            let stats = s.tick(FRAME, &session, &physics, &mut sink);
            assert_eq!(stats.visited, 1);
        }
        let mut ids = sink.ids();
        let visited_in_order = ids.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(visited_in_order.len(), ids.len(), "repeat within sweep {sweep}");
        assert_eq!(
            ids,
            (2..=count).map(ParticipantId).collect::<Vec<_>>(),
            "sweep {sweep} missed someone"
        );
    }
}

#[test]
fn zero_rate_visits_everyone_every_frame() {
    let session = FakeSession::line(6);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(3, 0);
    let stats = s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(stats.visited, 6);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.applied, 5);
}

#[test]
fn rate_is_clamped_to_participant_count() {
    let session = FakeSession::line(3);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 50);
    let stats = s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(stats.visited, 3);
    assert_eq!(sink.applied.len(), 2);
}

#[test]
fn lone_participant_does_no_pairwise_work() {
    let session = FakeSession::line(1);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    let stats = s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(stats.visited, 0);
    assert!(sink.applied.is_empty());
    assert_eq!(physics.calls.get(), 0);
}

#[test]
fn ignored_participants_are_skipped_entirely() {
    let session = FakeSession::line(4);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    s.ignored_mut().insert(ParticipantId(3));
    let stats = s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(stats.skipped, 2);
    assert_eq!(sink.ids(), [ParticipantId(2), ParticipantId(4)]);
}

#[test]
fn two_participants_without_overrides_are_unattenuated() {
    let mut session = FakeSession::default();
    session.place(ParticipantId(1), Vec3::ZERO, true);
    session.place(ParticipantId(2), Vec3::new(0.0, 0.0, 10.0), true);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();

    let ambient = AttenuationParams {
        voice_distance_far: 25.0,
        ..AttenuationParams::unattenuated()
    };
    let mut s = scheduler(1, 0);
    s.set_ambient(AmbientConfig::new(ambient.clone()));
    s.tick(FRAME, &session, &physics, &mut sink);

    let settings = sink.last_for(ParticipantId(2)).expect("settings");
    assert_eq!(settings.voice_gain, ambient.voice_gain);
    assert_eq!(settings.voice_distance_far, 25.0);
    assert_eq!(settings.avatar_far, ambient.avatar_far_radius);
    assert_eq!(settings.avatar_gain, ambient.avatar_gain);
    assert_eq!(physics.calls.get(), 0);
}

#[test]
fn occlusion_query_spans_head_to_head_with_body_fallback() {
    let mut session = FakeSession::default();
    session.place(ParticipantId(1), Vec3::ZERO, true);
    // Speaker has no head tracking; its head is synthesized from the body.
    session.place(ParticipantId(2), Vec3::new(0.0, 0.0, 10.0), false);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    s.set_ambient(AmbientConfig::new(AttenuationParams {
        listener_directionality: 0.0,
        speaker_directionality: 0.0,
        ..AttenuationParams::default()
    }));
    s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(physics.calls.get(), 1);
    assert!((physics.last_distance.get() - 10.0).abs() < 1e-4);
}

#[test]
fn remote_override_parameters_replace_ambient() {
    let session = FakeSession::line(2);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    let stage = OverrideHandle::new(Override::new(
        "stage",
        5,
        AttenuationParams {
            voice_gain: 22.0,
            voice_distance_far: 60.0,
            ..AttenuationParams::unattenuated()
        },
    ));
    assert!(s.directory_mut().add_participant(&stage, ParticipantId(2)));
    s.tick(FRAME, &session, &physics, &mut sink);
    let settings = sink.last_for(ParticipantId(2)).expect("settings");
    assert_eq!(settings.voice_gain, 22.0);
    assert_eq!(settings.voice_distance_far, 60.0);

    // Once the owner drops the Override, ambient applies again.
    drop(stage);
    s.tick(FRAME, &session, &physics, &mut sink);
    let settings = sink.last_for(ParticipantId(2)).expect("settings");
    assert_eq!(settings.voice_distance_far, DEFAULT_VOICE_DISTANCE_FAR);
}

#[test]
fn privacy_mutes_outsiders_with_explicit_update() {
    let session = FakeSession::line(3);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    let booth = OverrideHandle::new(
        Override::new("booth", 1, AttenuationParams::unattenuated())
            .with_privacy_channel(7)
            .with_mute_outsiders(true),
    );
    s.directory_mut().add_participant(&booth, ParticipantId(1));
    s.directory_mut().add_participant(&booth, ParticipantId(3));

    let stats = s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(stats.applied, 2);
    assert_eq!(stats.muted, 1);
    assert_eq!(sink.last_for(ParticipantId(2)), Some(&EmitterSettings::muted()));
    assert!(!sink.last_for(ParticipantId(3)).expect("booth mate").is_muted());
}

#[test]
fn channel_members_are_inaudible_to_the_public() {
    let session = FakeSession::line(2);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    let booth = OverrideHandle::new(
        Override::new("booth", 1, AttenuationParams::unattenuated()).with_privacy_channel(7),
    );
    s.directory_mut().add_participant(&booth, ParticipantId(2));
    s.tick(FRAME, &session, &physics, &mut sink);
    assert!(sink.last_for(ParticipantId(2)).expect("update").is_muted());
}

#[test]
fn reverb_is_pushed_only_when_local_override_changes() {
    let session = FakeSession::line(2);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    let hall = OverrideHandle::new(
        Override::new("hall", 1, AttenuationParams::unattenuated())
            .with_reverb(ReverbSettings::default()),
    );

    s.tick(FRAME, &session, &physics, &mut sink);
    assert!(sink.reverbs.is_empty());

    s.directory_mut().add_participant(&hall, ParticipantId(1));
    let stats = s.tick(FRAME, &session, &physics, &mut sink);
    assert!(stats.local_override_changed);
    for _ in 0..3 {
        s.tick(FRAME, &session, &physics, &mut sink);
    }
    assert_eq!(sink.reverbs, vec![Some(ReverbSettings::default())]);

    s.directory_mut().remove_participant(&hall, ParticipantId(1));
    s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(sink.reverbs, vec![Some(ReverbSettings::default()), None]);
}

#[test]
fn dropped_local_override_counts_as_change() {
    let session = FakeSession::line(2);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    let hall = OverrideHandle::new(
        Override::new("hall", 1, AttenuationParams::unattenuated())
            .with_reverb(ReverbSettings::default()),
    );
    s.directory_mut().add_participant(&hall, ParticipantId(1));
    s.tick(FRAME, &session, &physics, &mut sink);
    drop(hall);
    s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(sink.reverbs.len(), 2);
    assert_eq!(sink.reverbs[1], None);
}

#[test]
fn disable_stops_processing_and_enable_rearms_delay() {
    let session = FakeSession::line(2);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = FrameScheduler::new(
        ParticipantId(1),
        SchedulerSettings {
            participants_per_frame: 0,
            start_delay: Duration::from_millis(20),
            ..SchedulerSettings::default()
        },
    )
    .with_ambient(AmbientConfig::default());

    s.tick(FRAME, &session, &physics, &mut sink);
    s.disable();
    for _ in 0..5 {
        s.tick(FRAME, &session, &physics, &mut sink);
    }
    assert_eq!(s.state(), SchedulerState::Disabled);
    assert!(sink.applied.is_empty());

    s.enable();
    assert_eq!(s.state(), SchedulerState::Idle);
    s.tick(FRAME, &session, &physics, &mut sink);
    assert!(sink.applied.is_empty());
    s.tick(FRAME, &session, &physics, &mut sink);
    assert_eq!(s.state(), SchedulerState::Active);
    assert_eq!(sink.applied.len(), 1);
}

#[test]
fn cursor_survives_participant_count_changes() {
    let mut session = FakeSession::line(6);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 2);
    for _ in 0..2 {
        s.tick(FRAME, &session, &physics, &mut sink);
    }
    session.order.truncate(3);
    for _ in 0..3 {
        let stats = s.tick(FRAME, &session, &physics, &mut sink);
        assert_eq!(stats.visited, 2);
    }
    assert!(sink
        .ids()
        .iter()
        .all(|p| p.0 >= 2 && p.0 <= 6));
}

#[test]
fn sweeps_release_slots_of_dropped_overrides() {
    let session = FakeSession::line(4);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    let zone = OverrideHandle::new(Override::new("zone", 1, AttenuationParams::unattenuated()));
    for id in 2..=4 {
        s.directory_mut().add_participant(&zone, ParticipantId(id));
    }
    assert_eq!(s.directory().index().len(), 3);

    drop(zone);
    for _ in 0..5 {
        s.tick(FRAME, &session, &physics, &mut sink);
    }
    assert!(s.directory().index().is_empty());
}

#[test]
fn ambient_changes_are_reported_once() {
    let session = FakeSession::line(2);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);

    assert!(s.tick(FRAME, &session, &physics, &mut sink).ambient_changed);
    assert!(!s.tick(FRAME, &session, &physics, &mut sink).ambient_changed);

    s.ambient_mut().expect("ambient").set_local(AttenuationParams {
        voice_distance_far: 8.0,
        ..AttenuationParams::unattenuated()
    });
    let stats = s.tick(FRAME, &session, &physics, &mut sink);
    assert!(stats.ambient_changed);
    assert_eq!(
        sink.last_for(ParticipantId(2)).expect("settings").voice_distance_far,
        8.0
    );
    assert!(!s.tick(FRAME, &session, &physics, &mut sink).ambient_changed);
}

#[test]
fn override_gains_are_held_to_host_limits() {
    let session = FakeSession::line(2);
    let physics = OpenSpace::default();
    let mut sink = RecordingSink::default();
    let mut s = scheduler(1, 0);
    let loud = OverrideHandle::new(Override::new("loud", 1, AttenuationParams::unattenuated()));
    loud.borrow_mut().params.voice_gain = 100.0;
    loud.borrow_mut().params.avatar_gain = -4.0;
    s.directory_mut().add_participant(&loud, ParticipantId(2));

    s.tick(FRAME, &session, &physics, &mut sink);
    let settings = sink.last_for(ParticipantId(2)).expect("settings");
    assert_eq!(settings.voice_gain, MAX_VOICE_GAIN);
    assert_eq!(settings.avatar_gain, 0.0);
}
