use std::time::Duration;

use anyhow::Context;
use earshot::{
    AmbientConfig, AttenuationParams, ConfigMode, FrameScheduler, HeightCurve, ListenerBlacklist,
    Override, OverrideZone, ParticipantId, ReverbSettings, SchedulerSettings, SchedulerState,
    ZoneEvent,
};
use glam::Vec3;

mod world;

use world::{RecordingSink, SimWorld};

const PARTICIPANTS: u32 = 12;
const FRAMES: usize = 1200;
const FRAME_DT: Duration = Duration::from_micros(16_667);
const SEED: u64 = 42;

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let mut world = SimWorld::new(PARTICIPANTS, SEED);
    let local_id = ParticipantId(1);

    let mut ambient = AmbientConfig::new(AttenuationParams {
        height_to_range_curve: HeightCurve::from_keys(&[(0.8, 0.7), (1.6, 1.0), (2.6, 1.4)]),
        ..AttenuationParams::default()
    });
    // Pretend the session owner pushed a quieter bundle.
    ambient.set_master(AttenuationParams {
        voice_distance_far: 20.0,
        ..AttenuationParams::default()
    });
    ambient.set_mode(ConfigMode::Master);

    let mut scheduler = FrameScheduler::new(
        local_id,
        SchedulerSettings {
            participants_per_frame: 3,
            start_delay: Duration::from_millis(500),
            ..SchedulerSettings::default()
        },
    )
    .with_ambient(ambient);

    let mut zones = vec![
        OverrideZone::new(
            Vec3::new(0.0, 0.0, 0.0),
            6.0,
            Override::new(
                "stage",
                10,
                AttenuationParams {
                    voice_gain: 20.0,
                    voice_distance_far: 60.0,
                    occlusion_factor: 1.0,
                    player_occlusion_factor: 1.0,
                    ..AttenuationParams::default()
                },
            )
            .with_reverb(ReverbSettings {
                decay_time_sec: 2.8,
                room_level: 0.5,
                ..ReverbSettings::default()
            })
            .with_blacklist(ListenerBlacklist::with([ParticipantId(PARTICIPANTS)])),
        ),
        OverrideZone::new(
            Vec3::new(8.0, 0.0, -8.0),
            4.0,
            Override::new("booth", 20, AttenuationParams::default())
                .with_privacy_channel(7)
                .with_mute_outsiders(true),
        ),
    ];

    let mut sink = RecordingSink::default();
    let mut zone_events = Vec::new();
    let mut totals = (0usize, 0usize);

    for frame in 0..FRAMES {
        world.advance(FRAME_DT.as_secs_f32());

        zone_events.clear();
        for zone in &mut zones {
            zone.update(&world, scheduler.directory_mut(), &mut zone_events);
        }
        for ev in &zone_events {
            match ev {
                ZoneEvent::Entered(p) => log::debug!("[sim] frame {frame}: {p} entered a zone"),
                ZoneEvent::Exited(p) => log::debug!("[sim] frame {frame}: {p} left a zone"),
            }
        }

        // Someone drops out halfway through.
        if frame == FRAMES / 2 {
            let leaving = ParticipantId(PARTICIPANTS / 2);
            if world.disconnect(leaving) {
                scheduler.directory_mut().participant_left(leaving);
                sink.latest.remove(&leaving);
                log::info!("[sim] {leaving} disconnected");
            }
        }

        let stats = scheduler.tick(FRAME_DT, &world, &world, &mut sink);
        totals.0 += stats.applied;
        totals.1 += stats.muted;

        if frame % 120 == 0 && scheduler.state() == SchedulerState::Active {
            let position = world
                .position_of(local_id)
                .context("local participant missing from simulation")?;
            log::info!(
                "[sim] frame {frame}: local at ({:.1}, {:.1}) tracking {} slot(s), {} emitter(s) known",
                position.x,
                position.z,
                scheduler.directory().index().len(),
                sink.latest.len()
            );
        }
    }

    for zone in &mut zones {
        zone.teardown(scheduler.directory_mut());
    }
    scheduler.disable();

    anyhow::ensure!(
        sink.applied == totals.0,
        "sink saw {} updates but scheduler reported {}",
        sink.applied,
        totals.0
    );
    log::info!(
        "[sim] done: {} updates ({} muted), {} reverb change(s), {} slot(s) left",
        totals.0,
        totals.1,
        sink.reverb_changes,
        scheduler.directory().index().len()
    );
    Ok(())
}
