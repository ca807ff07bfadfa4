//! Simulated session: participants walking circles around pillars.

use earshot::{
    AudioSink, BodyPose, EmitterSettings, HitKind, LayerMask, ParticipantId, Pose, RayHit,
    RayHits, RayQuery, ReverbSettings, Session, DEFAULT_EYE_HEIGHT, ENVIRONMENT_LAYER,
    PARTICIPANT_LAYER,
};
use fnv::FnvHashMap;
use glam::{Quat, Vec3};
use rand::prelude::*;
use smallvec::SmallVec;

const CAPSULE_RADIUS: f32 = 0.35;

#[derive(Clone, Debug)]
struct Walker {
    center: Vec3,
    radius: f32,
    angular_speed: f32, // radians per second
    phase: f32,
    eye_height: f32,
    head_tracked: bool,
}

impl Walker {
    fn position(&self, t: f32) -> Vec3 {
        let a = self.phase + self.angular_speed * t;
        self.center + Vec3::new(a.cos(), 0.0, a.sin()) * self.radius
    }

    fn rotation(&self, t: f32) -> Quat {
        // Face along the direction of travel.
        let a = self.phase + self.angular_speed * t;
        let tangent = Vec3::new(-a.sin(), 0.0, a.cos()) * self.angular_speed.signum();
        Quat::from_rotation_arc(Vec3::Z, tangent.normalize_or_zero())
    }
}

pub struct SimWorld {
    walkers: FnvHashMap<ParticipantId, Walker>,
    order: Vec<ParticipantId>,
    pillars: Vec<(Vec3, f32)>,
    time_sec: f32,
}

impl SimWorld {
    pub fn new(participants: u32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut walkers = FnvHashMap::default();
        let mut order = Vec::new();
        for i in 0..participants {
            let id = ParticipantId(i + 1);
            let walker = Walker {
                center: Vec3::new(rng.gen_range(-12.0..12.0), 0.0, rng.gen_range(-12.0..12.0)),
                radius: rng.gen_range(2.0..8.0),
                angular_speed: rng.gen_range(-0.6..0.6),
                phase: rng.gen_range(0.0..std::f32::consts::TAU),
                eye_height: DEFAULT_EYE_HEIGHT * rng.gen_range(0.6..1.4),
                head_tracked: rng.gen_bool(0.5),
            };
            walkers.insert(id, walker);
            order.push(id);
        }
        let pillars = (0..6)
            .map(|_| {
                (
                    Vec3::new(rng.gen_range(-10.0..10.0), 1.0, rng.gen_range(-10.0..10.0)),
                    rng.gen_range(0.5..1.5),
                )
            })
            .collect();
        Self {
            walkers,
            order,
            pillars,
            time_sec: 0.0,
        }
    }

    pub fn advance(&mut self, dt_sec: f32) {
        self.time_sec += dt_sec;
    }

    pub fn position_of(&self, participant: ParticipantId) -> Option<Vec3> {
        self.walkers.get(&participant).map(|w| w.position(self.time_sec))
    }

    /// Remove a participant, as if they disconnected.
    pub fn disconnect(&mut self, participant: ParticipantId) -> bool {
        self.order.retain(|p| *p != participant);
        self.walkers.remove(&participant).is_some()
    }
}

impl Session for SimWorld {
    fn live_participants(&self, out: &mut Vec<ParticipantId>) {
        out.extend_from_slice(&self.order);
    }

    fn head_pose(&self, participant: ParticipantId) -> Option<Pose> {
        let walker = self.walkers.get(&participant)?;
        walker.head_tracked.then(|| {
            Pose::new(
                walker.position(self.time_sec) + Vec3::Y * walker.eye_height,
                walker.rotation(self.time_sec),
            )
        })
    }

    fn body_pose(&self, participant: ParticipantId) -> BodyPose {
        match self.walkers.get(&participant) {
            Some(walker) => BodyPose {
                position: walker.position(self.time_sec),
                rotation: walker.rotation(self.time_sec),
                eye_height: walker.eye_height,
            },
            None => BodyPose {
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                eye_height: DEFAULT_EYE_HEIGHT,
            },
        }
    }
}

impl RayQuery for SimWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> RayHits {
        let mut hits: SmallVec<[RayHit; 8]> = SmallVec::new();
        if mask.contains_layer(ENVIRONMENT_LAYER) {
            for &(center, radius) in &self.pillars {
                if let Some(t) = ray_sphere(origin, direction, center, radius) {
                    hits.push(RayHit {
                        distance: t,
                        kind: HitKind::Environment,
                    });
                }
            }
        }
        if mask.contains_layer(PARTICIPANT_LAYER) {
            for walker in self.walkers.values() {
                let chest = walker.position(self.time_sec) + Vec3::Y * (walker.eye_height * 0.6);
                if let Some(t) = ray_sphere(origin, direction, chest, CAPSULE_RADIUS) {
                    hits.push(RayHit {
                        distance: t,
                        kind: HitKind::FilteredParticipant,
                    });
                }
            }
        }
        hits.retain(|h| h.distance <= max_distance);
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.into_iter().take(2).collect()
    }
}

#[inline]
fn ray_sphere(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Sink that remembers the last settings per participant.
#[derive(Default)]
pub struct RecordingSink {
    pub latest: FnvHashMap<ParticipantId, EmitterSettings>,
    pub applied: usize,
    pub reverb_changes: usize,
    pub reverb: Option<ReverbSettings>,
}

impl AudioSink for RecordingSink {
    fn apply(&mut self, participant: ParticipantId, settings: &EmitterSettings) {
        log::trace!("[sink] {participant} -> far={:.2}", settings.voice_distance_far);
        self.latest.insert(participant, settings.clone());
        self.applied += 1;
    }

    fn apply_reverb(&mut self, reverb: Option<&ReverbSettings>) {
        self.reverb = reverb.cloned();
        self.reverb_changes += 1;
    }
}
