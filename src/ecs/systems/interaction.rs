use std::collections::BTreeMap;

use glam::Vec2;

use crate::config::{Bounds, RanchConfig};
use crate::ecs::components::{
    end_interaction, start_interaction, Body, CurrentInteraction, InteractionKind, PetId,
    PetState, Position, Velocity,
};
use crate::ecs::systems::movement::clamp_to_bounds;
use crate::ecs::systems::steering::{cap_speed, flee, seek};
use crate::spatial::{PetSnapshot, SpatialGrid};

// ---------------------------------------------------------------------------
// Pair bookkeeping
// ---------------------------------------------------------------------------

/// Order-independent key for an unordered pair of pets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(PetId, PetId);

impl PairKey {
    pub fn new(a: PetId, b: PetId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn low(&self) -> PetId {
        self.0
    }

    pub fn high(&self) -> PetId {
        self.1
    }

    pub fn contains(&self, id: PetId) -> bool {
        self.0 == id || self.1 == id
    }

    /// The other half of the pair, if `id` is in it.
    pub fn partner_of(&self, id: PetId) -> Option<PetId> {
        if self.0 == id {
            Some(self.1)
        } else if self.1 == id {
            Some(self.0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub id: PetId,
    pub entity: hecs::Entity,
}

/// A running interaction between two pets.
#[derive(Debug, Clone, Copy)]
pub struct ActiveInteraction {
    pub kind: InteractionKind,
    /// The pet that noticed the other. Follow makes it the follower.
    pub first: Member,
    pub second: Member,
    /// Coordinator clock (ms) at creation.
    pub start_time: f64,
    pub duration_ms: f64,
}

impl ActiveInteraction {
    pub fn pair(&self) -> PairKey {
        PairKey::new(self.first.id, self.second.id)
    }

    pub fn elapsed_ms(&self, clock_ms: f64) -> f64 {
        clock_ms - self.start_time
    }
}

/// Read-only view for effect overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionView {
    pub pair: PairKey,
    pub kind: InteractionKind,
    pub elapsed_ms: f64,
    pub duration_ms: f64,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owns the active-interaction registry and the logical clock that times it.
///
/// Every pet in the registry carries `PetState::Interacting` and a
/// `CurrentInteraction` component; nothing else does.
#[derive(Debug, Default)]
pub struct InteractionCoordinator {
    active: BTreeMap<PairKey, ActiveInteraction>,
    /// Milliseconds of simulated time, advanced by dt.
    clock_ms: f64,
    /// Scratch buffers, reused each tick.
    expired: Vec<PairKey>,
    candidates: Vec<usize>,
}

impl InteractionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn get(&self, pair: PairKey) -> Option<&ActiveInteraction> {
        self.active.get(&pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveInteraction> {
        self.active.values()
    }

    /// The interaction `id` belongs to, if any.
    pub fn find(&self, id: PetId) -> Option<&ActiveInteraction> {
        self.active.iter().find(|(k, _)| k.contains(id)).map(|(_, a)| a)
    }

    pub fn views(&self) -> Vec<InteractionView> {
        self.active
            .iter()
            .map(|(pair, a)| InteractionView {
                pair: *pair,
                kind: a.kind,
                elapsed_ms: a.elapsed_ms(self.clock_ms),
                duration_ms: a.duration_ms,
            })
            .collect()
    }

    /// One coordinator pass: advance the clock, run or retire active
    /// interactions, then roll for new ones among nearby free pets.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        world: &mut hecs::World,
        snapshots: &mut [PetSnapshot],
        grid: &SpatialGrid,
        dt: f32,
        bounds: Bounds,
        config: &RanchConfig,
        rng: &mut fastrand::Rng,
    ) {
        self.clock_ms += dt as f64 * 1000.0;

        self.update_active(world, dt, bounds, config, rng);
        self.check_for_new(world, snapshots, grid, dt, config, rng);
    }

    fn update_active(
        &mut self,
        world: &mut hecs::World,
        dt: f32,
        bounds: Bounds,
        config: &RanchConfig,
        rng: &mut fastrand::Rng,
    ) {
        self.expired.clear();

        for (key, interaction) in &self.active {
            if interaction.elapsed_ms(self.clock_ms) >= interaction.duration_ms {
                self.expired.push(*key);
                continue;
            }
            if !execute(world, interaction, self.clock_ms, dt, bounds, config, rng) {
                // A member vanished from the world without going through remove_pet
                self.expired.push(*key);
            }
        }

        for key in self.expired.drain(..) {
            if let Some(interaction) = self.active.remove(&key) {
                release(world, interaction.first, config);
                release(world, interaction.second, config);
                log::debug!(
                    "{} between {} and {} ended",
                    interaction.kind.label(),
                    interaction.first.id,
                    interaction.second.id
                );
            }
        }
    }

    fn check_for_new(
        &mut self,
        world: &mut hecs::World,
        snapshots: &mut [PetSnapshot],
        grid: &SpatialGrid,
        dt: f32,
        config: &RanchConfig,
        rng: &mut fastrand::Rng,
    ) {
        let radius_sq = config.interaction_radius * config.interaction_radius;
        let chance = config.trigger.probability(dt);
        let count = snapshots.len();
        let mut candidates = std::mem::take(&mut self.candidates);

        for my_idx in 0..count {
            if !snapshots[my_idx].available {
                continue;
            }

            candidates.clear();
            grid.query_neighbors(snapshots[my_idx].pos, |ni| {
                let ni = ni as usize;
                // Each unordered pair once, lower snapshot index first
                if ni > my_idx && ni < count {
                    candidates.push(ni);
                }
            });
            candidates.sort_unstable();

            for &ni in &candidates {
                let (me, them) = (snapshots[my_idx], snapshots[ni]);
                if !me.available {
                    break;
                }
                if !them.available {
                    continue;
                }
                if self.active.contains_key(&PairKey::new(me.id, them.id)) {
                    continue;
                }
                if me.pos.distance_squared(them.pos) > radius_sq {
                    continue;
                }
                if rng.f32() >= chance {
                    continue;
                }

                let kind = InteractionKind::ALL[rng.usize(0..InteractionKind::ALL.len())];
                let first = Member {
                    id: me.id,
                    entity: me.entity,
                };
                let second = Member {
                    id: them.id,
                    entity: them.entity,
                };
                if self.start(world, first, second, kind).is_some() {
                    snapshots[my_idx].available = false;
                    snapshots[ni].available = false;
                }
            }
        }

        self.candidates = candidates;
    }

    /// Register a new interaction and put both pets in the interacting state.
    /// Returns `None` if either pet is missing or already busy.
    pub fn start(
        &mut self,
        world: &mut hecs::World,
        first: Member,
        second: Member,
        kind: InteractionKind,
    ) -> Option<PairKey> {
        if first.id == second.id {
            return None;
        }
        let key = PairKey::new(first.id, second.id);
        if self.active.contains_key(&key) || !is_free(world, first) || !is_free(world, second) {
            return None;
        }

        let start_time = self.clock_ms;
        engage(world, first, second.id, kind, start_time);
        engage(world, second, first.id, kind, start_time);
        self.active.insert(
            key,
            ActiveInteraction {
                kind,
                first,
                second,
                start_time,
                duration_ms: kind.duration_ms(),
            },
        );
        log::debug!(
            "{} started between {} and {}",
            kind.label(),
            first.id,
            second.id
        );
        Some(key)
    }

    /// Terminate whatever interaction `id` is part of, releasing its partner
    /// with the standard cooldown. No-op if `id` isn't interacting.
    pub fn remove_pet(
        &mut self,
        world: &mut hecs::World,
        id: PetId,
        config: &RanchConfig,
    ) -> Option<ActiveInteraction> {
        let key = *self.active.keys().find(|k| k.contains(id))?;
        let interaction = self.active.remove(&key)?;
        release(world, interaction.first, config);
        release(world, interaction.second, config);
        log::debug!(
            "{} between {} and {} aborted, {} removed",
            interaction.kind.label(),
            interaction.first.id,
            interaction.second.id,
            id
        );
        Some(interaction)
    }
}

fn is_free(world: &hecs::World, member: Member) -> bool {
    world
        .get::<&PetState>(member.entity)
        .map(|s| !s.is_interacting())
        .unwrap_or(false)
}

fn engage(
    world: &mut hecs::World,
    member: Member,
    partner: PetId,
    kind: InteractionKind,
    start_time: f64,
) {
    let current = match world.get::<&mut PetState>(member.entity) {
        Ok(mut state) => start_interaction(&mut state, kind, partner, start_time),
        Err(_) => return,
    };
    let _ = world.insert_one(member.entity, current);
}

fn release(world: &mut hecs::World, member: Member, config: &RanchConfig) {
    let _ = world.remove_one::<CurrentInteraction>(member.entity);
    if let Ok(mut state) = world.get::<&mut PetState>(member.entity) {
        end_interaction(&mut state, config.interaction_cooldown_ms);
    }
}

// ---------------------------------------------------------------------------
// Scripted motion
// ---------------------------------------------------------------------------

/// Drive both members for one tick. Returns false if either is gone.
fn execute(
    world: &mut hecs::World,
    interaction: &ActiveInteraction,
    clock_ms: f64,
    dt: f32,
    bounds: Bounds,
    config: &RanchConfig,
    rng: &mut fastrand::Rng,
) -> bool {
    let (Some(a), Some(b)) = (
        read_body(world, interaction.first.entity),
        read_body(world, interaction.second.entity),
    ) else {
        return false;
    };
    let (mut a, mut b) = (a, b);

    match interaction.kind {
        InteractionKind::Play => {
            let angle = (interaction.elapsed_ms(clock_ms) / config.play_ms_per_radian) as f32;
            let center = (a.pos + b.pos) * 0.5;
            let offset = Vec2::new(angle.cos(), angle.sin()) * config.play_orbit_radius;
            a.pos = center + offset;
            b.pos = center - offset;
        }
        InteractionKind::Rest => {
            a.vel = Vec2::ZERO;
            b.vel = Vec2::ZERO;
        }
        InteractionKind::Follow => {
            seek_into(&mut a, b.pos, config.follow_strength, config.max_speed);
            if rng.f32() < config.follow_wander_chance {
                let angle = rng.f32() * std::f32::consts::TAU;
                b.vel = Vec2::new(angle.cos(), angle.sin()) * config.follow_wander_speed;
            }
            glide(&mut a, dt, config);
            glide(&mut b, dt, config);
        }
        InteractionKind::Group => {
            let (pa, pb) = (a.pos, b.pos);
            seek_into(&mut a, pb, config.group_strength, config.max_speed);
            seek_into(&mut b, pa, config.group_strength, config.max_speed);
            glide(&mut a, dt, config);
            glide(&mut b, dt, config);
        }
        InteractionKind::Avoid => {
            let (pa, pb) = (a.pos, b.pos);
            flee_from(&mut a, pb, config.avoid_strength, config.max_speed);
            flee_from(&mut b, pa, config.avoid_strength, config.max_speed);
            glide(&mut a, dt, config);
            glide(&mut b, dt, config);
        }
    }

    a.pos = clamp_to_bounds(a.pos, a.size, bounds);
    b.pos = clamp_to_bounds(b.pos, b.size, bounds);
    write_body(world, interaction.first.entity, a);
    write_body(world, interaction.second.entity, b);
    true
}

/// Local copy of the bits of a pet the scripts touch.
#[derive(Clone, Copy)]
struct Kinematics {
    pos: Vec2,
    vel: Vec2,
    size: f32,
}

fn read_body(world: &mut hecs::World, entity: hecs::Entity) -> Option<Kinematics> {
    let (pos, vel, body) = world
        .query_one_mut::<(&Position, &Velocity, &Body)>(entity)
        .ok()?;
    Some(Kinematics {
        pos: pos.0,
        vel: vel.0,
        size: body.size,
    })
}

fn write_body(world: &mut hecs::World, entity: hecs::Entity, k: Kinematics) {
    if let Ok((pos, vel)) = world.query_one_mut::<(&mut Position, &mut Velocity)>(entity) {
        pos.0 = k.pos;
        vel.0 = k.vel;
    }
}

fn seek_into(k: &mut Kinematics, target: Vec2, strength: f32, max_speed: f32) {
    let mut vel = Velocity(k.vel);
    seek(k.pos, &mut vel, target, strength, max_speed);
    k.vel = vel.0;
}

fn flee_from(k: &mut Kinematics, target: Vec2, strength: f32, max_speed: f32) {
    let mut vel = Velocity(k.vel);
    flee(k.pos, &mut vel, target, strength, max_speed);
    k.vel = vel.0;
}

/// Velocity-driven scripts move the pet themselves since physics skips it.
fn glide(k: &mut Kinematics, dt: f32, config: &RanchConfig) {
    k.vel = cap_speed(k.vel, config.max_speed);
    k.pos += k.vel * dt;
}
