use std::collections::HashMap;

use glam::Vec2;

use crate::config::{Bounds, RanchConfig};
use crate::debug::timer::SystemTimers;
use crate::ecs::components::{
    BehaviorState, Body, CurrentInteraction, PetId, PetName, PetState, Position, Velocity,
};
use crate::ecs::systems;
use crate::ecs::systems::interaction::{InteractionCoordinator, InteractionView};
use crate::ecs::systems::movement::clamp_to_bounds;
use crate::error::{RanchError, RanchResult};
use crate::obstacle::Obstacle;
use crate::spatial::{PetSnapshot, SpatialGrid};

/// What the sprite layer needs to draw one pet.
#[derive(Debug, Clone, PartialEq)]
pub struct PetView {
    pub id: PetId,
    pub name: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    /// Sprite tint hue in degrees, derived from the name.
    pub hue: f32,
    pub state: BehaviorState,
    pub interaction: Option<CurrentInteraction>,
}

/// The simulation orchestrator. Owns every pet, the interaction registry and
/// the RNG; the host calls `tick` once per frame.
///
/// Structural changes (`add_pet`, `remove_pet`) take `&mut self`, so they can
/// never land in the middle of a tick.
pub struct Ranch {
    world: hecs::World,
    index: HashMap<PetId, hecs::Entity>,
    coordinator: InteractionCoordinator,
    config: RanchConfig,
    bounds: Bounds,
    rng: fastrand::Rng,
    grid: SpatialGrid,
    snapshots: Vec<PetSnapshot>,
    timers: SystemTimers,
    tick_count: u64,
}

impl Ranch {
    pub fn new(bounds: Bounds, config: RanchConfig, rng: fastrand::Rng) -> Self {
        let grid = SpatialGrid::new(config.interaction_radius.max(1.0), bounds);
        Self {
            world: hecs::World::new(),
            index: HashMap::new(),
            coordinator: InteractionCoordinator::new(),
            config,
            bounds,
            rng,
            grid,
            snapshots: Vec::new(),
            timers: SystemTimers::new(),
            tick_count: 0,
        }
    }

    /// Deterministic ranch for replays and tests.
    pub fn with_seed(bounds: Bounds, config: RanchConfig, seed: u64) -> Self {
        Self::new(bounds, config, fastrand::Rng::with_seed(seed))
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn config(&self) -> &RanchConfig {
        &self.config
    }

    pub fn timers(&self) -> &SystemTimers {
        &self.timers
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn rng_mut(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    pub fn add_pet(&mut self, id: PetId, position: Vec2) -> RanchResult<PetView> {
        self.add_named_pet(id, id.to_string(), position)
    }

    /// Spawn a pet at `position` (clamped onto the canvas).
    pub fn add_named_pet(
        &mut self,
        id: PetId,
        name: impl Into<String>,
        position: Vec2,
    ) -> RanchResult<PetView> {
        if self.index.contains_key(&id) {
            return Err(RanchError::DuplicatePet(id));
        }

        let size = self.config.pet_size;
        let name = PetName(name.into());
        let hue = name.hue();
        let pos = clamp_to_bounds(position, size, self.bounds);
        let entity = self.world.spawn((
            id,
            Position(pos),
            Velocity(Vec2::ZERO),
            Body { size },
            // Zero timer: first tick makes a random-walk decision
            PetState::new(0.0),
            name.clone(),
        ));
        self.index.insert(id, entity);
        log::info!("{} ({}) joined the ranch at ({:.0}, {:.0})", name.0, id, pos.x, pos.y);

        Ok(PetView {
            id,
            name: name.0,
            position: pos,
            velocity: Vec2::ZERO,
            size,
            hue,
            state: BehaviorState::Idle,
            interaction: None,
        })
    }

    /// Remove a pet, aborting any interaction it is in. Unknown ids are a
    /// no-op; returns whether a pet was removed.
    pub fn remove_pet(&mut self, id: PetId) -> bool {
        let Some(entity) = self.index.remove(&id) else {
            return false;
        };
        self.coordinator.remove_pet(&mut self.world, id, &self.config);
        let _ = self.world.despawn(entity);
        log::info!("{} left the ranch", id);
        true
    }

    /// Canvas resized: re-grid and pull every pet back on screen.
    pub fn resize(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        self.grid.resize(bounds);
        for (_, (pos, body)) in self.world.query_mut::<(&mut Position, &Body)>() {
            pos.0 = clamp_to_bounds(pos.0, body.size, bounds);
        }
    }

    /// Advance the simulation by `dt` seconds against this frame's widgets.
    /// `dt` is clamped to `[0, max_dt]` so a stalled tab can't fling pets.
    pub fn tick(&mut self, dt: f32, obstacles: &[Obstacle]) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_dt)
        } else {
            0.0
        };

        systems::tick(
            &mut self.world,
            dt,
            self.bounds,
            obstacles,
            &self.config,
            &mut self.rng,
            &mut self.grid,
            &mut self.snapshots,
            &mut self.coordinator,
            &mut self.timers,
        );
        self.tick_count += 1;

        debug_assert!(
            self.check_invariants().is_ok(),
            "{:?}",
            self.check_invariants()
        );
    }

    pub fn pet(&self, id: PetId) -> Option<PetView> {
        let entity = *self.index.get(&id)?;
        self.view(entity)
    }

    /// Every pet, ordered by id.
    pub fn pets(&self) -> Vec<PetView> {
        let mut ids: Vec<PetId> = self.index.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.pet(id)).collect()
    }

    pub fn active_interactions(&self) -> Vec<InteractionView> {
        self.coordinator.views()
    }

    pub fn coordinator(&self) -> &InteractionCoordinator {
        &self.coordinator
    }

    fn view(&self, entity: hecs::Entity) -> Option<PetView> {
        let mut query = self
            .world
            .query_one::<(
                &PetId,
                &PetName,
                &Position,
                &Velocity,
                &Body,
                &PetState,
                Option<&CurrentInteraction>,
            )>(entity)
            .ok()?;
        let (id, name, pos, vel, body, state, current) = query.get()?;
        Some(PetView {
            id: *id,
            name: name.0.clone(),
            position: pos.0,
            velocity: vel.0,
            size: body.size,
            hue: name.hue(),
            state: state.state,
            interaction: current.copied(),
        })
    }

    /// Cross-check pet state, attached interactions, the registry and the
    /// canvas bounds.
    pub fn check_invariants(&self) -> RanchResult<()> {
        let violation = |msg: String| Err(RanchError::InvariantViolation(msg));

        for (&id, &entity) in &self.index {
            let Some(pet) = self.view(entity) else {
                return violation(format!("{id} indexed but missing from world"));
            };
            let interacting = pet.state == BehaviorState::Interacting;
            let memberships = self.coordinator.iter().filter(|a| a.pair().contains(id)).count();

            if interacting != pet.interaction.is_some() {
                return violation(format!("{id} state/interaction mismatch"));
            }
            if interacting as usize != memberships {
                return violation(format!("{id} is in {memberships} registry pairs"));
            }
            if let Some(current) = pet.interaction {
                let registered = self.coordinator.find(id).map(|a| a.pair().partner_of(id));
                if registered != Some(Some(current.partner)) {
                    return violation(format!("{id} partner disagrees with registry"));
                }
            }

            let p = pet.position;
            if !p.is_finite() {
                return violation(format!("{id} has non-finite position"));
            }
            let (w, h, s) = (self.bounds.width, self.bounds.height, pet.size);
            if w >= 2.0 * s && (p.x < s || p.x > w - s) {
                return violation(format!("{id} x={} out of bounds", p.x));
            }
            if h >= 2.0 * s && (p.y < s || p.y > h - s) {
                return violation(format!("{id} y={} out of bounds", p.y));
            }
        }

        for interaction in self.coordinator.iter() {
            for member in [interaction.first, interaction.second] {
                if !self.index.contains_key(&member.id) {
                    return violation(format!("registry references removed {}", member.id));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriggerRate;
    use crate::ecs::components::InteractionKind;
    use crate::ecs::systems::interaction::{Member, PairKey};

    fn quiet_config() -> RanchConfig {
        RanchConfig::default().with_trigger(TriggerRate::PerTick(0.0))
    }

    fn canvas() -> Bounds {
        Bounds::new(800.0, 600.0)
    }

    fn set_kinematics(ranch: &mut Ranch, id: PetId, vel: Vec2, idle_timer: f32) {
        let entity = ranch.index[&id];
        ranch.world.get::<&mut Velocity>(entity).unwrap().0 = vel;
        ranch.world.get::<&mut PetState>(entity).unwrap().idle_timer = idle_timer;
    }

    fn member(ranch: &Ranch, id: PetId) -> Member {
        Member {
            id,
            entity: ranch.index[&id],
        }
    }

    #[test]
    fn empty_ranch_ticks() {
        let mut ranch = Ranch::with_seed(canvas(), RanchConfig::default(), 1);
        for _ in 0..10 {
            ranch.tick(0.016, &[]);
        }
        assert!(ranch.pets().is_empty());
        assert!(ranch.active_interactions().is_empty());
        assert_eq!(ranch.tick_count(), 10);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut ranch = Ranch::with_seed(canvas(), RanchConfig::default(), 1);
        ranch.add_pet(PetId(1), Vec2::new(100.0, 100.0)).unwrap();
        assert_eq!(
            ranch.add_pet(PetId(1), Vec2::new(200.0, 200.0)),
            Err(RanchError::DuplicatePet(PetId(1)))
        );
        assert_eq!(ranch.len(), 1);
    }

    #[test]
    fn spawn_position_is_clamped() {
        let mut ranch = Ranch::with_seed(canvas(), RanchConfig::default(), 1);
        let view = ranch.add_pet(PetId(1), Vec2::new(-40.0, 900.0)).unwrap();
        assert_eq!(view.position, Vec2::new(32.0, 568.0));
    }

    #[test]
    fn edge_clamp_through_full_tick() {
        let config = RanchConfig {
            max_dt: 1.0,
            edge_turn_force: 0.0,
            ..quiet_config()
        };
        let mut ranch = Ranch::with_seed(canvas(), config, 1);
        ranch.add_pet(PetId(1), Vec2::new(40.0, 40.0)).unwrap();
        set_kinematics(&mut ranch, PetId(1), Vec2::new(-50.0, 0.0), 10_000.0);

        ranch.tick(1.0, &[]);
        let pet = ranch.pet(PetId(1)).unwrap();
        assert_eq!(pet.position.x, 32.0);
        assert!(pet.velocity.x < 0.0);
    }

    #[test]
    fn edge_avoidance_turns_pet_before_integration() {
        let config = RanchConfig {
            max_dt: 1.0,
            ..quiet_config()
        };
        let mut ranch = Ranch::with_seed(canvas(), config, 1);
        ranch.add_pet(PetId(1), Vec2::new(40.0, 40.0)).unwrap();
        set_kinematics(&mut ranch, PetId(1), Vec2::new(-50.0, 0.0), 10_000.0);

        ranch.tick(1.0, &[]);
        let pet = ranch.pet(PetId(1)).unwrap();
        assert!(pet.velocity.x > 0.0);
        assert!(pet.position.x >= 32.0 && pet.position.x <= 768.0);
        assert!(ranch.check_invariants().is_ok());
    }

    #[test]
    fn pet_dropped_under_edge_widget_walks_free() {
        let widget = [Obstacle::new(1, Vec2::new(0.0, 100.0), 200.0, 200.0)];
        let mut ranch = Ranch::with_seed(canvas(), quiet_config(), 17);
        ranch.add_pet(PetId(1), Vec2::new(40.0, 200.0)).unwrap();

        for _ in 0..600 {
            ranch.tick(0.016, &widget);
            let pet = ranch.pet(PetId(1)).unwrap();
            assert!(!widget[0].contains_point(pet.position), "inside at {:?}", pet.position);
        }
    }

    #[test]
    fn same_name_same_hue() {
        let mut ranch = Ranch::with_seed(canvas(), quiet_config(), 1);
        let a = ranch.add_named_pet(PetId(1), "Pikachu", Vec2::new(100.0, 100.0)).unwrap();
        let b = ranch.add_named_pet(PetId(2), "Pikachu", Vec2::new(300.0, 100.0)).unwrap();
        let c = ranch.add_named_pet(PetId(3), "Snorlax", Vec2::new(500.0, 100.0)).unwrap();
        assert_eq!(a.hue, b.hue);
        assert_ne!(a.hue, c.hue);
        assert!((0.0..360.0).contains(&c.hue));
        assert_eq!(ranch.pet(PetId(3)).unwrap().hue, c.hue);
    }

    #[test]
    fn dt_is_clamped() {
        let mut ranch = Ranch::with_seed(canvas(), quiet_config(), 1);
        ranch.add_pet(PetId(1), Vec2::new(400.0, 300.0)).unwrap();
        set_kinematics(&mut ranch, PetId(1), Vec2::new(100.0, 0.0), 10_000.0);

        ranch.tick(5.0, &[]);
        let pet = ranch.pet(PetId(1)).unwrap();
        assert!((pet.position.x - 410.0).abs() < 1e-3);

        ranch.tick(f32::NAN, &[]);
        assert!(ranch.pet(PetId(1)).unwrap().position.is_finite());
    }

    #[test]
    fn forced_trigger_pairs_close_pets() {
        let config = RanchConfig::default().with_trigger(TriggerRate::PerTick(1.0));
        let mut ranch = Ranch::with_seed(canvas(), config, 11);
        ranch.add_pet(PetId(1), Vec2::new(400.0, 300.0)).unwrap();
        ranch.add_pet(PetId(2), Vec2::new(430.0, 300.0)).unwrap();

        ranch.tick(0.016, &[]);

        let active = ranch.active_interactions();
        assert_eq!(active.len(), 1);
        let key = PairKey::new(PetId(1), PetId(2));
        assert_eq!(key, PairKey::new(PetId(2), PetId(1)));
        assert_eq!(active[0].pair, key);
        assert!(ranch.coordinator().get(PairKey::new(PetId(2), PetId(1))).is_some());
        for id in [PetId(1), PetId(2)] {
            assert_eq!(ranch.pet(id).unwrap().state, BehaviorState::Interacting);
        }
    }

    #[test]
    fn far_pets_never_pair() {
        let config = RanchConfig::default().with_trigger(TriggerRate::PerTick(1.0));
        let mut ranch = Ranch::with_seed(canvas(), config, 11);
        ranch.add_pet(PetId(1), Vec2::new(100.0, 300.0)).unwrap();
        ranch.add_pet(PetId(2), Vec2::new(600.0, 300.0)).unwrap();
        ranch.tick(0.016, &[]);
        assert!(ranch.active_interactions().is_empty());
    }

    #[test]
    fn rest_ends_after_duration_with_cooldown() {
        let mut ranch = Ranch::with_seed(canvas(), quiet_config(), 3);
        ranch.add_pet(PetId(1), Vec2::new(400.0, 300.0)).unwrap();
        ranch.add_pet(PetId(2), Vec2::new(430.0, 300.0)).unwrap();
        let (a, b) = (member(&ranch, PetId(1)), member(&ranch, PetId(2)));
        ranch
            .coordinator
            .start(&mut ranch.world, a, b, InteractionKind::Rest)
            .unwrap();

        for _ in 0..39 {
            ranch.tick(0.1, &[]);
        }
        assert_eq!(ranch.active_interactions().len(), 1);
        assert_eq!(ranch.pet(PetId(1)).unwrap().velocity, Vec2::ZERO);

        ranch.tick(0.1, &[]);
        assert!(ranch.active_interactions().is_empty());
        for id in [PetId(1), PetId(2)] {
            let entity = ranch.index[&id];
            let state = *ranch.world.get::<&PetState>(entity).unwrap();
            assert_eq!(state.state, BehaviorState::Idle);
            assert_eq!(state.interaction_cooldown, 2000.0);
        }
    }

    #[test]
    fn removing_interacting_pet_frees_partner() {
        let mut ranch = Ranch::with_seed(canvas(), quiet_config(), 3);
        ranch.add_pet(PetId(1), Vec2::new(400.0, 300.0)).unwrap();
        ranch.add_pet(PetId(2), Vec2::new(430.0, 300.0)).unwrap();
        let (a, b) = (member(&ranch, PetId(1)), member(&ranch, PetId(2)));
        ranch
            .coordinator
            .start(&mut ranch.world, a, b, InteractionKind::Play)
            .unwrap();

        assert!(ranch.remove_pet(PetId(2)));
        assert!(!ranch.remove_pet(PetId(2)));
        assert!(ranch.active_interactions().is_empty());

        let survivor = ranch.pet(PetId(1)).unwrap();
        assert_eq!(survivor.state, BehaviorState::Idle);
        assert!(survivor.interaction.is_none());
        assert!(ranch.check_invariants().is_ok());
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut ranch = Ranch::with_seed(canvas(), RanchConfig::default(), 1);
        assert!(!ranch.remove_pet(PetId(42)));
    }

    #[test]
    fn trajectories_are_deterministic_without_triggers() {
        let obstacles = [Obstacle::new(1, Vec2::new(300.0, 200.0), 200.0, 150.0)];
        let run = || {
            let mut ranch = Ranch::with_seed(canvas(), quiet_config(), 99);
            for i in 0..6 {
                ranch
                    .add_pet(PetId(i), Vec2::new(100.0 + i as f32 * 100.0, 120.0))
                    .unwrap();
            }
            for frame in 0..300 {
                let dt = if frame % 7 == 0 { 0.033 } else { 0.016 };
                ranch.tick(dt, &obstacles);
            }
            ranch.pets()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn invariants_hold_through_busy_session() {
        let config = RanchConfig::default().with_trigger(TriggerRate::PerTick(0.2));
        let mut ranch = Ranch::with_seed(canvas(), config, 2024);
        let mut obstacles = vec![
            Obstacle::new(1, Vec2::new(300.0, 200.0), 200.0, 150.0),
            Obstacle::new(2, Vec2::new(40.0, 400.0), 120.0, 120.0),
        ];
        let mut next_id = 0;
        for _ in 0..25 {
            let x = 60.0 + ranch.rng_mut().f32() * 680.0;
            let y = 60.0 + ranch.rng_mut().f32() * 480.0;
            ranch.add_pet(PetId(next_id), Vec2::new(x, y)).unwrap();
            next_id += 1;
        }

        for frame in 0..2000u32 {
            // Drag a widget around
            let t = frame as f32 * 0.01;
            obstacles[0].move_to(Vec2::new(300.0 + t.sin() * 150.0, 200.0));

            ranch.tick(0.016, &obstacles);
            ranch.check_invariants().unwrap();

            if frame % 97 == 0 {
                let victim = PetId(ranch.rng_mut().u32(0..next_id));
                ranch.remove_pet(victim);
                ranch.check_invariants().unwrap();
            }
            if frame % 53 == 0 && ranch.len() < 25 {
                ranch
                    .add_pet(PetId(next_id), Vec2::new(400.0, 100.0))
                    .unwrap();
                next_id += 1;
            }
        }
        assert!(ranch.len() <= 25);
    }

    #[test]
    fn resize_pulls_pets_back_on_canvas() {
        let mut ranch = Ranch::with_seed(canvas(), quiet_config(), 1);
        ranch.add_pet(PetId(1), Vec2::new(700.0, 500.0)).unwrap();
        ranch.resize(Bounds::new(400.0, 300.0));
        let pet = ranch.pet(PetId(1)).unwrap();
        assert_eq!(pet.position, Vec2::new(368.0, 268.0));
        ranch.tick(0.016, &[]);
        assert!(ranch.check_invariants().is_ok());
    }
}
