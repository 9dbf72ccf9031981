pub mod interaction;
pub mod movement;
pub mod spatial;
pub mod steering;

use crate::config::{Bounds, RanchConfig};
use crate::debug::timer::{SystemPhase, SystemTimers};
use crate::obstacle::Obstacle;
use crate::spatial::{PetSnapshot, SpatialGrid};
use interaction::InteractionCoordinator;

/// Run all simulation systems for one tick, in order. Interactions run last
/// so their scripted motion overrides whatever physics did this tick.
#[allow(clippy::too_many_arguments)]
pub fn tick(
    world: &mut hecs::World,
    dt: f32,
    bounds: Bounds,
    obstacles: &[Obstacle],
    config: &RanchConfig,
    rng: &mut fastrand::Rng,
    grid: &mut SpatialGrid,
    snapshots: &mut Vec<PetSnapshot>,
    coordinator: &mut InteractionCoordinator,
    timers: &mut SystemTimers,
) {
    // 1. Random walk + avoidance forces
    timers.begin();
    steering::update(world, dt, bounds, obstacles, config, rng);
    timers.end(SystemPhase::Steering);

    // 2. Integration, obstacle collision, bounds, friction
    timers.begin();
    movement::integrate(world, dt, bounds, obstacles, config, rng);
    timers.end(SystemPhase::Movement);

    // 3. Rebuild grid + snapshot cache
    timers.begin();
    spatial::rebuild(world, grid, snapshots);
    timers.end(SystemPhase::SpatialRebuild);

    // 4. Pet-to-pet interactions
    timers.begin();
    coordinator.update(world, snapshots, grid, dt, bounds, config, rng);
    timers.end(SystemPhase::Interaction);
}
