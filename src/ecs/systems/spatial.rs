use crate::ecs::components::{PetId, PetState, Position};
use crate::spatial::{PetSnapshot, SpatialGrid};

/// Rebuild the grid and snapshot cache from current positions.
/// Snapshots are ordered by `PetId` so pair checks run in a stable order.
pub fn rebuild(world: &hecs::World, grid: &mut SpatialGrid, snapshots: &mut Vec<PetSnapshot>) {
    grid.clear();
    snapshots.clear();
    for (entity, (id, pos, state)) in world.query::<(&PetId, &Position, &PetState)>().iter() {
        snapshots.push(PetSnapshot {
            entity,
            id: *id,
            pos: pos.0,
            available: state.is_available_for_interaction(),
        });
    }
    snapshots.sort_unstable_by_key(|s| s.id);
    for (idx, snap) in snapshots.iter().enumerate() {
        grid.insert(snap.pos, idx as u32);
    }
}
