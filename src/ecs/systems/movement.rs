use glam::Vec2;

use crate::config::{Bounds, RanchConfig};
use crate::ecs::components::{Body, PetState, Position, Velocity};
use crate::obstacle::Obstacle;

/// Integrate velocity into position for every free pet. Obstacle collision,
/// bounds clamping, friction and velocity snapping happen here.
pub fn integrate(
    world: &mut hecs::World,
    dt: f32,
    bounds: Bounds,
    obstacles: &[Obstacle],
    config: &RanchConfig,
    rng: &mut fastrand::Rng,
) {
    for (_, (pos, vel, body, state)) in
        world.query_mut::<(&mut Position, &mut Velocity, &Body, &mut PetState)>()
    {
        advance(pos, vel, body, state, dt, bounds, obstacles, config, rng);
    }
}

/// One physics step for one pet. No-op while the pet is interacting.
#[allow(clippy::too_many_arguments)]
pub fn advance(
    pos: &mut Position,
    vel: &mut Velocity,
    body: &Body,
    state: &mut PetState,
    dt: f32,
    bounds: Bounds,
    obstacles: &[Obstacle],
    config: &RanchConfig,
    rng: &mut fastrand::Rng,
) {
    if state.is_interacting() {
        return;
    }

    if state.interaction_cooldown > 0.0 {
        state.interaction_cooldown = (state.interaction_cooldown - dt * 1000.0).max(0.0);
    }

    let mut next = pos.0 + vel.0 * dt;
    for obstacle in obstacles {
        resolve_collision(&mut next, vel, body, obstacle, bounds, config, rng);
    }

    pos.0 = clamp_to_bounds(next, body.size, bounds);

    vel.0 *= config.damping.factor(dt);

    // Snap tiny components so pets actually come to rest
    if vel.0.x.abs() < config.velocity_epsilon {
        vel.0.x = 0.0;
    }
    if vel.0.y.abs() < config.velocity_epsilon {
        vel.0.y = 0.0;
    }
}

/// Keep a pet center within `[size, extent - size]` on both axes.
/// Degenerate canvases smaller than two sprites pin to the center.
pub fn clamp_to_bounds(p: Vec2, size: f32, bounds: Bounds) -> Vec2 {
    Vec2::new(
        clamp_axis(p.x, size, bounds.width - size),
        clamp_axis(p.y, size, bounds.height - size),
    )
}

fn clamp_axis(v: f32, lo: f32, hi: f32) -> f32 {
    if hi < lo {
        return (lo + hi) * 0.5;
    }
    v.clamp(lo, hi)
}

/// Push a pet centered at `center` out of `obstacle` and bounce its
/// velocity. Returns whether a contact was resolved.
pub fn resolve_collision(
    center: &mut Vec2,
    vel: &mut Velocity,
    body: &Body,
    obstacle: &Obstacle,
    bounds: Bounds,
    config: &RanchConfig,
    rng: &mut fastrand::Rng,
) -> bool {
    let radius = body.radius();
    let closest = obstacle.closest_point(*center);
    let offset = *center - closest;
    let dist = offset.length();
    if dist >= radius {
        return false;
    }

    if dist > f32::EPSILON {
        let normal = offset / dist;
        *center += normal * (radius - dist + config.collision_slop);

        // Reflect, then kick outward so the bounce reads as elastic
        let mut v = vel.0 - 2.0 * vel.0.dot(normal) * normal;
        v += normal * config.bounce_impulse;
        let speed = v.length();
        if speed > 0.0 && speed < config.min_bounce_speed {
            v = v / speed * config.min_bounce_speed;
        }
        vel.0 = v;
        log::trace!(
            "bounce off obstacle {} normal=({:.2}, {:.2})",
            obstacle.id,
            normal.x,
            normal.y
        );
    } else {
        // Center is on or inside the rect: leave through the nearest side
        // that stays on the canvas, heading off in a random direction.
        let normal = escape_through_nearest_side(center, body, obstacle, bounds, config);
        let angle = rng.f32() * std::f32::consts::TAU;
        let mut dir = Vec2::new(angle.cos(), angle.sin());
        if dir.dot(normal) < 0.0 {
            dir -= 2.0 * dir.dot(normal) * normal;
        }
        vel.0 = dir * config.stuck_bounce_speed;
        log::trace!("pet stuck in obstacle {}, kicked out", obstacle.id);
    }
    true
}

/// Move `center` just past the closest edge of `obstacle` whose exit the
/// bounds clamp would keep, returning that edge's outward normal. A widget
/// covering the whole canvas leaves no such edge; the nearest one wins then.
fn escape_through_nearest_side(
    center: &mut Vec2,
    body: &Body,
    obstacle: &Obstacle,
    bounds: Bounds,
    config: &RanchConfig,
) -> Vec2 {
    let (min, max) = (obstacle.min(), obstacle.max());
    let clearance = body.radius() + config.collision_slop;
    let mut exits = [
        (center.x - min.x, Vec2::NEG_X, Vec2::new(min.x - clearance, center.y)),
        (max.x - center.x, Vec2::X, Vec2::new(max.x + clearance, center.y)),
        (center.y - min.y, Vec2::NEG_Y, Vec2::new(center.x, min.y - clearance)),
        (max.y - center.y, Vec2::Y, Vec2::new(center.x, max.y + clearance)),
    ];
    exits.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (_, normal, exit) = exits
        .iter()
        .copied()
        .find(|&(_, _, p)| clamp_to_bounds(p, body.size, bounds) == p)
        .unwrap_or(exits[0]);
    *center = exit;
    normal
}
