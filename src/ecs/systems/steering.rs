use glam::Vec2;

use crate::config::{Bounds, RanchConfig};
use crate::ecs::components::{BehaviorState, Body, PetState, Position, Velocity};
use crate::obstacle::Obstacle;

/// Distances below this are treated as "on top of the target".
const MIN_STEER_DIST: f32 = 1e-3;

/// Accumulate steering forces for every pet that isn't busy interacting.
pub fn update(
    world: &mut hecs::World,
    dt: f32,
    bounds: Bounds,
    obstacles: &[Obstacle],
    config: &RanchConfig,
    rng: &mut fastrand::Rng,
) {
    for (_, (pos, vel, body, state)) in
        world.query_mut::<(&Position, &mut Velocity, &Body, &mut PetState)>()
    {
        steer(pos, vel, body, state, dt, bounds, obstacles, config, rng);
    }
}

/// Per-pet steering: random walk, edge and obstacle avoidance, speed cap.
/// All forces add onto the current velocity.
#[allow(clippy::too_many_arguments)]
pub fn steer(
    pos: &Position,
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

    if state.idle_timer <= 0.0 {
        random_walk(vel, state, config, rng);
        state.idle_timer = config.walk_interval_ms + rng.f32() * config.walk_jitter_ms;
    } else {
        state.idle_timer -= dt * 1000.0;
    }

    vel.0 += edge_force(pos.0, bounds, config);

    for obstacle in obstacles {
        vel.0 += obstacle_force(pos.0, body.radius(), obstacle, config);
    }

    vel.0 = cap_speed(vel.0, config.max_speed);
}

/// Either pick a fresh heading or stop.
fn random_walk(
    vel: &mut Velocity,
    state: &mut PetState,
    config: &RanchConfig,
    rng: &mut fastrand::Rng,
) {
    if rng.f32() < config.move_probability {
        let angle = rng.f32() * std::f32::consts::TAU;
        let speed =
            config.walk_speed_min + rng.f32() * (config.walk_speed_max - config.walk_speed_min);
        vel.0 = Vec2::new(angle.cos(), angle.sin()) * speed;
        state.state = BehaviorState::Moving;
    } else {
        vel.0 = Vec2::ZERO;
        state.state = BehaviorState::Idle;
    }
}

/// Constant push away from any edge the pet is within `edge_margin` of.
pub fn edge_force(pos: Vec2, bounds: Bounds, config: &RanchConfig) -> Vec2 {
    let margin = config.edge_margin;
    let turn = config.edge_turn_force;
    let mut force = Vec2::ZERO;

    if pos.x < margin {
        force.x += turn;
    }
    if pos.x > bounds.width - margin {
        force.x -= turn;
    }
    if pos.y < margin {
        force.y += turn;
    }
    if pos.y > bounds.height - margin {
        force.y -= turn;
    }
    force
}

/// Soft repulsion from a widget, growing as the pet gets closer.
pub fn obstacle_force(pos: Vec2, radius: f32, obstacle: &Obstacle, config: &RanchConfig) -> Vec2 {
    let avoid = obstacle.avoidance_radius;
    if avoid <= 0.0 {
        return Vec2::ZERO;
    }

    let offset = pos - obstacle.closest_point(pos);
    let dist = offset.length();
    let reach = avoid + radius;
    if dist >= reach || dist <= MIN_STEER_DIST {
        // Inside the rect the hard collision in movement takes over.
        return Vec2::ZERO;
    }

    let strength = ((reach - dist) / avoid).max(0.0);
    offset / dist * config.obstacle_turn_force * strength
}

/// Rescale to `max` if faster, keeping direction.
pub fn cap_speed(v: Vec2, max: f32) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq > max * max {
        v / len_sq.sqrt() * max
    } else {
        v
    }
}

/// Nudge velocity toward `target`. Force falls off with distance and is
/// clamped near zero distance so it can't blow up.
pub fn seek(pos: Vec2, vel: &mut Velocity, target: Vec2, strength: f32, max_speed: f32) {
    vel.0 += pull(target - pos, strength, max_speed);
}

/// Nudge velocity away from `target`.
pub fn flee(pos: Vec2, vel: &mut Velocity, target: Vec2, strength: f32, max_speed: f32) {
    vel.0 += pull(pos - target, strength, max_speed);
}

fn pull(delta: Vec2, strength: f32, max_speed: f32) -> Vec2 {
    let dist = delta.length();
    if dist <= MIN_STEER_DIST {
        return Vec2::ZERO;
    }
    let force = max_speed * strength / dist.max(1.0);
    delta / dist * force
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parked() -> (Position, Velocity, Body, PetState) {
        (
            Position(Vec2::new(400.0, 300.0)),
            Velocity(Vec2::ZERO),
            Body { size: 32.0 },
            PetState::new(10_000.0),
        )
    }

    #[test]
    fn interacting_pets_are_left_alone() {
        let (pos, mut vel, body, mut state) = parked();
        state.state = BehaviorState::Interacting;
        vel.0 = Vec2::new(500.0, 0.0);
        let mut rng = fastrand::Rng::with_seed(1);
        steer(
            &pos,
            &mut vel,
            &body,
            &mut state,
            0.016,
            Bounds::new(800.0, 600.0),
            &[],
            &RanchConfig::default(),
            &mut rng,
        );
        assert_eq!(vel.0, Vec2::new(500.0, 0.0));
        assert_eq!(state.idle_timer, 10_000.0);
    }

    #[test]
    fn expired_timer_picks_heading_and_resets() {
        let (pos, mut vel, body, mut state) = parked();
        state.idle_timer = 0.0;
        let config = RanchConfig {
            move_probability: 1.0,
            ..RanchConfig::default()
        };
        let mut rng = fastrand::Rng::with_seed(7);
        steer(
            &pos,
            &mut vel,
            &body,
            &mut state,
            0.016,
            Bounds::new(800.0, 600.0),
            &[],
            &config,
            &mut rng,
        );
        let speed = vel.0.length();
        assert!((50.0..=100.0 + 1e-3).contains(&speed), "speed {speed}");
        assert_eq!(state.state, BehaviorState::Moving);
        assert!(state.idle_timer >= 1000.0 && state.idle_timer <= 3000.0);
    }

    #[test]
    fn decision_to_idle_stops_pet() {
        let (pos, mut vel, body, mut state) = parked();
        state.idle_timer = -5.0;
        state.state = BehaviorState::Moving;
        vel.0 = Vec2::new(60.0, 0.0);
        let config = RanchConfig {
            move_probability: 0.0,
            ..RanchConfig::default()
        };
        let mut rng = fastrand::Rng::with_seed(3);
        steer(
            &pos,
            &mut vel,
            &body,
            &mut state,
            0.016,
            Bounds::new(800.0, 600.0),
            &[],
            &config,
            &mut rng,
        );
        assert_eq!(vel.0, Vec2::ZERO);
        assert_eq!(state.state, BehaviorState::Idle);
    }

    #[test]
    fn edge_forces_stack_in_corner() {
        let config = RanchConfig::default();
        let f = edge_force(Vec2::new(10.0, 590.0), Bounds::new(800.0, 600.0), &config);
        assert_eq!(f, Vec2::new(100.0, -100.0));
        let none = edge_force(Vec2::new(400.0, 300.0), Bounds::new(800.0, 600.0), &config);
        assert_eq!(none, Vec2::ZERO);
    }

    #[test]
    fn obstacle_repulsion_points_away_and_weakens_with_distance() {
        let config = RanchConfig::default();
        let o = Obstacle::new(1, Vec2::new(100.0, 100.0), 200.0, 150.0);
        let near = obstacle_force(Vec2::new(90.0, 150.0), 16.0, &o, &config);
        let far = obstacle_force(Vec2::new(40.0, 150.0), 16.0, &o, &config);
        assert!(near.x < 0.0 && near.y == 0.0);
        assert!(far.x < 0.0);
        assert!(near.length() > far.length());
        let out_of_range = obstacle_force(Vec2::new(-10.0, 150.0), 16.0, &o, &config);
        assert_eq!(out_of_range, Vec2::ZERO);
    }

    #[test]
    fn speed_cap_keeps_direction() {
        let v = cap_speed(Vec2::new(300.0, 400.0), 100.0);
        assert!((v.length() - 100.0).abs() < 1e-3);
        assert!((v.x / v.y - 0.75).abs() < 1e-5);
        assert_eq!(cap_speed(Vec2::new(3.0, 4.0), 100.0), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn seek_and_flee_are_opposite_and_finite_at_zero_distance() {
        let mut toward = Velocity(Vec2::ZERO);
        let mut away = Velocity(Vec2::ZERO);
        let p = Vec2::new(0.0, 0.0);
        let target = Vec2::new(50.0, 0.0);
        seek(p, &mut toward, target, 0.5, 100.0);
        flee(p, &mut away, target, 0.5, 100.0);
        assert!((toward.0.x - 1.0).abs() < 1e-5);
        assert_eq!(toward.0, -away.0);

        let mut stuck = Velocity(Vec2::ZERO);
        seek(p, &mut stuck, p, 1.0, 100.0);
        assert_eq!(stuck.0, Vec2::ZERO);

        let mut close = Velocity(Vec2::ZERO);
        flee(p, &mut close, Vec2::new(0.01, 0.0), 1.0, 100.0);
        assert!(close.0.is_finite());
        assert!((close.0.length() - 100.0).abs() < 1e-3);
    }
}
