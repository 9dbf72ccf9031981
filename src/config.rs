/// Canvas extent the pets live in (pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// How velocity decays between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damping {
    /// Multiply by the factor once per tick, whatever the tick length.
    /// Frame-rate dependent: faster hosts damp harder.
    PerTick(f32),
    /// Exponential decay, `factor` is the remaining fraction after one second.
    PerSecond(f32),
}

impl Damping {
    pub fn factor(self, dt: f32) -> f32 {
        match self {
            Damping::PerTick(f) => f,
            Damping::PerSecond(f) => f.powf(dt),
        }
    }
}

/// How often two nearby idle pets roll for a new interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerRate {
    /// Bernoulli trial per pair per tick.
    PerTick(f32),
    /// Poisson rate per pair per second, integrated over dt.
    PerSecond(f32),
}

impl TriggerRate {
    pub fn probability(self, dt: f32) -> f32 {
        match self {
            TriggerRate::PerTick(p) => p,
            TriggerRate::PerSecond(rate) => 1.0 - (-rate * dt).exp(),
        }
    }
}

/// Every simulation tunable. Defaults give the classic ranch feel.
#[derive(Debug, Clone)]
pub struct RanchConfig {
    /// Largest dt (seconds) a single tick may integrate.
    pub max_dt: f32,

    // --- pet body ---
    /// Sprite diameter for newly added pets.
    pub pet_size: f32,

    // --- steering ---
    /// Speed cap in pixels/second.
    pub max_speed: f32,
    /// Base delay between random-walk decisions (ms).
    pub walk_interval_ms: f32,
    /// Random jitter added on top of `walk_interval_ms` (ms).
    pub walk_jitter_ms: f32,
    /// Chance a random-walk decision starts moving rather than idling.
    pub move_probability: f32,
    pub walk_speed_min: f32,
    pub walk_speed_max: f32,
    /// Distance from a canvas edge where pets start turning away.
    pub edge_margin: f32,
    pub edge_turn_force: f32,
    pub obstacle_turn_force: f32,

    // --- movement ---
    pub damping: Damping,
    /// Velocity components below this snap to zero.
    pub velocity_epsilon: f32,
    /// Extra push-out distance past contact.
    pub collision_slop: f32,
    /// Impulse added along the contact normal on a bounce.
    pub bounce_impulse: f32,
    /// Slowest visible speed after a bounce.
    pub min_bounce_speed: f32,
    /// Speed used when a pet ends up exactly on an obstacle.
    pub stuck_bounce_speed: f32,

    // --- interactions ---
    pub interaction_radius: f32,
    pub trigger: TriggerRate,
    pub interaction_cooldown_ms: f32,
    pub play_orbit_radius: f32,
    /// Elapsed milliseconds per radian of orbit.
    pub play_ms_per_radian: f64,
    pub follow_strength: f32,
    /// Per-tick chance the followed pet picks a new heading.
    pub follow_wander_chance: f32,
    pub follow_wander_speed: f32,
    pub group_strength: f32,
    pub avoid_strength: f32,
}

impl Default for RanchConfig {
    fn default() -> Self {
        Self {
            max_dt: 0.1,
            pet_size: 32.0,
            max_speed: 100.0,
            walk_interval_ms: 1000.0,
            walk_jitter_ms: 2000.0,
            move_probability: 0.7,
            walk_speed_min: 50.0,
            walk_speed_max: 100.0,
            edge_margin: 50.0,
            edge_turn_force: 100.0,
            obstacle_turn_force: 200.0,
            damping: Damping::PerTick(0.95),
            velocity_epsilon: 0.1,
            collision_slop: 0.5,
            bounce_impulse: 30.0,
            min_bounce_speed: 40.0,
            stuck_bounce_speed: 80.0,
            interaction_radius: 80.0,
            trigger: TriggerRate::PerTick(0.01),
            interaction_cooldown_ms: 2000.0,
            play_orbit_radius: 40.0,
            play_ms_per_radian: 100.0,
            follow_strength: 0.5,
            follow_wander_chance: 0.1,
            follow_wander_speed: 20.0,
            group_strength: 0.3,
            avoid_strength: 0.8,
        }
    }
}

impl RanchConfig {
    /// Same config with a different interaction trigger rate.
    pub fn with_trigger(mut self, trigger: TriggerRate) -> Self {
        self.trigger = trigger;
        self
    }
}
