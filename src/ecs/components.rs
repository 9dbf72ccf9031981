use std::fmt;

use glam::Vec2;

/// Stable pet identifier handed out by the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PetId(pub u32);

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pet#{}", self.0)
    }
}

/// Current position in canvas pixels.
#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);

/// Velocity in pixels/second.
#[derive(Debug, Clone, Copy)]
pub struct Velocity(pub Vec2);

/// Physical footprint. `size` is the sprite diameter in pixels.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub size: f32,
}

impl Body {
    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }
}

/// Display name for tooltips and the roster panel.
#[derive(Debug, Clone)]
pub struct PetName(pub String);

impl PetName {
    /// Stable tint hue in `[0, 360)`: a `h * 31 + c` hash over the UTF-16
    /// units, so every pet of one species shares a color.
    pub fn hue(&self) -> f32 {
        let hash = self
            .0
            .encode_utf16()
            .fold(0i32, |h, c| (c as i32).wrapping_add(h.wrapping_shl(5).wrapping_sub(h)));
        (hash % 360).unsigned_abs() as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BehaviorState {
    Idle,
    Moving,
    /// Owned by the interaction coordinator while a `CurrentInteraction` is attached.
    Interacting,
}

impl BehaviorState {
    pub fn label(self) -> &'static str {
        match self {
            BehaviorState::Idle => "idle",
            BehaviorState::Moving => "moving",
            BehaviorState::Interacting => "interacting",
        }
    }
}

/// Behavior state plus the two countdowns that gate it.
#[derive(Debug, Clone, Copy)]
pub struct PetState {
    pub state: BehaviorState,
    /// Milliseconds until the next random-walk decision.
    pub idle_timer: f32,
    /// Milliseconds before this pet may start another interaction.
    pub interaction_cooldown: f32,
}

impl PetState {
    pub fn new(idle_timer: f32) -> Self {
        Self {
            state: BehaviorState::Idle,
            idle_timer,
            interaction_cooldown: 0.0,
        }
    }

    pub fn is_interacting(&self) -> bool {
        self.state == BehaviorState::Interacting
    }

    pub fn is_available_for_interaction(&self) -> bool {
        !self.is_interacting() && self.interaction_cooldown <= 0.0
    }
}

/// Scripted joint behaviors two pets can share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InteractionKind {
    Play,
    Rest,
    Follow,
    Group,
    Avoid,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 5] = [
        Self::Play,
        Self::Rest,
        Self::Follow,
        Self::Group,
        Self::Avoid,
    ];

    /// How long an interaction of this kind lasts (milliseconds).
    pub fn duration_ms(self) -> f64 {
        match self {
            Self::Play => 3000.0,
            Self::Rest => 4000.0,
            Self::Follow => 5000.0,
            Self::Group => 3500.0,
            Self::Avoid => 2000.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Rest => "rest",
            Self::Follow => "follow",
            Self::Group => "group",
            Self::Avoid => "avoid",
        }
    }
}

/// Attached to a pet while it is part of an active interaction.
/// Present iff `PetState::state == Interacting`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentInteraction {
    pub kind: InteractionKind,
    pub partner: PetId,
    /// Coordinator clock (ms) when the interaction began.
    pub start_time: f64,
}

/// Enter the interacting state. Partner bookkeeping lives on the component.
pub fn start_interaction(
    state: &mut PetState,
    kind: InteractionKind,
    partner: PetId,
    start_time: f64,
) -> CurrentInteraction {
    state.state = BehaviorState::Interacting;
    state.idle_timer = 0.0;
    CurrentInteraction {
        kind,
        partner,
        start_time,
    }
}

/// Leave the interacting state and start the cooldown.
pub fn end_interaction(state: &mut PetState, cooldown_ms: f32) {
    state.state = BehaviorState::Idle;
    state.interaction_cooldown = cooldown_ms;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_follows_name_hash() {
        assert_eq!(PetName(String::new()).hue(), 0.0);
        // 'A' = 65, "AB" = 65 * 31 + 66 = 2081
        assert_eq!(PetName("A".into()).hue(), 65.0);
        assert_eq!(PetName("AB".into()).hue(), (2081 % 360) as f32);
    }

    #[test]
    fn availability_requires_idle_and_no_cooldown() {
        let mut state = PetState::new(0.0);
        assert!(state.is_available_for_interaction());

        state.interaction_cooldown = 10.0;
        assert!(!state.is_available_for_interaction());

        state.interaction_cooldown = 0.0;
        let _ = start_interaction(&mut state, InteractionKind::Rest, PetId(7), 0.0);
        assert!(!state.is_available_for_interaction());

        end_interaction(&mut state, 2000.0);
        assert_eq!(state.state, BehaviorState::Idle);
        assert_eq!(state.interaction_cooldown, 2000.0);
        assert!(!state.is_available_for_interaction());
    }

    #[test]
    fn durations_match_table() {
        let total: f64 = InteractionKind::ALL.iter().map(|k| k.duration_ms()).sum();
        assert_eq!(total, 3000.0 + 4000.0 + 5000.0 + 3500.0 + 2000.0);
    }
}
