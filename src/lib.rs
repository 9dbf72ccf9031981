//! Idle pet ranch simulation core.
//!
//! Pets wander a canvas, dodge desktop widgets and now and then pair up for a
//! short scripted interaction. The host owns a [`Ranch`], feeds it the
//! current widget rectangles and calls [`Ranch::tick`] once per frame;
//! rendering reads [`Ranch::pets`] and [`Ranch::active_interactions`].

pub mod app;
pub mod config;
pub mod debug;
pub mod ecs;
pub mod error;
pub mod obstacle;
pub mod ranch;
pub mod roster;
pub mod spatial;

pub use config::{Bounds, Damping, RanchConfig, TriggerRate};
pub use ecs::components::{BehaviorState, InteractionKind, PetId};
pub use error::{RanchError, RanchResult};
pub use obstacle::{Obstacle, WidgetKind};
pub use ranch::{PetView, Ranch};
pub use roster::Roster;
