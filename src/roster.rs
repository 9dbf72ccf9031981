use glam::Vec2;

use crate::ecs::components::PetId;
use crate::error::{RanchError, RanchResult};
use crate::ranch::Ranch;

/// Most pets the roster panel lets onto the ranch at once.
pub const MAX_PETS: usize = 25;
/// Keep fresh pets this far from the canvas edges.
const SPAWN_MARGIN: f32 = 50.0;

/// One adopted pet as listed in the roster panel.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: PetId,
    pub name: String,
    pub sprite: String,
}

/// Tracks which pets were adopted and hands out ids. The simulation core
/// doesn't cap anything; the cap lives here.
#[derive(Debug)]
pub struct Roster {
    capacity: usize,
    next_id: u32,
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::with_capacity(MAX_PETS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            next_id: 1,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Put a pet for `sprite` somewhere random on the ranch.
    pub fn adopt(&mut self, sprite: &str, ranch: &mut Ranch) -> RanchResult<PetId> {
        if self.is_full() {
            return Err(RanchError::RosterFull {
                capacity: self.capacity,
            });
        }

        let bounds = ranch.bounds();
        let rng = ranch.rng_mut();
        let pos = Vec2::new(
            SPAWN_MARGIN + rng.f32() * (bounds.width - 2.0 * SPAWN_MARGIN).max(0.0),
            SPAWN_MARGIN + rng.f32() * (bounds.height - 2.0 * SPAWN_MARGIN).max(0.0),
        );

        let id = PetId(self.next_id);
        let name = display_name_from_sprite(sprite);
        ranch.add_named_pet(id, name.clone(), pos)?;
        self.next_id += 1;
        self.entries.push(RosterEntry {
            id,
            name,
            sprite: sprite.to_string(),
        });
        Ok(id)
    }

    /// Take a pet off the ranch. Unknown ids are ignored.
    pub fn release(&mut self, id: PetId, ranch: &mut Ranch) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let listed = self.entries.len() != before;
        ranch.remove_pet(id) || listed
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

/// "sprites/charizard-megax.gif" -> "Charizard Megax".
pub fn display_name_from_sprite(sprite: &str) -> String {
    let file = sprite.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(sprite);
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    stem.split(|c: char| c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
