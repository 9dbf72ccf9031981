use std::time::Duration;

use clap::Parser;
use glam::Vec2;
use instant::Instant;

use crate::config::{Bounds, RanchConfig};
use crate::debug::FrameStats;
use crate::obstacle::{Obstacle, WidgetKind};
use crate::ranch::Ranch;
use crate::roster::{Roster, MAX_PETS};

/// Target frame time for the headless host (seconds).
const FRAME_TIME: f64 = 1.0 / 60.0;
/// How often to log frame and ranch stats (seconds).
const STATS_LOG_INTERVAL: f64 = 5.0;
/// How often a pet is swapped out for a new one (seconds).
const ROSTER_CHURN_INTERVAL: f64 = 12.0;
/// Horizontal sway of the dragged sticky note (pixels).
const NOTE_DRAG_SWAY: f32 = 180.0;

const SPRITES: &[&str] = &[
    "sprites/pikachu.gif",
    "sprites/bulbasaur.gif",
    "sprites/charmander.gif",
    "sprites/squirtle.gif",
    "sprites/eevee.gif",
    "sprites/jigglypuff.gif",
    "sprites/snorlax.gif",
    "sprites/mr-mime.gif",
    "sprites/charizard-megax.gif",
    "sprites/eevee-gmax.gif",
];

#[derive(Debug, Parser)]
#[command(name = "pet-ranch")]
#[command(about = "Run the pet ranch simulation headless and log what happens", long_about = None)]
pub struct Args {
    /// How long to run (seconds)
    #[arg(long, default_value_t = 30.0)]
    pub seconds: f64,

    /// Pets to adopt at startup (capped at the roster limit)
    #[arg(long, default_value_t = 12)]
    pub pets: usize,

    /// Seed for a reproducible session
    #[arg(long)]
    pub seed: Option<u64>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1280.0)]
    pub width: f32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 720.0)]
    pub height: f32,
}

/// Host-side state around the simulation core.
struct App {
    ranch: Ranch,
    roster: Roster,
    widgets: Vec<Obstacle>,
    note_home: Vec2,
    frame_stats: FrameStats,
    started: Instant,
    last_frame_time: Option<Instant>,
    churn_timer: f64,
    sprite_cursor: usize,
}

impl App {
    fn new(args: &Args) -> Result<Self, Box<dyn std::error::Error>> {
        let bounds = Bounds::new(args.width, args.height);
        let rng = match args.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let mut ranch = Ranch::new(bounds, RanchConfig::default(), rng);

        let note_home = Vec2::new(bounds.width - 320.0, 80.0);
        let layout = [
            (WidgetKind::Timer, Vec2::new(60.0, 60.0)),
            (WidgetKind::Note, note_home),
            (
                WidgetKind::TodoList,
                Vec2::new(bounds.width * 0.5 - 110.0, bounds.height - 300.0),
            ),
        ];
        let widgets: Vec<Obstacle> = layout
            .iter()
            .zip(1u32..)
            .map(|(&(kind, pos), id)| {
                log::info!(
                    "Placed {} (widget {}) at ({:.0}, {:.0})",
                    kind.label(),
                    id,
                    pos.x,
                    pos.y
                );
                Obstacle::widget(id, kind, pos)
            })
            .collect();

        let mut roster = Roster::new();
        let count = args.pets.min(MAX_PETS);
        for i in 0..count {
            roster.adopt(SPRITES[i % SPRITES.len()], &mut ranch)?;
        }
        log::info!("Adopted {} pets", count);

        Ok(Self {
            ranch,
            roster,
            widgets,
            note_home,
            frame_stats: FrameStats::new(),
            started: Instant::now(),
            last_frame_time: None,
            churn_timer: 0.0,
            sprite_cursor: count,
        })
    }

    /// One host frame: measure dt, move widgets, tick the ranch.
    fn frame(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let now = Instant::now();
        let dt = match self.last_frame_time {
            Some(last) => now.duration_since(last).as_secs_f64(),
            None => 0.0,
        };
        self.last_frame_time = Some(now);
        self.frame_stats.record_frame(dt);

        // Pretend the user is dragging the sticky note around
        let t = self.started.elapsed().as_secs_f32();
        if let Some(note) = self.widgets.iter_mut().find(|w| w.id == 2) {
            note.move_to(self.note_home + Vec2::new((t * 0.4).sin() * NOTE_DRAG_SWAY, 0.0));
        }

        self.ranch.tick(dt as f32, &self.widgets);

        self.churn_timer += dt;
        if self.churn_timer >= ROSTER_CHURN_INTERVAL {
            self.churn_timer = 0.0;
            self.churn()?;
        }

        if self.frame_stats.log_due(STATS_LOG_INTERVAL) {
            self.log_stats();
        }
        Ok(())
    }

    /// Release the oldest pet and adopt the next sprite in line.
    fn churn(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(oldest) = self.roster.entries().first().map(|e| e.id) {
            self.roster.release(oldest, &mut self.ranch);
        }
        let sprite = SPRITES[self.sprite_cursor % SPRITES.len()];
        self.sprite_cursor += 1;
        self.roster.adopt(sprite, &mut self.ranch)?;
        Ok(())
    }

    fn log_stats(&self) {
        if let Some(s) = self.frame_stats.summary() {
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | total frames: {}",
                s.fps,
                s.avg_ms,
                s.min_ms,
                s.max_ms,
                self.frame_stats.frame_count,
            );
        }
        log::info!("Systems: {}", self.ranch.timers().summary());

        let pets = self.ranch.pets();
        let interacting = pets.iter().filter(|p| p.interaction.is_some()).count();
        log::info!(
            "Ranch: {} pets, {} interacting, {} active interactions",
            pets.len(),
            interacting,
            self.ranch.active_interactions().len()
        );
        for pet in &pets {
            log::trace!(
                "  {} {} at ({:.0}, {:.0})",
                pet.name,
                pet.state.label(),
                pet.position.x,
                pet.position.y
            );
        }
        for view in self.ranch.active_interactions() {
            log::debug!(
                "  {} {}+{} {:.0}/{:.0}ms",
                view.kind.label(),
                view.pair.low(),
                view.pair.high(),
                view.elapsed_ms,
                view.duration_ms
            );
        }
    }
}

/// Entry point: build the ranch and run frames until time is up.
pub fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(args)?;
    let frame = Duration::from_secs_f64(FRAME_TIME);

    while app.started.elapsed().as_secs_f64() < args.seconds {
        let frame_start = Instant::now();
        app.frame()?;
        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    app.log_stats();
    app.ranch.check_invariants()?;
    log::info!("Ran {} ticks, shutting down", app.ranch.tick_count());
    Ok(())
}
