use glam::Vec2;

/// Default distance at which pets start steering away from a widget.
pub const DEFAULT_AVOIDANCE_RADIUS: f32 = 80.0;

/// Desktop widgets that sit on the ranch and block pets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Timer,
    Note,
    TodoList,
}

impl WidgetKind {
    /// Width and height a freshly placed widget gets.
    pub fn default_size(self) -> Vec2 {
        match self {
            WidgetKind::Timer => Vec2::new(200.0, 140.0),
            WidgetKind::Note => Vec2::new(250.0, 200.0),
            WidgetKind::TodoList => Vec2::new(220.0, 260.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WidgetKind::Timer => "Countdown Timer",
            WidgetKind::Note => "Sticky Note",
            WidgetKind::TodoList => "To-Do List",
        }
    }
}

/// Axis-aligned rectangle pets collide with. `position` is the top-left corner.
///
/// Owned by the widget layer; the simulation only reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub id: u32,
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub avoidance_radius: f32,
}

impl Obstacle {
    pub fn new(id: u32, position: Vec2, width: f32, height: f32) -> Self {
        Self {
            id,
            position,
            width,
            height,
            avoidance_radius: DEFAULT_AVOIDANCE_RADIUS,
        }
    }

    /// Obstacle footprint of a widget placed at `position`.
    pub fn widget(id: u32, kind: WidgetKind, position: Vec2) -> Self {
        let size = kind.default_size();
        Self::new(id, position, size.x, size.y)
    }

    pub fn min(&self) -> Vec2 {
        self.position
    }

    pub fn max(&self) -> Vec2 {
        self.position + Vec2::new(self.width, self.height)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    /// Closest point on (or in) the rectangle to `p`. Equals `p` when inside.
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }

    pub fn distance_to(&self, p: Vec2) -> f32 {
        (p - self.closest_point(p)).length()
    }

    /// Drag: move the top-left corner.
    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_point_clamps_outside_and_keeps_inside() {
        let o = Obstacle::new(1, Vec2::new(100.0, 100.0), 200.0, 150.0);
        assert_eq!(o.closest_point(Vec2::new(50.0, 120.0)), Vec2::new(100.0, 120.0));
        assert_eq!(o.closest_point(Vec2::new(400.0, 400.0)), Vec2::new(300.0, 250.0));
        let inside = Vec2::new(150.0, 150.0);
        assert_eq!(o.closest_point(inside), inside);
        assert_eq!(o.distance_to(inside), 0.0);
    }

    #[test]
    fn widget_uses_kind_size() {
        let o = Obstacle::widget(3, WidgetKind::Note, Vec2::ZERO);
        assert_eq!((o.width, o.height), (250.0, 200.0));
        assert!(o.contains_point(Vec2::new(250.0, 200.0)));
        assert!(!o.contains_point(Vec2::new(251.0, 10.0)));
    }

    #[test]
    fn drag_moves_rect() {
        let mut o = Obstacle::widget(2, WidgetKind::Timer, Vec2::ZERO);
        o.move_to(Vec2::new(10.0, 20.0));
        assert_eq!(o.max(), Vec2::new(210.0, 160.0));
    }
}
