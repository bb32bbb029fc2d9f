use eframe::egui::{Pos2, Vec2};

use crate::config::ViewConfig;

/// Scene transform: `screen = origin + translate + world * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub translate: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(self, origin: Pos2, world: Vec2) -> Pos2 {
        origin + self.translate + world * self.scale
    }

    pub fn screen_to_world(self, origin: Pos2, screen: Pos2) -> Vec2 {
        (screen - origin - self.translate) / self.scale
    }

    /// Zooms by `factor` while keeping the world point under `pointer` still.
    pub fn zoomed_about(self, origin: Pos2, pointer: Pos2, factor: f32, view: &ViewConfig) -> Self {
        let anchor = self.screen_to_world(origin, pointer);
        let scale = (self.scale * factor).clamp(view.min_zoom, view.max_zoom);
        Self {
            scale,
            translate: (pointer - origin) - anchor * scale,
        }
    }

    pub fn panned(self, delta: Vec2) -> Self {
        Self {
            scale: self.scale,
            translate: self.translate + delta,
        }
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            scale: self.scale + (other.scale - self.scale) * t,
            translate: self.translate + (other.translate - self.translate) * t,
        }
    }
}

/// Transform that fits the world rectangle `min..max` into `viewport`.
pub fn fit_bounds(min: Vec2, max: Vec2, viewport: Vec2, view: &ViewConfig) -> ViewTransform {
    let size = (max - min).max(Vec2::splat(1.0));
    let room = (viewport - Vec2::splat(view.frame_padding * 2.0)).max(Vec2::splat(1.0));
    let scale = (room.x / size.x)
        .min(room.y / size.y)
        .clamp(view.frame_min_scale, view.frame_max_scale);
    let center = (min + max) * 0.5;

    ViewTransform {
        scale,
        translate: viewport * 0.5 - center * scale,
    }
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TransformTransition {
    from: ViewTransform,
    to: ViewTransform,
    elapsed: f32,
    duration: f32,
}

impl TransformTransition {
    pub fn new(from: ViewTransform, to: ViewTransform, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    pub fn advance(&mut self, delta_seconds: f32) -> ViewTransform {
        self.elapsed = (self.elapsed + delta_seconds.max(0.0)).min(self.duration);
        if self.duration <= f32::EPSILON {
            return self.to;
        }
        self.from.lerp(self.to, ease_in_out_cubic(self.elapsed / self.duration))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn screen_and_world_round_trip_through_transform() {
        let transform = ViewTransform {
            scale: 2.0,
            translate: vec2(10.0, -4.0),
        };
        let origin = pos2(100.0, 50.0);
        let world = vec2(3.0, 7.0);
        let screen = transform.world_to_screen(origin, world);
        assert_eq!(screen, pos2(116.0, 60.0));
        assert_eq!(transform.screen_to_world(origin, screen), world);
    }

    #[test]
    fn zoom_keeps_pointer_anchor_and_clamps() {
        let view = ViewConfig::default();
        let origin = pos2(0.0, 0.0);
        let pointer = pos2(200.0, 120.0);
        let before = ViewTransform::default();
        let after = before.zoomed_about(origin, pointer, 2.0, &view);
        assert_eq!(after.scale, 2.0);
        let anchor = before.screen_to_world(origin, pointer);
        assert!((after.world_to_screen(origin, anchor) - pointer).length() < 1e-3);

        let clamped = after.zoomed_about(origin, pointer, 1_000.0, &view);
        assert_eq!(clamped.scale, view.max_zoom);
    }

    #[test]
    fn fit_bounds_centers_and_respects_scale_limits() {
        let view = ViewConfig::default();
        let viewport = vec2(800.0, 600.0);
        let transform = fit_bounds(vec2(0.0, 0.0), vec2(340.0, 240.0), viewport, &view);
        assert_eq!(transform.scale, 2.0);
        let center = transform.world_to_screen(Pos2::ZERO, vec2(170.0, 120.0));
        assert_eq!(center, pos2(400.0, 300.0));

        let huge = fit_bounds(vec2(0.0, 0.0), vec2(100_000.0, 10.0), viewport, &view);
        assert_eq!(huge.scale, view.frame_min_scale);
    }

    #[test]
    fn transition_eases_to_target() {
        let to = ViewTransform {
            scale: 3.0,
            translate: vec2(30.0, 0.0),
        };
        let mut transition = TransformTransition::new(ViewTransform::default(), to, 1.0);
        let halfway = transition.advance(0.5);
        assert!((halfway.scale - 2.0).abs() < 1e-4);
        assert!(!transition.is_finished());
        assert_eq!(transition.advance(5.0), to);
        assert!(transition.is_finished());
    }
}
