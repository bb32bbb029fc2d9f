use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::config::ViewConfig;
use crate::constellation::Category;
use crate::layout::ViewTransform;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, view: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(11, 14, 24));

    let step = (64.0 * view.scale.clamp(0.6, 1.8)).max(24.0);
    let origin = rect.min + view.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(52, 62, 92, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    segments_intersect(start, end, rect.left_top(), rect.right_top())
        || segments_intersect(start, end, rect.right_top(), rect.right_bottom())
        || segments_intersect(start, end, rect.right_bottom(), rect.left_bottom())
        || segments_intersect(start, end, rect.left_bottom(), rect.left_top())
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

pub(super) fn node_radius(category: Category) -> f32 {
    match category {
        Category::Star => 15.0,
        Category::Planet => 10.0,
        Category::Moon => 7.0,
        Category::Satellite => 4.5,
    }
}

pub(super) fn level_color(level: u32, max_level: u32) -> Color32 {
    if level == 0 {
        return Color32::from_rgb(96, 104, 128);
    }

    let t = if max_level <= 1 {
        1.0
    } else {
        ((level as f32).ln_1p() / (max_level as f32).ln_1p()).clamp(0.0, 1.0)
    };
    let r = (90.0 + (165.0 * t)) as u8;
    let g = (170.0 + (40.0 * t) - (90.0 * t * t)) as u8;
    let b = (250.0 - (180.0 * t)) as u8;
    Color32::from_rgb(r, g, b)
}

pub(super) fn label_world_size(category: Category, scale: f32, view: &ViewConfig) -> Option<f32> {
    let (threshold, floor) = match category {
        Category::Star => (view.star_label_min_scale, view.star_label_floor),
        Category::Planet => (view.label_min_scale, view.planet_label_floor),
        Category::Moon => (view.label_min_scale, view.moon_label_floor),
        Category::Satellite => (view.label_min_scale, view.satellite_label_floor),
    };
    if scale < threshold || scale <= f32::EPSILON {
        return None;
    }

    Some((view.label_base_size / scale).max(floor))
}
