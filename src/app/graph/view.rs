use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::layout::TransformTransition;

use super::super::render_utils::{
    blend_color, dim_color, draw_background, edge_visible, label_world_size, level_color,
    node_radius,
};
use super::super::{SearchMatchCache, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    // The rebuild raised on settlement runs at the start of the next frame.
    fn step_simulation(&mut self) {
        if self.layout.tick().is_none() {
            return;
        }

        let outcome = self.layout.settle(
            &mut self.pins,
            &self.config.view,
            self.config.pin_tolerance,
        );
        if let Some(frame) = outcome.frame {
            self.transition = Some(TransformTransition::new(
                self.view,
                frame,
                self.config.view.frame_transition_secs,
            ));
        }
        if outcome.pins_changed > 0 {
            self.rebuild.raise();
        }
    }

    fn advance_transition(&mut self, delta_seconds: f32) {
        let Some(transition) = self.transition.as_mut() else {
            return;
        };
        self.view = transition.advance(delta_seconds);
        if transition.is_finished() {
            self.transition = None;
        }
    }

    fn update_screen_space(&mut self, rect: egui::Rect) {
        let view = self.view;
        let scratch = &mut self.scene.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in self.layout.nodes() {
            scratch
                .screen_positions
                .push(view.world_to_screen(rect.min, node.position));
            scratch
                .screen_radii
                .push((node_radius(node.category) * view.scale).clamp(1.5, 90.0));
        }
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        if self.hover.active().is_some() {
            return None;
        }

        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.scene_revision == self.scene_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .scene
            .graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| fuzzy_match_score(&matcher, &node.name, query).is_some())
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            scene_revision: self.scene_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.container = rect;

        self.layout.set_viewport(rect.size());
        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.step_simulation();
        let delta_seconds = ui.input(|input| input.stable_dt).clamp(0.0, 0.1);
        self.advance_transition(delta_seconds);

        if self.layout.is_running() || self.transition.is_some() || self.rebuild.is_pending() {
            ui.ctx().request_repaint();
        }

        draw_background(&painter, rect, self.view);

        if self.scene.graph.is_empty() {
            self.hover.clear();
            self.selection = None;
            painter.text(
                rect.center(),
                Align2::CENTER_BOTTOM,
                "Your constellation is still forming",
                FontId::proportional(20.0),
                Color32::from_gray(210),
            );
            painter.text(
                rect.center() + vec2(0.0, 8.0),
                Align2::CENTER_TOP,
                "Unlock a skill to place your first star.",
                FontId::proportional(13.0),
                Color32::from_gray(150),
            );
            return;
        }

        self.update_screen_space(rect);
        Self::update_visibility(&mut self.scene, rect);

        let hovered = Self::hovered_index(ui, &self.scene);
        let hovered_id = hovered.map(|index| self.scene.graph.nodes[index].id.as_str());
        let now = ui.input(|input| input.time);
        let delay = f64::from(self.config.view.hover_delay_secs);
        if self.hover.update(hovered_id, now, delay, &self.scene) {
            ui.ctx().request_repaint();
        }
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let anchor = hovered
                .map(|index| self.scene.view_scratch.screen_positions[index])
                .unwrap_or_default();
            self.select_node(hovered, anchor);
        }

        let search_matches = self.cached_search_matches();
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        let scene = &self.scene;
        let scratch = &scene.view_scratch;
        let active = self.hover.active();
        let zoom_sqrt = self.view.scale.sqrt();

        for &(source, target) in &scene.edges {
            let start = scratch.screen_positions[source];
            let end = scratch.screen_positions[target];
            if !scratch.visible_mask[source]
                && !scratch.visible_mask[target]
                && !edge_visible(rect, start, end, 2.5)
            {
                continue;
            }

            let (width, color) = match active {
                Some(highlight) if highlight.contains_edge(source, target) => (
                    (2.4 * zoom_sqrt).clamp(1.4, 4.5),
                    Color32::from_rgb(196, 218, 255),
                ),
                Some(_) => (
                    (0.8 * zoom_sqrt).clamp(0.4, 1.6),
                    Color32::from_rgba_unmultiplied(70, 80, 104, 45),
                ),
                None => (
                    (1.1 * zoom_sqrt).clamp(0.6, 2.4),
                    Color32::from_rgba_unmultiplied(112, 128, 166, 150),
                ),
            };
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        let max_level = scene
            .graph
            .nodes
            .iter()
            .map(|node| node.level_for_color)
            .max()
            .unwrap_or(0);
        let mut draw_order = (0..scene.graph.nodes.len()).collect::<Vec<_>>();
        draw_order.sort_by_key(|&index| std::cmp::Reverse(scene.graph.nodes[index].category as u8));

        for index in draw_order {
            if !scratch.visible_mask[index] {
                continue;
            }

            let node = &scene.graph.nodes[index];
            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index];
            let in_constellation = active.is_none_or(|highlight| highlight.members.contains(&index));
            let is_search_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base_color = level_color(node.level_for_color, max_level);
            let color = if !in_constellation {
                dim_color(base_color, 0.3)
            } else if is_search_match {
                blend_color(base_color, Color32::from_rgb(103, 226, 255), 0.6)
            } else if search_active {
                dim_color(base_color, 0.45)
            } else {
                base_color
            };

            painter.circle_filled(position, radius, color);
            let outline = if node.is_unlocked_by_user {
                Color32::from_rgba_unmultiplied(235, 240, 255, if in_constellation { 200 } else { 60 })
            } else {
                Color32::from_rgba_unmultiplied(20, 22, 30, 190)
            };
            painter.circle_stroke(position, radius, Stroke::new(1.0, outline));

            if hovered == Some(index) {
                painter.circle_stroke(
                    position,
                    radius + 4.0,
                    Stroke::new(1.6, Color32::from_rgb(255, 214, 120)),
                );
            }
            if self.show_pins
                && self.layout.nodes()[index].fixed.is_some()
            {
                painter.circle_stroke(
                    position,
                    radius + 7.0,
                    Stroke::new(1.0, Color32::from_rgba_unmultiplied(245, 206, 93, 140)),
                );
            }

            let Some(world_size) = label_world_size(node.category, self.view.scale, &self.config.view)
            else {
                continue;
            };
            let text_color = if in_constellation {
                Color32::from_gray(236)
            } else {
                Color32::from_rgba_unmultiplied(236, 236, 236, 70)
            };
            painter.text(
                position + vec2(0.0, radius + 3.0),
                Align2::CENTER_TOP,
                node.name.as_str(),
                FontId::proportional(world_size * self.view.scale),
                text_color,
            );
        }

        if let Some(index) = hovered {
            let node = &scene.graph.nodes[index];
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  level {}",
                    node.name,
                    node.category.label(),
                    node.user_level
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
