use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::render_utils::circle_visible;
use super::super::{Scene, Selection, ViewModel};

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let (scroll, pinch) = ui.input(|input| (input.raw_scroll_delta.y, input.zoom_delta()));
        let mut factor = pinch;
        if scroll.abs() > f32::EPSILON {
            factor *= (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        }
        if (factor - 1.0).abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        self.transition = None;
        self.view = self
            .view
            .zoomed_about(rect.min, pointer, factor, &self.config.view);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            let delta = response.drag_delta();
            if delta != egui::Vec2::ZERO {
                self.transition = None;
                self.view = self.view.panned(delta);
            }
        }
    }

    pub(in crate::app) fn update_visibility(scene: &mut Scene, rect: Rect) {
        let scratch = &mut scene.view_scratch;
        scratch.visible_mask.clear();
        scratch.visible_mask.extend(
            scratch
                .screen_positions
                .iter()
                .zip(&scratch.screen_radii)
                .map(|(position, radius)| circle_visible(rect, *position, *radius)),
        );
    }

    pub(in crate::app) fn hovered_index(ui: &Ui, scene: &Scene) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        let scratch = &scene.view_scratch;
        (0..scratch.screen_positions.len())
            .filter(|&index| scratch.visible_mask.get(index).copied().unwrap_or(false))
            .filter_map(|index| {
                let distance = scratch.screen_positions[index].distance(pointer);
                // Small bodies get a minimum pick radius.
                (distance <= scratch.screen_radii[index].max(6.0)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn select_node(&mut self, index: Option<usize>, anchor: Pos2) {
        let Some(node) = index.and_then(|index| self.scene.graph.nodes.get(index)) else {
            self.selection = None;
            return;
        };

        tracing::debug!(id = %node.id, category = node.category.label(), "node selected");
        let overlay_size = self
            .selection
            .as_ref()
            .map_or(egui::vec2(300.0, 220.0), |selection| selection.overlay_size);
        self.selection = Some(Selection {
            id: node.id.clone(),
            anchor,
            overlay_size,
        });
    }
}
