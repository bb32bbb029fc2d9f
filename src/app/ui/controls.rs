use eframe::egui::{self, RichText, Ui};

use crate::constellation::Category;

use super::super::ViewModel;
use super::super::render_utils::{level_color, node_radius};

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controls");
        ui.add_space(6.0);

        ui.label("Search skills");
        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("fuzzy match on skill name")
                .desired_width(f32::INFINITY),
        );
        if let Some(matches) = self
            .search_match_cache
            .as_ref()
            .filter(|cache| cache.query == self.search.trim())
        {
            ui.small(format!("{} matching skills", matches.matches.len()));
        }

        ui.separator();
        ui.checkbox(&mut self.show_pins, "Show pinned stars")
            .on_hover_text("Ring every star whose position is pinned.");

        let mut physics = self.config.physics;
        egui::CollapsingHeader::new("Physics tuning")
            .default_open(false)
            .show(ui, |ui| {
                ui.add(
                    egui::Slider::new(&mut physics.repulsion, 500.0..=40_000.0)
                        .text("Repulsion")
                        .logarithmic(true)
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("How strongly every skill pushes the others away.");
                ui.add(
                    egui::Slider::new(&mut physics.link_distance, 20.0..=300.0)
                        .text("Link distance")
                        .clamping(egui::SliderClamping::Always),
                );
                ui.add(
                    egui::Slider::new(&mut physics.link_strength, 0.0..=1.0)
                        .text("Link strength")
                        .clamping(egui::SliderClamping::Always),
                );
                ui.add(
                    egui::Slider::new(&mut physics.center_strength, 0.0..=0.2)
                        .text("Centering")
                        .clamping(egui::SliderClamping::Always),
                );
                ui.add(
                    egui::Slider::new(&mut physics.collision_radius, 0.0..=60.0)
                        .text("Collision radius")
                        .clamping(egui::SliderClamping::Always),
                );
                ui.add(
                    egui::Slider::new(&mut physics.velocity_decay, 0.05..=0.9)
                        .text("Velocity decay")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("Share of velocity lost every tick.");
            });
        if physics != self.config.physics {
            self.config.physics = physics;
            self.layout.set_config(physics);
        }

        ui.separator();
        ui.label(RichText::new("Legend").strong());
        for category in [
            Category::Star,
            Category::Planet,
            Category::Moon,
            Category::Satellite,
        ] {
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(34.0, 34.0), egui::Sense::hover());
                ui.painter()
                    .circle_filled(rect.center(), node_radius(category), level_color(3, 6));
                ui.label(category.label());
            });
        }

        let repaired = self.catalog_diagnostics + self.rebuild_diagnostics;
        if repaired > 0 {
            ui.separator();
            ui.small(format!(
                "{repaired} catalog entries needed repair; see the log for details."
            ));
        }
    }
}
