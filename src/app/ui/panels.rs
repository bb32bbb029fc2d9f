use eframe::egui::{self, Align, Color32, Context, Layout, Rect, vec2};

use crate::catalog::CatalogFetch;
use crate::config::EngineConfig;
use crate::constellation::{HierarchyTransformer, PinStore};
use crate::layout::{LayoutEngine, RebuildSignal, ViewTransform};

use super::super::highlight::HoverState;
use super::super::{Scene, ViewModel};

const INITIAL_VIEWPORT: egui::Vec2 = vec2(1200.0, 800.0);

impl ViewModel {
    pub(in crate::app) fn new(fetch: CatalogFetch, config: EngineConfig) -> Self {
        let (transformer, diagnostics) =
            HierarchyTransformer::new(fetch.skills, config.progression);

        let mut model = Self {
            transformer,
            user: fetch.user,
            config,
            pins: PinStore::default(),
            rebuild: RebuildSignal::default(),
            layout: LayoutEngine::new(config.physics, INITIAL_VIEWPORT),
            scene: Scene::default(),
            scene_revision: 0,
            view: ViewTransform::default(),
            container: Rect::from_min_size(egui::Pos2::ZERO, INITIAL_VIEWPORT),
            transition: None,
            hover: HoverState::default(),
            selection: None,
            search: String::new(),
            search_match_cache: None,
            show_pins: false,
            catalog_diagnostics: diagnostics.len(),
            rebuild_diagnostics: 0,
            fetch_error: None,
        };
        model.rebuild_scene();
        model
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool, is_reloading: bool) {
        if self.rebuild.take() {
            self.rebuild_scene();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Skill constellation");
                    ui.separator();
                    match &self.user {
                        Some(user) => ui.label(format!("user: {user}")),
                        None => ui.label("not signed in"),
                    };
                    ui.label(format!("skills: {}", self.scene.graph.nodes.len()));
                    ui.label(format!("stars: {}", self.scene.graph.star_count()));
                    ui.label(format!("links: {}", self.scene.graph.edges.len()));
                    if self.pins.is_empty() {
                        ui.label("no pinned stars");
                    } else {
                        ui.label(format!("pinned stars: {}", self.pins.len()));
                    }

                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui
                        .button("Reset layout")
                        .on_hover_text("Forget pinned stars and lay the constellation out again.")
                        .clicked()
                    {
                        self.reset_layout();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "simulation: {} (alpha {:.3})",
                            self.layout.state().label(),
                            self.layout.alpha()
                        ));
                        if is_reloading {
                            ui.spinner();
                        }
                    });
                });

                if let Some(error) = &self.fetch_error {
                    ui.colored_label(
                        Color32::from_rgb(240, 128, 112),
                        format!("Reload failed, showing previous data: {error}"),
                    );
                }
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        self.draw_detail_overlay(ctx);
    }

    pub(in crate::app) fn reset_layout(&mut self) {
        tracing::info!(pins = self.pins.len(), "resetting constellation layout");
        self.layout.stop();
        self.pins.clear();
        self.layout.reset();
        self.transition = None;
        self.rebuild_scene();
    }

    pub(in crate::app) fn teardown(&mut self) {
        self.layout.stop();
        self.hover.clear();
        self.transition = None;
        self.selection = None;
    }
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.teardown();
    }
}
