use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui::{self, Context, Pos2, Rect, Vec2};

use crate::catalog::{CatalogFetch, FetchError, SkillSource, fetch_all};
use crate::config::EngineConfig;
use crate::constellation::{ConstellationGraph, HierarchyTransformer, PinStore};
use crate::layout::{LayoutEngine, RebuildSignal, TransformTransition, ViewTransform};

mod graph;
mod highlight;
mod render_utils;
mod ui;

use highlight::HoverState;

type FetchResult = Result<CatalogFetch, FetchError>;

pub struct SkillConstellationApp {
    source: Arc<dyn SkillSource>,
    config: EngineConfig,
    refresh_every: Option<Duration>,
    state: AppState,
    reload_rx: Option<Receiver<FetchResult>>,
    last_fetch: Instant,
}

enum AppState {
    Loading { rx: Receiver<FetchResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    transformer: HierarchyTransformer,
    user: Option<String>,
    config: EngineConfig,
    pins: PinStore,
    rebuild: RebuildSignal,
    layout: LayoutEngine,
    scene: Scene,
    scene_revision: u64,
    view: ViewTransform,
    container: Rect,
    transition: Option<TransformTransition>,
    hover: HoverState,
    selection: Option<Selection>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    show_pins: bool,
    catalog_diagnostics: usize,
    rebuild_diagnostics: usize,
    fetch_error: Option<String>,
}

// Indices match both `graph.nodes` and the layout engine's node order.
#[derive(Default)]
struct Scene {
    graph: ConstellationGraph,
    index_by_id: HashMap<String, usize>,
    parent_of: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    edges: Vec<(usize, usize)>,
    view_scratch: ViewScratch,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_mask: Vec<bool>,
}

struct SearchMatchCache {
    query: String,
    scene_revision: u64,
    matches: Arc<HashSet<usize>>,
}

struct Selection {
    id: String,
    anchor: Pos2,
    overlay_size: Vec2,
}

impl SkillConstellationApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: Arc<dyn SkillSource>,
        config: EngineConfig,
        refresh_every: Option<Duration>,
    ) -> Self {
        let state = Self::start_load(&source);
        Self {
            source,
            config,
            refresh_every,
            state,
            reload_rx: None,
            last_fetch: Instant::now(),
        }
    }

    fn spawn_load(source: &Arc<dyn SkillSource>) -> Receiver<FetchResult> {
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(source);

        thread::spawn(move || {
            let _ = tx.send(fetch_all(source.as_ref()));
        });

        rx
    }

    fn start_load(source: &Arc<dyn SkillSource>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn refresh_due(refresh_every: Option<Duration>, last_fetch: Instant, ctx: &Context) -> bool {
        let Some(every) = refresh_every else {
            return false;
        };
        let elapsed = last_fetch.elapsed();
        if elapsed >= every {
            return true;
        }
        ctx.request_repaint_after(every - elapsed);
        false
    }
}

impl eframe::App for SkillConstellationApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(fetch)) => {
                        self.last_fetch = Instant::now();
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            fetch,
                            self.config,
                        ))));
                    }
                    Ok(Err(error)) => {
                        tracing::error!(%error, "catalog fetch failed");
                        transition = Some(AppState::Error(error.to_string()));
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint_after(Duration::from_millis(50)),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background fetch worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading skill catalog...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the skill catalog");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.source));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                let refresh_due =
                    !is_reloading && Self::refresh_due(self.refresh_every, self.last_fetch, ctx);
                if (reload_requested || refresh_due) && self.reload_rx.is_none() {
                    self.last_fetch = Instant::now();
                    self.reload_rx = Some(Self::spawn_load(&self.source));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(fetch)) => model.apply_fetch(fetch),
                        Ok(Err(error)) => {
                            tracing::warn!(%error, "catalog reload failed; keeping previous data");
                            model.fetch_error = Some(error.to_string());
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint_after(Duration::from_millis(50));
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.fetch_error = Some("Background fetch worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
