mod forces;
mod frame;
mod quadtree;

use std::collections::HashMap;
use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};

use crate::config::{PhysicsConfig, ViewConfig};
use crate::constellation::{Category, ConstellationGraph, PinStore};
use crate::util::stable_pair;

use forces::{ForceParams, apply_centering, apply_collisions, apply_links, apply_repulsion};
use quadtree::BarnesHutTree;

pub use frame::{TransformTransition, ViewTransform, fit_bounds};

const GOLDEN_ANGLE: f32 = PI * 0.763_932;
const SEED_SPACING: f32 = 10.0;

pub fn collision_scale(category: Category) -> f32 {
    match category {
        Category::Star => 1.6,
        Category::Planet => 1.2,
        Category::Moon => 0.9,
        Category::Satellite => 0.7,
    }
}

#[derive(Clone, Debug)]
pub struct SimNode {
    pub id: String,
    pub category: Category,
    pub position: Vec2,
    pub velocity: Vec2,
    pub fixed: Option<Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Idle,
    Running,
    Settled,
    Stopped,
}

impl SimulationState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Settled => "settled",
            Self::Stopped => "stopped",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub ticks: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SettlementOutcome {
    pub frame: Option<ViewTransform>,
    pub pins_changed: usize,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    radii: Vec<f32>,
    free: Vec<bool>,
}

/// Iterative force layout over one constellation graph. Node order always
/// mirrors the order of the graph last passed to [`LayoutEngine::load_graph`].
pub struct LayoutEngine {
    config: PhysicsConfig,
    viewport: Vec2,
    nodes: Vec<SimNode>,
    edges: Vec<(usize, usize)>,
    alpha: f32,
    state: SimulationState,
    ticks: u32,
    auto_framed: bool,
    scratch: Scratch,
}

impl LayoutEngine {
    pub fn new(config: PhysicsConfig, viewport: Vec2) -> Self {
        Self {
            config,
            viewport,
            nodes: Vec::new(),
            edges: Vec::new(),
            alpha: 0.0,
            state: SimulationState::Idle,
            ticks: 0,
            auto_framed: false,
            scratch: Scratch::default(),
        }
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.state == SimulationState::Running
    }

    #[cfg(test)]
    pub fn has_auto_framed(&self) -> bool {
        self.auto_framed
    }

    pub fn set_config(&mut self, config: PhysicsConfig) {
        if self.config != config {
            self.config = config;
            self.reheat();
        }
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        if viewport.x > 0.0 && viewport.y > 0.0 {
            self.viewport = viewport;
        }
    }

    fn center(&self) -> Vec2 {
        self.viewport * 0.5
    }

    /// Re-seeds the simulation with a new node set. Nodes whose id survives keep
    /// their position and velocity; pinned nodes jump to their pin.
    pub fn load_graph(&mut self, graph: &ConstellationGraph) {
        let mut prior = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();
        let index_by_id = graph.index_by_id();

        let mut seeded: Vec<Option<SimNode>> = graph
            .nodes
            .iter()
            .map(|node| {
                let mut sim = prior.remove(&node.id)?;
                sim.category = node.category;
                sim.fixed = node.fixed;
                if let Some(fixed) = node.fixed {
                    sim.position = fixed;
                    sim.velocity = Vec2::ZERO;
                }
                Some(sim)
            })
            .collect();

        let mut order = (0..graph.nodes.len()).collect::<Vec<_>>();
        order.sort_by_key(|&index| graph.nodes[index].category as u8);

        let center = self.center();
        let mut free_roots = 0usize;
        for index in order {
            if seeded[index].is_some() {
                continue;
            }

            let node = &graph.nodes[index];
            let parent_position = node
                .parent_id
                .as_deref()
                .and_then(|parent| index_by_id.get(parent))
                .and_then(|&parent| seeded[parent].as_ref())
                .map(|parent| parent.position);

            let position = match (node.fixed, parent_position) {
                (Some(fixed), _) => fixed,
                (None, Some(parent)) => {
                    let (jx, jy) = stable_pair(&node.id);
                    let mut direction = vec2(jx, jy);
                    if direction.length_sq() <= 0.0001 {
                        direction = vec2(1.0, 0.0);
                    }
                    parent + direction.normalized() * self.config.link_distance * 0.5
                }
                (None, None) => {
                    let radius = SEED_SPACING * (0.5 + free_roots as f32).sqrt();
                    let angle = free_roots as f32 * GOLDEN_ANGLE;
                    free_roots += 1;
                    center + vec2(angle.cos(), angle.sin()) * radius
                }
            };

            seeded[index] = Some(SimNode {
                id: node.id.clone(),
                category: node.category,
                position,
                velocity: Vec2::ZERO,
                fixed: node.fixed,
            });
        }

        self.nodes = seeded.into_iter().flatten().collect();
        self.edges = graph
            .edges
            .iter()
            .filter_map(|edge| {
                let source = *index_by_id.get(edge.source_id.as_str())?;
                let target = *index_by_id.get(edge.target_id.as_str())?;
                (source != target).then_some((source, target))
            })
            .collect();

        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "reseeded layout simulation"
        );
        self.restart();
    }

    pub fn restart(&mut self) {
        self.alpha = 1.0;
        self.ticks = 0;
        self.state = SimulationState::Running;
    }

    pub fn reheat(&mut self) {
        if self.state == SimulationState::Stopped || self.nodes.is_empty() {
            return;
        }
        self.alpha = self.alpha.max(0.3);
        self.state = SimulationState::Running;
    }

    /// Halts the tick loop. A later `load_graph` or `restart` resumes it.
    pub fn stop(&mut self) {
        self.state = SimulationState::Stopped;
    }

    /// Drops every simulated node and the first-frame flag, so the next
    /// `load_graph` lays out from scratch.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.alpha = 0.0;
        self.ticks = 0;
        self.auto_framed = false;
        self.state = SimulationState::Idle;
    }

    /// Advances one tick. Returns the settlement exactly once per run, on the
    /// tick where alpha drops below `alpha_min`.
    pub fn tick(&mut self) -> Option<Settlement> {
        if self.state != SimulationState::Running {
            return None;
        }

        if !self.nodes.is_empty() {
            self.step();
        }
        self.ticks += 1;
        self.alpha += (0.0 - self.alpha) * self.config.alpha_decay;

        if self.alpha < self.config.alpha_min || self.nodes.is_empty() {
            self.state = SimulationState::Settled;
            tracing::debug!(ticks = self.ticks, "layout simulation settled");
            return Some(Settlement { ticks: self.ticks });
        }
        None
    }

    pub fn run_to_settlement(&mut self, max_ticks: u32) -> Option<Settlement> {
        for _ in 0..max_ticks {
            if let Some(settlement) = self.tick() {
                return Some(settlement);
            }
            if !self.is_running() {
                return None;
            }
        }
        None
    }

    fn step(&mut self) {
        let node_count = self.nodes.len();
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.radii.clear();
        scratch.free.clear();
        for node in &self.nodes {
            scratch.positions.push(node.position);
            scratch.velocities.push(node.velocity);
            scratch
                .radii
                .push(self.config.collision_radius * collision_scale(node.category));
            scratch.free.push(node.fixed.is_none());
        }

        let params = ForceParams {
            alpha: self.alpha,
            repulsion: self.config.repulsion,
            softening: self.config.repulsion_softening,
            theta: self.config.theta,
            link_distance: self.config.link_distance,
            link_strength: self.config.link_strength,
            center: self.viewport * 0.5,
            center_strength: self.config.center_strength,
            collision_strength: self.config.collision_strength,
        };

        if let Some(tree) = BarnesHutTree::build(&scratch.positions) {
            apply_repulsion(
                &tree,
                &scratch.positions,
                &scratch.free,
                params,
                &mut scratch.velocities,
            );
            apply_collisions(
                &tree,
                &scratch.positions,
                &scratch.radii,
                &scratch.free,
                params,
                &mut scratch.velocities,
            );
        }
        apply_links(
            &self.edges,
            &scratch.positions,
            &scratch.free,
            params,
            &mut scratch.velocities,
        );
        apply_centering(
            &scratch.positions,
            &scratch.free,
            params,
            &mut scratch.velocities,
        );

        let retain = 1.0 - self.config.velocity_decay;
        for (index, node) in self.nodes.iter_mut().enumerate().take(node_count) {
            if let Some(fixed) = node.fixed {
                node.position = fixed;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let velocity = scratch.velocities[index] * retain;
            if velocity.x.is_finite() && velocity.y.is_finite() {
                node.velocity = velocity;
                node.position += velocity;
            } else {
                node.velocity = Vec2::ZERO;
            }
        }
    }

    fn star_bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut stars = self
            .nodes
            .iter()
            .filter(|node| node.category == Category::Star)
            .map(|node| node.position);
        let first = stars.next()?;
        Some(stars.fold((first, first), |(min, max), position| {
            (min.min(position), max.max(position))
        }))
    }

    /// Handles a settlement: frames the stars on the first one, then writes
    /// back star positions that moved beyond `tolerance` into `pins`.
    pub fn settle(
        &mut self,
        pins: &mut PinStore,
        view: &ViewConfig,
        tolerance: f32,
    ) -> SettlementOutcome {
        let mut outcome = SettlementOutcome::default();

        if !self.auto_framed
            && let Some((min, max)) = self.star_bounds()
        {
            outcome.frame = Some(fit_bounds(min, max, self.viewport, view));
            self.auto_framed = true;
        }

        for node in &mut self.nodes {
            if node.category != Category::Star {
                continue;
            }
            if pins.pin(&node.id, node.position, tolerance) {
                node.fixed = Some(node.position);
                node.velocity = Vec2::ZERO;
                outcome.pins_changed += 1;
            }
        }

        if outcome.pins_changed > 0 {
            tracing::debug!(pins = outcome.pins_changed, "pinned star positions");
        }
        outcome
    }
}

/// One-shot "force data update" flag. Raised by a settlement that changed pins
/// and consumed once per frame, outside the tick that raised it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RebuildSignal {
    pending: bool,
}

impl RebuildSignal {
    pub fn raise(&mut self) {
        self.pending = true;
    }

    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
