mod pins;
mod progression;
mod structure;
mod transform;

use std::collections::HashMap;

use eframe::egui::Vec2;
use serde::Serialize;

pub use pins::PinStore;
pub use progression::ProgressionCurve;
pub use structure::StructuralIndex;
pub use transform::HierarchyTransformer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Star,
    Planet,
    Moon,
    Satellite,
}

impl Category {
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => Self::Star,
            1 => Self::Planet,
            2 => Self::Moon,
            _ => Self::Satellite,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Star => "star",
            Self::Planet => "planet",
            Self::Moon => "moon",
            Self::Satellite => "satellite",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parent_id: Option<String>,
    pub category: Category,
    pub user_level: u32,
    pub user_experience: u32,
    pub experience_needed_for_next_level: u64,
    pub level_for_color: u32,
    pub is_unlocked_by_user: bool,
    pub fixed: Option<Vec2>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstellationGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl ConstellationGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_by_id(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.as_str(), index))
            .collect()
    }

    #[cfg(test)]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn star_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.category == Category::Star)
            .count()
    }
}
