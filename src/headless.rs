use eframe::egui::Vec2;
use serde::Serialize;

use crate::catalog::CatalogFetch;
use crate::config::EngineConfig;
use crate::constellation::{Category, HierarchyTransformer, PinStore};
use crate::layout::{LayoutEngine, RebuildSignal};

const MAX_REBUILD_CYCLES: usize = 16;
const MAX_TICKS_PER_RUN: u32 = 20_000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpNode {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub level_for_color: u32,
    pub x: f32,
    pub y: f32,
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct DumpEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub nodes: Vec<DumpNode>,
    pub edges: Vec<DumpEdge>,
    #[serde(rename = "rebuildCycles")]
    pub rebuild_cycles: usize,
}

/// Runs transform, layout and pin write-back until the rebuild signal stops
/// firing, without a window.
pub fn settle_layout(fetch: CatalogFetch, config: &EngineConfig, viewport: Vec2) -> LayoutDump {
    let (transformer, _) = HierarchyTransformer::new(fetch.skills, config.progression);
    let user = fetch.user.as_deref();
    let mut pins = PinStore::default();
    let mut signal = RebuildSignal::default();
    let mut layout = LayoutEngine::new(config.physics, viewport);

    let mut graph = transformer.transform(user, &pins).graph;
    let mut rebuild_cycles = 0;
    loop {
        layout.load_graph(&graph);
        if layout.run_to_settlement(MAX_TICKS_PER_RUN).is_some() {
            let outcome = layout.settle(&mut pins, &config.view, config.pin_tolerance);
            if outcome.pins_changed > 0 {
                signal.raise();
            }
        }

        if !signal.take() || rebuild_cycles >= MAX_REBUILD_CYCLES {
            break;
        }
        rebuild_cycles += 1;
        graph = transformer.transform(user, &pins).graph;
    }

    tracing::info!(
        nodes = graph.nodes.len(),
        pins = pins.len(),
        rebuild_cycles,
        "headless layout settled"
    );

    let nodes = graph
        .nodes
        .iter()
        .zip(layout.nodes())
        .map(|(node, sim)| DumpNode {
            id: node.id.clone(),
            name: node.name.clone(),
            category: node.category,
            level_for_color: node.level_for_color,
            x: sim.position.x,
            y: sim.position.y,
            pinned: pins.get(&node.id).is_some(),
        })
        .collect();
    let edges = graph
        .edges
        .into_iter()
        .map(|edge| DumpEdge {
            id: edge.id,
            source: edge.source_id,
            target: edge.target_id,
        })
        .collect();

    LayoutDump {
        nodes,
        edges,
        rebuild_cycles,
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::catalog::SkillDefinition;

    fn skill(id: &str, parent: Option<&str>, level: u32) -> SkillDefinition {
        SkillDefinition {
            id: Some(id.to_owned()),
            name: id.to_uppercase(),
            parent_id: parent.map(str::to_owned),
            description: String::new(),
            unlocks: json!({ "userId": "u1", "level": level }),
            rejected: None,
        }
    }

    fn chain() -> CatalogFetch {
        CatalogFetch {
            skills: vec![
                skill("s", None, 5),
                skill("p", Some("s"), 3),
                skill("m", Some("p"), 2),
            ],
            user: Some("u1".to_owned()),
        }
    }

    #[test]
    fn chain_settles_with_pinned_star_and_serializes() {
        let dump = settle_layout(chain(), &EngineConfig::default(), vec2(1000.0, 800.0));
        assert!(dump.rebuild_cycles >= 1);
        assert!(dump.rebuild_cycles < MAX_REBUILD_CYCLES);

        let pinned = dump
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node.pinned))
            .collect::<Vec<_>>();
        assert_eq!(pinned, vec![("s", true), ("p", false), ("m", false)]);

        let value = serde_json::to_value(&dump).expect("serializable dump");
        assert_eq!(value["nodes"][0]["category"], json!("star"));
        assert_eq!(value["nodes"][0]["levelForColor"], json!(10));
        assert_eq!(value["nodes"][0]["name"], json!("S"));
        assert_eq!(value["edges"][0], json!({ "id": "p->s", "source": "p", "target": "s" }));
        assert!(value["nodes"][2]["x"].as_f64().is_some_and(f64::is_finite));
    }

    #[test]
    fn unauthenticated_user_dumps_empty_graph() {
        let mut fetch = chain();
        fetch.user = None;
        let dump = settle_layout(fetch, &EngineConfig::default(), vec2(800.0, 600.0));
        assert_eq!(dump.rebuild_cycles, 0);
        let value = serde_json::to_value(&dump).expect("serializable dump");
        assert_eq!(value["nodes"], Value::Array(Vec::new()));
        assert_eq!(value["edges"], Value::Array(Vec::new()));
    }
}
