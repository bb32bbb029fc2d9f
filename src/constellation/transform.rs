use std::collections::{HashMap, HashSet};

use crate::catalog::{SkillCatalog, SkillDefinition, UnlockRecord};
use crate::diagnostics::{self, Diagnostic};

use super::{
    Category, ConstellationGraph, GraphEdge, GraphNode, PinStore, ProgressionCurve,
    StructuralIndex,
};

#[derive(Clone, Debug, Default)]
pub struct Transformed {
    pub graph: ConstellationGraph,
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns a fetched catalog into the categorized node/edge set for one user.
pub struct HierarchyTransformer {
    catalog: SkillCatalog,
    index: StructuralIndex,
    curve: ProgressionCurve,
}

impl HierarchyTransformer {
    pub fn new(skills: Vec<SkillDefinition>, curve: ProgressionCurve) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let catalog = SkillCatalog::new(skills, &mut diagnostics);
        let index = StructuralIndex::build(&catalog, &mut diagnostics);
        diagnostics::report(&diagnostics);

        (
            Self {
                catalog,
                index,
                curve,
            },
            diagnostics,
        )
    }

    fn parent_of(&self, id: &str) -> Option<&str> {
        let position = self.index.position(id)?;
        self.catalog.skills()[position].parent_id.as_deref()
    }

    fn is_primary(&self, id: &str, position: usize) -> bool {
        self.index.position(id) == Some(position) && !self.index.is_excluded(id)
    }

    fn unlocked_records<'a>(
        &'a self,
        user: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> HashMap<&'a str, &'a UnlockRecord> {
        let mut seeded = 0usize;
        let mut missing_id = 0usize;
        let mut records = HashMap::new();

        for (position, (skill, unlocks)) in self.catalog.entries().enumerate() {
            let Some(record) = unlocks.for_user(user) else {
                continue;
            };
            seeded += 1;

            let Some(id) = skill.id.as_deref() else {
                missing_id += 1;
                continue;
            };
            if self.is_primary(id, position) {
                records.insert(id, record);
            }
        }

        if missing_id > 0 {
            diagnostics.push(Diagnostic::CandidateCountMismatch {
                seeded,
                kept: seeded - missing_id,
            });
        }
        records
    }

    fn with_ancestors<'a>(&'a self, unlocked: &HashMap<&'a str, &'a UnlockRecord>) -> HashSet<&'a str> {
        let mut candidates = unlocked.keys().copied().collect::<HashSet<_>>();
        let mut frontier = candidates.iter().copied().collect::<Vec<_>>();

        while let Some(id) = frontier.pop() {
            let Some(parent) = self.parent_of(id) else {
                continue;
            };
            if !self.index.contains(parent) || self.index.is_excluded(parent) {
                continue;
            }
            if candidates.insert(parent) {
                frontier.push(parent);
            }
        }
        candidates
    }

    fn unlocked_descendant_levels(
        &self,
        root: &str,
        candidates: &HashSet<&str>,
        unlocked: &HashMap<&str, &UnlockRecord>,
    ) -> u32 {
        let mut total = 0u32;
        let mut visited = HashSet::from([root]);
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            for child in self.index.children(id) {
                let child = child.as_str();
                if !candidates.contains(child) || !visited.insert(child) {
                    continue;
                }
                if let Some(record) = unlocked.get(child) {
                    total = total.saturating_add(record.level);
                }
                stack.push(child);
            }
        }
        total
    }

    pub fn transform(&self, user: Option<&str>, pins: &PinStore) -> Transformed {
        let Some(user) = user.map(str::trim).filter(|user| !user.is_empty()) else {
            return Transformed::default();
        };
        if self.catalog.is_empty() {
            return Transformed::default();
        }

        let mut diagnostics = Vec::new();
        let unlocked = self.unlocked_records(user, &mut diagnostics);
        let candidates = self.with_ancestors(&unlocked);

        let mut nodes = Vec::with_capacity(candidates.len());
        for (position, skill) in self.catalog.skills().iter().enumerate() {
            let Some(id) = skill.id.as_deref() else {
                continue;
            };
            if !candidates.contains(id) || !self.is_primary(id, position) {
                continue;
            }

            let category = Category::from_depth(self.index.depth(id).unwrap_or(0));
            let record = unlocked.get(id);
            let user_level = record.map_or(0, |record| record.level);
            let user_experience = record.map_or(0, |record| record.experience);
            let level_for_color = if category == Category::Star {
                user_level.saturating_add(self.unlocked_descendant_levels(id, &candidates, &unlocked))
            } else {
                user_level
            };
            let fixed = if category == Category::Star {
                pins.get(id)
            } else {
                None
            };

            nodes.push(GraphNode {
                id: id.to_owned(),
                name: skill.name.clone(),
                description: skill.description.clone(),
                parent_id: skill.parent_id.clone(),
                category,
                user_level,
                user_experience,
                experience_needed_for_next_level: self.curve.experience_for_next_level(user_level),
                level_for_color,
                is_unlocked_by_user: record.is_some(),
                fixed,
            });
        }

        let edges = nodes
            .iter()
            .filter_map(|node| {
                let parent = node.parent_id.as_deref()?;
                candidates.contains(parent).then(|| GraphEdge {
                    id: format!("{}->{parent}", node.id),
                    source_id: node.id.clone(),
                    target_id: parent.to_owned(),
                })
            })
            .collect::<Vec<_>>();

        diagnostics::report(&diagnostics);
        tracing::debug!(
            user,
            nodes = nodes.len(),
            edges = edges.len(),
            "rebuilt constellation graph"
        );

        Transformed {
            graph: ConstellationGraph { nodes, edges },
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use eframe::egui::vec2;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    use super::*;

    fn skill(id: Option<&str>, parent: Option<&str>, unlocks: Value) -> SkillDefinition {
        SkillDefinition {
            id: id.map(str::to_owned),
            name: id.map_or_else(|| "anonymous".to_owned(), |id| format!("Skill {id}")),
            parent_id: parent.map(str::to_owned),
            description: String::new(),
            unlocks,
            rejected: None,
        }
    }

    fn unlock(user: &str, level: u32) -> Value {
        json!({ "userId": user, "level": level, "exp": level * 10 })
    }

    fn run(skills: Vec<SkillDefinition>, user: Option<&str>) -> Transformed {
        let (transformer, _) = HierarchyTransformer::new(skills, ProgressionCurve::default());
        transformer.transform(user, &PinStore::default())
    }

    fn categories(graph: &ConstellationGraph) -> BTreeMap<String, Category> {
        graph
            .nodes
            .iter()
            .map(|node| (node.id.clone(), node.category))
            .collect()
    }

    fn single_chain() -> Vec<SkillDefinition> {
        vec![
            skill(Some("s"), None, unlock("u1", 5)),
            skill(Some("p"), Some("s"), unlock("u1", 3)),
            skill(Some("m"), Some("p"), unlock("u1", 2)),
        ]
    }

    #[test]
    fn empty_catalog_yields_empty_graph() {
        let transformed = run(Vec::new(), Some("u1"));
        assert!(transformed.graph.nodes.is_empty());
        assert!(transformed.graph.edges.is_empty());
        assert!(transformed.diagnostics.is_empty());
    }

    #[test]
    fn unauthenticated_user_yields_empty_graph() {
        assert!(run(single_chain(), None).graph.is_empty());
        assert!(run(single_chain(), Some("  ")).graph.is_empty());
    }

    #[test]
    fn single_chain_is_categorized_and_aggregated() {
        let graph = run(single_chain(), Some("u1")).graph;
        assert_eq!(graph.nodes.len(), 3);

        let by_id = graph
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node))
            .collect::<HashMap<_, _>>();
        assert_eq!(by_id["s"].category, Category::Star);
        assert_eq!(by_id["p"].category, Category::Planet);
        assert_eq!(by_id["m"].category, Category::Moon);
        assert_eq!(by_id["s"].level_for_color, 10);
        assert_eq!(by_id["p"].level_for_color, 3);
        assert_eq!(by_id["m"].level_for_color, 2);
        assert_eq!(by_id["p"].user_experience, 30);
        assert_eq!(by_id["p"].experience_needed_for_next_level, 400);

        let edges = graph
            .edges
            .iter()
            .map(|edge| (edge.source_id.as_str(), edge.target_id.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(edges, vec![("p", "s"), ("m", "p")]);
    }

    #[test]
    fn entry_without_id_is_dropped_with_warning() {
        let mut skills = single_chain();
        skills.push(skill(None, Some("s"), unlock("u1", 4)));
        let transformed = run(skills, Some("u1"));

        assert_eq!(transformed.graph.nodes.len(), 3);
        assert!(transformed.diagnostics.contains(&Diagnostic::CandidateCountMismatch {
            seeded: 4,
            kept: 3
        }));
        assert_eq!(transformed.graph.node("s").map(|node| node.level_for_color), Some(10));
    }

    #[test]
    fn locked_ancestors_are_included_with_zero_level() {
        let skills = vec![
            skill(Some("s"), None, Value::Null),
            skill(Some("p"), Some("s"), json!([])),
            skill(Some("m"), Some("p"), unlock("u1", 4)),
            skill(Some("other"), None, unlock("u2", 9)),
        ];
        let graph = run(skills, Some("u1")).graph;

        assert_eq!(graph.nodes.len(), 3);
        let star = graph.node("s").expect("star present");
        assert_eq!(star.user_level, 0);
        assert!(!star.is_unlocked_by_user);
        assert_eq!(star.level_for_color, 4);
        let planet = graph.node("p").expect("planet present");
        assert_eq!(planet.category, Category::Planet);
        assert_eq!(planet.user_level, 0);
        assert!(!planet.is_unlocked_by_user);
        assert!(graph.node("other").is_none());
    }

    #[test]
    fn numeric_user_ids_match_string_user() {
        let skills = vec![skill(Some("s"), None, json!([{ "userId": 17, "level": 2 }]))];
        let graph = run(skills, Some("17")).graph;
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.nodes[0].is_unlocked_by_user);
    }

    #[test]
    fn dangling_parent_keeps_structural_category() {
        let skills = vec![
            skill(Some("s"), None, Value::Null),
            skill(Some("p"), Some("s"), Value::Null),
            skill(Some("m"), Some("p"), unlock("u1", 1)),
            skill(Some("lost"), Some("ghost"), unlock("u1", 2)),
        ];
        let graph = run(skills, Some("u1")).graph;
        assert_eq!(graph.node("m").map(|node| node.category), Some(Category::Moon));
        assert_eq!(graph.node("lost").map(|node| node.category), Some(Category::Star));
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn cyclic_skills_are_excluded_without_hanging() {
        let skills = vec![
            skill(Some("a"), Some("b"), unlock("u1", 1)),
            skill(Some("b"), Some("a"), unlock("u1", 1)),
            skill(Some("s"), None, unlock("u1", 1)),
        ];
        let (transformer, diagnostics) =
            HierarchyTransformer::new(skills, ProgressionCurve::default());
        assert!(diagnostics
            .iter()
            .any(|diagnostic| matches!(diagnostic, Diagnostic::ParentCycle { .. })));

        let graph = transformer.transform(Some("u1"), &PinStore::default()).graph;
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].id, "s");
    }

    #[test]
    fn only_stars_pick_up_pins() {
        let mut pins = PinStore::default();
        pins.pin("s", vec2(40.0, -12.0), 0.5);
        pins.pin("p", vec2(1.0, 1.0), 0.5);

        let (transformer, _) = HierarchyTransformer::new(single_chain(), ProgressionCurve::default());
        let graph = transformer.transform(Some("u1"), &pins).graph;
        assert_eq!(graph.node("s").and_then(|node| node.fixed), Some(vec2(40.0, -12.0)));
        assert_eq!(graph.node("p").and_then(|node| node.fixed), None);
    }

    fn structural_depth(skills: &[SkillDefinition], id: &str) -> usize {
        let mut depth = 0;
        let mut cursor = id.to_owned();
        while let Some(parent) = skills
            .iter()
            .find(|skill| skill.id.as_deref() == Some(cursor.as_str()))
            .and_then(|skill| skill.parent_id.clone())
        {
            depth += 1;
            cursor = parent;
        }
        depth
    }

    fn is_descendant(skills: &[SkillDefinition], node: &str, ancestor: &str) -> bool {
        let mut cursor = node.to_owned();
        while let Some(parent) = skills
            .iter()
            .find(|skill| skill.id.as_deref() == Some(cursor.as_str()))
            .and_then(|skill| skill.parent_id.clone())
        {
            if parent == ancestor {
                return true;
            }
            cursor = parent;
        }
        false
    }

    fn arbitrary_catalog() -> impl Strategy<Value = Vec<SkillDefinition>> {
        prop::collection::vec((any::<prop::sample::Index>(), any::<bool>(), prop::option::of(0u32..12)), 1..40)
            .prop_map(|entries| {
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(position, (parent_pick, is_root, level))| {
                        let parent = (position > 0 && !is_root)
                            .then(|| format!("k{}", parent_pick.index(position)));
                        let unlocks = level.map_or(Value::Null, |level| unlock("u1", level));
                        SkillDefinition {
                            id: Some(format!("k{position}")),
                            name: format!("Skill {position}"),
                            parent_id: parent,
                            description: String::new(),
                            unlocks,
                            rejected: None,
                        }
                    })
                    .collect()
            })
    }

    proptest! {
        #[test]
        fn categorization_is_idempotent(skills in arbitrary_catalog()) {
            let (transformer, _) = HierarchyTransformer::new(skills, ProgressionCurve::default());
            let pins = PinStore::default();
            let first = transformer.transform(Some("u1"), &pins).graph;
            let second = transformer.transform(Some("u1"), &pins).graph;
            prop_assert_eq!(categories(&first), categories(&second));
        }

        #[test]
        fn category_matches_catalog_depth(skills in arbitrary_catalog()) {
            let graph = run(skills.clone(), Some("u1")).graph;
            for node in &graph.nodes {
                prop_assert_eq!(
                    node.category,
                    Category::from_depth(structural_depth(&skills, &node.id))
                );
            }
        }

        #[test]
        fn stars_aggregate_unlocked_descendants(skills in arbitrary_catalog()) {
            let graph = run(skills.clone(), Some("u1")).graph;
            for star in graph.nodes.iter().filter(|node| node.category == Category::Star) {
                let expected = star.user_level
                    + graph
                        .nodes
                        .iter()
                        .filter(|node| node.is_unlocked_by_user && is_descendant(&skills, &node.id, &star.id))
                        .map(|node| node.user_level)
                        .sum::<u32>();
                prop_assert_eq!(star.level_for_color, expected);
            }
        }

        #[test]
        fn graph_is_closed_under_parents_with_one_edge_each(skills in arbitrary_catalog()) {
            let graph = run(skills, Some("u1")).graph;
            let ids = graph.nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
            for node in &graph.nodes {
                let outgoing = graph.edges.iter().filter(|edge| edge.source_id == node.id).count();
                match node.parent_id.as_deref() {
                    Some(parent) => {
                        prop_assert!(ids.contains(parent));
                        prop_assert_eq!(outgoing, 1);
                    }
                    None => prop_assert_eq!(outgoing, 0),
                }
            }
        }
    }
}
