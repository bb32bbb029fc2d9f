use std::collections::HashMap;

use crate::catalog::CatalogFetch;
use crate::constellation::{ConstellationGraph, HierarchyTransformer};

use super::super::{Scene, ViewModel, ViewScratch};

pub(in crate::app) fn scene_from_graph(graph: ConstellationGraph) -> Scene {
    let index_by_id = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.clone(), index))
        .collect::<HashMap<_, _>>();

    let mut parent_of = vec![None; graph.nodes.len()];
    let mut children = vec![Vec::new(); graph.nodes.len()];
    let mut edges = Vec::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        let (Some(&source), Some(&target)) = (
            index_by_id.get(&edge.source_id),
            index_by_id.get(&edge.target_id),
        ) else {
            continue;
        };
        if source == target {
            continue;
        }

        parent_of[source] = Some(target);
        children[target].push(source);
        edges.push((source, target));
    }

    Scene {
        graph,
        index_by_id,
        parent_of,
        children,
        edges,
        view_scratch: ViewScratch::default(),
    }
}

impl ViewModel {
    pub(in crate::app) fn rebuild_scene(&mut self) {
        let transformed = self.transformer.transform(self.user.as_deref(), &self.pins);
        self.rebuild_diagnostics = transformed.diagnostics.len();
        self.layout.load_graph(&transformed.graph);
        self.scene = scene_from_graph(transformed.graph);
        self.scene_revision = self.scene_revision.wrapping_add(1);
        self.search_match_cache = None;
        self.hover.refresh(&self.scene);

        if let Some(selection) = &self.selection
            && !self.scene.index_by_id.contains_key(&selection.id)
        {
            self.selection = None;
        }
    }

    pub(in crate::app) fn apply_fetch(&mut self, fetch: CatalogFetch) {
        let (transformer, diagnostics) =
            HierarchyTransformer::new(fetch.skills, self.config.progression);
        self.transformer = transformer;
        self.catalog_diagnostics = diagnostics.len();
        self.user = fetch.user;
        self.fetch_error = None;
        self.rebuild_scene();
    }
}
