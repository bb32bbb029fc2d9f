use std::collections::{HashMap, HashSet};

use crate::catalog::SkillCatalog;
use crate::diagnostics::Diagnostic;

/// Parent/child structure of a catalog, independent of the acting user.
/// Built once per fetch so rebuilds never re-walk ancestor chains.
#[derive(Clone, Debug, Default)]
pub struct StructuralIndex {
    position_by_id: HashMap<String, usize>,
    depth: HashMap<String, usize>,
    children: HashMap<String, Vec<String>>,
    excluded: HashSet<String>,
}

impl StructuralIndex {
    pub fn build(catalog: &SkillCatalog, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut position_by_id = HashMap::with_capacity(catalog.len());
        for (position, skill) in catalog.skills().iter().enumerate() {
            if let Some(reason) = &skill.rejected {
                diagnostics.push(Diagnostic::MalformedSkillEntry {
                    position,
                    reason: reason.clone(),
                });
                continue;
            }
            let Some(id) = &skill.id else {
                diagnostics.push(Diagnostic::MissingSkillId {
                    position,
                    name: skill.name.clone(),
                });
                continue;
            };

            if position_by_id.contains_key(id) {
                diagnostics.push(Diagnostic::DuplicateSkillId { id: id.clone() });
                continue;
            }
            position_by_id.insert(id.clone(), position);
        }

        let mut index = Self {
            position_by_id,
            depth: HashMap::new(),
            children: HashMap::new(),
            excluded: HashSet::new(),
        };

        let mut ids = index.position_by_id.iter().collect::<Vec<_>>();
        ids.sort_unstable_by_key(|(_, position)| **position);
        let ids = ids
            .into_iter()
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();

        for id in &ids {
            if let Some(parent) = index.parent_of(catalog, id) {
                if index.position_by_id.contains_key(parent) {
                    index
                        .children
                        .entry(parent.to_owned())
                        .or_default()
                        .push(id.clone());
                } else {
                    diagnostics.push(Diagnostic::DanglingParent {
                        skill: id.clone(),
                        parent: parent.to_owned(),
                    });
                }
            }
        }

        for id in &ids {
            index.resolve_depth(catalog, id, diagnostics);
        }

        index
    }

    fn parent_of<'c>(&self, catalog: &'c SkillCatalog, id: &str) -> Option<&'c str> {
        let position = *self.position_by_id.get(id)?;
        catalog.skills()[position].parent_id.as_deref()
    }

    fn resolve_depth(&mut self, catalog: &SkillCatalog, id: &str, diagnostics: &mut Vec<Diagnostic>) {
        let mut path: Vec<String> = Vec::new();
        let mut on_path: HashSet<String> = HashSet::new();
        let mut cursor = id.to_owned();

        let base = loop {
            if let Some(&known) = self.depth.get(&cursor) {
                break Some(known + 1);
            }
            if self.excluded.contains(&cursor) {
                break None;
            }
            if !on_path.insert(cursor.clone()) {
                let start = path.iter().position(|entry| entry == &cursor).unwrap_or(0);
                diagnostics.push(Diagnostic::ParentCycle {
                    members: path[start..].to_vec(),
                });
                break None;
            }

            path.push(cursor.clone());
            match self.parent_of(catalog, &cursor) {
                Some(parent) if self.position_by_id.contains_key(parent) => {
                    cursor = parent.to_owned();
                }
                _ => break Some(0),
            }
        };

        match base {
            Some(base) => {
                let last = path.len().saturating_sub(1);
                for (offset, entry) in path.into_iter().enumerate() {
                    self.depth.insert(entry, base + (last - offset));
                }
            }
            None => self.excluded.extend(path),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position_by_id.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.position_by_id.get(id).copied()
    }

    /// Number of parent links between `id` and its root. `None` for unknown
    /// ids and for skills whose ancestry runs into a cycle.
    pub fn depth(&self, id: &str) -> Option<usize> {
        self.depth.get(id).copied()
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::catalog::SkillDefinition;

    fn skill(id: Option<&str>, parent: Option<&str>) -> SkillDefinition {
        SkillDefinition {
            id: id.map(str::to_owned),
            name: id.unwrap_or("anonymous").to_owned(),
            parent_id: parent.map(str::to_owned),
            description: String::new(),
            unlocks: Value::Null,
            rejected: None,
        }
    }

    fn index(skills: Vec<SkillDefinition>) -> (StructuralIndex, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let catalog = SkillCatalog::new(skills, &mut diagnostics);
        let index = StructuralIndex::build(&catalog, &mut diagnostics);
        (index, diagnostics)
    }

    #[test]
    fn depth_follows_parent_chain() {
        let (index, diagnostics) = index(vec![
            skill(Some("m"), Some("p")),
            skill(Some("s"), None),
            skill(Some("sat"), Some("m")),
            skill(Some("p"), Some("s")),
        ]);
        assert!(diagnostics.is_empty());
        assert_eq!(index.depth("s"), Some(0));
        assert_eq!(index.depth("p"), Some(1));
        assert_eq!(index.depth("m"), Some(2));
        assert_eq!(index.depth("sat"), Some(3));
        assert_eq!(index.children("s"), ["p".to_owned()]);
    }

    #[test]
    fn cycles_are_excluded_and_reported() {
        let (index, diagnostics) = index(vec![
            skill(Some("a"), Some("b")),
            skill(Some("b"), Some("a")),
            skill(Some("c"), Some("a")),
            skill(Some("root"), None),
        ]);
        assert!(index.is_excluded("a"));
        assert!(index.is_excluded("b"));
        assert!(index.is_excluded("c"));
        assert_eq!(index.depth("root"), Some(0));
        assert_eq!(
            diagnostics
                .iter()
                .filter(|diagnostic| matches!(diagnostic, Diagnostic::ParentCycle { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let (index, diagnostics) = index(vec![skill(Some("x"), Some("x"))]);
        assert!(index.is_excluded("x"));
        assert!(matches!(
            diagnostics.as_slice(),
            [Diagnostic::ParentCycle { members }] if members == &vec!["x".to_owned()]
        ));
    }

    #[test]
    fn dangling_parent_counts_only_resolved_links() {
        let (index, diagnostics) = index(vec![
            skill(Some("orphan"), Some("ghost")),
            skill(Some("child"), Some("orphan")),
        ]);
        assert_eq!(index.depth("orphan"), Some(0));
        assert_eq!(index.depth("child"), Some(1));
        assert!(matches!(diagnostics.as_slice(), [Diagnostic::DanglingParent { .. }]));
    }

    #[test]
    fn missing_and_duplicate_ids_are_reported() {
        let mut anonymous = skill(None, None);
        anonymous.unlocks = json!({ "userId": "u1", "level": 1 });
        let (index, diagnostics) = index(vec![
            anonymous,
            skill(Some("a"), None),
            skill(Some("a"), None),
        ]);
        assert!(index.contains("a"));
        assert_eq!(index.position("a"), Some(1));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn malformed_entries_are_dropped_at_their_position() {
        let (index, diagnostics) = index(vec![
            skill(Some("a"), None),
            SkillDefinition::from_entry(Value::Null),
            skill(Some("b"), Some("a")),
        ]);
        assert_eq!(index.position("b"), Some(2));
        assert_eq!(index.depth("b"), Some(1));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::MalformedSkillEntry {
                position: 1,
                reason: "expected an object, found null".to_owned(),
            }]
        );
    }
}
