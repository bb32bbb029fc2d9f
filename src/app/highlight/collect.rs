use std::collections::HashSet;

pub(in crate::app) fn ancestors(parent_of: &[Option<usize>], start: usize) -> Vec<usize> {
    let mut visited = HashSet::from([start]);
    let mut found = Vec::new();
    let mut current = parent_of.get(start).copied().flatten();

    while let Some(index) = current {
        if !visited.insert(index) {
            break;
        }
        found.push(index);
        current = parent_of.get(index).copied().flatten();
    }

    found
}

pub(in crate::app) fn descendants(children: &[Vec<usize>], start: usize) -> Vec<usize> {
    let mut visited = HashSet::from([start]);
    let mut found = Vec::new();
    let mut stack = children.get(start).cloned().unwrap_or_default();

    while let Some(index) = stack.pop() {
        if !visited.insert(index) {
            continue;
        }
        found.push(index);
        if let Some(next) = children.get(index) {
            stack.extend(next.iter().copied());
        }
    }

    found
}

pub(in crate::app) fn constellation(
    parent_of: &[Option<usize>],
    children: &[Vec<usize>],
    start: usize,
) -> HashSet<usize> {
    let mut members = HashSet::from([start]);
    members.extend(ancestors(parent_of, start));
    members.extend(descendants(children, start));
    members
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn children_from(parent_of: &[Option<usize>]) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); parent_of.len()];
        for (child, parent) in parent_of.iter().enumerate() {
            if let Some(parent) = parent {
                children[*parent].push(child);
            }
        }
        children
    }

    fn sorted(set: HashSet<usize>) -> Vec<usize> {
        let mut items = set.into_iter().collect::<Vec<_>>();
        items.sort_unstable();
        items
    }

    #[test]
    fn constellation_spans_whole_chain_but_not_siblings_subtrees() {
        // 0 <- 1 <- 2 <- 3, 1 <- 4, 0 <- 5, 6 is a separate star.
        let parent_of = vec![None, Some(0), Some(1), Some(2), Some(1), Some(0), None];
        let children = children_from(&parent_of);

        assert_eq!(sorted(constellation(&parent_of, &children, 2)), vec![0, 1, 2, 3]);
        assert_eq!(
            sorted(constellation(&parent_of, &children, 0)),
            vec![0, 1, 2, 3, 4, 5]
        );
        assert_eq!(sorted(constellation(&parent_of, &children, 6)), vec![6]);
    }

    #[test]
    fn cyclic_links_terminate() {
        let parent_of = vec![Some(1), Some(0)];
        let children = children_from(&parent_of);
        assert_eq!(sorted(constellation(&parent_of, &children, 0)), vec![0, 1]);
    }

    fn forest() -> impl Strategy<Value = Vec<Option<usize>>> {
        prop::collection::vec(any::<(bool, prop::sample::Index)>(), 1..40).prop_map(|links| {
            links
                .into_iter()
                .enumerate()
                .map(|(index, (has_parent, parent))| {
                    (index > 0 && has_parent).then(|| parent.index(index))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn constellation_is_ancestor_descendant_closure(parent_of in forest()) {
            let children = children_from(&parent_of);
            for start in 0..parent_of.len() {
                let members = constellation(&parent_of, &children, start);
                let upward = ancestors(&parent_of, start);
                for other in 0..parent_of.len() {
                    let expected = other == start
                        || upward.contains(&other)
                        || ancestors(&parent_of, other).contains(&start);
                    prop_assert_eq!(members.contains(&other), expected);
                }
            }
        }

        #[test]
        fn constellation_membership_is_symmetric(parent_of in forest()) {
            let children = children_from(&parent_of);
            let all = (0..parent_of.len())
                .map(|start| constellation(&parent_of, &children, start))
                .collect::<Vec<_>>();
            for a in 0..parent_of.len() {
                for b in 0..parent_of.len() {
                    prop_assert_eq!(all[a].contains(&b), all[b].contains(&a));
                }
            }
        }
    }
}
