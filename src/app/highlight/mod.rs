use std::collections::HashSet;

mod collect;

pub(super) use self::collect::{constellation, descendants};
use super::Scene;

pub(super) struct ActiveHighlight {
    pub(super) anchor: String,
    pub(super) members: HashSet<usize>,
}

impl ActiveHighlight {
    pub(super) fn contains_edge(&self, source: usize, target: usize) -> bool {
        self.members.contains(&source) && self.members.contains(&target)
    }
}

struct PendingHover {
    id: String,
    since: f64,
}

#[derive(Default)]
pub(super) struct HoverState {
    pending: Option<PendingHover>,
    active: Option<ActiveHighlight>,
}

impl HoverState {
    pub(super) fn active(&self) -> Option<&ActiveHighlight> {
        self.active.as_ref()
    }

    pub(super) fn clear(&mut self) {
        self.pending = None;
        self.active = None;
    }

    pub(super) fn update(&mut self, hovered: Option<&str>, now: f64, delay: f64, scene: &Scene) -> bool {
        let Some(hovered) = hovered else {
            self.clear();
            return false;
        };

        if self
            .active
            .as_ref()
            .is_some_and(|active| active.anchor == hovered)
        {
            return false;
        }

        let since = match &self.pending {
            Some(pending) if pending.id == hovered => pending.since,
            _ => {
                self.active = None;
                self.pending = Some(PendingHover {
                    id: hovered.to_owned(),
                    since: now,
                });
                now
            }
        };

        if now - since < delay {
            return true;
        }

        self.pending = None;
        self.active = activate(scene, hovered);
        false
    }

    pub(super) fn refresh(&mut self, scene: &Scene) {
        if let Some(pending) = &self.pending
            && !scene.index_by_id.contains_key(&pending.id)
        {
            self.pending = None;
        }
        if let Some(active) = self.active.take() {
            self.active = activate(scene, &active.anchor);
        }
    }
}

fn activate(scene: &Scene, id: &str) -> Option<ActiveHighlight> {
    let &index = scene.index_by_id.get(id)?;
    Some(ActiveHighlight {
        anchor: id.to_owned(),
        members: constellation(&scene.parent_of, &scene.children, index),
    })
}
