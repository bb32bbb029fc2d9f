use eframe::egui::{self, Align, Context, Layout, Pos2, Rect, RichText, Vec2, pos2, vec2};

use crate::constellation::Category;

use super::super::highlight::descendants;
use super::super::{Scene, ViewModel};

const OVERLAY_OFFSET: f32 = 16.0;
const CONSTITUENT_ROWS: usize = 12;

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct Constituent {
    pub(in crate::app) name: String,
    pub(in crate::app) category: Category,
    pub(in crate::app) level: u32,
    pub(in crate::app) unlocked: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct NodeDetails {
    pub(in crate::app) name: String,
    pub(in crate::app) description: String,
    pub(in crate::app) category: Category,
    pub(in crate::app) level: u32,
    pub(in crate::app) experience: u32,
    pub(in crate::app) next_level: u64,
    pub(in crate::app) unlocked: bool,
    pub(in crate::app) star: Option<(u32, Vec<Constituent>)>,
}

impl NodeDetails {
    pub(in crate::app) fn from_scene(scene: &Scene, index: usize) -> Option<Self> {
        let node = scene.graph.nodes.get(index)?;

        let star = (node.category == Category::Star).then(|| {
            let mut constituents = descendants(&scene.children, index)
                .into_iter()
                .filter_map(|child| scene.graph.nodes.get(child))
                .map(|child| Constituent {
                    name: child.name.clone(),
                    category: child.category,
                    level: child.user_level,
                    unlocked: child.is_unlocked_by_user,
                })
                .collect::<Vec<_>>();
            constituents.sort_by(|a, b| {
                (a.category as u8)
                    .cmp(&(b.category as u8))
                    .then_with(|| b.level.cmp(&a.level))
                    .then_with(|| a.name.cmp(&b.name))
            });
            (node.level_for_color, constituents)
        });

        Some(Self {
            name: node.name.clone(),
            description: node.description.clone(),
            category: node.category,
            level: node.user_level,
            experience: node.user_experience,
            next_level: node.experience_needed_for_next_level,
            unlocked: node.is_unlocked_by_user,
            star,
        })
    }
}

pub(in crate::app) fn overlay_position(anchor: Pos2, size: Vec2, container: Rect) -> Pos2 {
    let mut x = anchor.x + OVERLAY_OFFSET;
    if x + size.x > container.right() {
        x = anchor.x - OVERLAY_OFFSET - size.x;
    }
    let mut y = anchor.y + OVERLAY_OFFSET;
    if y + size.y > container.bottom() {
        y = anchor.y - OVERLAY_OFFSET - size.y;
    }

    pos2(
        x.clamp(container.left(), (container.right() - size.x).max(container.left())),
        y.clamp(container.top(), (container.bottom() - size.y).max(container.top())),
    )
}

impl ViewModel {
    pub(in crate::app) fn draw_detail_overlay(&mut self, ctx: &Context) {
        let Some((index, last_anchor, overlay_size)) = self.selection.as_ref().map(|selection| {
            (
                self.scene.index_by_id.get(&selection.id).copied(),
                selection.anchor,
                selection.overlay_size,
            )
        }) else {
            return;
        };
        let Some(index) = index else {
            self.selection = None;
            return;
        };
        let Some(details) = NodeDetails::from_scene(&self.scene, index) else {
            self.selection = None;
            return;
        };

        let anchor = self
            .scene
            .view_scratch
            .screen_positions
            .get(index)
            .copied()
            .unwrap_or(last_anchor);
        let position = overlay_position(anchor, overlay_size, self.container);

        let mut close = false;
        let area = egui::Area::new(egui::Id::new("skill_detail_overlay"))
            .order(egui::Order::Foreground)
            .fixed_pos(position)
            .constrain_to(self.container)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(320.0);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(details.name.as_str()).strong().size(16.0));
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui.small_button("Close").clicked() {
                                close = true;
                            }
                        });
                    });
                    ui.small(details.category.label());
                    if !details.description.is_empty() {
                        ui.add_space(4.0);
                        ui.label(details.description.as_str());
                    }

                    ui.separator();
                    if details.unlocked {
                        ui.label(format!("Level {}", details.level));
                    } else {
                        ui.label("Not unlocked yet");
                    }
                    let progress = if details.next_level == 0 {
                        0.0
                    } else {
                        (details.experience as f32 / details.next_level as f32).clamp(0.0, 1.0)
                    };
                    ui.add(egui::ProgressBar::new(progress).text(format!(
                        "{} / {} XP to level {}",
                        details.experience,
                        details.next_level,
                        details.level + 1
                    )));

                    if let Some((level_for_color, constituents)) = &details.star {
                        ui.separator();
                        ui.label(format!("Constellation level: {level_for_color}"));
                        if constituents.is_empty() {
                            ui.label("No skills in this constellation yet.");
                        } else {
                            ui.label(RichText::new("Skills").strong());
                            egui::ScrollArea::vertical()
                                .id_salt("constituents_scroll")
                                .max_height(CONSTITUENT_ROWS as f32 * 20.0)
                                .show(ui, |ui| {
                                    for constituent in constituents {
                                        let level = if constituent.unlocked {
                                            format!("level {}", constituent.level)
                                        } else {
                                            "locked".to_owned()
                                        };
                                        ui.label(format!(
                                            "{}  ({}, {level})",
                                            constituent.name,
                                            constituent.category.label()
                                        ));
                                    }
                                });
                        }
                    }
                });
            });

        let overlay_rect = area.response.rect;
        let container = self.container;
        let pressed_outside = ctx.input(|input| {
            input.pointer.primary_pressed()
                && input
                    .pointer
                    .interact_pos()
                    .is_some_and(|pointer| !overlay_rect.contains(pointer) && !container.contains(pointer))
        });

        if close || pressed_outside {
            self.selection = None;
        } else if let Some(selection) = self.selection.as_mut() {
            selection.anchor = anchor;
            selection.overlay_size = overlay_rect.size().max(vec2(120.0, 60.0));
        }
    }
}
