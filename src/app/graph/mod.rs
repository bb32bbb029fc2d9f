mod build;
mod interaction;
mod view;

#[cfg(test)]
pub(in crate::app) use build::scene_from_graph;
