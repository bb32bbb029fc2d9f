use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::BarnesHutTree;

#[derive(Clone, Copy, Debug)]
pub(super) struct ForceParams {
    pub(super) alpha: f32,
    pub(super) repulsion: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
    pub(super) link_distance: f32,
    pub(super) link_strength: f32,
    pub(super) center: Vec2,
    pub(super) center_strength: f32,
    pub(super) collision_strength: f32,
}

/// Deterministic unit vector for bodies that sit exactly on top of each other.
fn separation_direction(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

fn direction_and_distance(delta: Vec2, a: usize, b: usize) -> (Vec2, f32) {
    let distance = delta.length();
    if distance > 0.0001 {
        (delta / distance, distance)
    } else {
        (separation_direction(a, b), 0.0001)
    }
}

pub(super) fn apply_repulsion(
    tree: &BarnesHutTree,
    positions: &[Vec2],
    free: &[bool],
    params: ForceParams,
    velocities: &mut [Vec2],
) {
    let strength = params.repulsion * params.alpha;
    if strength <= 0.0 {
        return;
    }
    let cells = tree.cells();

    for (index, point) in positions.iter().copied().enumerate() {
        if !free[index] {
            continue;
        }

        let mut push = Vec2::ZERO;
        let mut stack = vec![0usize];
        while let Some(cell_index) = stack.pop() {
            let Some(cell) = cells.get(cell_index) else {
                continue;
            };
            if cell.mass <= 0.0 {
                continue;
            }

            let Some(children) = &cell.children else {
                for &other in &cell.bodies {
                    if other == index {
                        continue;
                    }
                    let delta = point - positions[other];
                    let (direction, distance) = direction_and_distance(delta, index, other);
                    push += direction * strength / (distance * distance + params.softening);
                }
                continue;
            };

            let delta = point - cell.centroid;
            let distance_sq = delta.length_sq().max(0.0001);
            let distance = distance_sq.sqrt();
            if !cell.square.contains(point) && cell.square.side() / distance < params.theta {
                push += delta / distance * (strength * cell.mass) / (distance_sq + params.softening);
                continue;
            }
            stack.extend(children.iter().flatten().copied());
        }

        velocities[index] += push;
    }
}

pub(super) fn apply_links(
    edges: &[(usize, usize)],
    positions: &[Vec2],
    free: &[bool],
    params: ForceParams,
    velocities: &mut [Vec2],
) {
    let strength = params.link_strength * params.alpha;
    for &(source, target) in edges {
        if source == target || source >= positions.len() || target >= positions.len() {
            continue;
        }

        let delta = positions[target] - positions[source];
        let (direction, distance) = direction_and_distance(delta, target, source);
        let stretch = (distance - params.link_distance) * strength;

        let (source_share, target_share) = match (free[source], free[target]) {
            (true, true) => (0.5, 0.5),
            (true, false) => (1.0, 0.0),
            (false, true) => (0.0, 1.0),
            (false, false) => continue,
        };
        velocities[source] += direction * stretch * source_share;
        velocities[target] -= direction * stretch * target_share;
    }
}

pub(super) fn apply_centering(
    positions: &[Vec2],
    free: &[bool],
    params: ForceParams,
    velocities: &mut [Vec2],
) {
    let strength = params.center_strength * params.alpha;
    for (index, position) in positions.iter().enumerate() {
        if free[index] {
            velocities[index] += (params.center - *position) * strength;
        }
    }
}

pub(super) fn apply_collisions(
    tree: &BarnesHutTree,
    positions: &[Vec2],
    radii: &[f32],
    free: &[bool],
    params: ForceParams,
    velocities: &mut [Vec2],
) {
    if params.collision_strength <= 0.0 {
        return;
    }
    let max_radius = radii.iter().copied().fold(0.0_f32, f32::max);

    for (index, point) in positions.iter().copied().enumerate() {
        let reach = radii[index] + max_radius;
        let mut overlaps = Vec::new();
        tree.for_each_near(point, reach, |other| {
            if other > index {
                overlaps.push(other);
            }
        });

        for other in overlaps {
            let min_distance = radii[index] + radii[other];
            let delta = point - positions[other];
            let (direction, distance) = direction_and_distance(delta, index, other);
            if distance >= min_distance {
                continue;
            }

            let push = direction * (min_distance - distance) * params.collision_strength;
            match (free[index], free[other]) {
                (true, true) => {
                    velocities[index] += push * 0.5;
                    velocities[other] -= push * 0.5;
                }
                (true, false) => velocities[index] += push,
                (false, true) => velocities[other] -= push,
                (false, false) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ForceParams {
        ForceParams {
            alpha: 1.0,
            repulsion: 1_000.0,
            softening: 1.0,
            theta: 0.8,
            link_distance: 50.0,
            link_strength: 0.5,
            center: Vec2::ZERO,
            center_strength: 0.1,
            collision_strength: 1.0,
        }
    }

    #[test]
    fn repulsion_pushes_pairs_apart() {
        let positions = [vec2(-5.0, 0.0), vec2(5.0, 0.0)];
        let tree = BarnesHutTree::build(&positions).expect("tree");
        let mut velocities = [Vec2::ZERO; 2];
        apply_repulsion(&tree, &positions, &[true, true], params(), &mut velocities);
        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
    }

    #[test]
    fn stretched_link_pulls_free_end_toward_fixed_end() {
        let positions = [vec2(0.0, 0.0), vec2(200.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];
        apply_links(&[(1, 0)], &positions, &[false, true], params(), &mut velocities);
        assert_eq!(velocities[0], Vec2::ZERO);
        assert!(velocities[1].x < 0.0);
    }

    #[test]
    fn overlapping_bodies_separate() {
        let positions = [vec2(0.0, 0.0), vec2(4.0, 0.0)];
        let tree = BarnesHutTree::build(&positions).expect("tree");
        let mut velocities = [Vec2::ZERO; 2];
        apply_collisions(
            &tree,
            &positions,
            &[10.0, 10.0],
            &[true, true],
            params(),
            &mut velocities,
        );
        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
    }

    #[test]
    fn centering_ignores_fixed_bodies() {
        let positions = [vec2(100.0, 0.0), vec2(100.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];
        apply_centering(&positions, &[true, false], params(), &mut velocities);
        assert!(velocities[0].x < 0.0);
        assert_eq!(velocities[1], Vec2::ZERO);
    }
}
