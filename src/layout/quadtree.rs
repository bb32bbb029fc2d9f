use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points.iter().fold((first, first), |(min, max), point| {
            (min.min(*point), max.max(*point))
        });

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half && (point.y - self.center.y).abs() <= self.half
    }

    pub(super) fn side(self) -> f32 {
        self.half * 2.0
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half * 0.5;
        let sign_x = if quadrant & 1 == 1 { 1.0 } else { -1.0 };
        let sign_y = if quadrant & 2 == 2 { 1.0 } else { -1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half: quarter,
        }
    }

    fn distance_to(self, point: Vec2) -> f32 {
        let dx = ((point.x - self.center.x).abs() - self.half).max(0.0);
        let dy = ((point.y - self.center.y).abs() - self.half).max(0.0);
        vec2(dx, dy).length()
    }
}

#[derive(Debug)]
pub(super) struct Cell {
    pub(super) square: Square,
    pub(super) mass: f32,
    pub(super) centroid: Vec2,
    pub(super) bodies: Vec<usize>,
    pub(super) children: Option<[Option<usize>; 4]>,
}

/// Arena quadtree over body positions. Cell 0 is the root.
#[derive(Debug)]
pub(super) struct BarnesHutTree {
    cells: Vec<Cell>,
}

impl BarnesHutTree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        let mut tree = Self { cells: Vec::new() };
        let root = tree.push_cell(square, (0..positions.len()).collect(), positions);
        let mut pending = vec![(root, 0usize)];

        while let Some((cell_index, depth)) = pending.pop() {
            if depth >= MAX_DEPTH || tree.cells[cell_index].bodies.len() <= LEAF_CAPACITY {
                continue;
            }

            let square = tree.cells[cell_index].square;
            let mut buckets: [Vec<usize>; 4] = Default::default();
            for &body in &tree.cells[cell_index].bodies {
                buckets[square.quadrant_of(positions[body])].push(body);
            }
            if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
                continue;
            }

            let mut children = [None; 4];
            for (quadrant, bucket) in buckets.into_iter().enumerate() {
                if bucket.is_empty() {
                    continue;
                }
                let child = tree.push_cell(square.quadrant(quadrant), bucket, positions);
                children[quadrant] = Some(child);
                pending.push((child, depth + 1));
            }

            let cell = &mut tree.cells[cell_index];
            cell.bodies.clear();
            cell.children = Some(children);
        }

        Some(tree)
    }

    fn push_cell(&mut self, square: Square, bodies: Vec<usize>, positions: &[Vec2]) -> usize {
        let mass = bodies.len() as f32;
        let centroid = if bodies.is_empty() {
            square.center
        } else {
            bodies
                .iter()
                .fold(Vec2::ZERO, |sum, &body| sum + positions[body])
                / mass
        };

        self.cells.push(Cell {
            square,
            mass,
            centroid,
            bodies,
            children: None,
        });
        self.cells.len() - 1
    }

    pub(super) fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Visits every cell, letting `descend` decide whether to open its children.
    /// Leaf bodies are handed to `leaf` only for cells that were opened.
    pub(super) fn walk(
        &self,
        mut descend: impl FnMut(&Cell) -> bool,
        mut leaf: impl FnMut(usize),
    ) {
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let Some(cell) = self.cells.get(index) else {
                continue;
            };
            if !descend(cell) {
                continue;
            }

            match &cell.children {
                Some(children) => stack.extend(children.iter().flatten().copied()),
                None => cell.bodies.iter().copied().for_each(&mut leaf),
            }
        }
    }

    pub(super) fn for_each_near(&self, point: Vec2, radius: f32, visit: impl FnMut(usize)) {
        self.walk(|cell| cell.square.distance_to(point) <= radius, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| vec2((index % 10) as f32 * 25.0, (index / 10) as f32 * 25.0))
            .collect()
    }

    #[test]
    fn every_body_lands_in_exactly_one_leaf() {
        let positions = grid(95);
        let tree = BarnesHutTree::build(&positions).expect("finite positions");
        let mut seen = vec![0usize; positions.len()];
        tree.walk(|_| true, |body| seen[body] += 1);
        assert!(seen.iter().all(|count| *count == 1));
        assert!(tree.cells().len() > 1);
        assert_eq!(tree.cells()[0].mass, 95.0);
    }

    #[test]
    fn near_query_finds_close_bodies_only() {
        let positions = grid(100);
        let tree = BarnesHutTree::build(&positions).expect("finite positions");
        let mut near = Vec::new();
        tree.for_each_near(vec2(0.0, 0.0), 30.0, |body| near.push(body));
        assert!(near.contains(&0));
        assert!(near.contains(&1));
        assert!(near.contains(&10));
        assert!(!near.contains(&99));
    }

    #[test]
    fn non_finite_positions_build_nothing() {
        assert!(BarnesHutTree::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(BarnesHutTree::build(&[]).is_none());
    }
}
