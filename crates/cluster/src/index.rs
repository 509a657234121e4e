use foundation::math::precision::stable_total_cmp_f64;

/// A static 2-D k-d tree over points in projected unit space.
///
/// Ordering contract:
/// - `range` and `within` return item ids in ascending order.
///
/// Built once per point set and never mutated; rebuilding is cheaper than
/// maintaining it for the sizes it serves.
#[derive(Debug, Clone, Default)]
pub struct KdIndex {
    ids: Vec<u32>,
    coords: Vec<[f64; 2]>,
}

const LEAF_MAX: usize = 16;

impl KdIndex {
    /// `points[i]` is stored with id `i`.
    pub fn build(points: &[[f64; 2]]) -> Self {
        let mut items: Vec<(u32, [f64; 2])> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u32, *p))
            .collect();
        if !items.is_empty() {
            let last = items.len() - 1;
            sort_kd(&mut items, 0, last, 0);
        }
        let (ids, coords) = items.into_iter().unzip();
        Self { ids, coords }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids of points inside the closed box `[min, max]`.
    pub fn range(&self, min: [f64; 2], max: [f64; 2]) -> Vec<u32> {
        let inside = |p: [f64; 2]| p[0] >= min[0] && p[0] <= max[0] && p[1] >= min[1] && p[1] <= max[1];
        self.search(inside, |m, axis| (min[axis] <= m[axis], max[axis] >= m[axis]))
    }

    /// Ids of points within Euclidean distance `r` of `center` (inclusive).
    pub fn within(&self, center: [f64; 2], r: f64) -> Vec<u32> {
        let r2 = r * r;
        let inside = |p: [f64; 2]| sq_dist(p, center) <= r2;
        self.search(inside, |m, axis| {
            (center[axis] - r <= m[axis], center[axis] + r >= m[axis])
        })
    }

    /// Shared traversal. `descend(median, axis)` says whether the left and
    /// right halves can still contain hits.
    fn search<F, D>(&self, inside: F, descend: D) -> Vec<u32>
    where
        F: Fn([f64; 2]) -> bool,
        D: Fn([f64; 2], usize) -> (bool, bool),
    {
        if self.ids.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<u32> = Vec::new();
        let mut stack: Vec<(usize, usize, usize)> = vec![(0, self.ids.len() - 1, 0)];

        while let Some((left, right, axis)) = stack.pop() {
            if right - left <= LEAF_MAX {
                for i in left..=right {
                    if inside(self.coords[i]) {
                        hits.push(self.ids[i]);
                    }
                }
                continue;
            }

            let m = (left + right) / 2;
            let median = self.coords[m];
            if inside(median) {
                hits.push(self.ids[m]);
            }

            let (go_left, go_right) = descend(median, axis);
            let next_axis = 1 - axis;
            // right - left > LEAF_MAX, so left < m < right.
            if go_left {
                stack.push((left, m - 1, next_axis));
            }
            if go_right {
                stack.push((m + 1, right, next_axis));
            }
        }

        hits.sort_unstable();
        hits
    }
}

fn sort_kd(items: &mut [(u32, [f64; 2])], left: usize, right: usize, axis: usize) {
    if right - left <= LEAF_MAX {
        return;
    }

    items[left..=right].sort_by(|a, b| {
        stable_total_cmp_f64(a.1[axis], b.1[axis]).then_with(|| a.0.cmp(&b.0))
    });

    let m = (left + right) / 2;
    sort_kd(items, left, m - 1, 1 - axis);
    sort_kd(items, m + 1, right, 1 - axis);
}

fn sq_dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::KdIndex;

    fn grid(n: usize) -> Vec<[f64; 2]> {
        let mut out = Vec::new();
        for y in 0..n {
            for x in 0..n {
                out.push([x as f64, y as f64]);
            }
        }
        out
    }

    fn brute_within(points: &[[f64; 2]], c: [f64; 2], r: f64) -> Vec<u32> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| (p[0] - c[0]).powi(2) + (p[1] - c[1]).powi(2) <= r * r)
            .map(|(i, _)| i as u32)
            .collect()
    }

    #[test]
    fn empty_index_returns_nothing() {
        let idx = KdIndex::build(&[]);
        assert!(idx.is_empty());
        assert!(idx.range([0.0, 0.0], [1.0, 1.0]).is_empty());
        assert!(idx.within([0.0, 0.0], 1.0).is_empty());
    }

    #[test]
    fn range_matches_brute_force() {
        let pts = grid(20);
        let idx = KdIndex::build(&pts);
        let hits = idx.range([3.5, 4.0], [6.0, 5.5]);
        let expected: Vec<u32> = pts
            .iter()
            .enumerate()
            .filter(|(_, p)| p[0] >= 3.5 && p[0] <= 6.0 && p[1] >= 4.0 && p[1] <= 5.5)
            .map(|(i, _)| i as u32)
            .collect();
        assert_eq!(hits, expected);
        assert_eq!(hits.len(), 6);
    }

    #[test]
    fn within_matches_brute_force() {
        let pts = grid(25);
        let idx = KdIndex::build(&pts);
        for (c, r) in [([12.0, 12.0], 3.0), ([0.0, 0.0], 1.5), ([24.5, 3.2], 4.1)] {
            assert_eq!(idx.within(c, r), brute_within(&pts, c, r));
        }
    }

    #[test]
    fn duplicate_coordinates_are_all_returned() {
        let pts = vec![[0.5, 0.5]; 40];
        let idx = KdIndex::build(&pts);
        assert_eq!(idx.within([0.5, 0.5], 0.0).len(), 40);
    }
}
