use super::node::{Node, Value};
use crate::geometry::Point;

/// a 2-D k-d tree keyed on `Point<i32>`, splitting on x at even depths and y
/// at odd depths. supports the point operations the solver needs —
/// insert/remove/exists/find, nearest-neighbor search, and pop-nearest — plus
/// the observability surface used to decide when a rebalance pays for itself.
///
/// invariant, checked by [`KdTree::validate`]: for every node `n` splitting
/// on axis `a`, every descendant in its left subtree has `coord(a) < n[a]`,
/// and every descendant in its right subtree has `coord(a) >= n[a]`.
#[derive(Debug, Default)]
pub struct KdTree {
    root: Option<Box<Node>>,
    count: usize,
    sum_depth: i64,
}

impl KdTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// insert `value`, keyed by its point. returns `false` without modifying
    /// the tree if that point is already present.
    pub fn insert(&mut self, value: Value) -> bool {
        match Self::insert_rec(&mut self.root, value, 0) {
            Some(depth) => {
                self.count += 1;
                self.sum_depth += depth as i64;
                if self.needs_rebalance() {
                    self.rebalance();
                }
                true
            }
            None => false,
        }
    }

    fn insert_rec(slot: &mut Option<Box<Node>>, value: Value, depth: i32) -> Option<i32> {
        match slot {
            None => {
                *slot = Some(Node::leaf(value, depth));
                Some(depth)
            }
            Some(n) => {
                if n.value.point == value.point {
                    return None;
                }
                let axis = n.axis();
                let side = (value.point.coord(axis) >= n.value.point.coord(axis)) as usize;
                Self::insert_rec(&mut n.children[side], value, n.depth + 1)
            }
        }
    }

    fn needs_rebalance(&self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.sum_depth > Self::bit_width(self.count) * self.count as i64 + 1
    }

    fn bit_width(n: usize) -> i64 {
        if n == 0 {
            0
        } else {
            (usize::BITS - n.leading_zeros()) as i64
        }
    }

    pub fn exists(&self, point: Point<i32>) -> bool {
        self.find(point).is_some()
    }

    pub fn find(&self, point: Point<i32>) -> Option<Value> {
        Self::find_rec(&self.root, point).map(|n| n.value)
    }

    fn find_rec<'a>(slot: &'a Option<Box<Node>>, point: Point<i32>) -> Option<&'a Node> {
        let n = slot.as_deref()?;
        if n.value.point == point {
            return Some(n);
        }
        let axis = n.axis();
        let side = (point.coord(axis) >= n.value.point.coord(axis)) as usize;
        Self::find_rec(&n.children[side], point)
    }

    /// the stored point nearest `query` by manhattan distance, or `None` if
    /// the tree is empty. ties are broken by whichever branch is visited
    /// first (the side `query` itself falls on).
    pub fn find_closest(&self, query: Point<i32>) -> Option<Value> {
        let mut best: Option<(&Node, i64)> = None;
        Self::nearest_rec(&self.root, query, &mut best);
        best.map(|(n, _)| n.value)
    }

    fn nearest_rec<'a>(
        slot: &'a Option<Box<Node>>,
        query: Point<i32>,
        best: &mut Option<(&'a Node, i64)>,
    ) {
        let Some(n) = slot else { return };
        let d = query.manhattan(n.value.point);
        if best.is_none_or(|(_, bd)| d < bd) {
            *best = Some((n, d));
        }
        let axis = n.axis();
        let diff = (query.coord(axis) - n.value.point.coord(axis)) as i64;
        let (near, far) = if diff < 0 {
            (&n.children[0], &n.children[1])
        } else {
            (&n.children[1], &n.children[0])
        };
        Self::nearest_rec(near, query, best);
        let bound = best.map(|(_, bd)| bd).unwrap_or(i64::MAX);
        if diff.abs() < bound {
            Self::nearest_rec(far, query, best);
        }
    }

    /// remove and return the stored value nearest `query`, or `None` if the
    /// tree is empty.
    pub fn pop_closest(&mut self, query: Point<i32>) -> Option<Value> {
        let value = self.find_closest(query)?;
        self.remove(value.point);
        Some(value)
    }

    /// remove the value at `point`, if present. returns whether anything was
    /// removed.
    pub fn remove(&mut self, point: Point<i32>) -> bool {
        let removed = Self::remove_rec(&mut self.root, point).is_some();
        if removed {
            self.count -= 1;
            self.sum_depth = Self::sum_depth_rec(&self.root);
        }
        removed
    }

    fn remove_rec(slot: &mut Option<Box<Node>>, point: Point<i32>) -> Option<Value> {
        let n = slot.as_mut()?;
        if n.value.point == point {
            let removed = n.value;
            Self::remove_node(slot);
            return Some(removed);
        }
        let axis = n.axis();
        let side = (point.coord(axis) >= n.value.point.coord(axis)) as usize;
        Self::remove_rec(&mut n.children[side], point)
    }

    /// `slot` holds the node to remove. replaces it in place per the
    /// standard k-d deletion cases.
    fn remove_node(slot: &mut Option<Box<Node>>) {
        let node = slot.take().expect("slot holds the node being removed");
        let depth = node.depth;
        let axis = (depth as usize) % 2;
        let Node {
            children: [left, right],
            ..
        } = *node;

        *slot = match (left, right) {
            (None, None) => None,
            (Some(left), None) => {
                let mut values = Vec::new();
                Self::collect(Some(left), &mut values);
                Self::build_balanced(values, depth)
            }
            (left, Some(right)) => {
                let candidate_point = Self::leftmost_along_axis(&right, axis).value.point;
                let mut right_slot = Some(right);
                let promoted = Self::remove_rec(&mut right_slot, candidate_point)
                    .expect("leftmost-along-axis candidate must exist");
                Some(Box::new(Node {
                    value: promoted,
                    depth,
                    children: [left, right_slot],
                }))
            }
        };
    }

    /// leftmost node, along `axis`, within the subtree rooted at `node`.
    /// ties broken by greater depth (a deeper removal rebuilds less).
    fn leftmost_along_axis(node: &Node, axis: usize) -> &Node {
        let mut best = node;
        if let Some(left) = &node.children[0] {
            best = Self::pick_leftmost(best, Self::leftmost_along_axis(left, axis), axis);
        }
        if node.axis() != axis {
            if let Some(right) = &node.children[1] {
                best = Self::pick_leftmost(best, Self::leftmost_along_axis(right, axis), axis);
            }
        }
        best
    }

    fn pick_leftmost<'a>(a: &'a Node, b: &'a Node, axis: usize) -> &'a Node {
        let (ca, cb) = (a.value.point.coord(axis), b.value.point.coord(axis));
        match ca.cmp(&cb) {
            std::cmp::Ordering::Greater => b,
            std::cmp::Ordering::Less => a,
            std::cmp::Ordering::Equal if b.depth > a.depth => b,
            std::cmp::Ordering::Equal => a,
        }
    }

    fn collect(slot: Option<Box<Node>>, out: &mut Vec<Value>) {
        if let Some(n) = slot {
            let Node {
                value,
                children: [l, r],
                ..
            } = *n;
            out.push(value);
            Self::collect(l, out);
            Self::collect(r, out);
        }
    }

    /// rebuild a balanced subtree from `values`, rooted at `depth`. picks a
    /// per-level median along the splitting axis via partial sort, and
    /// partitions so every point equal to the pivot along that axis lands in
    /// the right half — the pivot is the representative kept at this node.
    fn build_balanced(mut values: Vec<Value>, depth: i32) -> Option<Box<Node>> {
        if values.is_empty() {
            return None;
        }
        let axis = (depth as usize) % 2;
        let mid = values.len() / 2;
        values.select_nth_unstable_by_key(mid, |v| v.point.coord(axis));
        let pivot_coord = values[mid].point.coord(axis);

        let mut less = Vec::new();
        let mut ge = Vec::new();
        for v in values {
            if v.point.coord(axis) < pivot_coord {
                less.push(v);
            } else {
                ge.push(v);
            }
        }
        let pivot = ge.remove(0);
        let left = Self::build_balanced(less, depth + 1);
        let right = Self::build_balanced(ge, depth + 1);
        Some(Box::new(Node {
            value: pivot,
            depth,
            children: [left, right],
        }))
    }

    fn sum_depth_rec(slot: &Option<Box<Node>>) -> i64 {
        match slot {
            None => 0,
            Some(n) => {
                n.depth as i64 + Self::sum_depth_rec(&n.children[0]) + Self::sum_depth_rec(&n.children[1])
            }
        }
    }

    /// rebuild the whole tree from scratch as a balanced tree. triggered
    /// automatically from `insert` once accumulated depth crosses the
    /// `bit_width(count) * count + 1` threshold; callable directly too.
    pub fn rebalance(&mut self) {
        let mut values = Vec::with_capacity(self.count);
        Self::collect(self.root.take(), &mut values);
        self.root = Self::build_balanced(values, 0);
        self.sum_depth = Self::sum_depth_rec(&self.root);
    }

    /// checks the left-strict/right-inclusive split invariant and depth
    /// bookkeeping across the whole tree. O(n); intended for tests and
    /// debug-build sanity checks, not hot paths.
    pub fn validate(&self) -> bool {
        Self::validate_rec(
            &self.root,
            [(i32::MIN, i32::MAX), (i32::MIN, i32::MAX)],
            0,
        )
    }

    fn validate_rec(slot: &Option<Box<Node>>, bounds: [(i32, i32); 2], expected_depth: i32) -> bool {
        let Some(n) = slot else { return true };
        if n.depth != expected_depth {
            return false;
        }
        let axis = n.axis();
        let (lo, hi) = bounds[axis];
        let c = n.value.point.coord(axis);
        if c < lo || c > hi {
            return false;
        }
        let mut left_bounds = bounds;
        left_bounds[axis] = (lo, c.saturating_sub(1));
        let mut right_bounds = bounds;
        right_bounds[axis] = (c, hi);
        Self::validate_rec(&n.children[0], left_bounds, expected_depth + 1)
            && Self::validate_rec(&n.children[1], right_bounds, expected_depth + 1)
    }

    pub fn depth_max(&self) -> i32 {
        Self::depth_max_rec(&self.root)
    }

    fn depth_max_rec(slot: &Option<Box<Node>>) -> i32 {
        match slot {
            None => -1,
            Some(n) => n
                .depth
                .max(Self::depth_max_rec(&n.children[0]))
                .max(Self::depth_max_rec(&n.children[1])),
        }
    }

    pub fn depth_avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_depth as f64 / self.count as f64
        }
    }

    pub fn depth_stddev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let avg = self.depth_avg();
        let mut acc = 0.0;
        Self::variance_rec(&self.root, avg, &mut acc);
        (acc / self.count as f64).sqrt()
    }

    fn variance_rec(slot: &Option<Box<Node>>, avg: f64, acc: &mut f64) {
        if let Some(n) = slot {
            let d = n.depth as f64 - avg;
            *acc += d * d;
            Self::variance_rec(&n.children[0], avg, acc);
            Self::variance_rec(&n.children[1], avg, acc);
        }
    }

    pub fn leaf_count(&self) -> usize {
        Self::leaf_count_rec(&self.root)
    }

    fn leaf_count_rec(slot: &Option<Box<Node>>) -> usize {
        match slot {
            None => 0,
            Some(n) if n.children[0].is_none() && n.children[1].is_none() => 1,
            Some(n) => Self::leaf_count_rec(&n.children[0]) + Self::leaf_count_rec(&n.children[1]),
        }
    }

    /// ratio of leaves to a perfectly-balanced tree's leaf count. close to
    /// 1.0 means the tree is well-shaped; far above means long thin chains.
    pub fn balance_factor(&self) -> f64 {
        if self.count == 0 {
            return 1.0;
        }
        self.leaf_count() as f64 / (self.count as f64 / 2.0).max(1.0)
    }

    pub fn balance_str(&self) -> String {
        format!(
            "n={} depth(max={}, avg={:.2}, stddev={:.2}) balance={:.2}",
            self.count,
            self.depth_max(),
            self.depth_avg(),
            self.depth_stddev(),
            self.balance_factor(),
        )
    }

    pub fn print_tree(&self) -> String {
        let mut out = String::new();
        Self::print_rec(&self.root, &mut out, String::new(), true);
        out
    }

    fn print_rec(slot: &Option<Box<Node>>, out: &mut String, prefix: String, is_last: bool) {
        let Some(n) = slot else { return };
        out.push_str(&prefix);
        out.push_str(if is_last { "└── " } else { "├── " });
        out.push_str(&format!("({}, {}) d{}\n", n.value.point.x, n.value.point.y, n.depth));
        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        let has_right = n.children[1].is_some();
        if n.children[0].is_some() {
            Self::print_rec(&n.children[0], out, child_prefix.clone(), !has_right);
        }
        if n.children[1].is_some() {
            Self::print_rec(&n.children[1], out, child_prefix, true);
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        let mut stack = Vec::new();
        Self::push_left_spine(&self.root, &mut stack);
        Iter { stack }
    }

    fn push_left_spine<'a>(mut slot: &'a Option<Box<Node>>, stack: &mut Vec<&'a Node>) {
        while let Some(n) = slot {
            stack.push(n);
            slot = &n.children[0];
        }
    }
}

/// in-order iterator over stored values, built from an explicit stack rather
/// than recursion so it works on trees deeper than the default stack size.
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        KdTree::push_left_spine(&node.children[1], &mut self.stack);
        Some(node.value)
    }
}

impl<'a> IntoIterator for &'a KdTree {
    type Item = Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
