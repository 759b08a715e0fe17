mod node;
mod tree;

pub use node::Value;
pub use tree::{Iter, KdTree};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use rand::{Rng, SeedableRng};
    use rand::rngs::SmallRng;
    use std::collections::HashSet;

    fn v(x: i32, y: i32) -> Value {
        Value::new(0, Point::new(x, y))
    }

    #[test]
    fn insert_then_find_round_trips() {
        let mut tree = KdTree::new();
        assert!(tree.insert(v(3, 4)));
        assert!(tree.insert(v(1, 2)));
        assert!(tree.insert(v(5, 0)));
        assert_eq!(tree.find(Point::new(1, 2)), Some(v(1, 2)));
        assert!(tree.exists(Point::new(5, 0)));
        assert!(!tree.exists(Point::new(9, 9)));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn duplicate_point_insert_is_rejected() {
        let mut tree = KdTree::new();
        assert!(tree.insert(v(0, 0)));
        assert!(!tree.insert(v(0, 0)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn find_closest_returns_nearest_by_manhattan_distance() {
        let mut tree = KdTree::new();
        for p in [(0, 0), (10, 10), (2, 3), (-5, -5)] {
            tree.insert(v(p.0, p.1));
        }
        let closest = tree.find_closest(Point::new(2, 2)).unwrap();
        assert_eq!(closest.point, Point::new(2, 3));
    }

    #[test]
    fn pop_closest_removes_the_returned_value() {
        let mut tree = KdTree::new();
        for p in [(0, 0), (1, 1), (2, 2), (3, 3)] {
            tree.insert(v(p.0, p.1));
        }
        let popped = tree.pop_closest(Point::new(0, 0)).unwrap();
        assert_eq!(popped.point, Point::new(0, 0));
        assert_eq!(tree.len(), 3);
        assert!(!tree.exists(Point::new(0, 0)));
    }

    #[test]
    fn remove_leaf_shrinks_tree_and_preserves_invariant() {
        let mut tree = KdTree::new();
        for p in [(5, 5), (2, 2), (8, 8), (1, 1), (9, 9)] {
            tree.insert(v(p.0, p.1));
        }
        assert!(tree.validate());
        assert!(tree.remove(Point::new(1, 1)));
        assert!(tree.validate());
        assert!(!tree.exists(Point::new(1, 1)));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn remove_node_with_two_children_preserves_invariant() {
        let mut tree = KdTree::new();
        for p in [(5, 5), (2, 2), (8, 8), (1, 1), (3, 3), (9, 1), (7, 9)] {
            tree.insert(v(p.0, p.1));
        }
        assert!(tree.remove(Point::new(5, 5)));
        assert!(tree.validate());
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn remove_node_with_only_left_child_rebuilds_subtree() {
        // a descending chain down the left side forces the "left child only"
        // removal case at the root.
        let mut tree = KdTree::new();
        for p in [(10, 10), (5, 5), (3, 3), (1, 1)] {
            tree.insert(v(p.0, p.1));
        }
        assert!(tree.remove(Point::new(10, 10)));
        assert!(tree.validate());
        assert_eq!(tree.len(), 3);
        for p in [(5, 5), (3, 3), (1, 1)] {
            assert!(tree.exists(Point::new(p.0, p.1)));
        }
    }

    #[test]
    fn clear_empties_the_tree() {
        let mut tree = KdTree::new();
        tree.insert(v(1, 1));
        tree.insert(v(2, 2));
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.find_closest(Point::new(0, 0)), None);
    }

    #[test]
    fn rebalance_preserves_membership_and_invariant() {
        let mut tree = KdTree::new();
        // a degenerate insertion order (strictly increasing on both axes)
        // builds a long right-leaning chain before any rebalance.
        for i in 0..64 {
            tree.insert(v(i, i));
        }
        tree.rebalance();
        assert!(tree.validate());
        assert_eq!(tree.len(), 64);
        for i in 0..64 {
            assert!(tree.exists(Point::new(i, i)));
        }
        assert!(tree.depth_max() < 64);
    }

    #[test]
    fn iter_visits_every_value_exactly_once() {
        let mut tree = KdTree::new();
        let points: HashSet<Point<i32>> = [(1, 1), (2, 5), (-3, 4), (0, 0), (9, -2)]
            .into_iter()
            .map(|(x, y)| Point::new(x, y))
            .collect();
        for &p in &points {
            tree.insert(Value::new(0, p));
        }
        let visited: HashSet<Point<i32>> = tree.iter().map(|val| val.point).collect();
        assert_eq!(visited, points);
    }

    #[test]
    fn stress_random_insert_and_remove_keeps_invariant_and_membership() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut tree = KdTree::new();
        let mut live: HashSet<Point<i32>> = HashSet::new();

        for _ in 0..500 {
            let p = Point::new(rng.random_range(-50..50), rng.random_range(-50..50));
            if live.insert(p) {
                assert!(tree.insert(Value::new(0, p)));
            }
        }
        assert!(tree.validate());
        assert_eq!(tree.len(), live.len());

        let to_remove: Vec<Point<i32>> = live.iter().take(live.len() / 2).copied().collect();
        for p in to_remove {
            assert!(tree.remove(p));
            live.remove(&p);
            assert!(tree.validate(), "invariant broken after removing {p}");
        }
        assert_eq!(tree.len(), live.len());
        for p in &live {
            assert!(tree.exists(*p));
        }
    }

    #[test]
    fn balance_str_reports_something_for_an_empty_tree() {
        let tree = KdTree::new();
        assert!(tree.balance_str().contains("n=0"));
    }
}
