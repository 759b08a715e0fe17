use super::point::Point;

/// an axis-aligned rectangle, half-open on the bottom-right corner: `br` is
/// excluded from the rectangle, matching the wire format (`tl.x tl.y br.x
/// br.y`, half-open on `br`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub tl: Point<T>,
    pub br: Point<T>,
}

impl Rect<i32> {
    pub fn new(tl: Point<i32>, br: Point<i32>) -> Self {
        Self { tl, br }
    }

    pub fn from_coords(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    pub fn width(&self) -> i32 {
        (self.br.x - self.tl.x).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.br.y - self.tl.y).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains(&self, p: Point<i32>) -> bool {
        p.x >= self.tl.x && p.x < self.br.x && p.y >= self.tl.y && p.y < self.br.y
    }

    /// the overlapping region, or `None` if the rectangles don't overlap.
    pub fn intersection(&self, other: &Rect<i32>) -> Option<Rect<i32>> {
        let tl = Point::new(self.tl.x.max(other.tl.x), self.tl.y.max(other.tl.y));
        let br = Point::new(self.br.x.min(other.br.x), self.br.y.min(other.br.y));
        let rect = Rect::new(tl, br);
        if rect.is_empty() { None } else { Some(rect) }
    }

    /// the smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect<i32>) -> Rect<i32> {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let tl = Point::new(self.tl.x.min(other.tl.x), self.tl.y.min(other.tl.y));
        let br = Point::new(self.br.x.max(other.br.x), self.br.y.max(other.br.y));
        Rect::new(tl, br)
    }

    /// `self \ other` as up to four disjoint axis-aligned rectangles whose
    /// union equals the set difference. empty if `other` fully contains `self`.
    pub fn difference(&self, other: &Rect<i32>) -> Vec<Rect<i32>> {
        let Some(cut) = self.intersection(other) else {
            return if self.is_empty() { vec![] } else { vec![*self] };
        };
        let mut pieces = Vec::with_capacity(4);
        if cut.tl.y > self.tl.y {
            pieces.push(Rect::new(
                Point::new(self.tl.x, self.tl.y),
                Point::new(self.br.x, cut.tl.y),
            ));
        }
        if cut.br.y < self.br.y {
            pieces.push(Rect::new(
                Point::new(self.tl.x, cut.br.y),
                Point::new(self.br.x, self.br.y),
            ));
        }
        if cut.tl.x > self.tl.x {
            pieces.push(Rect::new(
                Point::new(self.tl.x, cut.tl.y),
                Point::new(cut.tl.x, cut.br.y),
            ));
        }
        if cut.br.x < self.br.x {
            pieces.push(Rect::new(
                Point::new(cut.br.x, cut.tl.y),
                Point::new(self.br.x, cut.br.y),
            ));
        }
        pieces.retain(|r| !r.is_empty());
        pieces
    }

    /// total cell count covered by this rect.
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn difference_matches_worked_example() {
        let a = Rect::from_coords(5, 6, 10, 15);
        let b = Rect::from_coords(7, 8, 9, 10);
        let got: HashSet<Rect<i32>> = a.difference(&b).into_iter().collect();
        let want: HashSet<Rect<i32>> = [
            Rect::from_coords(5, 6, 10, 8),
            Rect::from_coords(5, 8, 7, 10),
            Rect::from_coords(9, 8, 10, 10),
            Rect::from_coords(5, 10, 10, 15),
        ]
        .into_iter()
        .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn difference_covers_exactly_the_set_difference() {
        let a = Rect::from_coords(0, 0, 6, 6);
        let b = Rect::from_coords(2, 2, 4, 4);
        let pieces = a.difference(&b);
        let mut covered = HashSet::new();
        for piece in &pieces {
            for x in piece.tl.x..piece.br.x {
                for y in piece.tl.y..piece.br.y {
                    assert!(
                        covered.insert((x, y)),
                        "pieces must be pairwise disjoint, ({x},{y}) double covered"
                    );
                }
            }
        }
        for x in 0..6 {
            for y in 0..6 {
                let in_b = b.contains(Point::new(x, y));
                assert_eq!(covered.contains(&(x, y)), !in_b);
            }
        }
    }

    #[test]
    fn difference_is_empty_when_other_fully_contains_self() {
        let a = Rect::from_coords(2, 2, 4, 4);
        let b = Rect::from_coords(0, 0, 10, 10);
        assert!(a.difference(&b).is_empty());
    }

    #[test]
    fn difference_is_self_when_disjoint() {
        let a = Rect::from_coords(0, 0, 2, 2);
        let b = Rect::from_coords(10, 10, 12, 12);
        assert_eq!(a.difference(&b), vec![a]);
    }

    #[test]
    fn intersection_matches_point_set_intersection() {
        let a = Rect::from_coords(0, 0, 5, 5);
        let b = Rect::from_coords(3, 3, 8, 8);
        let got = a.intersection(&b).unwrap();
        assert_eq!(got, Rect::from_coords(3, 3, 5, 5));

        let c = Rect::from_coords(10, 10, 12, 12);
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn contains_is_half_open_on_bottom_right() {
        let r = Rect::from_coords(0, 0, 4, 4);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(3, 3)));
        assert!(!r.contains(Point::new(4, 3)));
        assert!(!r.contains(Point::new(3, 4)));
    }
}
