//! Plain 2D geometry: points, axis-aligned bounds, segment math and the
//! number formatting used for SVG attribute values.

/// Canvas-space point. Coordinates are exact f64; nothing in the kernel
/// rounds or clamps positions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Normalized box spanning two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    /// Tight box around a point list. Empty input collapses to the origin.
    pub fn of_points(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        points.iter().skip(1).fold(
            Self::new(first.x, first.y, first.x, first.y),
            |b, p| {
                Self::new(
                    b.min_x.min(p.x),
                    b.min_y.min(p.y),
                    b.max_x.max(p.x),
                    b.max_y.max(p.y),
                )
            },
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Full containment, boundary inclusive.
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    pub fn expanded(&self, pad: f64) -> Bounds {
        Bounds::new(
            self.min_x - pad,
            self.min_y - pad,
            self.max_x + pad,
            self.max_y + pad,
        )
    }
}

/// Closest point to `p` on the segment `a..b`, with the parameter clamped
/// to the segment.
pub fn project_point_to_segment(p: Point, a: Point, b: Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    Point::new(a.x + t * dx, a.y + t * dy)
}

pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    p.distance_to(project_point_to_segment(p, a, b))
}

/// Parse an SVG `points` attribute. Tokens split on whitespace and commas;
/// non-finite or incomplete pairs are skipped.
pub fn parse_points(raw: &str) -> Vec<Point> {
    let values: Vec<f64> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect();
    values
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

pub fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Attribute-value formatting: whole numbers print without a decimal
/// point, everything else uses the shortest f64 form.
pub fn fmt_num(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_print_without_decimals() {
        assert_eq!(fmt_num(140.0), "140");
        assert_eq!(fmt_num(-20.0), "-20");
        assert_eq!(fmt_num(6.5), "6.5");
        assert_eq!(fmt_num(0.0), "0");
    }

    #[test]
    fn points_round_trip_through_the_attribute_format() {
        let pts = vec![Point::new(10.0, 20.0), Point::new(30.5, -4.0)];
        let raw = format_points(&pts);
        assert_eq!(raw, "10,20 30.5,-4");
        assert_eq!(parse_points(&raw), pts);
    }

    #[test]
    fn parse_skips_garbage_tokens() {
        assert_eq!(parse_points("1,2 nan,3 4,5"), vec![Point::new(1.0, 2.0)]);
        assert_eq!(parse_points(""), vec![]);
    }

    #[test]
    fn projection_clamps_to_the_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(project_point_to_segment(Point::new(5.0, 3.0), a, b), Point::new(5.0, 0.0));
        assert_eq!(project_point_to_segment(Point::new(-5.0, 3.0), a, b), a);
        assert_eq!(project_point_to_segment(Point::new(15.0, 3.0), a, b), b);
        assert_eq!(point_to_segment_distance(Point::new(5.0, 3.0), a, b), 3.0);
    }

    #[test]
    fn bounds_cover_their_points() {
        let b = Bounds::of_points(&[
            Point::new(3.0, 9.0),
            Point::new(-1.0, 4.0),
            Point::new(7.0, 5.0),
        ]);
        assert_eq!(b, Bounds::new(-1.0, 4.0, 7.0, 9.0));
        assert_eq!(b.center(), Point::new(3.0, 6.5));
        assert!(b.contains(Point::new(0.0, 5.0)));
        assert!(!b.contains(Point::new(8.0, 5.0)));
        assert!(b.contains_bounds(&Bounds::new(0.0, 5.0, 6.0, 8.0)));
        assert!(!b.contains_bounds(&Bounds::new(0.0, 5.0, 8.0, 8.0)));
    }
}
