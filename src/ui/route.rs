use crate::core::value::format_number;
use crate::ui::geometry::{Point, Rect};
use std::fmt::Write;

const ARROW_WIDTH: f64 = 0.4;
const ATTACHMENT_HEIGHT: f64 = 0.6;
const ATTACHMENT_WIDTH: f64 = 0.4;
const MAX_C_WIDTH: f64 = 3.0;
const MIN_DELTA: f64 = 2.0;
const MAX_DELTA: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteShape {
    /// S-curve to a target that starts right of the source.
    Forward,
    /// C-curve bulging right of both boxes.
    ReverseC,
    /// Leaves the source container first, then curves back to the target.
    ReverseAround,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Move(Point),
    Line(Point),
    Quad(Point, Point),
    Cubic(Point, Point, Point),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub shape: RouteShape,
    pub segments: Vec<Segment>,
    pub arrow: [Point; 3],
}

impl Route {
    /// Routes an edge from `from` (inside the box `outer`) to `to`.
    ///
    /// `attachment` is the 1-based rank of this edge among the target's
    /// incoming edges; it spreads arrowheads down the target's left or
    /// right side. Short targets take every edge at their vertical center.
    pub fn between(from: Rect, outer: Rect, to: Rect, attachment: usize) -> Route {
        let forward = from.right() <= to.x;

        let x1 = from.x + from.width / 2.0;
        let y1 = from.y + from.height / 2.0;
        let x1outer = outer.right() + ATTACHMENT_WIDTH;

        let mut segments = vec![
            Segment::Move(Point::new(x1, y1)),
            Segment::Line(Point::new(x1outer, y1)),
        ];

        let mut attachment_y = if forward {
            ATTACHMENT_HEIGHT
        } else {
            ATTACHMENT_HEIGHT * 3.0 / 2.0
        };
        let mut attachment = attachment.max(1);
        if to.height < 2.0 * attachment_y {
            attachment_y = to.height / 2.0;
            attachment = 1;
        } else {
            let slots = ((to.height / attachment_y).floor() as usize)
                .saturating_sub(1)
                .max(1);
            attachment = (attachment - 1) % slots + 1;
        }
        let y2 = to.y + attachment_y * attachment as f64;

        if forward {
            let x2 = to.x - 2.0 * ARROW_WIDTH;
            let bend = (y2 - y1).abs() * 0.5;
            segments.push(Segment::Cubic(
                Point::new(x1outer + bend, y1),
                Point::new(x2 - bend, y2),
                Point::new(x2, y2),
            ));
            segments.push(Segment::Line(Point::new(x2 + ARROW_WIDTH, y2)));
            return Route {
                shape: RouteShape::Forward,
                segments,
                arrow: arrowhead(x2 + 2.0 * ARROW_WIDTH, x2 + ARROW_WIDTH, y2),
            };
        }

        let x2 = to.right() + 2.0 * ARROW_WIDTH;
        let arrow = arrowhead(x2 - 2.0 * ARROW_WIDTH, x2 - ARROW_WIDTH, y2);

        if to.right() > from.x || y2 < outer.y || y2 > outer.bottom() {
            let xmax = x1outer.max(x2);
            let xmid = xmax + MAX_C_WIDTH.min((y1 - y2).abs() * 0.25);
            let ymid = (y1 + y2) / 2.0;
            segments.push(Segment::Line(Point::new(xmax, y1)));
            segments.push(Segment::Quad(Point::new(xmid, y1), Point::new(xmid, ymid)));
            segments.push(Segment::Quad(Point::new(xmid, y2), Point::new(xmax, y2)));
            segments.push(Segment::Line(Point::new(x2 - ARROW_WIDTH, y2)));
            return Route {
                shape: RouteShape::ReverseC,
                segments,
                arrow,
            };
        }

        let outer_ymid = outer.y + outer.height / 2.0;
        let spread = if outer_ymid == 0.0 {
            0.0
        } else {
            (y1 / outer_ymid - 1.0).abs()
        };
        let delta = MIN_DELTA + (MAX_DELTA - MIN_DELTA) * spread.min(1.0);
        let x3 = outer.x - delta;
        let y3 = if y1 > outer_ymid {
            outer.bottom() + delta
        } else {
            outer.y - delta
        };
        let xmid = x1outer + MAX_C_WIDTH.min((y1 - y3).abs() * 0.25);
        let ymid = (y1 + y3) / 2.0;
        let bend = (y2 - y3).abs() * 0.5;
        segments.push(Segment::Quad(Point::new(xmid, y1), Point::new(xmid, ymid)));
        segments.push(Segment::Quad(Point::new(xmid, y3), Point::new(x1outer, y3)));
        segments.push(Segment::Line(Point::new(x3, y3)));
        segments.push(Segment::Cubic(
            Point::new(x3 - bend, y3),
            Point::new(x2 + bend, y2),
            Point::new(x2, y2),
        ));
        segments.push(Segment::Line(Point::new(x2 - ARROW_WIDTH, y2)));
        Route {
            shape: RouteShape::ReverseAround,
            segments,
            arrow,
        }
    }

    pub fn end(&self) -> Point {
        self.arrow[0]
    }

    fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.segments
            .iter()
            .flat_map(|segment| match *segment {
                Segment::Move(p) | Segment::Line(p) => vec![p],
                Segment::Quad(c, p) => vec![c, p],
                Segment::Cubic(c1, c2, p) => vec![c1, c2, p],
            })
            .chain(self.arrow)
    }

    /// Bounding box including control points.
    pub fn bounds(&self) -> Rect {
        Rect::enclosing(self.points()).unwrap_or_default()
    }

    /// SVG path data of the stroke.
    pub fn path_data(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if !out.is_empty() {
                out.push(' ');
            }
            match *segment {
                Segment::Move(p) => {
                    let _ = write!(out, "M {}", coords(p));
                }
                Segment::Line(p) => {
                    let _ = write!(out, "L {}", coords(p));
                }
                Segment::Quad(c, p) => {
                    let _ = write!(out, "Q {}, {}", coords(c), coords(p));
                }
                Segment::Cubic(c1, c2, p) => {
                    let _ = write!(out, "C {}, {}, {}", coords(c1), coords(c2), coords(p));
                }
            }
        }
        out
    }

    /// SVG path data of the filled arrowhead.
    pub fn arrow_data(&self) -> String {
        let [tip, a, b] = self.arrow;
        format!("M {} L {} L {} Z", coords(tip), coords(a), coords(b))
    }
}

fn arrowhead(tip_x: f64, base_x: f64, y: f64) -> [Point; 3] {
    [
        Point::new(tip_x, y),
        Point::new(base_x, y - ARROW_WIDTH / 2.0),
        Point::new(base_x, y + ARROW_WIDTH / 2.0),
    ]
}

fn coords(point: Point) -> String {
    format!(
        "{} {}",
        format_number((point.x * 1000.0).round() / 1000.0),
        format_number((point.y * 1000.0).round() / 1000.0)
    )
}

#[cfg(test)]
mod tests {
    use super::{Route, RouteShape, Segment};
    use crate::ui::geometry::{Point, Rect};

    fn source() -> (Rect, Rect) {
        let outer = Rect::new(8.0, 4.0, 4.0, 6.0);
        let from = Rect::new(10.0, 6.0, 1.5, 1.5);
        (from, outer)
    }

    #[test]
    fn target_right_and_below_takes_forward_curve() {
        let (from, outer) = source();
        let to = Rect::new(16.0, 12.0, 4.0, 3.0);
        let route = Route::between(from, outer, to, 1);

        assert_eq!(route.shape, RouteShape::Forward);
        assert_eq!(route.end(), Point::new(16.0, 12.6));
        assert!(matches!(route.segments[2], Segment::Cubic(..)));
    }

    #[test]
    fn target_overlapping_source_column_takes_c_curve() {
        let (from, outer) = source();
        let to = Rect::new(9.0, 12.0, 4.0, 3.0);
        let route = Route::between(from, outer, to, 1);

        assert_eq!(route.shape, RouteShape::ReverseC);
        let bulge = route.bounds().right();
        assert!(bulge > outer.right());
        assert!(bulge > to.right());
    }

    #[test]
    fn target_left_within_container_band_goes_around() {
        let (from, outer) = source();
        let to = Rect::new(1.0, 5.0, 3.0, 4.0);
        let route = Route::between(from, outer, to, 1);

        assert_eq!(route.shape, RouteShape::ReverseAround);
        let bounds = route.bounds();
        assert!(bounds.y < outer.y || bounds.bottom() > outer.bottom());
    }

    #[test]
    fn target_left_outside_container_band_takes_c_curve() {
        let (from, outer) = source();
        let to = Rect::new(1.0, 20.0, 3.0, 4.0);
        let route = Route::between(from, outer, to, 1);
        assert_eq!(route.shape, RouteShape::ReverseC);
    }

    #[test]
    fn incoming_edges_attach_at_different_heights() {
        let (from, outer) = source();
        let to = Rect::new(16.0, 12.0, 4.0, 3.0);
        let first = Route::between(from, outer, to, 1).end();
        let second = Route::between(from, outer, to, 2).end();
        assert!(second.y > first.y);
        assert!(second.y < to.bottom());
    }

    #[test]
    fn short_targets_collapse_to_center() {
        let (from, outer) = source();
        let to = Rect::new(16.0, 12.0, 4.0, 1.0);
        let first = Route::between(from, outer, to, 1).end();
        let third = Route::between(from, outer, to, 3).end();
        assert_eq!(first.y, 12.5);
        assert_eq!(third.y, 12.5);
    }

    #[test]
    fn rubber_band_routes_to_a_point() {
        let (from, outer) = source();
        let route = Route::between(from, outer, Rect::point(Point::new(20.0, 3.0)), 1);
        assert_eq!(route.shape, RouteShape::Forward);
        assert!(route.path_data().starts_with("M 10.75 6.75 L 12.4 6.75 C "));
        assert!(route.arrow_data().ends_with(" Z"));
    }
}
