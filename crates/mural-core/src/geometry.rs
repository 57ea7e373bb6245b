//! Rotation-aware geometric primitives: point-in-object tests, handle
//! math, resize/rotate math and marquee intersection.
//!
//! All functions are pure and operate on absolute document-space
//! rectangles; callers resolve group offsets first.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::object::{MIN_OBJECT_SIZE, normalize_degrees};

/// Handle size in document units (at zoom 1).
pub const HANDLE_SIZE: f64 = 8.0;
/// Extra hit tolerance around a resize handle.
pub const HANDLE_TOLERANCE: f64 = 4.0;
/// Distance of the rotation handle above the object's top edge.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;
/// Rotation handle hit radius is a bit more forgiving.
pub const ROTATE_HANDLE_TOLERANCE: f64 = 8.0;
/// Modifier-snapped rotation increment in degrees.
pub const ROTATION_SNAP_INCREMENT: f64 = 15.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of manipulation handle overlaid on a selected object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
    Rotate,
}

/// A handle with its position in local (unrotated) object space.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub kind: HandleKind,
    pub position: Point,
}

/// Rotate `point` around `center` by `degrees`.
pub fn rotate_point(point: Point, center: Point, degrees: f64) -> Point {
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// The four corners of `rect` rotated around its center.
pub fn rotated_corners(rect: Rect, degrees: f64) -> [Point; 4] {
    let center = rect.center();
    [
        rotate_point(Point::new(rect.x0, rect.y0), center, degrees),
        rotate_point(Point::new(rect.x1, rect.y0), center, degrees),
        rotate_point(Point::new(rect.x1, rect.y1), center, degrees),
        rotate_point(Point::new(rect.x0, rect.y1), center, degrees),
    ]
}

/// Axis-aligned bounding box of `rect` after rotation around its center.
pub fn rotated_aabb(rect: Rect, degrees: f64) -> Rect {
    if degrees == 0.0 {
        return rect;
    }
    let corners = rotated_corners(rect, degrees);
    let mut out = Rect::new(corners[0].x, corners[0].y, corners[0].x, corners[0].y);
    for c in &corners[1..] {
        out.x0 = out.x0.min(c.x);
        out.y0 = out.y0.min(c.y);
        out.x1 = out.x1.max(c.x);
        out.y1 = out.y1.max(c.y);
    }
    out
}

/// Point-in-object test for a possibly rotated object.
///
/// Translates the point into the object's local frame by rotating it around
/// the center by the inverse of the object's rotation, then tests against
/// the axis-aligned rectangle.
pub fn point_in_object(point: Point, rect: Rect, rotation_degrees: f64) -> bool {
    let local = if rotation_degrees == 0.0 {
        point
    } else {
        rotate_point(point, rect.center(), -rotation_degrees)
    };
    local.x >= rect.x0 && local.x <= rect.x1 && local.y >= rect.y0 && local.y <= rect.y1
}

/// The eight resize handles plus the rotation handle, positioned in the
/// object's local (unrotated) frame for a rect with the given size.
pub fn handle_local_positions(width: f64, height: f64) -> Vec<Handle> {
    let (w, h) = (width, height);
    vec![
        Handle {
            kind: HandleKind::Corner(Corner::TopLeft),
            position: Point::new(0.0, 0.0),
        },
        Handle {
            kind: HandleKind::Corner(Corner::TopRight),
            position: Point::new(w, 0.0),
        },
        Handle {
            kind: HandleKind::Corner(Corner::BottomLeft),
            position: Point::new(0.0, h),
        },
        Handle {
            kind: HandleKind::Corner(Corner::BottomRight),
            position: Point::new(w, h),
        },
        Handle {
            kind: HandleKind::Edge(Edge::Top),
            position: Point::new(w / 2.0, 0.0),
        },
        Handle {
            kind: HandleKind::Edge(Edge::Right),
            position: Point::new(w, h / 2.0),
        },
        Handle {
            kind: HandleKind::Edge(Edge::Bottom),
            position: Point::new(w / 2.0, h),
        },
        Handle {
            kind: HandleKind::Edge(Edge::Left),
            position: Point::new(0.0, h / 2.0),
        },
        Handle {
            kind: HandleKind::Rotate,
            position: Point::new(w / 2.0, -ROTATE_HANDLE_OFFSET),
        },
    ]
}

/// Hit-test the handles of a rotated object.
///
/// The cursor is brought into the object's local frame with the inverse
/// rotation, then compared against each handle's local position. `zoom`
/// scales the tolerances so handles stay grabbable when zoomed out.
pub fn hit_test_handle(cursor: Point, rect: Rect, rotation_degrees: f64, zoom: f64) -> Option<HandleKind> {
    let zoom = if zoom > 0.0 { zoom } else { 1.0 };
    let center = rect.center();
    let local_cursor = rotate_point(cursor, center, -rotation_degrees);
    let local = Point::new(local_cursor.x - rect.x0, local_cursor.y - rect.y0);

    for handle in handle_local_positions(rect.width(), rect.height()) {
        let radius = match handle.kind {
            HandleKind::Rotate => HANDLE_SIZE / 2.0 + ROTATE_HANDLE_TOLERANCE,
            _ => HANDLE_SIZE / 2.0 + HANDLE_TOLERANCE,
        } / zoom;
        let dx = local.x - handle.position.x;
        let dy = local.y - handle.position.y;
        if dx * dx + dy * dy <= radius * radius {
            return Some(handle.kind);
        }
    }
    None
}

/// Resize `start` by a drag of `delta` on `handle`.
///
/// Corner handles keep the aspect ratio unless `free` is set; edge handles
/// resize one dimension. Results are clamped to the minimum size floor, and
/// the anchored edge's origin is recomputed so the opposite edge stays
/// fixed.
pub fn resize_rect(handle: HandleKind, start: Rect, delta: Vec2, free: bool) -> Rect {
    let (w0, h0) = (start.width(), start.height());
    let aspect = w0 / h0;

    let (mut x0, mut y0, mut x1, mut y1) = (start.x0, start.y0, start.x1, start.y1);
    match handle {
        HandleKind::Corner(corner) => {
            let (mut dw, mut dh) = match corner {
                Corner::TopLeft => (-delta.x, -delta.y),
                Corner::TopRight => (delta.x, -delta.y),
                Corner::BottomLeft => (-delta.x, delta.y),
                Corner::BottomRight => (delta.x, delta.y),
            };
            if !free {
                // Lock aspect ratio: the dominant axis drives both.
                if dw.abs() >= dh.abs() * aspect {
                    dh = dw / aspect;
                } else {
                    dw = dh * aspect;
                }
            }
            let w = (w0 + dw).max(MIN_OBJECT_SIZE);
            let h = (h0 + dh).max(MIN_OBJECT_SIZE);
            match corner {
                Corner::TopLeft => {
                    x0 = x1 - w;
                    y0 = y1 - h;
                }
                Corner::TopRight => {
                    x1 = x0 + w;
                    y0 = y1 - h;
                }
                Corner::BottomLeft => {
                    x0 = x1 - w;
                    y1 = y0 + h;
                }
                Corner::BottomRight => {
                    x1 = x0 + w;
                    y1 = y0 + h;
                }
            }
        }
        HandleKind::Edge(edge) => match edge {
            Edge::Top => y0 = (y0 + delta.y).min(y1 - MIN_OBJECT_SIZE),
            Edge::Bottom => y1 = (y1 + delta.y).max(y0 + MIN_OBJECT_SIZE),
            Edge::Left => x0 = (x0 + delta.x).min(x1 - MIN_OBJECT_SIZE),
            Edge::Right => x1 = (x1 + delta.x).max(x0 + MIN_OBJECT_SIZE),
        },
        HandleKind::Rotate => return start,
    }
    Rect::new(x0, y0, x1, y1)
}

/// Rotation resulting from a rotate-handle drag.
///
/// The handle sits above the center, so the raw atan2 angle is offset by
/// 90 degrees. The object's rotation changes by the angular travel between
/// the gesture start and the current cursor; `snap` rounds the result to
/// 15 degree increments.
pub fn rotation_from_drag(
    center: Point,
    start_cursor: Point,
    cursor: Point,
    start_rotation: f64,
    snap: bool,
) -> f64 {
    let angle_of = |p: Point| (p.y - center.y).atan2(p.x - center.x).to_degrees() + 90.0;
    let start_angle = angle_of(start_cursor);
    let current_angle = angle_of(cursor);
    let mut rotation = normalize_degrees(start_rotation + (current_angle - start_angle));
    if snap {
        rotation = normalize_degrees(
            (rotation / ROTATION_SNAP_INCREMENT).round() * ROTATION_SNAP_INCREMENT,
        );
    }
    rotation
}

/// Marquee-vs-object intersection for a possibly rotated object.
///
/// For unrotated objects this is plain axis-aligned overlap. For rotated
/// objects the union of three tests catches every overlap case, including
/// containment in either direction: any rotated corner inside the marquee,
/// any marquee corner inside the rotated object, or any pair of edges
/// crossing.
pub fn marquee_intersects(marquee: Rect, rect: Rect, rotation_degrees: f64) -> bool {
    if rotation_degrees == 0.0 {
        return aabb_overlap(marquee, rect);
    }

    let object_corners = rotated_corners(rect, rotation_degrees);
    for corner in object_corners {
        if marquee.contains(corner) {
            return true;
        }
    }
    let marquee_corners = [
        Point::new(marquee.x0, marquee.y0),
        Point::new(marquee.x1, marquee.y0),
        Point::new(marquee.x1, marquee.y1),
        Point::new(marquee.x0, marquee.y1),
    ];
    for corner in marquee_corners {
        if point_in_object(corner, rect, rotation_degrees) {
            return true;
        }
    }
    for i in 0..4 {
        for j in 0..4 {
            if segments_cross(
                marquee_corners[i],
                marquee_corners[(i + 1) % 4],
                object_corners[j],
                object_corners[(j + 1) % 4],
            ) {
                return true;
            }
        }
    }
    false
}

fn aabb_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let orient = |p: Point, q: Point, r: Point| {
        (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
    };
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_center_always_hit_regardless_of_rotation() {
        let rect = Rect::new(100.0, 100.0, 200.0, 160.0);
        let center = rect.center();
        for i in 0..72 {
            let theta = i as f64 * 5.0;
            assert!(
                point_in_object(center, rect, theta),
                "center missed at {theta} degrees"
            );
        }
    }

    #[test]
    fn test_point_outside_rotated_aabb_never_hit() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        for i in 0..72 {
            let theta = i as f64 * 5.0;
            let aabb = rotated_aabb(rect, theta);
            let outside = Point::new(aabb.x1 + 10.0, aabb.y1 + 10.0);
            assert!(!point_in_object(outside, rect, theta));
        }
    }

    #[test]
    fn test_point_in_rotated_object() {
        // A 100x20 bar rotated 90 degrees: a point above the original
        // top edge but inside the rotated footprint must hit.
        let rect = Rect::new(0.0, 40.0, 100.0, 60.0);
        let probe = Point::new(50.0, 10.0);
        assert!(!point_in_object(probe, rect, 0.0));
        assert!(point_in_object(probe, rect, 90.0));
    }

    #[test]
    fn test_handle_hit_unrotated() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            hit_test_handle(Point::new(0.0, 0.0), rect, 0.0, 1.0),
            Some(HandleKind::Corner(Corner::TopLeft))
        );
        assert_eq!(
            hit_test_handle(Point::new(100.0, 50.0), rect, 0.0, 1.0),
            Some(HandleKind::Edge(Edge::Right))
        );
        assert_eq!(
            hit_test_handle(Point::new(50.0, -ROTATE_HANDLE_OFFSET), rect, 0.0, 1.0),
            Some(HandleKind::Rotate)
        );
        assert_eq!(hit_test_handle(Point::new(50.0, 50.0), rect, 0.0, 1.0), None);
    }

    #[test]
    fn test_handle_hit_rotated() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        // At 90 degrees the top-left corner moves to the top-right.
        let rotated_tl = rotate_point(Point::new(0.0, 0.0), rect.center(), 90.0);
        assert_eq!(
            hit_test_handle(rotated_tl, rect, 90.0, 1.0),
            Some(HandleKind::Corner(Corner::TopLeft))
        );
    }

    #[test]
    fn test_resize_floor_keeps_opposite_edge() {
        let start = Rect::new(10.0, 10.0, 110.0, 110.0);
        // Drag the bottom-right corner far past the top-left.
        let out = resize_rect(
            HandleKind::Corner(Corner::BottomRight),
            start,
            Vec2::new(-500.0, -500.0),
            true,
        );
        assert!((out.width() - MIN_OBJECT_SIZE).abs() < EPS);
        assert!((out.height() - MIN_OBJECT_SIZE).abs() < EPS);
        // Anchored (top-left) edge unchanged.
        assert!((out.x0 - 10.0).abs() < EPS);
        assert!((out.y0 - 10.0).abs() < EPS);

        // Same from the top-left handle: bottom-right must stay fixed.
        let out = resize_rect(
            HandleKind::Corner(Corner::TopLeft),
            start,
            Vec2::new(500.0, 500.0),
            true,
        );
        assert!((out.x1 - 110.0).abs() < EPS);
        assert!((out.y1 - 110.0).abs() < EPS);
        assert!((out.width() - MIN_OBJECT_SIZE).abs() < EPS);
    }

    #[test]
    fn test_resize_corner_locks_aspect() {
        let start = Rect::new(0.0, 0.0, 200.0, 100.0);
        let out = resize_rect(
            HandleKind::Corner(Corner::BottomRight),
            start,
            Vec2::new(100.0, 0.0),
            false,
        );
        assert!((out.width() / out.height() - 2.0).abs() < EPS);
        assert!((out.width() - 300.0).abs() < EPS);
    }

    #[test]
    fn test_resize_edge_single_axis() {
        let start = Rect::new(0.0, 0.0, 100.0, 100.0);
        let out = resize_rect(HandleKind::Edge(Edge::Right), start, Vec2::new(30.0, 99.0), false);
        assert!((out.width() - 130.0).abs() < EPS);
        assert!((out.height() - 100.0).abs() < EPS);
        let out = resize_rect(HandleKind::Edge(Edge::Top), start, Vec2::new(99.0, -30.0), false);
        assert!((out.height() - 130.0).abs() < EPS);
        assert!((out.y1 - 100.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_from_drag() {
        let center = Point::new(0.0, 0.0);
        // Handle starts directly above center; drag a quarter turn right.
        let start_cursor = Point::new(0.0, -50.0);
        let cursor = Point::new(50.0, 0.0);
        let rotation = rotation_from_drag(center, start_cursor, cursor, 0.0, false);
        assert!((rotation - 90.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_snap() {
        let center = Point::new(0.0, 0.0);
        let start_cursor = Point::new(0.0, -50.0);
        // 47 degrees of travel snaps to 45.
        let cursor = rotate_point(start_cursor, center, 47.0);
        let rotation = rotation_from_drag(center, start_cursor, cursor, 0.0, true);
        assert!((rotation - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_marquee_example() {
        let marquee = Rect::new(0.0, 0.0, 200.0, 200.0);
        assert!(marquee_intersects(marquee, Rect::new(50.0, 50.0, 100.0, 100.0), 0.0));
        assert!(!marquee_intersects(marquee, Rect::new(300.0, 300.0, 350.0, 350.0), 0.0));
    }

    #[test]
    fn test_marquee_contains_rotated_object() {
        let marquee = Rect::new(0.0, 0.0, 400.0, 400.0);
        let rect = Rect::new(150.0, 150.0, 250.0, 250.0);
        assert!(marquee_intersects(marquee, rect, 30.0));
    }

    #[test]
    fn test_marquee_inside_rotated_object() {
        // Tiny marquee fully inside a big rotated object: caught by the
        // marquee-corner-in-object test.
        let marquee = Rect::new(95.0, 95.0, 105.0, 105.0);
        let rect = Rect::new(0.0, 0.0, 200.0, 200.0);
        assert!(marquee_intersects(marquee, rect, 45.0));
    }

    #[test]
    fn test_marquee_misses_rotated_object() {
        // A thin bar rotated 45 degrees sweeps away from this corner
        // marquee even though the unrotated bounds would overlap it.
        let marquee = Rect::new(0.0, 40.0, 12.0, 52.0);
        let bar = Rect::new(0.0, 40.0, 200.0, 60.0);
        assert!(marquee_intersects(marquee, bar, 0.0));
        assert!(!marquee_intersects(marquee, bar, 45.0));
    }

    #[test]
    fn test_rotated_aabb_of_square_at_45() {
        let rect = Rect::new(-50.0, -50.0, 50.0, 50.0);
        let aabb = rotated_aabb(rect, 45.0);
        let half_diag = 50.0 * std::f64::consts::SQRT_2;
        assert!((aabb.x1 - half_diag).abs() < 1e-6);
        assert!((aabb.y1 - half_diag).abs() < 1e-6);
    }
}
