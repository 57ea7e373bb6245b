//! Shared state machine for the shape-drawing tools.

use kurbo::{Point, Rect};

use crate::history::Snapshot;
use crate::input::{Key, KeyEvent, MouseEvent, NamedKey};
use crate::object::{ObjectId, ObjectKind, ObjectPatch, SceneObject};
use crate::snap::compute_snapped_position;
use crate::tools::{CursorStyle, EventOutcome, Tool, ToolCtx, ToolKind};

/// Gestures smaller than this on release are treated as accidental and
/// the provisional object is discarded.
pub const MIN_DRAW_SIZE: f64 = 4.0;

#[derive(Debug, Clone, Default)]
enum DrawState {
    #[default]
    Idle,
    Drawing {
        id: ObjectId,
        start: Point,
        current: Point,
        /// Pen stroke points in document space.
        points: Vec<Point>,
        /// Provisional kind is an ellipse (alt toggle on the rectangle
        /// tool).
        ellipse: bool,
        /// Map state before the provisional insert; pushed to history
        /// only when the gesture commits.
        snapshot: Snapshot,
    },
}

/// One tool instance drives rectangle, ellipse, frame, pen, line and
/// arrow drawing: Idle -> Drawing -> committed or cancelled.
///
/// Mouse-down captures an undo snapshot and inserts a provisional
/// object; mouse-move reshapes it (replicating every frame); mouse-up
/// pushes the snapshot and commits when the gesture clears the minimum
/// size, otherwise deletes the provisional object and leaves history
/// untouched. Escape cancels without leaving the tool.
pub struct DrawTool {
    kind: ToolKind,
    state: DrawState,
}

impl DrawTool {
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            state: DrawState::Idle,
        }
    }

    fn initial_kind(&self, ellipse: bool) -> ObjectKind {
        match self.kind {
            ToolKind::Rectangle if ellipse => ObjectKind::Ellipse,
            ToolKind::Rectangle => ObjectKind::Rectangle { corner_radius: 0.0 },
            ToolKind::Ellipse => ObjectKind::Ellipse,
            ToolKind::Frame => ObjectKind::Frame {
                name: String::from("Frame"),
            },
            // Two seed points: one-point paths fail schema validation on
            // peers, which would drop the whole stroke.
            ToolKind::Pen => ObjectKind::Path {
                points: vec![Point::ZERO; 2],
            },
            ToolKind::Line => ObjectKind::Line {
                x1: 0.0,
                y1: 0.0,
                x2: 0.0,
                y2: 0.0,
            },
            ToolKind::Arrow => ObjectKind::Arrow {
                x1: 0.0,
                y1: 0.0,
                x2: 0.0,
                y2: 0.0,
            },
            _ => ObjectKind::Rectangle { corner_radius: 0.0 },
        }
    }

    fn cancel(&mut self, ctx: &mut ToolCtx) -> bool {
        if let DrawState::Drawing { id, .. } = self.state {
            ctx.store.remove(id);
            self.state = DrawState::Idle;
            ctx.overlay.clear();
            true
        } else {
            false
        }
    }
}

/// Geometry patch for the current gesture extent.
fn gesture_patch(
    kind: ToolKind,
    start: Point,
    current: Point,
    points: &[Point],
    shift: bool,
) -> ObjectPatch {
    match kind {
        ToolKind::Line | ToolKind::Arrow => {
            let end = if shift {
                constrain_to_45(start, current)
            } else {
                current
            };
            let bounds = Rect::from_points(start, end);
            let mut patch = ObjectPatch::frame(bounds);
            patch.x1 = Some(start.x - bounds.x0);
            patch.y1 = Some(start.y - bounds.y0);
            patch.x2 = Some(end.x - bounds.x0);
            patch.y2 = Some(end.y - bounds.y0);
            patch
        }
        ToolKind::Pen => {
            let mut bounds = Rect::from_points(points[0], points[0]);
            for p in points {
                bounds = bounds.union_pt(*p);
            }
            let mut patch = ObjectPatch::frame(bounds);
            patch.points = Some(
                points
                    .iter()
                    .map(|p| Point::new(p.x - bounds.x0, p.y - bounds.y0))
                    .collect(),
            );
            patch
        }
        _ => {
            let rect = if shift {
                constrain_to_square(start, current)
            } else {
                Rect::from_points(start, current)
            };
            ObjectPatch::frame(rect)
        }
    }
}

/// Whether the finished gesture is big enough to keep.
fn clears_threshold(kind: ToolKind, start: Point, current: Point, points: &[Point]) -> bool {
    match kind {
        ToolKind::Line | ToolKind::Arrow => start.distance(current) >= MIN_DRAW_SIZE,
        ToolKind::Pen => {
            points.len() >= 2
                && points
                    .iter()
                    .any(|p| p.distance(points[0]) >= MIN_DRAW_SIZE)
        }
        _ => {
            let rect = Rect::from_points(start, current);
            rect.width() >= MIN_DRAW_SIZE || rect.height() >= MIN_DRAW_SIZE
        }
    }
}

fn constrain_to_square(start: Point, current: Point) -> Rect {
    let dx = current.x - start.x;
    let dy = current.y - start.y;
    let side = dx.abs().max(dy.abs());
    let end = Point::new(
        start.x + side * dx.signum(),
        start.y + side * dy.signum(),
    );
    Rect::from_points(start, end)
}

fn constrain_to_45(start: Point, current: Point) -> Point {
    let dx = current.x - start.x;
    let dy = current.y - start.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance < 1e-9 {
        return current;
    }
    let angle = dy.atan2(dx);
    let snapped = (angle / std::f64::consts::FRAC_PI_4).round() * std::f64::consts::FRAC_PI_4;
    Point::new(
        start.x + distance * snapped.cos(),
        start.y + distance * snapped.sin(),
    )
}

impl Tool for DrawTool {
    fn on_deactivate(&mut self, ctx: &mut ToolCtx) {
        self.cancel(ctx);
    }

    fn on_mouse_down(&mut self, ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        if !matches!(self.state, DrawState::Idle) {
            return EventOutcome::ignored();
        }

        let snapshot = ctx.store.snapshot();
        let start = event.canvas;
        let obj = SceneObject::new(
            self.initial_kind(event.modifiers.alt),
            start.x,
            start.y,
            0.0,
            0.0,
            ctx.store.next_z_index(),
        );
        let id = obj.id;
        ctx.store.insert(obj);

        self.state = DrawState::Drawing {
            id,
            start,
            current: start,
            points: vec![start],
            ellipse: event.modifiers.alt,
            snapshot,
        };
        EventOutcome::redraw().with_cursor(CursorStyle::Crosshair)
    }

    fn on_mouse_move(&mut self, ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        let DrawState::Drawing {
            id,
            start,
            current,
            points,
            ellipse,
            ..
        } = &mut self.state
        else {
            return EventOutcome::ignored().with_cursor(CursorStyle::Crosshair);
        };

        // The alt key can flip the rectangle tool's provisional object
        // to an ellipse mid-gesture. Variants are immutable, so the
        // provisional object is replaced.
        if self.kind == ToolKind::Rectangle && event.modifiers.alt != *ellipse {
            *ellipse = event.modifiers.alt;
            let z = ctx.store.get(id).map(|o| o.z_index);
            ctx.store.remove(*id);
            let kind = if *ellipse {
                ObjectKind::Ellipse
            } else {
                ObjectKind::Rectangle { corner_radius: 0.0 }
            };
            let obj = SceneObject::new(
                kind,
                start.x,
                start.y,
                0.0,
                0.0,
                z.unwrap_or_else(|| ctx.store.next_z_index()),
            );
            *id = obj.id;
            ctx.store.insert(obj);
        }

        let mut cursor = event.canvas;
        if !event.modifiers.shift {
            let exclude = std::iter::once(*id).collect();
            let snapped = compute_snapped_position(
                cursor,
                ctx.store.map().values(),
                &exclude,
                ctx.snap_settings,
                event.modifiers.ctrl,
            );
            ctx.overlay.guides = snapped.guides.clone();
            cursor = snapped.position();
        } else {
            ctx.overlay.guides.clear();
        }

        *current = cursor;
        if self.kind == ToolKind::Pen {
            points.push(cursor);
        }

        let patch = gesture_patch(self.kind, *start, *current, points, event.modifiers.shift);
        let id = *id;
        ctx.store.apply_many(vec![(id, patch)]);
        EventOutcome::redraw().with_cursor(CursorStyle::Crosshair)
    }

    fn on_mouse_up(&mut self, ctx: &mut ToolCtx, _event: &MouseEvent) -> EventOutcome {
        let DrawState::Drawing {
            id,
            start,
            current,
            points,
            snapshot,
            ..
        } = std::mem::take(&mut self.state)
        else {
            return EventOutcome::ignored();
        };
        ctx.overlay.clear();

        if clears_threshold(self.kind, start, current, &points) {
            ctx.history.push(snapshot);
            ctx.selection.select_only(id);
            ctx.request_tool(ToolKind::Select);
        } else {
            ctx.store.remove(id);
        }
        EventOutcome::redraw()
    }

    fn on_key_down(&mut self, ctx: &mut ToolCtx, event: &KeyEvent) -> EventOutcome {
        if matches!(event.key, Key::Named(NamedKey::Escape)) && self.cancel(ctx) {
            return EventOutcome::redraw();
        }
        EventOutcome::ignored()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constrain_to_square() {
        let rect = constrain_to_square(Point::new(10.0, 10.0), Point::new(110.0, 60.0));
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 100.0);
        assert_eq!(rect.origin(), Point::new(10.0, 10.0));

        // Dragging up-left mirrors the square.
        let rect = constrain_to_square(Point::new(0.0, 0.0), Point::new(-30.0, -80.0));
        assert_eq!(rect, Rect::new(-80.0, -80.0, 0.0, 0.0));
    }

    #[test]
    fn test_constrain_to_45() {
        let end = constrain_to_45(Point::new(0.0, 0.0), Point::new(100.0, 8.0));
        assert!((end.y).abs() < 1e-9);
        let end = constrain_to_45(Point::new(0.0, 0.0), Point::new(100.0, 95.0));
        assert!((end.x - end.y).abs() < 1e-9);
    }
}
