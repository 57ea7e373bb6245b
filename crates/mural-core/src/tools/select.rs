//! Select tool: click selection, drag/resize/rotate gestures, marquee
//! selection, and double-click edit modes.

use std::time::Instant;

use kurbo::{Point, Rect, Vec2};

use crate::geometry::{
    hit_test_handle, marquee_intersects, rotate_point, rotation_from_drag, Corner, Edge,
    HandleKind,
};
use crate::groups;
use crate::input::{Key, KeyEvent, MouseEvent, NamedKey};
use crate::object::{ObjectId, ObjectKind, ObjectPatch};
use crate::snap::compute_snapped_position;
use crate::tools::{
    CursorStyle, EditRequest, EditTarget, EventOutcome, Tool, ToolCtx, DOUBLE_CLICK,
};

#[derive(Debug, Clone)]
enum SelectState {
    Idle,
    Dragging {
        start_cursor: Point,
        /// Stored (parent-relative) origin of each dragged object.
        originals: Vec<(ObjectId, Point)>,
        /// Absolute position of the primary object at gesture start,
        /// used as the snap probe.
        primary_abs: Point,
        snapshotted: bool,
    },
    Resizing {
        id: ObjectId,
        handle: HandleKind,
        /// Absolute bounds at gesture start.
        start_bounds: Rect,
        rotation: f64,
        start_cursor: Point,
        /// Absolute-minus-stored offset (non-zero for group children).
        parent_offset: Vec2,
        snapshotted: bool,
    },
    Rotating {
        id: ObjectId,
        center: Point,
        start_cursor: Point,
        start_rotation: f64,
        snapshotted: bool,
    },
    Marquee {
        start: Point,
        current: Point,
        /// Union with the prior selection (modifier captured at drag
        /// start, not re-read on mouse-up).
        union: bool,
        prior: Vec<ObjectId>,
    },
}

pub struct SelectTool {
    state: SelectState,
    last_click: Option<(Instant, Option<ObjectId>)>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self {
            state: SelectState::Idle,
            last_click: None,
        }
    }

    fn is_double_click(&self, now: Instant, hit: Option<ObjectId>) -> bool {
        matches!(self.last_click, Some((at, prev)) if prev == hit
            && hit.is_some()
            && now.duration_since(at) <= DOUBLE_CLICK)
    }

    fn handle_double_click(&mut self, ctx: &mut ToolCtx, id: ObjectId) -> EventOutcome {
        let Some(obj) = ctx.store.get(&id) else {
            return EventOutcome::ignored();
        };
        match &obj.kind {
            ObjectKind::Text { .. } => {
                ctx.requested_edit = Some(EditRequest {
                    id,
                    target: EditTarget::TextContent,
                });
                EventOutcome::redraw().with_cursor(CursorStyle::Text)
            }
            ObjectKind::Frame { .. } => {
                ctx.requested_edit = Some(EditRequest {
                    id,
                    target: EditTarget::FrameName,
                });
                EventOutcome::redraw()
            }
            ObjectKind::Group { .. } => {
                ctx.requested_group_edit = Some(Some(id));
                ctx.selection.clear();
                EventOutcome::redraw()
            }
            ObjectKind::Video { playing, .. } => {
                let playing = *playing;
                ctx.push_history();
                let patch = ObjectPatch {
                    playing: Some(!playing),
                    ..Default::default()
                };
                ctx.store.apply(id, patch);
                EventOutcome::redraw()
            }
            _ => EventOutcome::ignored(),
        }
    }

    /// Try to enter a handle gesture on the single selected object.
    fn try_handle_gesture(&mut self, ctx: &ToolCtx, cursor: Point) -> Option<SelectState> {
        if ctx.selection.len() != 1 {
            return None;
        }
        let id = ctx.selection.primary()?;
        let obj = ctx.store.get(&id)?;
        if obj.locked {
            return None;
        }
        let bounds = groups::absolute_bounds(ctx.store.map(), id)?;
        let handle = hit_test_handle(cursor, bounds, obj.rotation, ctx.viewport.zoom)?;

        Some(match handle {
            HandleKind::Rotate => SelectState::Rotating {
                id,
                center: bounds.center(),
                start_cursor: cursor,
                start_rotation: obj.rotation,
                snapshotted: false,
            },
            _ => SelectState::Resizing {
                id,
                handle,
                start_bounds: bounds,
                rotation: obj.rotation,
                start_cursor: cursor,
                parent_offset: Vec2::new(bounds.x0 - obj.x, bounds.y0 - obj.y),
                snapshotted: false,
            },
        })
    }

    fn begin_drag(&self, ctx: &ToolCtx, cursor: Point) -> Option<SelectState> {
        let objects = ctx.store.map();
        let mut originals = Vec::new();
        for id in ctx.selection.iter() {
            let obj = objects.get(&id)?;
            if obj.locked {
                return None;
            }
            originals.push((id, Point::new(obj.x, obj.y)));
        }
        let primary = ctx.selection.primary()?;
        let primary_abs = groups::absolute_position(objects, primary)?;
        Some(SelectState::Dragging {
            start_cursor: cursor,
            originals,
            primary_abs,
            snapshotted: false,
        })
    }

    fn rollback(&mut self, ctx: &mut ToolCtx) -> bool {
        let rolled = match std::mem::replace(&mut self.state, SelectState::Idle) {
            SelectState::Idle => false,
            SelectState::Dragging { originals, .. } => {
                let patches = originals
                    .into_iter()
                    .map(|(id, origin)| (id, ObjectPatch::position(origin.x, origin.y)))
                    .collect();
                ctx.store.apply_many(patches);
                true
            }
            SelectState::Resizing {
                id,
                start_bounds,
                parent_offset,
                ..
            } => {
                let mut patch = ObjectPatch::frame(start_bounds);
                patch.x = Some(start_bounds.x0 - parent_offset.x);
                patch.y = Some(start_bounds.y0 - parent_offset.y);
                ctx.store.apply_many(vec![(id, patch)]);
                true
            }
            SelectState::Rotating {
                id, start_rotation, ..
            } => {
                let patch = ObjectPatch {
                    rotation: Some(start_rotation),
                    ..Default::default()
                };
                ctx.store.apply_many(vec![(id, patch)]);
                true
            }
            SelectState::Marquee { .. } => true,
        };
        if rolled {
            ctx.overlay.clear();
        }
        rolled
    }

    fn hover_cursor(&self, ctx: &ToolCtx, cursor: Point) -> CursorStyle {
        if ctx.selection.len() == 1 {
            if let Some(id) = ctx.selection.primary() {
                if let (Some(obj), Some(bounds)) =
                    (ctx.store.get(&id), groups::absolute_bounds(ctx.store.map(), id))
                {
                    if let Some(handle) =
                        hit_test_handle(cursor, bounds, obj.rotation, ctx.viewport.zoom)
                    {
                        return cursor_for_handle(handle);
                    }
                }
            }
        }
        if ctx.top_object_at(cursor).is_some() {
            CursorStyle::Move
        } else {
            CursorStyle::Default
        }
    }
}

fn cursor_for_handle(handle: HandleKind) -> CursorStyle {
    match handle {
        HandleKind::Corner(Corner::TopLeft) | HandleKind::Corner(Corner::BottomRight) => {
            CursorStyle::ResizeDiagonalNwSe
        }
        HandleKind::Corner(Corner::TopRight) | HandleKind::Corner(Corner::BottomLeft) => {
            CursorStyle::ResizeDiagonalNeSw
        }
        HandleKind::Edge(Edge::Left) | HandleKind::Edge(Edge::Right) => {
            CursorStyle::ResizeHorizontal
        }
        HandleKind::Edge(Edge::Top) | HandleKind::Edge(Edge::Bottom) => {
            CursorStyle::ResizeVertical
        }
        HandleKind::Rotate => CursorStyle::Rotate,
    }
}

impl Tool for SelectTool {
    fn on_deactivate(&mut self, ctx: &mut ToolCtx) {
        self.rollback(ctx);
    }

    fn on_mouse_down(&mut self, ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        if !matches!(self.state, SelectState::Idle) {
            return EventOutcome::ignored();
        }
        let cursor = event.canvas;
        let hit = ctx.top_object_at(cursor);

        if self.is_double_click(ctx.now, hit) {
            self.last_click = None;
            if let Some(id) = hit {
                return self.handle_double_click(ctx, id);
            }
        }
        self.last_click = Some((ctx.now, hit));

        // Resize/rotate handles take priority over object bodies.
        if let Some(state) = self.try_handle_gesture(ctx, cursor) {
            self.state = state;
            return EventOutcome::redraw();
        }

        match hit {
            Some(id) => {
                if event.modifiers.shift {
                    ctx.selection.toggle(id);
                    return EventOutcome::redraw();
                }
                if !ctx.selection.contains(id) {
                    ctx.selection.select_only(id);
                }
                if let Some(state) = self.begin_drag(ctx, cursor) {
                    self.state = state;
                }
                EventOutcome::redraw().with_cursor(CursorStyle::Move)
            }
            None => {
                if ctx.group_edit.is_some() {
                    ctx.requested_group_edit = Some(None);
                }
                self.state = SelectState::Marquee {
                    start: cursor,
                    current: cursor,
                    union: event.modifiers.shift,
                    prior: ctx.selection.ids().to_vec(),
                };
                EventOutcome::redraw()
            }
        }
    }

    fn on_mouse_move(&mut self, ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        let cursor = event.canvas;
        if matches!(self.state, SelectState::Idle) {
            let style = self.hover_cursor(ctx, cursor);
            return EventOutcome::ignored().with_cursor(style);
        }
        match &mut self.state {
            SelectState::Idle => EventOutcome::ignored(),
            SelectState::Dragging {
                start_cursor,
                originals,
                primary_abs,
                snapshotted,
            } => {
                if !*snapshotted {
                    let snapshot = ctx.store.snapshot();
                    ctx.history.push(snapshot);
                    *snapshotted = true;
                }
                let delta = cursor - *start_cursor;

                let candidate = *primary_abs + delta;
                let exclude = ctx.selection.iter().collect();
                let snapped = compute_snapped_position(
                    candidate,
                    ctx.store.map().values(),
                    &exclude,
                    ctx.snap_settings,
                    event.modifiers.ctrl,
                );
                ctx.overlay.guides = snapped.guides.clone();
                let correction = snapped.position() - candidate;

                let patches = originals
                    .iter()
                    .map(|&(id, origin)| {
                        let pos = origin + delta + correction;
                        (id, ObjectPatch::position(pos.x, pos.y))
                    })
                    .collect();
                ctx.store.apply_many(patches);
                EventOutcome::redraw().with_cursor(CursorStyle::Move)
            }
            SelectState::Resizing {
                id,
                handle,
                start_bounds,
                rotation,
                start_cursor,
                parent_offset,
                snapshotted,
            } => {
                if !*snapshotted {
                    let snapshot = ctx.store.snapshot();
                    ctx.history.push(snapshot);
                    *snapshotted = true;
                }
                // Bring the drag delta into the object's unrotated
                // frame so the handle tracks the cursor visually.
                let center = start_bounds.center();
                let local_cursor = rotate_point(cursor, center, -*rotation);
                let local_start = rotate_point(*start_cursor, center, -*rotation);
                let delta = local_cursor - local_start;

                let resized =
                    crate::geometry::resize_rect(*handle, *start_bounds, delta, event.modifiers.shift);
                let mut patch = ObjectPatch::frame(resized);
                patch.x = Some(resized.x0 - parent_offset.x);
                patch.y = Some(resized.y0 - parent_offset.y);
                ctx.store.apply_many(vec![(*id, patch)]);
                EventOutcome::redraw().with_cursor(cursor_for_handle(*handle))
            }
            SelectState::Rotating {
                id,
                center,
                start_cursor,
                start_rotation,
                snapshotted,
            } => {
                if !*snapshotted {
                    let snapshot = ctx.store.snapshot();
                    ctx.history.push(snapshot);
                    *snapshotted = true;
                }
                let rotation = rotation_from_drag(
                    *center,
                    *start_cursor,
                    cursor,
                    *start_rotation,
                    event.modifiers.shift,
                );
                let patch = ObjectPatch {
                    rotation: Some(rotation),
                    ..Default::default()
                };
                ctx.store.apply_many(vec![(*id, patch)]);
                EventOutcome::redraw().with_cursor(CursorStyle::Rotate)
            }
            SelectState::Marquee { start, current, .. } => {
                *current = cursor;
                ctx.overlay.marquee = Some(Rect::from_points(*start, *current));
                EventOutcome::redraw()
            }
        }
    }

    fn on_mouse_up(&mut self, ctx: &mut ToolCtx, _event: &MouseEvent) -> EventOutcome {
        match std::mem::replace(&mut self.state, SelectState::Idle) {
            SelectState::Idle => EventOutcome::ignored(),
            SelectState::Dragging { .. }
            | SelectState::Resizing { .. }
            | SelectState::Rotating { .. } => {
                ctx.overlay.clear();
                EventOutcome::redraw()
            }
            SelectState::Marquee {
                start,
                current,
                union,
                prior,
            } => {
                ctx.overlay.clear();
                let marquee = Rect::from_points(start, current);
                let objects = ctx.store.map();

                let mut hits: Vec<(i64, ObjectId)> = Vec::new();
                for id in ctx.spatial.query(marquee) {
                    let Some(obj) = objects.get(&id) else {
                        continue;
                    };
                    if !obj.visible {
                        continue;
                    }
                    match obj.parent_id {
                        Some(parent) if ctx.group_edit != Some(parent) => continue,
                        None if ctx.group_edit == Some(id) => continue,
                        _ => {}
                    }
                    let Some(bounds) = groups::absolute_bounds(objects, id) else {
                        continue;
                    };
                    if marquee_intersects(marquee, bounds, obj.rotation) {
                        hits.push((obj.z_index, id));
                    }
                }
                hits.sort();
                let hit_ids = hits.into_iter().map(|(_, id)| id);

                if union {
                    ctx.selection.select_all(prior.into_iter().chain(hit_ids));
                } else {
                    ctx.selection.select_all(hit_ids);
                }
                EventOutcome::redraw()
            }
        }
    }

    fn on_key_down(&mut self, ctx: &mut ToolCtx, event: &KeyEvent) -> EventOutcome {
        if matches!(event.key, Key::Named(NamedKey::Escape)) && self.rollback(ctx) {
            return EventOutcome::redraw();
        }
        EventOutcome::ignored()
    }
}
