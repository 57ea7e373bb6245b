//! Tool system: per-tool state machines dispatched by the active tool.

mod draw;
mod pan;
mod select;
mod text;

pub use draw::{DrawTool, MIN_DRAW_SIZE};
pub use pan::PanTool;
pub use select::SelectTool;
pub use text::TextTool;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::geometry::point_in_object;
use crate::groups;
use crate::history::HistoryLog;
use crate::input::{KeyEvent, MouseEvent};
use crate::object::ObjectId;
use crate::selection::SelectionModel;
use crate::snap::{SnapGuide, SnapSettings};
use crate::spatial::SpatialIndex;
use crate::store::ReplicatedStore;
use crate::viewport::Viewport;

/// Two clicks on the same object within this window count as a
/// double-click.
pub const DOUBLE_CLICK: Duration = Duration::from_millis(300);

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Ellipse,
    Text,
    Frame,
    Pen,
    Line,
    Arrow,
}

/// Cursor the host should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Move,
    Crosshair,
    Text,
    Grab,
    Grabbing,
    ResizeHorizontal,
    ResizeVertical,
    ResizeDiagonalNwSe,
    ResizeDiagonalNeSw,
    Rotate,
}

/// What an event handler did with the event.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventOutcome {
    /// The event was consumed; the host should not process it further.
    pub handled: bool,
    /// Cursor to show, if the tool wants a specific one.
    pub cursor: Option<CursorStyle>,
    /// The host should schedule a repaint.
    pub request_redraw: bool,
}

impl EventOutcome {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn handled() -> Self {
        Self {
            handled: true,
            ..Self::default()
        }
    }

    pub fn redraw() -> Self {
        Self {
            handled: true,
            request_redraw: true,
            ..Self::default()
        }
    }

    pub fn with_cursor(mut self, cursor: CursorStyle) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// Transient per-gesture feedback the renderer draws on top of the
/// document. Tools own this state; the object map never sees it.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    /// Active marquee rectangle in document space.
    pub marquee: Option<Rect>,
    /// Active snap alignment guides.
    pub guides: Vec<SnapGuide>,
}

impl Overlay {
    pub fn clear(&mut self) {
        self.marquee = None;
        self.guides.clear();
    }
}

/// Which field an inline edit session targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    TextContent,
    FrameName,
}

/// A tool asking the editor to open an inline edit session.
#[derive(Debug, Clone, Copy)]
pub struct EditRequest {
    pub id: ObjectId,
    pub target: EditTarget,
}

/// Mutable view of the editor a tool operates on for one event.
///
/// Tools write requests (tool switch, edit session, group-edit mode)
/// into the context; the editor applies them after dispatch so a tool
/// never re-enters the engine that is borrowing it.
pub struct ToolCtx<'a> {
    pub store: &'a mut ReplicatedStore,
    pub selection: &'a mut SelectionModel,
    pub spatial: &'a SpatialIndex,
    pub history: &'a mut HistoryLog,
    pub viewport: &'a mut Viewport,
    pub snap_settings: &'a SnapSettings,
    pub overlay: &'a mut Overlay,
    /// Group currently opened for direct child editing, if any.
    pub group_edit: Option<ObjectId>,
    /// Event timestamp, for double-click detection.
    pub now: Instant,

    pub requested_tool: Option<ToolKind>,
    pub requested_edit: Option<EditRequest>,
    /// `Some(Some(id))` enters group-edit mode, `Some(None)` leaves it.
    pub requested_group_edit: Option<Option<ObjectId>>,
}

impl ToolCtx<'_> {
    /// Snapshot the current map before a mutating gesture.
    pub fn push_history(&mut self) {
        let snapshot = self.store.snapshot();
        self.history.push(snapshot);
    }

    /// Ask the editor to switch tools after this event.
    pub fn request_tool(&mut self, kind: ToolKind) {
        self.requested_tool = Some(kind);
    }

    /// The topmost visible object under `point`, rotation-aware.
    ///
    /// Group children are hit only while their parent group is open in
    /// group-edit mode; the opened group itself is suppressed so clicks
    /// land on its children.
    pub fn top_object_at(&self, point: Point) -> Option<ObjectId> {
        let objects = self.store.map();
        let mut best: Option<(i64, ObjectId)> = None;

        for id in self.spatial.query_point(point) {
            let Some(obj) = objects.get(&id) else {
                continue;
            };
            if !obj.visible {
                continue;
            }
            match obj.parent_id {
                Some(parent) if self.group_edit != Some(parent) => continue,
                None if self.group_edit == Some(id) => continue,
                _ => {}
            }
            let Some(bounds) = groups::absolute_bounds(objects, id) else {
                continue;
            };
            if !point_in_object(point, bounds, obj.rotation) {
                continue;
            }
            if best.is_none_or(|(z, _)| obj.z_index >= z) {
                best = Some((obj.z_index, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Absolute rotated bounds of the current selection, unioned.
    pub fn selection_bounds(&self) -> Option<Rect> {
        let objects = self.store.map();
        let mut union: Option<Rect> = None;
        for id in self.selection.iter() {
            if let Some(bounds) = groups::absolute_rotated_bounds(objects, id) {
                union = Some(match union {
                    Some(u) => u.union(bounds),
                    None => bounds,
                });
            }
        }
        union
    }

    /// Ids to exclude from snapping during a selection drag.
    pub fn snap_exclusions(&self) -> HashSet<ObjectId> {
        self.selection.iter().collect()
    }
}

/// Event handlers every tool implements. Handlers return whether the
/// event was consumed; unconsumed events fall through to editor-level
/// shortcuts.
pub trait Tool {
    fn on_activate(&mut self, _ctx: &mut ToolCtx) {}
    fn on_deactivate(&mut self, _ctx: &mut ToolCtx) {}

    fn on_mouse_down(&mut self, _ctx: &mut ToolCtx, _event: &MouseEvent) -> EventOutcome {
        EventOutcome::ignored()
    }
    fn on_mouse_move(&mut self, _ctx: &mut ToolCtx, _event: &MouseEvent) -> EventOutcome {
        EventOutcome::ignored()
    }
    fn on_mouse_up(&mut self, _ctx: &mut ToolCtx, _event: &MouseEvent) -> EventOutcome {
        EventOutcome::ignored()
    }
    fn on_key_down(&mut self, _ctx: &mut ToolCtx, _event: &KeyEvent) -> EventOutcome {
        EventOutcome::ignored()
    }
}

fn make_tool(kind: ToolKind) -> Box<dyn Tool> {
    match kind {
        ToolKind::Select => Box::new(SelectTool::new()),
        ToolKind::Pan => Box::new(PanTool::new()),
        ToolKind::Text => Box::new(TextTool::new()),
        ToolKind::Rectangle
        | ToolKind::Ellipse
        | ToolKind::Frame
        | ToolKind::Pen
        | ToolKind::Line
        | ToolKind::Arrow => Box::new(DrawTool::new(kind)),
    }
}

/// Owns the active tool and dispatches events to it.
pub struct ToolEngine {
    active: ToolKind,
    tool: Box<dyn Tool>,
}

impl Default for ToolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolEngine {
    pub fn new() -> Self {
        Self {
            active: ToolKind::Select,
            tool: make_tool(ToolKind::Select),
        }
    }

    pub fn active(&self) -> ToolKind {
        self.active
    }

    /// Switch tools, running deactivate/activate hooks. Switching to
    /// the already-active tool resets its state.
    pub fn set_tool(&mut self, kind: ToolKind, ctx: &mut ToolCtx) {
        self.tool.on_deactivate(ctx);
        ctx.overlay.clear();
        self.tool = make_tool(kind);
        self.active = kind;
        self.tool.on_activate(ctx);
    }

    pub fn mouse_down(&mut self, ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        self.tool.on_mouse_down(ctx, event)
    }

    pub fn mouse_move(&mut self, ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        self.tool.on_mouse_move(ctx, event)
    }

    pub fn mouse_up(&mut self, ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        self.tool.on_mouse_up(ctx, event)
    }

    pub fn key_down(&mut self, ctx: &mut ToolCtx, event: &KeyEvent) -> EventOutcome {
        self.tool.on_key_down(ctx, event)
    }
}
