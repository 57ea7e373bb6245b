//! Editor facade: owns the document state and routes input through the
//! tool engine, keyboard shortcuts, and inline edit sessions.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use kurbo::Rect;
use uuid::Uuid;

use crate::groups;
use crate::history::HistoryLog;
use crate::input::{Key, KeyEvent, MouseEvent, NamedKey};
use crate::object::{measure_text, ObjectId, ObjectKind, ObjectPatch, SceneObject};
use crate::selection::{align_objects, distribute_objects, Alignment, Distribution, SelectionModel};
use crate::snap::SnapSettings;
use crate::spatial::SpatialIndex;
use crate::store::{OutboundDelta, RemoteChange, ReplicatedStore};
use crate::tools::{
    EditRequest, EditTarget, EventOutcome, Overlay, ToolCtx, ToolEngine, ToolKind,
};
use crate::viewport::Viewport;

/// Blur or commit events landing within this window of an edit session
/// opening are treated as leftovers of the click that opened it and
/// ignored.
pub const EDIT_GRACE: Duration = Duration::from_millis(200);

/// Arrow-key nudge distances in document units.
const NUDGE_STEP: f64 = 1.0;
const NUDGE_STEP_LARGE: f64 = 10.0;

/// An active inline edit of a text body or frame name.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub id: ObjectId,
    pub target: EditTarget,
    started: Instant,
    /// Value at session start, restored on cancel.
    original: String,
}

enum ToolEvent<'e> {
    MouseDown(&'e MouseEvent),
    MouseMove(&'e MouseEvent),
    MouseUp(&'e MouseEvent),
    Key(&'e KeyEvent),
    SetTool(ToolKind),
}

/// The interactive document editor core.
///
/// The host shell feeds it normalized input events and remote deltas,
/// drains its outbound deltas for the replication channel, and reads
/// the object map, selection and overlay back out for rendering.
pub struct Editor {
    pub store: ReplicatedStore,
    pub selection: SelectionModel,
    pub viewport: Viewport,
    pub snap_settings: SnapSettings,
    spatial: SpatialIndex,
    history: HistoryLog,
    engine: ToolEngine,
    overlay: Overlay,
    group_edit: Option<ObjectId>,
    edit: Option<EditSession>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            store: ReplicatedStore::new(),
            selection: SelectionModel::new(),
            viewport: Viewport::new(),
            snap_settings: SnapSettings::default(),
            spatial: SpatialIndex::new(),
            history: HistoryLog::new(),
            engine: ToolEngine::new(),
            overlay: Overlay::default(),
            group_edit: None,
            edit: None,
        }
    }

    pub fn active_tool(&self) -> ToolKind {
        self.engine.active()
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Group currently open for direct child editing.
    pub fn group_edit_mode(&self) -> Option<ObjectId> {
        self.group_edit
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        self.dispatch(Instant::now(), ToolEvent::SetTool(kind));
    }

    // ---- input dispatch ----------------------------------------------

    pub fn handle_mouse_down(&mut self, event: &MouseEvent) -> EventOutcome {
        self.handle_mouse_down_at(event, Instant::now())
    }

    pub fn handle_mouse_down_at(&mut self, event: &MouseEvent, now: Instant) -> EventOutcome {
        if self.swallow_click_while_editing(event, now) {
            return EventOutcome::handled();
        }
        self.dispatch(now, ToolEvent::MouseDown(event))
    }

    pub fn handle_mouse_move(&mut self, event: &MouseEvent) -> EventOutcome {
        self.dispatch(Instant::now(), ToolEvent::MouseMove(event))
    }

    pub fn handle_mouse_up(&mut self, event: &MouseEvent) -> EventOutcome {
        self.dispatch(Instant::now(), ToolEvent::MouseUp(event))
    }

    pub fn handle_key_down(&mut self, event: &KeyEvent) -> EventOutcome {
        self.handle_key_down_at(event, Instant::now())
    }

    pub fn handle_key_down_at(&mut self, event: &KeyEvent, now: Instant) -> EventOutcome {
        if self.edit.is_some() {
            return self.handle_edit_key(event);
        }
        let outcome = self.dispatch(now, ToolEvent::Key(event));
        if outcome.handled {
            return outcome;
        }
        self.handle_shortcut(event, now)
    }

    fn dispatch(&mut self, now: Instant, event: ToolEvent) -> EventOutcome {
        let mut ctx = ToolCtx {
            store: &mut self.store,
            selection: &mut self.selection,
            spatial: &self.spatial,
            history: &mut self.history,
            viewport: &mut self.viewport,
            snap_settings: &self.snap_settings,
            overlay: &mut self.overlay,
            group_edit: self.group_edit,
            now,
            requested_tool: None,
            requested_edit: None,
            requested_group_edit: None,
        };
        let outcome = match event {
            ToolEvent::MouseDown(e) => self.engine.mouse_down(&mut ctx, e),
            ToolEvent::MouseMove(e) => self.engine.mouse_move(&mut ctx, e),
            ToolEvent::MouseUp(e) => self.engine.mouse_up(&mut ctx, e),
            ToolEvent::Key(e) => self.engine.key_down(&mut ctx, e),
            ToolEvent::SetTool(kind) => {
                self.engine.set_tool(kind, &mut ctx);
                EventOutcome::handled()
            }
        };
        let requested_tool = ctx.requested_tool;
        let requested_edit = ctx.requested_edit;
        let requested_group_edit = ctx.requested_group_edit;

        if let Some(mode) = requested_group_edit {
            self.group_edit = mode;
        }
        if let Some(kind) = requested_tool {
            self.dispatch(now, ToolEvent::SetTool(kind));
        }
        if let Some(request) = requested_edit {
            self.begin_edit(request, now);
        }
        self.sync_spatial();
        outcome
    }

    // ---- inline editing ----------------------------------------------

    fn begin_edit(&mut self, request: EditRequest, now: Instant) {
        let Some(obj) = self.store.get(&request.id) else {
            return;
        };
        let original = match (&obj.kind, request.target) {
            (ObjectKind::Text { content, .. }, EditTarget::TextContent) => content.clone(),
            (ObjectKind::Frame { name }, EditTarget::FrameName) => name.clone(),
            _ => return,
        };
        self.history.push(self.store.snapshot());
        self.edit = Some(EditSession {
            id: request.id,
            target: request.target,
            started: now,
            original,
        });
    }

    /// End the session, keeping the edited value.
    pub fn commit_edit(&mut self) {
        self.edit = None;
    }

    /// End the session, restoring the value from session start.
    pub fn cancel_edit(&mut self) {
        if let Some(session) = self.edit.take() {
            self.apply_edit_value(&session, session.original.clone());
        }
    }

    /// A blur notification from the host (focus moved elsewhere).
    /// Ignored within the grace window after the session opened.
    pub fn handle_blur(&mut self, now: Instant) {
        if let Some(session) = &self.edit {
            if now.duration_since(session.started) < EDIT_GRACE {
                return;
            }
            self.commit_edit();
        }
    }

    fn swallow_click_while_editing(&mut self, event: &MouseEvent, now: Instant) -> bool {
        let Some(session) = &self.edit else {
            return false;
        };
        let inside = groups::absolute_bounds(self.store.map(), session.id)
            .zip(self.store.get(&session.id))
            .is_some_and(|(bounds, obj)| {
                crate::geometry::point_in_object(event.canvas, bounds, obj.rotation)
            });
        if inside {
            // Clicks inside the edited object keep the session alive.
            return true;
        }
        if now.duration_since(session.started) < EDIT_GRACE {
            return true;
        }
        self.commit_edit();
        false
    }

    fn current_edit_value(&self, session: &EditSession) -> String {
        self.store
            .get(&session.id)
            .map(|obj| match (&obj.kind, session.target) {
                (ObjectKind::Text { content, .. }, EditTarget::TextContent) => content.clone(),
                (ObjectKind::Frame { name }, EditTarget::FrameName) => name.clone(),
                _ => String::new(),
            })
            .unwrap_or_default()
    }

    fn apply_edit_value(&mut self, session: &EditSession, value: String) {
        match session.target {
            EditTarget::TextContent => {
                let font_size = match self.store.get(&session.id).map(|o| &o.kind) {
                    Some(ObjectKind::Text { font_size, .. }) => *font_size,
                    _ => return,
                };
                // Bounds follow the content on every keystroke.
                let (width, height) = measure_text(&value, font_size);
                let patch = ObjectPatch {
                    content: Some(value),
                    width: Some(width),
                    height: Some(height),
                    ..Default::default()
                };
                self.store.apply(session.id, patch);
            }
            EditTarget::FrameName => {
                let patch = ObjectPatch {
                    name: Some(value),
                    ..Default::default()
                };
                self.store.apply(session.id, patch);
            }
        }
        self.sync_spatial();
    }

    fn handle_edit_key(&mut self, event: &KeyEvent) -> EventOutcome {
        let Some(session) = self.edit.clone() else {
            return EventOutcome::ignored();
        };
        match &event.key {
            Key::Named(NamedKey::Escape) => {
                self.cancel_edit();
                EventOutcome::redraw()
            }
            Key::Named(NamedKey::Enter) => match session.target {
                EditTarget::FrameName => {
                    self.commit_edit();
                    EventOutcome::redraw()
                }
                EditTarget::TextContent => {
                    let mut value = self.current_edit_value(&session);
                    value.push('\n');
                    self.apply_edit_value(&session, value);
                    EventOutcome::redraw()
                }
            },
            Key::Named(NamedKey::Backspace) => {
                let mut value = self.current_edit_value(&session);
                value.pop();
                self.apply_edit_value(&session, value);
                EventOutcome::redraw()
            }
            Key::Character(text) if !event.modifiers.command() => {
                let mut value = self.current_edit_value(&session);
                value.push_str(text);
                self.apply_edit_value(&session, value);
                EventOutcome::redraw()
            }
            // Everything else is swallowed while editing so shortcuts
            // cannot fire mid-session.
            _ => EventOutcome::handled(),
        }
    }

    // ---- keyboard shortcuts ------------------------------------------

    fn handle_shortcut(&mut self, event: &KeyEvent, now: Instant) -> EventOutcome {
        match &event.key {
            Key::Named(NamedKey::Delete) | Key::Named(NamedKey::Backspace) => {
                if self.delete_selection() {
                    EventOutcome::redraw()
                } else {
                    EventOutcome::ignored()
                }
            }
            Key::Named(NamedKey::Escape) => {
                if self.group_edit.is_some() {
                    self.group_edit = None;
                } else {
                    self.selection.clear();
                }
                EventOutcome::redraw()
            }
            Key::Named(NamedKey::ArrowLeft) => self.nudge(-1.0, 0.0, event.modifiers.shift),
            Key::Named(NamedKey::ArrowRight) => self.nudge(1.0, 0.0, event.modifiers.shift),
            Key::Named(NamedKey::ArrowUp) => self.nudge(0.0, -1.0, event.modifiers.shift),
            Key::Named(NamedKey::ArrowDown) => self.nudge(0.0, 1.0, event.modifiers.shift),
            Key::Named(NamedKey::Enter) => EventOutcome::ignored(),
            Key::Character(_) => {
                let Some(c) = event.single_char() else {
                    return EventOutcome::ignored();
                };
                if event.modifiers.command() {
                    match c {
                        'z' if event.modifiers.shift => self.as_outcome(self.redo_ready(), Editor::redo),
                        'z' => self.as_outcome(self.history.can_undo(), Editor::undo),
                        'y' => self.as_outcome(self.redo_ready(), Editor::redo),
                        'a' => {
                            self.select_all_objects();
                            EventOutcome::redraw()
                        }
                        'd' => self.as_outcome(!self.selection.is_empty(), |e| {
                            e.duplicate_selection();
                            true
                        }),
                        'g' if event.modifiers.shift => {
                            self.as_outcome(true, |e| e.ungroup_selection())
                        }
                        'g' => self.as_outcome(true, |e| e.group_selection().is_some()),
                        _ => EventOutcome::ignored(),
                    }
                } else {
                    let tool = match c {
                        'v' => Some(ToolKind::Select),
                        'h' => Some(ToolKind::Pan),
                        'r' => Some(ToolKind::Rectangle),
                        'o' => Some(ToolKind::Ellipse),
                        't' => Some(ToolKind::Text),
                        'f' => Some(ToolKind::Frame),
                        'p' => Some(ToolKind::Pen),
                        'l' => Some(ToolKind::Line),
                        'a' => Some(ToolKind::Arrow),
                        _ => None,
                    };
                    if let Some(kind) = tool {
                        self.dispatch(now, ToolEvent::SetTool(kind));
                        return EventOutcome::redraw();
                    }
                    match c {
                        ']' if event.modifiers.shift => self.z_op(Editor::bring_to_front),
                        '[' if event.modifiers.shift => self.z_op(Editor::send_to_back),
                        ']' => self.z_op(Editor::bring_forward),
                        '[' => self.z_op(Editor::send_backward),
                        _ => EventOutcome::ignored(),
                    }
                }
            }
        }
    }

    fn as_outcome(&mut self, ready: bool, op: impl FnOnce(&mut Editor) -> bool) -> EventOutcome {
        if ready && op(self) {
            EventOutcome::redraw()
        } else {
            EventOutcome::ignored()
        }
    }

    fn redo_ready(&self) -> bool {
        self.history.can_redo()
    }

    fn z_op(&mut self, op: impl FnOnce(&mut Editor, ObjectId) -> bool) -> EventOutcome {
        let Some(id) = self.selection.primary() else {
            return EventOutcome::ignored();
        };
        if op(self, id) {
            EventOutcome::redraw()
        } else {
            EventOutcome::ignored()
        }
    }

    fn nudge(&mut self, dx: f64, dy: f64, large: bool) -> EventOutcome {
        if self.selection.is_empty() {
            return EventOutcome::ignored();
        }
        let step = if large { NUDGE_STEP_LARGE } else { NUDGE_STEP };
        let patches: Vec<(ObjectId, ObjectPatch)> = self
            .selection
            .iter()
            .filter_map(|id| {
                let obj = self.store.get(&id)?;
                if obj.locked {
                    return None;
                }
                Some((id, ObjectPatch::position(obj.x + dx * step, obj.y + dy * step)))
            })
            .collect();
        if patches.is_empty() {
            return EventOutcome::ignored();
        }
        self.history.push(self.store.snapshot());
        self.store.apply_many(patches);
        self.sync_spatial();
        EventOutcome::redraw()
    }

    // ---- document operations -----------------------------------------

    pub fn undo(&mut self) -> bool {
        let current = self.store.snapshot();
        let Some(snapshot) = self.history.undo(current) else {
            return false;
        };
        self.store.replace_all(snapshot);
        self.after_map_change();
        true
    }

    pub fn redo(&mut self) -> bool {
        let current = self.store.snapshot();
        let Some(snapshot) = self.history.redo(current) else {
            return false;
        };
        self.store.replace_all(snapshot);
        self.after_map_change();
        true
    }

    /// Delete the selected objects, including any group descendants.
    pub fn delete_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.history.push(self.store.snapshot());
        let mut ids: Vec<ObjectId> = self.selection.ids().to_vec();
        let mut i = 0;
        while i < ids.len() {
            let parent = ids[i];
            for obj in self.store.objects() {
                if obj.parent_id == Some(parent) && !ids.contains(&obj.id) {
                    ids.push(obj.id);
                }
            }
            i += 1;
        }
        self.store.remove_many(&ids);
        self.selection.clear();
        self.after_map_change();
        true
    }

    /// Clone the selected top-level objects (and their subtrees) with
    /// fresh ids, offset slightly, and select the clones.
    pub fn duplicate_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.history.push(self.store.snapshot());

        let mut next_z = self.store.next_z_index();
        let mut clones: Vec<SceneObject> = Vec::new();
        let mut new_top_ids = Vec::new();
        for id in self.selection.ids().to_vec() {
            let Some(mut clone) = self.store.get(&id).cloned() else {
                continue;
            };
            clone.id = Uuid::new_v4();
            clone.x += 10.0;
            clone.y += 10.0;
            clone.z_index = next_z;
            next_z += 1;
            new_top_ids.push(clone.id);

            if let ObjectKind::Group { children } = clone.kind.clone() {
                let mut new_children = Vec::with_capacity(children.len());
                for child_id in children {
                    if let Some(mut child_clone) = self.store.get(&child_id).cloned() {
                        child_clone.id = Uuid::new_v4();
                        child_clone.parent_id = Some(clone.id);
                        new_children.push(child_clone.id);
                        clones.push(child_clone);
                    }
                }
                clone.kind = ObjectKind::Group {
                    children: new_children,
                };
            }
            clones.push(clone);
        }
        for clone in clones {
            self.store.insert(clone);
        }
        self.selection.select_all(new_top_ids);
        self.after_map_change();
    }

    /// Select every hit-testable object: top-level objects normally,
    /// or the open group's children in group-edit mode.
    pub fn select_all_objects(&mut self) {
        let ids: Vec<ObjectId> = self
            .store
            .objects_ordered()
            .into_iter()
            .filter(|o| o.visible && o.parent_id == self.group_edit)
            .map(|o| o.id)
            .collect();
        self.selection.select_all(ids);
    }

    pub fn group_selection(&mut self) -> Option<ObjectId> {
        let plan = groups::group_objects(
            self.store.map(),
            self.selection.ids(),
            self.store.next_z_index(),
        )?;
        self.history.push(self.store.snapshot());
        let group_id = plan.group.id;
        self.store.insert(plan.group);
        self.store.apply_many(plan.member_patches);
        self.selection.select_only(group_id);
        self.after_map_change();
        Some(group_id)
    }

    pub fn ungroup_selection(&mut self) -> bool {
        let plans: Vec<_> = self
            .selection
            .ids()
            .iter()
            .filter_map(|&id| groups::ungroup_objects(self.store.map(), id))
            .collect();
        if plans.is_empty() {
            return false;
        }
        self.history.push(self.store.snapshot());
        let mut members = Vec::new();
        for plan in plans {
            members.extend(plan.member_patches.iter().map(|(id, _)| *id));
            self.store.apply_many(plan.member_patches);
            self.store.remove(plan.group_id);
        }
        self.selection.select_all(members);
        self.after_map_change();
        true
    }

    pub fn align_selection(&mut self, alignment: Alignment) -> bool {
        let items = self.selection_items();
        let patches = align_objects(&items, alignment);
        self.apply_absolute_patches(patches)
    }

    pub fn distribute_selection(&mut self, axis: Distribution) -> bool {
        let items = self.selection_items();
        let patches = distribute_objects(&items, axis);
        self.apply_absolute_patches(patches)
    }

    fn selection_items(&self) -> Vec<(ObjectId, Rect)> {
        let objects = self.store.map();
        self.selection
            .iter()
            .filter_map(|id| groups::absolute_bounds(objects, id).map(|b| (id, b)))
            .collect()
    }

    /// Apply patches whose x/y are absolute, converting to stored
    /// (parent-relative) coordinates where needed.
    fn apply_absolute_patches(&mut self, patches: Vec<(ObjectId, ObjectPatch)>) -> bool {
        if patches.is_empty() {
            return false;
        }
        self.history.push(self.store.snapshot());
        let objects = self.store.map();
        let converted: Vec<(ObjectId, ObjectPatch)> = patches
            .into_iter()
            .filter_map(|(id, mut patch)| {
                let obj = objects.get(&id)?;
                let abs = groups::absolute_position(objects, id)?;
                let (off_x, off_y) = (abs.x - obj.x, abs.y - obj.y);
                if let Some(x) = patch.x {
                    patch.x = Some(x - off_x);
                }
                if let Some(y) = patch.y {
                    patch.y = Some(y - off_y);
                }
                Some((id, patch))
            })
            .collect();
        self.store.apply_many(converted);
        self.after_map_change();
        true
    }

    // ---- z-order ------------------------------------------------------

    /// Move `id` to z-index `new_z`, shifting the objects between its
    /// old and new position by one to make room. One atomic update, one
    /// history entry.
    pub fn reorder_object(&mut self, id: ObjectId, new_z: i64) -> bool {
        let Some(old_z) = self.store.get(&id).map(|o| o.z_index) else {
            return false;
        };
        if new_z == old_z {
            return false;
        }
        self.history.push(self.store.snapshot());

        let mut patches = Vec::new();
        for obj in self.store.objects() {
            if obj.id == id {
                continue;
            }
            let z = obj.z_index;
            let shifted = if new_z > old_z && z > old_z && z <= new_z {
                Some(z - 1)
            } else if new_z < old_z && z >= new_z && z < old_z {
                Some(z + 1)
            } else {
                None
            };
            if let Some(z) = shifted {
                patches.push((
                    obj.id,
                    ObjectPatch {
                        z_index: Some(z),
                        ..Default::default()
                    },
                ));
            }
        }
        patches.push((
            id,
            ObjectPatch {
                z_index: Some(new_z),
                ..Default::default()
            },
        ));
        self.store.apply_many(patches);
        true
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> bool {
        let Some(max) = self.store.objects().map(|o| o.z_index).max() else {
            return false;
        };
        self.reorder_object(id, max)
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> bool {
        let Some(min) = self.store.objects().map(|o| o.z_index).min() else {
            return false;
        };
        self.reorder_object(id, min)
    }

    pub fn bring_forward(&mut self, id: ObjectId) -> bool {
        let Some(old_z) = self.store.get(&id).map(|o| o.z_index) else {
            return false;
        };
        let Some(next) = self
            .store
            .objects()
            .map(|o| o.z_index)
            .filter(|&z| z > old_z)
            .min()
        else {
            return false;
        };
        self.reorder_object(id, next)
    }

    pub fn send_backward(&mut self, id: ObjectId) -> bool {
        let Some(old_z) = self.store.get(&id).map(|o| o.z_index) else {
            return false;
        };
        let Some(prev) = self
            .store
            .objects()
            .map(|o| o.z_index)
            .filter(|&z| z < old_z)
            .max()
        else {
            return false;
        };
        self.reorder_object(id, prev)
    }

    // ---- replication --------------------------------------------------

    /// Merge one remote delta. Bypasses the tool engine and history.
    pub fn ingest_remote(&mut self, change: RemoteChange) {
        self.store.merge_remote(change);
        self.after_map_change();
    }

    pub fn ingest_remote_batch(&mut self, changes: Vec<RemoteChange>) {
        self.store.merge_remote_batch(changes);
        self.after_map_change();
    }

    pub fn ingest_remote_delete(&mut self, id: ObjectId) {
        self.store.merge_remote_delete(id);
        self.after_map_change();
    }

    /// Flush coalesced edits whose window has elapsed. Call from the
    /// host's frame tick.
    pub fn flush_replication(&mut self, now: Instant) {
        self.store.flush_coalesced(now);
    }

    /// Drain deltas bound for the replication channel.
    pub fn take_outgoing(&mut self) -> Vec<OutboundDelta> {
        self.store.take_outgoing()
    }

    // ---- internals ----------------------------------------------------

    fn after_map_change(&mut self) {
        self.prune_selection();
        if let Some(id) = self.group_edit {
            if !self.store.contains(&id) {
                self.group_edit = None;
            }
        }
        if let Some(session) = &self.edit {
            if !self.store.contains(&session.id) {
                self.edit = None;
            }
        }
        self.sync_spatial();
    }

    fn prune_selection(&mut self) {
        let stale: Vec<ObjectId> = self
            .selection
            .iter()
            .filter(|id| !self.store.contains(id))
            .collect();
        for id in stale {
            self.selection.remove(id);
        }
    }

    fn sync_spatial(&mut self) {
        let objects = self.store.map();
        let items: Vec<(ObjectId, Rect)> = objects
            .keys()
            .filter_map(|&id| groups::absolute_rotated_bounds(objects, id).map(|b| (id, b)))
            .collect();
        self.spatial.rebuild(items);
    }

    /// Snapshot of the map, primarily for hosts saving documents.
    pub fn snapshot(&self) -> HashMap<ObjectId, SceneObject> {
        self.store.snapshot()
    }

    /// Replace the whole document, clearing interaction state.
    pub fn load(&mut self, snapshot: HashMap<ObjectId, SceneObject>) {
        self.store.replace_all(snapshot);
        self.history.clear();
        self.selection.clear();
        self.group_edit = None;
        self.edit = None;
        self.sync_spatial();
    }
}
