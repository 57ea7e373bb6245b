//! Text tool: places a text object and opens inline editing.

use crate::input::MouseEvent;
use crate::object::{measure_text, ObjectKind, SceneObject};
use crate::tools::{
    CursorStyle, EditRequest, EditTarget, EventOutcome, Tool, ToolCtx, ToolKind,
};

/// Default font size for new text objects.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

#[derive(Debug, Default)]
pub struct TextTool;

impl TextTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for TextTool {
    fn on_mouse_down(&mut self, ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        ctx.push_history();

        let (width, height) = measure_text("", DEFAULT_FONT_SIZE);
        let obj = SceneObject::new(
            ObjectKind::Text {
                content: String::new(),
                font_size: DEFAULT_FONT_SIZE,
                font_family: String::from("sans-serif"),
            },
            event.canvas.x,
            event.canvas.y,
            width,
            height,
            ctx.store.next_z_index(),
        );
        let id = obj.id;
        ctx.store.insert(obj);
        ctx.selection.select_only(id);

        // Typing starts immediately; the select tool takes over once
        // the edit session ends.
        ctx.requested_edit = Some(EditRequest {
            id,
            target: EditTarget::TextContent,
        });
        ctx.request_tool(ToolKind::Select);
        EventOutcome::redraw().with_cursor(CursorStyle::Text)
    }

    fn on_mouse_move(&mut self, _ctx: &mut ToolCtx, _event: &MouseEvent) -> EventOutcome {
        EventOutcome::ignored().with_cursor(CursorStyle::Text)
    }
}
