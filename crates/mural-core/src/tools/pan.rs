//! Pan tool: drags the viewport instead of the document.

use kurbo::{Point, Vec2};

use crate::input::MouseEvent;
use crate::tools::{CursorStyle, EventOutcome, Tool, ToolCtx};

#[derive(Debug, Default)]
pub struct PanTool {
    /// Screen position of the last move while the button is held.
    last_screen: Option<Point>,
}

impl PanTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for PanTool {
    fn on_mouse_down(&mut self, _ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        self.last_screen = Some(event.screen);
        EventOutcome::handled().with_cursor(CursorStyle::Grabbing)
    }

    fn on_mouse_move(&mut self, ctx: &mut ToolCtx, event: &MouseEvent) -> EventOutcome {
        let Some(last) = self.last_screen else {
            return EventOutcome::ignored().with_cursor(CursorStyle::Grab);
        };
        ctx.viewport.pan(Vec2::new(
            event.screen.x - last.x,
            event.screen.y - last.y,
        ));
        self.last_screen = Some(event.screen);
        EventOutcome::redraw().with_cursor(CursorStyle::Grabbing)
    }

    fn on_mouse_up(&mut self, _ctx: &mut ToolCtx, _event: &MouseEvent) -> EventOutcome {
        self.last_screen = None;
        EventOutcome::handled().with_cursor(CursorStyle::Grab)
    }
}
