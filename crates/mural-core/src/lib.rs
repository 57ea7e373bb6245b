//! Mural Core Library
//!
//! Platform-agnostic document model and interaction logic for the Mural
//! multi-user canvas editor: the replicated object store, spatial index,
//! tool state machines, snapping, history and group resolution.

pub mod editor;
pub mod geometry;
pub mod groups;
pub mod history;
pub mod input;
pub mod object;
pub mod selection;
pub mod snap;
pub mod spatial;
pub mod store;
pub mod tools;
pub mod viewport;

pub use editor::{EditSession, Editor, EDIT_GRACE};
pub use geometry::{Corner, Edge, Handle, HandleKind, HANDLE_SIZE};
pub use history::{HistoryLog, Snapshot, MAX_UNDO_HISTORY};
pub use input::{Key, KeyEvent, Modifiers, MouseButton, MouseEvent, NamedKey};
pub use object::{ObjectId, ObjectKind, ObjectPatch, SceneObject, SerializableColor};
pub use selection::{Alignment, Distribution, SelectionModel};
pub use snap::{SnapGuide, SnapResult, SnapSettings, compute_snapped_position, GRID_SIZE, SNAP_THRESHOLD};
pub use spatial::SpatialIndex;
pub use store::{ChangeEvent, OutboundDelta, RemoteChange, ReplicatedStore, COALESCE_WINDOW};
pub use tools::{CursorStyle, EventOutcome, Overlay, Tool, ToolCtx, ToolEngine, ToolKind};
pub use viewport::Viewport;
