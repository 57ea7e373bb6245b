//! Scene object definitions for the document model.

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for scene objects.
pub type ObjectId = Uuid;

/// Minimum width/height of any object. Prevents degenerate geometry and
/// division by zero in scaling code.
pub const MIN_OBJECT_SIZE: f64 = 1.0;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Normalize an angle in degrees to the range [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    let mut a = angle % 360.0;
    if a < 0.0 {
        a += 360.0;
    }
    a
}

/// Variant-specific payload for a scene object.
///
/// A closed tagged union: adding a new object type is a compile-time
/// exercise, every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    Rectangle {
        #[serde(default)]
        corner_radius: f64,
    },
    Ellipse,
    Text {
        content: String,
        font_size: f64,
        #[serde(default = "default_font_family")]
        font_family: String,
    },
    Frame {
        name: String,
    },
    Path {
        /// Points relative to the object origin.
        points: Vec<Point>,
    },
    Image {
        source: String,
        natural_width: f64,
        natural_height: f64,
    },
    Video {
        source: String,
        #[serde(default)]
        playing: bool,
    },
    Group {
        /// Child object ids, back to front.
        children: Vec<ObjectId>,
    },
    Line {
        /// Endpoints relative to the object's top-left corner.
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Arrow {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

impl ObjectKind {
    /// Human-readable tag, matching the serialized `type` field.
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectKind::Rectangle { .. } => "rectangle",
            ObjectKind::Ellipse => "ellipse",
            ObjectKind::Text { .. } => "text",
            ObjectKind::Frame { .. } => "frame",
            ObjectKind::Path { .. } => "path",
            ObjectKind::Image { .. } => "image",
            ObjectKind::Video { .. } => "video",
            ObjectKind::Group { .. } => "group",
            ObjectKind::Line { .. } => "line",
            ObjectKind::Arrow { .. } => "arrow",
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ObjectKind::Group { .. })
    }
}

/// A single object in the scene graph.
///
/// `x`/`y` are the top-left corner in document space, unless `parent_id` is
/// set, in which case they are relative to the parent group's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Globally unique, immutable id.
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation around the object center, degrees in [0, 360).
    #[serde(default)]
    pub rotation: f64,
    /// Opacity in [0, 1].
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Draw order. Dense but not necessarily contiguous.
    pub z_index: i64,
    #[serde(default)]
    pub fill: Option<SerializableColor>,
    #[serde(default)]
    pub stroke: Option<SerializableColor>,
    #[serde(default)]
    pub stroke_width: Option<f64>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    /// Set only when this object is a group child. Maintained exclusively
    /// by group/ungroup plans, never by ad-hoc field edits.
    #[serde(default)]
    pub parent_id: Option<ObjectId>,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Validation failures for scene objects.
#[derive(Debug, Error, PartialEq)]
pub enum ObjectError {
    #[error("non-finite coordinate or dimension")]
    NonFinite,
    #[error("width/height below minimum size floor")]
    DegenerateSize,
    #[error("opacity {0} outside [0, 1]")]
    OpacityOutOfRange(f64),
    #[error("path requires at least 2 points")]
    PathTooShort,
}

impl SceneObject {
    /// Create a new object with a fresh id. Size is clamped to the floor
    /// and rotation normalized.
    pub fn new(kind: ObjectKind, x: f64, y: f64, width: f64, height: f64, z_index: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            width: width.max(MIN_OBJECT_SIZE),
            height: height.max(MIN_OBJECT_SIZE),
            rotation: 0.0,
            opacity: 1.0,
            z_index,
            fill: None,
            stroke: Some(SerializableColor::black()),
            stroke_width: Some(2.0),
            visible: true,
            locked: false,
            parent_id: None,
            kind,
        }
    }

    /// Bounding rectangle in the object's own coordinate frame (parent
    /// space for children, document space otherwise). Ignores rotation.
    pub fn local_bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Center of the local bounding rectangle.
    pub fn local_center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the fill as a peniko Color for the renderer.
    pub fn fill_color(&self) -> Option<Color> {
        self.fill.map(|c| c.into())
    }

    /// Get the stroke as a peniko Color for the renderer.
    pub fn stroke_color(&self) -> Option<Color> {
        self.stroke.map(|c| c.into())
    }

    /// Check the object against its variant's required-field schema and
    /// the document invariants. Remote objects failing this are dropped.
    pub fn validate(&self) -> Result<(), ObjectError> {
        let finite = self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.rotation.is_finite();
        if !finite {
            return Err(ObjectError::NonFinite);
        }
        if self.width < MIN_OBJECT_SIZE || self.height < MIN_OBJECT_SIZE {
            return Err(ObjectError::DegenerateSize);
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ObjectError::OpacityOutOfRange(self.opacity));
        }
        if let ObjectKind::Path { points } = &self.kind {
            if points.len() < 2 {
                return Err(ObjectError::PathTooShort);
            }
        }
        Ok(())
    }

    /// Regenerate the id. Used when duplicating or pasting so copies stay
    /// globally unique.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }
}

/// Estimate the rendered size of a text run without a real text stack.
///
/// Inline editing re-measures bounds on every keystroke; the renderer may
/// later refine these with true font metrics.
pub fn measure_text(content: &str, font_size: f64) -> (f64, f64) {
    let lines: Vec<&str> = if content.is_empty() {
        vec![""]
    } else {
        content.lines().collect()
    };
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let width = (longest as f64 * font_size * 0.6).max(MIN_OBJECT_SIZE);
    let height = (lines.len().max(1) as f64 * font_size * 1.2).max(MIN_OBJECT_SIZE);
    (width, height)
}

/// Deserialize helper distinguishing an absent field from an explicit null.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// A field-level patch against one scene object.
///
/// `None` means "leave unchanged". Clearable fields use a nested `Option`
/// so `Some(None)` clears while an absent field is untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub fill: Option<Option<SerializableColor>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub stroke: Option<Option<SerializableColor>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub stroke_width: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub parent_id: Option<Option<ObjectId>>,
    /// Text content (Text objects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Frame name (Frame objects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Path points (Path objects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    /// Child id list (Group objects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ObjectId>>,
    /// Playback state (Video objects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playing: Option<bool>,
    /// Endpoints (Line/Arrow objects), relative to the bounding box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
}

macro_rules! take_if_set {
    ($dst:expr, $src:expr) => {
        if $src.is_some() {
            $dst = $src;
        }
    };
}

impl ObjectPatch {
    /// Convenience patch for a move.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    /// Convenience patch for a move + resize (e.g. a resize gesture).
    pub fn frame(rect: Rect) -> Self {
        Self {
            x: Some(rect.x0),
            y: Some(rect.y0),
            width: Some(rect.width()),
            height: Some(rect.height()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge `later` into `self`, later values winning per field. Used for
    /// coalescing repeated local edits into one outbound delta.
    pub fn merge(&mut self, later: &ObjectPatch) {
        take_if_set!(self.x, later.x);
        take_if_set!(self.y, later.y);
        take_if_set!(self.width, later.width);
        take_if_set!(self.height, later.height);
        take_if_set!(self.rotation, later.rotation);
        take_if_set!(self.opacity, later.opacity);
        take_if_set!(self.z_index, later.z_index);
        take_if_set!(self.fill, later.fill);
        take_if_set!(self.stroke, later.stroke);
        take_if_set!(self.stroke_width, later.stroke_width);
        take_if_set!(self.visible, later.visible);
        take_if_set!(self.locked, later.locked);
        take_if_set!(self.parent_id, later.parent_id);
        take_if_set!(self.content, later.content.clone());
        take_if_set!(self.font_size, later.font_size);
        take_if_set!(self.name, later.name.clone());
        take_if_set!(self.points, later.points.clone());
        take_if_set!(self.children, later.children.clone());
        take_if_set!(self.playing, later.playing);
        take_if_set!(self.x1, later.x1);
        take_if_set!(self.y1, later.y1);
        take_if_set!(self.x2, later.x2);
        take_if_set!(self.y2, later.y2);
    }

    /// Names of the fields this patch sets. Drives per-field LWW clocks.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        macro_rules! note {
            ($field:ident) => {
                if self.$field.is_some() {
                    names.push(stringify!($field));
                }
            };
        }
        note!(x);
        note!(y);
        note!(width);
        note!(height);
        note!(rotation);
        note!(opacity);
        note!(z_index);
        note!(fill);
        note!(stroke);
        note!(stroke_width);
        note!(visible);
        note!(locked);
        note!(parent_id);
        note!(content);
        note!(font_size);
        note!(name);
        note!(points);
        note!(children);
        note!(playing);
        note!(x1);
        note!(y1);
        note!(x2);
        note!(y2);
        names
    }

    /// Drop the fields listed in `stale` (remote writes that lost LWW).
    pub fn strip_fields(&mut self, stale: &[&str]) {
        for field in stale {
            match *field {
                "x" => self.x = None,
                "y" => self.y = None,
                "width" => self.width = None,
                "height" => self.height = None,
                "rotation" => self.rotation = None,
                "opacity" => self.opacity = None,
                "z_index" => self.z_index = None,
                "fill" => self.fill = None,
                "stroke" => self.stroke = None,
                "stroke_width" => self.stroke_width = None,
                "visible" => self.visible = None,
                "locked" => self.locked = None,
                "parent_id" => self.parent_id = None,
                "content" => self.content = None,
                "font_size" => self.font_size = None,
                "name" => self.name = None,
                "points" => self.points = None,
                "children" => self.children = None,
                "playing" => self.playing = None,
                "x1" => self.x1 = None,
                "y1" => self.y1 = None,
                "x2" => self.x2 = None,
                "y2" => self.y2 = None,
                _ => {}
            }
        }
    }

    /// Apply this patch to an object. Sizes are clamped to the floor,
    /// rotation is normalized, opacity is clamped to [0, 1].
    ///
    /// Variant fields addressed at the wrong variant are ignored rather
    /// than failing, keeping merges total.
    pub fn apply_to(&self, obj: &mut SceneObject) {
        if let Some(x) = self.x {
            obj.x = x;
        }
        if let Some(y) = self.y {
            obj.y = y;
        }
        if let Some(w) = self.width {
            obj.width = w.max(MIN_OBJECT_SIZE);
        }
        if let Some(h) = self.height {
            obj.height = h.max(MIN_OBJECT_SIZE);
        }
        if let Some(r) = self.rotation {
            obj.rotation = normalize_degrees(r);
        }
        if let Some(o) = self.opacity {
            obj.opacity = o.clamp(0.0, 1.0);
        }
        if let Some(z) = self.z_index {
            obj.z_index = z;
        }
        if let Some(fill) = self.fill {
            obj.fill = fill;
        }
        if let Some(stroke) = self.stroke {
            obj.stroke = stroke;
        }
        if let Some(sw) = self.stroke_width {
            obj.stroke_width = sw;
        }
        if let Some(v) = self.visible {
            obj.visible = v;
        }
        if let Some(l) = self.locked {
            obj.locked = l;
        }
        if let Some(parent) = self.parent_id {
            obj.parent_id = parent;
        }
        match &mut obj.kind {
            ObjectKind::Rectangle { .. } | ObjectKind::Ellipse => {}
            ObjectKind::Text {
                content, font_size, ..
            } => {
                if let Some(c) = &self.content {
                    *content = c.clone();
                }
                if let Some(fs) = self.font_size {
                    *font_size = fs;
                }
            }
            ObjectKind::Frame { name } => {
                if let Some(n) = &self.name {
                    *name = n.clone();
                }
            }
            ObjectKind::Path { points } => {
                if let Some(p) = &self.points {
                    *points = p.clone();
                }
            }
            ObjectKind::Image { .. } => {}
            ObjectKind::Video { playing, .. } => {
                if let Some(p) = self.playing {
                    *playing = p;
                }
            }
            ObjectKind::Group { children } => {
                if let Some(c) = &self.children {
                    *children = c.clone();
                }
            }
            ObjectKind::Line { x1, y1, x2, y2 } | ObjectKind::Arrow { x1, y1, x2, y2 } => {
                if let Some(v) = self.x1 {
                    *x1 = v;
                }
                if let Some(v) = self.y1 {
                    *y1 = v;
                }
                if let Some(v) = self.x2 {
                    *x2 = v;
                }
                if let Some(v) = self.y2 {
                    *y2 = v;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_object_clamps_size() {
        let obj = SceneObject::new(ObjectKind::Ellipse, 0.0, 0.0, 0.0, -5.0, 0);
        assert!(obj.width >= MIN_OBJECT_SIZE);
        assert!(obj.height >= MIN_OBJECT_SIZE);
        assert!(obj.validate().is_ok());
    }

    #[test]
    fn test_normalize_degrees() {
        assert!((normalize_degrees(370.0) - 10.0).abs() < 1e-9);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-9);
        assert!((normalize_degrees(360.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_degenerate() {
        let mut obj = SceneObject::new(
            ObjectKind::Rectangle { corner_radius: 0.0 },
            0.0,
            0.0,
            10.0,
            10.0,
            0,
        );
        obj.width = 0.0;
        assert_eq!(obj.validate(), Err(ObjectError::DegenerateSize));

        obj.width = f64::NAN;
        assert_eq!(obj.validate(), Err(ObjectError::NonFinite));
    }

    #[test]
    fn test_validate_rejects_short_path() {
        let mut obj = SceneObject::new(
            ObjectKind::Path {
                points: vec![Point::new(0.0, 0.0)],
            },
            0.0,
            0.0,
            10.0,
            10.0,
            0,
        );
        assert_eq!(obj.validate(), Err(ObjectError::PathTooShort));
        if let ObjectKind::Path { points } = &mut obj.kind {
            points.push(Point::new(5.0, 5.0));
        }
        assert!(obj.validate().is_ok());
    }

    #[test]
    fn test_patch_apply_clamps() {
        let mut obj = SceneObject::new(
            ObjectKind::Rectangle { corner_radius: 0.0 },
            0.0,
            0.0,
            100.0,
            100.0,
            0,
        );
        let patch = ObjectPatch {
            width: Some(0.0),
            rotation: Some(450.0),
            opacity: Some(2.0),
            ..Default::default()
        };
        patch.apply_to(&mut obj);
        assert!((obj.width - MIN_OBJECT_SIZE).abs() < 1e-9);
        assert!((obj.rotation - 90.0).abs() < 1e-9);
        assert!((obj.opacity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_patch_merge_later_wins() {
        let mut first = ObjectPatch::position(1.0, 2.0);
        let second = ObjectPatch {
            x: Some(10.0),
            width: Some(50.0),
            ..Default::default()
        };
        first.merge(&second);
        assert_eq!(first.x, Some(10.0));
        assert_eq!(first.y, Some(2.0));
        assert_eq!(first.width, Some(50.0));
    }

    #[test]
    fn test_patch_field_names() {
        let patch = ObjectPatch {
            x: Some(1.0),
            fill: Some(None),
            content: Some("hi".to_string()),
            ..Default::default()
        };
        let names = patch.field_names();
        assert_eq!(names, vec!["x", "fill", "content"]);
    }

    #[test]
    fn test_patch_null_clears_fill() {
        let patch: ObjectPatch = serde_json::from_str(r#"{"fill": null}"#).unwrap();
        assert_eq!(patch.fill, Some(None));
        let absent: ObjectPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.fill, None);
    }

    #[test]
    fn test_object_json_round_trip() {
        let obj = SceneObject::new(
            ObjectKind::Text {
                content: "hello".to_string(),
                font_size: 16.0,
                font_family: "sans-serif".to_string(),
            },
            5.0,
            6.0,
            80.0,
            20.0,
            3,
        );
        let json = serde_json::to_string(&obj).unwrap();
        let back: SceneObject = serde_json::from_str(&json).unwrap();
        assert_eq!(obj, back);
    }

    #[test]
    fn test_measure_text_grows_with_content() {
        let (w1, h1) = measure_text("a", 16.0);
        let (w2, _) = measure_text("aaaa", 16.0);
        let (_, h3) = measure_text("a\nb\nc", 16.0);
        assert!(w2 > w1);
        assert!(h3 > h1);
    }
}
