//! Snap functionality for aligning dragged positions to the grid and to
//! other objects' edges and centers.

use std::collections::HashSet;

use kurbo::Point;

use crate::object::{ObjectId, SceneObject};

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Distance threshold for snapping, in document units.
pub const SNAP_THRESHOLD: f64 = 8.0;

/// Snap configuration for drag gestures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSettings {
    /// Snap to grid intersections.
    pub snap_to_grid: bool,
    /// Snap to other objects' edges and centers.
    pub snap_to_objects: bool,
    /// Grid cell size.
    pub grid_size: f64,
    /// Snap activation distance.
    pub threshold: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            snap_to_grid: false,
            snap_to_objects: true,
            grid_size: GRID_SIZE,
            threshold: SNAP_THRESHOLD,
        }
    }
}

impl SnapSettings {
    /// Check if any snapping is enabled.
    pub fn is_enabled(&self) -> bool {
        self.snap_to_grid || self.snap_to_objects
    }
}

/// Orientation of an alignment guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideOrientation {
    /// A vertical line at a fixed x.
    Vertical,
    /// A horizontal line at a fixed y.
    Horizontal,
}

/// An alignment guide to render while an object snap is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGuide {
    pub orientation: GuideOrientation,
    /// Coordinate of the guide line on its axis.
    pub position: f64,
    /// The object whose edge or center produced the guide.
    pub source_id: ObjectId,
}

/// Result of snapping a position.
#[derive(Debug, Clone, Default)]
pub struct SnapResult {
    pub x: f64,
    pub y: f64,
    /// Whether each axis was adjusted.
    pub snapped_x: bool,
    pub snapped_y: bool,
    /// Guides to render for active object snaps. Grid snaps emit none.
    pub guides: Vec<SnapGuide>,
}

impl SnapResult {
    fn none(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
            ..Self::default()
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }

    /// The snapped position as a point.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

fn snap_candidate(obj: &SceneObject, exclude: &HashSet<ObjectId>) -> bool {
    if exclude.contains(&obj.id) || !obj.visible || obj.parent_id.is_some() {
        return false;
    }
    // Degenerate or corrupt geometry never snaps.
    obj.x.is_finite()
        && obj.y.is_finite()
        && obj.width.is_finite()
        && obj.height.is_finite()
        && obj.width > 0.0
        && obj.height > 0.0
}

/// Snap a dragged position against other objects and the grid.
///
/// Object snapping compares the point against every candidate's
/// left/center/right on the x axis and top/middle/bottom on the y axis.
/// Candidates are checked in priority order (left before center before
/// right); the first within the threshold wins its axis and emits a
/// guide. Grid snapping rounds an axis to the nearest grid multiple,
/// regardless of distance, and applies only when no object snapped that
/// axis.
///
/// `skip` bypasses snapping entirely (held modifier during a drag).
/// Hidden objects, group children, objects in `exclude`, and objects
/// with non-finite or non-positive dimensions are never snap targets.
pub fn compute_snapped_position<'a>(
    point: Point,
    objects: impl Iterator<Item = &'a SceneObject> + Clone,
    exclude: &HashSet<ObjectId>,
    settings: &SnapSettings,
    skip: bool,
) -> SnapResult {
    if skip || !settings.is_enabled() {
        return SnapResult::none(point);
    }

    let mut result = SnapResult::none(point);

    if settings.snap_to_objects {
        // x axis: left, then center, then right.
        'x: for feature in 0..3 {
            for obj in objects.clone() {
                if !snap_candidate(obj, exclude) {
                    continue;
                }
                let target = match feature {
                    0 => obj.x,
                    1 => obj.x + obj.width / 2.0,
                    _ => obj.x + obj.width,
                };
                if (target - point.x).abs() <= settings.threshold {
                    result.x = target;
                    result.snapped_x = true;
                    result.guides.push(SnapGuide {
                        orientation: GuideOrientation::Vertical,
                        position: target,
                        source_id: obj.id,
                    });
                    break 'x;
                }
            }
        }
        // y axis: top, then middle, then bottom.
        'y: for feature in 0..3 {
            for obj in objects.clone() {
                if !snap_candidate(obj, exclude) {
                    continue;
                }
                let target = match feature {
                    0 => obj.y,
                    1 => obj.y + obj.height / 2.0,
                    _ => obj.y + obj.height,
                };
                if (target - point.y).abs() <= settings.threshold {
                    result.y = target;
                    result.snapped_y = true;
                    result.guides.push(SnapGuide {
                        orientation: GuideOrientation::Horizontal,
                        position: target,
                        source_id: obj.id,
                    });
                    break 'y;
                }
            }
        }
    }

    // The grid rounds unconditionally; the threshold only gates object
    // features.
    if settings.snap_to_grid {
        if !result.snapped_x {
            result.x = (point.x / settings.grid_size).round() * settings.grid_size;
            result.snapped_x = true;
        }
        if !result.snapped_y {
            result.y = (point.y / settings.grid_size).round() * settings.grid_size;
            result.snapped_y = true;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectKind, SceneObject};

    fn rect_object(x: f64, y: f64, w: f64, h: f64) -> SceneObject {
        SceneObject::new(ObjectKind::Rectangle { corner_radius: 0.0 }, x, y, w, h, 0)
    }

    fn object_settings() -> SnapSettings {
        SnapSettings {
            snap_to_grid: false,
            snap_to_objects: true,
            ..SnapSettings::default()
        }
    }

    fn snap_one(point: Point, objects: &[SceneObject], settings: &SnapSettings) -> SnapResult {
        compute_snapped_position(point, objects.iter(), &HashSet::new(), settings, false)
    }

    #[test]
    fn test_snaps_to_left_edge_within_threshold() {
        let target = rect_object(100.0, 300.0, 50.0, 50.0);
        let result = snap_one(Point::new(103.0, 50.0), &[target.clone()], &object_settings());
        assert!(result.snapped_x);
        assert!((result.x - 100.0).abs() < 1e-9);
        assert_eq!(result.guides.len(), 1);
        let guide = result.guides[0];
        assert_eq!(guide.orientation, GuideOrientation::Vertical);
        assert!((guide.position - 100.0).abs() < 1e-9);
        assert_eq!(guide.source_id, target.id);
    }

    #[test]
    fn test_no_snap_outside_threshold() {
        let target = rect_object(100.0, 300.0, 50.0, 50.0);
        let result = snap_one(Point::new(200.0, 50.0), &[target], &object_settings());
        assert!(!result.snapped_x);
        assert!((result.x - 200.0).abs() < 1e-9);
        assert!(result.guides.iter().all(|g| g.orientation != GuideOrientation::Vertical));
    }

    #[test]
    fn test_left_beats_center() {
        // 103 is within threshold of both the left edge (100) and the
        // center (105); left wins by priority.
        let target = rect_object(100.0, 300.0, 10.0, 10.0);
        let result = snap_one(Point::new(103.0, 1000.0), &[target], &object_settings());
        assert!((result.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_features() {
        let target = rect_object(300.0, 100.0, 50.0, 50.0);
        // Near the middle (125).
        let result = snap_one(Point::new(1000.0, 128.0), &[target], &object_settings());
        assert!(result.snapped_y);
        assert!((result.y - 125.0).abs() < 1e-9);
        assert_eq!(result.guides[0].orientation, GuideOrientation::Horizontal);
    }

    #[test]
    fn test_excluded_invisible_and_child_skipped() {
        let mut hidden = rect_object(100.0, 0.0, 50.0, 50.0);
        hidden.visible = false;
        let mut child = rect_object(100.0, 0.0, 50.0, 50.0);
        child.parent_id = Some(uuid::Uuid::new_v4());
        let excluded = rect_object(100.0, 0.0, 50.0, 50.0);
        let mut exclude = HashSet::new();
        exclude.insert(excluded.id);

        let objects = [hidden, child, excluded];
        let result = compute_snapped_position(
            Point::new(103.0, 0.0),
            objects.iter(),
            &exclude,
            &object_settings(),
            false,
        );
        assert!(!result.snapped_x);
    }

    #[test]
    fn test_degenerate_target_skipped() {
        let mut flat = rect_object(100.0, 0.0, 50.0, 50.0);
        flat.width = 0.0;
        let mut nan = rect_object(100.0, 0.0, 50.0, 50.0);
        nan.x = f64::NAN;
        let result = snap_one(Point::new(103.0, 1000.0), &[flat, nan], &object_settings());
        assert!(!result.is_snapped());
    }

    #[test]
    fn test_grid_snap_when_no_object_snap() {
        let settings = SnapSettings {
            snap_to_grid: true,
            snap_to_objects: true,
            ..SnapSettings::default()
        };
        let result = snap_one(Point::new(43.0, 77.0), &[], &settings);
        assert!(result.snapped_x && result.snapped_y);
        assert!((result.x - 40.0).abs() < 1e-9);
        assert!((result.y - 80.0).abs() < 1e-9);
        // Grid snaps render no guides.
        assert!(result.guides.is_empty());
    }

    #[test]
    fn test_grid_snap_ignores_threshold() {
        let settings = SnapSettings {
            snap_to_grid: true,
            snap_to_objects: true,
            ..SnapSettings::default()
        };
        // Both coordinates sit farther from a grid line than the object
        // snap threshold; the grid still rounds them.
        let result = snap_one(Point::new(51.0, 29.0), &[], &settings);
        assert!(result.snapped_x && result.snapped_y);
        assert!((result.x - 60.0).abs() < 1e-9);
        assert!((result.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_object_snap_beats_grid() {
        let settings = SnapSettings {
            snap_to_grid: true,
            snap_to_objects: true,
            ..SnapSettings::default()
        };
        let target = rect_object(97.0, 300.0, 50.0, 50.0);
        let result = snap_one(Point::new(99.0, 1000.0), &[target], &settings);
        // Object edge at 97 wins over the grid line at 100.
        assert!((result.x - 97.0).abs() < 1e-9);
    }

    #[test]
    fn test_skip_bypasses_everything() {
        let target = rect_object(100.0, 0.0, 50.0, 50.0);
        let result = compute_snapped_position(
            Point::new(103.0, 2.0),
            [&target].into_iter(),
            &HashSet::new(),
            &object_settings(),
            true,
        );
        assert!(!result.is_snapped());
        assert!((result.x - 103.0).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_snapping() {
        let settings = SnapSettings {
            snap_to_grid: false,
            snap_to_objects: false,
            ..SnapSettings::default()
        };
        let target = rect_object(100.0, 0.0, 50.0, 50.0);
        let result = snap_one(Point::new(103.0, 2.0), &[target], &settings);
        assert!(!result.is_snapped());
    }

    #[test]
    fn test_both_axes_from_different_objects() {
        let a = rect_object(100.0, 500.0, 50.0, 50.0);
        let b = rect_object(500.0, 200.0, 50.0, 50.0);
        let result = snap_one(Point::new(103.0, 198.0), &[a, b], &object_settings());
        assert!(result.snapped_x && result.snapped_y);
        assert!((result.x - 100.0).abs() < 1e-9);
        assert!((result.y - 200.0).abs() < 1e-9);
        assert_eq!(result.guides.len(), 2);
    }
}
