//! Selection state and multi-object alignment/distribution.

use kurbo::Rect;

use crate::object::{ObjectId, ObjectPatch};

/// The set of currently selected objects.
///
/// Insertion order is preserved; the first selected object acts as the
/// primary for operations that need one.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    ids: Vec<ObjectId>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single object.
    pub fn select_only(&mut self, id: ObjectId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Replace the selection with the given objects, dropping duplicates.
    pub fn select_all(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Add an object without clearing the rest of the selection.
    pub fn insert(&mut self, id: ObjectId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Toggle an object's membership (shift-click behavior).
    pub fn toggle(&mut self, id: ObjectId) {
        if let Some(pos) = self.ids.iter().position(|&i| i == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: ObjectId) {
        self.ids.retain(|&i| i != id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The first selected object, if any.
    pub fn primary(&self) -> Option<ObjectId> {
        self.ids.first().copied()
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.ids.iter().copied()
    }
}

/// Alignment target for a multi-selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Top,
    Bottom,
    CenterHorizontal,
    CenterVertical,
}

/// Distribution axis for a multi-selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Horizontal,
    Vertical,
}

/// Compute position patches aligning `items` to a shared edge or center.
///
/// `items` pairs each object with its absolute bounds. Alignment needs
/// at least two objects; with fewer this returns no patches. Patches
/// carry absolute top-left positions.
pub fn align_objects(items: &[(ObjectId, Rect)], alignment: Alignment) -> Vec<(ObjectId, ObjectPatch)> {
    if items.len() < 2 {
        return Vec::new();
    }

    let mut patches = Vec::with_capacity(items.len());
    match alignment {
        Alignment::Left => {
            let target = items.iter().map(|(_, r)| r.x0).fold(f64::INFINITY, f64::min);
            for &(id, rect) in items {
                patches.push((id, ObjectPatch::position(target, rect.y0)));
            }
        }
        Alignment::Right => {
            let target = items.iter().map(|(_, r)| r.x1).fold(f64::NEG_INFINITY, f64::max);
            for &(id, rect) in items {
                patches.push((id, ObjectPatch::position(target - rect.width(), rect.y0)));
            }
        }
        Alignment::Top => {
            let target = items.iter().map(|(_, r)| r.y0).fold(f64::INFINITY, f64::min);
            for &(id, rect) in items {
                patches.push((id, ObjectPatch::position(rect.x0, target)));
            }
        }
        Alignment::Bottom => {
            let target = items.iter().map(|(_, r)| r.y1).fold(f64::NEG_INFINITY, f64::max);
            for &(id, rect) in items {
                patches.push((id, ObjectPatch::position(rect.x0, target - rect.height())));
            }
        }
        Alignment::CenterHorizontal => {
            let min = items.iter().map(|(_, r)| r.x0).fold(f64::INFINITY, f64::min);
            let max = items.iter().map(|(_, r)| r.x1).fold(f64::NEG_INFINITY, f64::max);
            let center = (min + max) / 2.0;
            for &(id, rect) in items {
                patches.push((id, ObjectPatch::position(center - rect.width() / 2.0, rect.y0)));
            }
        }
        Alignment::CenterVertical => {
            let min = items.iter().map(|(_, r)| r.y0).fold(f64::INFINITY, f64::min);
            let max = items.iter().map(|(_, r)| r.y1).fold(f64::NEG_INFINITY, f64::max);
            let center = (min + max) / 2.0;
            for &(id, rect) in items {
                patches.push((id, ObjectPatch::position(rect.x0, center - rect.height() / 2.0)));
            }
        }
    }
    patches
}

/// Compute position patches spacing `items` evenly along one axis.
///
/// Objects are sorted by their centers; the outermost two stay in place
/// and the gaps between neighbors are equalized. Needs at least three
/// objects, otherwise no patches are produced.
pub fn distribute_objects(
    items: &[(ObjectId, Rect)],
    axis: Distribution,
) -> Vec<(ObjectId, ObjectPatch)> {
    if items.len() < 3 {
        return Vec::new();
    }

    let mut sorted: Vec<(ObjectId, Rect)> = items.to_vec();
    match axis {
        Distribution::Horizontal => {
            sorted.sort_by(|a, b| a.1.center().x.total_cmp(&b.1.center().x));
            let span_start = sorted[0].1.x0;
            let span_end = sorted[sorted.len() - 1].1.x1;
            let total_width: f64 = sorted.iter().map(|(_, r)| r.width()).sum();
            let gap = (span_end - span_start - total_width) / (sorted.len() - 1) as f64;

            let mut patches = Vec::with_capacity(sorted.len());
            let mut cursor = span_start;
            for &(id, rect) in &sorted {
                patches.push((id, ObjectPatch::position(cursor, rect.y0)));
                cursor += rect.width() + gap;
            }
            patches
        }
        Distribution::Vertical => {
            sorted.sort_by(|a, b| a.1.center().y.total_cmp(&b.1.center().y));
            let span_start = sorted[0].1.y0;
            let span_end = sorted[sorted.len() - 1].1.y1;
            let total_height: f64 = sorted.iter().map(|(_, r)| r.height()).sum();
            let gap = (span_end - span_start - total_height) / (sorted.len() - 1) as f64;

            let mut patches = Vec::with_capacity(sorted.len());
            let mut cursor = span_start;
            for &(id, rect) in &sorted {
                patches.push((id, ObjectPatch::position(rect.x0, cursor)));
                cursor += rect.height() + gap;
            }
            patches
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn item(x: f64, y: f64, w: f64, h: f64) -> (ObjectId, Rect) {
        (Uuid::new_v4(), Rect::new(x, y, x + w, y + h))
    }

    fn patch_x(patches: &[(ObjectId, ObjectPatch)], id: ObjectId) -> f64 {
        patches
            .iter()
            .find(|(i, _)| *i == id)
            .and_then(|(_, p)| p.x)
            .unwrap()
    }

    fn patch_y(patches: &[(ObjectId, ObjectPatch)], id: ObjectId) -> f64 {
        patches
            .iter()
            .find(|(i, _)| *i == id)
            .and_then(|(_, p)| p.y)
            .unwrap()
    }

    #[test]
    fn test_selection_toggle_and_primary() {
        let mut sel = SelectionModel::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        sel.select_only(a);
        sel.toggle(b);
        assert_eq!(sel.len(), 2);
        assert_eq!(sel.primary(), Some(a));

        sel.toggle(a);
        assert_eq!(sel.primary(), Some(b));
        assert!(!sel.contains(a));

        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn test_select_all_dedupes() {
        let mut sel = SelectionModel::new();
        let a = Uuid::new_v4();
        sel.select_all([a, a, Uuid::new_v4()]);
        assert_eq!(sel.len(), 2);
    }

    #[test]
    fn test_align_left() {
        let a = item(10.0, 0.0, 50.0, 50.0);
        let b = item(100.0, 200.0, 30.0, 30.0);
        let patches = align_objects(&[a, b], Alignment::Left);
        assert_eq!(patch_x(&patches, a.0), 10.0);
        assert_eq!(patch_x(&patches, b.0), 10.0);
        // Y positions untouched.
        assert_eq!(patch_y(&patches, b.0), 200.0);
    }

    #[test]
    fn test_align_right_and_bottom() {
        let a = item(0.0, 0.0, 50.0, 50.0);
        let b = item(100.0, 100.0, 30.0, 30.0);
        let patches = align_objects(&[a, b], Alignment::Right);
        assert_eq!(patch_x(&patches, a.0), 80.0);
        assert_eq!(patch_x(&patches, b.0), 100.0);

        let patches = align_objects(&[a, b], Alignment::Bottom);
        assert_eq!(patch_y(&patches, a.0), 80.0);
        assert_eq!(patch_y(&patches, b.0), 100.0);
    }

    #[test]
    fn test_align_center_horizontal() {
        let a = item(0.0, 0.0, 100.0, 10.0);
        let b = item(80.0, 50.0, 20.0, 10.0);
        // Combined span 0..100, center 50.
        let patches = align_objects(&[a, b], Alignment::CenterHorizontal);
        assert_eq!(patch_x(&patches, a.0), 0.0);
        assert_eq!(patch_x(&patches, b.0), 40.0);
    }

    #[test]
    fn test_align_single_object_is_noop() {
        let a = item(10.0, 10.0, 50.0, 50.0);
        assert!(align_objects(&[a], Alignment::Left).is_empty());
        assert!(align_objects(&[], Alignment::Left).is_empty());
    }

    #[test]
    fn test_distribute_horizontal_equal_gaps() {
        let a = item(0.0, 0.0, 20.0, 20.0);
        let b = item(30.0, 0.0, 20.0, 20.0);
        let c = item(100.0, 0.0, 20.0, 20.0);
        let patches = distribute_objects(&[c, a, b], Distribution::Horizontal);

        // Span 0..120, total width 60, gaps = (120 - 60) / 2 = 30.
        assert_eq!(patch_x(&patches, a.0), 0.0);
        assert_eq!(patch_x(&patches, b.0), 50.0);
        assert_eq!(patch_x(&patches, c.0), 100.0);
    }

    #[test]
    fn test_distribute_vertical_keeps_extremes() {
        let a = item(0.0, 0.0, 10.0, 10.0);
        let b = item(0.0, 12.0, 10.0, 10.0);
        let c = item(0.0, 90.0, 10.0, 10.0);
        let patches = distribute_objects(&[a, b, c], Distribution::Vertical);
        assert_eq!(patch_y(&patches, a.0), 0.0);
        assert_eq!(patch_y(&patches, c.0), 90.0);
        assert_eq!(patch_y(&patches, b.0), 45.0);
    }

    #[test]
    fn test_distribute_needs_three() {
        let a = item(0.0, 0.0, 10.0, 10.0);
        let b = item(50.0, 0.0, 10.0, 10.0);
        assert!(distribute_objects(&[a, b], Distribution::Horizontal).is_empty());
    }
}
