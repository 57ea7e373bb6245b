//! Quadtree spatial index for hit-testing, culling and marquee queries.
//!
//! The index is derived, disposable state: it is rebuilt wholesale whenever
//! the store's object set changes and holds no truth of its own. Queries
//! return candidates by axis-aligned bounds; callers apply precise
//! rotation-aware tests afterward.

use kurbo::{Point, Rect};

use crate::object::ObjectId;

/// Maximum items per node before it subdivides.
pub const MAX_ITEMS: usize = 10;
/// Maximum subdivision depth.
pub const MAX_DEPTH: usize = 8;

/// Default world extent for an empty index. The root grows to cover
/// whatever is inserted, so this is only a starting envelope.
const DEFAULT_EXTENT: f64 = 65_536.0;

#[derive(Debug, Clone)]
struct Node {
    boundary: Rect,
    depth: usize,
    /// Items stored at this node. An item spanning more than one child
    /// quadrant stays here rather than being split or duplicated.
    items: Vec<(ObjectId, Rect)>,
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    fn new(boundary: Rect, depth: usize) -> Self {
        Self {
            boundary,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn quadrants(boundary: Rect) -> [Rect; 4] {
        let cx = (boundary.x0 + boundary.x1) / 2.0;
        let cy = (boundary.y0 + boundary.y1) / 2.0;
        [
            Rect::new(boundary.x0, boundary.y0, cx, cy),
            Rect::new(cx, boundary.y0, boundary.x1, cy),
            Rect::new(boundary.x0, cy, cx, boundary.y1),
            Rect::new(cx, cy, boundary.x1, boundary.y1),
        ]
    }

    fn subdivide(&mut self) {
        let quads = Self::quadrants(self.boundary);
        self.children = Some(Box::new([
            Node::new(quads[0], self.depth + 1),
            Node::new(quads[1], self.depth + 1),
            Node::new(quads[2], self.depth + 1),
            Node::new(quads[3], self.depth + 1),
        ]));
        // Push down every item that now fits entirely in one child.
        let items = std::mem::take(&mut self.items);
        for (id, bounds) in items {
            self.insert(id, bounds);
        }
    }

    /// Child index that fully contains `bounds`, if any.
    fn child_for(&self, bounds: Rect) -> Option<usize> {
        let children = self.children.as_ref()?;
        children
            .iter()
            .position(|c| contains_rect(c.boundary, bounds))
    }

    fn insert(&mut self, id: ObjectId, bounds: Rect) {
        if let Some(idx) = self.child_for(bounds) {
            if let Some(children) = self.children.as_mut() {
                children[idx].insert(id, bounds);
                return;
            }
        }
        self.items.push((id, bounds));
        if self.children.is_none() && self.items.len() > MAX_ITEMS && self.depth < MAX_DEPTH {
            self.subdivide();
        }
    }

    fn remove(&mut self, id: ObjectId) -> bool {
        if let Some(pos) = self.items.iter().position(|(item_id, _)| *item_id == id) {
            self.items.remove(pos);
            return true;
        }
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if child.remove(id) {
                    return true;
                }
            }
        }
        false
    }

    /// Collect items intersecting `area`. Items live on interior nodes
    /// too, so every node on the path contributes, not just leaves.
    fn query(&self, area: Rect, out: &mut Vec<ObjectId>) {
        if !rects_intersect(self.boundary, area) {
            return;
        }
        for (id, bounds) in &self.items {
            if rects_intersect(*bounds, area) {
                out.push(*id);
            }
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.query(area, out);
            }
        }
    }

    fn query_point(&self, point: Point, out: &mut Vec<ObjectId>) {
        if !rect_contains_point(self.boundary, point) {
            return;
        }
        for (id, bounds) in &self.items {
            if rect_contains_point(*bounds, point) {
                out.push(*id);
            }
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.query_point(point, out);
            }
        }
    }

    fn collect(&self, out: &mut Vec<(ObjectId, Rect)>) {
        out.extend(self.items.iter().copied());
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.collect(out);
            }
        }
    }
}

/// Closed-interval intersection, matching the brute-force definition used
/// for marquee membership: touching edges count as overlapping.
fn rects_intersect(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

fn contains_rect(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.x1 <= outer.x1 && inner.y0 >= outer.y0 && inner.y1 <= outer.y1
}

fn rect_contains_point(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Quadtree over axis-aligned bounding boxes.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    root: Node,
    len: usize,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        let extent = Rect::new(-DEFAULT_EXTENT, -DEFAULT_EXTENT, DEFAULT_EXTENT, DEFAULT_EXTENT);
        Self {
            root: Node::new(extent, 0),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert an item. If its bounds fall outside the root envelope the
    /// root is re-anchored by a full rebuild over the grown extent.
    pub fn insert(&mut self, id: ObjectId, bounds: Rect) {
        if !contains_rect(self.root.boundary, bounds) {
            self.grow_to(bounds);
        }
        self.root.insert(id, bounds);
        self.len += 1;
    }

    fn grow_to(&mut self, bounds: Rect) {
        let mut items = Vec::with_capacity(self.len);
        self.root.collect(&mut items);
        let union = self.root.boundary.union(bounds);
        // Double the envelope past the union so repeated growth is rare.
        let grown = Rect::new(
            union.x0 - union.width(),
            union.y0 - union.height(),
            union.x1 + union.width(),
            union.y1 + union.height(),
        );
        self.root = Node::new(grown, 0);
        for (id, item_bounds) in items {
            self.root.insert(id, item_bounds);
        }
    }

    /// Remove an item by id. Returns false if the id was not present.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        if self.root.remove(id) {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    /// Remove-then-reinsert; there is no in-place move.
    pub fn update(&mut self, id: ObjectId, bounds: Rect) {
        self.remove(id);
        self.insert(id, bounds);
    }

    /// Ids whose bounds intersect the query rectangle.
    pub fn query(&self, area: Rect) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.root.query(area, &mut out);
        out
    }

    /// Ids whose bounds contain the point.
    pub fn query_point(&self, point: Point) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.root.query_point(point, &mut out);
        out
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Every indexed item with its bounds.
    pub fn get_all(&self) -> Vec<(ObjectId, Rect)> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect(&mut out);
        out
    }

    /// Throw the index away and rebuild it from the current object set.
    pub fn rebuild(&mut self, items: impl IntoIterator<Item = (ObjectId, Rect)>) {
        self.clear();
        for (id, bounds) in items {
            self.insert(id, bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id() -> ObjectId {
        ObjectId::new_v4()
    }

    #[test]
    fn test_insert_and_query() {
        let mut index = SpatialIndex::new();
        let a = id();
        let b = id();
        index.insert(a, Rect::new(0.0, 0.0, 50.0, 50.0));
        index.insert(b, Rect::new(300.0, 300.0, 350.0, 350.0));

        let hits = index.query(Rect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(hits, vec![a]);
    }

    #[test]
    fn test_query_point() {
        let mut index = SpatialIndex::new();
        let a = id();
        index.insert(a, Rect::new(10.0, 10.0, 60.0, 60.0));
        assert_eq!(index.query_point(Point::new(30.0, 30.0)), vec![a]);
        assert!(index.query_point(Point::new(100.0, 100.0)).is_empty());
    }

    #[test]
    fn test_remove() {
        let mut index = SpatialIndex::new();
        let a = id();
        index.insert(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(index.remove(a));
        assert!(!index.remove(a));
        assert!(index.query(Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
    }

    #[test]
    fn test_update_moves_item() {
        let mut index = SpatialIndex::new();
        let a = id();
        index.insert(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        index.update(a, Rect::new(500.0, 500.0, 510.0, 510.0));
        assert!(index.query(Rect::new(0.0, 0.0, 20.0, 20.0)).is_empty());
        assert_eq!(index.query(Rect::new(490.0, 490.0, 520.0, 520.0)), vec![a]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_subdivision_keeps_straddlers_queryable() {
        let mut index = SpatialIndex::new();
        // A big item straddling the center stays in an interior node.
        let straddler = id();
        index.insert(straddler, Rect::new(-100.0, -100.0, 100.0, 100.0));
        // Enough small items in one corner to force subdivision.
        let mut ids = Vec::new();
        for i in 0..(MAX_ITEMS * 2) {
            let o = id();
            let offset = i as f64 * 5.0;
            index.insert(o, Rect::new(offset + 1000.0, 1000.0, offset + 1004.0, 1004.0));
            ids.push(o);
        }
        let hits = index.query(Rect::new(-10.0, -10.0, 10.0, 10.0));
        assert_eq!(hits, vec![straddler]);
        let corner = index.query(Rect::new(990.0, 990.0, 1200.0, 1010.0));
        assert_eq!(corner.len(), ids.len());
    }

    #[test]
    fn test_grows_past_default_extent() {
        let mut index = SpatialIndex::new();
        let far = id();
        index.insert(far, Rect::new(1e6, 1e6, 1e6 + 10.0, 1e6 + 10.0));
        assert_eq!(index.query(Rect::new(1e6 - 5.0, 1e6 - 5.0, 1e6 + 20.0, 1e6 + 20.0)), vec![far]);
    }

    #[test]
    fn test_rebuild_is_wholesale() {
        let mut index = SpatialIndex::new();
        let a = id();
        let b = id();
        index.insert(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        index.rebuild(vec![(b, Rect::new(50.0, 50.0, 60.0, 60.0))]);
        assert_eq!(index.len(), 1);
        assert!(index.query(Rect::new(0.0, 0.0, 20.0, 20.0)).is_empty());
        assert_eq!(index.query(Rect::new(40.0, 40.0, 70.0, 70.0)), vec![b]);
    }

    proptest! {
        /// Quadtree queries agree with a brute-force O(N) scan for any
        /// item set and query rectangle.
        #[test]
        fn prop_query_matches_brute_force(
            items in prop::collection::vec(
                (-1000.0f64..1000.0, -1000.0f64..1000.0, 1.0f64..300.0, 1.0f64..300.0),
                0..60,
            ),
            query in (-1200.0f64..1200.0, -1200.0f64..1200.0, 1.0f64..600.0, 1.0f64..600.0),
        ) {
            let mut index = SpatialIndex::new();
            let mut all = Vec::new();
            for (x, y, w, h) in items {
                let rect = Rect::new(x, y, x + w, y + h);
                let item_id = ObjectId::new_v4();
                index.insert(item_id, rect);
                all.push((item_id, rect));
            }
            let (qx, qy, qw, qh) = query;
            let area = Rect::new(qx, qy, qx + qw, qy + qh);

            let mut got = index.query(area);
            got.sort();
            let mut expected: Vec<ObjectId> = all
                .iter()
                .filter(|(_, r)| rects_intersect(*r, area))
                .map(|(item_id, _)| *item_id)
                .collect();
            expected.sort();
            prop_assert_eq!(got, expected);
        }
    }
}
