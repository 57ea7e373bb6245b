//! Group containment: absolute-position resolution and group/ungroup
//! planning.
//!
//! Children store positions relative to their parent group, so hit
//! testing, snapping and rendering resolve absolute coordinates by
//! walking the parent chain. Mutations are expressed as plans (an
//! object to insert or remove plus a patch list) that the editor
//! applies through the store in one step.

use std::collections::{HashMap, HashSet};

use kurbo::{Point, Rect};

use crate::geometry::rotated_aabb;
use crate::object::{ObjectId, ObjectKind, ObjectPatch, SceneObject};

/// Absolute top-left position of an object, resolving the parent chain.
///
/// Returns `None` for unknown ids. A dangling parent reference stops
/// the walk at the last resolvable ancestor. A parent cycle would walk
/// forever, so the visited set stops the ascent where the cycle closes
/// and logs the corrupt chain.
pub fn absolute_position(objects: &HashMap<ObjectId, SceneObject>, id: ObjectId) -> Option<Point> {
    let mut obj = objects.get(&id)?;
    let mut x = obj.x;
    let mut y = obj.y;

    let mut visited = HashSet::new();
    visited.insert(id);

    while let Some(parent_id) = obj.parent_id {
        if !visited.insert(parent_id) {
            log::warn!("parent cycle detected at object {parent_id}");
            break;
        }
        match objects.get(&parent_id) {
            Some(parent) => {
                x += parent.x;
                y += parent.y;
                obj = parent;
            }
            None => break,
        }
    }
    Some(Point::new(x, y))
}

/// Absolute axis-aligned bounds of an object, before rotation.
pub fn absolute_bounds(objects: &HashMap<ObjectId, SceneObject>, id: ObjectId) -> Option<Rect> {
    let pos = absolute_position(objects, id)?;
    let obj = objects.get(&id)?;
    Some(Rect::new(pos.x, pos.y, pos.x + obj.width, pos.y + obj.height))
}

/// Absolute bounds after applying the object's rotation.
pub fn absolute_rotated_bounds(
    objects: &HashMap<ObjectId, SceneObject>,
    id: ObjectId,
) -> Option<Rect> {
    let bounds = absolute_bounds(objects, id)?;
    let rotation = objects.get(&id).map(|o| o.rotation).unwrap_or(0.0);
    Some(rotated_aabb(bounds, rotation))
}

/// Direct children of a group, in z order.
pub fn children_of(objects: &HashMap<ObjectId, SceneObject>, group_id: ObjectId) -> Vec<ObjectId> {
    let mut ids: Vec<ObjectId> = objects
        .values()
        .filter(|o| o.parent_id == Some(group_id))
        .map(|o| o.id)
        .collect();
    ids.sort_by_key(|id| (objects[id].z_index, *id));
    ids
}

/// A planned group creation: the group object to insert plus the
/// patches that reparent the members and make their positions relative.
#[derive(Debug, Clone)]
pub struct GroupPlan {
    pub group: SceneObject,
    pub member_patches: Vec<(ObjectId, ObjectPatch)>,
}

/// A planned group dissolution: the group to delete plus the patches
/// that restore the members' absolute positions.
#[derive(Debug, Clone)]
pub struct UngroupPlan {
    pub group_id: ObjectId,
    pub member_patches: Vec<(ObjectId, ObjectPatch)>,
}

/// Plan grouping the given objects.
///
/// The group frame is the union of the members' rotated absolute
/// bounds; member positions become relative to it. Unknown ids and
/// objects already inside a group are skipped. Returns `None` when
/// fewer than two groupable objects remain.
pub fn group_objects(
    objects: &HashMap<ObjectId, SceneObject>,
    ids: &[ObjectId],
    z_index: i64,
) -> Option<GroupPlan> {
    let members: Vec<ObjectId> = ids
        .iter()
        .copied()
        .filter(|id| objects.get(id).is_some_and(|o| o.parent_id.is_none()))
        .collect();
    if members.len() < 2 {
        return None;
    }

    let mut union: Option<Rect> = None;
    for &id in &members {
        let bounds = absolute_rotated_bounds(objects, id)?;
        union = Some(match union {
            Some(u) => u.union(bounds),
            None => bounds,
        });
    }
    let frame = union?;

    let group = SceneObject::new(
        ObjectKind::Group {
            children: members.clone(),
        },
        frame.x0,
        frame.y0,
        frame.width(),
        frame.height(),
        z_index,
    );

    let mut member_patches = Vec::with_capacity(members.len());
    for &id in &members {
        let obj = &objects[&id];
        let mut patch = ObjectPatch::position(obj.x - frame.x0, obj.y - frame.y0);
        patch.parent_id = Some(Some(group.id));
        member_patches.push((id, patch));
    }

    Some(GroupPlan {
        group,
        member_patches,
    })
}

/// Plan dissolving a group, restoring the members' absolute positions.
///
/// Returns `None` if `group_id` is not a group.
pub fn ungroup_objects(
    objects: &HashMap<ObjectId, SceneObject>,
    group_id: ObjectId,
) -> Option<UngroupPlan> {
    let group = objects.get(&group_id)?;
    if !matches!(group.kind, ObjectKind::Group { .. }) {
        return None;
    }

    let mut member_patches = Vec::new();
    for id in children_of(objects, group_id) {
        let obj = &objects[&id];
        let mut patch = ObjectPatch::position(obj.x + group.x, obj.y + group.y);
        patch.parent_id = Some(None);
        member_patches.push((id, patch));
    }

    Some(UngroupPlan {
        group_id,
        member_patches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_object(x: f64, y: f64, w: f64, h: f64) -> SceneObject {
        SceneObject::new(ObjectKind::Rectangle { corner_radius: 0.0 }, x, y, w, h, 0)
    }

    fn map(objects: impl IntoIterator<Item = SceneObject>) -> HashMap<ObjectId, SceneObject> {
        objects.into_iter().map(|o| (o.id, o)).collect()
    }

    #[test]
    fn test_absolute_position_nested() {
        let mut outer = rect_object(100.0, 100.0, 400.0, 400.0);
        outer.kind = ObjectKind::Group { children: vec![] };
        let mut inner = rect_object(50.0, 50.0, 200.0, 200.0);
        inner.kind = ObjectKind::Group { children: vec![] };
        inner.parent_id = Some(outer.id);
        let mut leaf = rect_object(10.0, 20.0, 30.0, 30.0);
        leaf.parent_id = Some(inner.id);
        let leaf_id = leaf.id;

        let objects = map([outer, inner, leaf]);
        let pos = absolute_position(&objects, leaf_id).unwrap();
        assert_eq!(pos, Point::new(160.0, 170.0));
    }

    #[test]
    fn test_absolute_position_unknown_and_dangling() {
        let mut orphan = rect_object(10.0, 10.0, 30.0, 30.0);
        orphan.parent_id = Some(uuid::Uuid::new_v4());
        let orphan_id = orphan.id;
        let objects = map([orphan]);

        assert!(absolute_position(&objects, uuid::Uuid::new_v4()).is_none());
        // Dangling parent resolves as if top-level.
        assert_eq!(
            absolute_position(&objects, orphan_id).unwrap(),
            Point::new(10.0, 10.0)
        );
    }

    #[test]
    fn test_absolute_position_cycle_terminates() {
        let mut a = rect_object(10.0, 0.0, 30.0, 30.0);
        let mut b = rect_object(20.0, 0.0, 30.0, 30.0);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        let a_id = a.id;

        let objects = map([a, b]);
        // Walks a -> b, then stops when the cycle closes back at a.
        let pos = absolute_position(&objects, a_id).unwrap();
        assert_eq!(pos.x, 30.0);
    }

    #[test]
    fn test_group_ungroup_round_trip() {
        let a = rect_object(100.0, 100.0, 50.0, 50.0);
        let b = rect_object(300.0, 200.0, 80.0, 40.0);
        let (a_id, b_id) = (a.id, b.id);
        let mut objects = map([a, b]);

        let plan = group_objects(&objects, &[a_id, b_id], 10).unwrap();
        assert_eq!(plan.group.x, 100.0);
        assert_eq!(plan.group.y, 100.0);
        assert_eq!(plan.group.width, 280.0);
        assert_eq!(plan.group.height, 140.0);

        let group_id = plan.group.id;
        objects.insert(group_id, plan.group);
        for (id, patch) in &plan.member_patches {
            patch.apply_to(objects.get_mut(id).unwrap());
        }

        // Relative positions, absolute unchanged.
        assert_eq!(objects[&a_id].x, 0.0);
        assert_eq!(objects[&b_id].x, 200.0);
        assert_eq!(
            absolute_position(&objects, a_id).unwrap(),
            Point::new(100.0, 100.0)
        );
        assert_eq!(
            absolute_position(&objects, b_id).unwrap(),
            Point::new(300.0, 200.0)
        );

        let plan = ungroup_objects(&objects, group_id).unwrap();
        for (id, patch) in &plan.member_patches {
            patch.apply_to(objects.get_mut(id).unwrap());
        }
        objects.remove(&plan.group_id);

        assert_eq!(objects[&a_id].x, 100.0);
        assert_eq!(objects[&a_id].parent_id, None);
        assert_eq!(objects[&b_id].x, 300.0);
        assert_eq!(objects[&b_id].y, 200.0);
    }

    #[test]
    fn test_group_includes_rotated_extent() {
        let a = rect_object(0.0, 0.0, 100.0, 100.0);
        let mut b = rect_object(200.0, 0.0, 100.0, 20.0);
        b.rotation = 90.0;
        let ids = [a.id, b.id];
        let objects = map([a, b]);

        let plan = group_objects(&objects, &ids, 0).unwrap();
        // b's rotated footprint is 20x100 centered at (250, 10), so the
        // union extends from y = -40.
        assert_eq!(plan.group.y, -40.0);
        assert_eq!(plan.group.height, 140.0);
    }

    #[test]
    fn test_group_requires_two_top_level_objects() {
        let a = rect_object(0.0, 0.0, 10.0, 10.0);
        let mut nested = rect_object(5.0, 5.0, 10.0, 10.0);
        nested.parent_id = Some(uuid::Uuid::new_v4());
        let ids = [a.id, nested.id];
        let objects = map([a, nested]);
        assert!(group_objects(&objects, &ids, 0).is_none());
    }

    #[test]
    fn test_ungroup_non_group_is_none() {
        let a = rect_object(0.0, 0.0, 10.0, 10.0);
        let id = a.id;
        let objects = map([a]);
        assert!(ungroup_objects(&objects, id).is_none());
    }
}
