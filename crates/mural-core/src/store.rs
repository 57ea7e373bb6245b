//! Replicated object store with field-level last-writer-wins merging.
//!
//! The store owns the canonical object map. Local mutations update the map
//! synchronously and queue outbound deltas for the replication channel;
//! remote deltas are merged under a guard flag so merge-driven state changes
//! can never be reinterpreted as new local edits and re-broadcast.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::object::{ObjectId, ObjectPatch, SceneObject};

/// Coalescing window for repeated local field edits to one object.
pub const COALESCE_WINDOW: Duration = Duration::from_millis(40);

/// A change arriving from a remote peer.
///
/// `fields` carries either a full object representation (for objects this
/// client has never seen) or a partial field patch. `clock` is the
/// replication channel's total-order token; per-field conflicts resolve
/// last-writer-wins on it.
#[derive(Debug, Clone)]
pub struct RemoteChange {
    pub id: ObjectId,
    pub fields: serde_json::Value,
    pub clock: u64,
}

/// A local change queued for the replication channel.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundDelta {
    Upsert {
        id: ObjectId,
        fields: serde_json::Value,
        clock: u64,
    },
    Delete {
        id: ObjectId,
        clock: u64,
    },
}

/// Notification emitted to subscribers after the map changes.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    ObjectsChanged { ids: Vec<ObjectId> },
}

type Subscriber = Box<dyn Fn(&ChangeEvent)>;

/// The canonical, replicated object map.
pub struct ReplicatedStore {
    objects: HashMap<ObjectId, SceneObject>,
    /// Guard flag: set for the duration of a remote merge. Local mutations
    /// are dropped while it is set, preventing replication feedback loops.
    merging: bool,
    /// Local logical clock, kept >= every channel clock seen.
    clock: u64,
    /// Per-object, per-field clocks of the latest applied write.
    field_clocks: HashMap<ObjectId, HashMap<&'static str, u64>>,
    /// Coalescing buffer: pending outbound patch + time of first edit.
    pending: HashMap<ObjectId, (ObjectPatch, Instant)>,
    outgoing: VecDeque<OutboundDelta>,
    subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for ReplicatedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicatedStore")
            .field("objects", &self.objects.len())
            .field("merging", &self.merging)
            .field("clock", &self.clock)
            .field("pending", &self.pending.len())
            .field("outgoing", &self.outgoing.len())
            .finish()
    }
}

impl Default for ReplicatedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicatedStore {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            merging: false,
            clock: 0,
            field_clocks: HashMap::new(),
            pending: HashMap::new(),
            outgoing: VecDeque::new(),
            subscribers: Vec::new(),
        }
    }

    /// Register a change-notification callback.
    pub fn subscribe(&mut self, f: impl Fn(&ChangeEvent) + 'static) {
        self.subscribers.push(Box::new(f));
    }

    fn notify(&self, ids: Vec<ObjectId>) {
        if ids.is_empty() {
            return;
        }
        let event = ChangeEvent::ObjectsChanged { ids };
        for sub in &self.subscribers {
            sub(&event);
        }
    }

    /// Whether a remote merge is currently in progress.
    pub fn is_merging(&self) -> bool {
        self.merging
    }

    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    /// The canonical object map, for read-only resolution (absolute
    /// positions, snapping). Callers must not hold this across an
    /// event-handling turn.
    pub fn map(&self) -> &HashMap<ObjectId, SceneObject> {
        &self.objects
    }

    /// Objects sorted back to front by z-index (id as tiebreaker so the
    /// order is stable across clients).
    pub fn objects_ordered(&self) -> Vec<&SceneObject> {
        let mut objs: Vec<&SceneObject> = self.objects.values().collect();
        objs.sort_by_key(|o| (o.z_index, o.id));
        objs
    }

    /// Next free z-index above every existing object.
    pub fn next_z_index(&self) -> i64 {
        self.objects
            .values()
            .map(|o| o.z_index)
            .max()
            .map_or(0, |z| z + 1)
    }

    fn bump_clock(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn stamp_fields(&mut self, id: ObjectId, names: &[&'static str], clock: u64) {
        let clocks = self.field_clocks.entry(id).or_default();
        for name in names {
            let entry = clocks.entry(name).or_insert(0);
            if clock > *entry {
                *entry = clock;
            }
        }
    }

    // --- Local mutations (rejected while a merge is in progress) ---

    /// Insert a locally created object. Returns false if dropped.
    pub fn insert(&mut self, obj: SceneObject) -> bool {
        if self.merging {
            return false;
        }
        let id = obj.id;
        let clock = self.bump_clock();
        if let Ok(fields) = serde_json::to_value(&obj) {
            self.outgoing
                .push_back(OutboundDelta::Upsert { id, fields, clock });
        }
        self.objects.insert(id, obj);
        self.notify(vec![id]);
        true
    }

    /// Apply a field patch to one object. Repeated calls within the
    /// coalescing window are merged into a single outbound delta.
    /// Returns false if the store is merging or the object is unknown.
    pub fn apply(&mut self, id: ObjectId, patch: ObjectPatch) -> bool {
        if self.merging || patch.is_empty() {
            return false;
        }
        let Some(obj) = self.objects.get_mut(&id) else {
            return false;
        };
        patch.apply_to(obj);
        let clock = self.bump_clock();
        self.stamp_fields(id, &patch.field_names(), clock);
        match self.pending.get_mut(&id) {
            Some((pending, _)) => pending.merge(&patch),
            None => {
                self.pending.insert(id, (patch, Instant::now()));
            }
        }
        self.notify(vec![id]);
        true
    }

    /// Apply patches to several objects atomically and replicate
    /// immediately, bypassing the coalescing window. Used by interactive
    /// gestures that must flush every frame.
    pub fn apply_many(&mut self, patches: Vec<(ObjectId, ObjectPatch)>) -> bool {
        if self.merging {
            return false;
        }
        let mut changed = Vec::new();
        for (id, patch) in patches {
            if patch.is_empty() {
                continue;
            }
            let Some(obj) = self.objects.get_mut(&id) else {
                continue;
            };
            patch.apply_to(obj);
            let clock = self.bump_clock();
            self.stamp_fields(id, &patch.field_names(), clock);
            // Fold any coalesced edits into this flush so ordering holds.
            let full = match self.pending.remove(&id) {
                Some((mut earlier, _)) => {
                    earlier.merge(&patch);
                    earlier
                }
                None => patch,
            };
            if let Ok(fields) = serde_json::to_value(&full) {
                self.outgoing
                    .push_back(OutboundDelta::Upsert { id, fields, clock });
            }
            changed.push(id);
        }
        let any = !changed.is_empty();
        self.notify(changed);
        any
    }

    /// Remove one object. Returns the removed object, or None if the store
    /// is merging or the id is unknown.
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        if self.merging {
            return None;
        }
        let removed = self.objects.remove(&id)?;
        self.pending.remove(&id);
        self.field_clocks.remove(&id);
        let clock = self.bump_clock();
        self.outgoing.push_back(OutboundDelta::Delete { id, clock });
        self.notify(vec![id]);
        Some(removed)
    }

    /// Remove several objects atomically (one notification).
    pub fn remove_many(&mut self, ids: &[ObjectId]) -> bool {
        if self.merging {
            return false;
        }
        let mut removed = Vec::new();
        for &id in ids {
            if self.objects.remove(&id).is_some() {
                self.pending.remove(&id);
                self.field_clocks.remove(&id);
                let clock = self.bump_clock();
                self.outgoing.push_back(OutboundDelta::Delete { id, clock });
                removed.push(id);
            }
        }
        let any = !removed.is_empty();
        self.notify(removed);
        any
    }

    /// Clone of the current object map. Owned by HistoryLog snapshots.
    pub fn snapshot(&self) -> HashMap<ObjectId, SceneObject> {
        self.objects.clone()
    }

    /// Replace the whole map with a snapshot: the undo/redo entry point.
    /// Diffs against the current map, deletes ids absent from the snapshot,
    /// upserts the rest, and emits one change notification.
    pub fn replace_all(&mut self, snapshot: HashMap<ObjectId, SceneObject>) -> bool {
        if self.merging {
            return false;
        }
        let mut changed = Vec::new();
        let stale: Vec<ObjectId> = self
            .objects
            .keys()
            .filter(|id| !snapshot.contains_key(id))
            .copied()
            .collect();
        for id in stale {
            self.objects.remove(&id);
            self.pending.remove(&id);
            self.field_clocks.remove(&id);
            let clock = self.bump_clock();
            self.outgoing.push_back(OutboundDelta::Delete { id, clock });
            changed.push(id);
        }
        for (id, obj) in snapshot {
            if self.objects.get(&id) == Some(&obj) {
                continue;
            }
            self.pending.remove(&id);
            self.field_clocks.remove(&id);
            let clock = self.bump_clock();
            if let Ok(fields) = serde_json::to_value(&obj) {
                self.outgoing
                    .push_back(OutboundDelta::Upsert { id, fields, clock });
            }
            self.objects.insert(id, obj);
            changed.push(id);
        }
        let any = !changed.is_empty();
        self.notify(changed);
        any
    }

    // --- Remote merges ---

    /// Merge a single remote change. See [`Self::merge_remote_batch`].
    pub fn merge_remote(&mut self, change: RemoteChange) {
        self.merge_remote_batch(vec![change]);
    }

    /// Merge a batch of remote changes under the guard flag.
    ///
    /// Each entry is rebuilt from its incoming representation and validated
    /// against the variant's schema; malformed objects are dropped with a
    /// warning and never partially applied. One notification is emitted for
    /// the whole batch.
    pub fn merge_remote_batch(&mut self, changes: Vec<RemoteChange>) {
        self.merging = true;
        let mut changed = Vec::new();
        for change in changes {
            if change.clock > self.clock {
                self.clock = change.clock;
            }
            if self.objects.contains_key(&change.id) {
                if self.merge_existing(&change) {
                    changed.push(change.id);
                }
            } else if self.merge_new(&change) {
                changed.push(change.id);
            }
        }
        self.notify(changed);
        self.merging = false;
    }

    fn merge_existing(&mut self, change: &RemoteChange) -> bool {
        let mut patch: ObjectPatch = match serde_json::from_value(change.fields.clone()) {
            Ok(p) => p,
            Err(err) => {
                log::warn!(
                    "dropping malformed remote patch for {}: {err}",
                    change.id
                );
                return false;
            }
        };
        // Field-level LWW: drop fields this client has already seen a
        // newer write for.
        if let Some(clocks) = self.field_clocks.get(&change.id) {
            let stale: Vec<&str> = patch
                .field_names()
                .into_iter()
                .filter(|name| clocks.get(name).is_some_and(|&c| c > change.clock))
                .collect();
            patch.strip_fields(&stale);
        }
        if patch.is_empty() {
            return false;
        }
        let names = patch.field_names();
        if let Some(obj) = self.objects.get_mut(&change.id) {
            patch.apply_to(obj);
        }
        self.stamp_fields(change.id, &names, change.clock);
        true
    }

    fn merge_new(&mut self, change: &RemoteChange) -> bool {
        let obj: SceneObject = match serde_json::from_value(change.fields.clone()) {
            Ok(o) => o,
            Err(err) => {
                log::warn!(
                    "dropping incomplete remote object {}: {err}",
                    change.id
                );
                return false;
            }
        };
        if let Err(err) = obj.validate() {
            log::warn!("dropping invalid remote object {}: {err}", change.id);
            return false;
        }
        if obj.id != change.id {
            log::warn!(
                "dropping remote object with mismatched id (envelope {}, body {})",
                change.id,
                obj.id
            );
            return false;
        }
        self.objects.insert(change.id, obj);
        true
    }

    /// Merge a remote deletion.
    pub fn merge_remote_delete(&mut self, id: ObjectId) {
        self.merging = true;
        if self.objects.remove(&id).is_some() {
            self.pending.remove(&id);
            self.field_clocks.remove(&id);
            self.notify(vec![id]);
        }
        self.merging = false;
    }

    // --- Outbound replication ---

    /// Move coalesced patches older than [`COALESCE_WINDOW`] to the
    /// outgoing queue. Call once per frame.
    pub fn flush_coalesced(&mut self, now: Instant) {
        let ripe: Vec<ObjectId> = self
            .pending
            .iter()
            .filter(|(_, (_, since))| now.duration_since(*since) >= COALESCE_WINDOW)
            .map(|(&id, _)| id)
            .collect();
        for id in ripe {
            self.flush_pending_for(id);
        }
    }

    /// Force every coalesced patch onto the outgoing queue.
    pub fn flush_pending(&mut self) {
        let ids: Vec<ObjectId> = self.pending.keys().copied().collect();
        for id in ids {
            self.flush_pending_for(id);
        }
    }

    fn flush_pending_for(&mut self, id: ObjectId) {
        if let Some((patch, _)) = self.pending.remove(&id) {
            let clock = self.bump_clock();
            if let Ok(fields) = serde_json::to_value(&patch) {
                self.outgoing
                    .push_back(OutboundDelta::Upsert { id, fields, clock });
            }
        }
    }

    /// Drain the outbound delta queue for the replication channel.
    pub fn take_outgoing(&mut self) -> Vec<OutboundDelta> {
        self.outgoing.drain(..).collect()
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }
}
