//! WorldState — latest own-tank snapshot plus recently observed objects.
//!
//! Written only by the feed ingestor. Every recorded observation gets a
//! sequence number so a sweep can ask for "everything since my cursor"
//! without racing the clock.

use std::collections::HashMap;

use tankstrike_core::state::{ObservedObject, OwnState};
use tankstrike_core::types::ObjectId;

#[derive(Debug, Clone)]
struct Entry {
    object: ObservedObject,
    seq: u64,
}

/// Own tank plus the last observation of every foreign object.
#[derive(Debug, Default)]
pub struct WorldState {
    own: Option<OwnState>,
    objects: HashMap<ObjectId, Entry>,
    seq: u64,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn own(&self) -> Option<&OwnState> {
        self.own.as_ref()
    }

    pub fn set_own(&mut self, own: OwnState) {
        self.own = Some(own);
    }

    pub fn clear_own(&mut self) {
        self.own = None;
    }

    /// Record (or replace) an observation and return its sequence number.
    pub fn record_object(&mut self, object: ObservedObject) -> u64 {
        self.seq += 1;
        let seq = self.seq;
        self.objects.insert(object.id, Entry { object, seq });
        seq
    }

    pub fn object(&self, id: ObjectId) -> Option<&ObservedObject> {
        self.objects.get(&id).map(|e| &e.object)
    }

    /// Sequence number of the newest observation.
    pub fn cursor(&self) -> u64 {
        self.seq
    }

    /// Observations recorded after `cursor`, oldest first, and the new cursor.
    pub fn objects_after(&self, cursor: u64) -> (Vec<ObservedObject>, u64) {
        let mut fresh: Vec<&Entry> = self.objects.values().filter(|e| e.seq > cursor).collect();
        fresh.sort_by_key(|e| e.seq);
        (fresh.into_iter().map(|e| e.object.clone()).collect(), self.seq)
    }

    /// Drop observations last seen before `before` (agent clock seconds).
    pub fn prune_objects(&mut self, before: f64) -> usize {
        let len = self.objects.len();
        self.objects.retain(|_, e| e.object.seen_at >= before);
        len - self.objects.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}
