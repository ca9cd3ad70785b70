use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
    sync::Arc,
};

use thiserror::Error;

mod ids;
pub use ids::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown id '{0}'")]
    UnknownId(String),
}

/// One direction of the registry's bijections: a forward hash map plus the
/// dense reverse table. Both sides share the same key allocation, and a
/// single `insert` writes them together, so readers never observe half of a
/// pair.
#[derive(Debug)]
struct IdMap<K, I> {
    forward: HashMap<K, I>,
    reverse: Vec<K>,
}

impl<K, I> Default for IdMap<K, I> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: Vec::new(),
        }
    }
}

impl<K, I> IdMap<K, I>
where
    K: Eq + Hash + Clone,
    I: DenseId,
{
    /// Hands out the next dense id, or the existing one for a known key.
    fn insert(&mut self, key: K) -> I {
        *self.forward.entry(key.clone()).or_insert_with(|| {
            self.reverse.push(key);
            I::from_index(self.reverse.len() - 1)
        })
    }

    fn get<Q>(&self, key: &Q) -> Option<I>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.forward.get(key).copied()
    }

    fn key(&self, id: I) -> &K {
        &self.reverse[id.index()]
    }

    fn len(&self) -> usize {
        self.reverse.len()
    }
}

/// Two-way translation between the feed's string ids and the dense integer
/// spaces the router runs on.
///
/// The registry is filled once while the timetable is built and then locked;
/// after that it is shared read-only and further `insert_*` calls are
/// silently ignored. Each GTFS route occupies two [`RouteId`] slots, one per
/// direction.
#[derive(Debug, Default)]
pub struct Registry {
    stops: IdMap<Arc<str>, StopId>,
    routes: IdMap<RouteKey, RouteId>,
    trips: IdMap<Arc<str>, TripId>,
    services: IdMap<Arc<str>, ServiceId>,
    locked: bool,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Freezes the registry. Later inserts become no-ops.
    pub(crate) fn lock(&mut self) {
        self.locked = true;
    }

    pub(crate) fn insert_stop(&mut self, id: &str) {
        if self.locked {
            return;
        }
        self.stops.insert(Arc::from(id));
    }

    /// Registers both directions of a GTFS route, back to back.
    pub(crate) fn insert_route(&mut self, id: &str) {
        if self.locked {
            return;
        }
        let id: Arc<str> = Arc::from(id);
        for direction in Direction::BOTH {
            self.routes.insert(RouteKey::new(id.clone(), direction));
        }
    }

    pub(crate) fn insert_trip(&mut self, id: &str) {
        if self.locked {
            return;
        }
        self.trips.insert(Arc::from(id));
    }

    pub(crate) fn insert_service(&mut self, id: &str) {
        if self.locked {
            return;
        }
        self.services.insert(Arc::from(id));
    }

    pub fn stop_id(&self, id: &str) -> Result<StopId, Error> {
        self.stops
            .get(id)
            .ok_or_else(|| Error::UnknownId(id.to_string()))
    }

    pub fn route_id(&self, id: &str, direction: Direction) -> Result<RouteId, Error> {
        self.routes
            .get(&RouteKey::new(id, direction))
            .ok_or_else(|| Error::UnknownId(id.to_string()))
    }

    pub fn trip_id(&self, id: &str) -> Result<TripId, Error> {
        self.trips
            .get(id)
            .ok_or_else(|| Error::UnknownId(id.to_string()))
    }

    pub fn service_id(&self, id: &str) -> Result<ServiceId, Error> {
        self.services
            .get(id)
            .ok_or_else(|| Error::UnknownId(id.to_string()))
    }

    pub fn stop_key(&self, id: StopId) -> &str {
        self.stops.key(id)
    }

    pub fn route_key(&self, id: RouteId) -> &RouteKey {
        self.routes.key(id)
    }

    pub fn trip_key(&self, id: TripId) -> &str {
        self.trips.key(id)
    }

    pub fn service_key(&self, id: ServiceId) -> &str {
        self.services.key(id)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}
