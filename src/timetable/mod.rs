use std::collections::{BTreeSet, HashMap};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    feed::Feed,
    registry::{DenseId, Direction, Registry, RouteId, ServiceId, StopId, TripId},
    shared::{Coordinate, Distance},
};

mod routes;
mod stops;

pub use routes::*;
pub use stops::*;

/// Footpaths longer than this are not generated.
const MAX_TRANSFER_KM: f64 = 1.0;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    UnknownId(#[from] crate::registry::Error),
}

/// The frozen, query-ready form of a feed: the id registry plus the packed
/// route and stop indices. Built once, never mutated afterwards.
#[derive(Debug)]
pub struct Timetable {
    registry: Registry,
    routes: RouteIndex,
    stops: StopIndex,
}

impl Timetable {
    /// Derives the packed indices from a parsed feed.
    ///
    /// Stop-times are grouped by internal route and trip, each trip's calls
    /// are ordered by departure, a route's trips by the arrival at their
    /// first stop. Trips shorter than the longest pattern of their route
    /// (short-turn workings) are discarded so that every trip of a route
    /// matches the route's stop sequence position for position.
    pub fn build(feed: &Feed) -> Result<Self, Error> {
        let mut registry = Registry::new();
        for stop in feed.stops() {
            registry.insert_stop(&stop.stop_id);
        }
        for route in feed.routes() {
            registry.insert_route(&route.route_id);
        }
        for trip in feed.trips() {
            registry.insert_trip(&trip.trip_id);
        }
        for service in feed.calendar() {
            registry.insert_service(&service.service_id);
        }
        registry.lock();

        // Resolve every trip once; the stop-time pass below only does map
        // lookups per row.
        let mut trip_info: HashMap<&str, (TripId, RouteId, ServiceId)> =
            HashMap::with_capacity(feed.trips().len());
        for trip in feed.trips() {
            let tid = registry.trip_id(&trip.trip_id)?;
            let rid = registry.route_id(&trip.route_id, Direction::from_gtfs(trip.direction_id))?;
            let sid = registry.service_id(&trip.service_id)?;
            trip_info.insert(trip.trip_id.as_str(), (tid, rid, sid));
        }

        let mut grouped: Vec<HashMap<TripId, Vec<StopTime>>> =
            vec![HashMap::new(); registry.route_count()];
        for row in feed.stop_times() {
            let (tid, rid, sid) = *trip_info
                .get(row.trip_id.as_str())
                .ok_or_else(|| crate::registry::Error::UnknownId(row.trip_id.clone()))?;
            let stop = registry.stop_id(&row.stop_id)?;
            grouped[rid.index()].entry(tid).or_default().push(StopTime {
                trip: tid,
                stop,
                service: sid,
                arrival: row.arrival_time,
                departure: row.departure_time,
            });
        }

        let mut directory = Vec::with_capacity(registry.route_count() + 1);
        let mut route_stops = Vec::new();
        let mut stop_times = Vec::new();
        let mut dropped = 0usize;
        for raw in &mut grouped {
            directory.push((route_stops.len(), stop_times.len()));
            let mut trips: Vec<(TripId, Vec<StopTime>)> = raw.drain().collect();
            for (_, calls) in &mut trips {
                calls.sort_by_key(|call| call.departure);
            }
            // the trip id tie-break keeps simultaneous departures in a
            // stable order no matter how the hash map iterated
            trips.sort_by_key(|(trip, calls)| (calls[0].arrival, *trip));
            let longest = trips.iter().map(|(_, calls)| calls.len()).max().unwrap_or(0);
            dropped += trips.iter().filter(|(_, calls)| calls.len() != longest).count();
            trips.retain(|(_, calls)| calls.len() == longest);
            if let Some((_, calls)) = trips.first() {
                route_stops.extend(calls.iter().map(|call| call.stop));
            }
            for (_, calls) in &trips {
                stop_times.extend(calls.iter().copied());
            }
        }
        directory.push((route_stops.len(), stop_times.len()));
        let routes = RouteIndex::new(directory, route_stops, stop_times);

        // Incident routes come from the final stop sequences, so a stop
        // served only by discarded trips does not advertise the route.
        let mut incident: Vec<BTreeSet<RouteId>> = vec![BTreeSet::new(); registry.stop_count()];
        for index in 0..routes.len() {
            let route = RouteId::from_index(index);
            for &stop in routes.stops(route) {
                incident[stop.index()].insert(route);
            }
        }

        let mut coordinates = vec![Coordinate::default(); registry.stop_count()];
        for stop in feed.stops() {
            let sid = registry.stop_id(&stop.stop_id)?;
            coordinates[sid.index()] = Coordinate::from((stop.stop_lat, stop.stop_lon));
        }
        let footpaths = transfer_graph(&coordinates);

        let mut directory = Vec::with_capacity(registry.stop_count() + 1);
        let mut stop_routes = Vec::new();
        let mut transfers = Vec::new();
        for (routes_of_stop, walks) in incident.iter().zip(&footpaths) {
            directory.push((stop_routes.len(), transfers.len()));
            stop_routes.extend(routes_of_stop.iter().copied());
            transfers.extend(walks.iter().copied());
        }
        directory.push((stop_routes.len(), transfers.len()));
        let transfer_count = transfers.len();
        let stops = StopIndex::new(directory, stop_routes, transfers);

        if dropped > 0 {
            debug!(dropped, "discarded trips deviating from their route's pattern");
        }
        info!(
            stops = registry.stop_count(),
            routes = routes.len(),
            trips = registry.trip_count(),
            transfers = transfer_count,
            "timetable built"
        );

        Ok(Self {
            registry,
            routes,
            stops,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn routes(&self) -> &RouteIndex {
        &self.routes
    }

    pub fn stops(&self) -> &StopIndex {
        &self.stops
    }
}

/// All-pairs footpath scan. Quadratic in the number of stops, which is why
/// it fans out over the thread pool; everything under [`MAX_TRANSFER_KM`]
/// becomes a pair of mirrored transfers.
fn transfer_graph(coordinates: &[Coordinate]) -> Vec<Vec<Transfer>> {
    let pairs: Vec<(usize, usize, Distance)> = (0..coordinates.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            (i + 1..coordinates.len()).filter_map(move |j| {
                let distance = coordinates[i].great_circle(&coordinates[j]);
                (distance.as_kilometers() < MAX_TRANSFER_KM).then_some((i, j, distance))
            })
        })
        .collect();
    let mut graph = vec![Vec::new(); coordinates.len()];
    for (i, j, distance) in pairs {
        graph[i].push(Transfer {
            target: StopId::from_index(j),
            distance,
        });
        graph[j].push(Transfer {
            target: StopId::from_index(i),
            distance,
        });
    }
    for walks in &mut graph {
        walks.sort_by_key(|transfer| transfer.target);
    }
    graph
}
