use crate::{
    registry::{DenseId, RouteId, ServiceId, StopId, TripId},
    shared::Time,
};

/// One scheduled call of a trip at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTime {
    pub trip: TripId,
    pub stop: StopId,
    pub service: ServiceId,
    pub arrival: Time,
    pub departure: Time,
}

/// Flat per-route view of the timetable.
///
/// Two packed buffers back the whole network: `route_stops` holds, for each
/// route in [`RouteId`] order, the stop sequence of one trip of that route;
/// `stop_times` holds every call of every trip, trip after trip in
/// departure order. The directory carries one `(stops, times)` offset pair
/// per route plus a closing entry, so every range is
/// `directory[r]..directory[r + 1]` and iteration never needs a special
/// case for the last route.
///
/// All trips of a route call at the same stops in the same order; the build
/// discards trips that deviate. That is what makes position-based indexing
/// work: the call of trip `k` at stop position `p` lives at
/// `k * stops_count + p`.
#[derive(Debug)]
pub struct RouteIndex {
    directory: Box<[(usize, usize)]>,
    route_stops: Box<[StopId]>,
    stop_times: Box<[StopTime]>,
}

impl RouteIndex {
    pub(crate) fn new(
        directory: Vec<(usize, usize)>,
        route_stops: Vec<StopId>,
        stop_times: Vec<StopTime>,
    ) -> Self {
        debug_assert!(!directory.is_empty());
        debug_assert_eq!(directory.last(), Some(&(route_stops.len(), stop_times.len())));
        Self {
            directory: directory.into_boxed_slice(),
            route_stops: route_stops.into_boxed_slice(),
            stop_times: stop_times.into_boxed_slice(),
        }
    }

    /// Number of routes covered by the index.
    pub fn len(&self) -> usize {
        self.directory.len() - 1
    }

    /// All route ids in dense order.
    pub fn route_ids(&self) -> impl Iterator<Item = RouteId> {
        (0..self.len()).map(RouteId::from_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The ordered stop sequence of `route`.
    pub fn stops(&self, route: RouteId) -> &[StopId] {
        let start = self.directory[route.index()].0;
        let end = self.directory[route.index() + 1].0;
        &self.route_stops[start..end]
    }

    /// Every call of every trip of `route`, concatenated in trip order.
    pub fn stop_times(&self, route: RouteId) -> &[StopTime] {
        let start = self.directory[route.index()].1;
        let end = self.directory[route.index() + 1].1;
        &self.stop_times[start..end]
    }

    pub fn stops_count(&self, route: RouteId) -> usize {
        self.stops(route).len()
    }

    /// Number of trips running on `route`.
    pub fn trips_count(&self, route: RouteId) -> usize {
        let stops = self.stops_count(route);
        if stops == 0 {
            0
        } else {
            self.stop_times(route).len() / stops
        }
    }

    /// The call of each trip of `route` at the stop at `position`, earliest
    /// trip first: a stride view over `stop_times` with the route's stop
    /// count as the step.
    ///
    /// Yields `(index, call)` pairs where `index` addresses the call within
    /// [`RouteIndex::stop_times`].
    pub(crate) fn trips_from_position(
        &self,
        route: RouteId,
        position: usize,
    ) -> impl Iterator<Item = (usize, &StopTime)> {
        let stride = self.stops_count(route).max(1);
        self.stop_times(route)[position.min(self.stop_times(route).len())..]
            .iter()
            .enumerate()
            .step_by(stride)
            .map(move |(offset, call)| (position + offset, call))
    }

    /// The call of each trip of `route` at `stop`, earliest trip first.
    /// Empty when the route does not serve the stop.
    pub fn trips_from_stop(
        &self,
        route: RouteId,
        stop: StopId,
    ) -> impl Iterator<Item = &StopTime> {
        self.stops(route)
            .iter()
            .position(|&s| s == stop)
            .map(|position| self.trips_from_position(route, position))
            .into_iter()
            .flatten()
            .map(|(_, call)| call)
    }

    /// Direct access to one call of `route` by its packed index.
    pub fn stop_time_at(&self, route: RouteId, index: usize) -> &StopTime {
        &self.stop_times(route)[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DenseId;

    fn call(trip: usize, stop: usize, dep: i32) -> StopTime {
        StopTime {
            trip: TripId::from_index(trip),
            stop: StopId::from_index(stop),
            service: ServiceId::from_index(0),
            arrival: Time::from_seconds(dep - 30),
            departure: Time::from_seconds(dep),
        }
    }

    /// Two routes: one with two trips over three stops, one empty.
    fn sample() -> RouteIndex {
        let route_stops = vec![
            StopId::from_index(0),
            StopId::from_index(1),
            StopId::from_index(2),
        ];
        let stop_times = vec![
            call(0, 0, 100),
            call(0, 1, 200),
            call(0, 2, 300),
            call(1, 0, 1100),
            call(1, 1, 1200),
            call(1, 2, 1300),
        ];
        RouteIndex::new(vec![(0, 0), (3, 6), (3, 6)], route_stops, stop_times)
    }

    #[test]
    fn ranges_come_from_neighbouring_directory_rows() {
        let index = sample();
        assert_eq!(index.len(), 2);
        let route = RouteId::from_index(0);
        assert_eq!(index.stops(route).len(), 3);
        assert_eq!(index.stop_times(route).len(), 6);
        assert_eq!(index.trips_count(route), 2);
    }

    #[test]
    fn empty_route_yields_empty_ranges() {
        let index = sample();
        let route = RouteId::from_index(1);
        assert!(index.stops(route).is_empty());
        assert!(index.stop_times(route).is_empty());
        assert_eq!(index.trips_count(route), 0);
    }

    #[test]
    fn stride_iterator_visits_one_call_per_trip() {
        let index = sample();
        let route = RouteId::from_index(0);
        let calls: Vec<_> = index.trips_from_position(route, 1).collect();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, 1);
        assert_eq!(calls[0].1.departure, Time::from_seconds(200));
        assert_eq!(calls[1].0, 4);
        assert_eq!(calls[1].1.departure, Time::from_seconds(1200));
    }

    #[test]
    fn trips_from_stop_orders_by_departure() {
        let index = sample();
        let route = RouteId::from_index(0);
        let departures: Vec<_> = index
            .trips_from_stop(route, StopId::from_index(2))
            .map(|call| call.departure.as_seconds())
            .collect();
        assert_eq!(departures, vec![300, 1300]);
    }

    #[test]
    fn trips_from_unserved_stop_is_empty() {
        let index = sample();
        let route = RouteId::from_index(0);
        assert_eq!(index.trips_from_stop(route, StopId::from_index(9)).count(), 0);
    }
}
