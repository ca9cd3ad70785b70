//! Earliest-arrival journey planning over GTFS timetables.
//!
//! A parsed [`feed::Feed`] is compiled once into a [`timetable::Timetable`]:
//! string ids become dense indices in a [`registry::Registry`], and the
//! network is laid out as flat per-route and per-stop arrays built for
//! sequential scanning. A [`raptor::RouteFinder`] then answers queries with
//! a round-based search, where round `k` covers every journey using at most
//! `k` trips, with walking transfers folded in between rounds.
//!
//! The indices are immutable after construction and carry no interior
//! mutability, so one finder can serve any number of concurrent callers by
//! shared reference; all per-query state lives on the query's own stack.

pub mod feed;
pub mod raptor;
pub mod registry;
pub mod shared;
pub mod timetable;

pub mod prelude {
    pub use crate::feed::Feed;
    pub use crate::raptor::{Journey, JourneyItem, RouteFinder, WalkingSpeed};
    pub use crate::registry::{Direction, Registry, RouteId, ServiceId, StopId, TripId};
    pub use crate::shared::Time;
    pub use crate::timetable::Timetable;
}
