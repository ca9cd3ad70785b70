use crate::{
    registry::{RouteId, StopId, TripId},
    shared::{time::SECONDS_PER_DAY, Time},
    timetable::RouteIndex,
};

/// Points at one call in a route's packed stop-times: the boarding call of a
/// ride. Enough to recover the trip, the line and the departure time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CallRef {
    pub route: RouteId,
    pub index: usize,
}

/// Backtracking output, still in offsets-from-departure.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RawItem {
    Visit { stop: StopId, arrival: Time },
    Ride(CallRef),
}

/// One element of a journey: either standing at a stop at a point in time,
/// or riding a trip between the surrounding visits.
///
/// Two rides are never adjacent; every ride sits between the visit where it
/// was boarded and the visit where it was left. Two adjacent visits mean the
/// distance was walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JourneyItem {
    Visit {
        stop: StopId,
        time: Time,
    },
    Ride {
        trip: TripId,
        route: RouteId,
        boarding: Time,
        alighting: Time,
    },
}

/// An earliest-arrival itinerary, ordered from departure to arrival. Times
/// are absolute seconds since midnight of the service day and keep growing
/// past 86 400 when the journey crosses midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    items: Vec<JourneyItem>,
}

impl Journey {
    /// Converts backtracked items into the public form: visit offsets become
    /// absolute times, and ride boardings are lifted onto the day they
    /// actually happen so the sequence never goes backwards.
    pub(crate) fn assemble(raw: Vec<RawItem>, departure: Time, routes: &RouteIndex) -> Self {
        let mut items = Vec::with_capacity(raw.len());
        let mut day_offset = 0;
        let mut prev_visit = departure;
        for (position, item) in raw.iter().enumerate() {
            match *item {
                RawItem::Visit { stop, arrival } => {
                    let time = departure + arrival;
                    items.push(JourneyItem::Visit { stop, time });
                    prev_visit = time;
                }
                RawItem::Ride(call) => {
                    let boarded = routes.stop_time_at(call.route, call.index);
                    while boarded.departure + Time::from_seconds(day_offset * SECONDS_PER_DAY)
                        < prev_visit
                    {
                        day_offset += 1;
                    }
                    let boarding =
                        boarded.departure + Time::from_seconds(day_offset * SECONDS_PER_DAY);
                    let alighting = match raw.get(position + 1) {
                        Some(RawItem::Visit { arrival, .. }) => departure + *arrival,
                        _ => boarding,
                    };
                    items.push(JourneyItem::Ride {
                        trip: boarded.trip,
                        route: call.route,
                        boarding,
                        alighting,
                    });
                }
            }
        }
        Self { items }
    }

    pub fn items(&self) -> &[JourneyItem] {
        &self.items
    }

    /// Time of the first visit.
    pub fn departure(&self) -> Option<Time> {
        self.items.iter().find_map(|item| match item {
            JourneyItem::Visit { time, .. } => Some(*time),
            JourneyItem::Ride { .. } => None,
        })
    }

    /// Time of the last visit.
    pub fn arrival(&self) -> Option<Time> {
        self.items.iter().rev().find_map(|item| match item {
            JourneyItem::Visit { time, .. } => Some(*time),
            JourneyItem::Ride { .. } => None,
        })
    }

    /// Total time spent between the first and the last visit.
    pub fn duration(&self) -> Option<Time> {
        match (self.departure(), self.arrival()) {
            (Some(departure), Some(arrival)) => Some(arrival - departure),
            _ => None,
        }
    }

    /// Number of rides taken.
    pub fn rides(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, JourneyItem::Ride { .. }))
            .count()
    }
}
