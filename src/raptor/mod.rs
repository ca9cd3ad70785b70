use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    feed::Feed,
    registry::{self, DenseId, Registry, RouteId, ServiceId, StopId},
    shared::{Distance, Time},
    timetable::{self, Timetable},
};

mod journey;
pub use journey::{Journey, JourneyItem};
use journey::{CallRef, RawItem};

/// Extra seconds charged on every footpath, on top of the walking time.
const TRANSFER_PENALTY: Time = Time::from_seconds(60);
/// A single footpath may not take longer than this to walk.
const MAX_WALK_TIME: Time = Time::from_seconds(600);
/// Streets are not straight lines; walked distance runs about a fifth over
/// the great-circle distance.
const WALK_DETOUR_FACTOR: f64 = 1.2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown id '{0}'")]
    UnknownId(String),
    #[error("start and end are the same stop")]
    SameEndpoints,
    #[error("end stop unreachable")]
    Unreachable,
    #[error("no feed data to route on")]
    FeedNotReady,
    #[error("a journey was found but could not be reconstructed")]
    ReconstructionFailed,
}

impl From<registry::Error> for Error {
    fn from(value: registry::Error) -> Self {
        let registry::Error::UnknownId(id) = value;
        Error::UnknownId(id)
    }
}

impl From<timetable::Error> for Error {
    fn from(value: timetable::Error) -> Self {
        let timetable::Error::UnknownId(inner) = value;
        inner.into()
    }
}

/// How fast the passenger walks between stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkingSpeed {
    /// 4 km/h
    Slow,
    /// 5 km/h
    #[default]
    Normal,
    /// 6 km/h
    Fast,
}

impl WalkingSpeed {
    /// Seconds needed per kilometer.
    const fn pace(self) -> f64 {
        match self {
            WalkingSpeed::Slow => 900.0,
            WalkingSpeed::Normal => 720.0,
            WalkingSpeed::Fast => 600.0,
        }
    }
}

/// Approximate time to cover `distance` on foot.
fn walk_time(distance: Distance, speed: WalkingSpeed) -> Time {
    Time::from_seconds((distance.as_kilometers() * speed.pace() * WALK_DETOUR_FACTOR).round() as i32)
}

/// Search parameters. The wanted service selects which calendar's trips may
/// be boarded; it starts out unset and must be configured before a search.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub walking_speed: WalkingSpeed,
    pub wanted_service: String,
}

/// Per-round, per-stop search state: the earliest known arrival as an offset
/// from the departure time, the stop the leg came from, and the boarding
/// call when that leg was a ride. A walk leg leaves `boarded` empty.
#[derive(Debug, Clone, Copy, Default)]
struct Label {
    arrival: Option<Time>,
    parent: Option<StopId>,
    boarded: Option<CallRef>,
}

/// Earliest-arrival journey search over a built [`Timetable`].
///
/// The search runs in rounds: round `k` extends the journeys of round
/// `k - 1` by one trip, then lets the newly reached stops spill over to
/// their footpath neighbours. Stops whose label improved are marked and
/// seed the next round's route scan. A search call owns all of its working
/// state, so a finder can serve concurrent callers by shared reference.
#[derive(Debug)]
pub struct RouteFinder {
    timetable: Timetable,
    options: Options,
}

impl RouteFinder {
    /// Builds the packed indices for `feed` and wraps a finder around them.
    pub fn new(feed: &Feed) -> Result<Self, Error> {
        if feed.stops().is_empty() || feed.stop_times().is_empty() {
            return Err(Error::FeedNotReady);
        }
        let timetable = Timetable::build(feed)?;
        Ok(Self {
            timetable,
            options: Options::default(),
        })
    }

    /// Wraps a finder around an already built timetable.
    pub fn from_timetable(timetable: Timetable) -> Self {
        Self {
            timetable,
            options: Options::default(),
        }
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub fn registry(&self) -> &Registry {
        self.timetable.registry()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Updates the search parameters. An empty `service` keeps the currently
    /// configured one; a non-empty one must be registered or the call fails
    /// with [`Error::UnknownId`] carrying the offending string.
    pub fn set_options(&mut self, speed: WalkingSpeed, service: &str) -> Result<(), Error> {
        if !service.is_empty() {
            self.timetable.registry().service_id(service)?;
            self.options.wanted_service = service.to_string();
        }
        self.options.walking_speed = speed;
        Ok(())
    }

    /// Finds the earliest arrival at any of `ends` when leaving any of
    /// `starts` no earlier than `departure`.
    ///
    /// Only trips of the configured service are boarded. Unreachable
    /// destinations, identical endpoint sets and an unknown configured
    /// service all come back as error values rather than journeys.
    pub fn find(
        &self,
        starts: &[StopId],
        ends: &[StopId],
        departure: Time,
    ) -> Result<Journey, Error> {
        let registry = self.timetable.registry();
        let routes = self.timetable.routes();
        let stops = self.timetable.stops();
        let wanted: ServiceId = registry.service_id(&self.options.wanted_service)?;
        let speed = self.options.walking_speed;
        let num_stops = stops.len();

        if starts.is_empty() || ends.is_empty() {
            return Err(Error::Unreachable);
        }
        if starts == ends {
            return Err(Error::SameEndpoints);
        }

        // Offsets compare against raw timetable seconds on the 24-hour
        // clock; unset labels compare as infinitely late.
        let infinity = Time::from_seconds(i32::MAX);
        let lift = |offset: Option<Time>| -> Time {
            offset
                .map(|o| (departure + o).wrap_day())
                .unwrap_or(infinity)
        };

        let mut labels: Vec<Vec<Label>> = vec![vec![Label::default(); num_stops]];
        let mut earliest: Vec<Option<Time>> = vec![None; num_stops];
        let mut best_end: Option<(Time, StopId, usize)> = None;
        let mut marked = vec![false; num_stops];
        let mut num_marked = 0usize;

        for &start in starts {
            labels[0][start.index()].arrival = Some(Time::from_seconds(0));
            earliest[start.index()] = Some(Time::from_seconds(0));
            if !marked[start.index()] {
                marked[start.index()] = true;
                num_marked += 1;
            }
        }

        // Earliest marked stop position per route to scan this round. An
        // ordered map keeps equal-arrival tie-breaks independent of hash
        // order, so identical queries return identical journeys.
        let mut queue: BTreeMap<RouteId, usize> = BTreeMap::new();

        let mut round = 0;
        loop {
            round += 1;
            labels.push(labels[round - 1].clone());

            // Collect the routes touching a stop that improved last round,
            // each with the most upstream such stop.
            queue.clear();
            for stop_index in 0..num_stops {
                if !marked[stop_index] {
                    continue;
                }
                let stop = StopId::from_index(stop_index);
                for &route in stops.routes(stop) {
                    let Some(position) = routes.stops(route).iter().position(|&s| s == stop)
                    else {
                        continue;
                    };
                    queue
                        .entry(route)
                        .and_modify(|p| *p = (*p).min(position))
                        .or_insert(position);
                }
                marked[stop_index] = false;
                num_marked -= 1;
            }

            // Scan each collected route downstream while holding on to the
            // earliest trip caught so far.
            for (&route, &start_pos) in &queue {
                let stop_list = routes.stops(route);
                let calls = routes.stop_times(route);
                let mut boarded: Option<(usize, usize)> = None;
                for position in start_pos..stop_list.len() {
                    let stop = stop_list[position];

                    if let Some((trip_base, boarding_pos)) = boarded {
                        let call = &calls[trip_base + position];
                        let best_here = lift(earliest[stop.index()]);
                        let best_done = lift(best_end.map(|(t, _, _)| t));
                        if call.arrival < best_here.min(best_done) {
                            let new_arrival = call.arrival - departure;
                            labels[round][stop.index()] = Label {
                                arrival: Some(new_arrival),
                                parent: Some(stop_list[boarding_pos]),
                                boarded: Some(CallRef {
                                    route,
                                    index: trip_base + boarding_pos,
                                }),
                            };
                            earliest[stop.index()] = Some(new_arrival);
                            recalculate_end(ends, &earliest, &mut best_end, round);
                            if !marked[stop.index()] {
                                marked[stop.index()] = true;
                                num_marked += 1;
                            }
                        }
                    }

                    // A previous round may have reached this stop before the
                    // held trip departs; try to catch an earlier one here.
                    let prev = labels[round - 1][stop.index()].arrival;
                    let held_departure = boarded
                        .map(|(trip_base, _)| calls[trip_base + position].departure)
                        .unwrap_or(infinity);
                    if lift(prev) <= held_departure
                        && let Some(prev_offset) = prev
                    {
                        let threshold = departure + prev_offset;
                        let caught = routes
                            .trips_from_position(route, position)
                            .find(|(_, call)| {
                                call.departure > threshold && call.service == wanted
                            });
                        if let Some((call_index, _)) = caught {
                            boarded = Some((call_index - position, position));
                        }
                    }
                }
            }

            // Footpath phase. Walks extend rides reached this round; they
            // never extend other walks, and targets are marked on a copy so
            // a walk cannot cascade within the round.
            let mut new_marked = marked.clone();
            for stop_index in 0..num_stops {
                if !marked[stop_index] {
                    continue;
                }
                let stop = StopId::from_index(stop_index);
                for transfer in stops.transfers(stop) {
                    let from = labels[round][stop_index];
                    if from.boarded.is_none() {
                        continue;
                    }
                    let Some(from_arrival) = from.arrival else {
                        continue;
                    };
                    let walking = walk_time(transfer.distance, speed);
                    if walking >= MAX_WALK_TIME {
                        continue;
                    }
                    let with_walk = from_arrival + walking + TRANSFER_PENALTY;
                    let target = transfer.target.index();
                    if labels[round][target]
                        .arrival
                        .is_none_or(|existing| with_walk < existing)
                    {
                        labels[round][target] = Label {
                            arrival: Some(with_walk),
                            parent: Some(stop),
                            boarded: None,
                        };
                        earliest[target] = Some(with_walk);
                        if !new_marked[target] {
                            new_marked[target] = true;
                            num_marked += 1;
                        }
                    }
                }
            }
            recalculate_end(ends, &earliest, &mut best_end, round);
            marked = new_marked;

            debug!(round, marked = num_marked, "round finished");
            if num_marked == 0 {
                // drop the round that changed nothing
                labels.pop();
                break;
            }
            if round >= num_stops {
                warn!(round, "round limit reached, stopping the search");
                break;
            }
        }

        let Some((best_time, end, last_round)) = best_end else {
            return Err(Error::Unreachable);
        };
        debug_assert_eq!(labels[last_round][end.index()].arrival, Some(best_time));
        self.backtrack(&labels, end, last_round)
            .map(|raw| Journey::assemble(raw, departure, routes))
    }

    /// Walks the per-round labels backwards from the best end stop,
    /// emitting visits and boarding calls in reverse order.
    fn backtrack(
        &self,
        labels: &[Vec<Label>],
        end: StopId,
        last_round: usize,
    ) -> Result<Vec<RawItem>, Error> {
        let arrival_of = |label: &Label| label.arrival.ok_or(Error::ReconstructionFailed);
        let mut raw: Vec<RawItem> = Vec::new();

        let end_label = labels[last_round][end.index()];
        raw.push(RawItem::Visit {
            stop: end,
            arrival: arrival_of(&end_label)?,
        });
        let mut prev;
        if let Some(call) = end_label.boarded {
            raw.push(RawItem::Ride(call));
            prev = end_label.parent;
        } else if end_label.parent.is_none() {
            // the destination is one of the starts; nothing was travelled
            return Ok(raw);
        } else {
            // Walked into the destination: emit the stop the walk left
            // from, then continue from that stop's own label.
            let from = end_label.parent.ok_or(Error::ReconstructionFailed)?;
            let from_label = labels[last_round][from.index()];
            raw.push(RawItem::Visit {
                stop: from,
                arrival: arrival_of(&from_label)?,
            });
            if let Some(call) = from_label.boarded {
                raw.push(RawItem::Ride(call));
            }
            prev = from_label.parent;
        }

        for round_labels in labels[..last_round].iter().rev() {
            let current = prev.ok_or(Error::ReconstructionFailed)?;
            let label = round_labels[current.index()];
            raw.push(RawItem::Visit {
                stop: current,
                arrival: arrival_of(&label)?,
            });
            if let Some(call) = label.boarded {
                raw.push(RawItem::Ride(call));
                prev = label.parent;
            } else if let Some(source) = label.parent {
                let source_label = round_labels[source.index()];
                raw.push(RawItem::Visit {
                    stop: source,
                    arrival: arrival_of(&source_label)?,
                });
                if let Some(call) = source_label.boarded {
                    raw.push(RawItem::Ride(call));
                }
                prev = source_label.parent;
            } else {
                prev = None;
            }
        }

        raw.reverse();
        Ok(raw)
    }
}

fn recalculate_end(
    ends: &[StopId],
    earliest: &[Option<Time>],
    best: &mut Option<(Time, StopId, usize)>,
    round: usize,
) {
    for &end in ends {
        if let Some(arrival) = earliest[end.index()]
            && best.is_none_or(|(best_arrival, _, _)| arrival < best_arrival)
        {
            *best = Some((arrival, end, round));
        }
    }
}

#[test]
fn walk_time_scales_with_pace() {
    let km = Distance::from_kilometers(1.0);
    assert_eq!(walk_time(km, WalkingSpeed::Slow).as_seconds(), 1080);
    assert_eq!(walk_time(km, WalkingSpeed::Normal).as_seconds(), 864);
    assert_eq!(walk_time(km, WalkingSpeed::Fast).as_seconds(), 720);
}

#[test]
fn walk_time_rounds_to_whole_seconds() {
    let d = Distance::from_kilometers(0.123);
    // 0.123 * 720 * 1.2 = 106.272
    assert_eq!(walk_time(d, WalkingSpeed::Normal).as_seconds(), 106);
}
