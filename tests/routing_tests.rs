mod common;

use common::{demo_finder, stops_named};
use headway::{
    feed::{Feed, GtfsCalendar, GtfsRoute, GtfsStop, GtfsStopTime, GtfsTrip},
    prelude::*,
    raptor::Error,
};

const FIVE_AM: Time = Time::from_seconds(5 * 3600);

fn endpoints(feed: &Feed, finder: &RouteFinder, from: &str, to: &str) -> (Vec<StopId>, Vec<StopId>) {
    (
        stops_named(feed, finder.registry(), from),
        stops_named(feed, finder.registry(), to),
    )
}

/// Structural checks every reconstructed journey has to pass: visits at both
/// ends, no adjacent rides, every ride flanked by visits, and time moving
/// forward through the whole sequence.
fn assert_well_formed(journey: &Journey) {
    let items = journey.items();
    assert!(matches!(items.first(), Some(JourneyItem::Visit { .. })));
    assert!(matches!(items.last(), Some(JourneyItem::Visit { .. })));
    let mut clock = Time::from_seconds(0);
    for (index, item) in items.iter().enumerate() {
        match *item {
            JourneyItem::Visit { time, .. } => {
                assert!(time >= clock, "time went backwards at item {index}");
                clock = time;
            }
            JourneyItem::Ride {
                boarding,
                alighting,
                ..
            } => {
                assert!(
                    matches!(items.get(index - 1), Some(JourneyItem::Visit { .. })),
                    "ride without a boarding visit at item {index}"
                );
                assert!(
                    matches!(items.get(index + 1), Some(JourneyItem::Visit { .. })),
                    "adjacent rides at item {index}"
                );
                assert!(boarding >= clock);
                assert!(alighting >= boarding);
                clock = boarding;
            }
        }
    }
}

#[test]
fn same_endpoints_are_rejected() {
    let (feed, finder) = demo_finder("FULLW");
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Furnace Creek Resort (Demo)",
        "Furnace Creek Resort (Demo)",
    );
    assert_eq!(
        finder.find(&starts, &ends, FIVE_AM),
        Err(Error::SameEndpoints)
    );
}

#[test]
fn stagecoach_to_bullfrog_boards_the_ab_line() {
    let (feed, finder) = demo_finder("FULLW");
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Stagecoach Hotel & Casino (Demo)",
        "Bullfrog (Demo)",
    );
    let journey = finder.find(&starts, &ends, FIVE_AM).unwrap();
    assert_well_formed(&journey);
    assert_eq!(journey.rides(), 1);

    let Some(JourneyItem::Ride {
        route,
        boarding,
        alighting,
        ..
    }) = journey
        .items()
        .iter()
        .find(|item| matches!(item, JourneyItem::Ride { .. }))
        .copied()
    else {
        panic!("expected a ride");
    };
    let key = finder.registry().route_key(route);
    assert_eq!(&*key.route, "AB");
    assert_eq!(key.direction, Direction::Outbound);
    assert_eq!(boarding, Time::from_seconds(8 * 3600));
    assert_eq!(alighting, Time::from_seconds(8 * 3600 + 600));
    assert!(journey.duration().unwrap() > Time::from_seconds(0));
}

#[test]
fn bullfrog_to_stagecoach_uses_the_opposite_direction() {
    let (feed, finder) = demo_finder("FULLW");
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Bullfrog (Demo)",
        "Stagecoach Hotel & Casino (Demo)",
    );
    let journey = finder.find(&starts, &ends, FIVE_AM).unwrap();
    assert_well_formed(&journey);
    assert_eq!(journey.rides(), 1);
    let Some(JourneyItem::Ride { route, .. }) = journey
        .items()
        .iter()
        .find(|item| matches!(item, JourneyItem::Ride { .. }))
        .copied()
    else {
        panic!("expected a ride");
    };
    let key = finder.registry().route_key(route);
    assert_eq!(&*key.route, "AB");
    assert_eq!(key.direction, Direction::Inbound);
    assert!(journey.duration().unwrap() > Time::from_seconds(0));
}

#[test]
fn amargosa_to_north_ave_changes_at_stagecoach() {
    let (feed, finder) = demo_finder("FULLW");
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Amargosa Valley (Demo)",
        "North Ave / D Ave N (Demo)",
    );
    let journey = finder.find(&starts, &ends, FIVE_AM).unwrap();
    assert_well_formed(&journey);
    assert_eq!(journey.rides(), 2);

    // exactly: visit, ride, connection visit, ride, visit
    let items = journey.items();
    assert_eq!(items.len(), 5);
    let JourneyItem::Visit { stop, .. } = items[2] else {
        panic!("the rides must be separated by the connection stop");
    };
    assert_eq!(
        finder.registry().stop_key(stop),
        "STAGECOACH",
        "the change happens at the shared stop of both lines"
    );
    // arrives with the 8:12 call at North Ave
    assert_eq!(
        journey.arrival().unwrap(),
        Time::from_seconds(8 * 3600 + 12 * 60)
    );
}

#[test]
fn airport_is_unreachable_on_the_weekday_service() {
    let (feed, finder) = demo_finder("FULLW");
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Furnace Creek Resort (Demo)",
        "Nye County Airport (Demo)",
    );
    assert_eq!(finder.find(&starts, &ends, FIVE_AM), Err(Error::Unreachable));
}

#[test]
fn the_weekend_shuttle_reaches_the_airport() {
    let (feed, finder) = demo_finder("WE");
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Stagecoach Hotel & Casino (Demo)",
        "Nye County Airport (Demo)",
    );
    let journey = finder.find(&starts, &ends, FIVE_AM).unwrap();
    assert_well_formed(&journey);
    assert_eq!(journey.rides(), 1);
    assert_eq!(
        journey.arrival().unwrap(),
        Time::from_seconds(6 * 3600 + 20 * 60)
    );

    // while the weekday lines are filtered out entirely
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Stagecoach Hotel & Casino (Demo)",
        "Bullfrog (Demo)",
    );
    assert_eq!(finder.find(&starts, &ends, FIVE_AM), Err(Error::Unreachable));
}

#[test]
fn rides_only_use_the_configured_service() {
    let (feed, finder) = demo_finder("WE");
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Stagecoach Hotel & Casino (Demo)",
        "Nye County Airport (Demo)",
    );
    let journey = finder.find(&starts, &ends, FIVE_AM).unwrap();
    let weekend = finder.registry().service_id("WE").unwrap();
    let timetable = finder.timetable();
    for item in journey.items() {
        if let JourneyItem::Ride { trip, route, .. } = *item {
            let call = timetable
                .routes()
                .stop_times(route)
                .iter()
                .find(|call| call.trip == trip)
                .expect("ride references a call of its route");
            assert_eq!(call.service, weekend);
        }
    }
}

#[test]
fn unknown_service_is_reported_with_its_id() {
    let (_, mut finder) = demo_finder("FULLW");
    assert_eq!(
        finder.set_options(WalkingSpeed::Normal, "DOES_NOT_EXIST"),
        Err(Error::UnknownId("DOES_NOT_EXIST".to_string()))
    );
    // the previously configured service stays in effect
    assert_eq!(finder.options().wanted_service, "FULLW");
}

#[test]
fn searching_without_a_service_fails() {
    let feed = common::demo_feed();
    let finder = RouteFinder::new(&feed).unwrap();
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Stagecoach Hotel & Casino (Demo)",
        "Bullfrog (Demo)",
    );
    assert!(matches!(
        finder.find(&starts, &ends, FIVE_AM),
        Err(Error::UnknownId(_))
    ));
}

#[test]
fn empty_endpoint_sets_are_unreachable() {
    let (feed, finder) = demo_finder("FULLW");
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Stagecoach Hotel & Casino (Demo)",
        "Bullfrog (Demo)",
    );
    assert_eq!(finder.find(&[], &ends, FIVE_AM), Err(Error::Unreachable));
    assert_eq!(finder.find(&starts, &[], FIVE_AM), Err(Error::Unreachable));
}

#[test]
fn identical_queries_return_identical_journeys() {
    let (feed, finder) = demo_finder("FULLW");
    let (starts, ends) = endpoints(
        &feed,
        &finder,
        "Amargosa Valley (Demo)",
        "E Main St / S Irving St (Demo)",
    );
    let first = finder.find(&starts, &ends, FIVE_AM).unwrap();
    let second = finder.find(&starts, &ends, FIVE_AM).unwrap();
    assert_eq!(first, second);
}

#[test]
fn an_empty_feed_is_not_ready() {
    let feed = Feed::from_parts(vec![], vec![], vec![], vec![], vec![]);
    assert!(matches!(RouteFinder::new(&feed), Err(Error::FeedNotReady)));
}

// ---- synthetic network helpers ----------------------------------------

fn stop(id: &str, name: &str, lat: f64, lon: f64) -> GtfsStop {
    GtfsStop {
        stop_id: id.into(),
        stop_name: name.into(),
        stop_lat: lat,
        stop_lon: lon,
    }
}

fn route(id: &str) -> GtfsRoute {
    GtfsRoute {
        route_id: id.into(),
        route_short_name: id.into(),
    }
}

fn trip(route_id: &str, trip_id: &str) -> GtfsTrip {
    GtfsTrip {
        route_id: route_id.into(),
        service_id: "WK".into(),
        trip_id: trip_id.into(),
        direction_id: Some(0),
    }
}

fn call(trip_id: &str, at: &str, stop_id: &str, sequence: u32) -> GtfsStopTime {
    GtfsStopTime {
        trip_id: trip_id.into(),
        arrival_time: Time::from_hms(at).unwrap(),
        departure_time: Time::from_hms(at).unwrap(),
        stop_id: stop_id.into(),
        stop_sequence: sequence,
    }
}

fn weekday_calendar() -> Vec<GtfsCalendar> {
    vec![GtfsCalendar {
        service_id: "WK".into(),
        monday: 1,
        tuesday: 1,
        wednesday: 1,
        thursday: 1,
        friday: 1,
        saturday: 0,
        sunday: 0,
        start_date: "20070101".into(),
        end_date: "20101231".into(),
    }]
}

/// Two disconnected lines whose inner terminals are half a kilometer
/// apart; only a walk bridges them.
fn walking_feed() -> Feed {
    Feed::from_parts(
        vec![
            stop("WA", "Alder Yard", 35.95, -116.0),
            stop("WB", "Birch Gate", 36.0, -116.0),
            stop("WC", "Cedar Park", 36.004496, -116.0),
            stop("WD", "Dogwood Halt", 36.004496, -115.985),
        ],
        vec![route("R1"), route("R2")],
        vec![trip("R1", "T1"), trip("R2", "T2")],
        vec![
            call("T1", "8:00:00", "WA", 1),
            call("T1", "8:10:00", "WB", 2),
            call("T2", "8:30:00", "WC", 1),
            call("T2", "8:45:00", "WD", 2),
        ],
        weekday_calendar(),
    )
}

fn walking_finder() -> RouteFinder {
    let feed = walking_feed();
    let mut finder = RouteFinder::new(&feed).unwrap();
    finder.set_options(WalkingSpeed::Normal, "WK").unwrap();
    finder
}

#[test]
fn a_walk_bridges_the_two_lines() {
    let finder = walking_finder();
    let registry = finder.registry();
    let starts = vec![registry.stop_id("WA").unwrap()];
    let ends = vec![registry.stop_id("WD").unwrap()];
    let journey = finder
        .find(&starts, &ends, Time::parse_hhmm("7:50").unwrap())
        .unwrap();
    assert_well_formed(&journey);
    assert_eq!(journey.rides(), 2);

    // visit, ride, visit, walked visit, ride, visit
    let items = journey.items();
    assert_eq!(items.len(), 6);
    let (JourneyItem::Visit { stop: off, time: reached }, JourneyItem::Visit { stop: on, time: left }) =
        (items[2], items[3])
    else {
        panic!("the walk must show up as two adjacent visits");
    };
    assert_eq!(registry.stop_key(off), "WB");
    assert_eq!(registry.stop_key(on), "WC");
    // 500 m at 5 km/h with the detour factor, plus the change penalty
    assert_eq!(left - reached, Time::from_seconds(432 + 60));
}

#[test]
fn a_final_walk_is_part_of_the_journey() {
    let finder = walking_finder();
    let registry = finder.registry();
    let starts = vec![registry.stop_id("WA").unwrap()];
    let ends = vec![registry.stop_id("WC").unwrap()];
    let journey = finder
        .find(&starts, &ends, Time::parse_hhmm("7:50").unwrap())
        .unwrap();
    assert_well_formed(&journey);
    assert_eq!(journey.rides(), 1);
    let items = journey.items();
    assert_eq!(items.len(), 4);
    assert!(matches!(items[2], JourneyItem::Visit { .. }));
    let JourneyItem::Visit { stop, .. } = items[3] else {
        panic!("journey must end in a visit");
    };
    assert_eq!(registry.stop_key(stop), "WC");
}

#[test]
fn no_journey_starts_with_a_walk() {
    // WB is walkable from WC, but a walk may only extend a ride, so the
    // only way out of WC is the 8:30 departure.
    let finder = walking_finder();
    let registry = finder.registry();
    let starts = vec![registry.stop_id("WC").unwrap()];
    let ends = vec![registry.stop_id("WD").unwrap()];
    let journey = finder
        .find(&starts, &ends, Time::parse_hhmm("7:00").unwrap())
        .unwrap();
    assert_eq!(journey.rides(), 1);
    assert_eq!(journey.items().len(), 3);
}

#[test]
fn journeys_roll_over_midnight() {
    let feed = Feed::from_parts(
        vec![
            stop("MA", "Mesa Corner", 36.0, -116.0),
            stop("MB", "Mesquite Flats", 36.2, -116.0),
        ],
        vec![route("NR")],
        vec![trip("NR", "N1")],
        vec![
            call("N1", "23:50:00", "MA", 1),
            call("N1", "24:10:00", "MB", 2),
        ],
        weekday_calendar(),
    );
    let mut finder = RouteFinder::new(&feed).unwrap();
    finder.set_options(WalkingSpeed::Normal, "WK").unwrap();
    let registry = finder.registry();
    let starts = vec![registry.stop_id("MA").unwrap()];
    let ends = vec![registry.stop_id("MB").unwrap()];
    let journey = finder
        .find(&starts, &ends, Time::parse_hhmm("23:45").unwrap())
        .unwrap();
    assert_well_formed(&journey);
    let arrival = journey.arrival().unwrap();
    assert_eq!(arrival.as_seconds(), 24 * 3600 + 600);
    assert_eq!(arrival.to_string(), "0:10:00 the next day");
}

#[test]
fn a_connection_after_midnight_boards_the_right_trip() {
    // Boarding the first ride before midnight leaves the second round with
    // an offset reaching past the day boundary. The connecting route also
    // runs an early-morning working; its departure sits before the
    // traveller's position in raw seconds, so it must not be caught.
    let feed = Feed::from_parts(
        vec![
            stop("XA", "Juniper Road", 36.0, -116.0),
            stop("XB", "Kiln Crossing", 36.05, -116.0),
            stop("XC", "Larkspur End", 36.10, -116.0),
        ],
        vec![route("PR"), route("QR")],
        vec![trip("PR", "P1"), trip("QR", "Q0"), trip("QR", "Q1")],
        vec![
            call("P1", "23:40:00", "XA", 1),
            call("P1", "24:05:00", "XB", 2),
            call("Q0", "0:20:00", "XB", 1),
            call("Q0", "0:40:00", "XC", 2),
            call("Q1", "24:30:00", "XB", 1),
            call("Q1", "24:50:00", "XC", 2),
        ],
        weekday_calendar(),
    );
    let mut finder = RouteFinder::new(&feed).unwrap();
    finder.set_options(WalkingSpeed::Normal, "WK").unwrap();
    let registry = finder.registry();
    let starts = vec![registry.stop_id("XA").unwrap()];
    let ends = vec![registry.stop_id("XC").unwrap()];
    let journey = finder
        .find(&starts, &ends, Time::parse_hhmm("23:30").unwrap())
        .unwrap();
    assert_well_formed(&journey);
    assert_eq!(journey.rides(), 2);

    let rides: Vec<_> = journey
        .items()
        .iter()
        .filter_map(|item| match *item {
            JourneyItem::Ride { trip, boarding, .. } => Some((trip, boarding)),
            JourneyItem::Visit { .. } => None,
        })
        .collect();
    assert_eq!(rides[0].0, registry.trip_id("P1").unwrap());
    // the 0:20 working already left; the connection is the 24:30 one
    assert_eq!(rides[1].0, registry.trip_id("Q1").unwrap());
    assert_eq!(rides[1].1.as_seconds(), 24 * 3600 + 30 * 60);
    let arrival = journey.arrival().unwrap();
    assert_eq!(arrival.as_seconds(), 24 * 3600 + 50 * 60);
    assert_eq!(arrival.to_string(), "0:50:00 the next day");
}
