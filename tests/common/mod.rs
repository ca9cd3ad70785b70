use headway::prelude::*;

/// Loads the bundled demo feed: nine desert stops, five lines, a weekday
/// and a weekend service.
pub fn demo_feed() -> Feed {
    let dir = format!("{}/tests/data/gtfs-demo", env!("CARGO_MANIFEST_DIR"));
    Feed::from_dir(dir).expect("demo feed should load")
}

/// A finder over the demo feed, configured for `service` at normal pace.
#[allow(dead_code)]
pub fn demo_finder(service: &str) -> (Feed, RouteFinder) {
    let feed = demo_feed();
    let mut finder = RouteFinder::new(&feed).expect("demo feed should index");
    finder
        .set_options(WalkingSpeed::Normal, service)
        .expect("service should exist");
    (feed, finder)
}

/// All stops carrying exactly this public name.
#[allow(dead_code)]
pub fn stops_named(feed: &Feed, registry: &Registry, name: &str) -> Vec<StopId> {
    feed.stops()
        .iter()
        .filter(|stop| stop.stop_name == name)
        .map(|stop| registry.stop_id(&stop.stop_id).expect("stop is registered"))
        .collect()
}
