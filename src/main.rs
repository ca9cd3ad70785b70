use std::io::{self, BufRead, Write};

use tracing_subscriber::EnvFilter;

use headway::{
    feed::Feed,
    prelude::*,
    raptor,
    shared::time::InvalidTime,
};

const TERM_NAME: &str = "(hw)";
const PAD: &str = "  ";

enum Command {
    FindRoute(Vec<String>),
    Help,
    ListStops(Vec<String>),
    Quit,
    Nop,
    Unrecognized,
    SetOptions(Vec<String>),
    ListServices,
}

fn main() {
    init_logger();
    println!("Headway");
    println!("Finds the fastest connection between a start and an end stop of a GTFS feed.");
    println!("Specify the path to a feed: a directory with .txt tables or a .zip archive.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let Some((feed, mut finder)) = load_feed(&mut lines) else {
        return;
    };

    println!("Feed OK. You may enter your queries now.");
    println!("Type 'h' or 'help' to show the query syntax.");
    loop {
        print!("{TERM_NAME} ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            return;
        };
        match parse_line(&line) {
            Command::FindRoute(args) => find_route(&args, &finder, &feed),
            Command::Help => print_help(),
            Command::ListStops(args) => list_stops(&args, &feed),
            Command::ListServices => list_services(&feed),
            Command::SetOptions(args) => set_options(&args, &mut finder),
            Command::Nop => (),
            Command::Quit => return,
            Command::Unrecognized => println!("Undefined command. Try 'help'."),
        }
    }
}

fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_feed(
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Option<(Feed, RouteFinder)> {
    loop {
        print!("{TERM_NAME} ");
        let _ = io::stdout().flush();
        let path = match lines.next()? {
            Ok(line) => line.trim().to_string(),
            Err(_) => return None,
        };
        if path.is_empty() {
            continue;
        }
        println!("Parsing feed, this step could take a while...");
        let loaded = if path.ends_with(".zip") {
            Feed::from_zip(&path)
        } else {
            Feed::from_dir(&path)
        };
        let feed = match loaded {
            Ok(feed) => feed,
            Err(err) => {
                eprintln!("Invalid feed ({err}), enter a path again...");
                continue;
            }
        };
        println!("Generating the routing data structures...");
        match RouteFinder::new(&feed) {
            Ok(finder) => return Some((feed, finder)),
            Err(err) => {
                eprintln!("Could not build the timetable ({err}), enter a path again...");
            }
        }
    }
}

fn parse_line(line: &str) -> Command {
    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim_end();
    let words = |rest: &str| -> Vec<String> {
        rest.split_whitespace().map(String::from).collect()
    };
    match command {
        "" => Command::Nop,
        "fr" | "findroute" => {
            let args = if rest.is_empty() {
                Vec::new()
            } else {
                rest.split('-').map(String::from).collect()
            };
            Command::FindRoute(args)
        }
        "h" | "help" => Command::Help,
        "ls" | "liststops" => Command::ListStops(words(rest)),
        "q" | "quit" => Command::Quit,
        "s" | "set" => Command::SetOptions(words(rest)),
        "ser" | "services" => Command::ListServices,
        _ => Command::Unrecognized,
    }
}

/// All stops wearing exactly this name; feeds reuse one public name for
/// several platforms, so a query fans out over all of them.
fn stops_by_name(name: &str, feed: &Feed, registry: &Registry) -> Vec<StopId> {
    feed.stops()
        .iter()
        .filter(|stop| stop.stop_name == name)
        .filter_map(|stop| registry.stop_id(&stop.stop_id).ok())
        .collect()
}

fn find_route(args: &[String], finder: &RouteFinder, feed: &Feed) {
    if args.len() < 2 {
        println!("Missing arguments for 'findroute' command!");
        return;
    }
    if args.len() > 3 {
        println!("Provided too many arguments for 'findroute' command!");
        return;
    }
    let starts = stops_by_name(args[0].trim(), feed, finder.registry());
    if starts.is_empty() {
        println!("Unrecognized start stop '{}'!", args[0].trim());
        return;
    }
    let ends = stops_by_name(args[1].trim(), feed, finder.registry());
    if ends.is_empty() {
        println!("Unrecognized end stop '{}'!", args[1].trim());
        return;
    }
    let departure = match args.get(2) {
        Some(raw) => match Time::parse_hhmm(raw.trim()) {
            Ok(time) => time,
            Err(InvalidTime(_)) => {
                println!("Invalid departure time!");
                return;
            }
        },
        None => Time::now(),
    };
    match finder.find(&starts, &ends, departure) {
        Ok(journey) => print_journey(&journey, finder, feed),
        Err(raptor::Error::UnknownId(id)) => {
            println!("Service with id '{id}' is not in feed!");
            println!("Please set another service id using the command 'set'");
        }
        Err(err) => println!("{err}"),
    }
}

fn stop_name<'a>(stop: StopId, finder: &'a RouteFinder, feed: &'a Feed) -> &'a str {
    let key = finder.registry().stop_key(stop);
    feed.stop(key).map(|s| s.stop_name.as_str()).unwrap_or(key)
}

fn line_name<'a>(route: RouteId, finder: &'a RouteFinder, feed: &'a Feed) -> &'a str {
    let key = finder.registry().route_key(route);
    feed.route(&key.route)
        .map(|r| r.route_short_name.as_str())
        .unwrap_or(&key.route)
}

fn print_journey(journey: &Journey, finder: &RouteFinder, feed: &Feed) {
    let items = journey.items();
    let Some(JourneyItem::Visit { stop, time }) = items.first() else {
        return;
    };
    println!(
        "{PAD}Begin on stop '{}' at {}",
        stop_name(*stop, finder, feed),
        time
    );
    // None while riding; set to the last visit otherwise
    let mut prev_visit = Some(*time);
    let mut prev_boarding = None;
    let middle = if items.len() > 1 {
        &items[1..items.len() - 1]
    } else {
        &[][..]
    };
    for item in middle {
        match item {
            JourneyItem::Ride {
                route, boarding, ..
            } => {
                let wait = *boarding - prev_visit.unwrap_or(*boarding);
                println!("{PAD}Wait for {} minutes", wait.as_seconds() / 60);
                println!(
                    "{PAD}Board line {} at {}",
                    line_name(*route, finder, feed),
                    boarding
                );
                prev_visit = None;
                prev_boarding = Some(*boarding);
            }
            JourneyItem::Visit { stop, time } => {
                if let Some(prev) = prev_visit {
                    println!(
                        "{PAD}Walk for {} minutes to stop {}",
                        (*time - prev).as_seconds() / 60,
                        stop_name(*stop, finder, feed)
                    );
                } else if let Some(boarding) = prev_boarding {
                    println!(
                        "{PAD}Get off at stop {} after {} minutes at {}",
                        stop_name(*stop, finder, feed),
                        (*time - boarding).as_seconds() / 60,
                        time
                    );
                }
                prev_visit = Some(*time);
                prev_boarding = None;
            }
        }
    }
    if let Some(JourneyItem::Visit { stop, time }) = items.last() {
        if items.len() > 1 {
            if let Some(prev) = prev_visit {
                println!(
                    "{PAD}Walk for {} minutes to stop {}",
                    (*time - prev).as_seconds() / 60,
                    stop_name(*stop, finder, feed)
                );
            } else if let Some(boarding) = prev_boarding {
                println!(
                    "{PAD}Get off at stop {} after {} minutes at {}",
                    stop_name(*stop, finder, feed),
                    (*time - boarding).as_seconds() / 60,
                    time
                );
            }
        }
        println!(
            "{PAD}You have arrived to your destination {} at {}",
            stop_name(*stop, finder, feed),
            time
        );
    }
}

fn print_help() {
    println!("{PAD}Usage...");
    println!("{PAD}At startup you need to type the path to a GTFS feed (directory or .zip).");
    println!();
    println!("{PAD}Commands... 'name'|'alias' (arguments)");
    println!(
        "{PAD}'findroute'|'fr' (start stop - end stop - departure time hh:mm) --- Find a \
         route between the stops leaving at the departure time, or now when the time is \
         omitted. Arguments are separated by '-'."
    );
    println!("{PAD}'help'|'h' --- Prints this help message.");
    println!(
        "{PAD}'liststops'|'ls' (optional: prefix) --- List all stops in the feed, or the \
         ones starting with the prefix."
    );
    println!("{PAD}'quit'|'q' --- Exits.");
    println!(
        "{PAD}'set'|'s' (walking speed - 'Fast'|'Normal'|'Slow', service id) --- Sets the \
         preferred walking speed and which service's trips to use. An empty service id \
         keeps the current one."
    );
    println!("{PAD}'services'|'ser' --- Print a list of all services in the feed.");
}

fn list_stops(args: &[String], feed: &Feed) {
    if args.len() > 1 {
        println!("Provided too many arguments for 'liststops' command!");
        return;
    }
    println!("Stops in feed...");
    let prefix = args.first().map(String::as_str).unwrap_or("");
    let mut seen = std::collections::HashSet::new();
    for stop in feed.stops() {
        if !seen.insert(stop.stop_name.as_str()) {
            continue;
        }
        if prefix.is_empty() || stop.stop_name.starts_with(prefix) {
            println!(" - {}", stop.stop_name);
        }
    }
}

fn list_services(feed: &Feed) {
    println!("Services in feed...");
    for service in feed.calendar() {
        println!(" - {}", service.service_id);
    }
}

fn set_options(args: &[String], finder: &mut RouteFinder) {
    if args.is_empty() {
        println!("Missing arguments for 'set' command!");
        return;
    }
    if args.len() > 2 {
        println!("Provided too many arguments for 'set' command!");
        return;
    }
    let speed = match args[0].as_str() {
        "Slow" => WalkingSpeed::Slow,
        "Normal" => WalkingSpeed::Normal,
        "Fast" => WalkingSpeed::Fast,
        _ => {
            println!("Unrecognized walking speed");
            println!("Options not set");
            return;
        }
    };
    let service = args.get(1).map(String::as_str).unwrap_or("");
    match finder.set_options(speed, service) {
        Ok(()) => println!("Options set"),
        Err(raptor::Error::UnknownId(id)) => {
            println!("Service with id '{id}' is not in feed!");
            println!("Options not set");
        }
        Err(err) => {
            println!("{err}");
            println!("Options not set");
        }
    }
}
