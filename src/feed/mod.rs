use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;
use zip::ZipArchive;

mod models;
pub use models::*;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Could not find table '{0}' in the feed")]
    FileNotFound(String),
}

/// File names of the tables a feed is read from. Agencies occasionally ship
/// renamed tables, so these can be overridden.
pub struct Config {
    pub stops_file_name: String,
    pub routes_file_name: String,
    pub trips_file_name: String,
    pub stop_times_file_name: String,
    pub calendar_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stops_file_name: "stops.txt".into(),
            routes_file_name: "routes.txt".into(),
            trips_file_name: "trips.txt".into(),
            stop_times_file_name: "stop_times.txt".into(),
            calendar_file_name: "calendar.txt".into(),
        }
    }
}

/// The parsed tables of a GTFS feed.
///
/// This is purely a container: it owns the typed records and answers simple
/// lookups. Everything the router needs is derived from it once, by the
/// timetable build.
#[derive(Debug, Default)]
pub struct Feed {
    stops: Vec<GtfsStop>,
    routes: Vec<GtfsRoute>,
    trips: Vec<GtfsTrip>,
    stop_times: Vec<GtfsStopTime>,
    calendar: Vec<GtfsCalendar>,
}

impl Feed {
    /// Reads a feed from a directory of `.txt` tables.
    pub fn from_dir<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_dir_with(path, &Config::default())
    }

    pub fn from_dir_with<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self, Error> {
        let dir = path.as_ref();
        let open = |name: &str| -> Result<File, Error> {
            File::open(dir.join(name)).map_err(|_| Error::FileNotFound(name.to_string()))
        };
        let feed = Self {
            stops: parse_csv(open(&config.stops_file_name)?)?,
            routes: parse_csv(open(&config.routes_file_name)?)?,
            trips: parse_csv(open(&config.trips_file_name)?)?,
            stop_times: parse_csv(open(&config.stop_times_file_name)?)?,
            calendar: parse_csv(open(&config.calendar_file_name)?)?,
        };
        feed.log_summary();
        Ok(feed)
    }

    /// Reads a feed from a `.zip` archive.
    pub fn from_zip<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_zip_with(path, &Config::default())
    }

    pub fn from_zip_with<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self, Error> {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        let mut feed = Self::default();
        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            let name = file.name().to_string();
            match name {
                val if val == config.stops_file_name => feed.stops = parse_csv(file)?,
                val if val == config.routes_file_name => feed.routes = parse_csv(file)?,
                val if val == config.trips_file_name => feed.trips = parse_csv(file)?,
                val if val == config.stop_times_file_name => feed.stop_times = parse_csv(file)?,
                val if val == config.calendar_file_name => feed.calendar = parse_csv(file)?,
                _ => (),
            }
        }
        for (table, name) in [
            (feed.stops.is_empty(), &config.stops_file_name),
            (feed.routes.is_empty(), &config.routes_file_name),
            (feed.trips.is_empty(), &config.trips_file_name),
            (feed.stop_times.is_empty(), &config.stop_times_file_name),
            (feed.calendar.is_empty(), &config.calendar_file_name),
        ] {
            if table {
                return Err(Error::FileNotFound(name.to_string()));
            }
        }
        feed.log_summary();
        Ok(feed)
    }

    /// Builds a feed from records already in memory. Embedders that parse
    /// their own tables hand them over here.
    pub fn from_parts(
        stops: Vec<GtfsStop>,
        routes: Vec<GtfsRoute>,
        trips: Vec<GtfsTrip>,
        stop_times: Vec<GtfsStopTime>,
        calendar: Vec<GtfsCalendar>,
    ) -> Self {
        Self {
            stops,
            routes,
            trips,
            stop_times,
            calendar,
        }
    }

    pub fn stops(&self) -> &[GtfsStop] {
        &self.stops
    }

    pub fn routes(&self) -> &[GtfsRoute] {
        &self.routes
    }

    pub fn trips(&self) -> &[GtfsTrip] {
        &self.trips
    }

    pub fn stop_times(&self) -> &[GtfsStopTime] {
        &self.stop_times
    }

    pub fn calendar(&self) -> &[GtfsCalendar] {
        &self.calendar
    }

    pub fn stop(&self, id: &str) -> Option<&GtfsStop> {
        self.stops.iter().find(|stop| stop.stop_id == id)
    }

    pub fn route(&self, id: &str) -> Option<&GtfsRoute> {
        self.routes.iter().find(|route| route.route_id == id)
    }

    pub fn trip(&self, id: &str) -> Option<&GtfsTrip> {
        self.trips.iter().find(|trip| trip.trip_id == id)
    }

    pub fn service(&self, id: &str) -> Option<&GtfsCalendar> {
        self.calendar.iter().find(|entry| entry.service_id == id)
    }

    fn log_summary(&self) {
        info!(
            stops = self.stops.len(),
            routes = self.routes.len(),
            trips = self.trips.len(),
            stop_times = self.stop_times.len(),
            services = self.calendar.len(),
            "feed loaded"
        );
    }
}

fn parse_csv<T, R>(reader: R) -> Result<Vec<T>, Error>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}
