use serde::{Deserialize, Deserializer};

use crate::shared::Time;

fn gtfs_time<'de, D>(deserializer: D) -> Result<Time, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Time::from_hms(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid GTFS time '{raw}'")))
}

/// One row of `stops.txt`.
#[derive(Debug, Clone, Deserialize)]
pub struct GtfsStop {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

/// One row of `routes.txt`.
#[derive(Debug, Clone, Deserialize)]
pub struct GtfsRoute {
    pub route_id: String,
    #[serde(default)]
    pub route_short_name: String,
}

/// One row of `trips.txt`.
#[derive(Debug, Clone, Deserialize)]
pub struct GtfsTrip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub direction_id: Option<u8>,
}

/// One row of `stop_times.txt`. Times are parsed while loading, so a feed
/// with malformed timestamps is rejected up front.
#[derive(Debug, Clone, Deserialize)]
pub struct GtfsStopTime {
    pub trip_id: String,
    #[serde(deserialize_with = "gtfs_time")]
    pub arrival_time: Time,
    #[serde(deserialize_with = "gtfs_time")]
    pub departure_time: Time,
    pub stop_id: String,
    pub stop_sequence: u32,
}

/// One row of `calendar.txt`.
#[derive(Debug, Clone, Deserialize)]
pub struct GtfsCalendar {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
    pub start_date: String,
    pub end_date: String,
}

impl GtfsCalendar {
    /// The weekday bits in GTFS column order.
    pub fn weekdays(&self) -> [u8; 7] {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
    }
}
