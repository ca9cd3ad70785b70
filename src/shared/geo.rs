use std::{cmp, ops::Add};

use serde::Deserialize;

/// A distance between two points on the network, stored in kilometers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Distance(f64);

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Add for Distance {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Distance {
    pub const fn from_kilometers(distance: f64) -> Self {
        Self(distance)
    }

    pub const fn from_meters(distance: f64) -> Self {
        Self(distance / 1000.0)
    }

    pub const fn as_kilometers(&self) -> f64 {
        self.0
    }

    pub const fn as_meters(&self) -> f64 {
        self.0 * 1000.0
    }
}

/// A WGS84 position, as published in `stops.txt`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Coordinate {
    /// Great-circle distance by the haversine formula.
    pub fn great_circle(&self, other: &Self) -> Distance {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let dist_lat = f64::to_radians(other.latitude - self.latitude);
        let dist_lon = f64::to_radians(other.longitude - self.longitude);
        let a = f64::powi(f64::sin(dist_lat / 2.0), 2)
            + f64::cos(f64::to_radians(self.latitude))
                * f64::cos(f64::to_radians(other.latitude))
                * f64::powi(f64::sin(dist_lon / 2.0), 2);
        let c = 2.0 * f64::atan2(f64::sqrt(a), f64::sqrt(1.0 - a));
        Distance::from_kilometers(EARTH_RADIUS_KM * c)
    }
}

#[test]
fn great_circle_paris_london() {
    let paris = Coordinate::from((48.85800943005911, 2.3514350059357927));
    let london = Coordinate::from((51.5052389927712, -0.12495407345099824));
    let d = paris.great_circle(&london);
    assert!((d.as_kilometers() - 343.0).abs() < 2.0);
}

#[test]
fn great_circle_zero_for_same_point() {
    let p = Coordinate::from((36.915682, -116.751677));
    assert!(p.great_circle(&p).as_kilometers() < 1e-9);
}

#[test]
fn distance_unit_conversions() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(1.0);
    assert_eq!(dist_a, dist_b);
    assert_eq!(dist_b.as_meters(), 1000.0);
}

#[test]
fn distance_ordering() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(0.5);
    assert!(dist_a > dist_b);
}
