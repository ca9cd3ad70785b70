use std::{fmt, sync::Arc};

/// Implemented by the dense index types handed out by the registry.
pub(crate) trait DenseId: Copy {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl DenseId for $name {
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl $name {
            /// Position of this id in the dense 0..count space.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type! {
    /// Dense index of a stop.
    StopId
}

id_type! {
    /// Dense index of one direction of a GTFS route.
    RouteId
}

id_type! {
    /// Dense index of a trip.
    TripId
}

id_type! {
    /// Dense index of a calendar service.
    ServiceId
}

/// Which of the two `direction_id` bits a trip carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Outbound, Direction::Inbound];

    /// Maps a GTFS `direction_id`. Missing values count as outbound, any
    /// non-zero bit as inbound.
    pub fn from_gtfs(bit: Option<u8>) -> Self {
        match bit {
            None | Some(0) => Direction::Outbound,
            Some(_) => Direction::Inbound,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => write!(f, "outbound"),
            Direction::Inbound => write!(f, "inbound"),
        }
    }
}

/// External key of an internal route: the GTFS route id plus a direction.
///
/// Every GTFS route registers under both directions, so the internal route
/// space is twice the size of the feed's `routes.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub route: Arc<str>,
    pub direction: Direction,
}

impl RouteKey {
    pub fn new(route: impl Into<Arc<str>>, direction: Direction) -> Self {
        Self {
            route: route.into(),
            direction,
        }
    }
}

#[test]
fn direction_from_gtfs_bit() {
    assert_eq!(Direction::from_gtfs(None), Direction::Outbound);
    assert_eq!(Direction::from_gtfs(Some(0)), Direction::Outbound);
    assert_eq!(Direction::from_gtfs(Some(1)), Direction::Inbound);
}

#[test]
fn route_keys_distinguish_directions() {
    let out = RouteKey::new("AB", Direction::Outbound);
    let back = RouteKey::new("AB", Direction::Inbound);
    assert_ne!(out, back);
    assert_eq!(out, RouteKey::new("AB", Direction::Outbound));
}
