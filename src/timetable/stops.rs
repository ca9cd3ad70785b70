use crate::{
    registry::{DenseId, RouteId, StopId},
    shared::Distance,
};

/// A footpath to a nearby stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    pub target: StopId,
    pub distance: Distance,
}

/// Flat per-stop view of the network: which routes call at a stop, and which
/// stops are close enough to walk to.
///
/// Layout mirrors [`super::RouteIndex`]: two packed buffers plus an offset
/// directory with a closing entry, ranges are
/// `directory[s]..directory[s + 1]`. Both the incident routes and the
/// transfers of a stop are sorted ascending and free of duplicates;
/// transfers are symmetric and never point back at their own stop.
#[derive(Debug)]
pub struct StopIndex {
    directory: Box<[(usize, usize)]>,
    stop_routes: Box<[RouteId]>,
    transfers: Box<[Transfer]>,
}

impl StopIndex {
    pub(crate) fn new(
        directory: Vec<(usize, usize)>,
        stop_routes: Vec<RouteId>,
        transfers: Vec<Transfer>,
    ) -> Self {
        debug_assert!(!directory.is_empty());
        debug_assert_eq!(directory.last(), Some(&(stop_routes.len(), transfers.len())));
        Self {
            directory: directory.into_boxed_slice(),
            stop_routes: stop_routes.into_boxed_slice(),
            transfers: transfers.into_boxed_slice(),
        }
    }

    /// Number of stops covered by the index.
    pub fn len(&self) -> usize {
        self.directory.len() - 1
    }

    /// All stop ids in dense order.
    pub fn stop_ids(&self) -> impl Iterator<Item = StopId> {
        (0..self.len()).map(StopId::from_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The routes calling at `stop`, ascending.
    pub fn routes(&self, stop: StopId) -> &[RouteId] {
        let start = self.directory[stop.index()].0;
        let end = self.directory[stop.index() + 1].0;
        &self.stop_routes[start..end]
    }

    /// The footpaths leaving `stop`, ascending by target.
    pub fn transfers(&self, stop: StopId) -> &[Transfer] {
        let start = self.directory[stop.index()].1;
        let end = self.directory[stop.index() + 1].1;
        &self.transfers[start..end]
    }
}
