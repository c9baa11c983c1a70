// Neighbor table and adjacency state machine.

use std::time::Instant;

use log::info;

use crate::packet::{Lsa, RouterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborState {
    Down,
    Init,
    Exchange,
    Full,
}

impl std::fmt::Display for NeighborState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NeighborState::Down => "Down",
            NeighborState::Init => "Init",
            NeighborState::Exchange => "Exchange",
            NeighborState::Full => "Full",
        };
        write!(f, "{}", label)
    }
}

/// A summary of a peer's LSDB, as last advertised in a DBD.
#[derive(Debug, Clone)]
pub struct DatabaseDescription {
    pub sequence: u32,
    pub lsas: Vec<Lsa>,
}

#[derive(Debug, Clone)]
pub struct Neighbor {
    pub router_id: RouterId,
    pub cost: u32,
    pub state: NeighborState,
    pub last_dbd: Option<DatabaseDescription>,
    pub last_seen: Instant,
}

impl Neighbor {
    pub fn new(router_id: RouterId, cost: u32) -> Self {
        Self {
            router_id,
            cost,
            state: NeighborState::Down,
            last_dbd: None,
            last_seen: Instant::now(),
        }
    }

    pub fn set_state(&mut self, new_state: NeighborState) {
        if self.state != new_state {
            info!("Neighbor {} state set to {}", self.router_id, new_state);
            self.state = new_state;
        }
    }
}

/// The router's list of configured adjacencies. A plain `Vec` matches the
/// small, dense range of router identifiers (1..=99) and the reference
/// implementation's own list-based neighbor table.
#[derive(Debug, Default)]
pub struct NeighborTable {
    neighbors: Vec<Neighbor>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self {
            neighbors: Vec::new(),
        }
    }

    pub fn add(&mut self, router_id: RouterId, cost: u32) {
        self.neighbors.push(Neighbor::new(router_id, cost));
        info!("add neighbor {} {}", router_id, cost);
    }

    pub fn remove(&mut self, router_id: RouterId) -> bool {
        let before = self.neighbors.len();
        self.neighbors.retain(|n| n.router_id != router_id);
        if self.neighbors.len() != before {
            info!("remove neighbor {}", router_id);
            true
        } else {
            false
        }
    }

    pub fn find(&self, router_id: RouterId) -> Option<&Neighbor> {
        self.neighbors.iter().find(|n| n.router_id == router_id)
    }

    pub fn find_mut(&mut self, router_id: RouterId) -> Option<&mut Neighbor> {
        self.neighbors.iter_mut().find(|n| n.router_id == router_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Neighbor> {
        self.neighbors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Neighbor> {
        self.neighbors.iter_mut()
    }

    pub fn any_full(&self) -> bool {
        self.neighbors.iter().any(|n| n.state == NeighborState::Full)
    }

    pub fn full_router_ids(&self) -> Vec<RouterId> {
        self.neighbors
            .iter()
            .filter(|n| n.state == NeighborState::Full)
            .map(|n| n.router_id)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_find() {
        let mut table = NeighborTable::new();
        table.add(2, 10);
        let neighbor = table.find(2).unwrap();
        assert_eq!(neighbor.cost, 10);
        assert_eq!(neighbor.state, NeighborState::Down);
    }

    #[test]
    fn remove_drops_neighbor() {
        let mut table = NeighborTable::new();
        table.add(2, 10);
        assert!(table.remove(2));
        assert!(table.find(2).is_none());
        assert!(!table.remove(2));
    }

    #[test]
    fn any_full_tracks_state() {
        let mut table = NeighborTable::new();
        table.add(2, 10);
        assert!(!table.any_full());
        table.find_mut(2).unwrap().set_state(NeighborState::Full);
        assert!(table.any_full());
        assert_eq!(table.full_router_ids(), vec![2]);
    }
}
