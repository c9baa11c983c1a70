// Merged static + dynamic routing table with typed precedence.

use log::info;

use crate::packet::RouterId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RouteType {
    // Ord derive makes Static sort before Ospf, matching "Static first".
    Static,
    Ospf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTableEntry {
    pub destination: RouterId,
    pub next_hop: RouterId,
    pub cost: u32,
    pub route_type: RouteType,
}

impl RoutingTableEntry {
    pub fn new(destination: RouterId, next_hop: RouterId, cost: u32, route_type: RouteType) -> Self {
        Self {
            destination,
            next_hop,
            cost,
            route_type,
        }
    }
}

#[derive(Debug, Default)]
pub struct RoutingTable {
    entries: Vec<RoutingTableEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Replaces every entry of `route_type` with `new_entries`, logging
    /// additions, updates, and removals against the previous view of that
    /// type.
    pub fn update(&mut self, route_type: RouteType, new_entries: Vec<RoutingTableEntry>) {
        let old_of_type: Vec<&RoutingTableEntry> = self
            .entries
            .iter()
            .filter(|e| e.route_type == route_type)
            .collect();

        for new_entry in &new_entries {
            match old_of_type
                .iter()
                .find(|e| e.destination == new_entry.destination)
            {
                None => info!(
                    "add route {} {} {}",
                    new_entry.destination, new_entry.next_hop, new_entry.cost
                ),
                Some(old_entry) if *old_entry != new_entry => info!(
                    "update route {} {} {}",
                    new_entry.destination, new_entry.next_hop, new_entry.cost
                ),
                _ => {}
            }
        }
        for old_entry in &old_of_type {
            if !new_entries.iter().any(|e| e.destination == old_entry.destination) {
                info!("remove route {}", old_entry.destination);
            }
        }

        self.entries.retain(|e| e.route_type != route_type);
        self.entries.extend(new_entries);
    }

    /// Deletes the single entry of `route_type` bound to `destination`.
    pub fn remove(&mut self, route_type: RouteType, destination: RouterId) {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.route_type == route_type && e.destination == destination));
        if self.entries.len() != before {
            info!("remove route {}", destination);
        }
    }

    /// Returns the next hop toward `destination`, preferring Static over
    /// Ospf when both exist, or -1 if no route is known.
    pub fn find(&self, destination: RouterId) -> i32 {
        let mut candidates: Vec<&RoutingTableEntry> = self
            .entries
            .iter()
            .filter(|e| e.destination == destination)
            .collect();
        candidates.sort_by_key(|e| e.route_type);
        candidates
            .first()
            .map(|e| e.next_hop as i32)
            .unwrap_or(-1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutingTableEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_wins_over_ospf() {
        let mut table = RoutingTable::new();
        table.update(
            RouteType::Static,
            vec![RoutingTableEntry::new(3, 3, 5, RouteType::Static)],
        );
        table.update(
            RouteType::Ospf,
            vec![RoutingTableEntry::new(3, 2, 2, RouteType::Ospf)],
        );
        assert_eq!(table.find(3), 3);
    }

    #[test]
    fn removing_static_falls_back_to_ospf() {
        let mut table = RoutingTable::new();
        table.update(
            RouteType::Static,
            vec![RoutingTableEntry::new(3, 3, 5, RouteType::Static)],
        );
        table.update(
            RouteType::Ospf,
            vec![RoutingTableEntry::new(3, 2, 2, RouteType::Ospf)],
        );
        table.remove(RouteType::Static, 3);
        assert_eq!(table.find(3), 2);
    }

    #[test]
    fn unknown_destination_is_negative_one() {
        let table = RoutingTable::new();
        assert_eq!(table.find(42), -1);
    }

    #[test]
    fn update_replaces_whole_type() {
        let mut table = RoutingTable::new();
        table.update(
            RouteType::Ospf,
            vec![RoutingTableEntry::new(2, 2, 1, RouteType::Ospf)],
        );
        table.update(
            RouteType::Ospf,
            vec![RoutingTableEntry::new(3, 3, 1, RouteType::Ospf)],
        );
        assert_eq!(table.find(2), -1);
        assert_eq!(table.find(3), 3);
    }
}
