// Shortest-path-first engine: Dijkstra over the link-state database,
// converted into next-hop routing entries.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::lsdb::Lsdb;
use crate::packet::RouterId;
use crate::routing_table::{RouteType, RoutingTableEntry};

pub type Topology = HashMap<RouterId, Vec<(RouterId, u32)>>;

/// Rebuilds the adjacency list from every LSA currently in the LSDB. This
/// view is never persisted across runs; callers reconstruct it fresh before
/// every SPF invocation.
pub fn build_topology(lsdb: &Lsdb) -> Topology {
    let mut topology = Topology::new();
    for entry in lsdb.iter() {
        let edges = entry
            .lsa
            .metrics
            .iter()
            .map(|(&neighbor, &cost)| (neighbor, cost))
            .collect();
        topology.insert(entry.lsa.origin, edges);
    }
    topology
}

#[derive(Debug, Eq, PartialEq)]
struct HeapEntry {
    router_id: RouterId,
    distance: u32,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap (a max-heap) pops the smallest distance.
        other.distance.cmp(&self.distance)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Runs Dijkstra from `self_id` over `topology`. An edge (u, v, c) is usable
/// even if v does not advertise u back — the present behavior, kept as
/// specified.
fn shortest_paths(
    self_id: RouterId,
    topology: &Topology,
) -> (HashMap<RouterId, u32>, HashMap<RouterId, RouterId>) {
    let mut distance: HashMap<RouterId, u32> = HashMap::new();
    let mut previous: HashMap<RouterId, RouterId> = HashMap::new();
    let mut visited: std::collections::HashSet<RouterId> = std::collections::HashSet::new();
    let mut heap = BinaryHeap::new();

    distance.insert(self_id, 0);
    heap.push(HeapEntry {
        router_id: self_id,
        distance: 0,
    });

    while let Some(HeapEntry { router_id, distance: dist }) = heap.pop() {
        if !visited.insert(router_id) {
            continue;
        }
        let Some(edges) = topology.get(&router_id) else {
            continue;
        };
        for &(neighbor, cost) in edges {
            let candidate = dist + cost;
            let better = distance
                .get(&neighbor)
                .map(|&known| candidate < known)
                .unwrap_or(true);
            if better {
                distance.insert(neighbor, candidate);
                previous.insert(neighbor, router_id);
                heap.push(HeapEntry {
                    router_id: neighbor,
                    distance: candidate,
                });
            }
        }
    }

    (distance, previous)
}

/// For destination `d`, walks the predecessor chain from `d` back toward
/// `self_id`, stopping at the node whose predecessor is `self_id`. If `d`
/// is itself adjacent to `self_id`, the next hop is `d`.
fn first_hop(self_id: RouterId, destination: RouterId, previous: &HashMap<RouterId, RouterId>) -> RouterId {
    let mut hop = destination;
    while let Some(&pred) = previous.get(&hop) {
        if pred == self_id {
            return hop;
        }
        hop = pred;
    }
    destination
}

/// Computes the OSPF routing entries for `self_id` given the current LSDB.
/// Returns `None` if SPF should be skipped (no neighbor is Full — the
/// caller is responsible for that precondition; this function only needs
/// the topology and always computes if invoked).
pub fn compute_routes(self_id: RouterId, lsdb: &Lsdb) -> Vec<RoutingTableEntry> {
    let topology = build_topology(lsdb);
    let (distance, previous) = shortest_paths(self_id, &topology);

    let mut entries = Vec::new();
    for (&destination, &cost) in &distance {
        if destination == self_id {
            continue;
        }
        let next_hop = first_hop(self_id, destination, &previous);
        entries.push(RoutingTableEntry::new(destination, next_hop, cost, RouteType::Ospf));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::packet::Lsa;

    fn triangle_lsdb() -> Lsdb {
        let mut lsdb = Lsdb::new(1);
        lsdb.add_or_replace(Lsa::new(1, 1, BTreeMap::from([(2, 1), (3, 5)])));
        lsdb.add_or_replace(Lsa::new(2, 1, BTreeMap::from([(1, 1), (3, 1)])));
        lsdb.add_or_replace(Lsa::new(3, 1, BTreeMap::from([(1, 5), (2, 1)])));
        lsdb
    }

    #[test]
    fn triangle_prefers_two_hop_path() {
        let lsdb = triangle_lsdb();
        let routes = compute_routes(1, &lsdb);
        let to_2 = routes.iter().find(|e| e.destination == 2).unwrap();
        assert_eq!(to_2.next_hop, 2);
        assert_eq!(to_2.cost, 1);
        let to_3 = routes.iter().find(|e| e.destination == 3).unwrap();
        assert_eq!(to_3.next_hop, 2);
        assert_eq!(to_3.cost, 2);
    }

    #[test]
    fn unreachable_nodes_are_absent() {
        let mut lsdb = Lsdb::new(1);
        lsdb.add_or_replace(Lsa::new(1, 1, BTreeMap::new()));
        lsdb.add_or_replace(Lsa::new(9, 1, BTreeMap::from([(8, 1)])));
        let routes = compute_routes(1, &lsdb);
        assert!(routes.is_empty());
    }

    #[test]
    fn adjacent_next_hop_is_destination_itself() {
        let mut lsdb = Lsdb::new(1);
        lsdb.add_or_replace(Lsa::new(1, 1, BTreeMap::from([(2, 10)])));
        let routes = compute_routes(1, &lsdb);
        let to_2 = routes.iter().find(|e| e.destination == 2).unwrap();
        assert_eq!(to_2.next_hop, 2);
        assert_eq!(to_2.cost, 10);
    }

    #[test]
    fn idempotent_on_unchanged_lsdb() {
        let lsdb = triangle_lsdb();
        let first = compute_routes(1, &lsdb);
        let second = compute_routes(1, &lsdb);
        assert_eq!(first.len(), second.len());
        for entry in &first {
            let matching = second.iter().find(|e| e.destination == entry.destination).unwrap();
            assert_eq!(matching.next_hop, entry.next_hop);
            assert_eq!(matching.cost, entry.cost);
        }
    }
}
