// Link-state database: at most one LSA per origin, the one with the
// largest observed sequence number.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use log::{debug, info};

use crate::packet::{Lsa, RouterId};

#[derive(Debug, Clone)]
pub struct LsdbEntry {
    pub lsa: Lsa,
    pub received_time: Instant,
}

#[derive(Debug)]
pub struct Lsdb {
    entries: HashMap<RouterId, LsdbEntry>,
}

impl Lsdb {
    /// Installs the local router's self-LSA with empty metrics and sequence 0.
    pub fn new(self_id: RouterId) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            self_id,
            LsdbEntry {
                lsa: Lsa::new(self_id, 0, BTreeMap::new()),
                received_time: Instant::now(),
            },
        );
        Self { entries }
    }

    /// Installs `lsa` if no entry exists for its origin, or if its sequence
    /// strictly exceeds the existing entry's. Equal sequences are discarded.
    /// An LSA carrying a non-positive metric is rejected outright, network
    /// origin notwithstanding. Returns whether the LSDB changed.
    pub fn add_or_replace(&mut self, lsa: Lsa) -> bool {
        if let Some((&neighbor, &cost)) = lsa.metrics.iter().find(|(_, &cost)| cost == 0) {
            debug!(
                "reject LSA {} seq {}: non-positive cost {} for neighbor {}",
                lsa.origin, lsa.sequence, cost, neighbor
            );
            return false;
        }
        match self.entries.entry(lsa.origin) {
            Entry::Vacant(slot) => {
                info!("add LSA {} {}", lsa.origin, lsa.sequence);
                slot.insert(LsdbEntry {
                    lsa,
                    received_time: Instant::now(),
                });
                true
            }
            Entry::Occupied(mut slot) => {
                if lsa.sequence > slot.get().lsa.sequence {
                    info!("update LSA {} {}", lsa.origin, lsa.sequence);
                    slot.insert(LsdbEntry {
                        lsa,
                        received_time: Instant::now(),
                    });
                    true
                } else {
                    debug!(
                        "discard stale/duplicate LSA {} seq {} (have seq {})",
                        lsa.origin,
                        lsa.sequence,
                        slot.get().lsa.sequence
                    );
                    false
                }
            }
        }
    }

    /// Merges `metric_delta` into the self-LSA's metrics (added or
    /// overwriting per key), increments its sequence, and refreshes its
    /// timestamp. Negative/zero costs must be rejected by the caller before
    /// reaching this point.
    pub fn update_self(&mut self, self_id: RouterId, metric_delta: BTreeMap<RouterId, u32>) {
        match self.entries.entry(self_id) {
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                entry.lsa.metrics.extend(metric_delta);
                entry.lsa.sequence += 1;
                entry.received_time = Instant::now();
                info!("update LSA {} {}", self_id, entry.lsa.sequence);
            }
            Entry::Vacant(slot) => {
                info!("add LSA {} 1", self_id);
                slot.insert(LsdbEntry {
                    lsa: Lsa::new(self_id, 1, metric_delta),
                    received_time: Instant::now(),
                });
            }
        }
    }

    /// Removes the entry for `origin`, e.g. when a neighbor is removed
    /// locally, to age out that side of the link.
    pub fn remove(&mut self, origin: RouterId) -> Option<LsdbEntry> {
        let removed = self.entries.remove(&origin);
        if removed.is_some() {
            info!("remove LSA {}", origin);
        }
        removed
    }

    pub fn get(&self, origin: RouterId) -> Option<&LsdbEntry> {
        self.entries.get(&origin)
    }

    pub fn get_mut(&mut self, origin: RouterId) -> Option<&mut LsdbEntry> {
        self.entries.get_mut(&origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LsdbEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LsdbEntry> {
        self.entries.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_sequence_replaces_lower() {
        let mut lsdb = Lsdb::new(1);
        assert!(lsdb.add_or_replace(Lsa::new(2, 1, BTreeMap::from([(1, 5)]))));
        assert!(!lsdb.add_or_replace(Lsa::new(2, 1, BTreeMap::from([(1, 7)]))));
        assert_eq!(lsdb.get(2).unwrap().lsa.metrics[&1], 5);
        assert!(lsdb.add_or_replace(Lsa::new(2, 2, BTreeMap::from([(1, 7)]))));
        assert_eq!(lsdb.get(2).unwrap().lsa.metrics[&1], 7);
    }

    #[test]
    fn update_self_merges_and_bumps_sequence() {
        let mut lsdb = Lsdb::new(1);
        lsdb.update_self(1, BTreeMap::from([(2, 10)]));
        assert_eq!(lsdb.get(1).unwrap().lsa.sequence, 1);
        lsdb.update_self(1, BTreeMap::from([(3, 20)]));
        let self_lsa = &lsdb.get(1).unwrap().lsa;
        assert_eq!(self_lsa.sequence, 2);
        assert_eq!(self_lsa.metrics.len(), 2);
    }

    #[test]
    fn zero_cost_metric_is_rejected() {
        let mut lsdb = Lsdb::new(1);
        assert!(!lsdb.add_or_replace(Lsa::new(2, 1, BTreeMap::from([(1, 0)]))));
        assert!(lsdb.get(2).is_none());

        assert!(lsdb.add_or_replace(Lsa::new(2, 1, BTreeMap::from([(1, 5)]))));
        assert!(!lsdb.add_or_replace(Lsa::new(2, 2, BTreeMap::from([(1, 5), (3, 0)]))));
        assert_eq!(lsdb.get(2).unwrap().lsa.sequence, 1);
    }

    #[test]
    fn remove_drops_entry() {
        let mut lsdb = Lsdb::new(1);
        lsdb.add_or_replace(Lsa::new(2, 1, BTreeMap::new()));
        assert!(lsdb.remove(2).is_some());
        assert!(lsdb.get(2).is_none());
    }
}
