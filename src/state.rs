// Shared router state. Mutations are serialized per-collection behind a
// tokio::sync::Mutex, matching the teacher's AppState idiom: one lock per
// collection rather than a single coarse lock or a funnel channel. Given
// the low event rate of this protocol (hello/DBD once a second, LSU only on
// topology change), field-granularity locking is sufficient.

use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::Mutex;

use crate::lsdb::Lsdb;
use crate::neighbor::NeighborTable;
use crate::packet::RouterId;
use crate::routing_table::RoutingTable;

pub struct RouterState {
    pub router_id: RouterId,
    pub socket: Arc<UdpSocket>,
    pub neighbors: Mutex<NeighborTable>,
    pub lsdb: Mutex<Lsdb>,
    pub routing_table: Mutex<RoutingTable>,
}

impl RouterState {
    pub fn new(router_id: RouterId, socket: Arc<UdpSocket>) -> Arc<Self> {
        Arc::new(Self {
            router_id,
            socket,
            neighbors: Mutex::new(NeighborTable::new()),
            lsdb: Mutex::new(Lsdb::new(router_id)),
            routing_table: Mutex::new(RoutingTable::new()),
        })
    }

    /// Runs SPF if at least one neighbor is Full, and installs the result.
    /// A no-op run (no Full neighbor) leaves the OSPF routes untouched, per
    /// spec: SPF is simply skipped rather than clearing existing routes.
    pub async fn run_spf(&self) {
        let has_full = self.neighbors.lock().await.any_full();
        if !has_full {
            return;
        }
        let routes = {
            let lsdb = self.lsdb.lock().await;
            crate::spf::compute_routes(self.router_id, &lsdb)
        };
        self.routing_table
            .lock()
            .await
            .update(crate::routing_table::RouteType::Ospf, routes);
    }
}
