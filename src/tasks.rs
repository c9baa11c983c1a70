// Background tasks: periodic hello/DBD emission, LSA refresh, dead-interval
// sweep, and the socket receive loop. Mirrors the reference implementation's
// spawn_hello_and_lsa_tasks / spawn_neighbor_timeout_task split, generalized
// to this router's own message set.

use std::sync::Arc;

use log::warn;
use tokio::time::interval;

use crate::config::{DBD_INTERVAL, DEAD_INTERVAL, HELLO_INTERVAL, LSA_SWEEP_INTERVAL};
use crate::neighbor::NeighborState;
use crate::packet::Envelope;
use crate::protocol;
use crate::state::RouterState;

/// Spawns every long-lived background task for this router and returns
/// immediately; the caller is responsible for keeping the process alive
/// (the stdin command loop in `main` does this).
pub fn spawn_all(state: Arc<RouterState>) {
    tokio::spawn(hello_task(state.clone()));
    tokio::spawn(dbd_task(state.clone()));
    tokio::spawn(lsa_refresh_task(state.clone()));
    tokio::spawn(dead_interval_task(state.clone()));
    tokio::spawn(receive_task(state));
}

async fn hello_task(state: Arc<RouterState>) {
    let mut ticker = interval(HELLO_INTERVAL);
    loop {
        ticker.tick().await;
        let targets: Vec<_> = {
            let neighbors = state.neighbors.lock().await;
            neighbors
                .iter()
                .map(|n| (n.router_id, n.state != NeighborState::Down))
                .collect()
        };
        for (router_id, already_seen) in targets {
            if let Err(e) = protocol::send_hello(&state, router_id, already_seen, false).await {
                warn!("failed to send hello to {}: {}", router_id, e);
            }
        }
    }
}

async fn dbd_task(state: Arc<RouterState>) {
    let mut ticker = interval(DBD_INTERVAL);
    loop {
        ticker.tick().await;
        let targets: Vec<_> = {
            let neighbors = state.neighbors.lock().await;
            neighbors
                .iter()
                .filter(|n| matches!(n.state, NeighborState::Exchange | NeighborState::Full))
                .map(|n| n.router_id)
                .collect()
        };
        for router_id in targets {
            if let Err(e) = protocol::send_dbd(&state, router_id).await {
                warn!("failed to send DBD to {}: {}", router_id, e);
            }
        }
    }
}

/// Refreshes the self-LSA (bumping its sequence) once LSA_REFRESH_TIME has
/// elapsed since it was last installed, so peers never let it age out.
async fn lsa_refresh_task(state: Arc<RouterState>) {
    let mut ticker = interval(LSA_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let due = {
            let lsdb = state.lsdb.lock().await;
            lsdb.get(state.router_id)
                .map(|e| e.received_time.elapsed() >= crate::config::LSA_REFRESH_TIME)
                .unwrap_or(false)
        };
        if due {
            state.lsdb.lock().await.update_self(state.router_id, Default::default());
        }
    }
}

/// Tears down any neighbor whose last hello predates DEAD_INTERVAL: sets it
/// Down, drops its LSDB entry, and re-runs SPF. Runs at twice the sweep rate
/// of DEAD_INTERVAL so expiry is detected promptly without busy-waiting.
async fn dead_interval_task(state: Arc<RouterState>) {
    let mut ticker = interval(DEAD_INTERVAL / 2);
    loop {
        ticker.tick().await;
        let expired: Vec<_> = {
            let neighbors = state.neighbors.lock().await;
            neighbors
                .iter()
                .filter(|n| n.state != NeighborState::Down && n.last_seen.elapsed() > DEAD_INTERVAL)
                .map(|n| n.router_id)
                .collect()
        };
        if expired.is_empty() {
            continue;
        }
        for router_id in &expired {
            if let Some(neighbor) = state.neighbors.lock().await.find_mut(*router_id) {
                neighbor.set_state(NeighborState::Down);
            }
            state.lsdb.lock().await.remove(*router_id);
        }
        state.run_spf().await;
    }
}

async fn receive_task(state: Arc<RouterState>) {
    let mut buf = vec![0u8; 65536];
    loop {
        let (len, _addr) = match state.socket.recv_from(&mut buf).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("recv_from failed: {}", e);
                continue;
            }
        };
        let envelope = match Envelope::decode(&buf[..len]) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("dropping undecodable packet: {}", e);
                continue;
            }
        };
        // Processed inline, not spawned: this preserves per-neighbor receipt
        // order (spec.md section 5's ordering guarantee), matching the
        // teacher's single-threaded main_loop dispatch.
        protocol::handle_incoming(&state, envelope).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dead_interval_tears_down_stale_neighbor() {
        let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let state = RouterState::new(1, Arc::new(socket));
        state.neighbors.lock().await.add(2, 10);
        {
            let mut neighbors = state.neighbors.lock().await;
            let neighbor = neighbors.find_mut(2).unwrap();
            neighbor.set_state(NeighborState::Full);
            neighbor.last_seen = std::time::Instant::now() - DEAD_INTERVAL * 2;
        }
        state
            .lsdb
            .lock()
            .await
            .add_or_replace(crate::packet::Lsa::new(2, 1, std::collections::BTreeMap::new()));

        let expired: Vec<_> = {
            let neighbors = state.neighbors.lock().await;
            neighbors
                .iter()
                .filter(|n| n.state != NeighborState::Down && n.last_seen.elapsed() > DEAD_INTERVAL)
                .map(|n| n.router_id)
                .collect()
        };
        assert_eq!(expired, vec![2]);
        for router_id in &expired {
            state
                .neighbors
                .lock()
                .await
                .find_mut(*router_id)
                .unwrap()
                .set_state(NeighborState::Down);
            state.lsdb.lock().await.remove(*router_id);
        }
        assert_eq!(
            state.neighbors.lock().await.find(2).unwrap().state,
            NeighborState::Down
        );
        assert!(state.lsdb.lock().await.get(2).is_none());
    }
}