// Protocol engine: ingests packets, drives neighbor state transitions,
// floods link-state updates, and forwards packets hop by hop.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::router_port;
use crate::error::Result;
use crate::neighbor::{DatabaseDescription, NeighborState};
use crate::packet::{Envelope, Lsa, PacketKind, RouterId};
use crate::routing_table::RouteType;
use crate::state::RouterState;

/// Sends `envelope`. Text packets are forwarded via the routing table;
/// every other kind is always directly neighbor-addressed by construction.
/// A missing route (-1) is a silent drop: the daemon logs nothing for it.
pub async fn send_packet(state: &RouterState, envelope: Envelope) -> Result<()> {
    let next_hop = match envelope.kind {
        PacketKind::Text { .. } => state.routing_table.lock().await.find(envelope.destination),
        _ => envelope.destination as i32,
    };
    if next_hop < 0 {
        return Ok(());
    }
    let bytes = envelope.encode()?;
    let addr = format!("127.0.0.1:{}", router_port(next_hop as RouterId));
    state.socket.send_to(&bytes, addr).await?;
    Ok(())
}

pub async fn send_hello(state: &RouterState, neighbor_id: RouterId, already_seen: bool, ack: bool) -> Result<()> {
    let envelope = Envelope::new(
        state.router_id,
        neighbor_id,
        PacketKind::Hello {
            router_id: state.router_id,
            already_seen,
            ack,
        },
    );
    send_packet(state, envelope).await
}

pub(crate) async fn send_dbd(state: &RouterState, neighbor_id: RouterId) -> Result<()> {
    let lsas: Vec<Lsa> = state.lsdb.lock().await.iter().map(|e| e.lsa.clone()).collect();
    let envelope = Envelope::new(
        state.router_id,
        neighbor_id,
        PacketKind::Dbd {
            router_id: state.router_id,
            sequence: 1,
            lsas,
        },
    );
    send_packet(state, envelope).await
}

async fn send_lsr(state: &RouterState, neighbor_id: RouterId, requested_origins: Vec<RouterId>) -> Result<()> {
    let envelope = Envelope::new(
        state.router_id,
        neighbor_id,
        PacketKind::Lsr { requested_origins },
    );
    send_packet(state, envelope).await
}

async fn send_lsu(state: &RouterState, neighbor_id: RouterId, lsas: Vec<Lsa>) -> Result<()> {
    let envelope = Envelope::new(state.router_id, neighbor_id, PacketKind::Lsu { lsas });
    send_packet(state, envelope).await
}

pub async fn send_text(state: &RouterState, destination: RouterId, text: &str) -> Result<()> {
    let envelope = Envelope::new(
        state.router_id,
        destination,
        PacketKind::Text {
            bytes: text.as_bytes().to_vec(),
        },
    );
    send_packet(state, envelope).await
}

/// Entry point for every packet arriving on the socket, whether destined
/// locally or merely transiting through this router.
pub async fn handle_incoming(state: &Arc<RouterState>, envelope: Envelope) {
    if envelope.destination != state.router_id {
        if let PacketKind::Text { bytes } = &envelope.kind {
            info!(
                "Forward message from {} to {}: {}",
                envelope.source,
                envelope.destination,
                String::from_utf8_lossy(bytes)
            );
        }
        if let Err(e) = send_packet(state, envelope).await {
            warn!("failed to forward packet: {}", e);
        }
        return;
    }

    let source = envelope.source;
    match envelope.kind {
        PacketKind::Hello { already_seen, ack, .. } => {
            handle_hello(state, source, already_seen, ack).await;
        }
        PacketKind::Dbd { lsas, sequence, .. } => {
            handle_dbd(state, source, sequence, lsas).await;
        }
        PacketKind::Lsr { requested_origins } => {
            handle_lsr(state, source, requested_origins).await;
        }
        PacketKind::Lsu { lsas } => {
            handle_lsu(state, source, lsas).await;
        }
        PacketKind::Text { bytes } => {
            info!("Recv message from {}: {}", source, String::from_utf8_lossy(&bytes));
        }
    }
}

async fn handle_hello(state: &Arc<RouterState>, source: RouterId, already_seen: bool, ack: bool) {
    {
        let mut neighbors = state.neighbors.lock().await;
        let Some(neighbor) = neighbors.find_mut(source) else {
            return;
        };
        neighbor.last_seen = std::time::Instant::now();
        if ack {
            return;
        }
        if neighbor.state != NeighborState::Full {
            if already_seen {
                neighbor.set_state(NeighborState::Exchange);
            } else {
                neighbor.set_state(NeighborState::Init);
            }
        }
    }
    if let Err(e) = send_hello(state, source, true, true).await {
        warn!("failed to ack hello to {}: {}", source, e);
    }
}

async fn handle_dbd(state: &Arc<RouterState>, source: RouterId, sequence: u32, lsas: Vec<Lsa>) {
    let has_neighbor = {
        let mut neighbors = state.neighbors.lock().await;
        let Some(neighbor) = neighbors.find_mut(source) else {
            return;
        };
        neighbor.last_dbd = Some(DatabaseDescription {
            sequence,
            lsas: lsas.clone(),
        });
        true
    };
    if !has_neighbor {
        return;
    }

    let gaps: Vec<RouterId> = {
        let lsdb = state.lsdb.lock().await;
        lsas.iter()
            .filter(|lsa| lsdb.get(lsa.origin).map(|e| e.lsa.sequence < lsa.sequence).unwrap_or(true))
            .map(|lsa| lsa.origin)
            .collect()
    };

    if !gaps.is_empty() {
        if let Err(e) = send_lsr(state, source, gaps).await {
            warn!("failed to send LSR to {}: {}", source, e);
        }
        return;
    }

    {
        let mut neighbors = state.neighbors.lock().await;
        if let Some(neighbor) = neighbors.find_mut(source) {
            neighbor.set_state(NeighborState::Full);
        }
    }
    state.run_spf().await;
}

async fn handle_lsr(state: &Arc<RouterState>, source: RouterId, requested_origins: Vec<RouterId>) {
    let requested: Vec<Lsa> = {
        let lsdb = state.lsdb.lock().await;
        requested_origins
            .into_iter()
            .filter_map(|origin| lsdb.get(origin).map(|e| e.lsa.clone()))
            .collect()
    };
    if requested.is_empty() {
        return;
    }
    if let Err(e) = send_lsu(state, source, requested).await {
        warn!("failed to send LSU to {}: {}", source, e);
    }
}

async fn handle_lsu(state: &Arc<RouterState>, _source: RouterId, lsas: Vec<Lsa>) {
    let mut newly_installed = Vec::new();
    {
        let mut lsdb = state.lsdb.lock().await;
        for lsa in lsas {
            if lsdb.add_or_replace(lsa.clone()) {
                newly_installed.push(lsa);
            }
        }
    }

    if !newly_installed.is_empty() {
        let full_neighbors = state.neighbors.lock().await.full_router_ids();
        for neighbor_id in full_neighbors {
            if let Err(e) = send_lsu(state, neighbor_id, newly_installed.clone()).await {
                warn!("failed to reflood LSU to {}: {}", neighbor_id, e);
            }
        }
    } else {
        debug!("LSU contained nothing newer");
    }

    state.run_spf().await;
}

/// Removes a neighbor: tears it to Down, drops its LSDB entry, prunes it
/// from the self-LSA, removes its Static route, and re-runs SPF.
pub async fn remove_neighbor(state: &Arc<RouterState>, router_id: RouterId) {
    let existed = state.neighbors.lock().await.remove(router_id);
    if !existed {
        return;
    }
    state.lsdb.lock().await.remove(router_id);
    {
        let mut lsdb = state.lsdb.lock().await;
        if let Some(entry) = lsdb.get_mut(state.router_id) {
            entry.lsa.metrics.remove(&router_id);
        }
    }
    state
        .routing_table
        .lock()
        .await
        .remove(RouteType::Static, router_id);
    state.run_spf().await;
}
