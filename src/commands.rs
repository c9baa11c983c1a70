// Operator command parsing and dispatch: addlink, setlink, rmlink, send, exit.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::warn;

use crate::config::{MAX_ROUTER_ID, MIN_ROUTER_ID};
use crate::protocol;
use crate::routing_table::{RouteType, RoutingTableEntry};
use crate::state::RouterState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddLink { router_id: u8, cost: u32 },
    SetLink { router_id: u8, cost: u32 },
    RmLink { router_id: u8 },
    Send { router_id: u8, text: String },
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError(pub String);

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_router_id(token: &str) -> Result<u8, CommandError> {
    let value: u8 = token
        .parse()
        .map_err(|_| CommandError(format!("invalid router id: {}", token)))?;
    if value < MIN_ROUTER_ID || value > MAX_ROUTER_ID {
        return Err(CommandError(format!(
            "router id {} out of range ({}..={})",
            value, MIN_ROUTER_ID, MAX_ROUTER_ID
        )));
    }
    Ok(value)
}

fn parse_cost(token: &str) -> Result<u32, CommandError> {
    let value: u32 = token
        .parse()
        .map_err(|_| CommandError(format!("invalid cost: {}", token)))?;
    if value == 0 {
        return Err(CommandError("cost must be positive".to_string()));
    }
    Ok(value)
}

/// Parses one operator command line. Unrecognized verbs and malformed
/// arguments are rejected here, at the command layer, rather than deeper
/// in the protocol engine.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["addlink", router_id, cost] => Ok(Command::AddLink {
            router_id: parse_router_id(router_id)?,
            cost: parse_cost(cost)?,
        }),
        ["setlink", router_id, cost] => Ok(Command::SetLink {
            router_id: parse_router_id(router_id)?,
            cost: parse_cost(cost)?,
        }),
        ["rmlink", router_id] => Ok(Command::RmLink {
            router_id: parse_router_id(router_id)?,
        }),
        ["send", router_id, rest @ ..] if !rest.is_empty() => Ok(Command::Send {
            router_id: parse_router_id(router_id)?,
            text: rest.join(" "),
        }),
        ["exit"] => Ok(Command::Exit),
        [] => Err(CommandError("empty command".to_string())),
        _ => Err(CommandError(format!("unrecognized command: {}", line))),
    }
}

/// Applies a parsed command against router state. Returns `true` if the
/// command was `exit`, signaling the caller to terminate the command loop.
pub async fn apply(state: &Arc<RouterState>, command: Command) -> bool {
    match command {
        Command::AddLink { router_id, cost } => {
            state.neighbors.lock().await.add(router_id, cost);
            state
                .lsdb
                .lock()
                .await
                .update_self(state.router_id, BTreeMap::from([(router_id, cost)]));
            state.routing_table.lock().await.update(
                RouteType::Static,
                vec![RoutingTableEntry::new(router_id, router_id, cost, RouteType::Static)],
            );
            false
        }
        Command::SetLink { router_id, cost } => {
            {
                let mut neighbors = state.neighbors.lock().await;
                match neighbors.find_mut(router_id) {
                    Some(neighbor) => neighbor.cost = cost,
                    None => {
                        warn!("setlink: no such neighbor {}", router_id);
                        return false;
                    }
                }
            }
            state
                .lsdb
                .lock()
                .await
                .update_self(state.router_id, BTreeMap::from([(router_id, cost)]));
            // Keep the operator-facing static route in sync with the new cost
            // rather than leaving it to go stale until the next addlink.
            let mut routing_table = state.routing_table.lock().await;
            if routing_table.find(router_id) >= 0 {
                routing_table.update(
                    RouteType::Static,
                    vec![RoutingTableEntry::new(router_id, router_id, cost, RouteType::Static)],
                );
            }
            drop(routing_table);
            state.run_spf().await;
            false
        }
        Command::RmLink { router_id } => {
            protocol::remove_neighbor(state, router_id).await;
            false
        }
        Command::Send { router_id, text } => {
            if let Err(e) = protocol::send_text(state, router_id, &text).await {
                warn!("send failed: {}", e);
            }
            false
        }
        Command::Exit => true,
    }
}
