// Entry point: parses the router id, binds its UDP socket, spawns the
// background protocol tasks, then drives the operator command loop on
// stdin until `exit`.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;

use lsrouted::commands;
use lsrouted::config::{router_port, MAX_ROUTER_ID, MIN_ROUTER_ID};
use lsrouted::state::RouterState;
use lsrouted::tasks;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn parse_router_id(arg: &str) -> Option<u8> {
    let value: u8 = arg.parse().ok()?;
    if value < MIN_ROUTER_ID || value > MAX_ROUTER_ID {
        return None;
    }
    Some(value)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let arg = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            eprintln!("usage: lsrouted <router_id>");
            return ExitCode::FAILURE;
        }
    };
    let router_id = match parse_router_id(&arg) {
        Some(id) => id,
        None => {
            eprintln!(
                "invalid router id {:?}: expected an integer in {}..={}",
                arg, MIN_ROUTER_ID, MAX_ROUTER_ID
            );
            return ExitCode::FAILURE;
        }
    };

    let bind_addr: SocketAddr = format!("127.0.0.1:{}", router_port(router_id)).parse().unwrap();
    let socket = match UdpSocket::bind(bind_addr).await {
        Ok(socket) => socket,
        Err(e) => {
            error!("failed to bind {}: {}", bind_addr, e);
            return ExitCode::FAILURE;
        }
    };
    info!("router {} listening on {}", router_id, bind_addr);

    let state = RouterState::new(router_id, Arc::new(socket));
    tasks::spawn_all(state.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("failed to read command: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match commands::parse(line) {
            Ok(command) => {
                if commands::apply(&state, command).await {
                    break;
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    ExitCode::SUCCESS
}