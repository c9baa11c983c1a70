// Protocol timing constants, mirrored from the reference OSPFRouter class.

use std::time::Duration;

pub const BASE_PORT: u16 = 10000;

pub const HELLO_INTERVAL: Duration = Duration::from_secs(1);
pub const DBD_INTERVAL: Duration = Duration::from_secs(1);
pub const DEAD_INTERVAL: Duration = Duration::from_secs(4);
pub const LSA_REFRESH_TIME: Duration = Duration::from_secs(15);
pub const LSA_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

pub const MIN_ROUTER_ID: u8 = 1;
pub const MAX_ROUTER_ID: u8 = 99;

pub fn router_port(router_id: u8) -> u16 {
    BASE_PORT + router_id as u16
}
