// Tagged-union packet codec. Every kind carries its own typed payload; the
// envelope carries routing metadata common to all of them. serde_json gives
// us a self-describing wire format for free — this is an implementation
// contract between peers of this daemon, not an external standard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub type RouterId = u8;

/// A link-state advertisement as carried on the wire, inside a DBD or an
/// LSU. `received_time` is not part of this: it is assigned locally by the
/// receiving LSDB at install time and never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lsa {
    pub origin: RouterId,
    pub sequence: u32,
    pub metrics: BTreeMap<RouterId, u32>,
}

impl Lsa {
    pub fn new(origin: RouterId, sequence: u32, metrics: BTreeMap<RouterId, u32>) -> Self {
        Self {
            origin,
            sequence,
            metrics,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PacketKind {
    Hello {
        router_id: RouterId,
        already_seen: bool,
        ack: bool,
    },
    Dbd {
        router_id: RouterId,
        sequence: u32,
        lsas: Vec<Lsa>,
    },
    Lsr {
        requested_origins: Vec<RouterId>,
    },
    Lsu {
        lsas: Vec<Lsa>,
    },
    Text {
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub source: RouterId,
    pub destination: RouterId,
    pub kind: PacketKind,
}

impl Envelope {
    pub fn new(source: RouterId, destination: RouterId, kind: PacketKind) -> Self {
        Self {
            source,
            destination,
            kind,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
