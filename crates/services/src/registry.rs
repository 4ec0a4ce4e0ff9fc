use std::collections::{BTreeMap, HashMap};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A frame queued for delivery to one participant's connection. The
/// transport layer drains the queue into the actual socket.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    /// Serialized caption payload, sent as a text frame.
    Caption(String),
    /// Protocol-level keepalive ping.
    Ping,
    /// Reply to a client ping.
    Pong(Vec<u8>),
    /// The server is closing this connection (e.g. displaced by a newer
    /// connection under the same participant id).
    Close,
}

/// One connected client within a call.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    /// Distinguishes this connection from an earlier or later one
    /// reusing the same participant id.
    pub conn_token: String,
    pub source_lang: String,
    pub target_lang: String,
    pub sender: mpsc::Sender<OutboundFrame>,
}

struct Call {
    participants: HashMap<String, Participant>,
}

/// Tracks call membership. A call record exists exactly while it has at
/// least one participant; emptying the member set releases the record.
pub struct CallRegistry {
    calls: DashMap<String, Call>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    /// Adds a participant, creating the call record if absent. A rejoin
    /// under the same participant id replaces the previous entry; the
    /// displaced participant is returned so its connection can be shut
    /// down.
    pub fn join(&self, call_id: &str, participant: Participant) -> Option<Participant> {
        let mut call = self.calls.entry(call_id.to_string()).or_insert_with(|| Call {
            participants: HashMap::new(),
        });
        let participant_id = participant.id.clone();
        let displaced = call.participants.insert(participant_id.clone(), participant);
        info!(%call_id, %participant_id, members = call.participants.len(), "participant joined");
        displaced
    }

    /// Removes a participant, but only while `conn_token` still matches
    /// the registered entry: a displaced connection's cleanup must never
    /// evict its replacement. Returns `true` when this released the call
    /// record (last member left).
    pub fn leave(&self, call_id: &str, participant_id: &str, conn_token: &str) -> bool {
        if let Some(mut call) = self.calls.get_mut(call_id) {
            match call.participants.get(participant_id) {
                Some(p) if p.conn_token == conn_token => {
                    call.participants.remove(participant_id);
                    debug!(%call_id, %participant_id, members = call.participants.len(), "participant left");
                }
                _ => return false,
            }
        } else {
            return false;
        }
        let released = self
            .calls
            .remove_if(call_id, |_, call| call.participants.is_empty())
            .is_some();
        if released {
            info!(%call_id, "call released");
        }
        released
    }

    /// Snapshot of a call's members, for fan-out.
    pub fn members(&self, call_id: &str) -> Vec<Participant> {
        self.calls
            .get(call_id)
            .map(|call| call.participants.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn participant_count(&self) -> usize {
        self.calls.iter().map(|c| c.participants.len()).sum()
    }

    /// call id -> sorted member participant ids, for the debug endpoint.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.calls
            .iter()
            .map(|entry| {
                let mut ids: Vec<String> = entry.participants.keys().cloned().collect();
                ids.sort();
                (entry.key().clone(), ids)
            })
            .collect()
    }

    /// Every open connection's outbound queue, for liveness probing.
    pub fn all_senders(&self) -> Vec<mpsc::Sender<OutboundFrame>> {
        self.calls
            .iter()
            .flat_map(|entry| {
                entry
                    .participants
                    .values()
                    .map(|p| p.sender.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl Default for CallRegistry {
    fn default() -> Self {
        Self::new()
    }
}
