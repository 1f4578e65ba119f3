//! Per-room relay state machine.
//!
//! [`Relay`] decides, for each text frame a connection sends, what gets
//! delivered and to whom. It knows nothing about sockets; the websocket layer
//! feeds it frames and fans its [`Outbound`]s out.

use std::{collections::HashMap, fmt, str::FromStr};
use tracing::debug;
use whiteboard_client::shared_types::{Point, Segment, WsMessage};

pub type ConnectionId = String;

/// How drawing messages are fanned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayPolicy {
    /// Forward the frame verbatim to everyone except the sender.
    #[default]
    Broadcast,
    /// Send to everyone including the sender, with `prev` filled in from the
    /// sender's previous segment and the sender stamped in `from`.
    Echo,
}

impl FromStr for RelayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "broadcast" => Ok(RelayPolicy::Broadcast),
            "echo" => Ok(RelayPolicy::Echo),
            other => Err(format!("unknown relay policy {other:?}")),
        }
    }
}

impl fmt::Display for RelayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayPolicy::Broadcast => f.write_str("broadcast"),
            RelayPolicy::Echo => f.write_str("echo"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    All,
    AllExcept(ConnectionId),
}

impl Recipients {
    pub fn includes(&self, id: &str) -> bool {
        match self {
            Recipients::All => true,
            Recipients::AllExcept(excluded) => excluded != id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub recipients: Recipients,
    pub payload: String,
}

// Last two points seen from one connection. Only the echo policy fills it.
#[derive(Debug, Default, Clone, PartialEq)]
struct Session {
    prev: Option<Point>,
    curr: Option<Point>,
}

#[derive(Debug)]
pub struct Relay {
    policy: RelayPolicy,
    sessions: HashMap<ConnectionId, Session>,
}

impl Relay {
    pub fn new(policy: RelayPolicy) -> Self {
        Self {
            policy,
            sessions: HashMap::new(),
        }
    }

    pub fn connect(&mut self, id: impl Into<ConnectionId>) {
        self.sessions.entry(id.into()).or_default();
    }

    /// Drops everything known about `id`. Returns whether it was connected.
    pub fn disconnect(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn is_connected(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Handles one text frame from `from`.
    ///
    /// Frames that are not a known drawing message are dropped, as are frames
    /// from connections that are not (or no longer) connected.
    pub fn handle(&mut self, from: &str, text: &str) -> Option<Outbound> {
        let Some(session) = self.sessions.get_mut(from) else {
            debug!("Dropping frame from unknown connection {}", from);
            return None;
        };

        let message = match serde_json::from_str::<WsMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Ignoring malformed frame from {}: {}", from, e);
                return None;
            }
        };

        match (self.policy, message) {
            (_, WsMessage::Connected(_)) => {
                debug!("Ignoring CONNECTED sent by client {}", from);
                None
            }
            (RelayPolicy::Broadcast, _) => Some(Outbound {
                recipients: Recipients::AllExcept(from.to_string()),
                payload: text.to_string(),
            }),
            (RelayPolicy::Echo, WsMessage::DrawBeginPath) => {
                *session = Session::default();
                encode(Recipients::All, &WsMessage::DrawBeginPath)
            }
            (RelayPolicy::Echo, WsMessage::Draw(segment)) => {
                session.prev = session.curr;
                session.curr = Some(segment.curr);

                let enriched = Segment {
                    prev: session.prev,
                    from: Some(from.to_string()),
                    ..segment
                };
                encode(Recipients::All, &WsMessage::Draw(enriched))
            }
        }
    }
}

fn encode(recipients: Recipients, message: &WsMessage) -> Option<Outbound> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(Outbound {
            recipients,
            payload,
        }),
        Err(e) => {
            tracing::warn!("Failed to encode {:?}: {}", message, e);
            None
        }
    }
}
