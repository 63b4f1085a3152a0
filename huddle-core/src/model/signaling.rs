use crate::error::SignalError;
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Events a browser sends to the relay.
///
/// Negotiation payloads stay as raw JSON: the relay routes them by `to` and
/// never looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientSignal {
    JoinRoom(RoomId),
    LeaveRoom,
    SendOffer {
        to: PeerId,
        offer: Value,
    },
    SendAnswer {
        to: PeerId,
        answer: Value,
    },
    SendIce {
        to: PeerId,
        candidate: Value,
    },
    /// `room` is accepted for compatibility and ignored; the relay uses the
    /// room the connection joined.
    RaiseHand {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomId>,
    },
    SendChat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomId>,
        message: String,
    },
}

/// Events the relay sends to a browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerSignal {
    Welcome {
        peer_id: PeerId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    AllUsers(Vec<PeerId>),
    UserJoined(PeerId),
    UserLeft(PeerId),
    ReceiveOffer {
        from: PeerId,
        offer: Value,
    },
    ReceiveAnswer {
        from: PeerId,
        answer: Value,
    },
    ReceiveIce {
        from: PeerId,
        candidate: Value,
    },
    UserRaisedHand {
        sender_id: PeerId,
    },
    ReceiveChat {
        sender_id: PeerId,
        message: String,
    },
}

impl ClientSignal {
    pub fn to_json(&self) -> Result<String, SignalError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SignalError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerSignal {
    pub fn to_json(&self) -> Result<String, SignalError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SignalError> {
        Ok(serde_json::from_str(text)?)
    }
}
