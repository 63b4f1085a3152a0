use huddle_core::{PeerId, RoomId};
use std::collections::HashMap;
use tracing::debug;

/// Room membership, in join order.
///
/// Owned by the relay actor, which is the only writer. A room exists while
/// it has at least one member.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Vec<PeerId>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `peer_id` to `room_id` and returns everybody else already there.
    /// Joining twice is a no-op.
    pub fn join(&mut self, room_id: &RoomId, peer_id: &PeerId) -> Vec<PeerId> {
        let members = self.rooms.entry(room_id.clone()).or_default();
        if !members.contains(peer_id) {
            members.push(peer_id.clone());
        }
        members.iter().filter(|p| *p != peer_id).cloned().collect()
    }

    /// Removes `peer_id`; returns whether it was a member.
    pub fn leave(&mut self, room_id: &RoomId, peer_id: &PeerId) -> bool {
        let Some(members) = self.rooms.get_mut(room_id) else {
            return false;
        };
        let before = members.len();
        members.retain(|p| p != peer_id);
        let removed = members.len() != before;

        if members.is_empty() {
            self.rooms.remove(room_id);
            debug!("Room '{}' is empty, evicted", room_id);
        }
        removed
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<PeerId> {
        self.rooms.get(room_id).cloned().unwrap_or_default()
    }

    pub fn contains(&self, room_id: &RoomId, peer_id: &PeerId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|members| members.contains(peer_id))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
