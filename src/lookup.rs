// Owning-player resolution: walk up from the overlay's node to the nearest player.

use std::collections::HashMap;

use crate::player::PlayerHandle;
use crate::types::NodeId;

/// Finds the player an overlay node belongs to.
pub trait PlayerLookup {
    fn find_owning_player(&self, node: NodeId) -> Option<PlayerHandle>;
}

/// Minimal document tree: parent links plus the nodes that are players.
#[derive(Debug, Default)]
pub struct NodeTree {
    parents: HashMap<NodeId, NodeId>,
    players: HashMap<NodeId, PlayerHandle>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` as a child of `parent`.
    pub fn insert(&mut self, node: NodeId, parent: NodeId) {
        self.parents.insert(node, parent);
    }

    /// Detach `node` from its parent. Descendants stay attached to it.
    pub fn remove(&mut self, node: NodeId) {
        self.parents.remove(&node);
    }

    pub fn mount_player(&mut self, node: NodeId, player: PlayerHandle) {
        self.players.insert(node, player);
    }

    pub fn unmount_player(&mut self, node: NodeId) -> Option<PlayerHandle> {
        self.players.remove(&node)
    }
}

impl PlayerLookup for NodeTree {
    fn find_owning_player(&self, node: NodeId) -> Option<PlayerHandle> {
        let mut current = Some(node);
        // Bounded by the number of links so a malformed cycle cannot spin forever.
        for _ in 0..=self.parents.len() {
            let id = current?;
            if let Some(player) = self.players.get(&id) {
                return Some(player.clone());
            }
            current = self.parents.get(&id).copied();
        }
        None
    }
}
