//! Linear playback queue derived from the canvas graph

use std::collections::HashSet;
use std::sync::Arc;

use super::graph::{Edge, Node};
use super::song::{EdgeId, NodeId, SongId, SongMetadata, TransitionRule};

/// One song in the playback queue and what follows it
#[derive(Clone, Debug)]
pub struct QueueEntry {
    pub node_id: NodeId,
    pub song: Arc<SongMetadata>,
    pub edge_to_next: Option<EdgeId>,
    pub next_song: Option<Arc<SongMetadata>>,
    pub transition: Option<TransitionRule>,
}

impl QueueEntry {
    pub fn has_transition(&self) -> bool {
        self.transition.is_some()
    }
}

/// Walk the graph from its entry node into a simple path.
///
/// The entry node is the first node, in creation order, that nothing plays
/// into. Graphs where every node has an incoming edge produce an empty queue;
/// cycles reachable from the entry node are cut at the first repeat.
pub fn build_queue(nodes: &[Node], edges: &[Edge]) -> Vec<QueueEntry> {
    let targets: HashSet<&NodeId> = edges.iter().map(|edge| &edge.target).collect();
    let Some(start) = nodes.iter().find(|node| !targets.contains(&node.id)) else {
        return Vec::new();
    };

    let mut queue = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(start);

    while let Some(node) = current {
        visited.insert(&node.id);

        // Edges into a missing node or back into the path end the queue here
        let link = edges
            .iter()
            .find(|edge| edge.source == node.id)
            .and_then(|edge| {
                nodes
                    .iter()
                    .find(|next| next.id == edge.target && !visited.contains(&next.id))
                    .map(|next| (edge, next))
            });

        queue.push(QueueEntry {
            node_id: node.id.clone(),
            song: node.song.clone(),
            edge_to_next: link.map(|(edge, _)| edge.id.clone()),
            next_song: link.map(|(_, next)| next.song.clone()),
            transition: link.and_then(|(edge, _)| edge.transition.clone()),
        });

        current = link.map(|(_, next)| next);
    }

    queue
}

pub fn position_of_node(queue: &[QueueEntry], node: &NodeId) -> Option<usize> {
    queue.iter().position(|entry| &entry.node_id == node)
}

/// Index of the first entry playing `song`
pub fn position_of_song(queue: &[QueueEntry], song: &SongId) -> Option<usize> {
    queue.iter().position(|entry| &entry.song.id == song)
}
