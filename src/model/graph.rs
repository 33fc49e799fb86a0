//! Canvas graph: placed songs and the directed connections between them

use std::sync::Arc;

use super::song::{EdgeId, NodeId, SongMetadata, TransitionRule};

/// Canvas position of a node. Only the front end reads it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A song placed on the canvas
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub song: Arc<SongMetadata>,
    pub position: Position,
}

/// "`source` plays into `target`", optionally through a transition clip
#[derive(Clone, Debug)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub transition: Option<TransitionRule>,
}

/// Nodes and edges of the set being built.
///
/// Each node has at most one outgoing and at most one incoming edge, and no
/// edge outlives either of its endpoints.
#[derive(Debug, Default)]
pub struct SetGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    last_stamp: i64,
    revision: u64,
}

impl SetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Incremented by every mutation that changed something
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| &edge.id == id)
    }

    pub fn outgoing(&self, node: &NodeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| &edge.source == node)
    }

    pub fn incoming(&self, node: &NodeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| &edge.target == node)
    }

    pub fn add_node(&mut self, song: Arc<SongMetadata>, position: Position) -> NodeId {
        // Millisecond stamps collide when placements come in quick bursts
        let now = chrono::Utc::now().timestamp_millis();
        let stamp = now.max(self.last_stamp + 1);
        self.last_stamp = stamp;

        let id = NodeId::new(format!("{}-{}", song.id, stamp));
        tracing::debug!(node = %id, song = %song.id, "Node added");
        self.nodes.push(Node {
            id: id.clone(),
            song,
            position,
        });
        self.revision += 1;
        id
    }

    pub fn move_node(&mut self, id: &NodeId, position: Position) -> bool {
        match self.nodes.iter_mut().find(|node| &node.id == id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Remove a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| &node.id != id);
        if self.nodes.len() == before {
            return false;
        }

        self.edges.retain(|edge| &edge.source != id && &edge.target != id);
        tracing::debug!(node = %id, "Node removed");
        self.revision += 1;
        true
    }

    /// Connect `source` into `target`, replacing whatever `source` played
    /// into and whatever played into `target`.
    ///
    /// Self-loops, unknown endpoints and an already existing identical edge
    /// leave the graph untouched and return `None`.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Option<EdgeId> {
        if source == target {
            tracing::debug!(node = %source, "Ignoring self-loop connection");
            return None;
        }
        let source_song = self.node(source)?.song.clone();
        let target_song = self.node(target)?.song.clone();
        if self
            .edges
            .iter()
            .any(|edge| &edge.source == source && &edge.target == target)
        {
            tracing::debug!(%source, %target, "Ignoring duplicate connection");
            return None;
        }

        self.edges
            .retain(|edge| &edge.source != source && &edge.target != target);

        let id = EdgeId::new(format!("edge-{source}-{target}"));
        let transition = source_song.preferred_transition_to(&target_song.id).cloned();
        tracing::debug!(
            edge = %id,
            transition = transition.as_ref().map(|rule| rule.name.as_str()),
            "Nodes connected"
        );
        self.edges.push(Edge {
            id: id.clone(),
            source: source.clone(),
            target: target.clone(),
            transition,
        });
        self.revision += 1;
        Some(id)
    }

    pub fn disconnect(&mut self, id: &EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|edge| &edge.id != id);
        let removed = self.edges.len() != before;
        if removed {
            tracing::debug!(edge = %id, "Edge removed");
            self.revision += 1;
        }
        removed
    }

    /// Attach, replace or clear the transition of an edge.
    pub fn set_edge_transition(&mut self, id: &EdgeId, rule: Option<TransitionRule>) -> bool {
        let Some(edge) = self.edges.iter_mut().find(|edge| &edge.id == id) else {
            return false;
        };
        tracing::debug!(
            edge = %id,
            transition = rule.as_ref().map(|rule| rule.name.as_str()),
            "Edge transition set"
        );
        edge.transition = rule;
        self.revision += 1;
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn song(id: &str, transitions: Vec<TransitionRule>) -> Arc<SongMetadata> {
        Arc::new(
            SongMetadata::new(id, format!("Song {id}"), "Artist", "3:00", format!("{id}.mp3"))
                .unwrap()
                .with_transitions(transitions),
        )
    }

    pub(crate) fn rule(name: &str, target: &str) -> TransitionRule {
        TransitionRule::new(name, target, "2:00", "0:10", format!("{name}.mp3")).unwrap()
    }

    fn graph_with(ids: &[&str]) -> (SetGraph, Vec<NodeId>) {
        let mut graph = SetGraph::new();
        let nodes = ids
            .iter()
            .map(|id| graph.add_node(song(id, vec![]), Position::default()))
            .collect();
        (graph, nodes)
    }

    #[test]
    fn node_ids_are_unique_for_repeated_placements() {
        let mut graph = SetGraph::new();
        let track = song("12", vec![]);
        let a = graph.add_node(track.clone(), Position::default());
        let b = graph.add_node(track.clone(), Position::default());
        let c = graph.add_node(track, Position::default());

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(a.as_str().starts_with("12-"));
    }

    #[test]
    fn reconnecting_a_source_replaces_its_outgoing_edge() {
        let (mut graph, n) = graph_with(&["a", "b", "c"]);

        graph.connect(&n[0], &n[1]).unwrap();
        let edge = graph.connect(&n[0], &n[2]).unwrap();

        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.outgoing(&n[0]).unwrap().id, edge);
        assert_eq!(graph.outgoing(&n[0]).unwrap().target, n[2]);
        assert!(graph.incoming(&n[1]).is_none());
    }

    #[test]
    fn reconnecting_a_target_replaces_its_incoming_edge() {
        let (mut graph, n) = graph_with(&["a", "b", "c"]);

        graph.connect(&n[0], &n[2]).unwrap();
        graph.connect(&n[1], &n[2]).unwrap();

        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.incoming(&n[2]).unwrap().source, n[1]);
        assert!(graph.outgoing(&n[0]).is_none());
    }

    #[test]
    fn self_loops_are_ignored() {
        let (mut graph, n) = graph_with(&["a", "b"]);
        graph.connect(&n[0], &n[1]).unwrap();
        let revision = graph.revision();

        assert!(graph.connect(&n[0], &n[0]).is_none());
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.revision(), revision);
    }

    #[test]
    fn duplicate_connection_keeps_the_chosen_transition() {
        let (mut graph, n) = graph_with(&["a", "b"]);
        let edge = graph.connect(&n[0], &n[1]).unwrap();
        graph.set_edge_transition(&edge, Some(rule("manual", "ANY")));

        assert!(graph.connect(&n[0], &n[1]).is_none());
        assert_eq!(graph.edge(&edge).unwrap().transition.as_ref().unwrap().name, "manual");
    }

    #[test]
    fn connecting_unknown_nodes_is_ignored() {
        let (mut graph, n) = graph_with(&["a"]);
        assert!(graph.connect(&n[0], &NodeId::new("ghost")).is_none());
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn removing_a_node_cascades_to_its_edges() {
        let (mut graph, n) = graph_with(&["a", "b", "c"]);
        graph.connect(&n[0], &n[1]).unwrap();
        graph.connect(&n[1], &n[2]).unwrap();

        assert!(graph.remove_node(&n[1]));

        assert!(graph.edges().is_empty());
        assert_eq!(graph.nodes().len(), 2);
        assert!(!graph.remove_node(&n[1]));
    }

    #[test]
    fn connect_preselects_the_preferred_transition() {
        let mut graph = SetGraph::new();
        let a = graph.add_node(
            song("12", vec![rule("wild", "ANY").as_default(), rule("exact", "17")]),
            Position::default(),
        );
        let b = graph.add_node(song("17", vec![]), Position::default());
        let c = graph.add_node(song("4", vec![]), Position::default());

        let edge = graph.connect(&a, &b).unwrap();
        assert_eq!(graph.edge(&edge).unwrap().transition.as_ref().unwrap().name, "exact");

        let edge = graph.connect(&a, &c).unwrap();
        assert_eq!(graph.edge(&edge).unwrap().transition.as_ref().unwrap().name, "wild");

        let back = graph.connect(&b, &a).unwrap();
        assert!(graph.edge(&back).unwrap().transition.is_none());
    }

    #[test]
    fn transition_can_be_replaced_and_cleared() {
        let (mut graph, n) = graph_with(&["a", "b"]);
        let edge = graph.connect(&n[0], &n[1]).unwrap();

        assert!(graph.set_edge_transition(&edge, Some(rule("t", "b"))));
        assert_eq!(graph.edge(&edge).unwrap().target, n[1]);
        assert!(graph.set_edge_transition(&edge, None));
        assert!(graph.edge(&edge).unwrap().transition.is_none());
        assert!(!graph.set_edge_transition(&EdgeId::new("missing"), None));
    }
}
