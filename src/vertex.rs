//! Vertex actor: the message protocol behind every graph vertex.
//!
//! Each vertex exclusively owns its outgoing-edge set and a single slot of
//! backtracking memory; all interaction goes through its inbox. A
//! connectivity query is decomposed into a [`SearchToken`] relayed from
//! vertex to vertex: every hop marks the current vertex visited, picks the
//! greatest-index unvisited neighbor, and falls back to one backtrack hop
//! toward the remembered predecessor when the walk dead-ends. Whichever
//! vertex resolves the query prints the result; the origin is not told.

use tokio::select;
use tracing::{debug, trace};

use crate::fabric::{Inbox, LinkTable};
use crate::lifecycle::ShutdownToken;
use crate::messages::{SearchToken, VertexId, VertexMessage, VertexSet};
use crate::report::ReportSink;

/// A single graph vertex and the task state around it.
pub struct VertexActor {
    id: VertexId,
    /// Outgoing edges only. Never touched by anyone else.
    edges: VertexSet,
    /// Single hop of backtracking memory. Overwritten on every forward hop,
    /// reset when a new query originates here. Deliberately not a path
    /// stack: a walk survives exactly one level of backtracking.
    predecessor: Option<VertexId>,
    inbox: Inbox,
    links: LinkTable,
    sink: ReportSink,
    shutdown: ShutdownToken,
}

impl VertexActor {
    pub fn new(
        id: VertexId,
        inbox: Inbox,
        links: LinkTable,
        sink: ReportSink,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            id,
            edges: VertexSet::new(),
            predecessor: None,
            inbox,
            links,
            sink,
            shutdown,
        }
    }

    /// Receive-dispatch loop. Exits on group shutdown or when the inbox
    /// closes.
    pub async fn run(mut self) {
        debug!(vertex = self.id, "vertex actor started");
        loop {
            select! {
                _ = self.shutdown.cancelled() => break,
                msg = self.inbox.recv() => match msg {
                    Some(msg) => self.handle(msg).await,
                    None => break,
                },
            }
        }
        debug!(vertex = self.id, "vertex actor stopped");
    }

    async fn handle(&mut self, msg: VertexMessage) {
        trace!(vertex = self.id, ?msg, "handling message");
        match msg {
            VertexMessage::Report => self.report_adjacency(),
            VertexMessage::AddEdge { from, to } => {
                debug_assert_eq!(from, self.id);
                self.edges.insert(to);
            }
            VertexMessage::ConnectQuery { from, to } => self.start_query(from, to).await,
            VertexMessage::Token(token) => self.relay(token).await,
        }
    }

    /// Emit this vertex's adjacency as one block, so concurrently reporting
    /// vertices interleave per block rather than per line.
    fn report_adjacency(&self) {
        let mut block = format!("Vertex {} is connected with vertices:", self.id);
        for neighbor in self.edges.iter() {
            block.push_str(&format!("\n{neighbor}"));
        }
        self.sink.emit(block);
    }

    /// Query entry point at the origin vertex.
    async fn start_query(&mut self, from: VertexId, to: VertexId) {
        debug_assert_eq!(from, self.id);
        // A direct edge resolves without engaging the fabric at all.
        if self.edges.contains(to) {
            self.resolve_connected(from, to);
            return;
        }

        // Fresh query: fresh predecessor chain, fresh visited-set.
        self.predecessor = None;
        let visited = VertexSet::single(self.id);
        match self.next_hop(visited) {
            Some(next) => {
                let token = SearchToken {
                    sender: self.id,
                    origin: from,
                    target: to,
                    returning: false,
                    visited,
                };
                self.links.forward(next, VertexMessage::Token(token)).await;
            }
            // No eligible neighbor: the walk never leaves the origin.
            None => self.resolve_unreachable(from, to),
        }
    }

    /// Relay one hop of an in-flight query.
    async fn relay(&mut self, token: SearchToken) {
        let SearchToken {
            sender,
            origin,
            target,
            returning,
            mut visited,
        } = token;

        // A direct edge to the target ends the walk wherever it stands.
        if self.edges.contains(target) {
            self.resolve_connected(origin, target);
            return;
        }
        visited.insert(self.id);

        // Effective upstream vertex for this hop. A backtrack hop swaps in
        // the remembered predecessor; a forward hop records its sender into
        // the single predecessor slot.
        let upstream = if returning {
            match self.predecessor {
                // Backtracked into a vertex with no memory left.
                None => {
                    self.resolve_unreachable(origin, target);
                    return;
                }
                Some(predecessor) => predecessor,
            }
        } else {
            self.predecessor = Some(sender);
            sender
        };

        // Greatest unvisited neighbor wins; with none left, bounce the token
        // upstream as a backtrack hop.
        let (next, returning) = match self.next_hop(visited) {
            Some(next) => (next, false),
            None => (upstream, true),
        };
        let hop = SearchToken {
            sender: self.id,
            origin,
            target,
            returning,
            visited,
        };
        self.links.forward(next, VertexMessage::Token(hop)).await;
    }

    /// Greatest-index neighbor not yet visited, or `None`.
    ///
    /// Scans ascending and keeps overwriting the candidate so the highest id
    /// wins. The last-match-wins scan is the tie-break the whole protocol's
    /// determinism rests on.
    fn next_hop(&self, visited: VertexSet) -> Option<VertexId> {
        let mut next = None;
        for neighbor in self.edges.iter() {
            if !visited.contains(neighbor) {
                next = Some(neighbor);
            }
        }
        next
    }

    fn resolve_connected(&self, x: VertexId, y: VertexId) {
        self.sink
            .emit(format!("There is connection between vertices {x} - {y}"));
    }

    fn resolve_unreachable(&self, x: VertexId, y: VertexId) {
        self.sink
            .emit(format!("There is no connection between vertices {x} - {y}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fabric;
    use crate::lifecycle::Coordinator;

    /// Actor for vertex `id` in a mesh of `n`, with the peer inboxes and the
    /// capture buffer it reports into.
    fn test_actor(
        id: VertexId,
        n: usize,
    ) -> (
        VertexActor,
        Vec<Inbox>,
        std::sync::Arc<parking_lot::Mutex<Vec<String>>>,
    ) {
        let (mut inboxes, links) = fabric::build(n);
        let own_inbox = inboxes.remove(id as usize);
        let (sink, buffer) = ReportSink::capture();
        let actor = VertexActor::new(id, own_inbox, links, sink, Coordinator::new().token());
        (actor, inboxes, buffer)
    }

    async fn add_edges(actor: &mut VertexActor, targets: &[VertexId]) {
        for &to in targets {
            actor
                .handle(VertexMessage::AddEdge { from: actor.id, to })
                .await;
        }
    }

    #[tokio::test]
    async fn next_hop_picks_greatest_eligible_neighbor() {
        let (mut actor, _peers, _buffer) = test_actor(0, 5);
        add_edges(&mut actor, &[1, 3, 4]).await;

        assert_eq!(actor.next_hop(VertexSet::single(0)), Some(4));

        let mut visited = VertexSet::single(0);
        visited.insert(4);
        assert_eq!(actor.next_hop(visited), Some(3));

        for id in [1, 3] {
            visited.insert(id);
        }
        assert_eq!(actor.next_hop(visited), None);
    }

    #[tokio::test]
    async fn add_edge_twice_reports_one_neighbor() {
        let (mut actor, _peers, buffer) = test_actor(0, 3);
        add_edges(&mut actor, &[1, 1]).await;
        actor.handle(VertexMessage::Report).await;
        assert_eq!(*buffer.lock(), vec!["Vertex 0 is connected with vertices:\n1"]);
    }

    #[tokio::test]
    async fn direct_edge_resolves_without_token_traffic() {
        let (mut actor, mut peers, buffer) = test_actor(0, 3);
        add_edges(&mut actor, &[1]).await;
        actor
            .handle(VertexMessage::ConnectQuery { from: 0, to: 1 })
            .await;

        assert_eq!(
            *buffer.lock(),
            vec!["There is connection between vertices 0 - 1"]
        );
        // The query resolved at the origin: no peer saw anything.
        for peer in &mut peers {
            assert!(peer.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn query_with_no_neighbors_fails_at_origin() {
        let (mut actor, mut peers, buffer) = test_actor(1, 3);
        actor
            .handle(VertexMessage::ConnectQuery { from: 1, to: 0 })
            .await;

        assert_eq!(
            *buffer.lock(),
            vec!["There is no connection between vertices 1 - 0"]
        );
        for peer in &mut peers {
            assert!(peer.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn query_launches_token_to_greatest_neighbor() {
        let (mut actor, mut peers, buffer) = test_actor(0, 4);
        add_edges(&mut actor, &[1, 2]).await;
        actor
            .handle(VertexMessage::ConnectQuery { from: 0, to: 3 })
            .await;

        assert!(buffer.lock().is_empty());
        // Peer inboxes after removing vertex 0's own: index 1 is vertex 2.
        let msg = peers[1].try_recv().expect("token should reach vertex 2");
        assert_eq!(
            msg,
            VertexMessage::Token(SearchToken {
                sender: 0,
                origin: 0,
                target: 3,
                returning: false,
                visited: VertexSet::single(0),
            })
        );
        assert!(peers[0].try_recv().is_err());
    }

    #[tokio::test]
    async fn forward_token_records_predecessor_and_hops_on() {
        let (mut actor, mut peers, _buffer) = test_actor(1, 5);
        add_edges(&mut actor, &[2, 3]).await;

        let mut visited = VertexSet::single(0);
        visited.insert(3);
        actor
            .handle(VertexMessage::Token(SearchToken {
                sender: 0,
                origin: 0,
                target: 4,
                returning: false,
                visited,
            }))
            .await;

        assert_eq!(actor.predecessor, Some(0));
        // Greatest neighbor 3 is visited, so the hop goes to 2.
        let msg = peers[1].try_recv().expect("token should reach vertex 2");
        let VertexMessage::Token(hop) = msg else {
            panic!("expected a token");
        };
        assert_eq!(hop.sender, 1);
        assert!(!hop.returning);
        assert!(hop.visited.contains(1));
    }

    #[tokio::test]
    async fn dead_end_bounces_token_back_to_sender() {
        let (mut actor, mut peers, _buffer) = test_actor(2, 3);
        // No outgoing edges at all: instant dead end.
        actor
            .handle(VertexMessage::Token(SearchToken {
                sender: 0,
                origin: 0,
                target: 1,
                returning: false,
                visited: VertexSet::single(0),
            }))
            .await;

        // Peer inboxes after removing vertex 2's own: index 0 is vertex 0.
        let msg = peers[0].try_recv().expect("backtrack hop should reach vertex 0");
        let VertexMessage::Token(hop) = msg else {
            panic!("expected a token");
        };
        assert!(hop.returning);
        assert_eq!(hop.sender, 2);
        assert!(hop.visited.contains(2));
    }

    #[tokio::test]
    async fn returning_token_without_predecessor_fails_the_query() {
        let (mut actor, _peers, buffer) = test_actor(0, 3);
        add_edges(&mut actor, &[1]).await;
        // Fresh query resets the slot, so the origin holds no predecessor.
        actor.predecessor = None;

        let mut visited = VertexSet::single(0);
        visited.insert(1);
        actor
            .handle(VertexMessage::Token(SearchToken {
                sender: 1,
                origin: 0,
                target: 2,
                returning: true,
                visited,
            }))
            .await;

        assert_eq!(
            *buffer.lock(),
            vec!["There is no connection between vertices 0 - 2"]
        );
    }

    #[tokio::test]
    async fn returning_token_resumes_from_predecessor() {
        let (mut actor, mut peers, _buffer) = test_actor(1, 5);
        add_edges(&mut actor, &[2, 4]).await;
        actor.predecessor = Some(0);

        // Everything this vertex can reach is already visited, so the hop
        // must bounce toward the remembered predecessor.
        let mut visited = VertexSet::single(0);
        for id in [1, 2, 4] {
            visited.insert(id);
        }
        actor
            .handle(VertexMessage::Token(SearchToken {
                sender: 2,
                origin: 0,
                target: 3,
                returning: true,
                visited,
            }))
            .await;

        // Peer inboxes after removing vertex 1's own: index 0 is vertex 0.
        let msg = peers[0].try_recv().expect("hop should reach the predecessor");
        let VertexMessage::Token(hop) = msg else {
            panic!("expected a token");
        };
        assert!(hop.returning);
        assert_eq!(hop.sender, 1);
    }

    #[tokio::test]
    async fn token_resolves_where_the_direct_edge_is() {
        let (mut actor, mut peers, buffer) = test_actor(1, 3);
        add_edges(&mut actor, &[2]).await;
        actor
            .handle(VertexMessage::Token(SearchToken {
                sender: 0,
                origin: 0,
                target: 2,
                returning: false,
                visited: VertexSet::single(0),
            }))
            .await;

        assert_eq!(
            *buffer.lock(),
            vec!["There is connection between vertices 0 - 2"]
        );
        // Resolution ends the walk: nothing was forwarded.
        for peer in &mut peers {
            assert!(peer.try_recv().is_err());
        }
    }
}
