//! Typed messages exchanged across the channel fabric.
//!
//! Every vertex inbox carries exactly one message type, [`VertexMessage`].
//! Connectivity queries travel as a [`SearchToken`] that accumulates its
//! visited-set and backtracking state hop by hop, instead of being answered
//! by any single recipient.

/// Vertex identifier. The mesh never exceeds [`MAX_VERTICES`] vertices, so
/// ids stay within a single decimal digit.
pub type VertexId = u8;

/// Upper bound on the mesh size, fixed at startup.
pub const MAX_VERTICES: usize = 10;

/// Fixed-capacity set of vertex ids backed by a bitmap.
///
/// Serves both as a vertex's outgoing-edge set and as the visited-set a
/// search token carries. Insertion is idempotent: membership is a single
/// present/absent bit, so adding the same id twice changes nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexSet(u16);

impl VertexSet {
    pub fn new() -> Self {
        Self(0)
    }

    /// Set containing only `id`.
    pub fn single(id: VertexId) -> Self {
        let mut set = Self::new();
        set.insert(id);
        set
    }

    pub fn insert(&mut self, id: VertexId) {
        debug_assert!((id as usize) < MAX_VERTICES);
        self.0 |= 1 << id;
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.0 & (1 << id) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Member ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..MAX_VERTICES as VertexId).filter(move |id| self.contains(*id))
    }
}

/// One hop of an in-flight connectivity query.
///
/// The token is the entire state of the search: whichever vertex holds it
/// owns the query until it forwards, resolves, or drops it. `visited` is
/// carried by value and only ever grows along the walk; `returning` marks a
/// backtrack hop toward a predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchToken {
    /// Vertex that forwarded the token into the current inbox.
    pub sender: VertexId,
    /// Vertex the query started from.
    pub origin: VertexId,
    /// Vertex the query is looking for.
    pub target: VertexId,
    /// True when the token is backtracking.
    pub returning: bool,
    /// Every vertex the forward walk has passed through.
    pub visited: VertexSet,
}

/// Messages a vertex actor can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexMessage {
    /// Print this vertex's adjacency to the shared output.
    Report,
    /// Record the outgoing edge `from -> to`. The controller routes this to
    /// vertex `from` only.
    AddEdge { from: VertexId, to: VertexId },
    /// Start a connectivity query `from -> to` at vertex `from`.
    ConnectQuery { from: VertexId, to: VertexId },
    /// Relay hop of an in-flight query.
    Token(SearchToken),
}
