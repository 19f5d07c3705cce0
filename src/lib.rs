//! Actor-mesh directed graph with token-passing connectivity queries.
//!
//! Every graph vertex is an independent actor owning nothing but its own
//! outgoing edges and a mailbox; there is no central graph structure
//! anywhere. An operator issues three commands (`print`, `add x y`,
//! `conn x y`) and the actors cooperate by relaying a search token across
//! unidirectional channels until the query resolves or its single level of
//! backtracking memory runs out.
//!
//! # Architecture
//!
//! ```text
//! stdin line ──> Controller ──> LinkTable ──> vertex inbox
//!                                                │
//!                     token hops across the fabric
//!                                                │
//!                              resolving vertex ──> shared output
//! ```
//!
//! [`spawn_mesh`] wires the whole group: the channel fabric, one vertex
//! task per id, the background reaper, and a [`Controller`] for command
//! dispatch. The returned [`Coordinator`] owns group shutdown.

pub mod controller;
pub mod error;
pub mod fabric;
pub mod lifecycle;
pub mod messages;
pub mod report;
pub mod vertex;

pub use controller::{Command, Controller};
pub use error::{MeshError, Result};
pub use fabric::{Inbox, LinkTable};
pub use lifecycle::{Coordinator, ShutdownToken};
pub use messages::{SearchToken, VertexId, VertexMessage, VertexSet, MAX_VERTICES};
pub use report::ReportSink;
pub use vertex::VertexActor;

/// Spawn a full mesh of `n` vertex actors on the current runtime.
///
/// Fails before any actor starts if `n` is outside `1..=MAX_VERTICES`.
pub fn spawn_mesh(n: usize, sink: ReportSink) -> Result<(Controller, Coordinator)> {
    if n == 0 || n > MAX_VERTICES {
        return Err(MeshError::Spawn(format!(
            "vertex count {n} outside 1..={MAX_VERTICES}"
        )));
    }

    let (inboxes, links) = fabric::build(n);
    let mut coordinator = Coordinator::new();
    for (id, inbox) in inboxes.into_iter().enumerate() {
        let actor = VertexActor::new(
            id as VertexId,
            inbox,
            links.clone(),
            sink.clone(),
            coordinator.token(),
        );
        coordinator.adopt(tokio::spawn(actor.run()));
    }
    coordinator.spawn_reaper();

    Ok((Controller::new(links, sink), coordinator))
}
