//! Channel fabric: one inbox per vertex, a full grid of send handles.
//!
//! Link `i -> j` is vertex `j`'s inbox sender as held by actor `i`. Receive
//! capability is single-owner (each vertex task takes its [`Inbox`] at
//! spawn); send capability is replicated: every actor and the controller get
//! their own [`LinkTable`], cloned from one prototype built at startup. A
//! holder that observes a send failure retires that entry for itself only;
//! other holders keep their own copy of the link.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{MeshError, Result};
use crate::messages::{VertexId, VertexMessage};

/// Inbox capacity per vertex. Tokens are single-flight per query and command
/// bursts are operator-paced, so a small buffer suffices.
const INBOX_CAPACITY: usize = 64;

/// Receiving end of one vertex's link.
pub type Inbox = mpsc::Receiver<VertexMessage>;

/// One holder's view of every send handle in the mesh.
#[derive(Debug, Clone)]
pub struct LinkTable {
    links: Vec<Option<mpsc::Sender<VertexMessage>>>,
}

/// Build the fabric for `n` vertices.
///
/// Returns the inboxes in id order, each destined for exactly one vertex
/// task, and the prototype [`LinkTable`] every holder clones.
pub fn build(n: usize) -> (Vec<Inbox>, LinkTable) {
    let mut inboxes = Vec::with_capacity(n);
    let mut links = Vec::with_capacity(n);
    for _ in 0..n {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        inboxes.push(rx);
        links.push(Some(tx));
    }
    (inboxes, LinkTable { links })
}

impl LinkTable {
    /// Number of vertices the table was built for.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Whether the link to `to` is still live from this holder's view.
    pub fn is_live(&self, to: VertexId) -> bool {
        self.links
            .get(to as usize)
            .map_or(false, Option::is_some)
    }

    /// Send `msg` to vertex `to`, failing if the link is retired or the
    /// inbox is gone. The caller decides whether that is fatal (controller)
    /// or survivable (vertex actor).
    pub async fn send(&self, to: VertexId, msg: VertexMessage) -> Result<()> {
        let link = self
            .links
            .get(to as usize)
            .and_then(Option::as_ref)
            .ok_or(MeshError::LinkClosed(to))?;
        link.send(msg).await.map_err(|_| MeshError::LinkClosed(to))
    }

    /// Send `msg` to vertex `to`, retiring the link on failure.
    ///
    /// This is the vertex-side failure policy: a broken link is dropped from
    /// this holder's table and the message is lost without surfacing an
    /// error. Sends over an already-retired link are silent no-ops.
    pub async fn forward(&mut self, to: VertexId, msg: VertexMessage) {
        let closed = match self.links.get(to as usize).and_then(Option::as_ref) {
            None => {
                debug!(to, "link already retired, dropping message");
                return;
            }
            Some(link) => link.send(msg).await.is_err(),
        };
        if closed {
            warn!(to, "peer inbox closed, retiring link");
            self.links[to as usize] = None;
        }
    }
}
