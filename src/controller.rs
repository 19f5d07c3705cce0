//! Text-command layer: parse operator lines, dispatch typed messages.
//!
//! The controller is a thin validation boundary in front of the fabric.
//! Malformed or out-of-bounds commands are answered with the usage menu and
//! dropped; well-formed ones become a single typed message to the vertex
//! they concern, except `print`, which is broadcast with deliberate pacing.

use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::fabric::LinkTable;
use crate::messages::{VertexId, VertexMessage};
use crate::report::ReportSink;

/// Pause between report sends so per-vertex output interleaves readably.
/// Cosmetic, not a correctness requirement.
const REPORT_PACING: Duration = Duration::from_millis(50);

/// Parsed operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Broadcast an adjacency report to every vertex.
    Print,
    /// Record edge `from -> to` at vertex `from`.
    AddEdge { from: VertexId, to: VertexId },
    /// Query reachability `from -> to`, starting at vertex `from`.
    Connect { from: VertexId, to: VertexId },
}

impl Command {
    /// Parse one operator line against a mesh of `n` vertices.
    ///
    /// `None` covers both malformed syntax and out-of-bounds indices; the
    /// caller answers with the usage menu and keeps the stream alive.
    pub fn parse(line: &str, n: usize) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = match (words.next()?, words.next(), words.next(), words.next()) {
            ("print", None, None, None) => Command::Print,
            ("add", Some(x), Some(y), None) => Command::AddEdge {
                from: parse_id(x, n)?,
                to: parse_id(y, n)?,
            },
            ("conn", Some(x), Some(y), None) => Command::Connect {
                from: parse_id(x, n)?,
                to: parse_id(y, n)?,
            },
            _ => return None,
        };
        Some(command)
    }
}

fn parse_id(word: &str, n: usize) -> Option<VertexId> {
    let id: VertexId = word.parse().ok()?;
    ((id as usize) < n).then_some(id)
}

/// Validates operator commands and forwards them into the fabric.
pub struct Controller {
    links: LinkTable,
    sink: ReportSink,
}

impl Controller {
    pub fn new(links: LinkTable, sink: ReportSink) -> Self {
        Self { links, sink }
    }

    /// Mesh size this controller was wired for.
    pub fn vertex_count(&self) -> usize {
        self.links.len()
    }

    /// Handle one operator line.
    ///
    /// Validation failures are swallowed after printing the usage menu. An
    /// `Err` means a vertex inbox is gone while the group should be alive,
    /// which the caller treats as group-fatal.
    pub async fn dispatch_line(&self, line: &str) -> Result<()> {
        match Command::parse(line, self.vertex_count()) {
            Some(command) => self.dispatch(command).await,
            None => {
                self.print_usage();
                Ok(())
            }
        }
    }

    /// Forward a validated command to the vertex actors it concerns.
    pub async fn dispatch(&self, command: Command) -> Result<()> {
        match command {
            Command::Print => {
                info!("command: print");
                for id in 0..self.vertex_count() as VertexId {
                    self.links.send(id, VertexMessage::Report).await?;
                    tokio::time::sleep(REPORT_PACING).await;
                }
            }
            Command::AddEdge { from, to } => {
                info!(from, to, "command: add");
                self.links
                    .send(from, VertexMessage::AddEdge { from, to })
                    .await?;
            }
            Command::Connect { from, to } => {
                info!(from, to, "command: conn");
                self.links
                    .send(from, VertexMessage::ConnectQuery { from, to })
                    .await?;
            }
        }
        Ok(())
    }

    /// The four-line usage menu of the command language.
    pub fn print_usage(&self) {
        let n = self.vertex_count();
        self.sink.emit(format!(
            "USAGE: print\nUSAGE: add x y\nUSAGE: conn x y\nUSAGE: 0<=x<{n} 0<=y<{n}"
        ));
    }
}
