//! Headless session node for realtime spellcasting.
//!
//! # Architecture
//!
//! ```text
//! stdin (JSON lines) ──▶ SessionNode ──▶ CastSession ──▶ stdout (JSON lines)
//!                           │
//!                           ├─→ channel deadline timer
//!                           ├─→ visual tick (channel progress sampling)
//!                           └─→ Ctrl-C / leave ──▶ dispose
//! ```
//!
//! The node is the composition root: it loads the spellbook, provides stub
//! collaborators to the service locator, and builds the session. Transport to
//! other peers is whatever is piped into stdin and out of stdout.

pub mod config;
pub mod logging;
pub mod node;
pub mod stubs;
pub mod transport;

pub use config::NodeConfig;
pub use node::{SessionNode, Step};
pub use transport::Command;
