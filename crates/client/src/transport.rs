//! Line-delimited JSON framing on stdin/stdout.
//!
//! Each stdin line is one [`Command`]:
//!
//! ```text
//! {"type":"input","triggerCode":"KeyZ","phase":"down"}
//! {"type":"remote","from":3,"message":{"actionId":"zoltraak","phase":"down"}}
//! {"type":"page","page":4}
//! {"type":"leave"}
//! ```
//!
//! Each stdout line is one outbound [`ReplicationMessage`].

use serde::Deserialize;
use spell_core::ActorId;
use spell_runtime::{InputEvent, ReplicationMessage};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Decoded local press or release.
    Input(InputEvent),
    /// A peer's cast, tagged with the peer the transport received it from.
    Remote {
        from: ActorId,
        message: ReplicationMessage,
    },
    /// Turn the spellbook.
    Page { page: u32 },
    /// Leave the session.
    Leave,
}

/// Parses one stdin line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Frames an outbound message as a single line.
pub fn encode_line(message: &ReplicationMessage) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}
