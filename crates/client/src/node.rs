//! Event loop of a `spellcast` process.
//!
//! The node owns one [`CastSession`] and multiplexes four sources with
//! `tokio::select!`: command lines, the next channel deadline, the visual
//! tick, and Ctrl-C. Every handler runs synchronously to completion before
//! the next source is polled.

use anyhow::Result;
use spell_core::{ActorId, Timestamp};
use spell_runtime::{CastSession, Event, EventBus, ReplicationMessage, Topic};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::transport::{self, Command};

/// Result of applying one command.
#[derive(Debug, PartialEq)]
pub enum Step {
    Continue(Option<ReplicationMessage>),
    Leave,
}

pub struct SessionNode {
    session: CastSession,
    started: Instant,
    tick: Duration,
}

impl SessionNode {
    pub fn new(session: CastSession, tick: Duration) -> Self {
        Self {
            session,
            started: Instant::now(),
            tick,
        }
    }

    pub fn session(&self) -> &CastSession {
        &self.session
    }

    /// Session clock: seconds since the node started.
    fn now(&self) -> Timestamp {
        Timestamp::from_secs(self.started.elapsed().as_secs_f64())
    }

    fn instant_of(&self, at: Timestamp) -> Instant {
        self.started + Duration::from_secs_f64(at.as_secs().max(0.0))
    }

    /// Routes one command into the session.
    pub fn apply(&mut self, command: Command, now: Timestamp) -> Step {
        match command {
            Command::Input(input) => Step::Continue(self.session.handle_input(&input, now)),
            Command::Remote { from, message } => {
                self.session.handle_remote(message, from, now);
                Step::Continue(None)
            }
            Command::Page { page } => {
                if !self.session.set_open_page(page) {
                    warn!(target: "spellcast::node", page, "No action on page");
                }
                Step::Continue(None)
            }
            Command::Leave => Step::Leave,
        }
    }

    /// Runs until `leave`, end of input, or Ctrl-C, then disposes every open
    /// cast. Outbound messages are written to `writer` as they are produced.
    pub async fn run<R, W>(mut self, reader: R, writer: &mut W) -> Result<CastSession>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(target: "spellcast::node", tick = ?self.tick, "Session node running");

        loop {
            let deadline = self
                .session
                .next_deadline()
                .map(|at| self.instant_of(at));

            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!(target: "spellcast::node", "Input closed");
                        break;
                    };
                    let command = match transport::parse_command(&line) {
                        Ok(Some(command)) => command,
                        Ok(None) => continue,
                        Err(error) => {
                            warn!(target: "spellcast::node", %error, "Ignoring unreadable line");
                            continue;
                        }
                    };
                    let now = self.now();
                    match self.apply(command, now) {
                        Step::Continue(outbound) => write_lines(writer, outbound).await?,
                        Step::Leave => {
                            info!(target: "spellcast::node", "Leaving session");
                            break;
                        }
                    }
                }
                _ = sleep_until(deadline) => {
                    let outbound = self.session.poll_timeouts(self.now());
                    write_lines(writer, outbound).await?;
                }
                _ = ticker.tick() => self.sample_channels(),
                _ = &mut shutdown => {
                    info!(target: "spellcast::node", "Interrupted");
                    break;
                }
            }
        }

        self.session.dispose(self.now());
        writer.flush().await?;
        Ok(self.session)
    }

    fn sample_channels(&self) {
        for sample in self.session.active_channels(self.now()) {
            trace!(
                target: "spellcast::node",
                action = %sample.action_id,
                actor = %sample.actor,
                progress = sample.progress,
                "Channel"
            );
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn write_lines<W>(
    writer: &mut W,
    outbound: impl IntoIterator<Item = ReplicationMessage>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for message in outbound {
        writer
            .write_all(transport::encode_line(&message)?.as_bytes())
            .await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Logs every bus event until the bus goes away.
pub fn spawn_event_log(events: &EventBus) {
    for (topic, mut rx) in events.subscribe_multiple(&[Topic::Cast, Topic::Replication]) {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(Event::Replication(event)) => {
                        debug!(target: "spellcast::events", ?event, "Replication")
                    }
                    Ok(Event::Cast(event)) => info!(target: "spellcast::events", ?event, "Cast"),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "spellcast::events", ?topic, skipped, "Event log lagged")
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}

/// Peer label for log lines.
pub fn peer_label(peer: Option<ActorId>) -> String {
    peer.map_or_else(|| "unassigned".to_owned(), |peer| peer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spell_content::SpellbookLoader;
    use spell_runtime::InputEvent;

    fn node() -> SessionNode {
        let catalog = SpellbookLoader::load_embedded().unwrap();
        let session = CastSession::builder().catalog(catalog).build().unwrap();
        SessionNode::new(session, Duration::from_millis(50))
    }

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    #[tokio::test]
    async fn commands_route_into_the_session() {
        let mut node = node();

        let Step::Continue(Some(message)) =
            node.apply(Command::Input(InputEvent::down("KeyZ")), at(0.0))
        else {
            panic!("press should replicate");
        };
        assert_eq!(message.action_id.as_str(), "zoltraak");

        assert_eq!(node.apply(Command::Page { page: 4 }, at(0.1)), Step::Continue(None));
        assert_eq!(node.session().open_page(), Some(4));
        assert_eq!(node.apply(Command::Page { page: 40 }, at(0.1)), Step::Continue(None));
        assert_eq!(node.session().open_page(), Some(4));

        assert_eq!(node.apply(Command::Leave, at(0.2)), Step::Leave);
    }

    #[tokio::test]
    async fn remote_commands_never_produce_outbound_traffic() {
        let mut node = node();
        let message = ReplicationMessage {
            action_id: "zoltraak".into(),
            phase: spell_core::Phase::Down,
            origin_position: None,
            direction: None,
            target_id: None,
            channel_payload: None,
        };
        let step = node.apply(
            Command::Remote {
                from: ActorId(2),
                message,
            },
            at(0.0),
        );
        assert_eq!(step, Step::Continue(None));
        assert_eq!(node.session().active_channels(at(1.5)).len(), 1);
    }

    #[tokio::test]
    async fn run_writes_one_line_per_outbound_message_and_disposes() {
        let input = concat!(
            r#"{"type":"input","triggerCode":"KeyZ","phase":"down"}"#,
            "\n\nnot a command\n",
            r#"{"type":"remote","from":5,"message":{"actionId":"zoltraak","phase":"down"}}"#,
            "\n",
            r#"{"type":"leave"}"#,
            "\n",
            r#"{"type":"input","triggerCode":"KeyZ","phase":"up"}"#,
            "\n",
        );
        let mut output = Vec::new();

        let session = node().run(input.as_bytes(), &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 1);
        let sent: ReplicationMessage = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(sent.action_id.as_str(), "zoltraak");
        assert_eq!(sent.phase, spell_core::Phase::Down);

        assert!(session.active_channels(at(0.0)).is_empty());
    }

    #[test]
    fn unassigned_peers_have_a_label() {
        assert_eq!(peer_label(None), "unassigned");
        assert_eq!(peer_label(Some(ActorId(3))), "peer#3");
    }
}
