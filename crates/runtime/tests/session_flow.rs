use std::sync::Arc;

use spell_content::SpellbookLoader;
use spell_core::{
    ActionCatalog, ActionDefinition, ActorId, CAMERA, CameraPose, CameraRig, ChannelCurve, Easing,
    Phase, ReleaseFlags, RemoteReplay, ServiceLocator, Timestamp, Trigger, Vec3,
};
use spell_runtime::{
    CastEvent, CastSession, Event, InputEvent, ReplicationEvent, RuntimeConfig, RuntimeError,
    Topic,
};
use tokio::sync::broadcast::Receiver;

fn at(secs: f64) -> Timestamp {
    Timestamp::from_secs(secs)
}

fn catalog() -> ActionCatalog {
    let mut catalog = ActionCatalog::new();
    catalog
        .register(
            ActionDefinition::builder("fireball", Trigger::shape("circle"))
                .page(0)
                .cooldown(5.0)
                .channel(2.0, vec![ChannelCurve::new("size", 0.5, 2.0, Easing::Quadratic)])
                .build()
                .unwrap(),
        )
        .unwrap();
    catalog
        .register(
            ActionDefinition::builder("zoltraak", Trigger::hold_key("KeyZ"))
                .page(1)
                .channel(3.0, vec![ChannelCurve::new("damage", 1.0, 10.0, Easing::Cubic)])
                .build()
                .unwrap(),
        )
        .unwrap();
    catalog
}

fn session() -> CastSession {
    CastSession::builder().catalog(catalog()).build().unwrap()
}

fn drain(rx: &mut Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// ================================================================
// Local input
// ================================================================

#[test]
fn fireball_presses_replicate_only_when_they_cast() {
    let mut session = session();

    let down = session
        .handle_input(&InputEvent::down("circle"), at(0.0))
        .expect("first press casts");
    assert_eq!(down.phase, Phase::Down);
    assert!(down.channel_payload.is_none());

    let up = session
        .handle_input(&InputEvent::up("circle"), at(1.0))
        .expect("release replicates");
    assert_eq!(up.channel_payload.as_ref().map(|p| p.progress), Some(0.5));

    assert!(session.handle_input(&InputEvent::down("circle"), at(2.0)).is_none());
    assert!(session.handle_input(&InputEvent::up("circle"), at(2.1)).is_none());
    assert!(session.handle_input(&InputEvent::down("circle"), at(6.0)).is_some());
}

#[test]
fn release_without_press_does_nothing_and_sends_nothing() {
    let mut session = session();
    let mut cast = session.events().subscribe(Topic::Cast);
    let mut replication = session.events().subscribe(Topic::Replication);

    assert!(session.handle_input(&InputEvent::up("KeyZ"), at(1.0)).is_none());
    assert!(session.handle_input(&InputEvent::up("unbound"), at(1.0)).is_none());

    assert_eq!(
        drain(&mut cast),
        vec![Event::Cast(CastEvent::Rejected {
            action_id: "zoltraak".into(),
            code: "CAST_NOT_ACTIVE",
        })]
    );
    assert!(drain(&mut replication).is_empty());
}

#[test]
fn shared_shape_resolves_to_the_open_page() {
    let catalog = SpellbookLoader::load_embedded().unwrap();
    let mut session = CastSession::builder().catalog(catalog).build().unwrap();
    assert_eq!(session.open_page(), Some(0));

    let message = session
        .handle_input(&InputEvent::down("circle"), at(0.0))
        .unwrap();
    assert_eq!(message.action_id.as_str(), "fireball");
    assert!(session.handle_input(&InputEvent::up("circle"), at(0.2)).is_some());

    assert!(session.set_open_page(4));
    assert!(!session.set_open_page(40));
    let message = session
        .handle_input(&InputEvent::down("circle"), at(0.5))
        .unwrap();
    assert_eq!(message.action_id.as_str(), "gust");

    // Each release goes to the action its press resolved to.
    session.set_open_page(0);
    let release = session.handle_input(&InputEvent::up("circle"), at(1.0)).unwrap();
    assert_eq!(release.action_id.as_str(), "gust");
}

#[test]
fn page_turn_mid_hold_never_strands_the_first_action() {
    let mut catalog = ActionCatalog::new();
    for (id, page) in [("a", 0), ("b", 1)] {
        catalog
            .register(
                ActionDefinition::builder(id, Trigger::shape("circle"))
                    .page(page)
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }
    let mut session = CastSession::builder().catalog(catalog).build().unwrap();

    let press = session.handle_input(&InputEvent::down("circle"), at(0.0));
    assert_eq!(press.unwrap().action_id.as_str(), "a");

    // The same shape again while still held does not rebind it to page 1.
    session.set_open_page(1);
    assert!(session.handle_input(&InputEvent::down("circle"), at(0.1)).is_none());

    let release = session.handle_input(&InputEvent::up("circle"), at(0.2));
    assert_eq!(release.unwrap().action_id.as_str(), "a");
    assert!(!session.catalog().get("a").unwrap().is_key_down());
    assert!(session.handle_input(&InputEvent::up("circle"), at(0.3)).is_none());

    session.set_open_page(0);
    for t in [1.0, 10.0, 100.0] {
        let press = session.handle_input(&InputEvent::down("circle"), at(t));
        assert_eq!(press.unwrap().action_id.as_str(), "a");
        assert!(session.handle_input(&InputEvent::up("circle"), at(t + 0.5)).is_some());
    }

    session.set_open_page(1);
    let press = session.handle_input(&InputEvent::down("circle"), at(200.0));
    assert_eq!(press.unwrap().action_id.as_str(), "b");
}

struct FixedCamera;

impl CameraRig for FixedCamera {
    fn query_camera_pose(&self) -> CameraPose {
        CameraPose {
            position: Vec3::new(1.0, 1.7, 0.0),
            direction: Vec3::FORWARD,
        }
    }

    fn query_target(&self) -> Option<String> {
        Some("training_dummy".into())
    }
}

#[test]
fn local_casts_are_aimed_from_the_camera() {
    let locator = ServiceLocator::shared();
    locator.provide(CAMERA, Arc::new(FixedCamera) as Arc<dyn CameraRig>);
    let mut session = CastSession::builder()
        .catalog(catalog())
        .locator(locator)
        .build()
        .unwrap();

    let message = session
        .handle_input(&InputEvent::down("KeyZ"), at(0.0))
        .unwrap();
    assert_eq!(message.origin_position, Some(Vec3::new(1.0, 1.7, 0.0)));
    assert_eq!(message.direction, Some(Vec3::FORWARD));
    assert_eq!(message.target_id.as_deref(), Some("training_dummy"));
}

// ================================================================
// Replication between two peers
// ================================================================

#[test]
fn peer_replays_the_casters_channel_outcome() {
    let mut alice = session();
    let mut bob = session();
    let alice_id = ActorId(1);

    let down = alice.handle_input(&InputEvent::down("KeyZ"), at(0.0)).unwrap();
    let up = alice.handle_input(&InputEvent::up("KeyZ"), at(1.5)).unwrap();
    let wire = serde_json::to_string(&up).unwrap();

    assert_eq!(bob.handle_remote(down, alice_id, at(100.0)), Some(RemoteReplay::Started));
    assert_eq!(
        bob.channel_progress(alice_id, "zoltraak", at(101.5)),
        Some(0.5)
    );

    // Bob's clock says 2.9s; Alice's computed outcome wins.
    let Some(RemoteReplay::Released(summary)) = bob.handle_remote_json(&wire, alice_id, at(102.9))
    else {
        panic!("expected a release");
    };
    assert_eq!(summary.progress(), Some(0.5));
    assert!((summary.derived("damage").unwrap() - 2.125).abs() < 1e-12);
    assert!(summary.flags.contains(ReleaseFlags::REMOTE));
}

#[test]
fn remote_casts_bypass_cooldown_and_are_not_echoed() {
    let mut session = session();
    let mut replication = session.events().subscribe(Topic::Replication);
    let peer = ActorId(2);

    assert!(session.handle_input(&InputEvent::down("circle"), at(0.0)).is_some());
    drain(&mut replication);

    let raw = r#"{"actionId":"fireball","phase":"down"}"#;
    for t in [0.1, 0.2] {
        assert_eq!(
            session.handle_remote_json(raw, peer, at(t)),
            Some(RemoteReplay::Started)
        );
    }

    let events = drain(&mut replication);
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| matches!(e, Event::Replication(ReplicationEvent::Received { .. }))));
    assert_eq!(
        session.catalog().get("fireball").unwrap().last_cast(),
        Some(at(0.0))
    );
}

#[test]
fn bad_inbound_messages_are_dropped() {
    let config = RuntimeConfig {
        peer_id: Some(ActorId(7)),
        ..RuntimeConfig::default()
    };
    let mut session = CastSession::builder()
        .config(config)
        .catalog(catalog())
        .build()
        .unwrap();
    let mut replication = session.events().subscribe(Topic::Replication);

    let echo = r#"{"actionId":"fireball","phase":"down"}"#;
    assert!(session.handle_remote_json(echo, ActorId(7), at(0.0)).is_none());
    assert!(session.handle_remote_json("not json", ActorId(3), at(0.0)).is_none());
    assert!(session
        .handle_remote_json(r#"{"actionId":"meteor","phase":"up"}"#, ActorId(3), at(0.0))
        .is_none());

    let codes: Vec<_> = drain(&mut replication)
        .into_iter()
        .filter_map(|event| match event {
            Event::Replication(ReplicationEvent::Dropped { code, .. }) => Some(code),
            _ => None,
        })
        .collect();
    assert_eq!(
        codes,
        vec![
            "REPLICATION_INVALID_SENDER",
            "REPLICATION_MALFORMED",
            "REPLICATION_UNKNOWN_ACTION",
        ]
    );
}

// ================================================================
// Timers and teardown
// ================================================================

#[test]
fn channel_timeout_releases_and_replicates_once() {
    let mut session = session();
    let mut cast = session.events().subscribe(Topic::Cast);

    session.handle_input(&InputEvent::down("KeyZ"), at(10.0));
    assert_eq!(session.next_deadline(), Some(at(13.0)));
    assert!(session.poll_timeouts(at(12.9)).is_empty());

    let outbound = session.poll_timeouts(at(13.2));
    assert_eq!(outbound.len(), 1);
    let payload = outbound[0].channel_payload.as_ref().unwrap();
    assert_eq!(payload.progress, 1.0);
    assert_eq!(payload.derived["damage"], 10.0);

    assert!(session.poll_timeouts(at(20.0)).is_empty());
    assert!(session.next_deadline().is_none());
    assert!(session.handle_input(&InputEvent::up("KeyZ"), at(20.0)).is_none());

    let timed_out = drain(&mut cast)
        .into_iter()
        .filter(|e| matches!(e, Event::Cast(CastEvent::TimedOut { .. })))
        .count();
    assert_eq!(timed_out, 1);
}

#[test]
fn dispose_releases_everything_without_replication() {
    let mut session = session();
    let mut replication = session.events().subscribe(Topic::Replication);

    session.handle_input(&InputEvent::down("KeyZ"), at(0.0));
    session.handle_remote_json(
        r#"{"actionId":"zoltraak","phase":"down"}"#,
        ActorId(4),
        at(0.0),
    );
    drain(&mut replication);

    let released = session.dispose(at(1.0));
    assert_eq!(released.len(), 2);
    assert!(released.iter().all(|s| s.flags.contains(ReleaseFlags::DISPOSED)));
    assert!(drain(&mut replication).is_empty());
    assert!(session.active_channels(at(1.0)).is_empty());
    assert!(session.handle_input(&InputEvent::up("KeyZ"), at(1.1)).is_none());
}

#[test]
fn active_channels_lists_local_and_remote_sessions() {
    let mut session = session();
    session.handle_input(&InputEvent::down("KeyZ"), at(0.0));
    session.handle_remote_json(
        r#"{"actionId":"zoltraak","phase":"down"}"#,
        ActorId(4),
        at(1.5),
    );

    let samples = session.active_channels(at(3.0));
    let summary: Vec<_> = samples.iter().map(|s| (s.actor, s.progress)).collect();
    assert_eq!(summary, vec![(ActorId::LOCAL, 1.0), (ActorId(4), 0.5)]);
}

#[test]
fn builder_requires_a_populated_catalog() {
    assert!(matches!(
        CastSession::builder().build(),
        Err(RuntimeError::MissingCatalog)
    ));
    assert!(matches!(
        CastSession::builder().catalog(ActionCatalog::new()).build(),
        Err(RuntimeError::EmptyCatalog)
    ));
}
