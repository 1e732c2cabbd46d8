//! Integration tests for the movement netcode
//!
//! These exercise the shared simulator, the server's room registry and the
//! client's prediction pipeline together, including a full wire-encoded
//! round trip between the two sides.

use client::game::ClientGame;
use client::predictor::Predictor;
use server::room::{Registry, Session};
use shared::movement::{step, InputSample, KinematicState, FLOOR_HEIGHT, TICK_DT};
use shared::protocol::{ClientMessage, InputCommand, ServerMessage, DEFAULT_ROOM};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

fn forward() -> InputSample {
    InputSample {
        forward: true,
        ..InputSample::default()
    }
}

fn varied_inputs(count: usize) -> Vec<InputSample> {
    (0..count)
        .map(|i| InputSample {
            forward: true,
            left: i % 4 == 1,
            right: i % 4 == 3,
            jump: i % 9 == 0,
            slide: i % 6 == 5,
            yaw: i as f32 * 0.05,
            pitch: -0.1,
            ..InputSample::default()
        })
        .collect()
}

/// DETERMINISM TESTS
mod determinism {
    use super::*;

    /// Identical input sequences must reconstruct bitwise-identical states;
    /// prediction and reconciliation depend on it.
    #[test]
    fn replay_reproduces_state_exactly() {
        let inputs = varied_inputs(120);

        let mut first = KinematicState::spawn();
        let mut second = KinematicState::spawn();
        for input in &inputs {
            first = step(first, input, TICK_DT);
            second = step(second, input, TICK_DT);
        }

        assert_eq!(first, second);
    }

    /// Appending inputs to an already-simulated prefix equals simulating
    /// the concatenated sequence from scratch.
    #[test]
    fn simulation_composes_across_batches() {
        let inputs = varied_inputs(60);

        let mut batched = KinematicState::spawn();
        for input in &inputs[..40] {
            batched = step(batched, input, TICK_DT);
        }
        for input in &inputs[40..] {
            batched = step(batched, input, TICK_DT);
        }

        let mut whole = KinematicState::spawn();
        for input in &inputs {
            whole = step(whole, input, TICK_DT);
        }

        assert_eq!(batched, whole);
    }

    /// The simulator is state-dependent, so input order matters. This is
    /// why replay on the client must run in ascending sequence order.
    #[test]
    fn input_order_changes_the_outcome() {
        let turn_then_move = [
            InputSample {
                yaw: 1.2,
                ..InputSample::default()
            },
            forward(),
        ];
        let move_then_turn = [
            forward(),
            InputSample {
                yaw: 1.2,
                ..InputSample::default()
            },
        ];

        let mut a = KinematicState::spawn();
        for input in &turn_then_move {
            a = step(a, input, TICK_DT);
        }
        let mut b = KinematicState::spawn();
        for input in &move_then_turn {
            b = step(b, input, TICK_DT);
        }

        assert_ne!(a, b);
    }

    /// Two samples that both accelerate do not commute either: the second
    /// command's movement basis is the yaw the first one left behind.
    #[test]
    fn accelerating_inputs_do_not_commute() {
        let a = InputSample {
            forward: true,
            yaw: 0.4,
            ..InputSample::default()
        };
        let b = InputSample {
            right: true,
            yaw: 1.3,
            ..InputSample::default()
        };

        let ab = step(step(KinematicState::spawn(), &a, TICK_DT), &b, TICK_DT);
        let ba = step(step(KinematicState::spawn(), &b, TICK_DT), &a, TICK_DT);

        assert_ne!(ab, ba);
    }

    /// A second of running forward keeps the player clamped to the floor
    /// and moving along -z from the default facing.
    #[test]
    fn forward_run_stays_grounded() {
        let mut state = KinematicState::spawn();
        for _ in 0..30 {
            state = step(state, &forward(), TICK_DT);
        }

        assert_eq!(state.pos.y, FLOOR_HEIGHT);
        assert!(state.grounded);
        assert!(state.pos.z < -1.0);
    }
}

/// PREDICTION AND RECONCILIATION TESTS
mod reconciliation {
    use super::*;

    fn test_session() -> (Session, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Session::new("p1".to_string(), "Player".to_string(), tx), rx)
    }

    /// Runs the same inputs through a server session and a client
    /// predictor with the server trailing by a few commands; after
    /// reconciliation the predictor must sit exactly where pure local
    /// prediction would have put it.
    #[test]
    fn predictor_converges_on_session_state() {
        let (mut session, _rx) = test_session();
        let mut predictor = Predictor::new();
        let inputs = varied_inputs(20);

        let mut commands = Vec::new();
        for input in &inputs {
            commands.push(predictor.predict(*input, TICK_DT));
        }

        // Server has received and applied only the first 14.
        for command in &commands[..14] {
            session.enqueue(*command);
        }
        session.drain_inputs();
        assert_eq!(session.last_processed_input, 14);

        let mut truth = KinematicState::spawn();
        for input in &inputs {
            truth = step(truth, input, TICK_DT);
        }

        predictor.reconcile(&session.snapshot_entry());
        assert_eq!(*predictor.state(), truth);
        assert_eq!(predictor.pending_len(), 6);
    }

    /// Same pipeline, but every command crosses the wire as JSON both
    /// ways, exactly as the connection tasks would move it.
    #[test]
    fn wire_round_trip_preserves_convergence() {
        let (mut session, _rx) = test_session();
        let mut predictor = Predictor::new();

        for input in varied_inputs(10) {
            let command = predictor.predict(input, TICK_DT);
            let frame = serde_json::to_string(&ClientMessage::Input {
                match_id: DEFAULT_ROOM.to_string(),
                seq: command.seq,
                dt: command.dt,
                input: command.input,
            })
            .unwrap();

            match serde_json::from_str::<ClientMessage>(&frame).unwrap() {
                ClientMessage::Input {
                    seq, dt, input, ..
                } => session.enqueue(InputCommand { seq, dt, input }),
                other => panic!("unexpected decode: {:?}", other),
            }
        }
        session.drain_inputs();

        let snapshot = serde_json::to_string(&ServerMessage::State {
            players: vec![session.snapshot_entry()],
            last_processed: session.last_processed_input,
            server_time: 1,
        })
        .unwrap();

        let mut game = ClientGame::new();
        game.handle_message(ServerMessage::Welcome {
            id: "p1".to_string(),
        });
        std::mem::swap(&mut game.predictor, &mut predictor);
        game.handle_message(serde_json::from_str(&snapshot).unwrap());

        assert_eq!(*game.predictor.state(), session.state);
        assert_eq!(game.predictor.pending_len(), 0);
    }
}

/// ROOM FLOW TESTS
mod rooms {
    use super::*;

    fn decode(rx: &mut mpsc::UnboundedReceiver<Message>) -> ServerMessage {
        match rx.try_recv().expect("expected a queued frame") {
            Message::Text(text) => serde_json::from_str(&text).expect("valid server message"),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    /// Two sessions joining the default room see each other in the same
    /// snapshot, and a session in another room sees neither.
    #[test]
    fn rooms_isolate_their_snapshots() {
        let mut registry = Registry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let (tx_c, mut rx_c) = mpsc::unbounded_channel();

        let id_a = registry.add_session(DEFAULT_ROOM, "A".to_string(), tx_a);
        let id_b = registry.add_session(DEFAULT_ROOM, "B".to_string(), tx_b);
        let id_c = registry.add_session("duel-9", "C".to_string(), tx_c);
        assert_eq!(registry.room_count(), 2);

        registry.tick(42);

        for rx in [&mut rx_a, &mut rx_b] {
            match decode(rx) {
                ServerMessage::State { players, .. } => {
                    let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
                    assert_eq!(players.len(), 2);
                    assert!(ids.contains(&id_a.as_str()));
                    assert!(ids.contains(&id_b.as_str()));
                }
                other => panic!("expected state, got {:?}", other),
            }
        }

        match decode(&mut rx_c) {
            ServerMessage::State { players, .. } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].id, id_c);
            }
            other => panic!("expected state, got {:?}", other),
        }
    }

    /// A full join / input / tick / leave cycle through the registry,
    /// driving the client game state from the emitted frames.
    #[test]
    fn join_input_tick_leave_cycle() {
        let mut registry = Registry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let id = registry.add_session(DEFAULT_ROOM, "Runner".to_string(), tx);
        registry.send_welcome(DEFAULT_ROOM, &id);

        let mut game = ClientGame::new();
        game.handle_message(decode(&mut rx));
        assert_eq!(game.local_id(), Some(id.as_str()));

        let command = game.frame(forward(), TICK_DT).expect("joined");
        registry.enqueue_input(DEFAULT_ROOM, &id, command);
        registry.tick(7);

        game.handle_message(decode(&mut rx));
        assert_eq!(game.predictor.pending_len(), 0);
        assert!(game.predictor.state().pos.z < 0.0);
        assert_eq!(game.last_server_time(), 7);

        registry.remove_session(DEFAULT_ROOM, &id);
        assert_eq!(registry.room_count(), 0);
    }

    /// Commands apply in arrival order even across the registry surface;
    /// sequence numbers are acknowledgement bookkeeping, not a sort key.
    #[test]
    fn arrival_order_wins_over_sequence_numbers() {
        let mut registry = Registry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = registry.add_session(DEFAULT_ROOM, "Runner".to_string(), tx);

        for seq in [4, 2, 7] {
            registry.enqueue_input(
                DEFAULT_ROOM,
                &id,
                InputCommand {
                    seq,
                    dt: Some(TICK_DT),
                    input: forward(),
                },
            );
        }
        registry.tick(1);

        match decode(&mut rx) {
            ServerMessage::State { last_processed, .. } => assert_eq!(last_processed, 7),
            other => panic!("expected state, got {:?}", other),
        }
    }
}

/// LIVE SOCKET TESTS
mod live_socket {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use server::network;
    use shared::protocol::PlayerSnapshot;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::{interval, timeout, Duration};
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// Boots a real server (listener plus game loop) on an ephemeral port
    /// and returns its URL. The tasks die with the test runtime.
    async fn spawn_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        tokio::spawn(network::run_listener(listener, events_tx));

        tokio::spawn(async move {
            let mut registry = Registry::new();
            let mut tick = interval(Duration::from_millis(10));
            loop {
                tokio::select! {
                    event = events_rx.recv() => match event {
                        Some(event) => registry.apply_event(event),
                        None => break,
                    },
                    _ = tick.tick() => registry.tick(1),
                }
            }
        });

        format!("ws://{}", addr)
    }

    async fn next_server_message(ws: &mut WsClient) -> ServerMessage {
        loop {
            let frame = timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .expect("socket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).expect("valid server message");
            }
        }
    }

    async fn expect_welcome(ws: &mut WsClient) -> String {
        match next_server_message(ws).await {
            ServerMessage::Welcome { id } => id,
            other => panic!("expected welcome first, got {:?}", other),
        }
    }

    /// Reads snapshots until one satisfies `accept`, or times out.
    async fn wait_for_state<F>(ws: &mut WsClient, mut accept: F) -> Vec<PlayerSnapshot>
    where
        F: FnMut(&[PlayerSnapshot]) -> bool,
    {
        loop {
            if let ServerMessage::State { players, .. } = next_server_message(ws).await {
                if accept(&players) {
                    return players;
                }
            }
        }
    }

    /// Drives the whole connection path over real sockets: a bare
    /// `{"type":"join"}` lands in the default room with the default name,
    /// an input sent while idle is dropped, a malformed frame leaves the
    /// connection open, and both clients see each other in snapshots.
    #[tokio::test]
    async fn bare_joins_share_the_default_room() {
        let url = spawn_server().await;
        let (mut ws_a, _) = connect_async(&url).await.unwrap();
        let (mut ws_b, _) = connect_async(&url).await.unwrap();

        // Input before join: no session yet, must be dropped.
        let stray = serde_json::to_string(&ClientMessage::Input {
            match_id: DEFAULT_ROOM.to_string(),
            seq: 7,
            dt: Some(TICK_DT),
            input: forward(),
        })
        .unwrap();
        ws_a.send(Message::Text(stray)).await.unwrap();

        // Malformed frame: logged, connection stays open.
        ws_a.send(Message::Text("not json".to_string())).await.unwrap();

        ws_a.send(Message::Text(r#"{"type":"join"}"#.to_string()))
            .await
            .unwrap();
        ws_b.send(Message::Text(r#"{"type":"join"}"#.to_string()))
            .await
            .unwrap();

        let id_a = expect_welcome(&mut ws_a).await;
        let id_b = expect_welcome(&mut ws_b).await;
        assert_ne!(id_a, id_b);

        // Both bare joins share one room, so each snapshot carries both.
        for ws in [&mut ws_a, &mut ws_b] {
            let players = wait_for_state(ws, |players| players.len() == 2).await;
            let entry_a = players.iter().find(|p| p.id == id_a).unwrap();
            assert!(players.iter().any(|p| p.id == id_b));
            assert_eq!(entry_a.name, "Player");
            // The pre-join input never reached a session.
            assert_eq!(entry_a.last_processed_input, 0);
        }

        // A real input after the malformed frame still flows end to end.
        let command = serde_json::to_string(&ClientMessage::Input {
            match_id: DEFAULT_ROOM.to_string(),
            seq: 1,
            dt: Some(TICK_DT),
            input: forward(),
        })
        .unwrap();
        ws_a.send(Message::Text(command)).await.unwrap();

        let players = wait_for_state(&mut ws_a, |players| {
            players
                .iter()
                .any(|p| p.id == id_a && p.last_processed_input == 1)
        })
        .await;
        let entry_a = players.iter().find(|p| p.id == id_a).unwrap();
        assert!(entry_a.pos.z < 0.0);
    }
}

/// PROTOCOL TESTS
mod protocol {
    use super::*;

    /// Join fields are optional on the wire; the server fills defaults.
    #[test]
    fn minimal_join_parses_with_defaults() {
        let message: ClientMessage = serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        match message {
            ClientMessage::Join { match_id, name } => {
                assert!(match_id.is_none());
                assert!(name.is_none());
            }
            other => panic!("expected join, got {:?}", other),
        }
    }

    /// Snapshot field names are what remote clients key on.
    #[test]
    fn state_uses_camel_case_field_names() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = Session::new("abc".to_string(), "Player".to_string(), tx);

        let text = serde_json::to_string(&ServerMessage::State {
            players: vec![session.snapshot_entry()],
            last_processed: 3,
            server_time: 99,
        })
        .unwrap();

        assert!(text.contains("\"lastProcessed\":3"));
        assert!(text.contains("\"serverTime\":99"));
        assert!(text.contains("\"lastProcessedInput\""));
        assert!(text.contains("\"grounded\":true"));
    }
}
