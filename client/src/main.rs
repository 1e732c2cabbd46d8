//! Headless client: joins a match and walks a scripted loadout of inputs
//! through the full predict / send / reconcile pipeline. Useful for
//! exercising a server without a renderer.

use clap::Parser;
use client::game::ClientGame;
use client::network::Connection;
use log::info;
use shared::movement::InputSample;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

const FRAME_RATE: u32 = 60;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server WebSocket URL
    #[arg(short, long, default_value = "ws://127.0.0.1:3001")]
    server: String,

    /// Display name sent on join
    #[arg(short, long, default_value = "Player")]
    name: String,

    /// Match to join
    #[arg(short, long, default_value = "public")]
    match_id: String,

    /// Exit after this many seconds (runs until disconnect if omitted)
    #[arg(long)]
    seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    info!("Connecting to {}", args.server);
    let mut connection = Connection::connect(&args.server).await?;
    connection.send_join(&args.match_id, &args.name).await?;

    let mut game = ClientGame::new();
    let frame_dt = 1.0 / FRAME_RATE as f32;
    let mut frames: u64 = 0;

    let started = Instant::now();
    let mut frame = interval(Duration::from_secs_f32(frame_dt));
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        frame.tick().await;

        // Snapshots first, so this frame's prediction starts from the
        // freshest reconciled state.
        while let Some(message) = connection.poll_message() {
            game.handle_message(message);
        }
        if connection.is_closed() {
            info!("Server closed the connection");
            break;
        }

        if let Some(command) = game.frame(scripted_input(frames), frame_dt) {
            connection.send_input(&args.match_id, &command).await?;
        }

        frames += 1;
        if frames % FRAME_RATE as u64 == 0 {
            let state = game.predictor.state();
            info!(
                "pos=({:.2}, {:.2}, {:.2}) pending={} remotes={}",
                state.pos.x,
                state.pos.y,
                state.pos.z,
                game.predictor.pending_len(),
                game.remotes.len()
            );
        }

        if let Some(seconds) = args.seconds {
            if started.elapsed() >= Duration::from_secs(seconds) {
                info!("Run complete after {} frames", frames);
                break;
            }
        }
    }

    Ok(())
}

/// Deterministic input script: run forward with a slow yaw sweep, hop
/// every two seconds and slide-hop every five.
fn scripted_input(frame: u64) -> InputSample {
    let seconds = frame as f32 / FRAME_RATE as f32;
    InputSample {
        forward: true,
        jump: frame % (FRAME_RATE as u64 * 2) == 0,
        slide: frame % (FRAME_RATE as u64 * 5) < 20,
        yaw: (seconds * 0.25).sin() * 0.8,
        ..InputSample::default()
    }
}
