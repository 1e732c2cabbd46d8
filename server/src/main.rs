use clap::Parser;
use log::info;
use server::network::{self, NetworkEvent};
use server::room::Registry;
use server::utils;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the WebSocket listener to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Simulation rate in ticks per second
    #[arg(short, long, default_value_t = shared::TICK_RATE)]
    tick_rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let address = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Movement server listening on ws://{}", address);

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<NetworkEvent>();
    tokio::spawn(network::run_listener(listener, events_tx));

    let mut registry = Registry::new();
    let mut tick = interval(Duration::from_secs_f32(1.0 / args.tick_rate as f32));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(event) => registry.apply_event(event),
                None => {
                    info!("Network layer stopped, shutting down");
                    break;
                }
            },

            _ = tick.tick() => {
                registry.tick(utils::server_time_millis());
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    Ok(())
}
