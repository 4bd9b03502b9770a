use clap::Parser;
use frame_relay::{
    RelayError,
    config::{Args, RelayConfig},
    relay::{Relay, UdpSink},
    source,
};

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("ffmpeg_next", log::LevelFilter::Warn)
        .init();
}

fn fail(error: RelayError) -> ! {
    match error.stage() {
        Some(stage) => {
            log::error!("{}: {}", stage, error);
            eprintln!("frame-relay: {}: {}", stage, error);
        }
        None => {
            log::error!("{}", error);
            eprintln!("frame-relay: {}", error);
        }
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();
    log::info!("frame-relay {}", env!("CARGO_PKG_VERSION"));

    let config = RelayConfig::resolve(&args).unwrap_or_else(|e| fail(e));
    log::info!(
        "source: {}, destination: {}, queue: {:?}, forward: {:?}",
        config.source.kind,
        config.destination,
        config.relay.queue,
        config.relay.forward
    );

    let source = source::open(&config.source).unwrap_or_else(|e| fail(e));
    let sink = UdpSink::to(config.destination)
        .await
        .unwrap_or_else(|source| {
            fail(RelayError::Socket {
                destination: config.destination,
                source,
            })
        });

    let relay = Relay::new(config.relay);
    if let Err(e) = relay.start(source, sink) {
        fail(e);
    }

    tokio::select! {
        _ = relay.stopped() => {
            log::info!("stream finished");
        },
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted");
        },
    }

    match relay.shutdown().await {
        Ok(summary) => match serde_json::to_string(&summary) {
            Ok(json) => log::info!("summary: {}", json),
            Err(e) => log::warn!("summary not serialisable: {}", e),
        },
        Err(e) => {
            log::error!("shutdown failed: {}", e);
            std::process::exit(1);
        }
    }
}
