use pinball_relay::config::RelayConfig;
use pinball_relay::operator;
use pinball_relay::session::{handle_connection, Shared};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match RelayConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("pinball-relay: {err}");
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("pinball-relay: failed to bind port {}: {err}", config.port);
            std::process::exit(1);
        }
    };
    tracing::info!("relay listening on port {}", config.port);

    let shared = Shared::new();

    let accept_shared = shared.clone();
    let accept_loop = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, addr)) => {
                    tracing::debug!("accepted connection from {addr}");
                    let shared = accept_shared.clone();
                    tokio::spawn(async move { handle_connection(socket, shared).await });
                }
                Err(err) => {
                    tracing::warn!("accept failed: {err}");
                }
            }
        }
    });

    operator::run(shared.clone()).await;
    accept_loop.abort();
    shared.registry.close_all().await;
}
