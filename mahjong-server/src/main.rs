use crate::client::{ClientController, ConnectionIdGenerator};
use crate::directory::RoomDirectory;
use clap::Parser;
use futures::prelude::*;
use std::net::IpAddr;
use std::sync::Arc;
use thespian::Actor;
use tracing::*;
use tracing_futures::Instrument;
use warp::Filter;

mod client;
mod directory;
mod room;

/// Command-line configuration for the server process.
#[derive(Debug, Parser)]
#[clap(name = "mahjong-server", about = "Authoritative server for 4-seat mahjong rooms")]
struct Args {
    /// Address to bind the websocket listener to.
    #[clap(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to bind the websocket listener to.
    #[clap(long, default_value_t = 3030)]
    port: u16,

    /// Minimum tracing level to emit.
    #[clap(long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::FmtSubscriber::builder().with_max_level(args.log_level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // Create the room directory actor and spawn it, holding on to its proxy so that
    // each connection's socket task can reach it.
    let stage = RoomDirectory::new().into_stage();
    let directory = stage.proxy();
    tokio::spawn(stage.run());

    let connection_id_generator = Arc::new(ConnectionIdGenerator::new());

    let socket = warp::path("play").and(warp::ws()).map(move |ws: warp::ws::Ws| {
        let directory = directory.clone();
        let id = connection_id_generator.next();
        ws.on_upgrade(move |socket| {
            async move {
                let (mut client, mut stream) = match ClientController::perform_handshake(id, socket, directory).await
                {
                    Ok(result) => result,
                    Err(err) => {
                        warn!(%err, "Failed to establish connection with client");
                        return;
                    }
                };

                while let Some(message) = stream.next().await {
                    match message {
                        Ok(message) => {
                            if message.is_close() {
                                info!("Socket connection closed, shutting down client");
                                break;
                            }

                            let result = client.handle_message(message).await.expect("client actor is gone");
                            if let Err(err) = result {
                                error!(%err, "Error handling client message");
                            }
                        }

                        Err(err) => {
                            error!(%err, "Received error message from socket");
                            break;
                        }
                    }
                }

                let _ = client.disconnect().await;
            }
            .instrument(trace_span!("socket pump", %id))
        })
    });

    let addr = (args.bind, args.port);
    info!(bind = %args.bind, port = args.port, "Listening for connections");
    warp::serve(socket).run(addr).await;
}
