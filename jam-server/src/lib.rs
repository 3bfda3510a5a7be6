use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
};

use axum::{routing::get, Router as AxumRouter};
use context::ServerContext;
use jam_engine::RoomManager;
use log::info;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
};

mod context;
mod docs;
mod errors;
mod resolve;
mod rooms;
mod schemas;
mod ws;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 15230;

type Router = AxumRouter<ServerContext>;

/// Server configuration. The only recognized option is the listen port.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("JAM_PORT")
            .map(|x| x.parse::<u16>().expect("Port must be a number"))
            .unwrap_or(DEFAULT_PORT);

        Self { port }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Starts the jam server
pub async fn run_server(config: Config, rooms: Arc<RoomManager>) {
    let context = ServerContext { rooms };

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, config.port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .nest("/rooms", rooms::router())
        .route("/youtube/resolve", get(resolve::resolve));

    // The bundled client, with an SPA fallback for room deep links.
    let assets = ServeDir::new("public").fallback(ServeFile::new("public/index.html"));

    let root_router = Router::new()
        .nest("/api", api_router)
        .route("/ws", get(ws::websocket_handler))
        .route("/api.json", get(docs::docs))
        .fallback_service(assets)
        .with_state(context)
        .layer(cors);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    info!("Listening on port {}", config.port);

    axum::serve(listener, root_router.into_make_service())
        .await
        .unwrap();
}
