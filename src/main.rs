use std::sync::Arc;

use jam_engine::{RoomManager, SystemClock};
use jam_server::Config;
use log::info;

mod logging;

#[tokio::main]
async fn main() {
    logging::init_logger();

    let config = Config::from_env();
    let clock = Arc::new(SystemClock);
    let rooms = Arc::new(RoomManager::new(clock));

    info!("Starting jam...");

    jam_server::run_server(config, rooms).await
}
