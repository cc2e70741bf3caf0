mod server;

use std::net::SocketAddr;

use log::error;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let addr = std::env::var("TIMETABLE_SOLVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid TIMETABLE_SOLVER_ADDR '{}': {}", addr, e);
            std::process::exit(2);
        }
    };

    if let Err(e) = server::run_server(addr).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
