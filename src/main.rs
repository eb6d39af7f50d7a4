use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::{error, info, warn};
use std::io;

use smartboard::board::{BoardController, BoardStateMachine, LightFeedback, Snapshot};
use smartboard::config::Cli;
use smartboard::game::GameSession;
use smartboard::hardware::{LogLedDriver, SimulatedGrid};
use smartboard::models::AppState;
use smartboard::routes::configure_routes;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let settings = cli.poll_settings().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    // No hardware drivers are linked in; the board is simulated and driven
    // through the /sim routes.
    let (grid, simulator) = SimulatedGrid::new(&Snapshot::starting_layout());
    let machine = BoardStateMachine::new(LightFeedback::new(Box::new(LogLedDriver)), None);
    let board = BoardController::new(GameSession::default(), machine);
    let app_state = web::Data::new(
        AppState::new(board, Box::new(grid), settings).with_simulator(simulator),
    );

    let address = cli.bind_address();
    let server = loop {
        let app_state = app_state.clone();
        match HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .configure(configure_routes)
        })
        .bind(&address)
        {
            Ok(server) => break server,
            Err(e) => {
                warn!("Failed to bind {}: {}, retrying in {:?}", address, e, cli.bind_retry());
                actix_rt::time::sleep(cli.bind_retry()).await;
            }
        }
    };

    info!("Starting smartboard server at http://{}", address);
    server.run().await
}
