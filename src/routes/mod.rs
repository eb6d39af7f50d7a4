use actix_files as fs;
use actix_web::{web, HttpResponse, Responder};

use crate::board::{lock, CellState, Square};
use crate::error::BoardError;
use crate::models::AppState;

/// HTTP handler for the index page: one plain status line
pub async fn index(app_state: web::Data<AppState>) -> impl Responder {
    let peer = app_state.paired_peer().unwrap_or_else(|| "none".to_string());
    let board = lock(&app_state.board);
    let mode = board
        .session()
        .mode()
        .map_or_else(|| "unset".to_string(), |mode| mode.to_string());
    HttpResponse::Ok().body(format!(
        "Smartboard: peer {}, mode {}, game {}, board {:?}",
        peer,
        mode,
        if board.session().is_active() { "active" } else { "inactive" },
        board.state()
    ))
}

fn parse_square(text: &str) -> Result<Square, HttpResponse> {
    text.parse()
        .map_err(|e: BoardError| HttpResponse::BadRequest().body(e.to_string()))
}

/// Lifts the piece on a square of the simulated board
pub async fn sim_lift(path: web::Path<String>, app_state: web::Data<AppState>) -> HttpResponse {
    let Some(simulator) = app_state.simulator() else {
        return HttpResponse::NotFound().body("no simulated board");
    };
    match parse_square(&path) {
        Ok(square) => {
            simulator.lift(square);
            HttpResponse::Ok().body(format!("lifted {}", square))
        }
        Err(response) => response,
    }
}

/// Puts a white or black piece on a square of the simulated board
pub async fn sim_place(
    path: web::Path<(String, String)>,
    app_state: web::Data<AppState>,
) -> HttpResponse {
    let Some(simulator) = app_state.simulator() else {
        return HttpResponse::NotFound().body("no simulated board");
    };
    let (square, color) = path.into_inner();
    let state = match color.as_str() {
        "white" => CellState::White,
        "black" => CellState::Black,
        other => return HttpResponse::BadRequest().body(format!("invalid colour: {}", other)),
    };
    match parse_square(&square) {
        Ok(square) => {
            simulator.place(square, state);
            HttpResponse::Ok().body(format!("placed {} on {}", color, square))
        }
        Err(response) => response,
    }
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/sim/lift/{square}").route(web::post().to(sim_lift)))
        .service(web::resource("/sim/place/{square}/{color}").route(web::post().to(sim_place)))
        .service(fs::Files::new("/static", "./static").index_file("index.html"));
}
