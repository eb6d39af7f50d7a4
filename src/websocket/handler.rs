use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use super::dispatcher;
use crate::error::BoardError;
use crate::models::{AppState, EventRecord, PeerMessage};

/// WebSocket actor for the remote peer driving the board
pub struct BoardSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    paired: bool,
}

impl BoardSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        BoardSocket {
            id: Uuid::new_v4().to_string(),
            app_state,
            paired: false,
        }
    }
}

impl Actor for BoardSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let recipient = ctx.address().recipient();
        match self.app_state.pair(&self.id, recipient) {
            Ok(()) => {
                self.paired = true;
                info!("WebSocket connection started: {}", self.id);
            }
            Err(e) => {
                warn!("Rejecting connection {}: {}", self.id, e);
                ctx.text(EventRecord::error(e).to_json());
                ctx.close(Some(ws::CloseCode::Policy.into()));
                ctx.stop();
            }
        }
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if self.paired {
            self.app_state.unpair(&self.id);
            self.paired = false;
        }
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

impl Handler<PeerMessage> for BoardSocket {
    type Result = ();

    fn handle(&mut self, msg: PeerMessage, ctx: &mut Self::Context) {
        info!("Forwarding board event to {}: {}", self.id, msg.0);
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for BoardSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                let reply = dispatcher::dispatch_text(&self.app_state, &self.id, text.as_ref());
                ctx.text(reply.record.to_json());
                if reply.close {
                    ctx.close(Some(ws::CloseCode::Normal.into()));
                    ctx.stop();
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                let e = BoardError::Transport("binary frames are not supported".to_string());
                ctx.text(EventRecord::error(e).to_json());
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    info!("New WebSocket connection request");
    ws::start(BoardSocket::new(app_state), &req, stream)
}
