use std::time::Duration;

use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, Message, StreamHandler};
use actix_web_actors::ws;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::game::{Assignment, TeamAssignmentEngine};
use crate::message::{frame, to_client_event, AssignmentView, ClientEvent, Incoming};
use crate::session::{Destructive, Session, SessionError};
use crate::surface::{Answered, LogNotifier, Notifier, Severity};
use crate::types::ClientId;
use crate::AppState;

pub struct WsClient {
    pub id: ClientId,
    state: AppState,
    session: Option<Session>,
}

impl WsClient {
    pub fn new(id: ClientId, state: AppState) -> Self {
        Self {
            id,
            state,
            session: None,
        }
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct ServerText(pub String);

impl Handler<ServerText> for WsClient {
    type Result = ();
    fn handle(&mut self, msg: ServerText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

/// Sends notifications back to the socket as `toast` frames, keeping a copy
/// in the server log.
pub struct SocketNotifier {
    addr: Addr<WsClient>,
}

impl Notifier for SocketNotifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        LogNotifier.notify(message, severity, duration);
        let payload = json!({
            "message": message,
            "severity": severity,
            "duration": duration.as_millis() as u64,
        });
        self.addr.do_send(ServerText(frame("toast", payload)));
    }
}

impl Actor for WsClient {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let engine = match self.state.seed {
            Some(seed) => TeamAssignmentEngine::seeded(seed, self.state.player_count),
            None => TeamAssignmentEngine::from_os_rng(self.state.player_count),
        };
        let engine = match engine {
            Ok(engine) => engine,
            Err(e) => {
                error!("client {}: {e}", self.id);
                ctx.stop();
                return;
            }
        };
        let notifier = SocketNotifier {
            addr: ctx.address(),
        };
        self.session = Some(Session::new(
            self.state.store.clone(),
            engine,
            Box::new(notifier),
        ));
        info!("client {} connected", self.id);
    }
}

impl WsClient {
    fn handle_text(&mut self, raw: String, ctx: &mut ws::WebsocketContext<Self>) {
        let event = serde_json::from_str::<Incoming>(&raw)
            .map_err(|e| format!("malformed JSON: {e}"))
            .and_then(to_client_event);
        match event {
            Ok(event) => self.dispatch(event, ctx),
            Err(e) => {
                warn!("client {}: {e}", self.id);
                ctx.text(frame(
                    "toast",
                    json!({ "message": e, "severity": Severity::Error, "duration": 3000 }),
                ));
            }
        }
    }

    fn dispatch(&mut self, event: ClientEvent, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        debug!("client {} → {:?}", self.id, event);

        let outcome: Result<(), SessionError> = match event {
            ClientEvent::CreateList { name, heroes } => session
                .create_list(&name, heroes)
                .map(|_| send_lists(session, ctx)),
            ClientEvent::SelectList { id } => {
                session.select_list(&id).map(|_| send_lists(session, ctx))
            }
            ClientEvent::Lists => {
                send_lists(session, ctx);
                Ok(())
            }
            ClientEvent::Generate => session.generate().map(|a| send_assignment(&a, ctx)),
            ClientEvent::ReshuffleTeams => {
                session.reshuffle_teams().map(|a| send_assignment(&a, ctx))
            }
            ClientEvent::ReshuffleHeroes => {
                session.reshuffle_heroes().map(|a| send_assignment(&a, ctx))
            }
            ClientEvent::ReshuffleAll => session.reshuffle_all().map(|a| send_assignment(&a, ctx)),
            ClientEvent::ReshuffleOne { slot } => {
                session.reshuffle_one(slot).map(|a| send_assignment(&a, ctx))
            }
            ClientEvent::ExcludeOne { slot, confirmed } => match confirmed {
                None => ask(
                    session,
                    Destructive::ExcludeOne { slot },
                    "excludeOne",
                    Some(slot),
                    ctx,
                ),
                Some(answer) => session.exclude_one(slot, &Answered(answer)).map(|done| {
                    if done {
                        send_current(session, ctx);
                        send_lists(session, ctx);
                    }
                }),
            },
            ClientEvent::ExcludeAll { confirmed } => match confirmed {
                None => ask(session, Destructive::ExcludeAll, "excludeAll", None, ctx),
                Some(answer) => session.exclude_all(&Answered(answer)).map(|done| {
                    if done {
                        send_lists(session, ctx);
                    }
                }),
            },
            ClientEvent::ResetSession { confirmed } => match confirmed {
                None => ask(session, Destructive::ResetSession, "resetSession", None, ctx),
                Some(answer) => session.reset_session(&Answered(answer)).map(|done| {
                    if done {
                        ctx.text(frame("sessionReset", json!({})));
                        send_lists(session, ctx);
                    }
                }),
            },
            ClientEvent::LastGeneration => {
                match session.restore_last_generation() {
                    Some(generation) => ctx.text(frame(
                        "lastGeneration",
                        json!({
                            "timestamp": generation.timestamp,
                            "activeListId": generation.active_list_id,
                            "assignment": AssignmentView::from(&generation.assignment),
                        }),
                    )),
                    None => ctx.text(frame("lastGeneration", json!(null))),
                }
                Ok(())
            }
            ClientEvent::SetTheme { theme } => session
                .set_theme(theme)
                .map(|_| ctx.text(frame("theme", json!({ "theme": theme })))),
            ClientEvent::Stats => {
                ctx.text(frame("stats", session.stats()));
                Ok(())
            }
            ClientEvent::RawUnknown(target) => {
                warn!("client {} sent unknown target {target}", self.id);
                Ok(())
            }
        };

        if let Err(e) = outcome {
            debug!("client {}: {e}", self.id);
        }
    }
}

fn send_assignment(assignment: &Assignment, ctx: &mut ws::WebsocketContext<WsClient>) {
    ctx.text(frame("assignment", AssignmentView::from(assignment)));
}

fn send_current(session: &Session, ctx: &mut ws::WebsocketContext<WsClient>) {
    if let Some(assignment) = session.current() {
        send_assignment(assignment, ctx);
    }
}

fn send_lists(session: &Session, ctx: &mut ws::WebsocketContext<WsClient>) {
    let (lists, active) = session.lists();
    ctx.text(frame("lists", json!({ "lists": lists, "activeList": active })));
}

/// Hands the confirmation dialog to the browser; it re-sends `target` with
/// its answer.
fn ask(
    session: &mut Session,
    action: Destructive,
    target: &str,
    slot: Option<usize>,
    ctx: &mut ws::WebsocketContext<WsClient>,
) -> Result<(), SessionError> {
    session.check(action)?;
    let request = session.confirmation(action);
    ctx.text(frame(
        "confirm",
        json!({
            "action": target,
            "slot": slot,
            "title": request.title,
            "message": request.message,
            "confirmText": request.confirm_text,
            "cancelText": request.cancel_text,
            "destructive": request.destructive,
        }),
    ));
    Ok(())
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsClient {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => ctx.pong(&payload),
            Ok(ws::Message::Text(raw)) => self.handle_text(raw.to_string(), ctx),
            Ok(ws::Message::Close(reason)) => {
                info!("client {} disconnected: {:?}", self.id, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                warn!("client {} protocol error: {e}", self.id);
                ctx.stop();
            }
            _ => {}
        }
    }
}
