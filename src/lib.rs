pub mod config;
pub mod game;
pub mod message;
pub mod session;
pub mod store;
pub mod surface;
pub mod types;
pub mod ws;

use std::sync::{Arc, Mutex};

use actix_web::{web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws as actix_ws;
use anyhow::Context;
use tracing::info;
use uuid::Uuid;

use config::Config;
use session::SharedStore;
use store::{FileBackend, Store};
use ws::client::WsClient;

/// Shared by every connection; each socket builds its own session from it.
#[derive(Clone)]
pub struct AppState {
    /// One user's storage: the active list and last generation are common
    /// to all of that user's sockets.
    pub store: SharedStore,
    pub player_count: usize,
    pub seed: Option<u64>,
}

impl AppState {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            player_count: config.player_count,
            seed: config.seed,
        }
    }
}

async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4().to_string();
    let client = WsClient::new(id, state.get_ref().clone());
    actix_ws::start(client, &req, stream)
}

fn serve(bind_addr: &str, state: AppState) -> std::io::Result<actix_web::dev::Server> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/ws", web::get().to(ws_handler))
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}

/// In-memory store with default settings.
pub async fn run_on(bind_addr: &str) -> std::io::Result<actix_web::dev::Server> {
    let config = Config::default();
    serve(bind_addr, AppState::new(Store::in_memory(), &config))
}

pub async fn run_with(config: &Config) -> anyhow::Result<actix_web::dev::Server> {
    let store = match &config.data_path {
        Some(path) => {
            info!("storing hero lists in {}", path.display());
            Store::open(FileBackend::new(path))
        }
        None => {
            info!("storing hero lists in memory");
            Store::in_memory()
        }
    };
    serve(&config.bind_addr, AppState::new(store, config))
        .with_context(|| format!("cannot bind {}", config.bind_addr))
}
