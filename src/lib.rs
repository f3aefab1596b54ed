pub mod actions;
pub mod catalog;
mod config;
pub mod entities;
pub mod error;
pub mod ids;
pub mod inventory;
pub mod persistence;
pub mod session;
pub mod telemetry;
#[cfg(test)]
mod testing;

pub use actions::{apply, Action, ActionContext};
pub use catalog::Catalog;
pub use error::{DecodeError, EngineError, InventoryError, StoreError};
pub use inventory::changes::{ProfileChanges, ProfileChangesEvent};
pub use inventory::state::CharacterState;
pub use session::SessionRegistry;

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Request file handed to the binary: the client's action payloads in order.
#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

fn read_request(path: &Path) -> Result<Request, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|err| format!("request read failed for {}: {}", path.display(), err))?;
    serde_json::from_str(&data)
        .map_err(|err| format!("request parse failed for {}: {}", path.display(), err))
}

pub fn run(args: &[String]) -> Result<(), String> {
    let config = config::AppConfig::from_args(args)?;
    telemetry::logging::init(&config.root, config.log_level)?;

    let catalog = Catalog::load(&config.db_root()).map_err(|err| err.to_string())?;
    let registry = SessionRegistry::new(
        Arc::new(catalog),
        Arc::new(persistence::store::FileProfileStore::from_root(&config.root)),
        Arc::new(ids::ObjectIdGenerator::new()),
        config.session_capacity,
    );
    let request = read_request(&config.request_path)?;
    log::info!(
        "session {}: {} actions from {}",
        config.session_id,
        request.data.len(),
        config.request_path.display()
    );

    let mut event = ProfileChangesEvent::default();
    registry.handle_batch(&config.session_id, &request.data, &mut event);
    let output = serde_json::to_string_pretty(&event)
        .map_err(|err| format!("event encode failed: {}", err))?;
    println!("{}", output);
    log::logger().flush();
    Ok(())
}
