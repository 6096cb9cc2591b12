use std::sync::Arc;

use druid::{AppLauncher, WindowDesc};
use tracing_subscriber::EnvFilter;

use smart_rename::actions::load_directory;
use smart_rename::oracle::OllamaOracle;
use smart_rename::orchestrator::Orchestrator;
use smart_rename::registry::{shared, FileRegistry};
use smart_rename::state::AppState;
use smart_rename::ui::build_ui;

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let oracle = Arc::new(OllamaOracle::from_env());
    let orchestrator = Arc::new(Orchestrator::new(oracle));
    let registry = shared(FileRegistry::new());

    let mut initial_state = AppState::new(registry, orchestrator);
    if let Some(dir) = std::env::args().nth(1) {
        initial_state.selected_dir = dir;
        load_directory(&mut initial_state);
    }

    let main_window = WindowDesc::new(build_ui())
        .title("Smart Rename")
        .window_size((900.0, 600.0));
    AppLauncher::with_window(main_window)
        .launch(initial_state)
        .expect("Failed to launch application");
}
