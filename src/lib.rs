pub mod actions;
pub mod controller;
pub mod events;
pub mod oracle;
pub mod orchestrator;
pub mod registry;
pub mod scan;
pub mod state;
pub mod ui;
pub mod widgets;
