pub mod channel;
pub mod collab;
pub mod config;
pub mod errors;
pub mod events;
pub mod gate;
pub mod model;
pub mod stages;
pub mod store;
pub mod supervisor;
pub mod ui;
