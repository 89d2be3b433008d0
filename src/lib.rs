pub mod alert;
pub mod app;
pub mod backend;
pub mod drone;
pub mod ground_control;
pub mod matching;
pub mod model;
pub mod pipes;
pub mod search;
pub mod selection;
pub mod service;
pub mod settings;
pub mod submission;
pub mod view;

#[cfg(test)]
mod testing;
