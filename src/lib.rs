// Library exports for the forum
// This allows integration tests to drive the real router

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod markup;
pub mod routes;
pub mod state;
pub mod views;
