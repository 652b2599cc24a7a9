//! HVAC Service Desk server library.
//!
//! Core functionality for the service desk: job and invoice lifecycles,
//! technician reports with photo attachments, database operations,
//! authentication and the HTTP API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
