//! Fleet Reminders
//!
//! Motor de generación y sincronización de recordatorios de mantenimiento
//! para flotas de vehículos.

pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod metrics;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
