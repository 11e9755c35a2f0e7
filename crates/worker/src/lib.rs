//! Background worker for the Atelier scheduling engine.
//!
//! The binary wires the Postgres store, the event bus and its consumers,
//! and the reminder sweep together. Configuration lives in [`config`].

pub mod config;
