//! Domain core for the Atelier consultation scheduling engine.
//!
//! This crate has zero internal dependencies so it can be shared by the
//! database adapter, the event services, the scheduler and any tooling.
//! It holds the pure parts of the engine:
//!
//! - [`consultation`] and [`project`]: status enums and their fixed
//!   transition graphs plus role gates.
//! - [`availability`]: the buffered interval rule used for conflict checks.
//! - [`rating`]: rating validation and per-designer aggregation.
//! - [`store`] and [`clock`]: the ports the scheduler is injected with.

#[macro_use]
mod macros;

pub mod availability;
pub mod channels;
pub mod clock;
pub mod consultation;
pub mod error;
pub mod event_types;
pub mod project;
pub mod rating;
pub mod roles;
pub mod store;
pub mod types;
pub mod users;
