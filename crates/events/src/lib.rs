//! Atelier event bus and notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the canonical domain event envelope.
//! - [`NotificationDispatcher`]: the sink the scheduling engine emits into.
//! - [`EventPersistence`]: background service that durably writes every
//!   event to the `events` table.
//! - [`NotificationRouter`]: turns events into per-user notifications.
//! - [`delivery`]: external delivery channels (email).

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod persistence;
pub mod router;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use dispatcher::{DispatchError, NotificationDispatcher};
pub use persistence::EventPersistence;
pub use router::NotificationRouter;
