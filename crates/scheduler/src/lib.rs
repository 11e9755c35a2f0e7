//! Consultation scheduling engine.
//!
//! - [`AvailabilityIndex`]: conflict checks and booked-interval listing.
//! - [`ConsultationScheduler`]: booking, status transitions, rating and the
//!   designer availability query.
//! - [`ProjectLifecycle`]: the project status machine.
//! - [`ReminderSweep`]: periodic reminder dispatch for upcoming bookings.
//! - [`MemoryStore`]: in-process implementation of the store ports.
//!
//! Every service takes its collaborators as `Arc<dyn Trait>` ports from
//! `atelier_core::store`, plus a [`NotificationDispatcher`] for events.
//!
//! [`NotificationDispatcher`]: atelier_events::NotificationDispatcher

pub mod availability;
pub mod lifecycle;
pub mod locks;
pub mod memory;
pub mod notifications;
pub mod reminders;
pub mod scheduler;

pub use availability::{AvailabilityIndex, BookedInterval};
pub use lifecycle::{ProjectDraft, ProjectLifecycle};
pub use locks::KeyedLocks;
pub use memory::MemoryStore;
pub use reminders::{ReminderConfig, ReminderSweep};
pub use scheduler::{ConsultationScheduler, DesignerSummary};
