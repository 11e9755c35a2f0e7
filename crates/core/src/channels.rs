//! Well-known notification channel name constants.
//!
//! These must match the channel values stored in the `notifications.channel`
//! column and referenced by the notification router.

/// In-app notification stored for the user's notification feed.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Email notification delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";
