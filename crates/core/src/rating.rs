//! Consultation rating rules and per-designer aggregation.

use serde::{Deserialize, Serialize};

use crate::consultation::{Consultation, ConsultationStatus};
use crate::error::CoreError;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Maximum length of the feedback text attached to a rating.
pub const MAX_FEEDBACK_LENGTH: usize = 2_000;

/// Validate a rating value and its optional feedback.
pub fn validate_rating(rating: f64, feedback: Option<&str>) -> Result<(), CoreError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CoreError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }
    if let Some(text) = feedback {
        if text.len() > MAX_FEEDBACK_LENGTH {
            return Err(CoreError::Validation(format!(
                "Feedback exceeds maximum length of {MAX_FEEDBACK_LENGTH} characters"
            )));
        }
    }
    Ok(())
}

/// Round to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregated rating figures for one designer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean of the non-null ratings over completed consultations, one
    /// decimal, `0.0` when nothing has been rated.
    pub avg_rating: f64,
    /// Number of completed consultations, rated or not.
    pub completed_count: i64,
}

impl RatingSummary {
    /// Summarize a designer's consultations. Non-completed entries are ignored.
    pub fn from_consultations<'a, I>(consultations: I) -> Self
    where
        I: IntoIterator<Item = &'a Consultation>,
    {
        let mut completed_count = 0_i64;
        let mut rated = 0_u32;
        let mut total = 0.0_f64;

        for consultation in consultations {
            if consultation.status != ConsultationStatus::Completed {
                continue;
            }
            completed_count += 1;
            if let Some(rating) = consultation.rating {
                rated += 1;
                total += rating;
            }
        }

        let avg_rating = if rated == 0 {
            0.0
        } else {
            round_to_tenth(total / f64::from(rated))
        };

        Self {
            avg_rating,
            completed_count,
        }
    }
}
