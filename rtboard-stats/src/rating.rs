//! Real-Time Rating
//!
//! Maps the coefficient of variation of a timing sample onto a suitability
//! tier. The breakpoints come from the board's certification policy: an
//! operation whose runtime varies by less than 0.05% is predictable enough
//! for hard deadlines, under 1% for soft deadlines, under 5% conditionally.

use serde::{Deserialize, Serialize};

/// CV below this is hard real-time grade.
pub const CV_HARD_RT_PERCENT: f64 = 0.05;
/// CV below this is soft real-time grade.
pub const CV_SOFT_RT_PERCENT: f64 = 1.0;
/// CV below this is conditionally suitable; anything above is not.
pub const CV_RT_SUITABLE_PERCENT: f64 = 5.0;

/// Real-time suitability tier, ordered worst → best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RtRating {
    /// Too unpredictable for real-time use
    NotSuitable,
    /// Usable with margin, not certified
    RealTimeSuitable,
    /// Certified for soft deadlines
    SoftRealTime,
    /// Certified for hard deadlines
    HardRealTime,
}

impl RtRating {
    /// Classify a coefficient of variation (percent).
    ///
    /// Monotone in the input: a lower CV never yields a worse rating.
    pub fn from_cv(cv_percent: f64) -> Self {
        if cv_percent < CV_HARD_RT_PERCENT {
            RtRating::HardRealTime
        } else if cv_percent < CV_SOFT_RT_PERCENT {
            RtRating::SoftRealTime
        } else if cv_percent < CV_RT_SUITABLE_PERCENT {
            RtRating::RealTimeSuitable
        } else {
            RtRating::NotSuitable
        }
    }

    /// Whether this tier carries certification (hard and soft tiers do;
    /// the conditional tier does not).
    pub fn is_certified(self) -> bool {
        matches!(self, RtRating::HardRealTime | RtRating::SoftRealTime)
    }

    /// Human label used by the board renderer.
    pub fn label(self) -> &'static str {
        match self {
            RtRating::HardRealTime => "HARD REAL-TIME",
            RtRating::SoftRealTime => "SOFT REAL-TIME",
            RtRating::RealTimeSuitable => "REAL-TIME SUITABLE",
            RtRating::NotSuitable => "NOT SUITABLE",
        }
    }

    /// Star rating for the board.
    pub fn stars(self) -> &'static str {
        match self {
            RtRating::HardRealTime => "*****",
            RtRating::SoftRealTime => "****",
            RtRating::RealTimeSuitable => "***",
            RtRating::NotSuitable => "**",
        }
    }
}
