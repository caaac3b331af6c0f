//! Class performance analytics: grade classification, class snapshots with
//! rankings, and academic year comparisons, reshaped for charting.
//!
//! Every engine function is a pure, synchronous transformation over
//! already-fetched input. Fetching, caching and rendering belong to callers.

pub mod aggregate;
pub mod chart;
pub mod compare;
pub mod error;
pub mod grade;
pub mod input;
pub mod models;
pub mod ranking;
pub mod report;

pub use aggregate::{aggregate, aggregate_class, exam_types};
pub use chart::{to_series, ChartKind, ChartSeries, ChartSource, Series};
pub use compare::compare;
pub use error::AnalyticsError;
pub use grade::{classify, Grade};
pub use models::{
    ClassAnalyticsSnapshot, ComparisonResult, GradeDistribution, Metric, ScoreRecord, Statistics,
    StudentRanking, YearMetrics,
};
pub use ranking::{rank, rank_competition, StudentAverage};
