//! 质心定位与按标签统计.

mod aggregate;
pub mod centroid;
mod metric;

pub use aggregate::{aggregate, IntensityStats, LabelStats};
pub use centroid::{centroid, locate_slice, SliceLocation};
pub use metric::{Measure, Metric, MetricSet, MetricValue};
