//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, LabelId};

pub use crate::{Error, Result};
pub use crate::{Geometry, IntensityVolume, LabelVolume, Slice2d, SliceAxis, Volume};

pub use crate::stats::{aggregate, locate_slice, LabelStats, Metric, MetricSet, SliceLocation};

pub use crate::report::{Format, Metadata, SeriesInfo, Table};

pub use crate::{JobOutput, SliceStatsJob};
