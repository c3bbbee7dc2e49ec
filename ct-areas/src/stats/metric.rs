//! 度量项定义.

use std::fmt;

/// 度量类别.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Measure {
    /// 形状度量.
    Shape,

    /// 强度度量.
    Intensity,
}

impl Measure {
    /// 输出时使用的名字.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Shape => "shape",
            Self::Intensity => "intensity",
        }
    }
}

/// 单项度量. 声明顺序即输出顺序.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Metric {
    /// 体素个数.
    NVoxels,

    /// 物理面积 (平方毫米).
    PhysicalAreaMm,

    /// 物理体积 (立方毫米), 切片按一个体素厚计算.
    PhysicalVolumeMm,

    /// 强度平均值.
    Mean,

    /// 强度中位数.
    Median,

    /// 强度最大值.
    Maximum,

    /// 强度最小值.
    Minimum,

    /// 强度样本标准差.
    Sd,
}

const SHAPE_METRICS: [Metric; 3] = [Metric::NVoxels, Metric::PhysicalAreaMm, Metric::PhysicalVolumeMm];

const ALL_METRICS: [Metric; 8] = [
    Metric::NVoxels,
    Metric::PhysicalAreaMm,
    Metric::PhysicalVolumeMm,
    Metric::Mean,
    Metric::Median,
    Metric::Maximum,
    Metric::Minimum,
    Metric::Sd,
];

impl Metric {
    /// 输出时使用的名字.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NVoxels => "nvoxels",
            Self::PhysicalAreaMm => "physical_area_mm",
            Self::PhysicalVolumeMm => "physical_volume_mm",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Maximum => "maximum",
            Self::Minimum => "minimum",
            Self::Sd => "sd",
        }
    }

    /// 所属类别.
    #[inline]
    pub const fn measure(self) -> Measure {
        match self {
            Self::NVoxels | Self::PhysicalAreaMm | Self::PhysicalVolumeMm => Measure::Shape,
            _ => Measure::Intensity,
        }
    }
}

/// 需要计算的度量集合.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum MetricSet {
    /// 只计算形状度量.
    Shape,

    /// 形状和强度度量.
    #[default]
    ShapeAndIntensity,
}

impl MetricSet {
    /// 按输出顺序列出的度量项.
    #[inline]
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            Self::Shape => &SHAPE_METRICS,
            Self::ShapeAndIntensity => &ALL_METRICS,
        }
    }

    /// 是否需要强度图像.
    #[inline]
    pub fn has_intensity(self) -> bool {
        matches!(self, Self::ShapeAndIntensity)
    }
}

/// 度量值. 体素个数以整数输出, 其余以浮点数输出.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MetricValue {
    /// 计数.
    Count(u64),

    /// 实数.
    Real(f64),
}

impl MetricValue {
    /// 转换为 `f64`.
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Count(c) => c as f64,
            Self::Real(r) => r,
        }
    }
}

/// 整数值的浮点数保留一位小数 (如 `0.0`, `12.0`), 其余使用最短的可还原表示.
impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Count(c) => write!(f, "{c}"),
            Self::Real(r) if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e16 => write!(f, "{r:.1}"),
            Self::Real(r) => write!(f, "{r}"),
        }
    }
}
