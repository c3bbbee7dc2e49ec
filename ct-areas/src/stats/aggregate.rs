//! 按标签聚合切片上的形状与强度统计量.

use super::{Metric, MetricSet, MetricValue};
use crate::consts::BACKGROUND;
use crate::{Error, LabelId, Result, Slice2d};
use ordered_float::OrderedFloat;
use std::collections::{HashMap, HashSet};

/// 单个标签在切片上的强度统计量.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IntensityStats {
    /// 平均值.
    pub mean: f64,

    /// 中位数. 偶数个样本时取中间两个值的平均.
    pub median: f64,

    /// 最小值.
    pub minimum: f64,

    /// 最大值.
    pub maximum: f64,

    /// 样本标准差 (分母为 `n - 1`). 只有一个样本时为 0.
    pub sd: f64,
}

impl IntensityStats {
    /// 由样本计算统计量. 样本为空时返回 `None`.
    pub fn from_samples(mut samples: Vec<f64>) -> Option<Self> {
        let n = samples.len();
        if n == 0 {
            return None;
        }
        samples.sort_unstable_by_key(|v| OrderedFloat(*v));

        let mean = samples.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            samples[n / 2]
        } else {
            (samples[n / 2 - 1] + samples[n / 2]) / 2.0
        };
        let sd = if n > 1 {
            let ss: f64 = samples.iter().map(|v| (v - mean) * (v - mean)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        Some(Self {
            mean,
            median,
            minimum: samples[0],
            maximum: samples[n - 1],
            sd,
        })
    }
}

/// 单个标签在切片上的统计记录.
///
/// 标签不在切片上时, 所有度量均为 0.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LabelStats {
    /// 标签值.
    pub label: LabelId,

    /// 体素个数.
    pub nvoxels: u64,

    /// 物理面积, 以平方毫米为单位.
    pub physical_area_mm: f64,

    /// 物理体积, 以立方毫米为单位.
    pub physical_volume_mm: f64,

    /// 强度统计量. 只统计形状时为 `None`.
    pub intensity: Option<IntensityStats>,
}

impl LabelStats {
    /// 不在切片上的标签: 所有度量为 0.
    pub fn absent(label: LabelId, metrics: MetricSet) -> Self {
        Self {
            label,
            nvoxels: 0,
            physical_area_mm: 0.0,
            physical_volume_mm: 0.0,
            intensity: metrics.has_intensity().then(IntensityStats::default),
        }
    }

    /// 标签是否出现在切片上.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.nvoxels > 0
    }

    /// 获取单项度量值. 未计算的强度度量按 0 处理.
    pub fn value(&self, metric: Metric) -> MetricValue {
        let intensity = self.intensity.unwrap_or_default();
        match metric {
            Metric::NVoxels => MetricValue::Count(self.nvoxels),
            Metric::PhysicalAreaMm => MetricValue::Real(self.physical_area_mm),
            Metric::PhysicalVolumeMm => MetricValue::Real(self.physical_volume_mm),
            Metric::Mean => MetricValue::Real(intensity.mean),
            Metric::Median => MetricValue::Real(intensity.median),
            Metric::Maximum => MetricValue::Real(intensity.maximum),
            Metric::Minimum => MetricValue::Real(intensity.minimum),
            Metric::Sd => MetricValue::Real(intensity.sd),
        }
    }
}

/// 单个标签的累加器.
#[derive(Default)]
struct Accumulator {
    count: u64,
    samples: Vec<f64>,
}

/// 在标签切片 `labels` 上统计 `ids` 中每个标签.
///
/// 给定 `intensity` 时同时统计强度. 结果与 `ids` 一一对应, 保持原顺序 (包括重复项).
/// 背景标签 [`BACKGROUND`] 不参与统计, 总是按不存在处理.
/// 物理体积为体素个数乘以完整的 3D 体素体积, 物理面积为物理体积除以被抽取轴的分辨率.
///
/// 两个切片形状不一致时返回 [`Error::ShapeMismatch`].
pub fn aggregate(
    labels: &Slice2d<LabelId>,
    intensity: Option<&Slice2d<f32>>,
    ids: &[LabelId],
) -> Result<Vec<LabelStats>> {
    let metrics = match intensity {
        Some(img) if img.shape() != labels.shape() => {
            let (lh, lw) = labels.shape();
            let (ih, iw) = img.shape();
            return Err(Error::ShapeMismatch {
                what: "label/intensity slice",
                left: vec![lh, lw],
                right: vec![ih, iw],
            });
        }
        Some(_) => MetricSet::ShapeAndIntensity,
        None => MetricSet::Shape,
    };

    let wanted: HashSet<LabelId> = ids.iter().copied().filter(|&l| l != BACKGROUND).collect();
    let mut acc: HashMap<LabelId, Accumulator> = HashMap::with_capacity(wanted.len());
    match intensity {
        Some(img) => {
            for (&label, &hu) in labels.iter().zip(img.iter()) {
                if wanted.contains(&label) {
                    let a = acc.entry(label).or_default();
                    a.count += 1;
                    a.samples.push(hu as f64);
                }
            }
        }
        None => {
            for &label in labels.iter().filter(|l| wanted.contains(*l)) {
                acc.entry(label).or_default().count += 1;
            }
        }
    }

    let voxel_volume = labels.voxel_volume();
    let thickness = labels.thickness();
    let present: HashMap<LabelId, LabelStats> = acc
        .into_iter()
        .map(|(label, a)| {
            let physical_volume_mm = a.count as f64 * voxel_volume;
            let stats = LabelStats {
                label,
                nvoxels: a.count,
                physical_area_mm: physical_volume_mm / thickness,
                physical_volume_mm,
                intensity: IntensityStats::from_samples(a.samples),
            };
            (label, stats)
        })
        .collect();

    log::debug!(
        "{} of {} distinct labels present on slice {} (axis {})",
        present.len(),
        wanted.len(),
        labels.index(),
        labels.axis()
    );

    Ok(ids
        .iter()
        .map(|id| {
            present
                .get(id)
                .copied()
                .unwrap_or_else(|| LabelStats::absent(*id, metrics))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{aggregate, IntensityStats, LabelStats};
    use crate::stats::{Metric, MetricSet, MetricValue};
    use crate::{Error, Geometry, IntensityVolume, LabelVolume, SliceAxis};
    use ndarray::Array3;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    /// `[x, y, z] = (4, 3, 2)`, 分辨率 (0.5, 0.8, 2.5).
    ///
    /// 第 1 层 z 切片: 标签 1 占 3 个像素, 标签 2 占 1 个像素, 强度为 `10 * x + y`.
    fn fixture() -> (IntensityVolume, LabelVolume) {
        let g = Geometry::from_spacing([0.5, 0.8, 2.5]).unwrap();
        let mut labels = Array3::<u32>::zeros((4, 3, 2));
        labels[[0, 0, 1]] = 1;
        labels[[1, 0, 1]] = 1;
        labels[[3, 2, 1]] = 1;
        labels[[2, 1, 1]] = 2;
        // 只在第 0 层出现.
        labels[[0, 0, 0]] = 3;
        let scan = Array3::from_shape_fn((4, 3, 2), |(x, y, _)| (10 * x + y) as f32);
        (
            IntensityVolume::from_xyz(scan, g.clone()),
            LabelVolume::from_xyz(labels, g),
        )
    }

    #[test]
    fn test_intensity_stats() {
        let s = IntensityStats::from_samples(vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        assert!(f64_eq(s.mean, 2.5));
        assert!(f64_eq(s.median, 2.5));
        assert!(f64_eq(s.minimum, 1.0));
        assert!(f64_eq(s.maximum, 4.0));
        assert!(f64_eq(s.sd, (5.0f64 / 3.0).sqrt()));

        let s = IntensityStats::from_samples(vec![-7.5]).unwrap();
        assert!(f64_eq(s.median, -7.5));
        assert_eq!(s.sd, 0.0);

        assert!(IntensityStats::from_samples(Vec::new()).is_none());
    }

    #[test]
    fn test_aggregate_present_and_absent() {
        let (scan, labels) = fixture();
        let ls = labels.extract(SliceAxis::Z, 1).unwrap();
        let is = scan.extract(SliceAxis::Z, 1).unwrap();
        let stats = aggregate(&ls, Some(&is), &[1, 3, 2, 1]).unwrap();

        assert_eq!(stats.len(), 4);
        assert_eq!(
            stats.iter().map(|s| s.label).collect::<Vec<_>>(),
            [1, 3, 2, 1]
        );
        assert_eq!(stats[0], stats[3]);

        let one = &stats[0];
        assert_eq!(one.nvoxels, 3);
        assert!(f64_eq(one.physical_volume_mm, 3.0 * 0.5 * 0.8 * 2.5));
        assert!(f64_eq(one.physical_area_mm, one.physical_volume_mm / 2.5));
        assert!(f64_eq(one.physical_area_mm, 3.0 * 0.5 * 0.8));
        // 强度为 0, 10, 32.
        let i = one.intensity.unwrap();
        assert!(f64_eq(i.mean, 14.0));
        assert!(f64_eq(i.median, 10.0));
        assert!(f64_eq(i.minimum, 0.0));
        assert!(f64_eq(i.maximum, 32.0));

        let three = &stats[1];
        assert!(!three.is_present());
        assert_eq!(*three, LabelStats::absent(3, MetricSet::ShapeAndIntensity));
        for m in MetricSet::ShapeAndIntensity.metrics() {
            assert_eq!(three.value(*m).as_f64(), 0.0);
        }

        let two = &stats[2];
        assert_eq!(two.nvoxels, 1);
        assert_eq!(two.intensity.unwrap().sd, 0.0);
        assert!(f64_eq(two.intensity.unwrap().mean, 21.0));
    }

    #[test]
    fn test_aggregate_shape_only() {
        let (_, labels) = fixture();
        let ls = labels.extract(SliceAxis::Y, 0).unwrap();
        let stats = aggregate(&ls, None, &[1, 3, 4]).unwrap();

        // y = 0 切片: 标签 1 在 (x=0, z=1), (x=1, z=1), 标签 3 在 (x=0, z=0).
        assert_eq!(stats[0].nvoxels, 2);
        assert!(f64_eq(stats[0].physical_area_mm, 2.0 * 0.5 * 2.5));
        assert!(f64_eq(stats[0].physical_volume_mm, 2.0 * 0.5 * 2.5 * 0.8));
        assert_eq!(stats[1].nvoxels, 1);
        assert!(stats.iter().all(|s| s.intensity.is_none()));
        assert_eq!(stats[2], LabelStats::absent(4, MetricSet::Shape));
        assert_eq!(stats[2].value(Metric::Mean), MetricValue::Real(0.0));
    }

    #[test]
    fn test_aggregate_skips_background() {
        let (scan, labels) = fixture();
        let ls = labels.extract(SliceAxis::Z, 1).unwrap();
        let is = scan.extract(SliceAxis::Z, 1).unwrap();

        let stats = aggregate(&ls, None, &[0]).unwrap();
        assert_eq!(stats, [LabelStats::absent(0, MetricSet::Shape)]);

        let stats = aggregate(&ls, Some(&is), &[2, 0]).unwrap();
        assert_eq!(stats[0].nvoxels, 1);
        assert_eq!(stats[1], LabelStats::absent(0, MetricSet::ShapeAndIntensity));
    }

    #[test]
    fn test_aggregate_shape_mismatch() {
        let (scan, labels) = fixture();
        let ls = labels.extract(SliceAxis::Z, 0).unwrap();
        let is = scan.extract(SliceAxis::X, 0).unwrap();
        assert!(matches!(
            aggregate(&ls, Some(&is), &[1]),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
