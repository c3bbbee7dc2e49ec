//! 一次完整的切片统计: 读取图像, 定位切片, 统计并生成表格.

use crate::report::{Format, Metadata, Table};
use crate::stats::{aggregate, locate_slice, LabelStats, MetricSet, SliceLocation};
use crate::{Error, IntensityVolume, LabelId, LabelVolume, Result, SliceAxis};
use std::path::PathBuf;

/// 切片统计任务的全部参数.
#[derive(Clone, Debug)]
pub struct SliceStatsJob {
    /// 强度图像路径.
    pub input: PathBuf,

    /// 被统计的分割图路径. 为 `None` 时使用参考图.
    pub segmentation: Option<PathBuf>,

    /// 用于定位切片的参考标签图路径.
    pub reference: PathBuf,

    /// 需要统计的标签, 按输出顺序排列.
    pub labels: Vec<LabelId>,

    /// 用于计算质心的参考标签.
    pub centroid: LabelId,

    /// 切片轴.
    pub axis: SliceAxis,

    /// 元信息项: 一个自由格式字符串, 或 `subject session` 两项.
    ///
    /// 在切片定位成功之后才按 [`Metadata::from_tokens`] 解析.
    pub metadata: Vec<String>,

    /// 表格形状.
    pub format: Format,

    /// 需要计算的度量.
    pub metrics: MetricSet,
}

/// 任务结果.
#[derive(Clone, Debug)]
pub struct JobOutput {
    /// 切片定位信息.
    pub location: SliceLocation,

    /// 与 `labels` 一一对应的统计记录.
    pub stats: Vec<LabelStats>,

    /// 组装好的表格.
    pub table: Table,
}

impl SliceStatsJob {
    /// 读取所有图像并执行任务.
    ///
    /// 只统计形状时不读取强度图像的体素.
    pub fn run(&self) -> Result<JobOutput> {
        let reference = LabelVolume::open(&self.reference)?;
        let segmentation = match &self.segmentation {
            Some(p) if *p != self.reference => Some(LabelVolume::open(p)?),
            _ => None,
        };
        let image = if self.metrics.has_intensity() {
            Some(IntensityVolume::open(&self.input)?)
        } else {
            None
        };
        self.compute(image.as_ref(), segmentation.as_ref(), &reference)
    }

    /// 在已读入的图像上执行任务.
    ///
    /// `segmentation` 为 `None` 时参考图同时作为分割图.
    /// 需要强度度量而 `image` 为 `None` 时, 只输出形状度量.
    ///
    /// # 注意
    ///
    /// 切片索引由参考图的几何信息求得, 然后直接用于分割图与强度图像.
    /// 三者应当处于同一体素网格上.
    pub fn compute(
        &self,
        image: Option<&IntensityVolume>,
        segmentation: Option<&LabelVolume>,
        reference: &LabelVolume,
    ) -> Result<JobOutput> {
        let location = locate_slice(reference, self.centroid, self.axis)?;
        log::info!(
            "Centroid of label {}: ({:.3}, {:.3}, {:.3})",
            location.label,
            location.centroid[0],
            location.centroid[1],
            location.centroid[2]
        );
        log::info!("Slice: {} along axis {}", location.index, location.axis);

        let metadata = Metadata::from_tokens(&self.input, &self.metadata)?;

        let segmentation = segmentation.unwrap_or(reference);
        let image = image.filter(|_| self.metrics.has_intensity());
        if let Some(img) = image {
            if img.shape() != segmentation.shape() {
                let (a, b, c) = img.shape();
                let (d, e, f) = segmentation.shape();
                return Err(Error::ShapeMismatch {
                    what: "image/segmentation",
                    left: vec![a, b, c],
                    right: vec![d, e, f],
                });
            }
        }

        let index = location.checked_index(segmentation.extent(self.axis))?;
        let label_slice = segmentation.extract(self.axis, index)?;
        let intensity_slice = image.map(|img| img.extract(self.axis, index)).transpose()?;

        let stats = aggregate(&label_slice, intensity_slice.as_ref(), &self.labels)?;
        let metrics = if intensity_slice.is_some() {
            self.metrics
        } else {
            MetricSet::Shape
        };
        let table = Table::build(self.format, &metadata, &stats, metrics);
        if table.is_empty() {
            log::warn!("No labels requested, the table has no rows");
        }

        Ok(JobOutput {
            location,
            stats,
            table,
        })
    }
}
