//! 根据参考标签的质心确定切片位置.

use crate::consts::BACKGROUND;
use crate::{Error, LabelId, LabelVolume, Result, SliceAxis};

/// 质心定位结果.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliceLocation {
    /// 用于定位的标签.
    pub label: LabelId,

    /// 标签的物理质心 (LPS, 毫米).
    pub centroid: [f64; 3],

    /// 切片轴.
    pub axis: SliceAxis,

    /// 质心在参考图像中沿 `axis` 的最近体素索引. 可能为负或越界.
    pub index: i64,
}

impl SliceLocation {
    /// 检查 `self.index` 在长度为 `len` 的轴上是否合法, 合法时返回其 `usize` 值.
    pub fn checked_index(&self, len: usize) -> Result<usize> {
        usize::try_from(self.index)
            .ok()
            .filter(|i| *i < len)
            .ok_or(Error::SliceOutOfBounds {
                axis: self.axis,
                index: self.index,
                len,
            })
    }
}

/// 计算 `label_map` 中值为 `label` 的所有体素的物理质心.
///
/// 不存在该标签, 或 `label` 为背景 [`BACKGROUND`] 时返回 [`Error::CentroidLabelNotFound`].
pub fn centroid(label_map: &LabelVolume, label: LabelId) -> Result<[f64; 3]> {
    if label == BACKGROUND {
        return Err(Error::CentroidLabelNotFound(label));
    }
    let mut count = 0u64;
    // 按图像轴顺序 [x, y, z] 累加.
    let mut sum = [0.0f64; 3];
    for ((z, y, x), _) in label_map.data().indexed_iter().filter(|(_, v)| **v == label) {
        count += 1;
        sum[0] += x as f64;
        sum[1] += y as f64;
        sum[2] += z as f64;
    }
    if count == 0 {
        return Err(Error::CentroidLabelNotFound(label));
    }
    // 几何变换是仿射的, 平均索引的像即为物理质心.
    let mean = sum.map(|s| s / count as f64);
    Ok(label_map.geometry().index_to_physical(mean))
}

/// 计算 `reference` 中标签 `label` 的质心, 并求其沿 `axis` 的切片索引.
pub fn locate_slice(reference: &LabelVolume, label: LabelId, axis: SliceAxis) -> Result<SliceLocation> {
    let centroid = centroid(reference, label)?;
    let index = reference.geometry().physical_to_index(centroid)[axis.image_index()];
    Ok(SliceLocation {
        label,
        centroid,
        axis,
        index,
    })
}
