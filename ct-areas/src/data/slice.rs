//! 从 3D 体数据中抽取出的二维切片.

use crate::{Idx2d, SliceAxis};
use ndarray::iter::Iter;
use ndarray::{Array2, Ix2};
use std::ops::Index;

/// Owned 二维切片.
///
/// 被抽取的轴已经移除, 剩余两个轴按存储顺序排列 (编号大的轴在前).
/// 切片同时记录剩余两轴的分辨率和被抽取轴的分辨率 (厚度),
/// 以便换算物理面积和体积.
#[derive(Debug, Clone)]
pub struct Slice2d<T> {
    data: Array2<T>,
    axis: SliceAxis,
    index: usize,
    /// 剩余两轴的分辨率, 按图像轴编号升序.
    spacing: [f64; 2],
    thickness: f64,
}

impl<T> Index<Idx2d> for Slice2d<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> Slice2d<T> {
    /// 直接初始化. `volume_spacing` 为原体数据按图像轴顺序的分辨率.
    pub(crate) fn new(data: Array2<T>, axis: SliceAxis, index: usize, volume_spacing: [f64; 3]) -> Self {
        let [a, b] = axis.in_plane();
        Self {
            data,
            axis,
            index,
            spacing: [
                volume_spacing[a.image_index()],
                volume_spacing[b.image_index()],
            ],
            thickness: volume_spacing[axis.image_index()],
        }
    }

    /// 被抽取 (移除) 的图像轴.
    #[inline]
    pub fn axis(&self) -> SliceAxis {
        self.axis
    }

    /// 切片在原体数据中沿 `self.axis()` 的索引.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 图像的分辨率 (行, 列).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 剩余两轴的像素分辨率, 按图像轴编号升序, 以毫米为单位.
    #[inline]
    pub fn spacing(&self) -> [f64; 2] {
        self.spacing
    }

    /// 被抽取轴的分辨率, 以毫米为单位.
    #[inline]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// 单个像素的实际面积, 以平方毫米为单位.
    #[inline]
    pub fn pixel_area(&self) -> f64 {
        self.spacing[0] * self.spacing[1]
    }

    /// 把切片看作一个体素厚时, 单个像素的实际体积, 以立方毫米为单位.
    #[inline]
    pub fn voxel_volume(&self) -> f64 {
        self.pixel_area() * self.thickness
    }

    /// 获取可以按行优先序迭代像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置 (行, 列) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&T> {
        self.data.get(pos)
    }
}

impl<T: PartialEq> Slice2d<T> {
    /// 统计图像中值为 `value` 的像素总个数.
    #[inline]
    pub fn count(&self, value: T) -> usize {
        self.data.iter().filter(|&p| *p == value).count()
    }
}

#[cfg(test)]
mod tests {
    use super::Slice2d;
    use crate::SliceAxis;
    use ndarray::array;

    #[test]
    fn test_physical_units() {
        let s = Slice2d::new(array![[1u32, 2], [2, 2]], SliceAxis::Y, 5, [0.5, 3.0, 0.8]);
        assert_eq!(s.index(), 5);
        assert_eq!(s.axis(), SliceAxis::Y);
        assert_eq!(s.spacing(), [0.5, 0.8]);
        assert_eq!(s.thickness(), 3.0);
        assert!((s.pixel_area() - 0.4).abs() < 1e-12);
        assert!((s.voxel_volume() - 1.2).abs() < 1e-12);
        assert_eq!(s.count(2), 3);
        assert_eq!(s.get((1, 0)), Some(&2));
        assert_eq!(s.get((2, 0)), None);
        assert_eq!(s.size(), 4);
    }
}
