use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::{Error, Idx3d, LabelId, Result};

pub mod geometry;
pub mod slice;

pub use geometry::{Geometry, SliceAxis};
pub use slice::Slice2d;

/// 3D 体数据, 包括几何信息和按 `(z, y, x)` 存储的体素值.
///
/// 2D 图像被视作只有一层的 3D 体数据.
#[derive(Debug, Clone)]
pub struct Volume<T> {
    geometry: Geometry,
    data: Array3<T>,
}

/// nii 格式 3D CT 扫描. 体素值 (HU) 以 `f32` 保存.
pub type IntensityVolume = Volume<f32>;

/// nii 格式 3D 标签图. 标签值以 [`LabelId`] 保存.
pub type LabelVolume = Volume<LabelId>;

/// 将 nifti 读出的 `[x, y, z, ...]` 数组整理为标准布局的 `(z, y, x)` 数组.
///
/// 末尾长度为 1 的维度会被丢弃, 2D 图像补成一层.
fn into_zyx<T: Clone>(mut data: ArrayD<T>) -> Result<Array3<T>> {
    while data.ndim() > 3 && data.len_of(Axis(data.ndim() - 1)) == 1 {
        let last = data.ndim() - 1;
        data = data.index_axis_move(Axis(last), 0);
    }
    if data.ndim() == 2 {
        data = data.insert_axis(Axis(2));
    }
    if data.ndim() != 3 {
        return Err(Error::UnsupportedDimensionality(data.ndim()));
    }

    // [x, y, z] -> [z, y, x].
    let data = data.into_dimensionality::<Ix3>()?.permuted_axes([2, 1, 0]);

    // The nature of nifti data field layout.
    Ok(if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().into_owned()
    })
}

macro_rules! impl_open {
    ($($elem: ty),+) => {
        $(
            impl Volume<$elem> {
                /// 打开 nii (或 nii.gz) 文件. `path` 为文件的本地路径.
                /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
                pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
                    let obj = ReaderOptions::new().read_file(path.as_ref())?;
                    let geometry = Geometry::from_header(obj.header());
                    let data = into_zyx(obj.into_volume().into_ndarray::<$elem>()?)?;
                    log::debug!(
                        "Loaded {} with shape (z, y, x) = {:?}, spacing {:?}",
                        path.as_ref().display(),
                        data.dim(),
                        geometry.spacing()
                    );
                    Ok(Self { geometry, data })
                }
            }
        )+
    };
}

impl_open!(f32, LabelId);

impl<T> Index<Idx3d> for Volume<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> Volume<T> {
    /// 由按 `(z, y, x)` 存储的数据和几何信息直接创建体数据.
    #[inline]
    pub fn new(data: Array3<T>, geometry: Geometry) -> Self {
        Self { geometry, data }
    }

    /// 由按 nifti 惯用 `[x, y, z]` 格式存储的数据和几何信息创建体数据.
    pub fn from_xyz(data: Array3<T>, geometry: Geometry) -> Self
    where
        T: Clone,
    {
        let data = data.permuted_axes([2, 1, 0]);
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self { geometry, data }
    }

    /// 几何信息.
    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// 数据形状, 按存储顺序 `(z, y, x)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 沿图像轴 `axis` 的体素个数.
    #[inline]
    pub fn extent(&self, axis: SliceAxis) -> usize {
        self.data.len_of(axis.array_axis())
    }

    /// 体素总个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// 沿图像轴 `axis` 抽取第 `index` 层二维切片.
    ///
    /// 切片保留剩余两个轴的分辨率, 以及被抽取轴的分辨率 (作为切片厚度).
    /// `index` 越界时返回 [`Error::SliceOutOfBounds`].
    pub fn extract(&self, axis: SliceAxis, index: usize) -> Result<Slice2d<T>>
    where
        T: Clone,
    {
        let len = self.extent(axis);
        if index >= len {
            return Err(Error::SliceOutOfBounds {
                axis,
                index: index as i64,
                len,
            });
        }
        let data = self.data.index_axis(axis.array_axis(), index).to_owned();
        Ok(Slice2d::new(data, axis, index, self.geometry.spacing()))
    }
}

impl<T: PartialEq> Volume<T> {
    /// 获取值为 `value` 的体素个数.
    #[inline]
    pub fn count(&self, value: T) -> usize {
        self.data.iter().filter(|p| **p == value).count()
    }
}
