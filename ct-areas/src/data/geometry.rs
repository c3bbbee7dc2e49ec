//! 图像几何: 体素分辨率、原点、方向, 以及物理坐标与索引间的转换.

use crate::consts::DIRECTION_EPSILON;
use crate::{Error, Result};
use nalgebra::{Matrix3, Vector3};
use nifti::NiftiHeader;
use std::fmt;

/// 图像轴. 编号沿用 nifti 约定, 与内部 `(z, y, x)` 存储顺序相反.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SliceAxis {
    /// 第 0 轴, 自然图像的水平方向.
    X,

    /// 第 1 轴, 自然图像的垂直方向.
    Y,

    /// 第 2 轴, 相邻切片方向.
    Z,
}

impl SliceAxis {
    /// 图像轴编号 (0, 1, 2).
    #[inline]
    pub const fn image_index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// 对应的 `ndarray` 存储轴.
    #[inline]
    pub(crate) const fn array_axis(self) -> ndarray::Axis {
        ndarray::Axis(2 - self.image_index())
    }

    /// 抽取切片后剩余的两个图像轴, 按编号升序.
    #[inline]
    pub const fn in_plane(self) -> [SliceAxis; 2] {
        match self {
            Self::X => [Self::Y, Self::Z],
            Self::Y => [Self::X, Self::Z],
            Self::Z => [Self::X, Self::Y],
        }
    }
}

impl Default for SliceAxis {
    #[inline]
    fn default() -> Self {
        Self::Z
    }
}

impl TryFrom<usize> for SliceAxis {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            0 => Ok(Self::X),
            1 => Ok(Self::Y),
            2 => Ok(Self::Z),
            any_else => Err(Error::AxisOutOfRange(any_else)),
        }
    }
}

impl fmt::Display for SliceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.image_index())
    }
}

/// 图像几何信息.
///
/// 物理坐标 `p` 与连续索引 `i` (按图像轴顺序 `[x, y, z]`) 满足
/// `p = origin + direction * diag(spacing) * i`.
/// 该结构是只读的, 构造时即缓存了逆变换.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    spacing: [f64; 3],
    origin: [f64; 3],
    direction: Matrix3<f64>,
    /// `(direction * diag(spacing))^-1`.
    inverse: Matrix3<f64>,
}

impl Default for Geometry {
    /// 单位分辨率, 原点为零, 方向为单位阵.
    fn default() -> Self {
        Self {
            spacing: [1.0; 3],
            origin: [0.0; 3],
            direction: Matrix3::identity(),
            inverse: Matrix3::identity(),
        }
    }
}

/// 不合法的分辨率 (非有限或非正) 按 1.0 处理, 与 ITK 读取 nifti 时的行为一致.
#[inline]
fn sanitize(pixdim: f32) -> f64 {
    let v = (pixdim as f64).abs();
    if v.is_finite() && v > 0.0 {
        v
    } else {
        1.0
    }
}

/// 由 nifti 四元数参数 `(b, c, d)` 计算旋转矩阵.
fn quaternion_rotation(b: f64, c: f64, d: f64) -> Matrix3<f64> {
    let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
    Matrix3::new(
        a * a + b * b - c * c - d * d,
        2.0 * (b * c - a * d),
        2.0 * (b * d + a * c),
        2.0 * (b * c + a * d),
        a * a + c * c - b * b - d * d,
        2.0 * (c * d - a * b),
        2.0 * (b * d - a * c),
        2.0 * (c * d + a * b),
        a * a + d * d - c * c - b * b,
    )
}

impl Geometry {
    /// 构建几何信息. `direction` 按行存储, 其第 `j` 列是第 `j` 个图像轴在物理空间中的单位方向.
    ///
    /// `spacing` 含非有限值或非正值时返回 [`Error::InvalidSpacing`];
    /// 方向矩阵不可逆时返回 [`Error::SingularDirection`].
    pub fn new(spacing: [f64; 3], origin: [f64; 3], direction: [[f64; 3]; 3]) -> Result<Self> {
        if !spacing.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(Error::InvalidSpacing(spacing));
        }
        let direction = Matrix3::from_fn(|r, c| direction[r][c]);
        Self::build(spacing, origin, direction)
    }

    /// 仅指定分辨率, 原点为零, 方向为单位阵.
    #[inline]
    pub fn from_spacing(spacing: [f64; 3]) -> Result<Self> {
        Self::new(spacing, [0.0; 3], [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    fn build(spacing: [f64; 3], origin: [f64; 3], direction: Matrix3<f64>) -> Result<Self> {
        let scaled = direction * Matrix3::from_diagonal(&Vector3::from(spacing));
        let inverse = scaled.try_inverse().ok_or(Error::SingularDirection)?;
        Ok(Self {
            spacing,
            origin,
            direction,
            inverse,
        })
    }

    /// 从 nifti header 解析几何信息.
    ///
    /// 优先使用 sform (`sform_code > 0`), 其次 qform (`qform_code > 0`),
    /// 最后退化为只用 `pixdim` 缩放. nifti 的 RAS 坐标会被转换为 LPS.
    /// 该过程不会失败: 退化的方向矩阵会被替换为单位阵.
    pub fn from_header(h: &NiftiHeader) -> Self {
        let pixdim = [sanitize(h.pixdim[1]), sanitize(h.pixdim[2]), sanitize(h.pixdim[3])];

        let (columns, origin) = if h.sform_code > 0 {
            let rows = [h.srow_x, h.srow_y, h.srow_z];
            let column = |j: usize| {
                Vector3::new(rows[0][j] as f64, rows[1][j] as f64, rows[2][j] as f64)
            };
            let origin = [rows[0][3] as f64, rows[1][3] as f64, rows[2][3] as f64];
            ([column(0), column(1), column(2)], origin)
        } else if h.qform_code > 0 {
            let r = quaternion_rotation(
                h.quatern_b as f64,
                h.quatern_c as f64,
                h.quatern_d as f64,
            );
            // qfac 只取符号; 0 视作 1.
            let qfac = if h.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
            let columns = [
                r.column(0) * pixdim[0],
                r.column(1) * pixdim[1],
                r.column(2) * (pixdim[2] * qfac),
            ];
            let origin = [h.quatern_x as f64, h.quatern_y as f64, h.quatern_z as f64];
            (columns, origin)
        } else {
            let columns = [
                Vector3::x() * pixdim[0],
                Vector3::y() * pixdim[1],
                Vector3::z() * pixdim[2],
            ];
            (columns, [0.0; 3])
        };

        let mut spacing = pixdim;
        let mut direction = Matrix3::identity();
        for (j, column) in columns.iter().enumerate() {
            let norm = column.norm();
            if norm.is_finite() && norm > DIRECTION_EPSILON {
                spacing[j] = norm;
                direction.set_column(j, &(column / norm));
            }
        }

        // RAS -> LPS.
        let flip = Matrix3::from_diagonal(&Vector3::new(-1.0, -1.0, 1.0));
        let origin = [-origin[0], -origin[1], origin[2]];

        Self::build(spacing, origin, flip * direction).unwrap_or_else(|_| {
            log::warn!("Degenerate orientation in nifti header, falling back to identity");
            Self::axis_aligned(spacing, origin)
        })
    }

    /// 方向为单位阵时逆变换可直接写出. `spacing` 必须已是有限正数.
    fn axis_aligned(spacing: [f64; 3], origin: [f64; 3]) -> Self {
        Self {
            spacing,
            origin,
            direction: Matrix3::identity(),
            inverse: Matrix3::from_diagonal(&Vector3::from(spacing.map(|s| 1.0 / s))),
        }
    }

    /// 体素分辨率, 按图像轴顺序 `[x, y, z]`, 以毫米为单位.
    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// 第 `(0, 0, 0)` 个体素中心的物理坐标.
    #[inline]
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// 方向余弦矩阵, 按行存储.
    pub fn direction(&self) -> [[f64; 3]; 3] {
        let d = &self.direction;
        [
            [d[(0, 0)], d[(0, 1)], d[(0, 2)]],
            [d[(1, 0)], d[(1, 1)], d[(1, 2)]],
            [d[(2, 0)], d[(2, 1)], d[(2, 2)]],
        ]
    }

    /// 单个体素的实际体积, 以立方毫米为单位.
    #[inline]
    pub fn voxel_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    /// 将连续索引 (按图像轴顺序) 转换为物理坐标.
    pub fn index_to_physical(&self, index: [f64; 3]) -> [f64; 3] {
        let scaled = Vector3::from(index).component_mul(&Vector3::from(self.spacing));
        let p = Vector3::from(self.origin) + self.direction * scaled;
        [p.x, p.y, p.z]
    }

    /// 将物理坐标转换为连续索引 (按图像轴顺序).
    pub fn physical_to_continuous_index(&self, point: [f64; 3]) -> [f64; 3] {
        let i = self.inverse * (Vector3::from(point) - Vector3::from(self.origin));
        [i.x, i.y, i.z]
    }

    /// 将物理坐标转换为最近的体素索引. 恰好位于两个体素中间时向上取整.
    ///
    /// 结果可能为负, 也可能越界.
    pub fn physical_to_index(&self, point: [f64; 3]) -> [i64; 3] {
        self.physical_to_continuous_index(point)
            .map(|c| (c + 0.5).floor() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, SliceAxis};
    use crate::Error;
    use nifti::NiftiHeader;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    fn assert_point_eq(a: [f64; 3], b: [f64; 3]) {
        assert!(a.iter().zip(b.iter()).all(|(x, y)| f64_eq(*x, *y)), "{a:?} != {b:?}");
    }

    #[test]
    fn test_axis_from_usize() {
        assert_eq!(SliceAxis::try_from(0).unwrap(), SliceAxis::X);
        assert_eq!(SliceAxis::try_from(2).unwrap(), SliceAxis::Z);
        assert!(matches!(SliceAxis::try_from(3), Err(Error::AxisOutOfRange(3))));
        assert_eq!(SliceAxis::default(), SliceAxis::Z);
        assert_eq!(SliceAxis::Y.in_plane(), [SliceAxis::X, SliceAxis::Z]);
        assert_eq!(SliceAxis::X.array_axis(), ndarray::Axis(2));
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(matches!(
            Geometry::from_spacing([1.0, 0.0, 1.0]),
            Err(Error::InvalidSpacing(_))
        ));
        assert!(matches!(
            Geometry::from_spacing([1.0, f64::NAN, 1.0]),
            Err(Error::InvalidSpacing(_))
        ));
        let singular = [[1.0, 1.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(matches!(
            Geometry::new([1.0; 3], [0.0; 3], singular),
            Err(Error::SingularDirection)
        ));
    }

    #[test]
    fn test_round_trip_oblique() {
        // 绕 z 轴旋转 90 度, 带偏移.
        let direction = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let g = Geometry::new([0.5, 0.8, 2.5], [10.0, -20.0, 5.0], direction).unwrap();

        let p = g.index_to_physical([2.0, 3.0, 4.0]);
        // x 轴 -> 物理 y, y 轴 -> 物理 -x.
        assert_point_eq(p, [10.0 - 2.4, -20.0 + 1.0, 5.0 + 10.0]);
        assert_point_eq(g.physical_to_continuous_index(p), [2.0, 3.0, 4.0]);
        assert_eq!(g.physical_to_index(p), [2, 3, 4]);
        assert!(f64_eq(g.voxel_volume(), 0.5 * 0.8 * 2.5));
    }

    #[test]
    fn test_physical_to_index_rounding() {
        let g = Geometry::from_spacing([1.0, 1.0, 2.0]).unwrap();
        assert_eq!(g.physical_to_index([0.49, 1.51, 5.0]), [0, 2, 3]);
        assert_eq!(g.physical_to_index([-0.6, 0.0, -0.2]), [-1, 0, 0]);
    }

    #[test]
    fn test_from_header_pixdim_only() {
        let mut h = NiftiHeader::default();
        h.pixdim = [1.0, 0.7, 0.7, 3.0, 0.0, 0.0, 0.0, 0.0];
        h.sform_code = 0;
        h.qform_code = 0;
        let g = Geometry::from_header(&h);
        assert_point_eq(g.spacing(), [0.7, 0.7, 3.0]);
        assert_point_eq(g.origin(), [0.0; 3]);
        // RAS -> LPS
        assert_eq!(
            g.direction(),
            [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn test_from_header_sform() {
        let mut h = NiftiHeader::default();
        h.pixdim = [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        h.sform_code = 1;
        h.srow_x = [-0.8, 0.0, 0.0, 100.0];
        h.srow_y = [0.0, -0.8, 0.0, 120.0];
        h.srow_z = [0.0, 0.0, 5.0, -300.0];
        let g = Geometry::from_header(&h);
        assert!(g.spacing().iter().zip([0.8, 0.8, 5.0]).all(|(a, b)| (a - b).abs() < 1e-6));
        assert_point_eq(g.origin(), [-100.0, -120.0, -300.0]);
        // 双重翻转后为单位阵.
        assert_eq!(
            g.direction(),
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn test_from_header_qform_identity() {
        let mut h = NiftiHeader::default();
        h.pixdim = [-1.0, 2.0, 2.0, 4.0, 0.0, 0.0, 0.0, 0.0];
        h.sform_code = 0;
        h.qform_code = 1;
        h.quatern_b = 0.0;
        h.quatern_c = 0.0;
        h.quatern_d = 0.0;
        h.quatern_x = 1.0;
        h.quatern_y = 2.0;
        h.quatern_z = 3.0;
        let g = Geometry::from_header(&h);
        assert_point_eq(g.spacing(), [2.0, 2.0, 4.0]);
        assert_point_eq(g.origin(), [-1.0, -2.0, 3.0]);
        // qfac = -1 翻转 z 方向.
        assert_eq!(
            g.direction(),
            [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]]
        );
    }

    #[test]
    fn test_from_header_qform_rotation() {
        // 绕 z 轴旋转 90 度: 第 0 轴指向 RAS 的 +y, 第 1 轴指向 -x.
        let mut h = NiftiHeader::default();
        h.pixdim = [1.0, 0.5, 0.75, 2.0, 0.0, 0.0, 0.0, 0.0];
        h.sform_code = 0;
        h.qform_code = 1;
        h.quatern_b = 0.0;
        h.quatern_c = 0.0;
        h.quatern_d = 0.5f32.sqrt();
        h.quatern_x = 10.0;
        h.quatern_y = -20.0;
        h.quatern_z = 30.0;
        let g = Geometry::from_header(&h);
        assert_point_eq(g.spacing(), [0.5, 0.75, 2.0]);
        assert_point_eq(g.origin(), [-10.0, 20.0, 30.0]);

        // LPS 下: 第 0 轴指向 -y, 第 1 轴指向 +x.
        let expected = [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        for (row, want) in g.direction().iter().zip(expected.iter()) {
            assert!(
                row.iter().zip(want.iter()).all(|(a, b)| (a - b).abs() < 1e-6),
                "{row:?} != {want:?}"
            );
        }

        // 索引 (1, 0, 0) 沿 LPS 的 -y 移动半毫米.
        let p = g.index_to_physical([1.0, 0.0, 0.0]);
        assert!((p[0] - -10.0).abs() < 1e-6);
        assert!((p[1] - 19.5).abs() < 1e-6);
        assert_eq!(g.physical_to_index(p), [1, 0, 0]);
    }
}
