//! 运行时错误.

use crate::{LabelId, SliceAxis};
use thiserror::Error;

/// 加载、抽取切片和统计过程中的错误.
#[derive(Error, Debug)]
pub enum Error {
    /// 读取 nifti 文件错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 其他底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 体数据形状无法转换.
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// 只支持 2D 和 3D 图像 (末尾长度为 1 的维度会被忽略).
    #[error("unsupported image dimensionality: {0}")]
    UnsupportedDimensionality(usize),

    /// 切片轴只能是 0, 1 或 2.
    #[error("slice axis {0} out of range, expected 0, 1 or 2")]
    AxisOutOfRange(usize),

    /// 切片索引越界.
    #[error("slice index {index} out of bounds along axis {axis} (extent {len})")]
    SliceOutOfBounds {
        /// 切片轴.
        axis: SliceAxis,
        /// 请求的索引.
        index: i64,
        /// 该轴上的体素个数.
        len: usize,
    },

    /// 两个本应对齐的图像形状不一致.
    #[error("{what} shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        /// 出错的对象.
        what: &'static str,
        /// 左侧形状.
        left: Vec<usize>,
        /// 右侧形状.
        right: Vec<usize>,
    },

    /// 参考图像中不存在用于定位质心的标签.
    #[error("Label {0} for centroid not found in reference image")]
    CentroidLabelNotFound(LabelId),

    /// 方向矩阵 (乘以分辨率后) 不可逆.
    #[error("singular direction matrix")]
    SingularDirection,

    /// 体素分辨率必须为有限正数.
    #[error("invalid spacing {0:?}")]
    InvalidSpacing([f64; 3]),

    /// 无法从文件名中解析序列信息.
    #[error("cannot derive series identifiers from file name `{0}`")]
    MalformedSeriesName(String),

    /// 元信息只接受一个自由字符串, 或 `subject session` 两项.
    #[error("expected one metadata string or two subject/session tokens, got {0}")]
    MetadataArity(usize),
}

/// 本 crate 的通用结果类型.
pub type Result<T> = std::result::Result<T, Error>;
