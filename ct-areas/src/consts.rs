//! 通用常量.

use crate::LabelId;

/// 背景标签. 它不参与质心定位, 也不参与统计.
pub const BACKGROUND: LabelId = 0;

/// 默认的切片轴 (z 轴, 即水平切片).
pub const DEFAULT_SLICE_AXIS: usize = 2;

/// 判定方向向量退化的阈值.
pub const DIRECTION_EPSILON: f64 = 1e-9;

/// 输出表格的列名.
pub mod columns {
    /// 受试者编号 (由输入文件名解析).
    pub const ID: &str = "id";

    /// 检查号 (由输入文件名解析).
    pub const ACCESSION: &str = "accession";

    /// 序列号 (由输入文件名解析).
    pub const SERIES_NUMBER: &str = "series_number";

    /// 序列名 (由输入文件名解析).
    pub const SERIES_NAME: &str = "series_name";

    /// 自由格式的元信息, 一般是标签体系名.
    pub const SYSTEM: &str = "system";

    /// 受试者.
    pub const SUBJECT: &str = "subject";

    /// 扫描会话.
    pub const SESSION: &str = "session";

    /// 标签值.
    pub const LABEL: &str = "label";

    /// 度量类别, `shape` 或 `intensity`.
    pub const MEASURE: &str = "measure";

    /// 度量名.
    pub const METRIC: &str = "metric";

    /// 度量值.
    pub const VALUE: &str = "value";
}
