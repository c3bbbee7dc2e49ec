#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 在 3D CT 体数据 (及其标签) 的单层切片上统计各标签的形状与强度信息.
//!
//! 整体流程为一条直线:
//!
//! 1. 从 nifti 文件加载扫描 ([`IntensityVolume`]) 与标签 ([`LabelVolume`]),
//!   同时解析体素分辨率、原点和方向 ([`Geometry`]);
//! 2. 计算参考标签中某个标签的物理质心, 将其映射回体素索引, 确定切片位置
//!   ([`stats::centroid`]);
//! 3. 沿给定轴抽取扫描和标签的同一层二维切片 ([`Slice2d`]);
//! 4. 对每个请求的标签统计体素数、物理面积/体积, 以及 (可选的) 强度统计量
//!   ([`stats::aggregate`]);
//! 5. 组装为长表或宽表, 写出 CSV ([`report::Table`]).
//!
//! # 注意
//!
//! 1. 轴编号沿用 nifti / ITK 的图像轴约定: `0` 为 x (宽), `1` 为 y (高),
//!   `2` 为 z (相邻切片方向). 内部数据按 `(z, y, x)` 存储.
//! 2. 物理坐标按 ITK 惯例以 LPS 表示.
//!
//! # 配置
//!
//! 长表/宽表, 是否输出强度统计, 以及元信息的两种写法都是
//! [`SliceStatsJob`] 的配置项.

/// 二维索引, 按存储顺序 (行, 列).
pub type Idx2d = (usize, usize);

/// 三维索引, 按存储顺序 `(z, y, x)`.
pub type Idx3d = (usize, usize, usize);

/// 标签值类型.
pub type LabelId = u32;

pub mod consts;

/// 3D nii 文件基础数据结构.
mod data;

mod error;
mod job;

pub mod prelude;
pub mod report;
pub mod stats;

pub use data::{Geometry, IntensityVolume, LabelVolume, Slice2d, SliceAxis, Volume};
pub use error::{Error, Result};
pub use job::{JobOutput, SliceStatsJob};
