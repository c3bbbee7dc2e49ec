//! 统计结果的表格化输出.

mod table;

pub use table::{Format, Table};

use crate::consts::columns;
use crate::{Error, Result};
use std::path::Path;

/// 由输入文件名解析出的序列信息.
///
/// 文件名 (第一个 `.` 之前的部分) 按 `_` 切分:
/// `{id}_{accession}_{series_number}_{series_name...}_{suffix}`.
/// `series_name` 可以包含 `_`, 最后一段后缀被丢弃.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SeriesInfo {
    /// 受试者编号.
    pub id: String,

    /// 检查号.
    pub accession: String,

    /// 序列号.
    pub series_number: String,

    /// 序列名, 可能为空.
    pub series_name: String,
}

impl SeriesInfo {
    /// 从文件名解析. 少于三段时返回 [`Error::MalformedSeriesName`].
    pub fn from_file_name(name: &str) -> Result<Self> {
        let stem = name.split('.').next().unwrap_or(name);
        let parts: Vec<&str> = stem.split('_').collect();
        let [id, accession, series_number, ..] = parts.as_slice() else {
            return Err(Error::MalformedSeriesName(name.to_owned()));
        };
        let series_name = parts
            .get(3..parts.len() - 1)
            .map(|s| s.join("_"))
            .unwrap_or_default();
        Ok(Self {
            id: id.to_string(),
            accession: accession.to_string(),
            series_number: series_number.to_string(),
            series_name,
        })
    }

    /// 从路径的文件名部分解析.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_file_name(&name)
    }
}

/// 每一行输出前缀的元信息列.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Metadata {
    /// 序列信息加一个自由格式字符串 (一般是标签体系名).
    System {
        /// 由输入文件名解析的序列信息.
        series: SeriesInfo,
        /// 自由格式字符串.
        system: String,
    },

    /// 受试者与会话.
    Subject {
        /// 受试者.
        subject: String,
        /// 会话.
        session: String,
    },
}

impl Metadata {
    /// 由命令行给出的元信息项构建.
    ///
    /// 一项时视作自由格式字符串, 序列信息从 `input` 的文件名解析;
    /// 两项时视作 `subject session`; 其他个数返回 [`Error::MetadataArity`].
    pub fn from_tokens<P: AsRef<Path>, S: AsRef<str>>(input: P, tokens: &[S]) -> Result<Self> {
        match tokens {
            [system] => Ok(Self::System {
                series: SeriesInfo::from_path(input)?,
                system: system.as_ref().to_owned(),
            }),
            [subject, session] => Ok(Self::Subject {
                subject: subject.as_ref().to_owned(),
                session: session.as_ref().to_owned(),
            }),
            any_else => Err(Error::MetadataArity(any_else.len())),
        }
    }

    /// 元信息列名.
    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            Self::System { .. } => vec![
                columns::ID,
                columns::ACCESSION,
                columns::SERIES_NUMBER,
                columns::SERIES_NAME,
                columns::SYSTEM,
            ],
            Self::Subject { .. } => vec![columns::SUBJECT, columns::SESSION],
        }
    }

    /// 元信息值, 与 [`Self::columns`] 一一对应.
    pub fn values(&self) -> Vec<String> {
        match self {
            Self::System { series, system } => vec![
                series.id.clone(),
                series.accession.clone(),
                series.series_number.clone(),
                series.series_name.clone(),
                system.clone(),
            ],
            Self::Subject { subject, session } => vec![subject.clone(), session.clone()],
        }
    }
}
