use super::Metadata;
use crate::consts::columns;
use crate::stats::{LabelStats, MetricSet};
use crate::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use itertools::Itertools;
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// 表格形状.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Format {
    /// 每个 (标签, 度量) 一行.
    #[default]
    Long,

    /// 每个标签一行, 度量作为列.
    Wide,
}

/// 字符串表格. 第一行为表头, 所有行等长.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// 含分隔符、引号或换行的字段需要加引号, 内部引号写两次.
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

impl Table {
    /// 按 `format` 组装表格.
    pub fn build(format: Format, metadata: &Metadata, stats: &[LabelStats], metrics: MetricSet) -> Self {
        match format {
            Format::Long => Self::long(metadata, stats, metrics),
            Format::Wide => Self::wide(metadata, stats, metrics),
        }
    }

    /// 长表: 元信息列, `label`, `measure`, `metric`, `value`.
    pub fn long(metadata: &Metadata, stats: &[LabelStats], metrics: MetricSet) -> Self {
        let header = metadata
            .columns()
            .into_iter()
            .chain([columns::LABEL, columns::MEASURE, columns::METRIC, columns::VALUE])
            .map(str::to_owned)
            .collect();

        let prefix = metadata.values();
        let rows = stats
            .iter()
            .flat_map(|s| {
                let prefix = &prefix;
                metrics.metrics().iter().map(move |&m| {
                    let mut row = prefix.clone();
                    row.extend([
                        s.label.to_string(),
                        m.measure().name().to_owned(),
                        m.name().to_owned(),
                        s.value(m).to_string(),
                    ]);
                    row
                })
            })
            .collect();

        Self { header, rows }
    }

    /// 宽表: 元信息列, `label`, 以及每个度量一列.
    pub fn wide(metadata: &Metadata, stats: &[LabelStats], metrics: MetricSet) -> Self {
        let header = metadata
            .columns()
            .into_iter()
            .chain([columns::LABEL])
            .chain(metrics.metrics().iter().map(|m| m.name()))
            .map(str::to_owned)
            .collect();

        let prefix = metadata.values();
        let rows = stats
            .iter()
            .map(|s| {
                let mut row = prefix.clone();
                row.push(s.label.to_string());
                row.extend(metrics.metrics().iter().map(|&m| s.value(m).to_string()));
                row
            })
            .collect();

        Self { header, rows }
    }

    /// 表头.
    #[inline]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// 数据行 (不含表头).
    #[inline]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// 数据行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否没有数据行.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 以 CSV 格式写入 `w`. 行尾为 `\n`.
    pub fn write_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        for line in std::iter::once(&self.header).chain(self.rows.iter()) {
            writeln!(w, "{}", line.iter().map(|f| escape(f)).join(","))?;
        }
        Ok(())
    }

    /// 将 CSV 保存到 `path`. 路径以 `.gz` 结尾时写出 gzip 压缩文件.
    ///
    /// gzip 头部不含时间戳, 相同的表格总是得到相同的字节.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = BufWriter::new(File::create(path)?);
        if path.extension().is_some_and(|e| e == "gz") {
            let mut encoder = GzEncoder::new(file, Compression::default());
            self.write_csv(&mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            let mut file = file;
            self.write_csv(&mut file)?;
            file.flush()?;
        }
        log::debug!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }
}

/// 对齐的纯文本表格, 用于终端展示.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = (0..self.header.len())
            .map(|c| {
                std::iter::once(&self.header)
                    .chain(self.rows.iter())
                    .map(|r| r[c].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for (i, line) in std::iter::once(&self.header).chain(self.rows.iter()).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let cells = line
                .iter()
                .zip(widths.iter())
                .map(|(cell, w)| format!("{cell:>w$}", w = *w))
                .join("  ");
            write!(f, "{cells}")?;
        }
        Ok(())
    }
}
