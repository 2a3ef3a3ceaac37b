//! CSV 变量表读取：编码回退 + 分隔符探测 → `RawTable`。
//!
//! - 优先 UTF-8（去 BOM），非法 UTF-8 时按 Windows-1252（Latin-1 超集）解码
//! - 分隔符取表头行：含 Tab 用 Tab，否则含 `;` 用 `;`，否则 `,`
//! - 表头做 trim；缺失的尾部单元格补空串；全空行跳过

use std::path::{Path, PathBuf};

use anyhow::Result;
use encoding_rs::WINDOWS_1252;
use log::{debug, warn};
use thiserror::Error;

use crate::domain::columns::normalize_header;
use crate::domain::model::{RawRow, RawTable};
use crate::ports::TableSource;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("table has no header line")]
    MissingHeader,

    #[error("duplicate column '{0}' in header")]
    DuplicateColumn(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Windows1252,
}

#[derive(Debug, Clone)]
pub struct CsvTableSource {
    path: PathBuf,
}

impl CsvTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for CsvTableSource {
    fn load(&self) -> Result<RawTable> {
        Ok(read_table(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub fn read_table(path: &Path) -> Result<RawTable, TableError> {
    let bytes = std::fs::read(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, encoding) = decode_text(&bytes);
    if encoding != TextEncoding::Utf8 {
        warn!("{} is not valid UTF-8; decoded as Windows-1252", path.display());
    }
    parse_table(&text)
}

pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            (text.into_owned(), TextEncoding::Windows1252)
        }
    }
}

pub fn sniff_delimiter(header_line: &str) -> u8 {
    if header_line.contains('\t') {
        b'\t'
    } else if header_line.contains(';') {
        b';'
    } else {
        b','
    }
}

pub fn parse_table(text: &str) -> Result<RawTable, TableError> {
    let header_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or(TableError::MissingHeader)?;
    let delimiter = sniff_delimiter(header_line);
    debug!("sniffed delimiter {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(TableError::MissingHeader);
    }
    for (i, column) in columns.iter().enumerate() {
        if !column.is_empty() && columns[..i].contains(column) {
            return Err(TableError::DuplicateColumn(column.clone()));
        }
    }

    let mut rows: Vec<RawRow> = Vec::new();
    let mut lines: Vec<usize> = Vec::new();
    for (ordinal, record) in reader.records().enumerate() {
        let record = record?;
        // 空行、引号内换行都会让行号偏离记录序号，取 reader 记录的起始行
        let line = record
            .position()
            .and_then(|p| usize::try_from(p.line()).ok())
            .unwrap_or(ordinal + 2);
        if record.iter().all(|field| field.trim().is_empty()) {
            debug!("skipping blank record at line {line}");
            continue;
        }
        if record.len() > columns.len() {
            warn!(
                "line {line} has {} fields but header has {}; extra fields ignored",
                record.len(),
                columns.len()
            );
        }

        let row: RawRow = columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !column.is_empty())
            .map(|(i, column)| (column.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
        lines.push(line);
    }

    Ok(RawTable::new(columns, rows).with_lines(lines))
}
