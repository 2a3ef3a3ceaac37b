//! 布局计算：结构化错误（行号 + 列名 + 原始值，便于定位源文件行）。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 源表中的行标识：0-based 数据行序号、1-based 源文件行号，以及已知时的 `plcVariableName`。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RowRef {
    pub index: usize,
    #[serde(rename = "line")]
    pub source_line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RowRef {
    /// 行号未知时按“表头 + 紧密排列的数据行”推算（`index + 2`）。
    pub fn new(index: usize, name: Option<String>) -> Self {
        Self {
            index,
            source_line: index + 2,
            name,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.source_line = line;
        self
    }

    /// 1-based 源文件行号（记录起始行；第 1 行为表头）。
    pub fn line(&self) -> usize {
        self.source_line
    }
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "row {} (line {}, plcVariableName={name})", self.index, self.line()),
            None => write!(f, "row {} (line {})", self.index, self.line()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{row}: missing required column '{column}'")]
    Schema { row: RowRef, column: String },

    #[error("{row}: invalid value '{value}' in column '{column}': {reason}")]
    InvalidValue {
        row: RowRef,
        column: String,
        value: String,
        reason: String,
    },

    #[error("{row}: unknown mbType '{value}'")]
    UnknownType { row: RowRef, value: String },
}

impl LayoutError {
    pub fn schema(row: &RowRef, column: &str) -> Self {
        LayoutError::Schema {
            row: row.clone(),
            column: column.to_string(),
        }
    }

    pub fn invalid_value(row: &RowRef, column: &str, value: &str, reason: impl Into<String>) -> Self {
        LayoutError::InvalidValue {
            row: row.clone(),
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// 用读取阶段记录的真实行号替换推算值。
    pub fn at_line(mut self, line: usize) -> Self {
        match &mut self {
            LayoutError::Schema { row, .. }
            | LayoutError::InvalidValue { row, .. }
            | LayoutError::UnknownType { row, .. } => row.source_line = line,
        }
        self
    }

    pub fn row(&self) -> &RowRef {
        match self {
            LayoutError::Schema { row, .. }
            | LayoutError::InvalidValue { row, .. }
            | LayoutError::UnknownType { row, .. } => row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_row_column_and_value() {
        let row = RowRef::new(3, Some("Temp_#".to_string()));
        let err = LayoutError::invalid_value(&row, "mbRegister", "abc", "not an integer");
        let text = err.to_string();
        assert!(text.contains("row 3"));
        assert!(text.contains("line 5"));
        assert!(text.contains("Temp_#"));
        assert!(text.contains("'mbRegister'"));
        assert!(text.contains("'abc'"));
    }

    #[test]
    fn at_line_replaces_inferred_line() {
        let row = RowRef::new(1, Some("B".to_string()));
        let err = LayoutError::invalid_value(&row, "mbRegister", "x", "not an integer").at_line(5);
        assert_eq!(err.row().line(), 5);
        assert_eq!(err.row().index, 1);
        assert!(err.to_string().starts_with("row 1 (line 5, plcVariableName=B)"));
    }

    #[test]
    fn display_without_name() {
        let err = LayoutError::schema(&RowRef::new(0, None), "plcVariableName");
        assert_eq!(
            err.to_string(),
            "row 0 (line 2): missing required column 'plcVariableName'"
        );
    }
}
