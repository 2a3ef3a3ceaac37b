//! 变量表布局：稳定数据模型。
//!
//! 约束：
//! - 每个输入行对应且仅对应一个 `VariableSpec`；multiplier 展开只用于内部 handler 计算
//! - 名称永不展开（`U#_MEAS` 输出仍为 `U#_MEAS`）
//! - 各阶段只产出新值，不回写输入

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::MbType;

/// 一行原始记录：列名 → 原始文本。
pub type RawRow = HashMap<String, String>;

/// 已完成分隔符识别的输入表。`columns` 保留表头顺序（输出按此顺序写列）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
    /// 每行在源文件中的起始行号（1-based）；内存构建的表为空。
    pub lines: Vec<usize>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self {
            columns,
            rows,
            lines: Vec::new(),
        }
    }

    pub fn with_lines(mut self, lines: Vec<usize>) -> Self {
        self.lines = lines;
        self
    }

    /// 第 `index` 行的源文件行号；未记录时按紧密排列推算。
    pub fn line(&self, index: usize) -> usize {
        self.lines.get(index).copied().unwrap_or(index + 2)
    }

    #[cfg(test)]
    pub(crate) fn from_records(columns: &[&str], records: &[&[&str]]) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = records
            .iter()
            .map(|cells| {
                columns
                    .iter()
                    .zip(cells.iter())
                    .map(|(c, v)| (c.clone(), v.to_string()))
                    .collect()
            })
            .collect();
        Self::new(columns, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VariableSpec {
    /// 0-based 输入行序号；同地址时的先后以它为准。
    pub row: usize,
    #[serde(rename = "plcVariableName")]
    pub name: String,
    #[serde(rename = "mbRegister")]
    pub register: u32,
    #[serde(rename = "mbType")]
    pub mb_type: MbType,
    #[serde(rename = "mbTypeSize")]
    pub type_size: u32,
    #[serde(rename = "mbFunctionCode")]
    pub function_code: u8,
    pub multiplier: u32,
    pub address_offset: i64,
    #[serde(rename = "mbUsed")]
    pub used: bool,
    /// 名称中含单元占位符 `#`。
    pub unit_template: bool,
    /// 第 i 个单元的地址 = `mbRegister + i * addressOffset`，长度恒等于 `multiplier`。
    pub unit_registers: Vec<u32>,
}

/// 一段连续寄存器块。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Handler {
    pub id: u32,
    pub start_address: u32,
    /// 所含单元尺寸之和
    pub length: u32,
}

impl Handler {
    pub(crate) fn open(id: u32, start_address: u32) -> Self {
        Self {
            id,
            start_address,
            length: 0,
        }
    }

    /// 末地址（不含）。
    pub fn end_address(&self) -> u64 {
        u64::from(self.start_address) + u64::from(self.length)
    }
}

/// 单个已启用变量的分配结果（取其第 0 个单元）。
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpecAssignment {
    #[serde(rename = "mbHandler")]
    pub handler_id: u32,
    #[serde(rename = "mbHandlerOffset")]
    pub handler_offset: u32,
    #[serde(rename = "mbIdx")]
    pub idx: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// 与输入 specs 一一对应；`mbUsed=false` 的位置为 `None`。
    pub assignments: Vec<Option<SpecAssignment>>,
    /// 按 id 升序。
    pub handlers: Vec<Handler>,
}

impl Allocation {
    pub fn assignment(&self, spec_index: usize) -> Option<SpecAssignment> {
        self.assignments.get(spec_index).copied().flatten()
    }
}

/// 计算结果：specs（输入顺序）+ 分配。
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub specs: Vec<VariableSpec>,
    pub allocation: Allocation,
}

impl Layout {
    pub fn used_count(&self) -> usize {
        self.specs.iter().filter(|s| s.used).count()
    }
}

/// processed CSV 的内容：表头 + 与输入同序的文本行。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// 单变量 JSON 配置。
#[derive(Clone, Debug, PartialEq)]
pub struct VariableConfig {
    pub name: String,
    /// 已做文件名安全化（不含扩展名）
    pub file_stem: String,
    pub record: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_table_from_records_keeps_column_order() {
        let table = RawTable::from_records(
            &["plcVariableName", "mbRegister"],
            &[&["A", "100"], &["B", "102"]],
        );
        assert_eq!(table.columns, vec!["plcVariableName", "mbRegister"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1]["mbRegister"], "102");
        assert_eq!(table.line(1), 3);
        assert_eq!(table.clone().with_lines(vec![2, 7]).line(1), 7);
    }

    #[test]
    fn assignment_serializes_with_column_names() {
        let json = serde_json::to_string(&SpecAssignment {
            handler_id: 1,
            handler_offset: 4,
            idx: 7,
        })
        .unwrap();
        assert_eq!(json, r#"{"mbHandler":1,"mbHandlerOffset":4,"mbIdx":7}"#);
    }

    #[test]
    fn handler_end_address_does_not_overflow() {
        let h = Handler {
            id: 0,
            start_address: u32::MAX,
            length: 8,
        };
        assert_eq!(h.end_address(), u64::from(u32::MAX) + 8);
    }
}
