//! 输出投影：原始表 + 布局结果 → processed 行 / 单变量 JSON / handler 摘要。
//!
//! 投影只读取原始行（名称不展开），展开单元只存在于 allocator 内部。

use serde_json::{Map, Number, Value};

use crate::config::LayoutConfig;
use crate::domain::columns::{
    is_computed_column, COL_HANDLER, COL_HANDLER_OFFSET, COL_IDX, COL_MQTT_NAME, COL_NAME,
    COL_TYPE_SIZE, COL_USED, COMPUTED_COLUMNS,
};
use crate::domain::model::{
    Handler, Layout, ProcessedTable, RawTable, SpecAssignment, VariableConfig, VariableSpec,
};
use crate::domain::values::{
    collapse_whitespace, parse_flag, parse_integer, parse_number, sanitize_file_stem,
};

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutArtifacts {
    pub processed: ProcessedTable,
    pub configs: Vec<VariableConfig>,
    pub summary: String,
}

pub fn project(table: &RawTable, layout: &Layout, config: &LayoutConfig) -> LayoutArtifacts {
    let processed = processed_table(table, layout, config);
    let configs = variable_configs(&processed, layout, config);
    let summary = handler_summary(&layout.allocation.handlers);
    LayoutArtifacts {
        processed,
        configs,
        summary,
    }
}

/// 输入列（去掉 dropped 列）+ 计算列；输入已有同名计算列时原位覆盖。
pub fn processed_table(table: &RawTable, layout: &Layout, config: &LayoutConfig) -> ProcessedTable {
    let mut columns: Vec<String> = table
        .columns
        .iter()
        .filter(|c| !config.is_dropped(c))
        .cloned()
        .collect();
    for computed in COMPUTED_COLUMNS {
        if !columns.iter().any(|c| c == computed) {
            columns.push(computed.to_string());
        }
    }

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let spec = layout.specs.get(index);
            let assignment = layout.allocation.assignment(index);
            columns
                .iter()
                .map(|column| match spec {
                    Some(spec) if is_computed_column(column) => {
                        computed_cell(column, spec, assignment)
                    }
                    _ => row.get(column).cloned().unwrap_or_default(),
                })
                .collect()
        })
        .collect();

    ProcessedTable { columns, rows }
}

fn computed_cell(column: &str, spec: &VariableSpec, assignment: Option<SpecAssignment>) -> String {
    match column {
        COL_TYPE_SIZE => spec.type_size.to_string(),
        COL_HANDLER => assignment.map(|a| a.handler_id.to_string()).unwrap_or_default(),
        COL_HANDLER_OFFSET => assignment
            .map(|a| a.handler_offset.to_string())
            .unwrap_or_default(),
        COL_IDX => assignment.map(|a| a.idx.to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}

/// 每个原始变量一份 JSON（键顺序 = processed 列顺序，空值省略）。
pub fn variable_configs(
    processed: &ProcessedTable,
    layout: &Layout,
    config: &LayoutConfig,
) -> Vec<VariableConfig> {
    processed
        .rows
        .iter()
        .zip(&layout.specs)
        .map(|(cells, spec)| {
            let record: Map<String, Value> = processed
                .columns
                .iter()
                .zip(cells)
                .filter_map(|(column, raw)| {
                    json_value(column, raw, config).map(|v| (column.clone(), v))
                })
                .collect();
            VariableConfig {
                name: spec.name.clone(),
                file_stem: sanitize_file_stem(&spec.name),
                record,
            }
        })
        .collect()
}

fn json_value(column: &str, raw: &str, config: &LayoutConfig) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match column {
        COL_NAME => return Some(Value::String(trimmed.to_string())),
        COL_USED => {
            return Some(
                parse_flag(trimmed)
                    .map(Value::Bool)
                    .unwrap_or_else(|| Value::String(raw.to_string())),
            )
        }
        COL_MQTT_NAME => return Some(Value::String(collapse_whitespace(raw))),
        _ => {}
    }

    let Some(number) = parse_number(trimmed) else {
        return Some(Value::String(raw.to_string()));
    };
    if config.is_float_field(column) {
        return Number::from_f64(number).map(Value::Number);
    }
    match parse_integer(trimmed) {
        Some(integer) => Some(Value::from(integer)),
        None => Number::from_f64(number).map(Value::Number),
    }
}

pub fn handler_summary(handlers: &[Handler]) -> String {
    let mut lines = vec![format!("Handlers: {}", handlers.len())];
    lines.extend(handlers.iter().map(|h| {
        format!(
            "Handler {}: start={}, length={}",
            h.id, h.start_address, h.length
        )
    }));
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
