//! 行规范化：原始行 → `VariableSpec`。
//!
//! - 纯函数：只依赖输入行与静态类型表
//! - 每行首个错误即返回（fail fast），错误携带行号/列名/原始值
//! - 带 `#` 的单元模板名不展开；multiplier 只用于记录各单元地址，供 handler 计算

use log::{debug, warn};

use crate::domain::columns::{
    COL_ADDRESS_OFFSET, COL_FUNCTION_CODE, COL_MULTIPLIER, COL_NAME, COL_REGISTER, COL_TYPE,
    COL_USED, UNIT_MARKER,
};
use crate::domain::error::{LayoutError, RowRef};
use crate::domain::model::{RawRow, RawTable, VariableSpec};
use crate::domain::types::MbType;
use crate::domain::values::{parse_flag, parse_integer};

/// Modbus 地址空间为 16 位，单个变量的单元数不可能超过它。
pub const MAX_MULTIPLIER: i64 = 65_536;

pub fn normalize_row(index: usize, row: &RawRow) -> Result<VariableSpec, LayoutError> {
    let name = row.get(COL_NAME).map(|v| v.trim().to_string());
    let row_ref = RowRef::new(index, name.clone().filter(|n| !n.is_empty()));

    let name = name.ok_or_else(|| LayoutError::schema(&row_ref, COL_NAME))?;
    if name.is_empty() {
        return Err(LayoutError::invalid_value(
            &row_ref,
            COL_NAME,
            "",
            "variable name is blank",
        ));
    }

    let raw_register = row
        .get(COL_REGISTER)
        .ok_or_else(|| LayoutError::schema(&row_ref, COL_REGISTER))?;
    let register = parse_register(&row_ref, raw_register)?;

    let mb_type = match row.get(COL_TYPE).map(|v| v.trim()) {
        None => MbType::DEFAULT,
        Some("") => MbType::BLANK_CELL,
        Some(raw) => MbType::resolve(raw).ok_or_else(|| LayoutError::UnknownType {
            row: row_ref.clone(),
            value: raw.to_string(),
        })?,
    };

    let function_code = match optional(row, COL_FUNCTION_CODE) {
        None => mb_type.default_function_code(),
        Some(raw) => parse_function_code(&row_ref, raw)?,
    };

    let multiplier = match optional(row, COL_MULTIPLIER) {
        None => 1,
        Some(raw) => parse_multiplier(&row_ref, raw)?,
    };

    let address_offset = match optional(row, COL_ADDRESS_OFFSET) {
        None => 0,
        Some(raw) => parse_integer(raw).ok_or_else(|| {
            LayoutError::invalid_value(&row_ref, COL_ADDRESS_OFFSET, raw, "not an integer")
        })?,
    };

    let used = match optional(row, COL_USED) {
        None => true,
        Some(raw) => parse_flag(raw).ok_or_else(|| {
            LayoutError::invalid_value(&row_ref, COL_USED, raw, "expected true/false/1/0")
        })?,
    };

    let unit_registers = unit_registers(&row_ref, register, address_offset, multiplier)?;
    let unit_template = name.contains(UNIT_MARKER);
    if multiplier > 1 && !unit_template {
        warn!(
            "{row_ref}: multiplier={multiplier} but name has no '{UNIT_MARKER}' placeholder; units share one output name"
        );
    }

    let type_size = mb_type.size_bytes();
    debug!(
        "normalized {name}: register={register} type={mb_type:?} size={type_size} fc={function_code} units={}",
        unit_registers.len()
    );

    Ok(VariableSpec {
        row: index,
        name,
        register,
        mb_type,
        type_size,
        function_code,
        multiplier,
        address_offset,
        used,
        unit_template,
        unit_registers,
    })
}

/// 逐行规范化；遇到首个失败行即停止。
pub fn normalize_rows(rows: &[RawRow]) -> Result<Vec<VariableSpec>, LayoutError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index, row))
        .collect()
}

/// 同 `normalize_rows`，但错误行号取自读取阶段记录的源文件行。
pub fn normalize_table(table: &RawTable) -> Result<Vec<VariableSpec>, LayoutError> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index, row).map_err(|err| err.at_line(table.line(index))))
        .collect()
}

/// 可选列：列缺失或值为空白均视为未提供。
fn optional<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    row.get(column)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_register(row: &RowRef, raw: &str) -> Result<u32, LayoutError> {
    let value = parse_integer(raw)
        .ok_or_else(|| LayoutError::invalid_value(row, COL_REGISTER, raw, "not an integer"))?;
    u32::try_from(value).map_err(|_| {
        LayoutError::invalid_value(row, COL_REGISTER, raw, "register must be a non-negative address")
    })
}

fn parse_function_code(row: &RowRef, raw: &str) -> Result<u8, LayoutError> {
    match parse_integer(raw) {
        Some(code @ 1..=127) => Ok(code as u8),
        Some(_) => Err(LayoutError::invalid_value(
            row,
            COL_FUNCTION_CODE,
            raw,
            "function code must be within 1..=127",
        )),
        None => Err(LayoutError::invalid_value(
            row,
            COL_FUNCTION_CODE,
            raw,
            "not an integer",
        )),
    }
}

fn parse_multiplier(row: &RowRef, raw: &str) -> Result<u32, LayoutError> {
    match parse_integer(raw) {
        Some(m @ 1..=MAX_MULTIPLIER) => Ok(m as u32),
        Some(m) if m < 1 => Err(LayoutError::invalid_value(
            row,
            COL_MULTIPLIER,
            raw,
            "multiplier must be >= 1",
        )),
        Some(_) => Err(LayoutError::invalid_value(
            row,
            COL_MULTIPLIER,
            raw,
            format!("multiplier must be <= {MAX_MULTIPLIER}"),
        )),
        None => Err(LayoutError::invalid_value(
            row,
            COL_MULTIPLIER,
            raw,
            "not an integer",
        )),
    }
}

fn unit_registers(
    row: &RowRef,
    register: u32,
    address_offset: i64,
    multiplier: u32,
) -> Result<Vec<u32>, LayoutError> {
    (0..i64::from(multiplier))
        .map(|i| {
            i.checked_mul(address_offset)
                .and_then(|shift| i64::from(register).checked_add(shift))
                .and_then(|address| u32::try_from(address).ok())
                .ok_or_else(|| {
                    LayoutError::invalid_value(
                        row,
                        COL_ADDRESS_OFFSET,
                        &address_offset.to_string(),
                        format!("unit {i} address falls outside the register range"),
                    )
                })
        })
        .collect()
}
