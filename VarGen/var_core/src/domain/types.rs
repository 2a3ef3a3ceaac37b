//! Modbus 数据类型表（静态只读）。
//!
//! - `mbType` 文本按别名表解析（trim + 大小写不敏感）
//! - 尺寸单位与寄存器地址单位一致，布局计算中 `address + typeSize` 即下一个连续地址

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MbType {
    Bit,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Int64,
    UInt64,
    Float64,
}

/// 别名 → 类型。同一类型的多种厂商写法都在这里登记。
static TYPE_ALIASES: [(&str, MbType); 25] = [
    ("BIT", MbType::Bit),
    ("BOOL", MbType::Bit),
    ("COIL", MbType::Bit),
    ("INT16", MbType::Int16),
    ("SINT16", MbType::Int16),
    ("INT", MbType::Int16),
    ("UINT16", MbType::UInt16),
    ("UINT", MbType::UInt16),
    ("WORD", MbType::UInt16),
    ("INT32", MbType::Int32),
    ("DINT", MbType::Int32),
    ("UINT32", MbType::UInt32),
    ("UDINT", MbType::UInt32),
    ("DWORD", MbType::UInt32),
    ("FLOAT", MbType::Float32),
    ("FLOAT32", MbType::Float32),
    ("REAL", MbType::Float32),
    ("INT64", MbType::Int64),
    ("LINT", MbType::Int64),
    ("UINT64", MbType::UInt64),
    ("ULINT", MbType::UInt64),
    ("LWORD", MbType::UInt64),
    ("FLOAT64", MbType::Float64),
    ("DOUBLE", MbType::Float64),
    ("LREAL", MbType::Float64),
];

impl MbType {
    /// `mbType` 列缺省时使用的类型。
    pub const DEFAULT: MbType = MbType::Int16;
    /// `mbType` 列存在但单元格为空：按 32 位处理。
    pub const BLANK_CELL: MbType = MbType::Int32;

    pub fn resolve(raw: &str) -> Option<MbType> {
        let key = raw.trim().to_ascii_uppercase();
        TYPE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, ty)| *ty)
    }

    /// 每个单元占用的尺寸（字节）。
    pub fn size_bytes(self) -> u32 {
        match self {
            MbType::Bit => 1,
            MbType::Int16 | MbType::UInt16 => 2,
            MbType::Int32 | MbType::UInt32 | MbType::Float32 => 4,
            MbType::Int64 | MbType::UInt64 | MbType::Float64 => 8,
        }
    }

    /// `mbFunctionCode` 缺省值：位类型读线圈（FC01），其余读保持寄存器（FC03）。
    pub fn default_function_code(self) -> u8 {
        match self {
            MbType::Bit => 1,
            _ => 3,
        }
    }

    #[cfg(test)]
    pub(crate) fn aliases() -> impl Iterator<Item = &'static str> {
        TYPE_ALIASES.iter().map(|(alias, _)| *alias)
    }
}
