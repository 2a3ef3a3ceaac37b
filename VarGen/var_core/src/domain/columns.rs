//! 变量表列规范：代码侧单一真源常量。

/// 变量名（输出 JSON 文件名 / processed 行标识）。
pub const COL_NAME: &str = "plcVariableName";
pub const COL_REGISTER: &str = "mbRegister";
pub const COL_TYPE: &str = "mbType";
pub const COL_FUNCTION_CODE: &str = "mbFunctionCode";
pub const COL_MULTIPLIER: &str = "multiplier";
pub const COL_ADDRESS_OFFSET: &str = "addressOffset";
pub const COL_USED: &str = "mbUsed";
pub const COL_MQTT_NAME: &str = "mqttName";
pub const COL_MQTT_PAYLOAD: &str = "mqttPayload";

pub const COL_TYPE_SIZE: &str = "mbTypeSize";
pub const COL_HANDLER: &str = "mbHandler";
pub const COL_HANDLER_OFFSET: &str = "mbHandlerOffset";
pub const COL_IDX: &str = "mbIdx";

/// 必填列（逐字匹配；实现会对表头做 trim() 后比对）。
pub const REQUIRED_COLUMNS: [&str; 2] = [COL_NAME, COL_REGISTER];

/// 可选列（缺省或空值时取默认值）。
pub const OPTIONAL_COLUMNS: [&str; 5] = [
    COL_TYPE,
    COL_FUNCTION_CODE,
    COL_MULTIPLIER,
    COL_ADDRESS_OFFSET,
    COL_USED,
];

/// 布局计算追加到 processed 输出的列（顺序即输出顺序）。
pub const COMPUTED_COLUMNS: [&str; 4] = [COL_TYPE_SIZE, COL_HANDLER, COL_HANDLER_OFFSET, COL_IDX];

/// 输出 JSON 中强制为浮点数的字段。
pub const DEFAULT_FLOAT_FIELDS: [&str; 6] = [
    "mqttLowerLimit",
    "mqttUpperLimit",
    "mbScaling",
    "mbOffset",
    "mqttScaling",
    "mqttOffset",
];

/// 不进入任何输出的列。
pub const DEFAULT_DROPPED_COLUMNS: [&str; 1] = [COL_MQTT_PAYLOAD];

/// 单元模板变量名中的占位符（如 `U#_MEAS`）；名称本身永不展开。
pub const UNIT_MARKER: char = '#';

/// 表头规范化：去掉 BOM 与首尾空白。
pub fn normalize_header(s: &str) -> String {
    s.trim_start_matches('\u{FEFF}').trim().to_string()
}

pub fn is_computed_column(name: &str) -> bool {
    COMPUTED_COLUMNS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_columns_snapshot() {
        assert_eq!(REQUIRED_COLUMNS, ["plcVariableName", "mbRegister"]);
    }

    #[test]
    fn computed_columns_snapshot() {
        assert_eq!(
            COMPUTED_COLUMNS,
            ["mbTypeSize", "mbHandler", "mbHandlerOffset", "mbIdx"]
        );
        assert!(is_computed_column("mbIdx"));
        assert!(!is_computed_column("mbRegister"));
    }

    #[test]
    fn normalize_header_strips_bom_and_whitespace() {
        assert_eq!(normalize_header("\u{FEFF}plcVariableName "), "plcVariableName");
        assert_eq!(normalize_header("  mbType\t"), "mbType");
    }
}
