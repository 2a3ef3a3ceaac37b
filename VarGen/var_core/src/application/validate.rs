//! 输出目录一致性校验（单个输出目录；不做目录批量扫描）。
//!
//! 检查项：
//! - processed CSV 存在、`;` 分隔、含 `mbIdx` 列
//! - 已启用变量的 `mbIdx` 恰为 `0..n` 且互不重复
//! - 可选：`mbHandler` 不超过上限
//! - 每个 JSON：已启用变量具备分配相关键且为整数；无空字符串；`mbUsed` 为布尔；浮点字段为浮点

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;

use crate::adapters::PROCESSED_DELIMITER;
use crate::config::LayoutConfig;
use crate::domain::columns::{
    COL_FUNCTION_CODE, COL_HANDLER, COL_IDX, COL_REGISTER, COL_TYPE_SIZE, COL_USED,
};
use crate::domain::values::{parse_flag, parse_integer};

/// 已启用变量的 JSON 必须具备的键（均为整数）。
pub const REQUIRED_CONFIG_KEYS: [&str; 5] = [
    COL_HANDLER,
    COL_IDX,
    COL_REGISTER,
    COL_FUNCTION_CODE,
    COL_TYPE_SIZE,
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    pub max_handler_id: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: PathBuf,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// 返回发现的问题列表；读取失败（非格式问题）以 `Err` 返回。
pub fn validate_output_dir(
    dir: &Path,
    config: &LayoutConfig,
    options: &ValidateOptions,
) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let processed = dir.join(&config.processed_file_name);
    if processed.is_file() {
        issues.extend(validate_processed(&processed, options)?);
    } else {
        issues.push(ValidationIssue::new(&processed, "missing processed table"));
    }

    let configs_dir = dir.join(&config.configs_dir_name);
    if !configs_dir.is_dir() {
        issues.push(ValidationIssue::new(&configs_dir, "missing configs directory"));
        return Ok(issues);
    }

    let mut json_files: Vec<PathBuf> = fs::read_dir(&configs_dir)
        .with_context(|| format!("failed to list {}", configs_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
        })
        .collect();
    json_files.sort();
    debug!("validating {} config files", json_files.len());

    for path in json_files {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => issues.extend(validate_config_value(&path, &value, config)),
            Err(err) => issues.push(ValidationIssue::new(&path, format!("invalid JSON: {err}"))),
        }
    }

    Ok(issues)
}

fn validate_processed(path: &Path, options: &ValidateOptions) -> Result<Vec<ValidationIssue>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let header = text.lines().next().unwrap_or("");
    if !header.contains(PROCESSED_DELIMITER as char) {
        return Ok(vec![ValidationIssue::new(path, "processed table is not semicolon-separated")]);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(PROCESSED_DELIMITER)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .with_context(|| format!("failed to parse header of {}", path.display()))?
        .clone();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let Some(idx_col) = position(COL_IDX) else {
        return Ok(vec![ValidationIssue::new(path, "processed table has no mbIdx column")]);
    };
    let handler_col = position(COL_HANDLER);
    let used_col = position(COL_USED);

    let mut issues = Vec::new();
    let mut indices: Vec<i64> = Vec::new();
    let mut max_handler: Option<i64> = None;

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to parse {}", path.display()))?;
        let used = used_col
            .and_then(|c| record.get(c))
            .and_then(parse_flag)
            .unwrap_or(true);
        if !used {
            continue;
        }

        match record.get(idx_col).and_then(parse_integer) {
            Some(idx) => indices.push(idx),
            None => issues.push(ValidationIssue::new(
                path,
                format!("record {line}: mbIdx is not numeric"),
            )),
        }
        if let Some(c) = handler_col {
            match record.get(c).and_then(parse_integer) {
                Some(h) => max_handler = Some(max_handler.map_or(h, |m| m.max(h))),
                None => issues.push(ValidationIssue::new(
                    path,
                    format!("record {line}: mbHandler is not numeric"),
                )),
            }
        }
    }

    indices.sort_unstable();
    let expected: Vec<i64> = (0..indices.len() as i64).collect();
    if indices != expected {
        issues.push(ValidationIssue::new(
            path,
            "mbIdx values of used variables are not a contiguous 0-based sequence",
        ));
    }

    if let (Some(limit), Some(seen)) = (options.max_handler_id, max_handler) {
        if seen > i64::from(limit) {
            issues.push(ValidationIssue::new(
                path,
                format!("mbHandler exceeds limit: {seen} > {limit}"),
            ));
        }
    }

    Ok(issues)
}

fn validate_config_value(path: &Path, value: &Value, config: &LayoutConfig) -> Vec<ValidationIssue> {
    let Some(record) = value.as_object() else {
        return vec![ValidationIssue::new(path, "config is not a JSON object")];
    };

    let mut issues = Vec::new();
    let used = match record.get(COL_USED) {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            issues.push(ValidationIssue::new(path, "mbUsed is not boolean"));
            true
        }
    };

    if used {
        let missing: Vec<&str> = REQUIRED_CONFIG_KEYS
            .iter()
            .copied()
            .filter(|k| !record.contains_key(*k))
            .collect();
        if !missing.is_empty() {
            issues.push(ValidationIssue::new(path, format!("missing keys: {missing:?}")));
        }
    }

    for (key, v) in record {
        match v {
            Value::String(s) if s.trim().is_empty() => {
                issues.push(ValidationIssue::new(path, format!("empty string field: {key}")));
            }
            Value::Number(n) if config.is_float_field(key) && !n.is_f64() => {
                issues.push(ValidationIssue::new(path, format!("non-float number in field: {key}")));
            }
            Value::Number(n) if REQUIRED_CONFIG_KEYS.contains(&key.as_str()) && n.is_f64() => {
                issues.push(ValidationIssue::new(path, format!("non-integer number in field: {key}")));
            }
            other if REQUIRED_CONFIG_KEYS.contains(&key.as_str()) && !other.is_number() => {
                issues.push(ValidationIssue::new(path, format!("non-numeric field: {key}")));
            }
            _ => {}
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_record_checks() {
        let config = LayoutConfig::default();
        let path = Path::new("configs/A.json");

        let good = json!({
            "plcVariableName": "A",
            "mbRegister": 100,
            "mbFunctionCode": 3,
            "mbUsed": true,
            "mbScaling": 1.0,
            "mbTypeSize": 2,
            "mbHandler": 0,
            "mbHandlerOffset": 0,
            "mbIdx": 0
        });
        assert!(validate_config_value(path, &good, &config).is_empty());

        let unused = json!({ "plcVariableName": "B", "mbRegister": 1, "mbUsed": false, "mbTypeSize": 2 });
        assert!(validate_config_value(path, &unused, &config).is_empty());

        let bad = json!({
            "plcVariableName": " ",
            "mbRegister": 1.5,
            "mbUsed": "yes",
            "mbScaling": 1
        });
        let messages: Vec<String> = validate_config_value(path, &bad, &config)
            .into_iter()
            .map(|i| i.message)
            .collect();
        assert!(messages.iter().any(|m| m == "mbUsed is not boolean"));
        assert!(messages.iter().any(|m| m.starts_with("missing keys")));
        assert!(messages.iter().any(|m| m == "empty string field: plcVariableName"));
        assert!(messages.iter().any(|m| m == "non-float number in field: mbScaling"));
        assert!(messages.iter().any(|m| m == "non-integer number in field: mbRegister"));
    }

    #[test]
    fn missing_output_dir_reports_both_artifacts() {
        let dir = std::env::temp_dir().join("var-core-validate-missing-dir-does-not-exist");
        let issues =
            validate_output_dir(&dir, &LayoutConfig::default(), &ValidateOptions::default()).unwrap();
        assert_eq!(issues.len(), 2);
    }
}
