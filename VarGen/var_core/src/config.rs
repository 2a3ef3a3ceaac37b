use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::allocator::AllocatorOptions;
use crate::domain::columns::{DEFAULT_DROPPED_COLUMNS, DEFAULT_FLOAT_FIELDS};

pub const DEFAULT_PROCESSED_FILE_NAME: &str = "processed_variables.csv";
pub const DEFAULT_CONFIGS_DIR_NAME: &str = "configs";
pub const DEFAULT_SUMMARY_FILE_NAME: &str = "mb_handler_summary.txt";

/// 布局运行配置
/// 说明：规则参数集中在这里，避免散落在计算与输出逻辑中。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub allocator: AllocatorOptions,
    /// 输出 JSON 中强制写为浮点数的列
    pub float_fields: Vec<String>,
    /// 不进入 processed CSV / JSON 的列
    pub dropped_columns: Vec<String>,
    pub processed_file_name: String,
    pub configs_dir_name: String,
    pub summary_file_name: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            allocator: AllocatorOptions::default(),
            float_fields: DEFAULT_FLOAT_FIELDS.iter().map(|s| s.to_string()).collect(),
            dropped_columns: DEFAULT_DROPPED_COLUMNS.iter().map(|s| s.to_string()).collect(),
            processed_file_name: DEFAULT_PROCESSED_FILE_NAME.to_string(),
            configs_dir_name: DEFAULT_CONFIGS_DIR_NAME.to_string(),
            summary_file_name: DEFAULT_SUMMARY_FILE_NAME.to_string(),
        }
    }
}

impl LayoutConfig {
    /// 文件不存在时返回默认配置。
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout config file from: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse layout config JSON from: {}", path.display()))?;
        Ok(config)
    }

    pub fn is_float_field(&self, column: &str) -> bool {
        self.float_fields.iter().any(|c| c == column)
    }

    pub fn is_dropped(&self, column: &str) -> bool {
        self.dropped_columns.iter().any(|c| c == column)
    }
}
