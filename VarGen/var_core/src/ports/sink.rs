use anyhow::Result;

use crate::domain::model::{ProcessedTable, VariableConfig};

/// 产物落地端口
/// 说明：core 产出结构化结果，由实现方决定写到哪里（文件系统 / 内存 / 其它）。
pub trait ArtifactSink {
    /// processed 表（原始列 + mbTypeSize/mbHandler/mbHandlerOffset/mbIdx）
    fn write_processed(&mut self, table: &ProcessedTable) -> Result<()>;
    /// 单变量 JSON 配置
    fn write_config(&mut self, config: &VariableConfig) -> Result<()>;
    /// handler 摘要文本
    fn write_summary(&mut self, text: &str) -> Result<()>;
}
