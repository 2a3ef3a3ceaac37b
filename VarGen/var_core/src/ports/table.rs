use anyhow::Result;

use crate::domain::model::RawTable;

/// 变量表来源端口
/// 说明：core 只消费“已识别分隔符”的行；文件读取/编码/分隔符探测由适配器负责。
pub trait TableSource {
    /// 读取整张表（表头顺序 + 每行 列名→原始文本）
    fn load(&self) -> Result<RawTable>;
    /// 来源描述（用于日志与错误上下文）
    fn describe(&self) -> String;
}

/// 内存表直接作为数据源（测试 / 上层已解析好的场景）。
impl TableSource for RawTable {
    fn load(&self) -> Result<RawTable> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory table ({} rows)", self.len())
    }
}
