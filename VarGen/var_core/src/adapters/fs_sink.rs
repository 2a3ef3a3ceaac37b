use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;
use thiserror::Error;

use crate::config::LayoutConfig;
use crate::domain::model::{ProcessedTable, VariableConfig};
use crate::ports::ArtifactSink;

/// processed CSV 固定使用 `;` 分隔（与常见 PLC 变量表导出一致）。
pub const PROCESSED_DELIMITER: u8 = b';';

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 文件系统落地：
/// - `<out>/processed_variables.csv`（可关闭）
/// - `<out>/configs/<stem>.json`
/// - `<out>/mb_handler_summary.txt`
#[derive(Debug, Clone)]
pub struct FsArtifactSink {
    out_dir: PathBuf,
    processed_file_name: String,
    configs_dir_name: String,
    summary_file_name: String,
    save_processed: bool,
    configs_written: usize,
}

impl FsArtifactSink {
    pub fn new(out_dir: impl Into<PathBuf>, config: &LayoutConfig, save_processed: bool) -> Self {
        Self {
            out_dir: out_dir.into(),
            processed_file_name: config.processed_file_name.clone(),
            configs_dir_name: config.configs_dir_name.clone(),
            summary_file_name: config.summary_file_name.clone(),
            save_processed,
            configs_written: 0,
        }
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.out_dir.join(&self.configs_dir_name)
    }

    pub fn configs_written(&self) -> usize {
        self.configs_written
    }
}

impl ArtifactSink for FsArtifactSink {
    fn write_processed(&mut self, table: &ProcessedTable) -> Result<()> {
        if !self.save_processed {
            return Ok(());
        }
        let path = self.out_dir.join(&self.processed_file_name);
        write_processed_csv(&path, table)?;
        info!("wrote {} ({} rows)", path.display(), table.rows.len());
        Ok(())
    }

    fn write_config(&mut self, config: &VariableConfig) -> Result<()> {
        let path = self.configs_dir().join(format!("{}.json", config.file_stem));
        let json = serde_json::to_string_pretty(&config.record).map_err(SinkError::from)?;
        write_text(&path, &json)?;
        self.configs_written += 1;
        Ok(())
    }

    fn write_summary(&mut self, text: &str) -> Result<()> {
        let path = self.out_dir.join(&self.summary_file_name);
        write_text(&path, text)?;
        info!(
            "wrote {} and {} configs under {}",
            path.display(),
            self.configs_written,
            self.configs_dir().display()
        );
        Ok(())
    }
}

pub fn write_processed_csv(path: &Path, table: &ProcessedTable) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(PROCESSED_DELIMITER)
        .from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    std::fs::write(path, text).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_dir(dir: &Path) -> Result<(), SinkError> {
    std::fs::create_dir_all(dir).map_err(|source| SinkError::Io {
        path: dir.to_path_buf(),
        source,
    })
}
