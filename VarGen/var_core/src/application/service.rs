use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::application::allocator::{allocate, AllocatorOptions};
use crate::application::artifacts::{project, LayoutArtifacts};
use crate::application::normalizer::normalize_table;
use crate::config::LayoutConfig;
use crate::domain::columns::COL_NAME;
use crate::domain::error::{LayoutError, RowRef};
use crate::domain::model::{Layout, RawTable, VariableSpec};
use crate::domain::values::sanitize_file_stem;
use crate::ports::{ArtifactSink, TableSource};

/// 纯计算入口：规范化全部行 → 名称唯一性检查 → 分配。不做任何 I/O。
pub fn compute_layout(table: &RawTable, options: &AllocatorOptions) -> Result<Layout, LayoutError> {
    let specs = normalize_table(table)?;
    check_unique_names(table, &specs)?;
    let allocation = allocate(&specs, options);
    Ok(Layout { specs, allocation })
}

/// 变量名是输出 JSON 文件名；名称或安全化后的文件名重复都会互相覆盖。
/// 文件名比较不区分大小写（Windows 文件系统上 `Temp.json` 与 `TEMP.json` 是同一文件）。
fn check_unique_names(table: &RawTable, specs: &[VariableSpec]) -> Result<(), LayoutError> {
    let mut names: HashMap<&str, usize> = HashMap::new();
    let mut stems: HashMap<String, usize> = HashMap::new();

    for spec in specs {
        let row = RowRef::new(spec.row, Some(spec.name.clone())).with_line(table.line(spec.row));
        if let Some(first) = names.insert(spec.name.as_str(), spec.row) {
            return Err(LayoutError::invalid_value(
                &row,
                COL_NAME,
                &spec.name,
                format!("duplicate variable name (first defined in row {first})"),
            ));
        }
        let stem = sanitize_file_stem(&spec.name).to_ascii_lowercase();
        if let Some(first) = stems.insert(stem, spec.row) {
            return Err(LayoutError::invalid_value(
                &row,
                COL_NAME,
                &spec.name,
                format!("output file name collides with row {first}"),
            ));
        }
    }
    Ok(())
}

/// 一次完整运行的计数。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub variables: usize,
    pub used_variables: usize,
    pub handlers: usize,
    pub configs_written: usize,
}

/// 计算结果 + 原始表（投影需要原始列）。
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutReport {
    pub table: RawTable,
    pub layout: Layout,
}

impl LayoutReport {
    pub fn artifacts(&self, config: &LayoutConfig) -> LayoutArtifacts {
        project(&self.table, &self.layout, config)
    }
}

/// 变量表 → 寄存器布局的一次完整处理：读表、逐行规范化、分配 handler，
/// 再把 processed 表 / 单变量 JSON / handler 摘要交给 `ArtifactSink` 落盘。
#[derive(Debug, Clone)]
pub struct LayoutService<S: TableSource> {
    source: S,
    config: LayoutConfig,
}

impl<S: TableSource> LayoutService<S> {
    pub fn new(source: S, config: LayoutConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Load the table and compute the layout; stops at the first failing row.
    pub fn build(&self) -> Result<LayoutReport> {
        let table = self
            .source
            .load()
            .with_context(|| format!("failed to load variable table from {}", self.source.describe()))?;
        info!(
            "loaded {} rows ({} columns) from {}",
            table.len(),
            table.columns.len(),
            self.source.describe()
        );

        let layout = compute_layout(&table, &self.config.allocator)?;
        info!(
            "layout: {} variables, {} used, {} handlers",
            layout.specs.len(),
            layout.used_count(),
            layout.allocation.handlers.len()
        );
        Ok(LayoutReport { table, layout })
    }

    /// Build, project and hand every artifact to `sink`.
    pub fn run<K: ArtifactSink>(&self, sink: &mut K) -> Result<RunSummary> {
        let report = self.build()?;
        let artifacts = report.artifacts(&self.config);

        sink.write_processed(&artifacts.processed)
            .context("failed to write processed table")?;
        for config in &artifacts.configs {
            debug!("writing config for {}", config.name);
            sink.write_config(config)
                .with_context(|| format!("failed to write config for {}", config.name))?;
        }
        sink.write_summary(&artifacts.summary)
            .context("failed to write handler summary")?;

        Ok(RunSummary {
            variables: report.layout.specs.len(),
            used_variables: report.layout.used_count(),
            handlers: report.layout.allocation.handlers.len(),
            configs_written: artifacts.configs.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ProcessedTable, VariableConfig};

    #[derive(Default)]
    struct MemorySink {
        processed: Option<ProcessedTable>,
        configs: Vec<VariableConfig>,
        summary: Option<String>,
    }

    impl ArtifactSink for MemorySink {
        fn write_processed(&mut self, table: &ProcessedTable) -> Result<()> {
            self.processed = Some(table.clone());
            Ok(())
        }

        fn write_config(&mut self, config: &VariableConfig) -> Result<()> {
            self.configs.push(config.clone());
            Ok(())
        }

        fn write_summary(&mut self, text: &str) -> Result<()> {
            self.summary = Some(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn run_hands_all_artifacts_to_sink() {
        let table = RawTable::from_records(
            &["plcVariableName", "mbRegister", "mbType", "multiplier", "addressOffset"],
            &[
                &["U#_MEAS", "200", "INT16", "3", "2"],
                &["P", "100", "INT16", "", ""],
            ],
        );
        let service = LayoutService::new(table, LayoutConfig::default());
        let mut sink = MemorySink::default();

        let summary = service.run(&mut sink).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                variables: 2,
                used_variables: 2,
                handlers: 2,
                configs_written: 2,
            }
        );
        assert_eq!(sink.configs.len(), 2);
        assert_eq!(sink.configs[0].name, "U#_MEAS");
        assert_eq!(sink.processed.unwrap().rows.len(), 2);
        assert_eq!(
            sink.summary.unwrap(),
            "Handlers: 2\nHandler 0: start=100, length=2\nHandler 1: start=200, length=6\n"
        );
    }

    #[test]
    fn missing_register_column_surfaces_schema_error() {
        let table = RawTable::from_records(&["plcVariableName"], &[&["TANK_LEVEL"]]);
        let service = LayoutService::new(table, LayoutConfig::default());

        let err = service.build().unwrap_err();
        let layout_err = err.downcast_ref::<LayoutError>().unwrap();
        assert!(matches!(layout_err, LayoutError::Schema { column, .. } if column == "mbRegister"));
        assert_eq!(layout_err.row().name.as_deref(), Some("TANK_LEVEL"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let table = RawTable::from_records(
            &["plcVariableName", "mbRegister"],
            &[&["A", "1"], &["B", "3"], &["A", "5"]],
        );
        let err = compute_layout(&table, &AllocatorOptions::default()).unwrap_err();
        assert_eq!(err.row().index, 2);
        assert!(err.to_string().contains("duplicate variable name"));
    }

    #[test]
    fn colliding_file_stems_are_rejected() {
        let table = RawTable::from_records(
            &["plcVariableName", "mbRegister"],
            &[&["Temp#", "1"], &["Temp_", "3"]],
        );
        let err = compute_layout(&table, &AllocatorOptions::default()).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidValue { ref column, .. } if column == "plcVariableName"));
    }

    #[test]
    fn file_stems_differing_only_in_case_are_rejected() {
        let table = RawTable::from_records(
            &["plcVariableName", "mbRegister"],
            &[&["Temp", "1"], &["TEMP", "3"]],
        );
        let err = compute_layout(&table, &AllocatorOptions::default()).unwrap_err();
        assert_eq!(err.row().index, 1);
        assert!(err.to_string().contains("output file name collides with row 0"));
    }

    #[test]
    fn duplicate_name_error_uses_recorded_source_line() {
        let table = RawTable::from_records(
            &["plcVariableName", "mbRegister"],
            &[&["A", "1"], &["A", "3"]],
        )
        .with_lines(vec![2, 6]);
        let err = compute_layout(&table, &AllocatorOptions::default()).unwrap_err();
        assert_eq!(err.row().line(), 6);
    }
}
