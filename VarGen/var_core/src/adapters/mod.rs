mod csv_table;
mod fs_sink;

// 对外导出：表来源 / 产物落地 及其错误类型
pub use csv_table::{
    decode_text, parse_table, read_table, sniff_delimiter, CsvTableSource, TableError,
    TextEncoding,
};
pub use fs_sink::{write_processed_csv, FsArtifactSink, SinkError, PROCESSED_DELIMITER};
