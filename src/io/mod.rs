//! File import and export

pub mod csv;

pub use self::csv::{export, export_file, import, import_reader, CsvOptions};
