use std::{fs::File, io::{BufWriter, Cursor}, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, ParquetReader, ParquetWriter}};

use super::PendingWrite;

/// Reads a Parquet file from `path` into a Polars DataFrame.
pub(crate) fn read_from_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[common::data] Failed to open parquet file: {}", path.display()))?;
    ParquetReader::new(file)
        .finish()
        .with_context(|| format!("[common::data] Failed to read parquet from {}", path.display()))
}

/// Writes a Polars DataFrame to a Parquet file at `path`, atomically.
pub(crate) fn write_to_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut sink = PendingWrite::open(path)?;
    ParquetWriter::new(BufWriter::new(&mut sink))
        .finish(df)
        .with_context(|| format!("[common::data] Failed to write parquet to {}", path.display()))?;
    sink.finalize()
}

/// Reads headerless pipe-delimited bytes into a DataFrame of string columns
/// named `column_1`, `column_2`, and so on.
///
/// Census summary files are Latin-1; each byte is mapped to the code point
/// of the same value before parsing.
pub(crate) fn read_pipe_delimited_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let text: String = bytes.iter().map(|&b| b as char).collect();
    CsvReadOptions::default()
        .with_has_header(false)
        .map_parse_options(|po| po.with_separator(b'|'))
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
        .context("[common::data] Failed to read pipe-delimited data")
}
