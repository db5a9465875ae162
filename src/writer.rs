//! Parquet output with zstd compression.

use std::fs::{self, File};
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::Result;

/// Write a record batch to `path` as a zstd-compressed Parquet file.
///
/// Writes to a `.tmp` sibling and renames into place, so a failed write never
/// leaves a truncated file at the final path. An existing file at `path` is
/// replaced.
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let temp_path = path.with_extension("parquet.tmp");
    let file = File::create(&temp_path)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten_record;
    use crate::table::RowSet;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use serde_json::json;

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.parquet");

        let mut rows = RowSet::new();
        rows.push(
            flatten_record(&json!({
                "startTime": "2024-01-15T08:00:00.000Z",
                "visit": { "topCandidate": { "placeLocation": "geo:37.422,-122.084" } }
            }))
            .unwrap(),
        );

        let batch = rows.into_batch().unwrap();
        write_parquet(&path, &batch).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("parquet.tmp").exists());

        let file = File::open(&path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let read_back: Vec<_> = reader.collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(read_back.iter().map(|b| b.num_rows()).sum::<usize>(), 1);
    }
}
