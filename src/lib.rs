//! # Geopress - location-history to Parquet converter
//!
//! Streams a location-history JSON export (one large array of timestamped
//! location/activity records), flattens each record into a sparse row of
//! named scalars, and writes the result as a single zstd-compressed Parquet
//! table.
//!
//! ## Pipeline
//!
//! stream-read -> flatten -> assemble columns -> derive timestamps -> write.
//! Strictly linear and single threaded. The input document is never held in
//! memory as a whole; the flattened rows and the output table are.
//!
//! ## Quick Start
//!
//! ```rust
//! use geopress::convert;
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = br#"[
//!     {"startTime": "2024-01-15T08:00:00.000Z",
//!      "visit": {"topCandidate": {"placeLocation": "geo:37.422,-122.084"}}}
//! ]"#;
//!
//! let dir = tempfile::tempdir()?;
//! let out = dir.path().join("history.parquet");
//! let batch = convert(&input[..], &out, |_| {})?;
//! assert_eq!(batch.num_rows(), 1);
//! # Ok(())
//! # }
//! ```

use std::io::Read;
use std::path::Path;

use arrow::record_batch::RecordBatch;

pub mod error;
pub mod flatten;
pub mod geo;
pub mod stream;
pub mod table;
pub mod writer;

// Re-export commonly used types for convenience
pub use error::PipelineError;
pub use flatten::{flatten_record, FlatRow};
pub use stream::RecordStream;
pub use table::RowSet;
pub use writer::write_parquet;

use crate::error::Result;

/// How often [`convert`] reports progress, in records.
pub const PROGRESS_INTERVAL: usize = 10_000;

/// Main entry point: run the whole pipeline.
///
/// Streams records from `reader`, flattens them, assembles the columnar
/// table, and writes it to `output` as zstd-compressed Parquet. `progress`
/// is invoked with the running count after every [`PROGRESS_INTERVAL`]
/// records. Returns the written batch so callers can report row counts or
/// print a preview.
///
/// Nothing is written unless every record flattens cleanly and at least one
/// row was produced.
pub fn convert<R: Read>(
    reader: R,
    output: &Path,
    mut progress: impl FnMut(usize),
) -> Result<RecordBatch> {
    let mut rows = RowSet::new();

    for (index, record) in RecordStream::new(reader).enumerate() {
        rows.push(flatten_record(&record?)?);
        if (index + 1) % PROGRESS_INTERVAL == 0 {
            progress(index + 1);
        }
    }

    let batch = rows.into_batch()?;
    write_parquet(output, &batch)?;
    Ok(batch)
}
