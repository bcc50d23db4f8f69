//! Storage backend (Arrow/Parquet)
//!
//! **Append-only ingestion**:
//! - Pitching rows: `playerID` (Utf8), `yearID`, `ER`, `IPouts` (any integer width)
//! - People rows (optional, display only): `playerID`, `nameFirst`, `nameLast`
//! - Batches are appended whole; the schema of the first batch is authoritative
//!
//! Conversion to typed records is where data errors surface: a null or
//! negative count rejects the whole load with `InvalidInput`.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Int64Array, RecordBatch, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Int64Type, Schema, SchemaRef};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use tracing::{debug, info};

use crate::record::{PlayerIdentity, PlayerSeasonRecord};
use crate::{Error, Result};

/// Player id column (pitching and people tables).
pub const PLAYER_ID: &str = "playerID";
/// Season column.
pub const YEAR_ID: &str = "yearID";
/// Earned runs column.
pub const EARNED_RUNS: &str = "ER";
/// Outs pitched column.
pub const OUTS: &str = "IPouts";
/// Given name column.
pub const NAME_FIRST: &str = "nameFirst";
/// Family name column.
pub const NAME_LAST: &str = "nameLast";

/// Canonical schema of pitching batches built by [`pitching_batch`].
#[must_use]
pub fn pitching_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(PLAYER_ID, DataType::Utf8, false),
        Field::new(YEAR_ID, DataType::Int64, false),
        Field::new(EARNED_RUNS, DataType::Int64, false),
        Field::new(OUTS, DataType::Int64, false),
    ]))
}

/// Canonical schema of people batches built by [`people_batch`].
#[must_use]
pub fn people_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(PLAYER_ID, DataType::Utf8, false),
        Field::new(NAME_FIRST, DataType::Utf8, true),
        Field::new(NAME_LAST, DataType::Utf8, true),
    ]))
}

/// Build a pitching batch from typed rows.
///
/// # Errors
/// Arrow construction failure.
pub fn pitching_batch(records: &[PlayerSeasonRecord]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.player_id.as_str()),
        )),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| i64::from(r.year)),
        )),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| i64::from(r.earned_runs)),
        )),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| i64::from(r.outs)),
        )),
    ];
    Ok(RecordBatch::try_new(pitching_schema(), columns)?)
}

/// Build a people batch from identities.
///
/// # Errors
/// Arrow construction failure.
pub fn people_batch(people: &[PlayerIdentity]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            people.iter().map(|p| p.player_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            people.iter().map(|p| p.first_name.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            people.iter().map(|p| p.last_name.as_str()),
        )),
    ];
    Ok(RecordBatch::try_new(people_schema(), columns)?)
}

/// Read every batch of a Parquet file.
///
/// # Errors
/// Returns error if file cannot be read or parsed
pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Vec<RecordBatch>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::StorageError(format!(
            "Failed to open Parquet file {}: {e}",
            path.display()
        ))
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?;

    let reader = builder
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch =
            batch.map_err(|e| Error::StorageError(format!("Failed to read record batch: {e}")))?;
        batches.push(batch);
    }

    debug!(path = %path.display(), batches = batches.len(), "read parquet");
    Ok(batches)
}

/// Write batches (all sharing one schema) to a Parquet file.
///
/// # Errors
/// `StorageError` when there are no batches to take a schema from,
/// otherwise I/O or Parquet failures.
pub fn write_parquet<P: AsRef<Path>>(path: P, batches: &[RecordBatch]) -> Result<()> {
    let first = batches
        .first()
        .ok_or_else(|| Error::StorageError("Nothing to write: no batches".to_string()))?;
    let file = File::create(path.as_ref())?;
    let mut writer = ArrowWriter::try_new(file, first.schema(), None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;
    debug!(path = %path.as_ref().display(), batches = batches.len(), "wrote parquet");
    Ok(())
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::InvalidInput(format!("missing column {name}")))
}

fn string_column(batch: &RecordBatch, name: &str) -> Result<StringArray> {
    let array = column(batch, name)?;
    if !matches!(
        array.data_type(),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    ) {
        return Err(Error::InvalidInput(format!(
            "column {name} must be a string column, found {}",
            array.data_type()
        )));
    }
    let utf8 = cast(array, &DataType::Utf8)?;
    Ok(utf8.as_string::<i32>().clone())
}

fn integer_column(batch: &RecordBatch, name: &str) -> Result<Int64Array> {
    let array = column(batch, name)?;
    if !array.data_type().is_integer() {
        return Err(Error::InvalidInput(format!(
            "column {name} must be an integer column, found {}",
            array.data_type()
        )));
    }
    let widened = cast(array, &DataType::Int64)?;
    Ok(widened.as_primitive::<Int64Type>().clone())
}

fn count(values: &Int64Array, row: usize, name: &str, player_id: &str) -> Result<u32> {
    if values.is_null(row) {
        return Err(Error::InvalidInput(format!(
            "null {name} for player {player_id}"
        )));
    }
    let v = values.value(row);
    if v < 0 {
        return Err(Error::InvalidInput(format!(
            "negative {name} ({v}) for player {player_id}"
        )));
    }
    u32::try_from(v)
        .map_err(|_| Error::InvalidInput(format!("{name} ({v}) out of range for player {player_id}")))
}

fn season_rows(batch: &RecordBatch, out: &mut Vec<PlayerSeasonRecord>) -> Result<()> {
    let ids = string_column(batch, PLAYER_ID)?;
    let years = integer_column(batch, YEAR_ID)?;
    let earned_runs = integer_column(batch, EARNED_RUNS)?;
    let outs = integer_column(batch, OUTS)?;

    for row in 0..batch.num_rows() {
        if ids.is_null(row) {
            return Err(Error::InvalidInput(format!("null {PLAYER_ID} at row {row}")));
        }
        let player_id = ids.value(row);
        if years.is_null(row) {
            return Err(Error::InvalidInput(format!(
                "null {YEAR_ID} for player {player_id}"
            )));
        }
        let year = i32::try_from(years.value(row)).map_err(|_| {
            Error::InvalidInput(format!(
                "{YEAR_ID} ({}) out of range for player {player_id}",
                years.value(row)
            ))
        })?;
        out.push(PlayerSeasonRecord::new(
            player_id,
            year,
            count(&earned_runs, row, EARNED_RUNS, player_id)?,
            count(&outs, row, OUTS, player_id)?,
        ));
    }
    Ok(())
}

fn identity_rows(batch: &RecordBatch, out: &mut Vec<PlayerIdentity>) -> Result<()> {
    let ids = string_column(batch, PLAYER_ID)?;
    let first = string_column(batch, NAME_FIRST)?;
    let last = string_column(batch, NAME_LAST)?;
    fn name(names: &StringArray, row: usize) -> &str {
        if names.is_null(row) {
            ""
        } else {
            names.value(row)
        }
    }

    for row in 0..batch.num_rows() {
        if ids.is_null(row) {
            return Err(Error::InvalidInput(format!("null {PLAYER_ID} at row {row}")));
        }
        out.push(PlayerIdentity::new(
            ids.value(row),
            name(&first, row),
            name(&last, row),
        ));
    }
    Ok(())
}

fn append_checked(batches: &mut Vec<RecordBatch>, batch: RecordBatch) -> Result<()> {
    if let Some(existing) = batches.first() {
        let existing_schema = existing.schema();
        if batch.schema() != existing_schema {
            return Err(Error::StorageError(format!(
                "Schema mismatch: expected {:?}, got {:?}",
                existing_schema,
                batch.schema()
            )));
        }
    }
    batches.push(batch);
    Ok(())
}

/// Storage engine for pitching (and optional people) Arrow batches
#[derive(Debug, Clone, Default)]
pub struct StorageEngine {
    batches: Vec<RecordBatch>,
    people: Vec<RecordBatch>,
}

impl StorageEngine {
    /// Create a new storage engine from existing pitching batches
    ///
    /// Useful for testing and benchmarking
    #[must_use]
    pub fn new(batches: Vec<RecordBatch>) -> Self {
        Self {
            batches,
            people: Vec::new(),
        }
    }

    /// Storage over typed season rows.
    ///
    /// # Errors
    /// Arrow construction failure.
    pub fn from_records(records: &[PlayerSeasonRecord]) -> Result<Self> {
        Ok(Self::new(vec![pitching_batch(records)?]))
    }

    /// Load pitching rows from a Parquet file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        let batches = read_parquet(path)?;
        let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
        info!(rows, batches = batches.len(), "loaded pitching rows");
        Ok(Self::new(batches))
    }

    /// Attach a people table from a Parquet file.
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load_people_parquet<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        for batch in read_parquet(path)? {
            self.append_people_batch(batch)?;
        }
        Ok(())
    }

    /// Pitching batches
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total pitching rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Append a pitching batch.
    ///
    /// # Errors
    ///
    /// Returns error if batch schema doesn't match existing batches
    pub fn append_batch(&mut self, batch: RecordBatch) -> Result<()> {
        append_checked(&mut self.batches, batch)
    }

    /// Append a people batch.
    ///
    /// # Errors
    ///
    /// Returns error if batch schema doesn't match existing people batches
    pub fn append_people_batch(&mut self, batch: RecordBatch) -> Result<()> {
        append_checked(&mut self.people, batch)
    }

    /// Typed season rows from every pitching batch.
    ///
    /// # Errors
    /// `InvalidInput` on a missing or mistyped column, a null field or a
    /// negative count.
    pub fn season_records(&self) -> Result<Vec<PlayerSeasonRecord>> {
        let mut records = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            season_rows(batch, &mut records)?;
        }
        Ok(records)
    }

    /// Player identities from the people batches (empty without a people table).
    ///
    /// # Errors
    /// `InvalidInput` on a missing column or a null id.
    pub fn identities(&self) -> Result<Vec<PlayerIdentity>> {
        let mut people = Vec::new();
        for batch in &self.people {
            identity_rows(batch, &mut people)?;
        }
        Ok(people)
    }
}
