//! Integration test for Parquet ingestion and result export
//!
//! 1. Write pitching and people tables to Parquet
//! 2. Load them through `StorageEngine`
//! 3. Run the pipeline and compare against the in-memory run
//! 4. Export result tables and read them back

mod common;

use arrow::array::{Int32Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use era_shrinkage::storage::{self, people_batch, pitching_batch, StorageEngine};
use era_shrinkage::table::{evaluations_to_batch, posteriors_to_batch, EVALUATION_SE_DIFF_COLUMN};
use era_shrinkage::topk::{SortOrder, TopKSelection};
use era_shrinkage::{Pipeline, Roster};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("era_shrinkage_{}_{name}", std::process::id()))
}

#[test]
fn test_parquet_round_trip_matches_in_memory_run() {
    let rows = common::synthetic_seasons(250, 99);
    let people = common::synthetic_people(250);

    let pitching_file = temp_path("pitching.parquet");
    let people_file = temp_path("people.parquet");

    // two row groups to exercise multi-batch reads
    let batch = pitching_batch(&rows).unwrap();
    let props = WriterProperties::builder()
        .set_max_row_group_size(500)
        .build();
    let mut writer =
        ArrowWriter::try_new(File::create(&pitching_file).unwrap(), batch.schema(), Some(props))
            .unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    storage::write_parquet(&people_file, &[people_batch(&people).unwrap()]).unwrap();

    let mut engine = StorageEngine::load_parquet(&pitching_file).unwrap();
    engine.load_people_parquet(&people_file).unwrap();
    assert_eq!(engine.num_rows(), rows.len());
    assert_eq!(engine.season_records().unwrap(), rows);

    let roster = Roster::from_identities(engine.identities().unwrap());
    assert_eq!(roster.len(), 250);
    assert_eq!(roster.display_name("syn0007"), "Pitcher No7");

    let pipeline = Pipeline::default();
    let from_parquet = pipeline.run_storage(&engine).unwrap();
    let in_memory = pipeline.run(&rows).unwrap();
    assert_eq!(from_parquet, in_memory);

    std::fs::remove_file(&pitching_file).ok();
    std::fs::remove_file(&people_file).ok();
}

#[test]
fn test_result_tables_export_and_rank() {
    let rows = common::synthetic_seasons(120, 5);
    let output = Pipeline::default().run(&rows).unwrap();
    let roster = Roster::default();

    let posteriors = posteriors_to_batch(&output.posteriors, &roster).unwrap();
    let evaluation = evaluations_to_batch(output.evaluation.records(), &roster).unwrap();
    assert_eq!(posteriors.num_rows(), output.posteriors.len());

    let out_file = temp_path("evaluation.parquet");
    storage::write_parquet(&out_file, &[evaluation.clone()]).unwrap();
    let back = storage::read_parquet(&out_file).unwrap();
    let total: usize = back.iter().map(RecordBatch::num_rows).sum();
    assert_eq!(total, output.evaluation.len());
    std::fs::remove_file(&out_file).ok();

    // batch ranking agrees with typed ranking
    let top = evaluation
        .top_k(EVALUATION_SE_DIFF_COLUMN, 5, SortOrder::Descending)
        .unwrap();
    let ids = top.column(0).as_any().downcast_ref::<StringArray>().unwrap();
    let typed = output.evaluation.ranked(5, SortOrder::Descending);
    for (i, record) in typed.iter().enumerate() {
        assert_eq!(ids.value(i), record.player_id);
    }
}

#[test]
fn test_parquet_with_null_counts_is_rejected() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("playerID", DataType::Utf8, false),
        Field::new("yearID", DataType::Int32, false),
        Field::new("ER", DataType::Int32, true),
        Field::new("IPouts", DataType::Int32, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["a", "b"])),
            Arc::new(Int32Array::from(vec![1950, 1950])),
            Arc::new(Int32Array::from(vec![Some(3), Some(4)])),
            Arc::new(Int32Array::from(vec![Some(30), None])),
        ],
    )
    .unwrap();

    let path = temp_path("nulls.parquet");
    storage::write_parquet(&path, &[batch]).unwrap();
    let engine = StorageEngine::load_parquet(&path).unwrap();
    let err = Pipeline::default().run_storage(&engine).unwrap_err();
    assert!(err.is_data_error());
    assert!(err.to_string().contains("null IPouts for player b"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_missing_parquet_file() {
    let result = StorageEngine::load_parquet("/nonexistent/pitching.parquet");
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to open Parquet file"));
}
