//! Top-K selection for ranked result tables
//!
//! **Problem**: ranking a few extreme players with a full sort is O(N log N).
//!
//! **Solution**: bounded binary heap, O(N log K) time and O(K) space, over
//! either typed slices (via a key function) or Arrow `RecordBatch` columns.
//! Ties keep input order, so rankings are deterministic.

use crate::Error;
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, RecordBatch};
use arrow::datatypes::DataType;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Sort order for Top-K selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order (smallest K values)
    Ascending,
    /// Descending order (largest K values)
    Descending,
}

/// Heap entry ranked so the *worst* kept candidate sits on top.
#[derive(Debug)]
struct HeapItem<V> {
    value: V,
    index: usize,
    order: SortOrder,
}

impl<V: PartialOrd> HeapItem<V> {
    /// `Less` when `self` ranks ahead of `other`.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        let by_value = self
            .value
            .partial_cmp(&other.value)
            .unwrap_or(Ordering::Equal);
        let by_value = match self.order {
            SortOrder::Descending => by_value.reverse(),
            SortOrder::Ascending => by_value,
        };
        by_value.then(self.index.cmp(&other.index))
    }
}

impl<V: PartialOrd> PartialEq for HeapItem<V> {
    fn eq(&self, other: &Self) -> bool {
        self.rank_cmp(other) == Ordering::Equal
    }
}

impl<V: PartialOrd> Eq for HeapItem<V> {}

impl<V: PartialOrd> Ord for HeapItem<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        // max-heap on rank: the lowest-ranked kept item is on top
        self.rank_cmp(other)
    }
}

impl<V: PartialOrd> PartialOrd for HeapItem<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Indices of the top `k` values, best first.
///
/// NaN values are skipped.
pub fn select_top_k<V, I>(values: I, k: usize, order: SortOrder) -> Vec<usize>
where
    V: PartialOrd + Copy,
    I: IntoIterator<Item = (usize, V)>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<HeapItem<V>> = BinaryHeap::with_capacity(k);

    for (index, value) in values {
        // NaN is not comparable with itself
        if value.partial_cmp(&value).is_none() {
            continue;
        }
        let item = HeapItem { value, index, order };
        if heap.len() < k {
            heap.push(item);
        } else if let Some(worst) = heap.peek() {
            if item.rank_cmp(worst) == Ordering::Less {
                heap.pop();
                heap.push(item);
            }
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|item| item.index)
        .collect()
}

/// Top `k` items of a slice by `key`, best first.
pub fn top_k_by<T, F>(items: &[T], k: usize, order: SortOrder, key: F) -> Vec<&T>
where
    F: Fn(&T) -> f64,
{
    select_top_k(items.iter().map(&key).enumerate(), k, order)
        .into_iter()
        .map(|i| &items[i])
        .collect()
}

/// Trait for Top-K selection on record batches
pub trait TopKSelection {
    /// Select top K rows by a numeric column
    ///
    /// # Errors
    /// Returns error if:
    /// - K is zero
    /// - Column index is out of bounds
    /// - Column is not Int64 or Float64
    ///
    /// # Examples
    ///
    /// ```rust
    /// use era_shrinkage::topk::{TopKSelection, SortOrder};
    /// use arrow::array::{Float64Array, RecordBatch};
    /// use arrow::datatypes::{DataType, Field, Schema};
    /// use std::sync::Arc;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let schema = Arc::new(Schema::new(vec![
    ///     Field::new("se_diff", DataType::Float64, false),
    /// ]));
    /// let batch = RecordBatch::try_new(
    ///     schema,
    ///     vec![Arc::new(Float64Array::from(vec![1.0, 5.0, 3.0, 9.0, 2.0]))],
    /// )?;
    ///
    /// let top3 = batch.top_k(0, 3, SortOrder::Descending)?;
    /// assert_eq!(top3.num_rows(), 3);
    /// # Ok(())
    /// # }
    /// ```
    fn top_k(&self, column_index: usize, k: usize, order: SortOrder) -> crate::Result<RecordBatch>;
}

impl TopKSelection for RecordBatch {
    fn top_k(&self, column_index: usize, k: usize, order: SortOrder) -> crate::Result<RecordBatch> {
        if k == 0 {
            return Err(Error::InvalidInput("k must be greater than 0".to_string()));
        }

        if column_index >= self.num_columns() {
            return Err(Error::InvalidInput(format!(
                "Column index {} out of bounds (batch has {} columns)",
                column_index,
                self.num_columns()
            )));
        }

        let column = self.column(column_index);
        let indices = select_column_indices(column, k, order)?;
        take_rows(self, &indices)
    }
}

fn select_column_indices(column: &ArrayRef, k: usize, order: SortOrder) -> crate::Result<Vec<usize>> {
    match column.data_type() {
        DataType::Int64 => {
            let array = column
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| Error::Other("Failed to downcast Int64 column".to_string()))?;
            Ok(select_top_k(
                (0..array.len())
                    .filter(|&i| !array.is_null(i))
                    .map(|i| (i, array.value(i))),
                k,
                order,
            ))
        }
        DataType::Float64 => {
            let array = column
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| Error::Other("Failed to downcast Float64 column".to_string()))?;
            Ok(select_top_k(
                (0..array.len())
                    .filter(|&i| !array.is_null(i))
                    .map(|i| (i, array.value(i))),
                k,
                order,
            ))
        }
        dt => Err(Error::InvalidInput(format!(
            "Top-K not supported for data type: {dt:?}"
        ))),
    }
}

/// Gather rows by index into a new batch with the same schema.
fn take_rows(batch: &RecordBatch, indices: &[usize]) -> crate::Result<RecordBatch> {
    let indices = arrow::array::UInt64Array::from(
        indices.iter().map(|&i| i as u64).collect::<Vec<u64>>(),
    );
    let columns = batch
        .columns()
        .iter()
        .map(|c| arrow::compute::take(c.as_ref(), &indices, None))
        .collect::<Result<Vec<ArrayRef>, _>>()?;
    RecordBatch::try_new(batch.schema(), columns)
        .map_err(|e| Error::StorageError(format!("Failed to create result batch: {e}")))
}
