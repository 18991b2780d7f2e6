// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
//! Grouped aggregation over rows or arrow chunks.
//!
//! Responsibilities:
//! - Keeps one accumulator state per aggregate call for every distinct group key.
//! - Combines partial aggregators of the same node for partitioned execution.
//! - Finalizes groups into result rows or an arrow `RecordBatch`.
//!
//! An aggregator is owned by a single partition and mutated sequentially; the
//! surrounding executor combines partitions only through [`GroupedAggregator::merge`].

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, RecordBatch, RecordBatchOptions};
use arrow::datatypes::{Field, Schema, SchemaRef};
use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::common::config;
use crate::common::types::ColumnType;
use crate::exec::expr::agg::{
    self, AggInputView, AggKernelSet, AggScalarValue, AggState, error::AggError,
};
use crate::exec::node::aggregate::{AggFunction, AggregateNode, GroupByColumn};

/// Grouping-column values of one row, compared by value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GroupKey(pub Vec<Option<AggScalarValue>>);

impl GroupKey {
    /// Key of the single implicit group of an ungrouped aggregation.
    pub fn empty() -> Self {
        GroupKey(Vec::new())
    }
}

impl From<Vec<Option<AggScalarValue>>> for GroupKey {
    fn from(values: Vec<Option<AggScalarValue>>) -> Self {
        GroupKey(values)
    }
}

/// One finalized output row: group-by values followed by aggregate results.
pub type AggRow = Vec<Option<AggScalarValue>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregatePhase {
    Idle,
    Accumulating,
    Finalized,
}

fn build_agg_views<'a>(
    kernels: &'a AggKernelSet,
    functions: &[AggFunction],
    arrays: &'a [ArrayRef],
) -> Result<Vec<AggInputView<'a>>, String> {
    if arrays.len() != kernels.len() || arrays.len() != functions.len() {
        return Err("aggregate arrays length mismatch".to_string());
    }
    let mut views = Vec::with_capacity(kernels.len());
    for (idx, kernel) in kernels.entries.iter().enumerate() {
        let view = if functions[idx].input_is_intermediate {
            kernel.build_merge_view(&arrays[idx])?
        } else {
            kernel.build_input_view(&arrays[idx])?
        };
        views.push(view);
    }
    Ok(views)
}

fn chunk_column(chunk: &RecordBatch, index: usize) -> Result<ArrayRef, String> {
    if index >= chunk.num_columns() {
        return Err(format!(
            "aggregate input column {} out of bounds (columns={})",
            index,
            chunk.num_columns()
        ));
    }
    Ok(chunk.column(index).clone())
}

/// Keyed aggregation table driven by a row or chunk stream.
pub struct GroupedAggregator {
    name: String,
    group_by: Vec<GroupByColumn>,
    functions: Vec<AggFunction>,
    kernels: AggKernelSet,
    group_index: HashMap<GroupKey, usize>,
    group_keys: Vec<GroupKey>,
    group_states: Vec<Vec<AggState>>,
    phase: AggregatePhase,
}

impl GroupedAggregator {
    /// Classifies every aggregate call of `node`; unsupported calls fail here.
    pub fn new(node: &AggregateNode) -> Result<Self, AggError> {
        let name = if node.node_id >= 0 {
            format!("AGGREGATE (id={})", node.node_id)
        } else {
            "AGGREGATE".to_string()
        };
        for column in &node.group_by {
            column.column_type.validate().map_err(AggError::Internal)?;
        }
        let kernels = agg::build_kernel_set(&node.functions)?;
        let capacity = if node.is_grouped() {
            config::group_table_initial_capacity()
        } else {
            1
        };
        debug!(
            "{}: {} group-by columns, {} aggregate functions",
            name,
            node.group_by.len(),
            kernels.len()
        );
        Ok(Self {
            name,
            group_by: node.group_by.clone(),
            functions: node.functions.clone(),
            kernels,
            group_index: HashMap::with_capacity(capacity),
            group_keys: Vec::new(),
            group_states: Vec::new(),
            phase: AggregatePhase::Idle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> AggregatePhase {
        self.phase
    }

    pub fn num_groups(&self) -> usize {
        self.group_keys.len()
    }

    pub fn kernels(&self) -> &AggKernelSet {
        &self.kernels
    }

    /// Output column types: group-by columns, then one per aggregate call.
    pub fn output_types(&self) -> Vec<ColumnType> {
        self.group_by
            .iter()
            .map(|g| g.column_type.clone())
            .chain(self.kernels.entries.iter().map(|e| e.output_type().clone()))
            .collect()
    }

    pub fn output_schema(&self) -> SchemaRef {
        let fields = self
            .group_by
            .iter()
            .map(|g| Field::new(g.output_name(), g.column_type.to_arrow_type(), true))
            .chain(
                self.functions
                    .iter()
                    .zip(self.kernels.entries.iter())
                    .map(|(f, e)| Field::new(f.output_name(), e.output_type().to_arrow_type(), true)),
            )
            .collect::<Vec<_>>();
        Arc::new(Schema::new(fields))
    }

    fn check_open(&self, op: &str) -> Result<(), AggError> {
        if self.phase == AggregatePhase::Finalized {
            return Err(AggError::Internal(format!(
                "{}: {} after finalize",
                self.name, op
            )));
        }
        Ok(())
    }

    fn begin_accumulate(&mut self, op: &str) -> Result<(), AggError> {
        self.check_open(op)?;
        self.phase = AggregatePhase::Accumulating;
        Ok(())
    }

    fn find_or_insert_group(&mut self, key: &GroupKey) -> usize {
        if let Some(idx) = self.group_index.get(key) {
            return *idx;
        }
        let idx = self.group_keys.len();
        self.group_index.insert(key.clone(), idx);
        self.group_keys.push(key.clone());
        self.group_states.push(self.kernels.init_states());
        idx
    }

    fn absorb(&mut self, group: usize, values: &[Option<AggScalarValue>]) -> Result<(), AggError> {
        let states = &mut self.group_states[group];
        for (idx, entry) in self.kernels.entries.iter().enumerate() {
            let value = values[idx].as_ref();
            if self.functions[idx].input_is_intermediate {
                entry.merge_value(&mut states[idx], value)?;
            } else {
                entry.update(&mut states[idx], value)?;
            }
        }
        Ok(())
    }

    /// Shape- and type-check one row, coercing keys and values to their
    /// declared types. Nothing is mutated, so a rejected row leaves no trace.
    fn prepare_row(
        &self,
        key: &GroupKey,
        values: &[Option<AggScalarValue>],
    ) -> Result<(GroupKey, Vec<Option<AggScalarValue>>), AggError> {
        if key.0.len() != self.group_by.len() {
            return Err(AggError::Internal(format!(
                "{}: group key has {} values, expected {}",
                self.name,
                key.0.len(),
                self.group_by.len()
            )));
        }
        if values.len() != self.kernels.len() {
            return Err(AggError::Internal(format!(
                "{}: row has {} aggregate values, expected {}",
                self.name,
                values.len(),
                self.kernels.len()
            )));
        }
        let key = self
            .group_by
            .iter()
            .zip(key.0.iter())
            .map(|(column, value)| {
                value
                    .as_ref()
                    .map(|v| agg::normalize_agg_scalar(&column.column_type, v))
                    .transpose()
                    .map_err(|e| {
                        AggError::Internal(format!(
                            "{}: group-by column {}: {}",
                            self.name, column.input, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let values = self
            .kernels
            .entries
            .iter()
            .zip(self.functions.iter())
            .zip(values.iter())
            .map(|((entry, func), value)| {
                entry.normalize_value(value.as_ref(), func.input_is_intermediate)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((GroupKey(key), values))
    }

    /// Apply rows that already passed [`Self::prepare_row`].
    fn absorb_prepared(
        &mut self,
        rows: Vec<(GroupKey, Vec<Option<AggScalarValue>>)>,
    ) -> Result<(), AggError> {
        for (key, values) in rows {
            let group = self.find_or_insert_group(&key);
            self.absorb(group, &values)?;
        }
        Ok(())
    }

    /// Feed one row given as its group key and one value per aggregate call.
    pub fn update_row(
        &mut self,
        key: &GroupKey,
        values: &[Option<AggScalarValue>],
    ) -> Result<(), AggError> {
        self.check_open("update")?;
        let row = self.prepare_row(key, values)?;
        self.begin_accumulate("update")?;
        self.absorb_prepared(vec![row])
    }

    /// Feed a batch of rows; if any row is rejected none of them is applied.
    pub fn update_rows<I>(&mut self, rows: I) -> Result<(), AggError>
    where
        I: IntoIterator<Item = (GroupKey, Vec<Option<AggScalarValue>>)>,
    {
        self.check_open("update")?;
        let prepared = rows
            .into_iter()
            .map(|(key, values)| self.prepare_row(&key, &values))
            .collect::<Result<Vec<_>, _>>()?;
        self.begin_accumulate("update")?;
        self.absorb_prepared(prepared)
    }

    /// Feed a full input row; group-by and argument columns are picked by index.
    pub fn update_input_row(&mut self, row: &[Option<AggScalarValue>]) -> Result<(), AggError> {
        let pick = |index: usize| {
            row.get(index).cloned().ok_or_else(|| {
                AggError::Internal(format!(
                    "input row has {} columns, column {} requested",
                    row.len(),
                    index
                ))
            })
        };
        let key = self
            .group_by
            .iter()
            .map(|g| pick(g.input))
            .collect::<Result<Vec<_>, _>>()?;
        let values = self
            .functions
            .iter()
            .map(|f| pick(f.input))
            .collect::<Result<Vec<_>, _>>()?;
        self.update_row(&GroupKey(key), &values)
    }

    /// Feed an arrow chunk; if any row is rejected none of them is applied.
    pub fn update_chunk(&mut self, chunk: &RecordBatch) -> Result<(), AggError> {
        self.check_open("update")?;
        trace!("{}: update chunk rows={}", self.name, chunk.num_rows());

        let key_arrays = self
            .group_by
            .iter()
            .map(|g| {
                let array = chunk_column(chunk, g.input)?;
                if !agg::is_compatible_input_type(&g.column_type, array.data_type()) {
                    return Err(format!(
                        "group-by column {} type mismatch: expected {}, got {:?}",
                        g.input,
                        g.column_type,
                        array.data_type()
                    ));
                }
                Ok(array)
            })
            .collect::<Result<Vec<_>, String>>()
            .map_err(AggError::Internal)?;
        let arg_arrays = self
            .functions
            .iter()
            .map(|f| chunk_column(chunk, f.input))
            .collect::<Result<Vec<_>, String>>()
            .map_err(AggError::Internal)?;

        // Collect per-row inputs first; views borrow the kernel set.
        let mut rows = Vec::with_capacity(chunk.num_rows());
        {
            let views = build_agg_views(&self.kernels, &self.functions, &arg_arrays)
                .map_err(AggError::Internal)?;
            for row in 0..chunk.num_rows() {
                let key = key_arrays
                    .iter()
                    .map(|array| agg::agg_scalar_from_array(array, row))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(AggError::Internal)?;
                let values = views
                    .iter()
                    .map(|view| view.value_at(row))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(AggError::Internal)?;
                rows.push(self.prepare_row(&GroupKey(key), &values)?);
            }
        }
        self.begin_accumulate("update")?;
        self.absorb_prepared(rows)
    }

    /// Fold another partial aggregator of the same node into this one.
    pub fn merge(&mut self, other: GroupedAggregator) -> Result<(), AggError> {
        if other.phase == AggregatePhase::Finalized {
            return Err(AggError::Internal(format!(
                "{}: cannot merge a finalized partial",
                self.name
            )));
        }
        if self.kernels.entries != other.kernels.entries
            || self.output_types() != other.output_types()
        {
            return Err(AggError::Internal(format!(
                "{}: cannot merge partial of a different aggregation ({})",
                self.name, other.name
            )));
        }
        self.begin_accumulate("merge")?;
        trace!(
            "{}: merging {} partial groups into {}",
            self.name,
            other.group_keys.len(),
            self.group_keys.len()
        );
        for (key, states) in other.group_keys.into_iter().zip(other.group_states) {
            let group = self.find_or_insert_group(&key);
            let target = &mut self.group_states[group];
            for (idx, entry) in self.kernels.entries.iter().enumerate() {
                entry.merge(&mut target[idx], &states[idx])?;
            }
        }
        Ok(())
    }

    fn take_groups(&mut self) -> Result<Vec<(GroupKey, Vec<AggState>)>, AggError> {
        if self.phase == AggregatePhase::Finalized {
            return Err(AggError::Internal(format!(
                "{}: already finalized",
                self.name
            )));
        }
        self.phase = AggregatePhase::Finalized;
        self.group_index.clear();
        let keys = std::mem::take(&mut self.group_keys);
        let states = std::mem::take(&mut self.group_states);
        let mut groups = keys.into_iter().zip(states).collect::<Vec<_>>();
        // An ungrouped aggregation always yields exactly one row.
        if groups.is_empty() && self.group_by.is_empty() {
            groups.push((GroupKey::empty(), self.kernels.init_states()));
        }
        debug!("{}: finalizing {} groups", self.name, groups.len());
        Ok(groups)
    }

    /// Finalize all groups into rows, in first-seen group order.
    pub fn finish(&mut self) -> Result<Vec<AggRow>, AggError> {
        let groups = self.take_groups()?;
        let mut rows = Vec::with_capacity(groups.len());
        for (key, states) in groups {
            let mut row = key.0;
            for (entry, state) in self.kernels.entries.iter().zip(states.iter()) {
                row.push(entry.finalize(state)?);
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Finalize all groups into one arrow chunk shaped by [`Self::output_schema`].
    pub fn finish_chunk(&mut self) -> Result<RecordBatch, AggError> {
        let schema = self.output_schema();
        let groups = self.take_groups()?;
        let num_rows = groups.len();

        let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
        for (idx, column) in self.group_by.iter().enumerate() {
            let values = groups.iter().map(|(key, _)| key.0[idx].clone()).collect();
            columns.push(
                agg::build_agg_scalar_array(&column.column_type, values)
                    .map_err(AggError::Internal)?,
            );
        }
        for (idx, entry) in self.kernels.entries.iter().enumerate() {
            let states = groups.iter().map(|(_, s)| &s[idx]).collect::<Vec<_>>();
            columns.push(entry.build_array(&states)?);
        }

        let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
        RecordBatch::try_new_with_options(schema, columns, &options)
            .map_err(|e| AggError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::IntegerWidth;
    use crate::exec::node::aggregate::GroupByColumn;

    fn int(v: i64) -> Option<AggScalarValue> {
        Some(AggScalarValue::Int64(v))
    }

    fn text(v: &str) -> Option<AggScalarValue> {
        Some(AggScalarValue::Utf8(v.to_string()))
    }

    fn grouped_sum() -> AggregateNode {
        AggregateNode::new(1)
            .group_by(GroupByColumn::new(0, ColumnType::String))
            .function(AggFunction::new("sum", 1, ColumnType::int()))
    }

    #[test]
    fn test_ungrouped_empty_input_yields_one_null_row() {
        let node = AggregateNode::new(0)
            .function(AggFunction::new("sum", 0, ColumnType::int()))
            .function(AggFunction::new("max", 0, ColumnType::int()));
        let mut agg = GroupedAggregator::new(&node).unwrap();
        assert_eq!(agg.finish().unwrap(), vec![vec![None, None]]);
    }

    #[test]
    fn test_grouped_empty_input_yields_no_rows() {
        let mut agg = GroupedAggregator::new(&grouped_sum()).unwrap();
        let batch = agg.finish_chunk().unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
    }

    #[test]
    fn test_update_after_finish_is_rejected() {
        let mut agg = GroupedAggregator::new(&grouped_sum()).unwrap();
        agg.update_input_row(&[text("a"), int(1)]).unwrap();
        assert_eq!(agg.finish().unwrap(), vec![vec![text("a"), int(1)]]);
        assert_eq!(agg.phase(), AggregatePhase::Finalized);
        assert!(agg.update_input_row(&[text("a"), int(1)]).is_err());
        assert!(agg.finish().is_err());
    }

    #[test]
    fn test_null_is_its_own_group() {
        let mut agg = GroupedAggregator::new(&grouped_sum()).unwrap();
        agg.update_input_row(&[None, int(1)]).unwrap();
        agg.update_input_row(&[text("x"), int(2)]).unwrap();
        agg.update_input_row(&[None, int(3)]).unwrap();
        assert_eq!(
            agg.finish().unwrap(),
            vec![vec![None, int(4)], vec![text("x"), int(2)]]
        );
    }

    #[test]
    fn test_row_shape_is_checked() {
        let mut agg = GroupedAggregator::new(&grouped_sum()).unwrap();
        assert!(agg.update_row(&GroupKey::empty(), &[int(1)]).is_err());
        assert!(agg.update_input_row(&[text("a")]).is_err());
    }

    #[test]
    fn test_merge_rejects_other_node_shape() {
        let mut left = GroupedAggregator::new(&grouped_sum()).unwrap();
        let node = AggregateNode::new(2)
            .group_by(GroupByColumn::new(0, ColumnType::String))
            .function(AggFunction::new("min", 1, ColumnType::int()));
        let right = GroupedAggregator::new(&node).unwrap();
        assert!(left.merge(right).is_err());
    }

    fn sum_and_min() -> AggregateNode {
        AggregateNode::new(4)
            .function(AggFunction::new("sum", 0, ColumnType::int()))
            .function(AggFunction::new("min", 1, ColumnType::int()))
    }

    #[test]
    fn test_rejected_row_leaves_no_partial_update() {
        let mut agg = GroupedAggregator::new(&sum_and_min()).unwrap();
        agg.update_input_row(&[int(1), int(9)]).unwrap();
        // sum accepts 5 but min cannot take a string: neither may change
        assert!(agg.update_input_row(&[int(5), text("oops")]).is_err());
        assert_eq!(agg.finish().unwrap(), vec![vec![int(1), int(9)]]);
    }

    #[test]
    fn test_rejected_row_does_not_create_group() {
        let mut agg = GroupedAggregator::new(&grouped_sum()).unwrap();
        assert!(agg.update_input_row(&[text("a"), text("x")]).is_err());
        assert_eq!(agg.num_groups(), 0);
        assert_eq!(agg.phase(), AggregatePhase::Idle);
    }

    #[test]
    fn test_update_rows_is_all_or_nothing() {
        let mut agg = GroupedAggregator::new(&grouped_sum()).unwrap();
        let rows = vec![
            (GroupKey(vec![text("a")]), vec![int(1)]),
            (GroupKey(vec![text("b")]), vec![int(i64::from(i32::MAX) + 1)]),
        ];
        assert!(agg.update_rows(rows).is_err());
        assert_eq!(agg.num_groups(), 0);
        agg.update_rows(vec![(GroupKey(vec![text("a")]), vec![int(2)])])
            .unwrap();
        assert_eq!(agg.finish().unwrap(), vec![vec![text("a"), int(2)]]);
    }

    #[test]
    fn test_rejected_chunk_is_not_applied() {
        use arrow::array::{Int32Array, StringArray};
        use arrow::datatypes::DataType;

        let node = AggregateNode::new(5)
            .group_by(GroupByColumn::new(0, ColumnType::String))
            .function(AggFunction::new("sum", 1, ColumnType::int()))
            .function(AggFunction::new("min", 2, ColumnType::int()));
        let mut agg = GroupedAggregator::new(&node).unwrap();
        let chunk = |third: ArrayRef| {
            let schema = Arc::new(Schema::new(vec![
                Field::new("k", DataType::Utf8, true),
                Field::new("s", DataType::Int32, true),
                Field::new("m", third.data_type().clone(), true),
            ]));
            RecordBatch::try_new(
                schema,
                vec![
                    Arc::new(StringArray::from(vec!["a", "b"])),
                    Arc::new(Int32Array::from(vec![1, 2])),
                    third,
                ],
            )
            .unwrap()
        };
        let bad = chunk(Arc::new(StringArray::from(vec!["3", "4"])));
        assert!(agg.update_chunk(&bad).is_err());
        assert_eq!(agg.num_groups(), 0);

        let good = chunk(Arc::new(Int32Array::from(vec![3, 4])));
        agg.update_chunk(&good).unwrap();
        assert_eq!(
            agg.finish().unwrap(),
            vec![vec![text("a"), int(1), int(3)], vec![text("b"), int(2), int(4)]]
        );
    }

    #[test]
    fn test_group_key_type_is_checked() {
        let mut agg = GroupedAggregator::new(&grouped_sum()).unwrap();
        let err = agg
            .update_row(&GroupKey(vec![int(1)]), &[int(1)])
            .unwrap_err();
        assert!(err.message().contains("group-by column 0"), "{}", err.message());
        assert_eq!(agg.num_groups(), 0);

        let node = AggregateNode::new(6)
            .group_by(GroupByColumn::new(0, ColumnType::Integer(IntegerWidth::SmallInt)))
            .function(AggFunction::new("max", 1, ColumnType::int()));
        let mut agg = GroupedAggregator::new(&node).unwrap();
        assert!(agg.update_input_row(&[int(70_000), int(1)]).is_err());
        agg.update_input_row(&[int(7), int(1)]).unwrap();
        assert_eq!(agg.finish().unwrap(), vec![vec![int(7), int(1)]]);
    }
}
