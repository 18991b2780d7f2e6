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
use arrow::array::ArrayRef;
use tracing::debug;

use crate::common::types::ColumnType;
use crate::exec::node::aggregate::AggFunction;

use super::error::AggError;
use super::functions;
use super::functions::common::{AggScalarValue, build_scalar_array, normalize_scalar};
use super::*;

/// A classified aggregate call bound to its function family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggKernelEntry {
    pub(super) name: String,
    pub(super) spec: AggSpec,
}

#[derive(Clone, Debug, Default)]
pub struct AggKernelSet {
    pub entries: Vec<AggKernelEntry>,
}

impl AggKernelSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn init_states(&self) -> Vec<AggState> {
        self.entries.iter().map(|e| e.init_state()).collect()
    }
}

/// Plan-time registration of one aggregate expression.
pub fn register(function: &str, input_type: &ColumnType) -> Result<AggKernelEntry, AggError> {
    build_kernel_entry(&AggFunction::new(function, 0, input_type.clone()))
}

pub(crate) fn build_kernel_entry(func: &AggFunction) -> Result<AggKernelEntry, AggError> {
    let spec = build_spec_from_type(func)?;
    Ok(AggKernelEntry {
        name: functions::canonical_agg_name(&func.name),
        spec,
    })
}

pub fn build_kernel_set(functions: &[AggFunction]) -> Result<AggKernelSet, AggError> {
    let entries = functions
        .iter()
        .map(build_kernel_entry)
        .collect::<Result<Vec<_>, _>>()?;
    debug!("built aggregate kernel set with {} entries", entries.len());
    Ok(AggKernelSet { entries })
}

impl AggKernelEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &AggSpec {
        &self.spec
    }

    pub fn output_type(&self) -> &ColumnType {
        &self.spec.output_type
    }

    pub fn init_state(&self) -> AggState {
        functions::init_state(&self.spec)
    }

    pub fn build_input_view<'a>(&'a self, array: &'a ArrayRef) -> Result<AggInputView<'a>, String> {
        AggInputView::new(array, &self.spec.input_type)
    }

    pub fn build_merge_view<'a>(&'a self, array: &'a ArrayRef) -> Result<AggInputView<'a>, String> {
        AggInputView::new(array, &self.spec.intermediate_type)
    }

    /// Check one value against the type this call consumes, raw input or
    /// partial result, and coerce it to that type.
    pub fn normalize_value(
        &self,
        value: Option<&AggScalarValue>,
        intermediate: bool,
    ) -> Result<Option<AggScalarValue>, AggError> {
        let expected = if intermediate {
            &self.spec.intermediate_type
        } else {
            &self.spec.input_type
        };
        value
            .map(|value| normalize_scalar(expected, value))
            .transpose()
            .map_err(|e| AggError::Internal(format!("{}: {}", self.name, e)))
    }

    /// Absorb one input value; `None` (SQL NULL) leaves the state untouched.
    pub fn update(&self, state: &mut AggState, value: Option<&AggScalarValue>) -> Result<(), AggError> {
        match value {
            Some(value) => functions::update(&self.spec, state, value).map_err(AggError::Internal),
            None => Ok(()),
        }
    }

    pub fn merge(&self, state: &mut AggState, other: &AggState) -> Result<(), AggError> {
        functions::merge(&self.spec, state, other).map_err(AggError::Internal)
    }

    /// Absorb a finalized partial result of the same call; NULL partials are skipped.
    pub fn merge_value(
        &self,
        state: &mut AggState,
        value: Option<&AggScalarValue>,
    ) -> Result<(), AggError> {
        match value {
            Some(value) => {
                functions::merge_value(&self.spec, state, value).map_err(AggError::Internal)
            }
            None => Ok(()),
        }
    }

    pub fn finalize(&self, state: &AggState) -> Result<Option<AggScalarValue>, AggError> {
        functions::finalize(&self.spec, state).map_err(AggError::Internal)
    }

    pub fn build_array(&self, states: &[&AggState]) -> Result<ArrayRef, AggError> {
        let values = states
            .iter()
            .map(|state| self.finalize(state))
            .collect::<Result<Vec<_>, _>>()?;
        build_scalar_array(&self.spec.output_type, values).map_err(AggError::Internal)
    }

    pub fn new_accumulator(&self) -> AggAccumulator {
        AggAccumulator {
            state: self.init_state(),
            entry: self.clone(),
        }
    }
}

/// Single-group accumulator owning its state.
#[derive(Clone, Debug)]
pub struct AggAccumulator {
    entry: AggKernelEntry,
    state: AggState,
}

impl AggAccumulator {
    pub fn entry(&self) -> &AggKernelEntry {
        &self.entry
    }

    pub fn update(&mut self, value: Option<&AggScalarValue>) -> Result<(), AggError> {
        self.entry.update(&mut self.state, value)
    }

    /// Combine a partial accumulator of the same aggregate call.
    pub fn merge(&mut self, other: &AggAccumulator) -> Result<(), AggError> {
        if self.entry.spec != other.entry.spec {
            return Err(AggError::Internal(format!(
                "cannot merge {} accumulator over {} with {} accumulator over {}",
                self.entry.name,
                self.entry.spec.input_type,
                other.entry.name,
                other.entry.spec.input_type
            )));
        }
        self.entry.merge(&mut self.state, &other.state)
    }

    pub fn merge_value(&mut self, value: Option<&AggScalarValue>) -> Result<(), AggError> {
        self.entry.merge_value(&mut self.state, value)
    }

    pub fn finalize(&self) -> Result<Option<AggScalarValue>, AggError> {
        self.entry.finalize(&self.state)
    }
}
