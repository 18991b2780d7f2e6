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
use std::cmp::Ordering;

use crate::common::types::ColumnType;
use crate::exec::node::aggregate::AggFunction;

use super::super::error::AggError;
use super::super::*;
use super::common::{AggScalarValue, compare_scalar_values, normalize_scalar};
use super::{AggKind, AggregateFunction, state_mismatch};

pub(super) struct MinAgg;

/// Shared classification for MIN and MAX.
///
/// Map-bearing types fail the comparison check before the native type table is
/// consulted, so `MIN(ROW<m MAP<..>>)` reports the comparison error.
pub(super) fn extreme_spec_from_type(
    function: &str,
    kind: AggKind,
    input_type: &ColumnType,
) -> Result<AggSpec, AggError> {
    if input_type.contains_map() {
        return Err(AggError::map_comparison());
    }
    match input_type {
        ColumnType::Array(_) | ColumnType::Row(_) => {
            Err(AggError::unsupported_extreme_type(function, input_type))
        }
        ColumnType::Map(_, _) => Err(AggError::map_comparison()),
        _ => Ok(AggSpec {
            kind,
            input_type: input_type.clone(),
            output_type: input_type.clone(),
            intermediate_type: input_type.clone(),
        }),
    }
}

/// Replace the running extreme when `value` orders as `keep` against it.
pub(super) fn update_extreme(
    spec: &AggSpec,
    state: &mut AggState,
    value: &AggScalarValue,
    keep: Ordering,
) -> Result<(), String> {
    let AggState::Extreme(extreme) = state else {
        return Err(format!(
            "aggregate state mismatch: kind {:?} expects an extreme state",
            spec.kind
        ));
    };
    let value = normalize_scalar(&spec.input_type, value)?;
    let replace = match extreme.value.as_ref() {
        None => true,
        Some(current) => compare_scalar_values(&value, current)? == keep,
    };
    if replace {
        extreme.value = Some(value);
    }
    Ok(())
}

pub(super) fn merge_extreme(
    spec: &AggSpec,
    state: &mut AggState,
    other: &AggState,
    keep: Ordering,
) -> Result<(), String> {
    match other {
        AggState::Extreme(o) => match o.value.as_ref() {
            Some(value) => update_extreme(spec, state, value, keep),
            None => Ok(()),
        },
        other => Err(state_mismatch(spec, other)),
    }
}

pub(super) fn finalize_extreme(
    spec: &AggSpec,
    state: &AggState,
) -> Result<Option<AggScalarValue>, String> {
    match state {
        AggState::Extreme(s) => Ok(s.value.clone()),
        other => Err(state_mismatch(spec, other)),
    }
}

impl AggregateFunction for MinAgg {
    fn build_spec_from_type(&self, func: &AggFunction) -> Result<AggSpec, AggError> {
        extreme_spec_from_type("min", AggKind::Min, &func.input_type)
    }

    fn init_state(&self, _spec: &AggSpec) -> AggState {
        AggState::Extreme(ExtremeState::default())
    }

    fn update(
        &self,
        spec: &AggSpec,
        state: &mut AggState,
        value: &AggScalarValue,
    ) -> Result<(), String> {
        update_extreme(spec, state, value, Ordering::Less)
    }

    fn merge(&self, spec: &AggSpec, state: &mut AggState, other: &AggState) -> Result<(), String> {
        merge_extreme(spec, state, other, Ordering::Less)
    }

    fn merge_value(
        &self,
        spec: &AggSpec,
        state: &mut AggState,
        value: &AggScalarValue,
    ) -> Result<(), String> {
        update_extreme(spec, state, value, Ordering::Less)
    }

    fn finalize(&self, spec: &AggSpec, state: &AggState) -> Result<Option<AggScalarValue>, String> {
        finalize_extreme(spec, state)
    }
}
