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
use crate::exec::node::aggregate::AggFunction;

use super::error::AggError;
use super::{AggSpec, AggState};

/// Accumulation strategy chosen by the classifier for one aggregate call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggKind {
    SumInt,
    SumFloat,
    /// STRING input coerced to DOUBLE per value.
    SumString,
    SumDecimal,
    Min,
    Max,
}

pub(crate) mod common;
mod max;
mod min;
mod sum;

use common::AggScalarValue;
use max::MaxAgg;
use min::MinAgg;
use sum::SumAgg;

pub(super) trait AggregateFunction {
    fn build_spec_from_type(&self, func: &AggFunction) -> Result<AggSpec, AggError>;

    fn init_state(&self, spec: &AggSpec) -> AggState;

    /// Absorb one non-null input value.
    fn update(
        &self,
        spec: &AggSpec,
        state: &mut AggState,
        value: &AggScalarValue,
    ) -> Result<(), String>;

    /// Fold another state of the same spec into `state`.
    fn merge(&self, spec: &AggSpec, state: &mut AggState, other: &AggState) -> Result<(), String>;

    /// Fold a finalized partial result (intermediate type) into `state`.
    fn merge_value(
        &self,
        spec: &AggSpec,
        state: &mut AggState,
        value: &AggScalarValue,
    ) -> Result<(), String>;

    fn finalize(&self, spec: &AggSpec, state: &AggState) -> Result<Option<AggScalarValue>, String>;
}

static SUM: SumAgg = SumAgg;
static MIN: MinAgg = MinAgg;
static MAX: MaxAgg = MaxAgg;

fn resolve_by_func(func: &AggFunction) -> Result<&'static dyn AggregateFunction, AggError> {
    match canonical_agg_name(func.name.as_str()).as_str() {
        "sum" => Ok(&SUM),
        "min" => Ok(&MIN),
        "max" => Ok(&MAX),
        other => Err(AggError::UnsupportedFunction(format!(
            "unsupported native hive aggregate function: {}",
            other
        ))),
    }
}

fn resolve_by_kind(kind: &AggKind) -> &'static dyn AggregateFunction {
    match kind {
        AggKind::SumInt | AggKind::SumFloat | AggKind::SumString | AggKind::SumDecimal => &SUM,
        AggKind::Min => &MIN,
        AggKind::Max => &MAX,
    }
}

// Function names are case-insensitive in the dialect.
pub(super) fn canonical_agg_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

pub(super) fn build_spec_from_type(func: &AggFunction) -> Result<AggSpec, AggError> {
    resolve_by_func(func)?.build_spec_from_type(func)
}

pub(in crate::exec::expr::agg) fn init_state(spec: &AggSpec) -> AggState {
    resolve_by_kind(&spec.kind).init_state(spec)
}

pub(in crate::exec::expr::agg) fn update(
    spec: &AggSpec,
    state: &mut AggState,
    value: &AggScalarValue,
) -> Result<(), String> {
    resolve_by_kind(&spec.kind).update(spec, state, value)
}

pub(in crate::exec::expr::agg) fn merge(
    spec: &AggSpec,
    state: &mut AggState,
    other: &AggState,
) -> Result<(), String> {
    resolve_by_kind(&spec.kind).merge(spec, state, other)
}

pub(in crate::exec::expr::agg) fn merge_value(
    spec: &AggSpec,
    state: &mut AggState,
    value: &AggScalarValue,
) -> Result<(), String> {
    resolve_by_kind(&spec.kind).merge_value(spec, state, value)
}

pub(in crate::exec::expr::agg) fn finalize(
    spec: &AggSpec,
    state: &AggState,
) -> Result<Option<AggScalarValue>, String> {
    resolve_by_kind(&spec.kind).finalize(spec, state)
}

fn state_mismatch(spec: &AggSpec, state: &AggState) -> String {
    format!(
        "aggregate state mismatch: kind {:?} cannot use state {:?}",
        spec.kind, state
    )
}
