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

use crate::exec::node::aggregate::AggFunction;

use super::super::error::AggError;
use super::super::*;
use super::common::AggScalarValue;
use super::min::{extreme_spec_from_type, finalize_extreme, merge_extreme, update_extreme};
use super::{AggKind, AggregateFunction};

pub(super) struct MaxAgg;

impl AggregateFunction for MaxAgg {
    fn build_spec_from_type(&self, func: &AggFunction) -> Result<AggSpec, AggError> {
        extreme_spec_from_type("max", AggKind::Max, &func.input_type)
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
        update_extreme(spec, state, value, Ordering::Greater)
    }

    fn merge(&self, spec: &AggSpec, state: &mut AggState, other: &AggState) -> Result<(), String> {
        merge_extreme(spec, state, other, Ordering::Greater)
    }

    fn merge_value(
        &self,
        spec: &AggSpec,
        state: &mut AggState,
        value: &AggScalarValue,
    ) -> Result<(), String> {
        update_extreme(spec, state, value, Ordering::Greater)
    }

    fn finalize(&self, spec: &AggSpec, state: &AggState) -> Result<Option<AggScalarValue>, String> {
        finalize_extreme(spec, state)
    }
}
