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
use tracing::debug;

use crate::common::types::ColumnType;
use crate::exec::node::aggregate::AggFunction;

use super::error::AggError;
use super::functions;
use super::functions::AggKind;

/// Classifies one aggregate call into its accumulation strategy.
///
/// Runs once per aggregate expression at plan time; unsupported combinations fail
/// here with the user-facing messages of [`AggError`].
pub(super) fn build_spec_from_type(func: &AggFunction) -> Result<AggSpec, AggError> {
    func.input_type.validate().map_err(AggError::Internal)?;
    let spec = functions::build_spec_from_type(func)?;
    debug!(
        "classified {}({}) as {:?} -> {}",
        func.name, func.input_type, spec.kind, spec.output_type
    );
    Ok(spec)
}

/// Classify `function` over a column of `input_type` without building a kernel.
pub fn classify(function: &str, input_type: &ColumnType) -> Result<AggSpec, AggError> {
    build_spec_from_type(&AggFunction::new(function, 0, input_type.clone()))
}

/// Resolved strategy and types of one aggregate call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggSpec {
    pub(super) kind: AggKind,
    pub(super) input_type: ColumnType,
    pub(super) output_type: ColumnType,
    /// Type of the partial results exchanged between stages; equals the output
    /// type for every native function.
    pub(super) intermediate_type: ColumnType,
}

impl AggSpec {
    pub fn kind(&self) -> AggKind {
        self.kind
    }

    pub fn input_type(&self) -> &ColumnType {
        &self.input_type
    }

    pub fn output_type(&self) -> &ColumnType {
        &self.output_type
    }

    pub fn intermediate_type(&self) -> &ColumnType {
        &self.intermediate_type
    }
}
