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
use arrow_buffer::i256;

use super::functions::common::AggScalarValue;

#[derive(Clone, Debug, Default)]
pub struct SumIntState {
    pub(super) sum: i64,
    pub(super) has_value: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SumFloatState {
    pub(super) sum: f64,
    pub(super) has_value: bool,
}

#[derive(Clone, Debug)]
pub struct SumDecimalState {
    pub(super) sum: i256,
    pub(super) has_value: bool,
}

impl Default for SumDecimalState {
    fn default() -> Self {
        Self {
            sum: i256::ZERO,
            has_value: false,
        }
    }
}

/// Running extreme for MIN/MAX; `None` until a non-null value arrives.
#[derive(Clone, Debug, Default)]
pub struct ExtremeState {
    pub(super) value: Option<AggScalarValue>,
}

/// Per-group accumulator state, one variant per state layout.
#[derive(Clone, Debug)]
pub enum AggState {
    SumInt(SumIntState),
    SumFloat(SumFloatState),
    SumDecimal(SumDecimalState),
    Extreme(ExtremeState),
}

impl AggState {
    /// True once any non-null input has been absorbed.
    pub fn has_value(&self) -> bool {
        match self {
            AggState::SumInt(s) => s.has_value,
            AggState::SumFloat(s) => s.has_value,
            AggState::SumDecimal(s) => s.has_value,
            AggState::Extreme(s) => s.value.is_some(),
        }
    }
}
