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
use std::fmt;

use crate::common::types::ColumnType;

/// Dialect option that switches native aggregation off; named in SUM rejections.
pub const NATIVE_AGG_FUNCTION_OPTION: &str = "table.exec.hive.native-agg-function.enabled";

const MAP_COMPARISON_MESSAGE: &str =
    "Cannot support comparison of map<> type or complex type containing map<>.";

/// Errors surfaced by the native aggregate engine.
///
/// The first two kinds are plan-time rejections whose messages are part of the
/// compatibility contract and must not change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AggError {
    /// The function has no native implementation for the declared input type.
    UnsupportedAggregateType(String),
    /// The input type has no order (MAP, or a complex type nesting a MAP).
    UnsupportedComparison(String),
    UnsupportedFunction(String),
    Internal(String),
}

impl AggError {
    pub(crate) fn unsupported_sum_type(input_type: &ColumnType) -> Self {
        AggError::UnsupportedAggregateType(format!(
            "Native hive sum aggregate function does not support type: {}. Please set option '{}' to false.",
            input_type, NATIVE_AGG_FUNCTION_OPTION
        ))
    }

    pub(crate) fn unsupported_extreme_type(function: &str, input_type: &ColumnType) -> Self {
        AggError::UnsupportedAggregateType(format!(
            "Hive native {} aggregate function does not support type: '{}' now. Please re-check the data type.",
            function,
            input_type.type_root()
        ))
    }

    pub(crate) fn map_comparison() -> Self {
        AggError::UnsupportedComparison(MAP_COMPARISON_MESSAGE.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            AggError::UnsupportedAggregateType(msg)
            | AggError::UnsupportedComparison(msg)
            | AggError::UnsupportedFunction(msg)
            | AggError::Internal(msg) => msg,
        }
    }

    /// True for errors that must abort query compilation.
    pub fn is_plan_error(&self) -> bool {
        !matches!(self, AggError::Internal(_))
    }
}

impl fmt::Display for AggError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AggError {}
