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
use arrow::array::{Array, ArrayRef};
use arrow::datatypes::DataType;

use crate::common::types::{ColumnType, precision_for_time_unit, time_unit_for_precision};

use super::AggKernelEntry;
use super::functions::common::{AggScalarValue, scalar_from_array};

/// Typed read access to the argument column of one aggregate call.
pub struct AggInputView<'a> {
    array: &'a ArrayRef,
    expected: &'a ColumnType,
}

impl<'a> AggInputView<'a> {
    pub fn new(array: &'a ArrayRef, expected: &'a ColumnType) -> Result<Self, String> {
        if !is_compatible_input_type(expected, array.data_type()) {
            return Err(format!(
                "aggregate input type mismatch: expected {}, got {:?}",
                expected,
                array.data_type()
            ));
        }
        Ok(Self { array, expected })
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn expected_type(&self) -> &ColumnType {
        self.expected
    }

    pub fn value_at(&self, row: usize) -> Result<Option<AggScalarValue>, String> {
        scalar_from_array(self.array, row)
    }
}

pub fn build_agg_input_views_from_kernels<'a>(
    kernels: &'a [AggKernelEntry],
    arrays: &'a [ArrayRef],
) -> Result<Vec<AggInputView<'a>>, String> {
    check_input_len(kernels, arrays)?;
    kernels
        .iter()
        .zip(arrays.iter())
        .map(|(kernel, array)| kernel.build_input_view(array))
        .collect()
}

pub fn build_agg_merge_views_from_kernels<'a>(
    kernels: &'a [AggKernelEntry],
    arrays: &'a [ArrayRef],
) -> Result<Vec<AggInputView<'a>>, String> {
    check_input_len(kernels, arrays)?;
    kernels
        .iter()
        .zip(arrays.iter())
        .map(|(kernel, array)| kernel.build_merge_view(array))
        .collect()
}

fn check_input_len(kernels: &[AggKernelEntry], arrays: &[ArrayRef]) -> Result<(), String> {
    if kernels.len() != arrays.len() {
        return Err(format!(
            "aggregate input length mismatch: {} kernels, {} arrays",
            kernels.len(),
            arrays.len()
        ));
    }
    Ok(())
}

/// Whether an arrow column can feed an aggregate declared over `expected`.
///
/// Narrower integers and decimals with a smaller scale are widened exactly per
/// value, so they are accepted. Timestamps are accepted when their unit is no
/// finer than the unit the declared precision is stored in.
pub(crate) fn is_compatible_input_type(expected: &ColumnType, actual: &DataType) -> bool {
    let Ok(actual) = ColumnType::from_arrow_type(actual) else {
        return false;
    };
    match (expected, &actual) {
        (ColumnType::Integer(expected), ColumnType::Integer(actual)) => {
            actual.bits() <= expected.bits()
        }
        (ColumnType::Decimal { scale: expected, .. }, ColumnType::Decimal { scale: actual, .. }) => {
            actual <= expected
        }
        (
            ColumnType::Timestamp { precision: expected },
            ColumnType::Timestamp { precision: actual },
        ) => *actual <= precision_for_time_unit(&time_unit_for_precision(*expected)),
        _ => expected == &actual,
    }
}
