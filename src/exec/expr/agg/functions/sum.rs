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
use tracing::warn;

use crate::common::types::ColumnType;
use crate::exec::node::aggregate::AggFunction;

use super::super::decimal::{fits_precision, sum_result_precision};
use super::super::error::AggError;
use super::super::*;
use super::common::{AggScalarValue, normalize_scalar, try_parse_number};
use super::{AggKind, AggregateFunction, state_mismatch};

pub(super) struct SumAgg;

fn sum_spec(kind: AggKind, input_type: &ColumnType, output_type: ColumnType) -> AggSpec {
    AggSpec {
        kind,
        input_type: input_type.clone(),
        intermediate_type: output_type.clone(),
        output_type,
    }
}

fn sum_spec_from_type(input_type: &ColumnType) -> Result<AggSpec, AggError> {
    match input_type {
        ColumnType::Integer(_) => Ok(sum_spec(AggKind::SumInt, input_type, ColumnType::bigint())),
        ColumnType::Float | ColumnType::Double => {
            Ok(sum_spec(AggKind::SumFloat, input_type, ColumnType::Double))
        }
        ColumnType::String => Ok(sum_spec(AggKind::SumString, input_type, ColumnType::Double)),
        ColumnType::Decimal { precision, scale } => Ok(sum_spec(
            AggKind::SumDecimal,
            input_type,
            ColumnType::decimal(sum_result_precision(*precision), *scale),
        )),
        ColumnType::Boolean
        | ColumnType::Timestamp { .. }
        | ColumnType::Date
        | ColumnType::Binary
        | ColumnType::Array(_)
        | ColumnType::Map(_, _)
        | ColumnType::Row(_) => Err(AggError::unsupported_sum_type(input_type)),
    }
}

fn add_decimal(state: &mut SumDecimalState, value: i128) -> Result<(), String> {
    state.sum = state
        .sum
        .checked_add(i256::from_i128(value))
        .ok_or_else(|| "decimal sum overflow".to_string())?;
    state.has_value = true;
    Ok(())
}

impl AggregateFunction for SumAgg {
    fn build_spec_from_type(&self, func: &AggFunction) -> Result<AggSpec, AggError> {
        sum_spec_from_type(&func.input_type)
    }

    fn init_state(&self, spec: &AggSpec) -> AggState {
        match spec.kind {
            AggKind::SumInt => AggState::SumInt(SumIntState::default()),
            AggKind::SumDecimal => AggState::SumDecimal(SumDecimalState::default()),
            _ => AggState::SumFloat(SumFloatState::default()),
        }
    }

    fn update(
        &self,
        spec: &AggSpec,
        state: &mut AggState,
        value: &AggScalarValue,
    ) -> Result<(), String> {
        // range and family checks against the declared argument type
        let value = normalize_scalar(&spec.input_type, value)?;
        match (spec.kind, state, &value) {
            (AggKind::SumInt, AggState::SumInt(s), AggScalarValue::Int64(v)) => {
                // BIGINT addition wraps on overflow, matching the reference engine.
                s.sum = s.sum.wrapping_add(*v);
                s.has_value = true;
                Ok(())
            }
            (AggKind::SumFloat, AggState::SumFloat(s), AggScalarValue::Float32(v)) => {
                s.sum += *v as f64;
                s.has_value = true;
                Ok(())
            }
            (AggKind::SumFloat, AggState::SumFloat(s), AggScalarValue::Float64(v)) => {
                s.sum += *v;
                s.has_value = true;
                Ok(())
            }
            (AggKind::SumString, AggState::SumFloat(s), AggScalarValue::Utf8(text)) => {
                // Values that do not parse as a number are treated as NULL.
                if let Some(v) = try_parse_number(text) {
                    s.sum += v;
                    s.has_value = true;
                }
                Ok(())
            }
            (
                AggKind::SumDecimal,
                AggState::SumDecimal(s),
                AggScalarValue::Decimal128 { value, .. },
            ) => add_decimal(s, *value),
            (kind, _, value) => Err(format!(
                "sum input type mismatch: kind {:?} got {}",
                kind,
                value.type_name()
            )),
        }
    }

    fn merge(&self, spec: &AggSpec, state: &mut AggState, other: &AggState) -> Result<(), String> {
        match (state, other) {
            (AggState::SumInt(s), AggState::SumInt(o)) => {
                s.sum = s.sum.wrapping_add(o.sum);
                s.has_value |= o.has_value;
                Ok(())
            }
            (AggState::SumFloat(s), AggState::SumFloat(o)) => {
                s.sum += o.sum;
                s.has_value |= o.has_value;
                Ok(())
            }
            (AggState::SumDecimal(s), AggState::SumDecimal(o)) => {
                s.sum = s
                    .sum
                    .checked_add(o.sum)
                    .ok_or_else(|| "decimal sum overflow".to_string())?;
                s.has_value |= o.has_value;
                Ok(())
            }
            (_, other) => Err(state_mismatch(spec, other)),
        }
    }

    fn merge_value(
        &self,
        spec: &AggSpec,
        state: &mut AggState,
        value: &AggScalarValue,
    ) -> Result<(), String> {
        // partial results arrive in the intermediate type; decimals are
        // rescaled to its scale here
        let value = normalize_scalar(&spec.intermediate_type, value)?;
        match (spec.kind, state, &value) {
            (AggKind::SumInt, AggState::SumInt(s), AggScalarValue::Int64(v)) => {
                s.sum = s.sum.wrapping_add(*v);
                s.has_value = true;
                Ok(())
            }
            (
                AggKind::SumFloat | AggKind::SumString,
                AggState::SumFloat(s),
                AggScalarValue::Float64(v),
            ) => {
                s.sum += *v;
                s.has_value = true;
                Ok(())
            }
            (
                AggKind::SumDecimal,
                AggState::SumDecimal(s),
                AggScalarValue::Decimal128 { value, .. },
            ) => add_decimal(s, *value),
            (kind, _, value) => Err(format!(
                "sum merge input type mismatch: kind {:?} got {}",
                kind,
                value.type_name()
            )),
        }
    }

    fn finalize(&self, spec: &AggSpec, state: &AggState) -> Result<Option<AggScalarValue>, String> {
        match state {
            AggState::SumInt(s) => Ok(s.has_value.then_some(AggScalarValue::Int64(s.sum))),
            AggState::SumFloat(s) => Ok(s.has_value.then_some(AggScalarValue::Float64(s.sum))),
            AggState::SumDecimal(s) => {
                if !s.has_value {
                    return Ok(None);
                }
                let ColumnType::Decimal { precision, scale } = spec.output_type else {
                    return Err("sum decimal output type mismatch".to_string());
                };
                let fits = fits_precision(s.sum, precision)?;
                match s.sum.to_i128() {
                    Some(value) if fits => Ok(Some(AggScalarValue::Decimal128 {
                        value,
                        precision,
                        scale,
                    })),
                    _ => {
                        warn!(
                            "decimal sum exceeds DECIMAL({}, {}), producing NULL",
                            precision, scale
                        );
                        Ok(None)
                    }
                }
            }
            other => Err(state_mismatch(spec, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::IntegerWidth;

    fn run(input_type: ColumnType, values: &[Option<AggScalarValue>]) -> Option<AggScalarValue> {
        let spec = sum_spec_from_type(&input_type).unwrap();
        let mut state = SUM_AGG.init_state(&spec);
        for value in values.iter().flatten() {
            SUM_AGG.update(&spec, &mut state, value).unwrap();
        }
        SUM_AGG.finalize(&spec, &state).unwrap()
    }

    static SUM_AGG: SumAgg = SumAgg;

    fn dec(value: i128, scale: i8) -> AggScalarValue {
        AggScalarValue::Decimal128 {
            value,
            precision: 10,
            scale,
        }
    }

    #[test]
    fn test_integer_sum_promotes_to_bigint_and_wraps() {
        let spec = sum_spec_from_type(&ColumnType::Integer(IntegerWidth::TinyInt)).unwrap();
        assert_eq!(spec.output_type, ColumnType::bigint());
        let out = run(
            ColumnType::bigint(),
            &[
                Some(AggScalarValue::Int64(i64::MAX)),
                Some(AggScalarValue::Int64(1)),
            ],
        );
        assert_eq!(out, Some(AggScalarValue::Int64(i64::MIN)));
    }

    #[test]
    fn test_string_sum_skips_non_numeric() {
        let values = ["2", "b", "4"]
            .iter()
            .map(|s| Some(AggScalarValue::Utf8(s.to_string())))
            .chain(std::iter::once(None))
            .collect::<Vec<_>>();
        let out = run(ColumnType::String, &values).unwrap();
        assert_eq!(out.to_string(), "6.0");
        let none = run(ColumnType::String, &[Some(AggScalarValue::Utf8("x".into()))]);
        assert_eq!(none, None);
    }

    #[test]
    fn test_decimal_sum_is_exact_and_widens_precision() {
        let ty = ColumnType::decimal(10, 5);
        let spec = sum_spec_from_type(&ty).unwrap();
        assert_eq!(spec.output_type, ColumnType::decimal(20, 5));
        let values = [111, 222, 333, 445]
            .iter()
            .map(|v| Some(dec(*v, 2)))
            .collect::<Vec<_>>();
        assert_eq!(run(ty, &values).unwrap().to_string(), "11.11000");
    }

    #[test]
    fn test_decimal_overflow_finalizes_to_null() {
        let ty = ColumnType::decimal(38, 0);
        let max = 10i128.pow(38) - 1;
        let out = run(
            ty,
            &[
                Some(AggScalarValue::Decimal128 { value: max, precision: 38, scale: 0 }),
                Some(AggScalarValue::Decimal128 { value: 1, precision: 38, scale: 0 }),
            ],
        );
        assert_eq!(out, None);
    }

    #[test]
    fn test_unsupported_types_are_rejected() {
        for ty in [
            ColumnType::timestamp(),
            ColumnType::Boolean,
            ColumnType::Date,
            ColumnType::Binary,
            ColumnType::array(ColumnType::int()),
        ] {
            let err = sum_spec_from_type(&ty).unwrap_err();
            assert!(matches!(err, AggError::UnsupportedAggregateType(_)), "{ty}");
            assert!(err.message().contains(&ty.to_string()));
        }
    }

    #[test]
    fn test_merge_value_reads_partial_output() {
        let spec = sum_spec_from_type(&ColumnType::decimal(10, 5)).unwrap();
        let mut state = SUM_AGG.init_state(&spec);
        SUM_AGG
            .merge_value(&spec, &mut state, &dec(1_110_000, 5))
            .unwrap();
        SUM_AGG.merge_value(&spec, &mut state, &dec(1, 0)).unwrap();
        let out = SUM_AGG.finalize(&spec, &state).unwrap().unwrap();
        assert_eq!(out.to_string(), "12.10000");
    }

    #[test]
    fn test_update_range_checks_declared_width() {
        let spec = sum_spec_from_type(&ColumnType::Integer(IntegerWidth::TinyInt)).unwrap();
        let mut state = SUM_AGG.init_state(&spec);
        SUM_AGG
            .update(&spec, &mut state, &AggScalarValue::Int64(100))
            .unwrap();
        let err = SUM_AGG
            .update(&spec, &mut state, &AggScalarValue::Int64(1_000_000_000_000))
            .unwrap_err();
        assert!(err.contains("TINYINT overflow"), "{err}");
        assert_eq!(
            SUM_AGG.finalize(&spec, &state).unwrap(),
            Some(AggScalarValue::Int64(100))
        );
    }

    #[test]
    fn test_update_rejects_wrong_float_family() {
        let spec = sum_spec_from_type(&ColumnType::Float).unwrap();
        let mut state = SUM_AGG.init_state(&spec);
        assert!(
            SUM_AGG
                .update(&spec, &mut state, &AggScalarValue::Float64(1.5))
                .is_err()
        );
        SUM_AGG
            .update(&spec, &mut state, &AggScalarValue::Float32(1.5))
            .unwrap();
        assert_eq!(
            SUM_AGG.finalize(&spec, &state).unwrap(),
            Some(AggScalarValue::Float64(1.5))
        );
    }
}
