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
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BinaryBuilder, BooleanArray, BooleanBuilder, Date32Array,
    Decimal128Array, Float32Array, Float32Builder, Float64Array, Float64Builder, Int8Array,
    Int8Builder, Int16Array, Int16Builder, Int32Array, Int32Builder, Int64Array, Int64Builder,
    LargeBinaryArray, LargeStringArray, StringArray, StringBuilder, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::common::types::{ColumnType, IntegerWidth, time_unit_for_precision};

use super::super::decimal::{format_decimal, rescale_i128};

const UNIX_EPOCH_DAY_OFFSET: i32 = 719163;
const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// One non-null value flowing into or out of an aggregate.
///
/// Integers of every width travel as `Int64`; the declared column type decides
/// the width when the value is materialized.
#[derive(Clone, Debug)]
pub enum AggScalarValue {
    Bool(bool),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
    Binary(Vec<u8>),
    Decimal128 {
        value: i128,
        precision: u8,
        scale: i8,
    },
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl AggScalarValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AggScalarValue::Bool(_) => "BOOLEAN",
            AggScalarValue::Int64(_) => "INTEGER",
            AggScalarValue::Float32(_) => "FLOAT",
            AggScalarValue::Float64(_) => "DOUBLE",
            AggScalarValue::Utf8(_) => "STRING",
            AggScalarValue::Binary(_) => "BINARY",
            AggScalarValue::Decimal128 { .. } => "DECIMAL",
            AggScalarValue::Date(_) => "DATE",
            AggScalarValue::Timestamp(_) => "TIMESTAMP",
        }
    }
}

fn canonical_f64_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

// Equality is by value: -0.0 == 0.0, NaN == NaN, and decimals compare after
// aligning scales, so values can serve as group keys.
impl PartialEq for AggScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AggScalarValue::Float32(l), AggScalarValue::Float32(r)) => {
                canonical_f64_bits(*l as f64) == canonical_f64_bits(*r as f64)
            }
            (AggScalarValue::Float64(l), AggScalarValue::Float64(r)) => {
                canonical_f64_bits(*l) == canonical_f64_bits(*r)
            }
            _ => matches!(compare_scalar_values(self, other), Ok(Ordering::Equal)),
        }
    }
}

impl Eq for AggScalarValue {}

impl Hash for AggScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AggScalarValue::Bool(v) => v.hash(state),
            AggScalarValue::Int64(v) => v.hash(state),
            AggScalarValue::Float32(v) => canonical_f64_bits(*v as f64).hash(state),
            AggScalarValue::Float64(v) => canonical_f64_bits(*v).hash(state),
            AggScalarValue::Utf8(v) => v.hash(state),
            AggScalarValue::Binary(v) => v.hash(state),
            AggScalarValue::Decimal128 { value, scale, .. } => {
                // canonicalize to the smallest non-negative scale so equal
                // values at different scales collide
                let (mut value, mut scale) = (*value, *scale);
                while scale < 0 {
                    match value.checked_mul(10) {
                        Some(scaled) => {
                            value = scaled;
                            scale += 1;
                        }
                        None => break,
                    }
                }
                while scale > 0 && value % 10 == 0 {
                    value /= 10;
                    scale -= 1;
                }
                value.hash(state);
                scale.hash(state);
            }
            AggScalarValue::Date(v) => v.hash(state),
            AggScalarValue::Timestamp(v) => v.hash(state),
        }
    }
}

// Java-style floating point text: plain decimal for magnitudes in
// [1e-3, 1e7), otherwise `d.dddE<exp>` with at least one fraction digit.
fn fmt_java_float(
    f: &mut fmt::Formatter<'_>,
    v: f64,
    plain: String,
    sci: String,
) -> fmt::Result {
    if v.is_infinite() {
        return f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" });
    }
    let magnitude = v.abs();
    if v.is_nan() || magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return f.write_str(&plain);
    }
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    if mantissa.contains('.') {
        write!(f, "{}E{}", mantissa, exponent)
    } else {
        write!(f, "{}.0E{}", mantissa, exponent)
    }
}

/// Renders values the way the reference dialect prints result rows.
impl fmt::Display for AggScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggScalarValue::Bool(v) => write!(f, "{}", v),
            AggScalarValue::Int64(v) => write!(f, "{}", v),
            AggScalarValue::Float32(v) => {
                fmt_java_float(f, *v as f64, format!("{:?}", v), format!("{:e}", v))
            }
            AggScalarValue::Float64(v) => {
                fmt_java_float(f, *v, format!("{:?}", v), format!("{:e}", v))
            }
            AggScalarValue::Utf8(v) => f.write_str(v),
            AggScalarValue::Binary(v) => {
                f.write_str("[")?;
                for (idx, b) in v.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", *b as i8)?;
                }
                f.write_str("]")
            }
            AggScalarValue::Decimal128 { value, scale, .. } => {
                f.write_str(&format_decimal(*value, *scale))
            }
            AggScalarValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            AggScalarValue::Timestamp(v) => {
                write!(f, "{}", v.format("%Y-%m-%dT%H:%M"))?;
                let nanos = v.nanosecond();
                if v.second() == 0 && nanos == 0 {
                    return Ok(());
                }
                write!(f, ":{:02}", v.second())?;
                if nanos == 0 {
                    Ok(())
                } else if nanos % 1_000_000 == 0 {
                    write!(f, ".{:03}", nanos / 1_000_000)
                } else if nanos % 1_000 == 0 {
                    write!(f, ".{:06}", nanos / 1_000)
                } else {
                    write!(f, ".{:09}", nanos)
                }
            }
        }
    }
}

/// Total order between two values of the same type family.
///
/// Floats use the IEEE total order, strings compare by UTF-8 bytes, binary by
/// unsigned bytes, and decimals numerically after scale alignment.
pub(crate) fn compare_scalar_values(
    left: &AggScalarValue,
    right: &AggScalarValue,
) -> Result<Ordering, String> {
    match (left, right) {
        (AggScalarValue::Bool(l), AggScalarValue::Bool(r)) => Ok(l.cmp(r)),
        (AggScalarValue::Int64(l), AggScalarValue::Int64(r)) => Ok(l.cmp(r)),
        (AggScalarValue::Float32(l), AggScalarValue::Float32(r)) => Ok(l.total_cmp(r)),
        (AggScalarValue::Float64(l), AggScalarValue::Float64(r)) => Ok(l.total_cmp(r)),
        (AggScalarValue::Utf8(l), AggScalarValue::Utf8(r)) => Ok(l.as_bytes().cmp(r.as_bytes())),
        (AggScalarValue::Binary(l), AggScalarValue::Binary(r)) => Ok(l.cmp(r)),
        (
            AggScalarValue::Decimal128 {
                value: l,
                scale: ls,
                ..
            },
            AggScalarValue::Decimal128 {
                value: r,
                scale: rs,
                ..
            },
        ) => {
            let target = (*ls).max(*rs);
            match (rescale_i128(*l, *ls, target), rescale_i128(*r, *rs, target)) {
                (Ok(l), Ok(r)) => Ok(l.cmp(&r)),
                // one side overflowed i128 while widening: its magnitude dominates
                (Err(_), _) => Ok(if *l < 0 { Ordering::Less } else { Ordering::Greater }),
                (_, Err(_)) => Ok(if *r < 0 { Ordering::Greater } else { Ordering::Less }),
            }
        }
        (AggScalarValue::Date(l), AggScalarValue::Date(r)) => Ok(l.cmp(r)),
        (AggScalarValue::Timestamp(l), AggScalarValue::Timestamp(r)) => Ok(l.cmp(r)),
        (l, r) => Err(format!(
            "scalar comparison type mismatch: {} vs {}",
            l.type_name(),
            r.type_name()
        )),
    }
}

/// Parse a string the way a STRING-to-DOUBLE coercion does; `None` on failure.
///
/// Accepts optional sign, digits with an optional fraction and exponent, an
/// optional `d`/`f` suffix, and the `NaN`/`Infinity` literals.
pub fn try_parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(|c: char| c <= ' ');
    if trimmed.is_empty() {
        return None;
    }
    let (sign, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    match unsigned {
        "NaN" => return Some(f64::NAN),
        "Infinity" => return Some(sign * f64::INFINITY),
        _ => {}
    }
    let body = unsigned
        .strip_suffix(['d', 'D', 'f', 'F'])
        .unwrap_or(unsigned);

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let (int_digits, frac_digits) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits_ok = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_digits.is_empty() && frac_digits.is_empty())
        || !digits_ok(int_digits)
        || !digits_ok(frac_digits)
    {
        return None;
    }
    if let Some(exp) = exponent {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if exp.is_empty() || !digits_ok(exp) {
            return None;
        }
    }
    body.parse::<f64>().ok().map(|v| sign * v)
}

fn date32_to_naive(days: i32) -> Result<NaiveDate, String> {
    UNIX_EPOCH_DAY_OFFSET
        .checked_add(days)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| format!("date32 value out of range: {}", days))
}

fn naive_to_date32(date: &NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAY_OFFSET
}

fn timestamp_from_units(value: i64, unit: &TimeUnit) -> Result<NaiveDateTime, String> {
    let per_second = match unit {
        TimeUnit::Second => 1,
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => NANOS_PER_SECOND,
    };
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (NANOS_PER_SECOND / per_second);
    DateTime::from_timestamp(secs, nanos as u32)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| format!("timestamp value out of range: {}", value))
}

fn timestamp_to_units(ts: &NaiveDateTime, unit: &TimeUnit) -> Result<i64, String> {
    let utc = ts.and_utc();
    match unit {
        TimeUnit::Second => Ok(utc.timestamp()),
        TimeUnit::Millisecond => Ok(utc.timestamp_millis()),
        TimeUnit::Microsecond => Ok(utc.timestamp_micros()),
        TimeUnit::Nanosecond => utc
            .timestamp_nanos_opt()
            .ok_or_else(|| format!("timestamp {} out of nanosecond range", ts)),
    }
}

macro_rules! downcast_value {
    ($array:expr, $ty:ty, $row:expr, $name:literal) => {{
        let arr = $array
            .as_any()
            .downcast_ref::<$ty>()
            .ok_or_else(|| concat!("failed to downcast to ", $name).to_string())?;
        if arr.is_null($row) {
            return Ok(None);
        }
        arr.value($row)
    }};
}

/// Read one cell of an arrow column as a scalar; `None` for null cells.
pub(crate) fn scalar_from_array(
    array: &ArrayRef,
    row: usize,
) -> Result<Option<AggScalarValue>, String> {
    if row >= array.len() {
        return Err(format!("row {} out of bounds (len={})", row, array.len()));
    }
    let value = match array.data_type() {
        DataType::Boolean => {
            AggScalarValue::Bool(downcast_value!(array, BooleanArray, row, "BooleanArray"))
        }
        DataType::Int8 => {
            AggScalarValue::Int64(downcast_value!(array, Int8Array, row, "Int8Array") as i64)
        }
        DataType::Int16 => {
            AggScalarValue::Int64(downcast_value!(array, Int16Array, row, "Int16Array") as i64)
        }
        DataType::Int32 => {
            AggScalarValue::Int64(downcast_value!(array, Int32Array, row, "Int32Array") as i64)
        }
        DataType::Int64 => {
            AggScalarValue::Int64(downcast_value!(array, Int64Array, row, "Int64Array"))
        }
        DataType::Float32 => {
            AggScalarValue::Float32(downcast_value!(array, Float32Array, row, "Float32Array"))
        }
        DataType::Float64 => {
            AggScalarValue::Float64(downcast_value!(array, Float64Array, row, "Float64Array"))
        }
        DataType::Utf8 => AggScalarValue::Utf8(
            downcast_value!(array, StringArray, row, "StringArray").to_string(),
        ),
        DataType::LargeUtf8 => AggScalarValue::Utf8(
            downcast_value!(array, LargeStringArray, row, "LargeStringArray").to_string(),
        ),
        DataType::Binary => AggScalarValue::Binary(
            downcast_value!(array, BinaryArray, row, "BinaryArray").to_vec(),
        ),
        DataType::LargeBinary => AggScalarValue::Binary(
            downcast_value!(array, LargeBinaryArray, row, "LargeBinaryArray").to_vec(),
        ),
        DataType::Decimal128(precision, scale) => AggScalarValue::Decimal128 {
            value: downcast_value!(array, Decimal128Array, row, "Decimal128Array"),
            precision: *precision,
            scale: *scale,
        },
        DataType::Date32 => AggScalarValue::Date(date32_to_naive(downcast_value!(
            array,
            Date32Array,
            row,
            "Date32Array"
        ))?),
        DataType::Timestamp(unit, _) => {
            let raw = match unit {
                TimeUnit::Second => {
                    downcast_value!(array, TimestampSecondArray, row, "TimestampSecondArray")
                }
                TimeUnit::Millisecond => downcast_value!(
                    array,
                    TimestampMillisecondArray,
                    row,
                    "TimestampMillisecondArray"
                ),
                TimeUnit::Microsecond => downcast_value!(
                    array,
                    TimestampMicrosecondArray,
                    row,
                    "TimestampMicrosecondArray"
                ),
                TimeUnit::Nanosecond => downcast_value!(
                    array,
                    TimestampNanosecondArray,
                    row,
                    "TimestampNanosecondArray"
                ),
            };
            AggScalarValue::Timestamp(timestamp_from_units(raw, unit)?)
        }
        other => return Err(format!("unsupported aggregate input array type: {:?}", other)),
    };
    Ok(Some(value))
}

fn mismatch(column_type: &ColumnType, value: &AggScalarValue) -> String {
    format!(
        "scalar type mismatch: expected {}, got {}",
        column_type,
        value.type_name()
    )
}

fn integer_in_range(width: IntegerWidth, v: i64) -> Result<i64, String> {
    let (lo, hi) = width.range();
    if v < lo || v > hi {
        return Err(format!("{} overflow: {}", width.name(), v));
    }
    Ok(v)
}

/// Check that `value` belongs to `column_type` and bring decimals to the
/// declared scale.
pub(crate) fn normalize_scalar(
    column_type: &ColumnType,
    value: &AggScalarValue,
) -> Result<AggScalarValue, String> {
    match (column_type, value) {
        (ColumnType::Integer(width), AggScalarValue::Int64(v)) => {
            Ok(AggScalarValue::Int64(integer_in_range(*width, *v)?))
        }
        (
            ColumnType::Decimal { precision, scale },
            AggScalarValue::Decimal128 {
                value,
                scale: value_scale,
                ..
            },
        ) => Ok(AggScalarValue::Decimal128 {
            value: rescale_i128(*value, *value_scale, *scale)?,
            precision: *precision,
            scale: *scale,
        }),
        (ColumnType::Float, AggScalarValue::Float32(_))
        | (ColumnType::Double, AggScalarValue::Float64(_))
        | (ColumnType::String, AggScalarValue::Utf8(_))
        | (ColumnType::Boolean, AggScalarValue::Bool(_))
        | (ColumnType::Timestamp { .. }, AggScalarValue::Timestamp(_))
        | (ColumnType::Date, AggScalarValue::Date(_))
        | (ColumnType::Binary, AggScalarValue::Binary(_)) => Ok(value.clone()),
        (ColumnType::Double, AggScalarValue::Float32(v)) => Ok(AggScalarValue::Float64(*v as f64)),
        _ => Err(mismatch(column_type, value)),
    }
}

/// Materialize finalized values as an arrow column of `column_type`.
pub(crate) fn build_scalar_array(
    column_type: &ColumnType,
    values: Vec<Option<AggScalarValue>>,
) -> Result<ArrayRef, String> {
    match column_type {
        ColumnType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Bool(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(column_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        ColumnType::Integer(width) => {
            let mut ints = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Int64(v)) => ints.push(Some(integer_in_range(*width, v)?)),
                    None => ints.push(None),
                    Some(other) => return Err(mismatch(column_type, &other)),
                }
            }
            // range checked above, so the narrowing casts are exact
            let array: ArrayRef = match width {
                IntegerWidth::TinyInt => {
                    let mut b = Int8Builder::with_capacity(ints.len());
                    ints.iter().for_each(|v| b.append_option(v.map(|v| v as i8)));
                    Arc::new(b.finish())
                }
                IntegerWidth::SmallInt => {
                    let mut b = Int16Builder::with_capacity(ints.len());
                    ints.iter().for_each(|v| b.append_option(v.map(|v| v as i16)));
                    Arc::new(b.finish())
                }
                IntegerWidth::Int => {
                    let mut b = Int32Builder::with_capacity(ints.len());
                    ints.iter().for_each(|v| b.append_option(v.map(|v| v as i32)));
                    Arc::new(b.finish())
                }
                IntegerWidth::BigInt => {
                    let mut b = Int64Builder::with_capacity(ints.len());
                    ints.iter().for_each(|v| b.append_option(*v));
                    Arc::new(b.finish())
                }
            };
            Ok(array)
        }
        ColumnType::Float => {
            let mut builder = Float32Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Float32(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(column_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        ColumnType::Double => {
            let mut builder = Float64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Float64(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(column_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        ColumnType::String => {
            let mut builder = StringBuilder::new();
            for value in values {
                match value {
                    Some(AggScalarValue::Utf8(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(column_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        ColumnType::Binary => {
            let mut builder = BinaryBuilder::new();
            for value in values {
                match value {
                    Some(AggScalarValue::Binary(v)) => builder.append_value(v),
                    None => builder.append_null(),
                    Some(other) => return Err(mismatch(column_type, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        ColumnType::Decimal { precision, scale } => {
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Decimal128 {
                        value,
                        scale: value_scale,
                        ..
                    }) => out.push(Some(rescale_i128(value, value_scale, *scale)?)),
                    None => out.push(None),
                    Some(other) => return Err(mismatch(column_type, &other)),
                }
            }
            let array = Decimal128Array::from(out)
                .with_precision_and_scale(*precision, *scale)
                .map_err(|e| e.to_string())?;
            Ok(Arc::new(array))
        }
        ColumnType::Date => {
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Date(v)) => out.push(Some(naive_to_date32(&v))),
                    None => out.push(None),
                    Some(other) => return Err(mismatch(column_type, &other)),
                }
            }
            Ok(Arc::new(Date32Array::from(out)))
        }
        ColumnType::Timestamp { precision } => {
            let unit = time_unit_for_precision(*precision);
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Some(AggScalarValue::Timestamp(v)) => {
                        out.push(Some(timestamp_to_units(&v, &unit)?))
                    }
                    None => out.push(None),
                    Some(other) => return Err(mismatch(column_type, &other)),
                }
            }
            let array: ArrayRef = match unit {
                TimeUnit::Second => Arc::new(TimestampSecondArray::from(out)),
                TimeUnit::Millisecond => Arc::new(TimestampMillisecondArray::from(out)),
                TimeUnit::Microsecond => Arc::new(TimestampMicrosecondArray::from(out)),
                TimeUnit::Nanosecond => Arc::new(TimestampNanosecondArray::from(out)),
            };
            Ok(array)
        }
        ColumnType::Array(_) | ColumnType::Map(_, _) | ColumnType::Row(_) => Err(format!(
            "cannot materialize complex aggregate column of type {}",
            column_type
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_parse_number_accepts_numeric_forms() {
        assert_eq!(try_parse_number("2"), Some(2.0));
        assert_eq!(try_parse_number("  -4.5 "), Some(-4.5));
        assert_eq!(try_parse_number("1e3"), Some(1000.0));
        assert_eq!(try_parse_number(".5"), Some(0.5));
        assert_eq!(try_parse_number("3."), Some(3.0));
        assert_eq!(try_parse_number("2.5d"), Some(2.5));
        assert_eq!(try_parse_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert!(try_parse_number("NaN").is_some_and(f64::is_nan));
    }

    #[test]
    fn test_try_parse_number_rejects_garbage() {
        for text in ["b", "", "  ", "1,5", "inf", "infinity", "0x10", "1e", "--1", "1.2.3"] {
            assert_eq!(try_parse_number(text), None, "input {text:?}");
        }
    }

    #[test]
    fn test_display_matches_reference_rendering() {
        let ts = NaiveDate::from_ymd_opt(2021, 8, 4)
            .unwrap()
            .and_hms_milli_opt(16, 26, 33, 400)
            .unwrap();
        assert_eq!(AggScalarValue::Timestamp(ts).to_string(), "2021-08-04T16:26:33.400");
        assert_eq!(AggScalarValue::Float64(6.0).to_string(), "6.0");
        assert_eq!(AggScalarValue::Float32(1.2).to_string(), "1.2");
        assert_eq!(
            AggScalarValue::Binary(b"data1".to_vec()).to_string(),
            "[100, 97, 116, 97, 49]"
        );
        assert_eq!(
            AggScalarValue::Date(NaiveDate::from_ymd_opt(2021, 8, 1).unwrap()).to_string(),
            "2021-08-01"
        );
    }

    #[test]
    fn test_display_switches_to_scientific_outside_plain_range() {
        assert_eq!(AggScalarValue::Float64(12_345_678.0).to_string(), "1.2345678E7");
        assert_eq!(AggScalarValue::Float64(1e7).to_string(), "1.0E7");
        assert_eq!(AggScalarValue::Float64(1e20).to_string(), "1.0E20");
        assert_eq!(AggScalarValue::Float64(0.0001).to_string(), "1.0E-4");
        assert_eq!(AggScalarValue::Float64(-2.5e-7).to_string(), "-2.5E-7");
        assert_eq!(AggScalarValue::Float64(0.001).to_string(), "0.001");
        assert_eq!(AggScalarValue::Float64(9_999_999.0).to_string(), "9999999.0");
        assert_eq!(AggScalarValue::Float64(0.0).to_string(), "0.0");
        assert_eq!(AggScalarValue::Float32(3.0e10).to_string(), "3.0E10");
        assert_eq!(AggScalarValue::Float64(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(AggScalarValue::Float64(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_decimal_hash_agrees_with_eq_for_negative_scale() {
        use std::collections::hash_map::DefaultHasher;
        fn hash_of(v: &AggScalarValue) -> u64 {
            let mut hasher = DefaultHasher::new();
            v.hash(&mut hasher);
            hasher.finish()
        }
        let coarse = AggScalarValue::Decimal128 { value: 1, precision: 5, scale: -1 };
        let plain = AggScalarValue::Decimal128 { value: 10, precision: 5, scale: 0 };
        let fine = AggScalarValue::Decimal128 { value: 1_000, precision: 6, scale: 2 };
        assert_eq!(coarse, plain);
        assert_eq!(hash_of(&coarse), hash_of(&plain));
        assert_eq!(hash_of(&plain), hash_of(&fine));
    }

    #[test]
    fn test_compare_total_orders() {
        use AggScalarValue as V;
        assert_eq!(
            compare_scalar_values(&V::Bool(false), &V::Bool(true)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare_scalar_values(&V::Binary(vec![0x80]), &V::Binary(vec![0x7f])).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            compare_scalar_values(&V::Float64(f64::NAN), &V::Float64(f64::INFINITY)).unwrap(),
            Ordering::Greater
        );
        let a = V::Decimal128 { value: 150, precision: 10, scale: 2 };
        let b = V::Decimal128 { value: 1_500, precision: 10, scale: 3 };
        assert_eq!(compare_scalar_values(&a, &b).unwrap(), Ordering::Equal);
        assert_eq!(a, b);
        assert!(compare_scalar_values(&V::Int64(1), &V::Utf8("1".into())).is_err());
    }

    #[test]
    fn test_timestamp_array_round_trip_keeps_nanos() {
        let ts = NaiveDate::from_ymd_opt(2021, 8, 6)
            .unwrap()
            .and_hms_nano_opt(16, 26, 33, 400_000_001)
            .unwrap();
        let array = build_scalar_array(
            &ColumnType::timestamp(),
            vec![Some(AggScalarValue::Timestamp(ts)), None],
        )
        .unwrap();
        assert_eq!(
            scalar_from_array(&array, 0).unwrap(),
            Some(AggScalarValue::Timestamp(ts))
        );
        assert_eq!(scalar_from_array(&array, 1).unwrap(), None);
    }

    #[test]
    fn test_boolean_array_values_are_read_back() {
        let array: ArrayRef = Arc::new(BooleanArray::from(vec![Some(true), None, Some(false)]));
        assert_eq!(scalar_from_array(&array, 0).unwrap(), Some(AggScalarValue::Bool(true)));
        assert_eq!(scalar_from_array(&array, 1).unwrap(), None);
        assert_eq!(scalar_from_array(&array, 2).unwrap(), Some(AggScalarValue::Bool(false)));
    }

    #[test]
    fn test_normalize_rescales_decimal_up_only() {
        let ty = ColumnType::decimal(10, 5);
        let v = AggScalarValue::Decimal128 { value: 111, precision: 3, scale: 2 };
        assert_eq!(
            normalize_scalar(&ty, &v).unwrap().to_string(),
            "1.11000"
        );
        let too_fine = AggScalarValue::Decimal128 { value: 1, precision: 7, scale: 6 };
        assert!(normalize_scalar(&ty, &too_fine).is_err());
        assert!(normalize_scalar(&ty, &AggScalarValue::Int64(1)).is_err());
    }

    #[test]
    fn test_integer_width_is_range_checked() {
        let err = build_scalar_array(
            &ColumnType::Integer(IntegerWidth::TinyInt),
            vec![Some(AggScalarValue::Int64(300))],
        )
        .unwrap_err();
        assert!(err.contains("TINYINT overflow"));
    }
}
