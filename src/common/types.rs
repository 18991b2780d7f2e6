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
//! Column type model for native aggregate classification.
//!
//! `ColumnType` is a closed set: every declared input type of an aggregate call
//! is one of these variants, and the classifier matches on it exhaustively.
//! The `Display` form follows the reference dialect's logical type names since
//! they appear verbatim in user-facing error messages.

use std::fmt;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Fields, TimeUnit};

pub const MAX_DECIMAL_PRECISION: u8 = 38;
pub const DEFAULT_TIMESTAMP_PRECISION: u8 = 9;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum IntegerWidth {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
}

impl IntegerWidth {
    pub fn bits(self) -> u8 {
        match self {
            IntegerWidth::TinyInt => 8,
            IntegerWidth::SmallInt => 16,
            IntegerWidth::Int => 32,
            IntegerWidth::BigInt => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntegerWidth::TinyInt => "TINYINT",
            IntegerWidth::SmallInt => "SMALLINT",
            IntegerWidth::Int => "INT",
            IntegerWidth::BigInt => "BIGINT",
        }
    }

    /// Inclusive value range representable by this width.
    pub fn range(self) -> (i64, i64) {
        match self {
            IntegerWidth::TinyInt => (i8::MIN as i64, i8::MAX as i64),
            IntegerWidth::SmallInt => (i16::MIN as i64, i16::MAX as i64),
            IntegerWidth::Int => (i32::MIN as i64, i32::MAX as i64),
            IntegerWidth::BigInt => (i64::MIN, i64::MAX),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RowField {
    pub name: String,
    pub data_type: ColumnType,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ColumnType {
    Integer(IntegerWidth),
    Decimal { precision: u8, scale: i8 },
    Float,
    Double,
    String,
    Boolean,
    Timestamp { precision: u8 },
    Date,
    Binary,
    Array(Box<ColumnType>),
    Map(Box<ColumnType>, Box<ColumnType>),
    Row(Vec<RowField>),
}

impl ColumnType {
    pub fn int() -> Self {
        ColumnType::Integer(IntegerWidth::Int)
    }

    pub fn bigint() -> Self {
        ColumnType::Integer(IntegerWidth::BigInt)
    }

    pub fn decimal(precision: u8, scale: i8) -> Self {
        ColumnType::Decimal { precision, scale }
    }

    /// Hive `timestamp` columns carry nanosecond precision.
    pub fn timestamp() -> Self {
        ColumnType::Timestamp {
            precision: DEFAULT_TIMESTAMP_PRECISION,
        }
    }

    pub fn array(element: ColumnType) -> Self {
        ColumnType::Array(Box::new(element))
    }

    pub fn map(key: ColumnType, value: ColumnType) -> Self {
        ColumnType::Map(Box::new(key), Box::new(value))
    }

    pub fn row<S: Into<String>>(fields: Vec<(S, ColumnType)>) -> Self {
        ColumnType::Row(
            fields
                .into_iter()
                .map(|(name, data_type)| RowField {
                    name: name.into(),
                    data_type,
                })
                .collect(),
        )
    }

    /// Logical type root, e.g. `ROW` for any row type regardless of its fields.
    pub fn type_root(&self) -> &'static str {
        match self {
            ColumnType::Integer(IntegerWidth::TinyInt) => "TINYINT",
            ColumnType::Integer(IntegerWidth::SmallInt) => "SMALLINT",
            ColumnType::Integer(IntegerWidth::Int) => "INTEGER",
            ColumnType::Integer(IntegerWidth::BigInt) => "BIGINT",
            ColumnType::Decimal { .. } => "DECIMAL",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::String => "VARCHAR",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp { .. } => "TIMESTAMP_WITHOUT_TIME_ZONE",
            ColumnType::Date => "DATE",
            ColumnType::Binary => "VARBINARY",
            ColumnType::Array(_) => "ARRAY",
            ColumnType::Map(_, _) => "MAP",
            ColumnType::Row(_) => "ROW",
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            ColumnType::Array(_) | ColumnType::Map(_, _) | ColumnType::Row(_)
        )
    }

    /// True for MAP itself and for any array/row that nests a MAP at any depth.
    pub fn contains_map(&self) -> bool {
        match self {
            ColumnType::Map(_, _) => true,
            ColumnType::Array(element) => element.contains_map(),
            ColumnType::Row(fields) => fields.iter().any(|f| f.data_type.contains_map()),
            _ => false,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            ColumnType::Decimal { precision, scale } => {
                if *precision == 0 || *precision > MAX_DECIMAL_PRECISION {
                    return Err(format!("decimal precision out of range: {}", precision));
                }
                if *scale < 0 || *scale as u8 > *precision {
                    return Err(format!(
                        "decimal scale out of range: DECIMAL({}, {})",
                        precision, scale
                    ));
                }
                Ok(())
            }
            ColumnType::Timestamp { precision } if *precision > 9 => {
                Err(format!("timestamp precision out of range: {}", precision))
            }
            ColumnType::Array(element) => element.validate(),
            ColumnType::Map(key, value) => {
                key.validate()?;
                value.validate()
            }
            ColumnType::Row(fields) => fields.iter().try_for_each(|f| f.data_type.validate()),
            _ => Ok(()),
        }
    }

    pub fn to_arrow_type(&self) -> DataType {
        match self {
            ColumnType::Integer(IntegerWidth::TinyInt) => DataType::Int8,
            ColumnType::Integer(IntegerWidth::SmallInt) => DataType::Int16,
            ColumnType::Integer(IntegerWidth::Int) => DataType::Int32,
            ColumnType::Integer(IntegerWidth::BigInt) => DataType::Int64,
            ColumnType::Decimal { precision, scale } => DataType::Decimal128(*precision, *scale),
            ColumnType::Float => DataType::Float32,
            ColumnType::Double => DataType::Float64,
            ColumnType::String => DataType::Utf8,
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::Timestamp { precision } => {
                DataType::Timestamp(time_unit_for_precision(*precision), None)
            }
            ColumnType::Date => DataType::Date32,
            ColumnType::Binary => DataType::Binary,
            ColumnType::Array(element) => DataType::List(Arc::new(Field::new(
                "item",
                element.to_arrow_type(),
                true,
            ))),
            ColumnType::Map(key, value) => {
                let entries = Fields::from(vec![
                    Field::new("key", key.to_arrow_type(), false),
                    Field::new("value", value.to_arrow_type(), true),
                ]);
                DataType::Map(
                    Arc::new(Field::new("entries", DataType::Struct(entries), false)),
                    false,
                )
            }
            ColumnType::Row(fields) => DataType::Struct(Fields::from(
                fields
                    .iter()
                    .map(|f| Field::new(f.name.as_str(), f.data_type.to_arrow_type(), true))
                    .collect::<Vec<_>>(),
            )),
        }
    }

    pub fn from_arrow_type(data_type: &DataType) -> Result<Self, String> {
        let out = match data_type {
            DataType::Int8 => ColumnType::Integer(IntegerWidth::TinyInt),
            DataType::Int16 => ColumnType::Integer(IntegerWidth::SmallInt),
            DataType::Int32 => ColumnType::Integer(IntegerWidth::Int),
            DataType::Int64 => ColumnType::Integer(IntegerWidth::BigInt),
            DataType::Decimal128(precision, scale) => ColumnType::Decimal {
                precision: *precision,
                scale: *scale,
            },
            DataType::Float32 => ColumnType::Float,
            DataType::Float64 => ColumnType::Double,
            DataType::Utf8 | DataType::LargeUtf8 => ColumnType::String,
            DataType::Boolean => ColumnType::Boolean,
            DataType::Timestamp(unit, _) => ColumnType::Timestamp {
                precision: precision_for_time_unit(unit),
            },
            DataType::Date32 => ColumnType::Date,
            DataType::Binary | DataType::LargeBinary => ColumnType::Binary,
            DataType::List(field) | DataType::LargeList(field) => {
                ColumnType::array(ColumnType::from_arrow_type(field.data_type())?)
            }
            DataType::Map(entries, _) => match entries.data_type() {
                DataType::Struct(fields) if fields.len() == 2 => ColumnType::map(
                    ColumnType::from_arrow_type(fields[0].data_type())?,
                    ColumnType::from_arrow_type(fields[1].data_type())?,
                ),
                other => return Err(format!("map entries type mismatch: {:?}", other)),
            },
            DataType::Struct(fields) => ColumnType::Row(
                fields
                    .iter()
                    .map(|f| {
                        Ok(RowField {
                            name: f.name().clone(),
                            data_type: ColumnType::from_arrow_type(f.data_type())?,
                        })
                    })
                    .collect::<Result<Vec<_>, String>>()?,
            ),
            other => return Err(format!("unsupported arrow type: {:?}", other)),
        };
        Ok(out)
    }
}

pub(crate) fn time_unit_for_precision(precision: u8) -> TimeUnit {
    match precision {
        0 => TimeUnit::Second,
        1..=3 => TimeUnit::Millisecond,
        4..=6 => TimeUnit::Microsecond,
        _ => TimeUnit::Nanosecond,
    }
}

pub(crate) fn precision_for_time_unit(unit: &TimeUnit) -> u8 {
    match unit {
        TimeUnit::Second => 0,
        TimeUnit::Millisecond => 3,
        TimeUnit::Microsecond => 6,
        TimeUnit::Nanosecond => 9,
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer(width) => f.write_str(width.name()),
            ColumnType::Decimal { precision, scale } => {
                write!(f, "DECIMAL({}, {})", precision, scale)
            }
            ColumnType::Float => f.write_str("FLOAT"),
            ColumnType::Double => f.write_str("DOUBLE"),
            ColumnType::String => f.write_str("STRING"),
            ColumnType::Boolean => f.write_str("BOOLEAN"),
            ColumnType::Timestamp { precision } => write!(f, "TIMESTAMP({})", precision),
            ColumnType::Date => f.write_str("DATE"),
            ColumnType::Binary => f.write_str("BYTES"),
            ColumnType::Array(element) => write!(f, "ARRAY<{}>", element),
            ColumnType::Map(key, value) => write!(f, "MAP<{}, {}>", key, value),
            ColumnType::Row(fields) => {
                f.write_str("ROW<")?;
                for (idx, field) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "`{}` {}", field.name, field.data_type)?;
                }
                f.write_str(">")
            }
        }
    }
}
