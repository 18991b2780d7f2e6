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
mod common;

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Decimal128Array, Float32Array, Float64Array, Int32Array, Int64Array,
    RecordBatch, StringArray, TimestampNanosecondArray,
};
use arrow::datatypes::DataType;

use hiveagg::{
    AggError, AggFunction, AggScalarValue, AggregateNode, ColumnType, GroupedAggregator,
    NATIVE_AGG_FUNCTION_OPTION, register,
};

use common::{batch, render_rows, setup};

// x string, y string, z int, d decimal(10,5), e float, f double, ts timestamp
fn test_sum_table() -> RecordBatch {
    let nanos = |day: i64| (1_627_950_000 + day * 86_400) * 1_000_000_000;
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![None::<&str>, None, None, None])),
        Arc::new(StringArray::from(vec![Some("2"), Some("b"), Some("4"), None])),
        Arc::new(Int32Array::from(vec![1, 2, 3, 4])),
        Arc::new(
            Decimal128Array::from(vec![111_000, 222_000, 333_000, 445_000])
                .with_precision_and_scale(10, 5)
                .unwrap(),
        ),
        Arc::new(Float32Array::from(vec![1.2f32, 2.3, 3.5, 4.7])),
        Arc::new(Float64Array::from(vec![1.3, 2.4, 3.6, 4.8])),
        Arc::new(TimestampNanosecondArray::from(vec![
            nanos(0),
            nanos(3),
            nanos(4),
            nanos(5),
        ])),
    ];
    batch(columns)
}

fn column_type(idx: usize) -> ColumnType {
    match idx {
        0 | 1 => ColumnType::String,
        2 => ColumnType::int(),
        3 => ColumnType::decimal(10, 5),
        4 => ColumnType::Float,
        5 => ColumnType::Double,
        _ => ColumnType::timestamp(),
    }
}

fn select_sums(columns: &[usize]) -> Result<String, AggError> {
    let mut node = AggregateNode::new(1);
    for idx in columns {
        node = node.function(AggFunction::new("sum", *idx, column_type(*idx)));
    }
    let mut agg = GroupedAggregator::new(&node)?;
    agg.update_chunk(&test_sum_table())?;
    Ok(render_rows(&agg.finish()?))
}

#[test]
fn test_sum_all_null_column_is_null() {
    let _cfg = setup();
    assert_eq!(select_sums(&[0]).unwrap(), "[+I[null]]");
}

#[test]
fn test_sum_string_promotes_to_double() {
    let _cfg = setup();
    assert_eq!(select_sums(&[1]).unwrap(), "[+I[6.0]]");
}

#[test]
fn test_sum_decimal_keeps_scale() {
    let _cfg = setup();
    assert_eq!(select_sums(&[3]).unwrap(), "[+I[11.11000]]");
}

#[test]
fn test_sum_int_is_bigint() {
    let _cfg = setup();
    assert_eq!(select_sums(&[2]).unwrap(), "[+I[10]]");

    let node = AggregateNode::new(1).function(AggFunction::new("sum", 2, ColumnType::int()));
    let mut agg = GroupedAggregator::new(&node).unwrap();
    agg.update_chunk(&test_sum_table()).unwrap();
    let out = agg.finish_chunk().unwrap();
    assert_eq!(out.schema().field(0).data_type(), &DataType::Int64);
    let sums = out.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(sums.value(0), 10);
}

#[test]
fn test_sum_float_and_double() {
    let _cfg = setup();
    let node = AggregateNode::new(1)
        .function(AggFunction::new("sum", 4, ColumnType::Float))
        .function(AggFunction::new("sum", 5, ColumnType::Double));
    let mut agg = GroupedAggregator::new(&node).unwrap();
    agg.update_chunk(&test_sum_table()).unwrap();
    let rows = agg.finish().unwrap();
    let as_f32 = |v: &Option<AggScalarValue>| match v {
        Some(AggScalarValue::Float64(v)) => *v as f32,
        other => panic!("expected double, got {other:?}"),
    };
    assert_eq!(as_f32(&rows[0][0]), 11.7f32);
    assert_eq!(as_f32(&rows[0][1]), 12.1f32);
}

#[test]
fn test_multiple_sums_are_independent() {
    let _cfg = setup();
    assert_eq!(select_sums(&[1, 2]).unwrap(), "[+I[6.0, 10]]");
    assert_eq!(select_sums(&[2, 1]).unwrap(), "[+I[10, 6.0]]");
    assert_eq!(
        select_sums(&[3, 1, 2]).unwrap(),
        "[+I[11.11000, 6.0, 10]]"
    );
}

#[test]
fn test_sum_timestamp_is_rejected_at_registration() {
    let _cfg = setup();
    let err = select_sums(&[6]).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Native hive sum aggregate function does not support type: TIMESTAMP(9). \
             Please set option '{}' to false.",
            NATIVE_AGG_FUNCTION_OPTION
        )
    );
    assert!(matches!(err, AggError::UnsupportedAggregateType(_)));
}

#[test]
fn test_sum_rejections_name_the_declared_type() {
    let _cfg = setup();
    let cases = [
        (ColumnType::Boolean, "BOOLEAN"),
        (ColumnType::Date, "DATE"),
        (ColumnType::Binary, "BYTES"),
        (ColumnType::array(ColumnType::int()), "ARRAY<INT>"),
        (
            ColumnType::map(ColumnType::int(), ColumnType::String),
            "MAP<INT, STRING>",
        ),
        (
            ColumnType::row(vec![("f1", ColumnType::int()), ("f2", ColumnType::String)]),
            "ROW<`f1` INT, `f2` STRING>",
        ),
    ];
    for (ty, name) in cases {
        let err = register("sum", &ty).unwrap_err();
        assert!(
            err.message()
                .starts_with(&format!("Native hive sum aggregate function does not support type: {name}.")),
            "{}",
            err
        );
    }
}

#[test]
fn test_sum_decimal_output_column_widens_precision() {
    let _cfg = setup();
    let node = AggregateNode::new(1).function(AggFunction::new("sum", 3, ColumnType::decimal(10, 5)));
    let mut agg = GroupedAggregator::new(&node).unwrap();
    agg.update_chunk(&test_sum_table()).unwrap();
    let out = agg.finish_chunk().unwrap();
    let sums = out
        .column(0)
        .as_any()
        .downcast_ref::<Decimal128Array>()
        .unwrap();
    assert_eq!(sums.precision(), 20);
    assert_eq!(sums.scale(), 5);
    assert_eq!(sums.value_as_string(0), "11.11000");
}

#[test]
fn test_native_agg_option_comes_from_config() {
    let cfg = setup();
    assert!(cfg.load_config().unwrap().agg.native_agg_function_enabled);
    assert!(hiveagg::common::config::native_agg_function_enabled());
}
