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
//! Native Hive-compatible SUM/MIN/MAX aggregation.
//!
//! Aggregate calls are classified once at plan time ([`register`],
//! [`GroupedAggregator::new`]); rejected calls carry the exact user-facing
//! messages of the Hive dialect. Execution is row or arrow-chunk oriented and
//! supports combining partial aggregators of the same node.

pub mod common;
pub mod exec;

pub use common::app_config as hiveagg_config;
pub use common::logging as hiveagg_logging;

pub use common::types::{ColumnType, IntegerWidth, RowField};
pub use exec::expr::agg::error::{AggError, NATIVE_AGG_FUNCTION_OPTION};
pub use exec::expr::agg::{
    AggAccumulator, AggKernelEntry, AggKernelSet, AggKind, AggScalarValue, AggSpec, AggState,
    build_kernel_set, classify, parse_decimal, register, try_parse_number,
};
pub use exec::node::aggregate::{AggFunction, AggregateNode, GroupByColumn};
pub use exec::operators::{AggRow, AggregatePhase, GroupKey, GroupedAggregator};
