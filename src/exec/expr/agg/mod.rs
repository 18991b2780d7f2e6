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
//! Native SUM/MIN/MAX aggregate kernels.
//!
//! Classification (`spec`) maps a function name and declared input type to an
//! [`AggKind`]; kernels dispatch per kind to static function objects that own
//! the update, merge and finalize semantics of each family.

mod views;
pub use views::*;
mod spec;
use spec::*;
pub use spec::{AggSpec, classify};
mod kernel;
pub use kernel::*;

mod state_types;
pub use state_types::AggState;
use state_types::*;
mod decimal;
pub use decimal::parse_decimal;
pub mod error;
mod functions;
pub use functions::AggKind;
pub use functions::common::{AggScalarValue, try_parse_number};
pub(crate) use functions::common::{
    build_scalar_array as build_agg_scalar_array, normalize_scalar as normalize_agg_scalar,
    scalar_from_array as agg_scalar_from_array,
};
