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
use crate::hiveagg_config::config as hiveagg_app_config;

/// Whether the executor should route SUM/MIN/MAX to the native engine.
pub fn native_agg_function_enabled() -> bool {
    hiveagg_app_config()
        .ok()
        .map(|c| c.agg.native_agg_function_enabled)
        .unwrap_or(false)
}

pub(crate) fn group_table_initial_capacity() -> usize {
    hiveagg_app_config()
        .ok()
        .map(|c| c.agg.group_table_initial_capacity)
        .unwrap_or(1024)
}
