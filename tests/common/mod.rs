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
//! Common utilities and helpers for integration tests.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch};
use arrow::datatypes::{Field, Schema};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use hiveagg::{AggRow, AggScalarValue, hiveagg_config, hiveagg_logging, parse_decimal};

/// Test configuration for integration tests.
pub struct TestConfig {
    /// Temporary directory for test artifacts
    pub temp_dir: TempDir,
    /// Test config path
    pub config_path: PathBuf,
}

impl TestConfig {
    /// Create a new test configuration with native aggregation enabled.
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let config_path = temp_dir.path().join("test_hiveagg.toml");

        let config_content = r#"
log_level = "debug"

[agg]
native_agg_function_enabled = true
group_table_initial_capacity = 16
"#;

        std::fs::write(&config_path, config_content)?;

        Ok(Self {
            temp_dir,
            config_path,
        })
    }

    /// Initialize logging for tests.
    pub fn init_logging(&self) {
        hiveagg_logging::init_with_level("debug");
    }

    /// Load the test configuration.
    pub fn load_config(&self) -> anyhow::Result<&'static hiveagg_config::HiveAggConfig> {
        hiveagg_config::init_from_path(&self.config_path)
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::new().expect("Failed to create test config")
    }
}

/// Load the shared test config and logging once per test binary.
pub fn setup() -> TestConfig {
    let cfg = TestConfig::default();
    cfg.load_config().expect("load test config");
    cfg.init_logging();
    cfg
}

pub fn int(v: i64) -> Option<AggScalarValue> {
    Some(AggScalarValue::Int64(v))
}

pub fn text(v: &str) -> Option<AggScalarValue> {
    Some(AggScalarValue::Utf8(v.to_string()))
}

pub fn dec(text: &str, precision: u8, scale: i8) -> Option<AggScalarValue> {
    Some(parse_decimal(text, precision, scale).expect("valid decimal literal"))
}

pub fn ts(text: &str) -> Option<AggScalarValue> {
    let value = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").expect("timestamp");
    Some(AggScalarValue::Timestamp(value))
}

pub fn date(text: &str) -> Option<AggScalarValue> {
    let value = NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("date");
    Some(AggScalarValue::Date(value))
}

/// Render rows the way the reference dialect prints a result set.
pub fn render_rows(rows: &[AggRow]) -> String {
    let rendered = rows
        .iter()
        .map(|row| {
            let fields = row
                .iter()
                .map(|v| v.as_ref().map_or_else(|| "null".to_string(), |v| v.to_string()))
                .collect::<Vec<_>>();
            format!("+I[{}]", fields.join(", "))
        })
        .collect::<Vec<_>>();
    format!("[{}]", rendered.join(", "))
}

/// Build a batch with nullable columns named c0, c1, ...
pub fn batch(columns: Vec<ArrayRef>) -> RecordBatch {
    let fields = columns
        .iter()
        .enumerate()
        .map(|(idx, c)| Field::new(format!("c{idx}"), c.data_type().clone(), true))
        .collect::<Vec<_>>();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).expect("record batch")
}
