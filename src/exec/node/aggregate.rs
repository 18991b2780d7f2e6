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
use crate::common::types::ColumnType;

#[derive(Clone, Debug, PartialEq)]
pub struct AggFunction {
    /// Function name as written in the query ("sum", "MIN", ...); matched case-insensitively.
    pub name: String,
    /// Column index of the aggregate argument in the input row or chunk.
    pub input: usize,
    /// Declared type of the argument column, known at plan time.
    pub input_type: ColumnType,
    /// Whether this aggregate consumes finalized partial results of an earlier stage.
    pub input_is_intermediate: bool,
    pub alias: Option<String>,
}

impl AggFunction {
    pub fn new(name: impl Into<String>, input: usize, input_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            input,
            input_type,
            input_is_intermediate: false,
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Same call, reading the partial outputs of an upstream aggregation instead of raw values.
    pub fn as_merge(mut self, input: usize) -> Self {
        self.input = input;
        self.input_is_intermediate = true;
        self
    }

    pub fn output_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| {
            format!("{}(${})", self.name.trim().to_ascii_lowercase(), self.input)
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupByColumn {
    pub input: usize,
    pub column_type: ColumnType,
    pub name: Option<String>,
}

impl GroupByColumn {
    pub fn new(input: usize, column_type: ColumnType) -> Self {
        Self {
            input,
            column_type,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn output_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("${}", self.input))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateNode {
    pub node_id: i32,
    /// Empty means a single implicit group.
    pub group_by: Vec<GroupByColumn>,
    pub functions: Vec<AggFunction>,
}

impl AggregateNode {
    pub fn new(node_id: i32) -> Self {
        Self {
            node_id,
            ..Self::default()
        }
    }

    pub fn group_by(mut self, column: GroupByColumn) -> Self {
        self.group_by.push(column);
        self
    }

    pub fn function(mut self, function: AggFunction) -> Self {
        self.functions.push(function);
        self
    }

    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }
}
