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

use crate::common::types::MAX_DECIMAL_PRECISION;

use super::functions::common::AggScalarValue;

/// Result precision of SUM over DECIMAL(p, s): ten extra integral digits, capped.
pub(super) fn sum_result_precision(precision: u8) -> u8 {
    precision.saturating_add(10).min(MAX_DECIMAL_PRECISION)
}

/// Compute 10^exp in i256 with overflow checking.
pub(super) fn pow10_i256(exp: usize) -> Result<i256, String> {
    let mut out = i256::ONE;
    let ten = i256::from_i128(10);
    for _ in 0..exp {
        out = out
            .checked_mul(ten)
            .ok_or_else(|| "decimal overflow".to_string())?;
    }
    Ok(out)
}

/// Whether `value` has at most `precision` digits.
pub(super) fn fits_precision(value: i256, precision: u8) -> Result<bool, String> {
    let bound = pow10_i256(precision as usize)?;
    Ok(value < bound && value > bound.wrapping_neg())
}

/// Exact upward rescale; dropping digits is refused.
pub(crate) fn rescale_i128(value: i128, from_scale: i8, to_scale: i8) -> Result<i128, String> {
    if from_scale == to_scale {
        return Ok(value);
    }
    if from_scale > to_scale {
        return Err(format!(
            "decimal scale {} cannot be narrowed to {} without rounding",
            from_scale, to_scale
        ));
    }
    let mut out = value;
    for _ in from_scale..to_scale {
        out = out
            .checked_mul(10)
            .ok_or_else(|| "decimal overflow".to_string())?;
    }
    Ok(out)
}

pub(crate) fn format_decimal(value: i128, scale: i8) -> String {
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    if scale <= 0 {
        return format!("{sign}{digits}");
    }
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{sign}{int_part}.{frac_part}")
}

/// Parse a decimal literal into DECIMAL(precision, scale).
///
/// Extra fractional digits round half up; too many integral digits is an error.
pub fn parse_decimal(text: &str, precision: u8, scale: i8) -> Result<AggScalarValue, String> {
    if scale < 0 || scale as u8 > precision || precision > MAX_DECIMAL_PRECISION {
        return Err(format!("invalid decimal type DECIMAL({precision}, {scale})"));
    }
    let trimmed = text.trim();
    let (negative, body) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if (int_part.is_empty() && frac_part.is_empty())
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(format!("invalid decimal literal: {text}"));
    }

    let int_part = int_part.trim_start_matches('0');
    let max_int_digits = (precision - scale as u8) as usize;
    if int_part.len() > max_int_digits {
        return Err(format!(
            "decimal literal {text} exceeds DECIMAL({precision}, {scale})"
        ));
    }

    let scale_digits = scale as usize;
    let mut unscaled: i128 = 0;
    for b in int_part.bytes().chain(
        frac_part
            .bytes()
            .chain(std::iter::repeat(b'0'))
            .take(scale_digits),
    ) {
        unscaled = unscaled * 10 + i128::from(b - b'0');
    }
    if frac_part.len() > scale_digits && frac_part.as_bytes()[scale_digits] >= b'5' {
        unscaled += 1;
        let bound = pow10_i256(precision as usize)?;
        if i256::from_i128(unscaled) >= bound {
            return Err(format!(
                "decimal literal {text} exceeds DECIMAL({precision}, {scale})"
            ));
        }
    }
    if negative {
        unscaled = -unscaled;
    }
    Ok(AggScalarValue::Decimal128 {
        value: unscaled,
        precision,
        scale,
    })
}
