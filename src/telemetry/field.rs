// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lenient numeric field decoding.

use serde::Deserialize;

use crate::error::SchemaError;
use crate::types::PeripheralId;

/// A numeric field that the gateway may send as a JSON number or as a
/// string such as `"0.00"` or `"87%"`.
///
/// Anything else lands in `Other`, so an unexpected value never fails the
/// payload as a whole.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum FieldValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Other(serde_json::Value),
}

impl FieldValue {
    /// Returns the value as a float, accepting a trailing unit suffix on text.
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s
                .trim()
                .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%')
                .trim()
                .parse()
                .ok(),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Other(_) => None,
        }
    }

    /// Returns the value as a whole number, rejecting fractions.
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    pub(crate) fn as_i64(&self) -> Option<i64> {
        let value = self.as_f64()?;
        if !value.is_finite() || value.trunc() != value {
            return None;
        }
        Some(value as i64)
    }
}

/// Field lookup for one peripheral's payload.
///
/// Optional telemetry is lenient: a value that cannot be interpreted is
/// logged and read as absent. Only [`required_flag`](Self::required_flag)
/// produces [`SchemaError`]s.
pub(crate) struct FieldReader {
    id: PeripheralId,
}

impl FieldReader {
    pub(crate) fn new(id: PeripheralId) -> Self {
        Self { id }
    }

    fn discard<T>(&self, field: &str, value: &FieldValue, expected: &str) -> Option<T> {
        tracing::debug!(
            peripheral_id = %self.id,
            field,
            ?value,
            expected,
            "Ignoring uninterpretable telemetry field"
        );
        None
    }

    /// Reads an optional float.
    pub(crate) fn float(&self, field: &str, value: Option<&FieldValue>) -> Option<f64> {
        let value = value?;
        value
            .as_f64()
            .or_else(|| self.discard(field, value, "a number"))
    }

    /// Reads an optional integer that must fit in `T`.
    pub(crate) fn integer<T: TryFrom<i64>>(
        &self,
        field: &str,
        value: Option<&FieldValue>,
    ) -> Option<T> {
        let value = value?;
        value
            .as_i64()
            .and_then(|n| T::try_from(n).ok())
            .or_else(|| self.discard(field, value, "an integer in range"))
    }

    /// Reads an optional 0/1 flag.
    pub(crate) fn flag(&self, field: &str, value: Option<&FieldValue>) -> Option<bool> {
        self.integer::<i64>(field, value).map(|n| n != 0)
    }

    /// Reads an on/off flag the peripheral's state depends on.
    ///
    /// Absent is `None`; present but uninterpretable is an error.
    pub(crate) fn required_flag(
        &self,
        field: &str,
        value: Option<&FieldValue>,
    ) -> Result<Option<bool>, SchemaError> {
        value
            .map(|v| {
                v.as_i64()
                    .map(|n| n != 0)
                    .ok_or_else(|| SchemaError::InvalidValue {
                        id: self.id,
                        field: field.to_string(),
                        message: format!("expected a 0/1 flag, got {v:?}"),
                    })
            })
            .transpose()
    }

    /// Fails with `MissingField` naming every candidate when none was present.
    pub(crate) fn require<T>(&self, fields: &[&str], value: Option<T>) -> Result<T, SchemaError> {
        value.ok_or_else(|| SchemaError::MissingField {
            id: self.id,
            field: fields.join("|"),
        })
    }
}
