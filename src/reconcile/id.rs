//! Composite-ID codec
//!
//! Remote APIs key some resources by several values (API ID + type name +
//! field name), while the provider state keeps a single flat identifier.
//! These helpers join and split those identifiers.

use crate::error::{Error, Result};

/// Join `parts` with `delimiter`.
///
/// Fails with [`Error::InvalidPart`] when any part contains the delimiter,
/// since the result could not be decoded back into the same parts.
pub fn encode<S: AsRef<str>>(delimiter: char, parts: &[S]) -> Result<String> {
    let mut id = String::new();
    for (i, part) in parts.iter().enumerate() {
        let part = part.as_ref();
        if part.contains(delimiter) {
            return Err(Error::InvalidPart {
                part: part.to_string(),
                delimiter,
            });
        }
        if i > 0 {
            id.push(delimiter);
        }
        id.push_str(part);
    }
    Ok(id)
}

/// Split `id` on the first `expected - 1` occurrences of `delimiter`.
///
/// The last part keeps any further delimiters, e.g. `decode('-', "a-b-c", 2)`
/// yields `["a", "b-c"]`.
pub fn decode(delimiter: char, id: &str, expected: usize) -> Result<Vec<String>> {
    let parts: Vec<String> = id.splitn(expected, delimiter).map(String::from).collect();
    if expected == 0 || parts.len() != expected {
        return Err(Error::MalformedId {
            id: id.to_string(),
            expected,
            delimiter,
        });
    }
    Ok(parts)
}

/// Static description of one resource kind's composite ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdScheme {
    pub resource_type: &'static str,
    pub delimiter: char,
    pub parts: &'static [&'static str],
}

pub const APPSYNC_RESOLVER: IdScheme = IdScheme {
    resource_type: "aws_appsync_resolver",
    delimiter: '-',
    parts: &["api_id", "type_name", "field_name"],
};

pub const APPSYNC_FUNCTION: IdScheme = IdScheme {
    resource_type: "aws_appsync_function",
    delimiter: '-',
    parts: &["api_id", "function_id"],
};

pub const APIGATEWAYV2_STAGE: IdScheme = IdScheme {
    resource_type: "aws_apigatewayv2_stage",
    delimiter: '/',
    parts: &["api_id", "name"],
};

/// All known schemes, for lookup by resource type
pub const SCHEMES: &[IdScheme] = &[APPSYNC_RESOLVER, APPSYNC_FUNCTION, APIGATEWAYV2_STAGE];

/// Find the scheme registered for a resource type
pub fn scheme_for(resource_type: &str) -> Option<&'static IdScheme> {
    SCHEMES.iter().find(|s| s.resource_type == resource_type)
}

impl IdScheme {
    /// Human-readable format, e.g. `api_id-type_name-field_name`
    pub fn format(&self) -> String {
        self.parts.join(&self.delimiter.to_string())
    }

    pub fn encode<S: AsRef<str>>(&self, parts: &[S]) -> Result<String> {
        if parts.len() != self.parts.len() {
            return Err(Error::MalformedId {
                id: parts
                    .iter()
                    .map(|p| p.as_ref())
                    .collect::<Vec<_>>()
                    .join(&self.delimiter.to_string()),
                expected: self.parts.len(),
                delimiter: self.delimiter,
            });
        }
        encode(self.delimiter, parts)
    }

    pub fn decode(&self, id: &str) -> Result<Vec<String>> {
        decode(self.delimiter, id, self.parts.len())
    }

    /// Decode into `(part name, value)` pairs
    pub fn decode_named(&self, id: &str) -> Result<Vec<(&'static str, String)>> {
        Ok(self.parts.iter().copied().zip(self.decode(id)?).collect())
    }
}
