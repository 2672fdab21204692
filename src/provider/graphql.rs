//! GraphQL name validation shared by the AppSync adapters

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static NAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn name_pattern() -> &'static Regex {
    NAME_PATTERN.get_or_init(|| Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").expect("valid regex"))
}

/// A GraphQL type, field or data source name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GraphQlName(String);

impl GraphQlName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GraphQlName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if name_pattern().is_match(&value) {
            Ok(Self(value))
        } else {
            Err(format!("{:?} must match [_A-Za-z][_0-9A-Za-z]*", value))
        }
    }
}

impl From<GraphQlName> for String {
    fn from(name: GraphQlName) -> Self {
        name.0
    }
}

impl fmt::Display for GraphQlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
