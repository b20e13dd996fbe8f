//! Log output format selection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported log output encodings.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,
    /// Structured JSON suitable for log collectors.
    Json,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
