//! 출력 형식.

use anyhow::{Context, Result};
use serde::Serialize;

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("Invalid format: {}. Use: table, json", s)),
        }
    }
}

/// JSON 형식 출력.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

/// 헤더와 구분선.
pub(crate) fn table_header(columns: &str) -> String {
    let mut output = String::new();
    output.push_str(columns);
    output.push('\n');
    output.push_str(&"-".repeat(columns.trim_end().len()));
    output.push('\n');
    output
}
