//! JSON output: the validation report exactly as persisted.

use shipcheck_core::report::ValidationContext;

#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, report: &ValidationContext) -> serde_json::Result<String> {
        let mut rendered = serde_json::to_string_pretty(report)?;
        rendered.push('\n');
        Ok(rendered)
    }
}
