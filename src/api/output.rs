//! Purpose: Normalized output-variable record produced from state extraction.
//! Exports: `Output`.
//! Role: Record collaborator for the output walk; values stay dynamically typed.
//! Invariants: The value is carried unchanged; rendering decides presentation.

use serde::Serialize;
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Output {
    pub name: String,
    pub value: Value,
}

impl Output {
    pub fn new(name: impl Into<String>, value: Value) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("output name is empty"));
        }
        Ok(Self { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::Output;
    use serde_json::json;

    #[test]
    fn builder_rejects_empty_name() {
        assert!(Output::new("", json!("x")).is_err());
    }

    #[test]
    fn builder_keeps_value_untouched() {
        let output = Output::new("port", json!(42)).expect("output");
        assert_eq!(output.value, json!(42));
    }
}
