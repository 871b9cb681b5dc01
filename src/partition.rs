//! Input/output partition of the propositions.
//!
//! The partition file has two sections, one per line:
//!
//! ```text
//! .inputs: a b c
//! .outputs: x y
//! ```
//!
//! Inputs are controlled by the environment, outputs by the system. Every
//! atom of the formula must be declared in exactly one section.

use std::path::Path;

use crate::error::SynthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl Partition {
    pub fn new(inputs: Vec<String>, outputs: Vec<String>) -> Self {
        Self { inputs, outputs }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SynthError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, SynthError> {
        let mut inputs = None;
        let mut outputs = None;
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix(".inputs:") {
                if inputs.replace(split_names(rest)).is_some() {
                    return Err(SynthError::Partition {
                        line,
                        msg: "duplicate .inputs section".into(),
                    });
                }
            } else if let Some(rest) = trimmed.strip_prefix(".outputs:") {
                if outputs.replace(split_names(rest)).is_some() {
                    return Err(SynthError::Partition {
                        line,
                        msg: "duplicate .outputs section".into(),
                    });
                }
            } else {
                return Err(SynthError::Partition {
                    line,
                    msg: format!("expected '.inputs:' or '.outputs:', got '{trimmed}'"),
                });
            }
        }
        let inputs = inputs.ok_or_else(|| SynthError::Partition {
            line: 0,
            msg: "missing .inputs section".into(),
        })?;
        let outputs = outputs.ok_or_else(|| SynthError::Partition {
            line: 0,
            msg: "missing .outputs section".into(),
        })?;
        Ok(Self::new(inputs, outputs))
    }

    pub fn is_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|n| n == name)
    }

    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|n| n == name)
    }
}

fn split_names(rest: &str) -> Vec<String> {
    rest.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn parses_both_sections() {
        let p = Partition::parse(".inputs: a b\n.outputs: x\n").unwrap();
        assert_eq!(p.inputs, vec!["a", "b"]);
        assert_eq!(p.outputs, vec!["x"]);
        assert!(p.is_input("a"));
        assert!(p.is_output("x"));
        assert!(!p.is_output("a"));
    }

    #[test]
    fn order_and_blank_lines_are_tolerated() {
        let p = Partition::parse("\n.outputs: x y\n\n.inputs: a\n").unwrap();
        assert_eq!(p.inputs, vec!["a"]);
        assert_eq!(p.outputs, vec!["x", "y"]);
    }

    #[test]
    fn sections_may_be_empty() {
        let p = Partition::parse(".inputs:\n.outputs: x\n").unwrap();
        assert!(p.inputs.is_empty());
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = Partition::parse(".inputs: a\ngarbage\n").unwrap_err();
        assert!(matches!(err, SynthError::Partition { line: 2, .. }));

        let err = Partition::parse(".inputs: a\n.inputs: b\n.outputs: x\n").unwrap_err();
        assert!(matches!(err, SynthError::Partition { line: 2, .. }));

        let err = Partition::parse(".inputs: a\n").unwrap_err();
        assert!(matches!(err, SynthError::Partition { line: 0, .. }));
    }
}
