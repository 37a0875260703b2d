//! Parameterized commands issued against the row store

use crate::value::Value;
use std::fmt;

/// A stored procedure call with named parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    procedure: &'static str,
    params: Vec<(&'static str, Value)>,
}

impl Command {
    /// Call `procedure` with no parameters
    pub fn procedure(procedure: &'static str) -> Self {
        Command {
            procedure,
            params: Vec::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    /// Procedure name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.procedure
    }

    /// Parameters in the order they were added
    #[inline]
    pub fn params(&self) -> &[(&'static str, Value)] {
        &self.params
    }

    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EXEC {}", self.procedure)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{name} = {value}")?;
        }
        Ok(())
    }
}
