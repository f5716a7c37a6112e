//! What a plugin handler sees while executing one statement.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::ast::Statement;
use crate::error::{ContextError, PluginError};
use crate::plugin::{OpenConnect, PluginResult};

/// A statement bound to a snapshot of the data scope.
///
/// Parameters are sent by name: `send path 'file'` binds `path` to whatever
/// `data["file"]` holds when the statement runs.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    statement: Statement,
    data: Map<String, Value>,
}

impl ExecutionContext {
    pub fn new(statement: Statement, data: Map<String, Value>) -> Self {
        ExecutionContext { statement, data }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Optional parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let key = self.statement.bindings.get(name)?;
        self.data.get(key)
    }

    /// Required parameter.
    pub fn fetch(&self, name: &str) -> Result<&Value, ContextError> {
        self.get(name)
            .ok_or_else(|| ContextError::MissingParam(name.to_string()))
    }

    /// Optional parameter, deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ContextError> {
        self.get(name)
            .map(|value| deserialize(name, value))
            .transpose()
    }

    /// Required parameter, deserialized into `T`.
    pub fn fetch_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, ContextError> {
        deserialize(name, self.fetch(name)?)
    }

    /// Targets of an `open '<ident>' and` clause.
    pub fn fetch_open(&self) -> Result<Vec<String>, ContextError> {
        self.targets(OpenConnect::Open)
    }

    /// Targets of a `connect to '<ident>' and` clause.
    pub fn fetch_connect(&self) -> Result<Vec<String>, ContextError> {
        self.targets(OpenConnect::Connect)
    }

    pub fn pass(&self, value: impl Into<Value>) -> PluginResult {
        Ok(value.into())
    }

    pub fn fail(&self, error: impl Into<PluginError>) -> PluginResult {
        Err(error.into())
    }

    /// The clause identifier names a data key holding either one target or
    /// a list of them.
    fn targets(&self, mode: OpenConnect) -> Result<Vec<String>, ContextError> {
        let clause = mode.keyword().unwrap_or("open");
        let target = match (&self.statement.open_connect, self.statement.mode == mode) {
            (Some(target), true) => target,
            _ => return Err(ContextError::MissingTarget(clause)),
        };
        let invalid = || ContextError::InvalidTarget {
            clause,
            target: target.clone(),
        };

        match self.data.get(target) {
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect(),
            _ => Err(invalid()),
        }
    }
}

fn deserialize<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, ContextError> {
    serde_json::from_value(value.clone()).map_err(|e| ContextError::WrongType {
        name: name.to_string(),
        message: e.to_string(),
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
