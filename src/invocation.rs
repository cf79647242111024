//! Call identity types and argument handling.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DubboError, Result};

/// Immutable identity of a remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInvocationTarget {
    /// Fully qualified interface name, e.g. `com.x.UserService`.
    pub interface_name: String,
    /// Method name on the interface.
    pub method_name: String,
    /// Declared service version, e.g. `1.0.0`.
    pub service_version: String,
    /// Optional service group.
    pub group: Option<String>,
}

impl ServiceInvocationTarget {
    pub fn new(
        interface_name: impl Into<String>,
        method_name: impl Into<String>,
        service_version: impl Into<String>,
    ) -> Self {
        Self {
            interface_name: interface_name.into(),
            method_name: method_name.into(),
            service_version: service_version.into(),
            group: None,
        }
    }

    /// Set the service group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Immutable call target configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Remote host, as given (no DNS policy beyond the resolver's).
    pub host: String,
    /// Remote TCP port.
    pub port: u16,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, timeout_ms: u64) -> Self {
        Self {
            host: host.into(),
            port,
            timeout_ms,
        }
    }

    /// Connection-table key for this endpoint.
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Address string for the TCP connect call.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a raw arguments payload into an ordered argument list.
///
/// A JSON array is taken as-is. A bare value (the common single-DTO
/// convention) is promoted to a one-element list; an empty payload stands
/// for a bare `{}` and encodes as one empty-object argument. Invalid JSON
/// fails with [`DubboError::Argument`] before any network activity.
pub fn parse_args(payload: &str) -> Result<Vec<Value>> {
    let trimmed = payload.trim();
    let value: Value = if trimmed.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(trimmed)
            .map_err(|e| DubboError::Argument(format!("arguments are not valid JSON: {}", e)))?
    };

    Ok(match value {
        Value::Array(items) => items,
        other => vec![other],
    })
}

/// Map an argument value to its wire type token by runtime shape.
pub fn type_descriptor(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "Ljava/lang/String;",
        Value::Number(n) if n.is_f64() => "Ljava/lang/Double;",
        Value::Number(_) => "Ljava/lang/Long;",
        Value::Bool(_) => "Ljava/lang/Boolean;",
        _ => "Ljava/lang/Object;",
    }
}
