//! # Output Projection
//!
//! A [`Selector`] decides what an invocation emits:
//!
//! | Selector | Emits |
//! |----------|-------|
//! | `*`      | the whole response |
//! | `Name`   | the response field `Name` |
//! | `^Name`  | the input parameter `Name`, unchanged |
//!
//! The selector is parsed and checked against the operation's
//! [`SelectSchema`] before anything is dispatched, so projecting a response can
//! only ever take the one path that was chosen.

use crate::error::InvokeError;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Projection mode for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    WholeResponse,
    Field(String),
    PassThrough(String),
}

/// Why a selector string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorParseError {
    #[error("selector is empty")]
    Empty,
    #[error("pass-through selector '^' names no parameter")]
    EmptyPassThrough,
}

impl FromStr for Selector {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" => Err(SelectorParseError::Empty),
            "*" => Ok(Selector::WholeResponse),
            _ => match s.strip_prefix('^') {
                Some("") => Err(SelectorParseError::EmptyPassThrough),
                Some(name) => Ok(Selector::PassThrough(name.to_string())),
                None => Ok(Selector::Field(s.to_string())),
            },
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::WholeResponse => write!(f, "*"),
            Selector::Field(name) => write!(f, "{name}"),
            Selector::PassThrough(name) => write!(f, "^{name}"),
        }
    }
}

/// The names a selector may refer to for one operation.
#[derive(Debug, Clone, Copy)]
pub struct SelectSchema {
    pub operation: &'static str,
    pub response_fields: &'static [&'static str],
    pub pass_through: &'static [&'static str],
}

impl Selector {
    /// Parses a selector string on behalf of `schema.operation`.
    pub fn parse_for(raw: &str, schema: &SelectSchema) -> Result<Self, InvokeError> {
        let selector = raw
            .parse::<Selector>()
            .map_err(|e| InvokeError::InvalidSelector {
                operation: schema.operation,
                selector: raw.to_string(),
                reason: e.to_string(),
            })?;
        selector.validate(schema)?;
        Ok(selector)
    }

    /// Checks that the selector names something the operation actually has.
    pub fn validate(&self, schema: &SelectSchema) -> Result<(), InvokeError> {
        let invalid = |reason: String| InvokeError::InvalidSelector {
            operation: schema.operation,
            selector: self.to_string(),
            reason,
        };
        match self {
            Selector::WholeResponse => Ok(()),
            Selector::Field(name) if schema.response_fields.contains(&name.as_str()) => Ok(()),
            Selector::Field(name) => Err(invalid(format!(
                "response has no field '{}' (available: {})",
                name,
                list_or_none(schema.response_fields)
            ))),
            Selector::PassThrough(name) if schema.pass_through.contains(&name.as_str()) => Ok(()),
            Selector::PassThrough(name) => Err(invalid(format!(
                "parameter '{}' cannot be passed through (available: {})",
                name,
                list_or_none(schema.pass_through)
            ))),
        }
    }

    /// Projects a response (or the input parameters) into the emitted value.
    ///
    /// `response` and `params` are serialized with their wire names; a named
    /// field that the response left unset projects as `null`.
    pub fn project<R, P>(
        &self,
        operation: &'static str,
        response: &R,
        params: &P,
    ) -> Result<Value, InvokeError>
    where
        R: Serialize + ?Sized,
        P: Serialize + ?Sized,
    {
        let to_value = |v: Result<Value, serde_json::Error>| {
            v.map_err(|source| InvokeError::Projection { operation, source })
        };
        match self {
            Selector::WholeResponse => to_value(serde_json::to_value(response)),
            Selector::Field(name) => {
                let value = to_value(serde_json::to_value(response))?;
                Ok(value.get(name).cloned().unwrap_or(Value::Null))
            }
            Selector::PassThrough(name) => {
                let value = to_value(serde_json::to_value(params))?;
                Ok(value.get(name).cloned().unwrap_or(Value::Null))
            }
        }
    }
}

fn list_or_none(names: &[&str]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Sent {
        message_id: Option<String>,
        sequence_number: Option<String>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Input {
        queue_url: Option<String>,
    }

    const SCHEMA: SelectSchema = SelectSchema {
        operation: "SendMessage",
        response_fields: &["MessageId", "SequenceNumber"],
        pass_through: &["QueueUrl"],
    };

    #[test]
    fn test_parse_selector() {
        assert_eq!("*".parse::<Selector>(), Ok(Selector::WholeResponse));
        assert_eq!("MessageId".parse::<Selector>(), Ok(Selector::Field("MessageId".into())));
        assert_eq!("^QueueUrl".parse::<Selector>(), Ok(Selector::PassThrough("QueueUrl".into())));
        assert_eq!("".parse::<Selector>(), Err(SelectorParseError::Empty));
        assert_eq!("^".parse::<Selector>(), Err(SelectorParseError::EmptyPassThrough));
    }

    #[test]
    fn test_validate_rejects_unknown_names() {
        assert!(Selector::parse_for("MessageId", &SCHEMA).is_ok());
        assert!(matches!(
            Selector::parse_for("ReceiptHandle", &SCHEMA),
            Err(InvokeError::InvalidSelector { .. })
        ));
        assert!(matches!(
            Selector::parse_for("^MessageBody", &SCHEMA),
            Err(InvokeError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_each_mode_projects_its_own_source() {
        let response = Sent {
            message_id: Some("m-1".into()),
            sequence_number: None,
        };
        let input = Input {
            queue_url: Some("https://queue.example/q1".into()),
        };

        let whole = Selector::WholeResponse.project("SendMessage", &response, &input).unwrap();
        assert_eq!(whole, json!({"MessageId": "m-1", "SequenceNumber": null}));

        let field = Selector::Field("MessageId".into())
            .project("SendMessage", &response, &input)
            .unwrap();
        assert_eq!(field, json!("m-1"));

        // Unset fields are still a defined value for the chosen mode.
        let unset = Selector::Field("SequenceNumber".into())
            .project("SendMessage", &response, &input)
            .unwrap();
        assert_eq!(unset, Value::Null);

        let passed = Selector::PassThrough("QueueUrl".into())
            .project("SendMessage", &response, &input)
            .unwrap();
        assert_eq!(passed, json!("https://queue.example/q1"));
    }
}
