//! JSON response envelope shared by every operation's output.

use serde::Serialize;

/// `{ "success": true, "data": ... }` or `{ "success": false, "error": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

impl<T, E: ToString> From<Result<T, E>> for Envelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(e) => Envelope::err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InputError, LookupError};

    #[test]
    fn success_envelope_omits_error() {
        let json = serde_json::to_value(Envelope::ok(42)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 42 }));
    }

    #[test]
    fn failures_carry_the_message_verbatim() {
        let env: Envelope<()> = Err::<(), _>(InputError::MissingSource).into();
        let json = serde_json::to_value(env).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": "Please provide either an answer key URL or upload a PDF file."
            })
        );
        let env: Envelope<()> = Envelope::err(LookupError::ResultNotFound);
        assert_eq!(env.error.as_deref(), Some("Results not found"));
    }
}
