//! Parameter schemas for the control methods the broker interprets itself.

use std::time::Duration;

use serde::Deserialize;

/// Params of `registration`: the methods an executer is able to serve.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RegistrationParams {
    /// Method names, each counted once per call.
    #[serde(alias = "Methods")]
    pub methods: Vec<String>,
}

/// Params of `result`: the task being acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ResultParams {
    /// Task id taken from the dispatched command.
    #[serde(alias = "Task")]
    pub task: String,
}

#[derive(Debug, Deserialize)]
struct TimeoutParams {
    #[serde(default)]
    timeout: Option<serde_json::Value>,
}

/// Reads the optional `timeout` member (seconds, fractional allowed) from a
/// params payload.
///
/// Anything missing, unparsable, non-positive or non-finite falls back to
/// `default`.
pub(crate) fn command_timeout(params: &str, default: Duration) -> Duration {
    let Ok(parsed) = serde_json::from_str::<TimeoutParams>(params) else {
        return default;
    };
    let seconds = match parsed.timeout {
        Some(serde_json::Value::Number(number)) => number.as_f64(),
        Some(serde_json::Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match seconds {
        Some(value) if value.is_finite() && value > 0.0 => {
            Duration::try_from_secs_f64(value).unwrap_or(default)
        }
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DEFAULT: Duration = Duration::from_secs(60);

    #[rstest]
    #[case(r#"{"timeout":1.5}"#, Duration::from_millis(1500))]
    #[case(r#"{"timeout":"2"}"#, Duration::from_secs(2))]
    #[case(r#"{"timeout":0}"#, DEFAULT)]
    #[case(r#"{"timeout":-3}"#, DEFAULT)]
    #[case(r#"{"timeout":"soon"}"#, DEFAULT)]
    #[case(r#"{"other":true}"#, DEFAULT)]
    #[case("not json", DEFAULT)]
    fn timeout_falls_back_to_default(#[case] params: &str, #[case] expected: Duration) {
        assert_eq!(command_timeout(params, DEFAULT), expected);
    }

    #[test]
    fn registration_accepts_capitalised_key() {
        let params: RegistrationParams =
            serde_json::from_str(r#"{"Methods":["a","b"]}"#).expect("decode");
        assert_eq!(params.methods, ["a", "b"]);
    }
}
