use colored::*;
use operrouter_sdk::Error;
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0)
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<Error> for FormattedString {
    fn from(err: Error) -> Self {
        let title = match err {
            Error::Http(_) => "HTTP transport failed:",
            Error::Grpc(_) => "gRPC transport failed:",
            Error::Ffi(_) => "FFI transport failed:",
        };

        FormattedString(format!("{}\n\n'{}'", title.red().bold(), err))
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(err) => err.into(),
            Err(err) => GenericError("Call Failed:", err).into(),
        }
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}\n\n'{}'", msg.red().bold(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use operrouter_sdk::ffi::FfiError;

    #[test]
    fn json_is_pretty_printed() {
        let formatted = FormattedString::from(serde_json::json!({"success": true}));
        assert_eq!(formatted.to_string(), "{\n  \"success\": true\n}\n");
    }

    #[test]
    fn transport_errors_name_the_transport() {
        colored::control::set_override(false);

        let err = Error::Ffi(FfiError::Unsupported {
            symbol: "ping_proto",
        });
        let formatted = FormattedString::from(anyhow::Error::from(err));

        assert!(formatted.0.starts_with("FFI transport failed:"));
        assert!(formatted.0.contains("ping_proto"));
    }
}
