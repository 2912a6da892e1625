// Error infrastructure for the translator.
//
// Every phase reports failures as a `CompileError`; the driver prefixes them
// with "ERROR:" when printing to stderr. Errors that can be tied to a source
// position carry `file:line`, everything else is a bare message.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// An error at a known source position.
    #[error("{file}:{line}: {message}")]
    Source {
        file: String,
        line: u32,
        message: String,
    },

    /// An error with no useful source position (e.g. a missing entry point).
    #[error("{0}")]
    Message(String),
}

impl CompileError {
    pub fn at(file: &str, line: u32, message: impl Into<String>) -> Self {
        CompileError::Source {
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    pub fn msg(message: impl Into<String>) -> Self {
        CompileError::Message(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = CompileError::at("shader.hlsl", 12, "Expected type");
        assert_eq!(err.to_string(), "shader.hlsl:12: Expected type");
    }

    #[test]
    fn test_message_error_display() {
        let err = CompileError::msg("Vertex shader must output a position");
        assert_eq!(err.to_string(), "Vertex shader must output a position");
    }
}
