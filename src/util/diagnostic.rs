//! User-friendly diagnostic messages.
//!
//! Every error shown to a user names the root cause, the context it occurred
//! in, and what to try next.

use std::fmt;
use std::path::PathBuf;

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a schema file cannot be found.
    pub const SCHEMA_NOT_FOUND: &str =
        "help: Pass a path, a name under `schema_paths`, or `builtin:NAME`";

    /// Suggestion when a builtin schema name is unknown.
    pub const UNKNOWN_BUILTIN: &str = "help: Run `harbour-layout builtins` to list them";

    /// Suggestion when a group is not found in a schema.
    pub const GROUP_NOT_FOUND: &str =
        "help: Run `harbour-layout show <SCHEMA>` to list the groups";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Malformed TOML in a schema file, with the offending span.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("invalid schema `{name}`: {message}")]
#[diagnostic(
    code(harbour_layout::schema::syntax),
    help("Each group needs `name`, optional `kind` and a `fields` array")
)]
pub struct SchemaSyntaxError {
    pub name: String,
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

/// A target triple that does not name an architecture, vendor and OS.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("invalid target triple `{triple}`")]
#[diagnostic(
    code(harbour_layout::target::invalid),
    help("Use a full triple such as `x86_64-unknown-linux-gnu`")
)]
pub struct InvalidTargetError {
    pub triple: String,
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("unknown group `rect`")
            .with_context("`image` embeds `rect` by value")
            .with_suggestion("Declare `rect` before `image`")
            .with_suggestion("Check the spelling of the group name");

        let output = diag.format(false);
        assert!(output.contains("error: unknown group"));
        assert!(output.contains("→ `image` embeds"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Declare `rect`"));
        assert!(output.contains("2. Check the spelling"));
    }

    #[test]
    fn test_warning_location() {
        let diag = Diagnostic::warning("ignored config").with_location("config.toml");
        let output = diag.format(false);
        assert!(output.starts_with("warning: ignored config"));
        assert!(output.contains("--> config.toml"));
    }
}
