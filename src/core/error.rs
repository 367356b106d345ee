//! Error handling for resnames
//!
//! This module provides the error type shared by every layer of the crate and the
//! user-friendly error reporting used by the CLI. The error system follows two rules:
//! 1. **Strongly-typed errors** for precise matching in code and tests
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ResnamesError`] - Enumerated error kinds for naming, injection, reference
//!   lookup, variable substitution and service loading
//! - [`ErrorContext`] - Wrapper that adds details and a suggestion for display
//!
//! # Error Categories
//!
//! - **Naming**: [`ResnamesError::MissingStrategy`], [`ResnamesError::MalformedResourceTree`],
//!   [`ResnamesError::DuplicateEnvironmentKey`]
//! - **References**: [`ResnamesError::UnknownNameReference`],
//!   [`ResnamesError::UnknownTopicReference`], [`ResnamesError::UnknownTopicProperty`]
//! - **Variables**: [`ResnamesError::UnknownVariableSource`], [`ResnamesError::InvalidVariable`]
//! - **Loading**: [`ResnamesError::ServiceNotFound`], [`ResnamesError::ServiceParseError`],
//!   [`ResnamesError::ConfigError`]
//!
//! Reference lookup errors are fatal to the one lookup only. Errors raised during the
//! one-time injection run are memoized by the coordinator, which is why the type is
//! [`Clone`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use resnames_cli::core::{ResnamesError, user_friendly_error};
//!
//! let error = ResnamesError::UnknownTopicReference {
//!     topic: "OrderTopc".to_string(),
//!     suggestion: Some("OrderTopic".to_string()),
//! };
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with the close match
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for resnames operations
///
/// Each variant carries the offending logical id, type, property or expression so the
/// message alone identifies what failed.
///
/// # Examples
///
/// ```rust,no_run
/// use resnames_cli::core::ResnamesError;
///
/// fn describe(error: &ResnamesError) -> &'static str {
///     match error {
///         ResnamesError::MissingStrategy { .. } => "register a strategy or skip unknown types",
///         ResnamesError::UnknownNameReference { .. } => "check the logical id",
///         _ => "see the error message",
///     }
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResnamesError {
    /// A resource type has no registered naming strategy and the policy is `fail`
    #[error("Missing name strategy for {resource_type} (resource '{logical_id}')")]
    MissingStrategy {
        /// The unregistered type tag
        resource_type: String,
        /// Logical id of the resource declaring that type
        logical_id: String,
    },

    /// The resource collection does not have the expected shape
    #[error("Malformed resource tree: {reason}")]
    MalformedResourceTree {
        /// What was missing or had the wrong type
        reason: String,
    },

    /// Two logical ids (or a derived key) map to the same environment key
    #[error("Environment key '{key}' produced by '{second}' is already used by '{first}'")]
    DuplicateEnvironmentKey {
        /// The colliding environment key
        key: String,
        /// Logical id that produced the key first
        first: String,
        /// Logical id that produced the key again
        second: String,
    },

    /// A `name:` reference names a logical id that was never injected
    #[error("No such injected resource: '{logical_id}'")]
    UnknownNameReference {
        /// The requested logical id
        logical_id: String,
        /// Closest known logical id, if any is similar
        suggestion: Option<String>,
    },

    /// A `topic:` reference names a topic that was never registered
    #[error("No such topic: '{topic}'")]
    UnknownTopicReference {
        /// The requested topic logical id
        topic: String,
        /// Closest registered topic, if any is similar
        suggestion: Option<String>,
    },

    /// A `topic:` reference asks for a property the topic record does not have
    #[error("Topic '{topic}' has no property '{property}'")]
    UnknownTopicProperty {
        /// The topic logical id
        topic: String,
        /// The requested property
        property: String,
    },

    /// A `${source:address}` expression names a source nobody registered
    #[error("Unknown variable source '{source_name}'")]
    UnknownVariableSource {
        /// The source prefix before the colon
        source_name: String,
    },

    /// A `${...}` expression could not be parsed or resolved
    #[error("Invalid variable '{expression}': {reason}")]
    InvalidVariable {
        /// The expression text between the braces
        expression: String,
        /// Why it failed
        reason: String,
    },

    /// No service definition was found
    #[error("Service definition not found: {path}")]
    ServiceNotFound {
        /// The path or directory that was searched
        path: String,
    },

    /// The service definition could not be parsed
    #[error("Invalid service definition {file}: {reason}")]
    ServiceParseError {
        /// File being parsed
        file: String,
        /// Parser message
        reason: String,
    },

    /// Configuration is inconsistent or invalid
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// The message to show
        message: String,
    },
}

impl ResnamesError {
    /// Shorthand for [`ResnamesError::MalformedResourceTree`]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResourceTree {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ResnamesError::ConfigError`]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` wraps a [`ResnamesError`] and adds optional details and a suggestion.
/// When displayed, the error is shown in red, details in yellow and the suggestion in
/// green.
///
/// # Examples
///
/// ```rust,no_run
/// use resnames_cli::core::{ErrorContext, ResnamesError};
///
/// let context = ErrorContext::new(ResnamesError::ServiceNotFound {
///     path: ".".to_string(),
/// })
/// .with_suggestion("Pass --service path/to/serverless.yml")
/// .with_details("resnames looks for serverless.yml, serverless.yaml and serverless.json");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ResnamesError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details
    #[must_use]
    pub const fn new(error: ResnamesError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`ResnamesError`] anywhere in the error chain (errors are usually wrapped
/// in `anyhow` context by the time they reach the CLI) and falls back to a generic
/// context that includes the full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(resnames_error) = error.chain().find_map(|e| e.downcast_ref::<ResnamesError>()) {
        let mut ctx = create_error_context(resnames_error.clone());
        let outer = error.to_string();
        if outer != resnames_error.to_string() && ctx.details.is_none() {
            ctx.details = Some(outer);
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(ResnamesError::Other {
                message: error.to_string(),
            })
            .with_suggestion("Check the file permissions of the service definition and config file");
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ResnamesError::Other {
        message,
    })
}

/// Map each [`ResnamesError`] variant to a context with tailored suggestions
fn create_error_context(error: ResnamesError) -> ErrorContext {
    match &error {
        ResnamesError::MissingStrategy { resource_type, .. } => {
            let resource_type = resource_type.clone();
            ErrorContext::new(error)
                .with_suggestion(format!(
                    "Register a strategy under custom.resourceNames.strategies, e.g. \"{resource_type}\": {{ field: Name }}, or set custom.resourceNames.unknownTypes: skip"
                ))
                .with_details("Every resource type needs a naming strategy while the unknown-type policy is 'fail'")
        }

        ResnamesError::MalformedResourceTree { .. } => ErrorContext::new(error)
            .with_suggestion("Check that resources (or each entry of a resources list) has a Resources mapping and every resource declares a Type")
            .with_details("No environment was injected because the resource tree could not be walked completely"),

        ResnamesError::DuplicateEnvironmentKey { .. } => ErrorContext::new(error)
            .with_suggestion("Rename one of the logical ids so their upper-snake-case forms differ")
            .with_details("Environment keys are derived from logical ids; derived keys use the _ARN and _URL suffixes"),

        ResnamesError::UnknownNameReference { suggestion, .. } => {
            let hint = suggestion
                .as_ref()
                .map(|s| format!("Did you mean '{s}'?"))
                .unwrap_or_else(|| "Use the logical id of a resource declared under resources".to_string());
            ErrorContext::new(error).with_suggestion(hint)
        }

        ResnamesError::UnknownTopicReference { suggestion, .. } => {
            let hint = suggestion
                .as_ref()
                .map(|s| format!("Did you mean '{s}'?"))
                .unwrap_or_else(|| "Use the logical id of an AWS::SNS::Topic resource".to_string());
            ErrorContext::new(error).with_suggestion(hint)
        }

        ResnamesError::UnknownTopicProperty { .. } => ErrorContext::new(error)
            .with_suggestion("Topic references support the properties 'topicName' and 'arn'"),

        ResnamesError::UnknownVariableSource { .. } => ErrorContext::new(error)
            .with_suggestion("Available sources are name, topic, opt, env and self"),

        ResnamesError::ServiceNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run inside the service directory or pass --service <path>")
            .with_details("resnames looks for serverless.yml, serverless.yaml and serverless.json"),

        ResnamesError::ServiceParseError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the YAML/JSON syntax. CloudFormation short-form tags such as !Ref are not supported; use the long form {Ref: ...}"),

        _ => ErrorContext::new(error),
    }
}
