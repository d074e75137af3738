//! Common types and utilities shared across chatprobe crates.
//!
//! This crate defines the shared error type and the observability helpers
//! used throughout the workspace. It stays dependency‑minimal so every crate
//! can depend on it without pulling in the browser or HTTP stacks.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`ChatprobeError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use chatprobe_common::ChatprobeError;
//!
//! let err = ChatprobeError::InputFailed {
//!     tried: vec!["textarea".to_string()],
//! };
//! assert_eq!(err.to_string(), "question input failed; tried: textarea");
//! ```

pub mod observability;

/// Error types used across the chatprobe system.
#[derive(thiserror::Error, Debug)]
pub enum ChatprobeError {
    /// The browser driver (WebDriver session, page script) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// No input selector accepted the question text.
    #[error("question input failed; tried: {}", .tried.join(", "))]
    InputFailed { tried: Vec<String> },

    /// No submit control could be activated.
    #[error("question submit failed; tried: {}", .tried.join(", "))]
    SubmitFailed { tried: Vec<String> },

    /// Writing an artifact or creating an output directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An artifact could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenient alias for results that use [`ChatprobeError`].
pub type Result<T> = std::result::Result<T, ChatprobeError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(err: &ChatprobeError) -> &'static str {
        match err {
            ChatprobeError::Driver(_) => "driver",
            ChatprobeError::InputFailed { .. } => "input",
            ChatprobeError::SubmitFailed { .. } => "submit",
            ChatprobeError::Io(_) => "io",
            ChatprobeError::Serialize(_) => "serialize",
        }
    }

    #[test]
    fn every_variant_has_a_source() {
        let io: ChatprobeError = std::io::Error::other("disk full").into();
        let driver: ChatprobeError = anyhow::anyhow!("session lost").into();
        let json: ChatprobeError = serde_json::from_str::<u8>("x").unwrap_err().into();
        let submit = ChatprobeError::SubmitFailed {
            tried: vec!["button".into(), "Enter".into()],
        };

        assert_eq!(sample(&io), "io");
        assert_eq!(sample(&driver), "driver");
        assert_eq!(sample(&json), "serialize");
        assert_eq!(
            submit.to_string(),
            "question submit failed; tried: button, Enter"
        );
        assert_eq!(driver.to_string(), "Driver error: session lost");
    }
}
