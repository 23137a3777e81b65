//! Our error types for the ET54 loads.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for ET54 load communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error: {0:?}")]
    SerialError(I),
    #[error("Communication timeout")]
    Timeout,
    #[error("Response line does not fit the receive buffer")]
    BufferError,
    #[error("Connection to the load has been closed")]
    Closed,
    #[error("Unable to parse device identification: {0:?}")]
    Identification(String),
    #[error("Instrument model '{0}' not supported")]
    UnsupportedModel(String),
    #[error("Unknown command '{command}' ({response:?})")]
    UnknownCommand { command: String, response: String },
    #[error("Command '{command}' failed ({response:?})")]
    CommandFailed { command: String, response: String },
    #[error("Command '{command}' returned unknown response ({response:?})")]
    UnexpectedResponse { command: String, response: String },
    #[error("Unable to decode response to '{command}'")]
    Decode {
        command: String,
        source: DecodeError,
    },
    /// A setting the operation depends on could not be read back.
    #[error("No value for '{command}', which is needed to continue")]
    Indeterminate { command: String },
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

/// Usage errors detected before anything is sent to the load.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidArgument {
    #[error("Invalid {what} '{value}', expected one of [{valid}]")]
    Choice {
        what: &'static str,
        value: String,
        valid: String,
    },
    #[error("{what} takes {min} to {max} values, got {got}")]
    Length {
        what: &'static str,
        min: usize,
        max: usize,
        got: usize,
    },
    #[error("{what} must be within {min}..={max}, got {value}")]
    OutOfRange {
        what: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// A response line which could not be turned into the expected value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("expected {expected}, got {response:?}")]
pub struct DecodeError {
    pub expected: &'static str,
    pub response: String,
}

impl DecodeError {
    pub(crate) fn new(expected: &'static str, response: impl Into<String>) -> Self {
        Self {
            expected,
            response: response.into(),
        }
    }
}
