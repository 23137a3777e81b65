//! Connection settings for a load.

use core::time::Duration;

/// Default baud rate of the ET54 loads. Must match the setting on the device.
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// Pause after every exchange so the load can process the command.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);
/// Default read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// How to talk to a load. Build with [`LoadConfig::default`] and the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadConfig {
    pub baud_rate: u32,
    /// Terminator of lines read from the load.
    pub read_terminator: String,
    /// Terminator appended to every command.
    pub write_terminator: String,
    /// Settling delay after each write/read.
    pub delay: Duration,
    /// Default read timeout.
    pub timeout: Duration,
    /// Model to assume instead of the one reported by `*IDN?`.
    ///
    /// Only needed for units which do not report a valid model, e.g. rebranded ET5410A+.
    pub model: Option<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_terminator: "\r\n".into(),
            write_terminator: "\n".into(),
            delay: DEFAULT_DELAY,
            timeout: DEFAULT_TIMEOUT,
            model: None,
        }
    }
}

impl LoadConfig {
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_terminators(mut self, read: impl Into<String>, write: impl Into<String>) -> Self {
        self.read_terminator = read.into();
        self.write_terminator = write.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Force the model string, see [`LoadConfig::model`].
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
