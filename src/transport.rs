//! The byte stream the load is connected through.
//!
//! Anything implementing [embedded_io::Read] & [embedded_io::Write] can carry the
//! protocol; [`Transport`] only adds control over the read timeout, which some
//! slow queries need to extend for a single exchange.

use core::time::Duration;

/// A bidirectional byte stream with an adjustable read timeout.
///
/// A read which times out must either return `Ok(0)` or an error of kind
/// [`embedded_io::ErrorKind::TimedOut`].
pub trait Transport: embedded_io::Read + embedded_io::Write {
    /// The read timeout currently in effect.
    fn timeout(&self) -> Duration;

    /// Change the read timeout for subsequent reads.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error>;
}

#[cfg(feature = "serial")]
pub use serial::{IoError, SerialTransport};

#[cfg(feature = "serial")]
mod serial {
    use core::time::Duration;

    use serialport::SerialPort;

    use super::Transport;

    /// [`Transport`] over a serial port from the `serialport` crate.
    pub struct SerialTransport(Box<dyn SerialPort>);

    impl SerialTransport {
        /// Open `path` (e.g. `/dev/ttyUSB0` or `COM3`) with 8N1 framing.
        pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, IoError> {
            let port = serialport::new(path, baud_rate)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .timeout(timeout)
                .open()
                .map_err(|err| IoError(err.into()))?;
            Ok(Self(port))
        }
    }

    impl From<Box<dyn SerialPort>> for SerialTransport {
        fn from(port: Box<dyn SerialPort>) -> Self {
            Self(port)
        }
    }

    /// A `std::io::Error` usable as an [`embedded_io::Error`].
    #[derive(Debug)]
    pub struct IoError(pub std::io::Error);

    impl core::fmt::Display for IoError {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for IoError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    impl embedded_io::Error for IoError {
        fn kind(&self) -> embedded_io::ErrorKind {
            match self.0.kind() {
                std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
                std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
                std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
                std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
                std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
                std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
                std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
                std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
                std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
                _ => embedded_io::ErrorKind::Other,
            }
        }
    }

    impl embedded_io::ErrorType for SerialTransport {
        type Error = IoError;
    }

    impl embedded_io::Read for SerialTransport {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            std::io::Read::read(&mut self.0, buf).map_err(IoError)
        }
    }

    impl embedded_io::Write for SerialTransport {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            std::io::Write::write(&mut self.0, buf).map_err(IoError)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            std::io::Write::flush(&mut self.0).map_err(IoError)
        }
    }

    impl Transport for SerialTransport {
        fn timeout(&self) -> Duration {
            self.0.timeout()
        }

        fn set_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error> {
            self.0
                .set_timeout(timeout)
                .map_err(|err| IoError(err.into()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use embedded_io::Error;

        #[test]
        fn test_io_error_kinds() {
            let timed_out = IoError(std::io::Error::from(std::io::ErrorKind::TimedOut));
            assert!(matches!(timed_out.kind(), embedded_io::ErrorKind::TimedOut));
            let other = IoError(std::io::Error::other("boom"));
            assert!(matches!(other.kind(), embedded_io::ErrorKind::Other));
        }
    }
}
