use core::cell::RefCell;
use core::time::Duration;

use embedded_io::Error as _;

use crate::{
    channel::Channel,
    config::LoadConfig,
    error::{Error, InvalidArgument, Result},
    model::{Identity, Model},
    transport::Transport,
};

/// Acknowledgement of a command which was executed.
pub const EXECUTE_SUCCESS: &str = "Rexecu success";
/// Reply to a command the load does not know. Also returned by queries which have no value.
pub const COMMAND_ERROR: &str = "Rcmd err";
/// Reply to a known command the load refused to execute, e.g. a value out of range.
pub const EXECUTE_ERROR: &str = "Rexecu err";

const IDENTIFY: &str = "*IDN?";

/// You can create an Et54 using any interface which implements [`Transport`].
///
/// For its methods, as well as those of [`Channel`], we use the nomenclature that
/// "set" means to write a configuration and "get" means to read back a
/// configuration value, whereas "read" means to get a measured value.
///
/// The interface is released by [`Et54::close`] or when the Et54 is dropped. Channels
/// borrow the Et54 and every call made through them after closing fails with
/// [`Error::Closed`].
pub struct Et54<S: Transport, const L: usize = 128> {
    session: Session<S, L>,
    identity: Identity,
    model: Model,
}

impl<S: Transport, const L: usize> Et54<S, L> {
    /// Identify the load on `interface` and work out its channel layout.
    pub fn new(mut interface: S, config: &LoadConfig) -> Result<Self, S::Error> {
        interface
            .set_timeout(config.timeout)
            .map_err(Error::SerialError)?;
        let session = Session::new(interface, config);

        let response = session
            .fetch(IDENTIFY)?
            .ok_or_else(|| Error::Identification(COMMAND_ERROR.to_owned()))?;
        let mut identity =
            Identity::parse(&response).ok_or_else(|| Error::Identification(response.clone()))?;
        if let Some(model) = &config.model {
            identity.model = model.clone();
        }
        let model = Model::lookup(&identity.model)?;
        log::debug!("identified {:?} as {}", identity, model);

        Ok(Self {
            session,
            identity,
            model,
        })
    }

    /// The identification the load reported.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The model of the connected load.
    pub fn model(&self) -> Model {
        self.model
    }

    /// Number of inputs of the connected load.
    pub fn channel_count(&self) -> u8 {
        self.model.channel_count()
    }

    /// Return the channel with the 1-based `index`, if the model has it.
    pub fn channel(&self, index: u8) -> Option<Channel<'_, S, L>> {
        (1..=self.channel_count())
            .contains(&index)
            .then(|| Channel::new(index, &self.session))
    }

    /// Return all channels of the load in order.
    pub fn channels(&self) -> Vec<Channel<'_, S, L>> {
        (1..=self.channel_count())
            .map(|index| Channel::new(index, &self.session))
            .collect()
    }

    /// Send a command which is acknowledged with a status, see [`Session::execute`].
    pub fn execute(&self, command: &str) -> Result<(), S::Error> {
        self.session.execute(command)
    }

    /// Send a query and return its single line answer, see [`Session::fetch`].
    pub fn fetch(&self, command: &str) -> Result<Option<String>, S::Error> {
        self.session.fetch(command)
    }

    /// Send a query answered with `rows` lines, see [`Session::fetch_rows`].
    pub fn fetch_rows(
        &self,
        command: &str,
        rows: usize,
        timeout: Option<Duration>,
    ) -> Result<Option<Vec<String>>, S::Error> {
        self.session.fetch_rows(command, rows, timeout)
    }

    /// Reset the load to its default settings.
    pub fn reset(&self) -> Result<(), S::Error> {
        self.session.send("RST")
    }

    /// Send a remote trigger event.
    ///
    /// Only has an effect on channels whose trigger source is
    /// [`TriggerSource::Remote`](crate::types::TriggerSource::Remote).
    pub fn trigger(&self) -> Result<(), S::Error> {
        self.session.send("TRG")
    }

    /// Sound the buzzer.
    pub fn beep(&self) -> Result<(), S::Error> {
        self.session.execute("SYST:BEEP")
    }

    /// Unlock the front panel.
    ///
    /// Any command sent afterwards locks it again.
    pub fn unlock(&self) -> Result<(), S::Error> {
        self.session.execute("SYST:LOCA")
    }

    /// Return the fan state as reported by the load.
    pub fn fan(&self) -> Result<Option<String>, S::Error> {
        Ok(self
            .session
            .fetch("SELF:FAN?")?
            .map(|raw| crate::decode::strip_marker(&raw).to_owned()))
    }

    /// Release the interface. Further calls fail with [`Error::Closed`].
    pub fn close(&self) {
        if self.session.interface.borrow_mut().take().is_some() {
            log::debug!("closed connection to {}", self.model);
        }
    }

    /// Whether [`Self::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.session.interface.borrow().is_none()
    }

    #[cfg(test)]
    pub(crate) fn interface(&self) -> core::cell::RefMut<'_, Option<S>> {
        self.session.interface.borrow_mut()
    }
}

#[cfg(feature = "serial")]
impl Et54<crate::transport::SerialTransport> {
    /// Open the serial port at `address` and identify the load on it.
    pub fn connect(
        address: &str,
        config: &LoadConfig,
    ) -> Result<Self, crate::transport::IoError> {
        let port =
            crate::transport::SerialTransport::open(address, config.baud_rate, config.timeout)
                .map_err(Error::SerialError)?;
        Self::new(port, config)
    }
}

/// The request/response primitives every operation goes through.
///
/// Exchanges are strictly sequential: each one writes a full command and reads
/// its full response before returning. The interface sits in a `RefCell`, so a
/// session can not be shared between threads.
pub struct Session<S: Transport, const L: usize> {
    interface: RefCell<Option<S>>,
    read_terminator: String,
    write_terminator: String,
    delay: Duration,
}

impl<S: Transport, const L: usize> Session<S, L> {
    fn new(interface: S, config: &LoadConfig) -> Self {
        Self {
            interface: RefCell::new(Some(interface)),
            read_terminator: config.read_terminator.clone(),
            write_terminator: config.write_terminator.clone(),
            delay: config.delay,
        }
    }

    /// Send a command which the load acknowledges with a status line.
    ///
    /// * `Rexecu success` resolves the call.
    /// * `Rcmd err` fails with [`Error::UnknownCommand`].
    /// * `Rexecu err` fails with [`Error::CommandFailed`].
    /// * Anything else fails with [`Error::UnexpectedResponse`].
    pub fn execute(&self, command: &str) -> Result<(), S::Error> {
        let response = self.with_interface(|interface| {
            self.write_line(interface, command)?;
            let response = self.read_line(interface);
            self.settle();
            response
        })?;
        log::debug!("execute({:?}) = {:?}", command, response);

        if response == EXECUTE_SUCCESS {
            return Ok(());
        }
        let command = command.to_owned();
        Err(if response == COMMAND_ERROR {
            Error::UnknownCommand { command, response }
        } else if response == EXECUTE_ERROR {
            Error::CommandFailed { command, response }
        } else {
            Error::UnexpectedResponse { command, response }
        })
    }

    /// Send a query and return the single line it is answered with.
    ///
    /// Returns `None` if the load answered `Rcmd err`, which it also does for
    /// values that have no meaning in the current mode.
    pub fn fetch(&self, command: &str) -> Result<Option<String>, S::Error> {
        Ok(self
            .fetch_rows(command, 1, None)?
            .and_then(|mut rows| rows.pop()))
    }

    /// Send a query and read exactly `rows` lines of response.
    ///
    /// `timeout` replaces the read timeout for this exchange only. If any row is
    /// `Rcmd err` the exchange stops there and `None` is returned. At least one
    /// row must be read, otherwise the answer would be left in the stream.
    pub fn fetch_rows(
        &self,
        command: &str,
        rows: usize,
        timeout: Option<Duration>,
    ) -> Result<Option<Vec<String>>, S::Error> {
        if rows == 0 {
            return Err(InvalidArgument::Length {
                what: "response",
                min: 1,
                max: usize::MAX,
                got: rows,
            }
            .into());
        }
        self.with_interface(|interface| {
            let previous = match timeout {
                Some(timeout) => {
                    let previous = interface.timeout();
                    interface
                        .set_timeout(timeout)
                        .map_err(Error::SerialError)?;
                    Some(previous)
                }
                None => None,
            };

            let response = self.query_rows(interface, command, rows);

            if let Some(previous) = previous {
                interface
                    .set_timeout(previous)
                    .map_err(Error::SerialError)?;
            }
            response
        })
    }

    /// Send a command which is not answered at all.
    fn send(&self, command: &str) -> Result<(), S::Error> {
        self.with_interface(|interface| {
            self.write_line(interface, command)?;
            self.settle();
            Ok(())
        })
    }

    fn with_interface<T>(
        &self,
        exchange: impl FnOnce(&mut S) -> Result<T, S::Error>,
    ) -> Result<T, S::Error> {
        let mut interface = self.interface.borrow_mut();
        let interface = interface.as_mut().ok_or(Error::Closed)?;
        exchange(interface)
    }

    fn query_rows(
        &self,
        interface: &mut S,
        command: &str,
        rows: usize,
    ) -> Result<Option<Vec<String>>, S::Error> {
        self.write_line(interface, command)?;
        self.settle();

        let mut lines = Vec::new();
        for _ in 0..rows {
            let line = self.read_line(interface)?;
            self.settle();
            if line == COMMAND_ERROR {
                log::warn!("Command '{}' failed ({})", command, line);
                return Ok(None);
            }
            lines.push(line);
        }
        log::debug!("fetch({:?}) = {:?}", command, lines);
        Ok(Some(lines))
    }

    fn write_line(&self, interface: &mut S, command: &str) -> Result<(), S::Error> {
        log::trace!("write({:?})", command);
        interface
            .write_all(command.as_bytes())
            .map_err(Error::SerialError)?;
        interface
            .write_all(self.write_terminator.as_bytes())
            .map_err(Error::SerialError)?;
        interface.flush().map_err(Error::SerialError)
    }

    /// Read up to and including the read terminator, one byte at a time so
    /// nothing of the following line is consumed.
    fn read_line(&self, interface: &mut S) -> Result<String, S::Error> {
        let terminator = self.read_terminator.as_bytes();
        let mut line: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut byte = [0u8; 1];

        while line.is_empty() || !line.ends_with(terminator) {
            match interface.read(&mut byte) {
                Ok(0) => return Err(Error::Timeout),
                Ok(_) => line.push(byte[0]).map_err(|_| Error::BufferError)?,
                Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => {
                    return Err(Error::Timeout);
                }
                Err(e) => return Err(Error::SerialError(e)),
            }
        }

        let text = String::from_utf8_lossy(&line[..line.len() - terminator.len()]).into_owned();
        log::trace!("read() = {:?}", text);
        Ok(text)
    }

    fn settle(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}
