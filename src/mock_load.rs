//! We use this mocking module in unit tests to emulate an ET54 load on a serial port.
//!
//! The simulator keeps every setpoint written to it keyed by command header and
//! answers queries from that store, so tests exercise the real command strings
//! in both directions.

use core::cell::RefMut;
use core::time::Duration;
use std::collections::{HashMap, VecDeque};

use crate::{config::LoadConfig, load::Et54, transport::Transport};

pub const IDN_ET5410A: &str = "ET5410A+ 08761234 V1.00.2213.016 V1.00.2213.016";
pub const IDN_ET5420A: &str = "ET5420A+ 08769876 V1.00.2213.016 V1.00.2213.016";

const SUCCESS: &str = "Rexecu success";
const COMMAND_ERROR: &str = "Rcmd err";
const EXECUTE_ERROR: &str = "Rexecu err";

/// Largest number the simulated load accepts.
const MAX_VALUE: f64 = 9999.0;

const FAMILIES: [&str; 16] = [
    "CH", "LOAD", "VOLT", "CURR", "POWE", "RESI", "LED", "QUAL", "BATT", "TIME", "TRAN", "LIST",
    "SCAN", "MEAS", "SYST", "SELF",
];
const ACTIONS: [&str; 2] = ["SYST:BEEP", "SYST:LOCA"];
const MODES: [&str; 12] = [
    "CC", "CV", "CP", "CR", "CCCV", "CRCV", "SHOR", "LED", "BATT", "TRAN", "LIST", "SCAN",
];

/// Our mock type used to emulate an ET54 load.
pub struct MockLoad {
    identification: String,
    /// Stored values keyed by upper case command header, e.g. `CURR1:CC`
    settings: HashMap<String, String>,
    /// Canned responses which take precedence over the simulation
    overrides: HashMap<String, Vec<String>>,
    /// Bytes of the command currently being written
    line: Vec<u8>,
    /// Everything ever written
    written: Vec<u8>,
    /// Response bytes waiting to be read
    pending: VecDeque<u8>,
    response_terminator: String,
    commands: Vec<String>,
    timeout: Duration,
    timeout_history: Vec<Duration>,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum MockLoadError {
    /// Generic simulated error for testing
    #[error("Simulated error")]
    SimulatedError,
}

impl embedded_io::Error for MockLoadError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockLoadError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockLoad {
    type Error = MockLoadError;
}

impl embedded_io::Write for MockLoad {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.written.push(byte);
            if byte == b'\n' {
                let line = String::from_utf8_lossy(&self.line).trim().to_owned();
                self.line.clear();
                self.respond(&line);
            } else {
                self.line.push(byte);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for MockLoad {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockLoadError::SimulatedError);
        }

        let mut count = 0;
        while count < buf.len() {
            match self.pending.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl Transport for MockLoad {
    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        self.timeout = timeout;
        self.timeout_history.push(timeout);
        Ok(())
    }
}

impl MockLoad {
    /// Create a simulated load answering `*IDN?` with `identification`.
    pub fn new(identification: &str) -> Self {
        let mut settings = HashMap::new();
        for channel in 1..=2 {
            for (item, value) in [
                ("CH{}:SW", "OFF"),
                ("CH{}:MODE", "CC"),
                ("LOAD{}:ABNO", "NONE"),
                ("MEAS{}:VOLTAGE", "0.000"),
                ("MEAS{}:CURRENT", "0.000"),
                ("MEAS{}:POWER", "0.000"),
                ("MEAS{}:RESISTANCE", "0.000"),
                ("MEAS{}:ALL", "0.000 0.000 0.000 0.000"),
                ("BATT{}:MODE", "CC"),
                ("BATT{}:BCUT", "Voltage"),
                ("BATT{}:BAEN", "3"),
                ("BATT{}:CAPA", "0.000"),
                ("BATT{}:ENER", "0.000"),
                ("QUAL{}:OUT", "NONE"),
            ] {
                settings.insert(item.replace("{}", &channel.to_string()), value.to_owned());
            }
        }
        settings.insert("SELF:FAN".to_owned(), "OFF".to_owned());

        Self {
            identification: identification.to_owned(),
            settings,
            overrides: HashMap::new(),
            line: Vec::new(),
            written: Vec::new(),
            pending: VecDeque::new(),
            response_terminator: "\r\n".to_owned(),
            commands: Vec::new(),
            timeout: Duration::from_secs(1),
            timeout_history: Vec::new(),
            should_error_on_read: false,
        }
    }

    /// Every command received, without terminators
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Everything written to the mock, terminators included
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Every timeout applied through [`Transport::set_timeout`], in order
    pub fn timeout_history(&self) -> &[Duration] {
        &self.timeout_history
    }

    /// Stored value for a command header, e.g. `CURR1:CC`
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn set_setting(&mut self, key: &str, value: &str) {
        self.settings.insert(key.to_owned(), value.to_owned());
    }

    pub fn remove_setting(&mut self, key: &str) {
        self.settings.remove(key);
    }

    /// Answer `command` with `responses` instead of simulating it.
    pub fn override_response(&mut self, command: &str, responses: &[&str]) {
        self.overrides.insert(
            command.to_owned(),
            responses.iter().map(|r| r.to_string()).collect(),
        );
    }

    pub fn set_response_terminator(&mut self, terminator: &str) {
        self.response_terminator = terminator.to_owned();
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    fn respond(&mut self, command: &str) {
        self.commands.push(command.to_owned());
        let responses = match self.overrides.get(command) {
            Some(responses) => responses.clone(),
            None => self.simulate(command),
        };
        for response in responses {
            self.pending.extend(response.bytes());
            self.pending.extend(self.response_terminator.bytes());
        }
    }

    fn simulate(&mut self, command: &str) -> Vec<String> {
        if command == "*IDN?" {
            return vec![self.identification.clone()];
        }
        if matches!(command, "RST" | "TRG") {
            return vec![];
        }
        if command == "*TRG" {
            return vec![SUCCESS.to_owned()];
        }

        let (head, args) = match command.split_once(' ') {
            Some((head, args)) => (head, args.trim()),
            None => (command, ""),
        };
        let key = head.trim_end_matches('?').to_ascii_uppercase();
        let family: String = key
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if !key.contains(':') || !FAMILIES.contains(&family.as_str()) {
            return vec![COMMAND_ERROR.to_owned()];
        }

        if head.ends_with('?') {
            self.query(&key, args)
        } else {
            vec![self.apply(&key, args).to_owned()]
        }
    }

    fn query(&self, key: &str, args: &str) -> Vec<String> {
        if key.starts_with("LIST") && (key.ends_with(":PARA") || key.ends_with(":OUT")) {
            let Some((first, last)) = args
                .split_once(',')
                .and_then(|(a, b)| Some((a.trim().parse::<u8>().ok()?, b.trim().parse::<u8>().ok()?)))
            else {
                return vec![EXECUTE_ERROR.to_owned()];
            };
            return (first..=last)
                .map(|row| {
                    let stored = self.settings.get(&format!("{key}#{row}"));
                    match (stored, key.ends_with(":PARA")) {
                        (Some(value), _) => format!("R{value}"),
                        (None, true) => format!("R{row},0,0.000,0,0,---,---"),
                        (None, false) => format!("R{row},0,0.000,0,---,---"),
                    }
                })
                .collect();
        }

        match self.settings.get(key) {
            Some(value) => vec![format!("R{value}")],
            None => vec![COMMAND_ERROR.to_owned()],
        }
    }

    fn apply(&mut self, key: &str, args: &str) -> &'static str {
        if args.is_empty() {
            return if ACTIONS.contains(&key) {
                SUCCESS
            } else {
                EXECUTE_ERROR
            };
        }

        if key.starts_with("LIST") && key.ends_with(":PARA") {
            let fields: Vec<&str> = args.split(',').map(str::trim).collect();
            let row = fields.first().and_then(|num| num.parse::<u8>().ok());
            return match row {
                Some(row @ 1..=10) if fields.len() == 7 => {
                    self.settings.insert(format!("{key}#{row}"), fields.join(","));
                    SUCCESS
                }
                _ => EXECUTE_ERROR,
            };
        }

        let value = if let Ok(integer) = args.parse::<i64>() {
            if integer < 0 || integer as f64 > MAX_VALUE {
                return EXECUTE_ERROR;
            }
            integer.to_string()
        } else if let Ok(number) = args.parse::<f64>() {
            if !(0.0..=MAX_VALUE).contains(&number) {
                return EXECUTE_ERROR;
            }
            format!("{number:.3}")
        } else {
            args.to_ascii_uppercase()
        };

        let value = if key.starts_with("CH") && key.ends_with(":MODE") {
            let mode = match value.as_str() {
                "SHORT" => "SHOR",
                "BATTERY" => "BATT",
                "TRANSIENT" => "TRAN",
                other => other,
            };
            if !MODES.contains(&mode) {
                return EXECUTE_ERROR;
            }
            mode.to_owned()
        } else if key.ends_with(":BCUT") {
            match value.as_str() {
                "V" => "Voltage".to_owned(),
                "T" => "Time".to_owned(),
                "E" => "Energy".to_owned(),
                "C" => "Capacity".to_owned(),
                _ => return EXECUTE_ERROR,
            }
        } else {
            value
        };

        self.settings.insert(key.to_owned(), value);
        SUCCESS
    }
}

/// Load settings for tests: no settling delay.
pub fn test_config() -> LoadConfig {
    LoadConfig::default().with_delay(Duration::ZERO)
}

/// Connect to a simulated load answering `*IDN?` with `identification`.
pub fn connect(identification: &str) -> Et54<MockLoad> {
    let _ = env_logger::builder().is_test(true).try_init();
    Et54::new(MockLoad::new(identification), &test_config()).unwrap()
}

/// Borrow the simulator behind an open load.
pub fn mock(load: &Et54<MockLoad>) -> RefMut<'_, MockLoad> {
    RefMut::map(load.interface(), |interface| {
        interface.as_mut().expect("load is closed")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Read, Write};

    fn exchange(mock: &mut MockLoad, command: &str) -> String {
        mock.write_all(command.as_bytes()).unwrap();
        mock.write_all(b"\n").unwrap();
        let mut buffer = [0u8; 256];
        let count = mock.read(&mut buffer).unwrap();
        String::from_utf8_lossy(&buffer[..count]).into_owned()
    }

    #[test]
    fn test_stores_and_answers() {
        let mut mock = MockLoad::new(IDN_ET5410A);
        assert_eq!(exchange(&mut mock, "CURR1:CC 1.5"), "Rexecu success\r\n");
        assert_eq!(exchange(&mut mock, "CURR1:CC?"), "R1.500\r\n");
        assert_eq!(mock.setting("CURR1:CC"), Some("1.500"));
        assert_eq!(mock.commands(), ["CURR1:CC 1.5", "CURR1:CC?"]);
    }

    #[test]
    fn test_rejections() {
        let mut mock = MockLoad::new(IDN_ET5410A);
        assert_eq!(exchange(&mut mock, "FOOBAR:12"), "Rcmd err\r\n");
        assert_eq!(exchange(&mut mock, "VOLT1:CV -1"), "Rexecu err\r\n");
        assert_eq!(exchange(&mut mock, "CH1:MODE FOO"), "Rexecu err\r\n");
        assert_eq!(exchange(&mut mock, "VOLT1:VTH?"), "Rcmd err\r\n");
    }

    #[test]
    fn test_no_reply_is_empty_read() {
        let mut mock = MockLoad::new(IDN_ET5410A);
        assert_eq!(exchange(&mut mock, "RST"), "");
    }

    #[test]
    fn test_read_error_simulation() {
        let mut mock = MockLoad::new(IDN_ET5410A);
        mock.set_read_error(true);
        let mut buffer = [0u8; 10];
        assert!(matches!(
            mock.read(&mut buffer),
            Err(MockLoadError::SimulatedError)
        ));
    }

    #[test]
    fn test_simulated_error_is_reported() {
        use embedded_io::Error as _;

        let error = MockLoadError::SimulatedError;
        assert_eq!(error.to_string(), "Simulated error");
        assert_eq!(error.kind(), embedded_io::ErrorKind::Other);

        let mut mock = MockLoad::new(IDN_ET5410A);
        mock.set_read_error(true);
        let load = Et54::<MockLoad>::new(mock, &test_config());
        assert!(matches!(
            load,
            Err(crate::error::Error::SerialError(MockLoadError::SimulatedError))
        ));
    }
}
