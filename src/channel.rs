//! A single input of the load and its basic operating modes.
//!
//! Battery, transient, list and scan mode live in their own modules as further
//! `impl Channel` blocks.

use core::fmt::Display;

use crate::{
    decode::{parse_f64, parse_floats, parse_u32},
    error::{DecodeError, Error, Result},
    load::Session,
    transport::Transport,
    types::{Choice, Mode, ProtectionState, QualificationResult, Range, State, TriggerSource},
};

/// One input of the load, addressed by its 1-based index.
///
/// A channel holds no state of its own: every getter asks the load and every
/// setter writes straight through. Getters return `Ok(None)` when the load has no
/// value to report, typically because the value does not apply to the active mode.
pub struct Channel<'a, S: Transport, const L: usize> {
    index: u8,
    session: &'a Session<S, L>,
}

impl<S: Transport, const L: usize> Clone for Channel<'_, S, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Transport, const L: usize> Copy for Channel<'_, S, L> {}

/// All four measurements of a channel, taken at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub resistance: f64,
}

impl From<Measurement> for [f64; 4] {
    fn from(m: Measurement) -> Self {
        [m.voltage, m.current, m.power, m.resistance]
    }
}

impl<'a, S: Transport, const L: usize> Channel<'a, S, L> {
    pub(crate) fn new(index: u8, session: &'a Session<S, L>) -> Self {
        Self { index, session }
    }

    /// The 1-based index of this channel.
    pub fn index(&self) -> u8 {
        self.index
    }

    pub(crate) fn header(&self, family: &str, item: &str) -> String {
        format!("{family}{}:{item}", self.index)
    }

    /// Write `{family}{n}:{item} {value}`.
    pub(crate) fn put(&self, family: &str, item: &str, value: impl Display) -> Result<(), S::Error> {
        self.session
            .execute(&format!("{} {}", self.header(family, item), value))
    }

    /// Query `{family}{n}:{item}?` and decode the answer.
    pub(crate) fn query<T>(
        &self,
        family: &str,
        item: &str,
        decode: impl FnOnce(&str) -> core::result::Result<T, DecodeError>,
    ) -> Result<Option<T>, S::Error> {
        let command = format!("{}?", self.header(family, item));
        match self.session.fetch(&command)? {
            Some(raw) => decode(&raw)
                .map(Some)
                .map_err(|source| Error::Decode { command, source }),
            None => Ok(None),
        }
    }

    /// Query `rows` lines of `{family}{n}:{item}? {args}` and decode each one.
    pub(crate) fn query_rows<T>(
        &self,
        family: &str,
        item: &str,
        args: &str,
        rows: usize,
        timeout: Option<core::time::Duration>,
        decode: impl Fn(&str) -> core::result::Result<T, DecodeError>,
    ) -> Result<Option<Vec<T>>, S::Error> {
        let command = format!("{}? {}", self.header(family, item), args);
        let Some(lines) = self.session.fetch_rows(&command, rows, timeout)? else {
            return Ok(None);
        };
        lines
            .iter()
            .map(|line| decode(line))
            .collect::<core::result::Result<Vec<T>, _>>()
            .map(Some)
            .map_err(|source| Error::Decode { command, source })
    }

    pub(crate) fn query_f64(&self, family: &str, item: &str) -> Result<Option<f64>, S::Error> {
        self.query(family, item, parse_f64)
    }

    pub(crate) fn query_u32(&self, family: &str, item: &str) -> Result<Option<u32>, S::Error> {
        self.query(family, item, parse_u32)
    }

    pub(crate) fn query_choice<T: Choice>(
        &self,
        family: &str,
        item: &str,
    ) -> Result<Option<T>, S::Error> {
        self.query(family, item, T::decode)
    }

    /// Write an A/B style pair of values.
    pub(crate) fn put_pair(
        &self,
        family: &str,
        items: [&str; 2],
        (a, b): (f64, f64),
    ) -> Result<(), S::Error> {
        self.put(family, items[0], a)?;
        self.put(family, items[1], b)
    }

    pub(crate) fn query_pair(
        &self,
        family: &str,
        items: [&str; 2],
    ) -> Result<Option<(f64, f64)>, S::Error> {
        let Some(a) = self.query_f64(family, items[0])? else {
            return Ok(None);
        };
        Ok(self.query_f64(family, items[1])?.map(|b| (a, b)))
    }

    /// Unwrap a setting an operation can not do without.
    pub(crate) fn require<T>(&self, family: &str, item: &str, value: Option<T>) -> Result<T, S::Error> {
        value.ok_or_else(|| Error::Indeterminate {
            command: format!("{}?", self.header(family, item)),
        })
    }

    // Input and mode

    /// Switch the input on or off.
    pub fn set_input(&self, state: State) -> Result<(), S::Error> {
        self.put("Ch", "SW", state)
    }

    /// Read whether the input is enabled or disabled.
    pub fn get_input(&self) -> Result<Option<State>, S::Error> {
        self.query_choice("Ch", "SW")
    }

    /// Enable the input.
    pub fn on(&self) -> Result<(), S::Error> {
        self.set_input(State::On)
    }

    /// Disable the input.
    pub fn off(&self) -> Result<(), S::Error> {
        self.set_input(State::Off)
    }

    /// Select the operating mode.
    ///
    /// This only switches the mode; the `configure_*` methods also write the
    /// setpoints the mode runs with.
    pub fn set_mode(&self, mode: Mode) -> Result<(), S::Error> {
        self.put("Ch", "MODE", mode)
    }

    /// Get the currently active operating mode.
    pub fn get_mode(&self) -> Result<Option<Mode>, S::Error> {
        self.query_choice("Ch", "MODE")
    }

    /// Set the voltage measurement range.
    pub fn set_voltage_range(&self, range: Range) -> Result<(), S::Error> {
        self.put("LOAD", "VRANGE", range)
    }

    /// Get the voltage measurement range.
    pub fn get_voltage_range(&self) -> Result<Option<Range>, S::Error> {
        self.query_choice("LOAD", "VRANGE")
    }

    /// Set the current measurement range.
    pub fn set_current_range(&self, range: Range) -> Result<(), S::Error> {
        self.put("LOAD", "CRANGE", range)
    }

    /// Get the current measurement range.
    pub fn get_current_range(&self) -> Result<Option<Range>, S::Error> {
        self.query_choice("LOAD", "CRANGE")
    }

    /// Select where trigger events for transient and list mode come from.
    pub fn set_trigger_source(&self, source: TriggerSource) -> Result<(), S::Error> {
        self.put("LOAD", "TRIG", source)
    }

    /// Get where trigger events come from.
    pub fn get_trigger_source(&self) -> Result<Option<TriggerSource>, S::Error> {
        self.query_choice("LOAD", "TRIG")
    }

    /// Send a trigger event, acknowledged by the load unlike [`Et54::trigger`].
    ///
    /// [`Et54::trigger`]: crate::load::Et54::trigger
    pub fn trigger(&self) -> Result<(), S::Error> {
        self.session.execute("*TRG")
    }

    // Protection

    /// Set the over voltage protection limit in volts.
    pub fn set_ovp(&self, voltage: f64) -> Result<(), S::Error> {
        self.put("VOLT", "VMAX", voltage)
    }

    /// Get the over voltage protection limit in volts.
    pub fn get_ovp(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("VOLT", "VMAX")
    }

    /// Set the over current protection limit in amps.
    pub fn set_ocp(&self, current: f64) -> Result<(), S::Error> {
        self.put("CURR", "IMAX", current)
    }

    /// Get the over current protection limit in amps.
    pub fn get_ocp(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("CURR", "IMAX")
    }

    /// Set the over power protection limit in watts.
    pub fn set_opp(&self, power: f64) -> Result<(), S::Error> {
        self.put("POWE", "PMAX", power)
    }

    /// Get the over power protection limit in watts.
    pub fn get_opp(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("POWE", "PMAX")
    }

    /// Which protection has tripped, if any.
    pub fn get_protection_state(&self) -> Result<Option<ProtectionState>, S::Error> {
        self.query_choice("LOAD", "ABNO")
    }

    // Constant current, voltage, power and resistance

    /// Enter constant current mode drawing `current` amps.
    pub fn configure_cc(&self, current: f64) -> Result<(), S::Error> {
        self.set_cc_current(current)?;
        self.set_mode(Mode::Cc)
    }

    /// Set the CC mode current in amps.
    pub fn set_cc_current(&self, current: f64) -> Result<(), S::Error> {
        self.put("CURR", "CC", current)
    }

    /// Get the CC mode current in amps.
    pub fn get_cc_current(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("CURR", "CC")
    }

    /// Enter constant voltage mode holding `voltage` volts.
    pub fn configure_cv(&self, voltage: f64) -> Result<(), S::Error> {
        self.set_cv_voltage(voltage)?;
        self.set_mode(Mode::Cv)
    }

    /// Set the CV mode voltage in volts.
    pub fn set_cv_voltage(&self, voltage: f64) -> Result<(), S::Error> {
        self.put("VOLT", "CV", voltage)
    }

    /// Get the CV mode voltage in volts.
    pub fn get_cv_voltage(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("VOLT", "CV")
    }

    /// Enter constant power mode drawing `power` watts.
    pub fn configure_cp(&self, power: f64) -> Result<(), S::Error> {
        self.set_cp_power(power)?;
        self.set_mode(Mode::Cp)
    }

    /// Set the CP mode power in watts.
    pub fn set_cp_power(&self, power: f64) -> Result<(), S::Error> {
        self.put("POWE", "CP", power)
    }

    /// Get the CP mode power in watts.
    pub fn get_cp_power(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("POWE", "CP")
    }

    /// Enter constant resistance mode at `resistance` ohms.
    pub fn configure_cr(&self, resistance: f64) -> Result<(), S::Error> {
        self.set_cr_resistance(resistance)?;
        self.set_mode(Mode::Cr)
    }

    /// Set the CR mode resistance in ohms.
    pub fn set_cr_resistance(&self, resistance: f64) -> Result<(), S::Error> {
        self.put("RESI", "CR", resistance)
    }

    /// Get the CR mode resistance in ohms.
    pub fn get_cr_resistance(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("RESI", "CR")
    }

    /// Constant current, switching to constant voltage once the input drops to `voltage`.
    pub fn configure_cccv(&self, current: f64, voltage: f64) -> Result<(), S::Error> {
        self.set_cccv_current(current)?;
        self.set_cccv_voltage(voltage)?;
        self.set_mode(Mode::CcCv)
    }

    /// Set the current limit of CC+CV mode in amps.
    pub fn set_cccv_current(&self, current: f64) -> Result<(), S::Error> {
        self.put("CURR", "CCCV", current)
    }

    /// Get the current limit of CC+CV mode in amps.
    pub fn get_cccv_current(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("CURR", "CCCV")
    }

    /// Set the voltage of CC+CV mode in volts.
    pub fn set_cccv_voltage(&self, voltage: f64) -> Result<(), S::Error> {
        self.put("VOLT", "CCCV", voltage)
    }

    /// Get the voltage of CC+CV mode in volts.
    pub fn get_cccv_voltage(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("VOLT", "CCCV")
    }

    /// Constant resistance, switching to constant voltage once the input drops to `voltage`.
    pub fn configure_crcv(&self, resistance: f64, voltage: f64) -> Result<(), S::Error> {
        self.set_crcv_resistance(resistance)?;
        self.set_crcv_voltage(voltage)?;
        self.set_mode(Mode::CrCv)
    }

    /// Set the resistance of CR+CV mode in ohms.
    pub fn set_crcv_resistance(&self, resistance: f64) -> Result<(), S::Error> {
        self.put("RESI", "CRCV", resistance)
    }

    /// Get the resistance of CR+CV mode in ohms.
    pub fn get_crcv_resistance(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("RESI", "CRCV")
    }

    /// Set the voltage of CR+CV mode in volts.
    pub fn set_crcv_voltage(&self, voltage: f64) -> Result<(), S::Error> {
        self.put("VOLT", "CRCV", voltage)
    }

    /// Get the voltage of CR+CV mode in volts.
    pub fn get_crcv_voltage(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("VOLT", "CRCV")
    }

    /// Short the input. There are no setpoints for this mode.
    pub fn configure_short(&self) -> Result<(), S::Error> {
        self.set_mode(Mode::Short)
    }

    // LED simulation

    /// Simulate an LED string with forward `voltage` at `current`.
    ///
    /// `coefficient` shapes the simulated I/V curve.
    pub fn configure_led(&self, voltage: f64, current: f64, coefficient: f64) -> Result<(), S::Error> {
        self.set_led_voltage(voltage)?;
        self.set_led_current(current)?;
        self.set_led_coefficient(coefficient)?;
        self.set_mode(Mode::Led)
    }

    /// Set the forward voltage of the simulated LED in volts.
    pub fn set_led_voltage(&self, voltage: f64) -> Result<(), S::Error> {
        self.put("VOLT", "LED", voltage)
    }

    /// Get the forward voltage of the simulated LED in volts.
    pub fn get_led_voltage(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("VOLT", "LED")
    }

    /// Set the LED current in amps.
    pub fn set_led_current(&self, current: f64) -> Result<(), S::Error> {
        self.put("CURR", "LED", current)
    }

    /// Get the LED current in amps.
    pub fn get_led_current(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("CURR", "LED")
    }

    /// Set the LED coefficient.
    pub fn set_led_coefficient(&self, coefficient: f64) -> Result<(), S::Error> {
        self.put("LED", "COEF", coefficient)
    }

    /// Get the LED coefficient.
    pub fn get_led_coefficient(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("LED", "COEF")
    }

    // Qualification test

    /// Write the pass windows as `(low, high)` pairs and enable the qualification test.
    pub fn configure_qualification(
        &self,
        voltage: (f64, f64),
        current: (f64, f64),
        power: (f64, f64),
    ) -> Result<(), S::Error> {
        self.set_qualification_voltage(voltage)?;
        self.set_qualification_current(current)?;
        self.set_qualification_power(power)?;
        self.set_qualification_test(State::On)
    }

    /// Enable/disable the qualification test.
    pub fn set_qualification_test(&self, state: State) -> Result<(), S::Error> {
        self.put("QUAL", "TEST", state)
    }

    /// Read whether the qualification test is enabled.
    pub fn get_qualification_test(&self) -> Result<Option<State>, S::Error> {
        self.query_choice("QUAL", "TEST")
    }

    /// Return the outcome of the qualification test.
    pub fn get_qualification_result(&self) -> Result<Option<QualificationResult>, S::Error> {
        self.query_choice("QUAL", "OUT")
    }

    /// Set the `(low, high)` voltage window in volts.
    pub fn set_qualification_voltage(&self, window: (f64, f64)) -> Result<(), S::Error> {
        self.put_pair("QUAL", ["VLOW", "VHIGH"], window)
    }

    /// Get the `(low, high)` voltage window in volts.
    pub fn get_qualification_voltage(&self) -> Result<Option<(f64, f64)>, S::Error> {
        self.query_pair("QUAL", ["VLOW", "VHIGH"])
    }

    /// Set the `(low, high)` current window in amps.
    pub fn set_qualification_current(&self, window: (f64, f64)) -> Result<(), S::Error> {
        self.put_pair("QUAL", ["CLOW", "CHIGH"], window)
    }

    /// Get the `(low, high)` current window in amps.
    pub fn get_qualification_current(&self) -> Result<Option<(f64, f64)>, S::Error> {
        self.query_pair("QUAL", ["CLOW", "CHIGH"])
    }

    /// Set the `(low, high)` power window in watts.
    pub fn set_qualification_power(&self, window: (f64, f64)) -> Result<(), S::Error> {
        self.put_pair("QUAL", ["PLOW", "PHIGH"], window)
    }

    /// Get the `(low, high)` power window in watts.
    pub fn get_qualification_power(&self) -> Result<Option<(f64, f64)>, S::Error> {
        self.query_pair("QUAL", ["PLOW", "PHIGH"])
    }

    // Measurements

    /// Read the input voltage in volts.
    pub fn read_voltage(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("MEAS", "VOLTAGE")
    }

    /// Read the input current in amps.
    pub fn read_current(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("MEAS", "CURRENT")
    }

    /// Read the input power in watts.
    pub fn read_power(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("MEAS", "POWER")
    }

    /// Read the input resistance in ohms.
    pub fn read_resistance(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("MEAS", "RESISTANCE")
    }

    /// Read voltage, current, power and resistance in a single exchange.
    pub fn read_all(&self) -> Result<Option<Measurement>, S::Error> {
        self.query("MEAS", "ALL", |raw| match parse_floats(raw)?.as_slice() {
            &[voltage, current, power, resistance] => Ok(Measurement {
                voltage,
                current,
                power,
                resistance,
            }),
            _ => Err(DecodeError::new("four measurements", raw)),
        })
    }
}
