//! Scan mode: sweep a current, voltage or power setpoint and compare a
//! measurement against limits along the way.
//!
//! Limits, range and step are stored under the family of the scan submode
//! (`CURR`, `VOLT` or `POWE`), so their accessors read the submode first.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
    channel::Channel,
    error::{Error, Result},
    transport::Transport,
    types::{Choice, Mode},
};

/// Which setpoint is swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ScanMode {
    #[strum(to_string = "CC")]
    Cc,
    #[strum(to_string = "CV")]
    Cv,
    #[strum(to_string = "CP")]
    Cp,
}

impl ScanMode {
    /// Command family holding the sweep settings of this submode.
    pub const fn family(&self) -> &'static str {
        match self {
            ScanMode::Cc => "CURR",
            ScanMode::Cv => "VOLT",
            ScanMode::Cp => "POWE",
        }
    }
}

impl Choice for ScanMode {
    const WHAT: &'static str = "scan mode";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ThresholdType {
    /// Absolute voltage threshold.
    #[strum(to_string = "VTH")]
    Level,
    /// Voltage drop.
    #[strum(to_string = "DROP")]
    Drop,
    /// Minimum voltage.
    #[strum(to_string = "VMIN")]
    Minimum,
}

impl Choice for ThresholdType {
    const WHAT: &'static str = "threshold type";
}

/// Threshold type together with its value in volts.
///
/// The load offers no command for the value of a drop threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanThreshold {
    Level(f64),
    Minimum(f64),
    Drop,
}

impl ScanThreshold {
    /// The threshold type this threshold selects.
    pub fn kind(&self) -> ThresholdType {
        match self {
            ScanThreshold::Level(_) => ThresholdType::Level,
            ScanThreshold::Minimum(_) => ThresholdType::Minimum,
            ScanThreshold::Drop => ThresholdType::Drop,
        }
    }
}

/// Measurement checked against the scan limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ScanCompare {
    #[strum(to_string = "INCURR")]
    Current,
    #[strum(to_string = "INVOLT")]
    Voltage,
    #[strum(to_string = "INPOW")]
    Power,
    #[strum(to_string = "OFF")]
    Off,
}

impl Choice for ScanCompare {
    const WHAT: &'static str = "scan compare";
}

/// A complete sweep. Limits, range and step are in the unit of `mode`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    pub mode: ScanMode,
    pub threshold: ScanThreshold,
    pub compare: ScanCompare,
    /// `(low, high)`
    pub limits: (f64, f64),
    /// `(start, end)`
    pub range: (f64, f64),
    pub step: f64,
    /// Seconds per step.
    pub step_delay: u32,
}

const DROP_VALUE: &str = "value of a DROP scan threshold";

impl<S: Transport, const L: usize> Channel<'_, S, L> {
    /// Configure and enter scan mode.
    pub fn configure_scan(&self, config: &ScanConfig) -> Result<(), S::Error> {
        let family = config.mode.family();
        self.set_scan_mode(config.mode)?;
        self.set_scan_threshold(config.threshold)?;
        self.set_scan_compare(config.compare)?;
        self.put_pair(family, ["LOW", "HIGH"], config.limits)?;
        self.put_pair(family, ["START", "END"], config.range)?;
        self.put(family, "STEP", config.step)?;
        self.set_scan_step_delay(config.step_delay)?;
        self.set_mode(Mode::Scan)
    }

    /// Read back the complete sweep, `None` if any part of it is absent.
    pub fn get_scan_config(&self) -> Result<Option<ScanConfig>, S::Error> {
        let Some(mode) = self.get_scan_mode()? else {
            return Ok(None);
        };
        let family = mode.family();
        let Some(threshold) = self.get_scan_threshold()? else {
            return Ok(None);
        };
        let Some(compare) = self.get_scan_compare()? else {
            return Ok(None);
        };
        let Some(limits) = self.query_pair(family, ["LOW", "HIGH"])? else {
            return Ok(None);
        };
        let Some(range) = self.query_pair(family, ["START", "END"])? else {
            return Ok(None);
        };
        let Some(step) = self.query_f64(family, "STEP")? else {
            return Ok(None);
        };
        let Some(step_delay) = self.get_scan_step_delay()? else {
            return Ok(None);
        };

        Ok(Some(ScanConfig {
            mode,
            threshold,
            compare,
            limits,
            range,
            step,
            step_delay,
        }))
    }

    /// Select the swept quantity.
    pub fn set_scan_mode(&self, mode: ScanMode) -> Result<(), S::Error> {
        self.put("SCAN", "TYPE", mode)
    }

    /// Get the swept quantity.
    pub fn get_scan_mode(&self) -> Result<Option<ScanMode>, S::Error> {
        self.query_choice("SCAN", "TYPE")
    }

    /// Select the threshold type without changing its value.
    pub fn set_scan_threshold_type(&self, kind: ThresholdType) -> Result<(), S::Error> {
        self.put("SCAN", "THTYPE", kind)
    }

    /// Get the threshold type.
    pub fn get_scan_threshold_type(&self) -> Result<Option<ThresholdType>, S::Error> {
        self.query_choice("SCAN", "THTYPE")
    }

    /// Write the threshold type and, unless it is a drop threshold, its value.
    pub fn set_scan_threshold(&self, threshold: ScanThreshold) -> Result<(), S::Error> {
        self.set_scan_threshold_type(threshold.kind())?;
        match threshold {
            ScanThreshold::Level(voltage) => self.put("VOLT", "VTH", voltage),
            ScanThreshold::Minimum(voltage) => self.put("VOLT", "VMIN", voltage),
            ScanThreshold::Drop => Ok(()),
        }
    }

    /// Get the threshold type together with its value.
    pub fn get_scan_threshold(&self) -> Result<Option<ScanThreshold>, S::Error> {
        Ok(match self.get_scan_threshold_type()? {
            Some(ThresholdType::Level) => self.query_f64("VOLT", "VTH")?.map(ScanThreshold::Level),
            Some(ThresholdType::Minimum) => self
                .query_f64("VOLT", "VMIN")?
                .map(ScanThreshold::Minimum),
            Some(ThresholdType::Drop) => Some(ScanThreshold::Drop),
            None => None,
        })
    }

    /// Set the value of the active threshold type.
    ///
    /// Fails with [`Error::Unsupported`] for a drop threshold, without sending anything.
    pub fn set_scan_threshold_value(&self, voltage: f64) -> Result<(), S::Error> {
        let kind = self.get_scan_threshold_type()?;
        match self.require("SCAN", "THTYPE", kind)? {
            ThresholdType::Level => self.put("VOLT", "VTH", voltage),
            ThresholdType::Minimum => self.put("VOLT", "VMIN", voltage),
            ThresholdType::Drop => Err(Error::Unsupported(DROP_VALUE)),
        }
    }

    /// Get the value of the active threshold in volts.
    pub fn get_scan_threshold_value(&self) -> Result<Option<f64>, S::Error> {
        match self.get_scan_threshold_type()? {
            Some(ThresholdType::Level) => self.query_f64("VOLT", "VTH"),
            Some(ThresholdType::Minimum) => self.query_f64("VOLT", "VMIN"),
            Some(ThresholdType::Drop) => Err(Error::Unsupported(DROP_VALUE)),
            None => Ok(None),
        }
    }

    /// Select which measurement is compared against the limits.
    pub fn set_scan_compare(&self, compare: ScanCompare) -> Result<(), S::Error> {
        self.put("SCAN", "COMPARE", compare)
    }

    /// Get which measurement is compared against the limits.
    pub fn get_scan_compare(&self) -> Result<Option<ScanCompare>, S::Error> {
        self.query_choice("SCAN", "COMPARE")
    }

    /// Set the `(low, high)` limits of the compared measurement.
    pub fn set_scan_limits(&self, limits: (f64, f64)) -> Result<(), S::Error> {
        let family = self.scan_family()?;
        self.put_pair(family, ["LOW", "HIGH"], limits)
    }

    /// Get the `(low, high)` limits of the compared measurement.
    pub fn get_scan_limits(&self) -> Result<Option<(f64, f64)>, S::Error> {
        let Some(mode) = self.get_scan_mode()? else {
            return Ok(None);
        };
        self.query_pair(mode.family(), ["LOW", "HIGH"])
    }

    /// Set the `(start, end)` of the sweep.
    pub fn set_scan_range(&self, range: (f64, f64)) -> Result<(), S::Error> {
        let family = self.scan_family()?;
        self.put_pair(family, ["START", "END"], range)
    }

    /// Get the `(start, end)` of the sweep.
    pub fn get_scan_range(&self) -> Result<Option<(f64, f64)>, S::Error> {
        let Some(mode) = self.get_scan_mode()? else {
            return Ok(None);
        };
        self.query_pair(mode.family(), ["START", "END"])
    }

    /// Set the increment of each sweep step.
    pub fn set_scan_step(&self, step: f64) -> Result<(), S::Error> {
        let family = self.scan_family()?;
        self.put(family, "STEP", step)
    }

    /// Get the increment of each sweep step.
    pub fn get_scan_step(&self) -> Result<Option<f64>, S::Error> {
        let Some(mode) = self.get_scan_mode()? else {
            return Ok(None);
        };
        self.query_f64(mode.family(), "STEP")
    }

    /// Set the time spent on each step in seconds.
    pub fn set_scan_step_delay(&self, seconds: u32) -> Result<(), S::Error> {
        self.put("TIME", "STEP", seconds)
    }

    /// Get the time spent on each step.
    pub fn get_scan_step_delay(&self) -> Result<Option<u32>, S::Error> {
        self.query_u32("TIME", "STEP")
    }

    fn scan_family(&self) -> Result<&'static str, S::Error> {
        let mode = self.get_scan_mode()?;
        Ok(self.require("SCAN", "TYPE", mode)?.family())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_load::{IDN_ET5410A, connect, mock};

    fn sweep() -> ScanConfig {
        ScanConfig {
            mode: ScanMode::Cc,
            threshold: ScanThreshold::Level(10.5),
            compare: ScanCompare::Voltage,
            limits: (11.0, 13.0),
            range: (0.5, 2.5),
            step: 0.25,
            step_delay: 2,
        }
    }

    #[test]
    fn test_configure_scan() {
        let load = connect(IDN_ET5410A);
        let ch = load.channel(1).unwrap();
        ch.configure_scan(&sweep()).unwrap();
        assert_eq!(
            &mock(&load).commands()[1..],
            [
                "SCAN1:TYPE CC",
                "SCAN1:THTYPE VTH",
                "VOLT1:VTH 10.5",
                "SCAN1:COMPARE INVOLT",
                "CURR1:LOW 11",
                "CURR1:HIGH 13",
                "CURR1:START 0.5",
                "CURR1:END 2.5",
                "CURR1:STEP 0.25",
                "TIME1:STEP 2",
                "Ch1:MODE SCAN",
            ]
        );
        assert_eq!(ch.get_scan_config().unwrap(), Some(sweep()));
    }

    #[test]
    fn test_prefix_follows_submode() {
        let load = connect(IDN_ET5410A);
        let ch = load.channel(1).unwrap();

        ch.set_scan_mode(ScanMode::Cc).unwrap();
        ch.set_scan_limits((0.5, 1.2)).unwrap();
        assert_eq!(mock(&load).commands().last().unwrap(), "CURR1:HIGH 1.2");
        mock(&load).clear_commands();
        assert_eq!(ch.get_scan_limits().unwrap(), Some((0.5, 1.2)));
        assert_eq!(
            mock(&load).commands(),
            ["SCAN1:TYPE?", "CURR1:LOW?", "CURR1:HIGH?"]
        );

        ch.set_scan_mode(ScanMode::Cv).unwrap();
        ch.set_scan_limits((1.0, 2.0)).unwrap();
        ch.set_scan_range((3.0, 4.0)).unwrap();
        ch.set_scan_step(0.5).unwrap();
        assert_eq!(ch.get_scan_limits().unwrap(), Some((1.0, 2.0)));
        assert_eq!(ch.get_scan_range().unwrap(), Some((3.0, 4.0)));
        assert_eq!(ch.get_scan_step().unwrap(), Some(0.5));
        assert_eq!(mock(&load).setting("VOLT1:START"), Some("3"));

        ch.set_scan_mode(ScanMode::Cp).unwrap();
        ch.set_scan_step(5.0).unwrap();
        assert_eq!(mock(&load).commands().last().unwrap(), "POWE1:STEP 5");
        assert_eq!(ch.get_scan_range().unwrap(), None);
    }

    #[test]
    fn test_submode_needed_for_sweep_settings() {
        let load = connect(IDN_ET5410A);
        let ch = load.channel(1).unwrap();
        let err = ch.set_scan_step(1.0).unwrap_err();
        assert!(matches!(err, Error::Indeterminate { ref command } if command == "SCAN1:TYPE?"));
        assert_eq!(ch.get_scan_step().unwrap(), None);
    }

    #[test]
    fn test_threshold_value_follows_type() {
        let load = connect(IDN_ET5410A);
        let ch = load.channel(1).unwrap();
        ch.set_scan_threshold_type(ThresholdType::Minimum).unwrap();
        ch.set_scan_threshold_value(9.0).unwrap();
        assert_eq!(mock(&load).commands().last().unwrap(), "VOLT1:VMIN 9");
        assert_eq!(ch.get_scan_threshold_value().unwrap(), Some(9.0));
        assert_eq!(
            ch.get_scan_threshold().unwrap(),
            Some(ScanThreshold::Minimum(9.0))
        );
    }

    #[test]
    fn test_drop_threshold_has_no_value() {
        let load = connect(IDN_ET5410A);
        let ch = load.channel(1).unwrap();
        ch.set_scan_threshold(ScanThreshold::Drop).unwrap();
        assert_eq!(mock(&load).commands().last().unwrap(), "SCAN1:THTYPE DROP");
        assert_eq!(ch.get_scan_threshold().unwrap(), Some(ScanThreshold::Drop));

        mock(&load).clear_commands();
        assert!(matches!(
            ch.set_scan_threshold_value(1.0),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            ch.get_scan_threshold_value(),
            Err(Error::Unsupported(_))
        ));
        assert_eq!(mock(&load).commands(), ["SCAN1:THTYPE?", "SCAN1:THTYPE?"]);
    }

    #[test]
    fn test_compare_and_step_delay() {
        let load = connect(IDN_ET5410A);
        let ch = load.channel(1).unwrap();
        ch.set_scan_compare(ScanCompare::Power).unwrap();
        ch.set_scan_step_delay(3).unwrap();
        assert_eq!(ch.get_scan_compare().unwrap(), Some(ScanCompare::Power));
        assert_eq!(ch.get_scan_step_delay().unwrap(), Some(3));
        assert_eq!(ScanCompare::choose("incurr").unwrap(), ScanCompare::Current);
    }
}
