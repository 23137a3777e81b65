//! Battery discharge mode.
//!
//! The battery is discharged at constant current or constant resistance until a
//! cutoff condition is met. With a voltage cutoff in CC mode the load steps the
//! current down in up to three levels, each ending at its own cutoff voltage; the
//! current and cutoff voltage then take three values instead of one.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

use crate::{
    channel::Channel,
    decode::{LEVELS, extend_levels, parse_u32, single},
    error::{DecodeError, InvalidArgument, Result},
    transport::Transport,
    types::{Choice, Mode},
};

/// How the battery is discharged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum BatteryMode {
    #[strum(to_string = "CC")]
    Cc,
    #[strum(to_string = "CR")]
    Cr,
}

impl Choice for BatteryMode {
    const WHAT: &'static str = "battery mode";
}

/// What ends the discharge.
///
/// Written to the load as a single letter, read back as the full word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Cutoff {
    #[strum(to_string = "Voltage", serialize = "V")]
    Voltage,
    #[strum(to_string = "Time", serialize = "T")]
    Time,
    #[strum(to_string = "Energy", serialize = "E")]
    Energy,
    #[strum(to_string = "Capacity", serialize = "C")]
    Capacity,
}

impl Cutoff {
    /// The letter used to select this cutoff.
    pub const fn code(&self) -> &'static str {
        match self {
            Cutoff::Voltage => "V",
            Cutoff::Time => "T",
            Cutoff::Energy => "E",
            Cutoff::Capacity => "C",
        }
    }
}

impl Choice for Cutoff {
    const WHAT: &'static str = "cutoff";
}

/// Level of a levelled discharge the load acts as if it had already reached.
///
/// The default third level waits for the voltage to drop through every level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, FromRepr)]
#[repr(u8)]
pub enum CutoffLevel {
    First = 1,
    Second = 2,
    #[default]
    Third = 3,
}

/// A setpoint which is either a single value or three levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setpoint {
    Single(f64),
    Levels([f64; LEVELS]),
}

impl Setpoint {
    /// Build the shape a setpoint takes: `levelled` extends 1 to 3 values to
    /// three levels, otherwise exactly one value is required.
    pub(crate) fn shape(
        what: &'static str,
        levelled: bool,
        values: &[f64],
    ) -> core::result::Result<Self, InvalidArgument> {
        if levelled {
            extend_levels(what, values).map(Setpoint::Levels)
        } else {
            single(what, values).map(Setpoint::Single)
        }
    }
}

/// The cutoff condition together with its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutoffValue {
    /// Volts.
    Voltage(Setpoint),
    /// Seconds.
    Time(f64),
    /// Watt hours.
    Energy(f64),
    /// Amp hours.
    Capacity(f64),
}

impl CutoffValue {
    fn shape(
        cutoff: Cutoff,
        levelled: bool,
        values: &[f64],
    ) -> core::result::Result<Self, InvalidArgument> {
        Ok(match cutoff {
            Cutoff::Voltage => CutoffValue::Voltage(Setpoint::shape("cutoff voltage", levelled, values)?),
            Cutoff::Time => CutoffValue::Time(single("cutoff time", values)?),
            Cutoff::Energy => CutoffValue::Energy(single("cutoff energy", values)?),
            Cutoff::Capacity => CutoffValue::Capacity(single("cutoff capacity", values)?),
        })
    }
}

/// Levelled setpoints apply only to CC discharge with a voltage cutoff.
fn is_levelled(mode: BatteryMode, cutoff: Cutoff) -> bool {
    mode == BatteryMode::Cc && cutoff == Cutoff::Voltage
}

impl<S: Transport, const L: usize> Channel<'_, S, L> {
    /// Configure and enter battery mode.
    ///
    /// `setpoint` is the discharge current for [`BatteryMode::Cc`] and the
    /// resistance for [`BatteryMode::Cr`]. Both `setpoint` and `cutoff_value`
    /// take 1 to 3 values for a voltage cutoff in CC mode, where missing levels
    /// repeat the last value, and exactly one value otherwise. Everything is
    /// checked before the first write.
    pub fn configure_battery(
        &self,
        mode: BatteryMode,
        setpoint: &[f64],
        cutoff: Cutoff,
        cutoff_value: &[f64],
    ) -> Result<(), S::Error> {
        let levelled = is_levelled(mode, cutoff);
        let setpoint = match mode {
            BatteryMode::Cc => Setpoint::shape("battery current", levelled, setpoint)?,
            BatteryMode::Cr => Setpoint::Single(single("battery resistance", setpoint)?),
        };
        let cutoff_value = CutoffValue::shape(cutoff, levelled, cutoff_value)?;

        self.set_battery_mode(mode)?;
        self.set_battery_cutoff(cutoff)?;
        match (mode, setpoint) {
            (BatteryMode::Cr, Setpoint::Single(resistance)) => self.set_battery_resistance(resistance)?,
            _ => self.put_setpoint("CURR", "BCC", "BCC", setpoint)?,
        }
        self.put_cutoff_value(cutoff_value)?;
        self.set_mode(Mode::Battery)
    }

    /// Select CC or CR discharge.
    pub fn set_battery_mode(&self, mode: BatteryMode) -> Result<(), S::Error> {
        self.put("BATT", "MODE", mode)
    }

    /// Get the discharge submode.
    pub fn get_battery_mode(&self) -> Result<Option<BatteryMode>, S::Error> {
        self.query_choice("BATT", "MODE")
    }

    /// Select the cutoff type. The current cutoff value is kept by the load.
    pub fn set_battery_cutoff(&self, cutoff: Cutoff) -> Result<(), S::Error> {
        self.put("BATT", "BCUT", cutoff.code())
    }

    /// Get the cutoff type.
    pub fn get_battery_cutoff(&self) -> Result<Option<Cutoff>, S::Error> {
        self.query_choice("BATT", "BCUT")
    }

    /// Set the discharge current of CC battery mode.
    ///
    /// Takes 1 to 3 levels with a voltage cutoff, exactly one value otherwise.
    /// The battery mode and cutoff are read from the load to decide which.
    pub fn set_battery_current(&self, current: &[f64]) -> Result<(), S::Error> {
        extend_levels("battery current", current)?;
        let levelled = self.battery_levelled()?;
        let setpoint = Setpoint::shape("battery current", levelled, current)?;
        self.put_setpoint("CURR", "BCC", "BCC", setpoint)
    }

    /// Get the discharge current, in the shape the current mode and cutoff use.
    pub fn get_battery_current(&self) -> Result<Option<Setpoint>, S::Error> {
        let Some(levelled) = self.query_battery_levelled()? else {
            return Ok(None);
        };
        self.query_setpoint("CURR", "BCC", "BCC", levelled)
    }

    /// Set the discharge resistance of CR battery mode.
    pub fn set_battery_resistance(&self, resistance: f64) -> Result<(), S::Error> {
        self.put("RESI", "BCR", resistance)
    }

    /// Get the CR discharge resistance in ohms.
    pub fn get_battery_resistance(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("RESI", "BCR")
    }

    /// Set the value of the active cutoff.
    ///
    /// A voltage cutoff in CC mode takes 1 to 3 levels, every other cutoff
    /// exactly one value.
    pub fn set_battery_cutoff_value(&self, value: &[f64]) -> Result<(), S::Error> {
        extend_levels("cutoff value", value)?;
        let (mode, cutoff) = self.battery_shape()?;
        let value = CutoffValue::shape(cutoff, is_levelled(mode, cutoff), value)?;
        self.put_cutoff_value(value)
    }

    /// Get the value of the active cutoff.
    pub fn get_battery_cutoff_value(&self) -> Result<Option<CutoffValue>, S::Error> {
        let Some(mode) = self.get_battery_mode()? else {
            return Ok(None);
        };
        let Some(cutoff) = self.get_battery_cutoff()? else {
            return Ok(None);
        };

        Ok(match cutoff {
            Cutoff::Voltage => self
                .query_setpoint("VOLT", "BCC3", "BCC", is_levelled(mode, cutoff))?
                .map(CutoffValue::Voltage),
            Cutoff::Time => self.query_f64("TIME", "BTT")?.map(CutoffValue::Time),
            Cutoff::Energy => self.query_f64("BATT", "BTE")?.map(CutoffValue::Energy),
            Cutoff::Capacity => self.query_f64("BATT", "BTC")?.map(CutoffValue::Capacity),
        })
    }

    /// Make the load act as though `level` had been reached without waiting
    /// for the voltage to drop.
    pub fn set_battery_cutoff_level(&self, level: CutoffLevel) -> Result<(), S::Error> {
        self.put("BATT", "BAEN", level as u8)
    }

    /// Get the level the discharge is treated as having reached.
    pub fn get_battery_cutoff_level(&self) -> Result<Option<CutoffLevel>, S::Error> {
        self.query("BATT", "BAEN", |raw| {
            let level = parse_u32(raw)?;
            u8::try_from(level)
                .ok()
                .and_then(CutoffLevel::from_repr)
                .ok_or_else(|| DecodeError::new("a cutoff level", raw))
        })
    }

    /// Read the capacity discharged so far in amp hours.
    pub fn read_battery_capacity(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("BATT", "CAPA")
    }

    /// Read the energy discharged so far in watt hours.
    pub fn read_battery_energy(&self) -> Result<Option<f64>, S::Error> {
        self.query_f64("BATT", "ENER")
    }

    fn battery_shape(&self) -> Result<(BatteryMode, Cutoff), S::Error> {
        let mode = self.get_battery_mode()?;
        let mode = self.require("BATT", "MODE", mode)?;
        let cutoff = self.get_battery_cutoff()?;
        let cutoff = self.require("BATT", "BCUT", cutoff)?;
        Ok((mode, cutoff))
    }

    fn battery_levelled(&self) -> Result<bool, S::Error> {
        let (mode, cutoff) = self.battery_shape()?;
        Ok(is_levelled(mode, cutoff))
    }

    fn query_battery_levelled(&self) -> Result<Option<bool>, S::Error> {
        let Some(mode) = self.get_battery_mode()? else {
            return Ok(None);
        };
        Ok(self
            .get_battery_cutoff()?
            .map(|cutoff| is_levelled(mode, cutoff)))
    }

    fn put_cutoff_value(&self, value: CutoffValue) -> Result<(), S::Error> {
        match value {
            // A single cutoff voltage goes to every level so the one in use is set.
            CutoffValue::Voltage(Setpoint::Single(voltage)) => {
                self.put_setpoint("VOLT", "BCC3", "BCC", Setpoint::Levels([voltage; LEVELS]))
            }
            CutoffValue::Voltage(setpoint) => self.put_setpoint("VOLT", "BCC3", "BCC", setpoint),
            CutoffValue::Time(time) => self.put("TIME", "BTT", time),
            CutoffValue::Energy(energy) => self.put("BATT", "BTE", energy),
            CutoffValue::Capacity(capacity) => self.put("BATT", "BTC", capacity),
        }
    }

    /// Write a single setpoint to `single_item` or levels to `level_item`1..3.
    fn put_setpoint(
        &self,
        family: &str,
        single_item: &str,
        level_item: &str,
        setpoint: Setpoint,
    ) -> Result<(), S::Error> {
        match setpoint {
            Setpoint::Single(value) => self.put(family, single_item, value),
            Setpoint::Levels(levels) => levels
                .iter()
                .enumerate()
                .try_for_each(|(i, level)| self.put(family, &format!("{level_item}{}", i + 1), level)),
        }
    }

    fn query_setpoint(
        &self,
        family: &str,
        single_item: &str,
        level_item: &str,
        levelled: bool,
    ) -> Result<Option<Setpoint>, S::Error> {
        if !levelled {
            return Ok(self.query_f64(family, single_item)?.map(Setpoint::Single));
        }

        let mut levels = [0.0; LEVELS];
        for (i, level) in levels.iter_mut().enumerate() {
            match self.query_f64(family, &format!("{level_item}{}", i + 1))? {
                Some(value) => *level = value,
                None => return Ok(None),
            }
        }
        Ok(Some(Setpoint::Levels(levels)))
    }
}
