//! Transient mode: the load switches between two levels A and B.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
    channel::Channel,
    error::Result,
    transport::Transport,
    types::{Choice, Mode},
};

/// Whether the A/B levels are currents or voltages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum TransientMode {
    #[strum(to_string = "CC")]
    Cc,
    #[strum(to_string = "CV")]
    Cv,
}

impl Choice for TransientMode {
    const WHAT: &'static str = "transient mode";
}

/// How the load moves between level A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum TransientTrigger {
    /// Alternate continuously using both widths.
    #[strum(to_string = "COUT", serialize = "CONT")]
    Continuous,
    /// Go to B for width B on each trigger.
    #[strum(to_string = "PULS")]
    Pulse,
    /// Toggle between A and B on each trigger.
    #[strum(to_string = "TRIG")]
    Toggle,
}

impl Choice for TransientTrigger {
    const WHAT: &'static str = "transient trigger";
}

impl<S: Transport, const L: usize> Channel<'_, S, L> {
    /// Configure and enter transient mode.
    ///
    /// `levels` are amps for [`TransientMode::Cc`] or volts for
    /// [`TransientMode::Cv`], `widths` are in milliseconds. All pairs are `(A, B)`.
    pub fn configure_transient(
        &self,
        mode: TransientMode,
        trigger: TransientTrigger,
        levels: (f64, f64),
        widths: (f64, f64),
    ) -> Result<(), S::Error> {
        self.set_transient_mode(mode)?;
        self.set_transient_trigger(trigger)?;
        match mode {
            TransientMode::Cc => self.set_transient_current(levels)?,
            TransientMode::Cv => self.set_transient_voltage(levels)?,
        }
        self.set_transient_width(widths)?;
        self.set_mode(Mode::Transient)
    }

    /// Select CC or CV switching.
    pub fn set_transient_mode(&self, mode: TransientMode) -> Result<(), S::Error> {
        self.put("TRAN", "STATE", mode)
    }

    /// Get the transient submode.
    pub fn get_transient_mode(&self) -> Result<Option<TransientMode>, S::Error> {
        self.query_choice("TRAN", "STATE")
    }

    /// Select how the load moves between the A and B levels.
    pub fn set_transient_trigger(&self, trigger: TransientTrigger) -> Result<(), S::Error> {
        self.put("TRAN", "MODE", trigger)
    }

    /// Get how the load moves between the A and B levels.
    pub fn get_transient_trigger(&self) -> Result<Option<TransientTrigger>, S::Error> {
        self.query_choice("TRAN", "MODE")
    }

    /// Set the A and B currents in amps.
    pub fn set_transient_current(&self, levels: (f64, f64)) -> Result<(), S::Error> {
        self.put_pair("CURR", ["TA", "TB"], levels)
    }

    /// Get the A and B currents in amps.
    pub fn get_transient_current(&self) -> Result<Option<(f64, f64)>, S::Error> {
        self.query_pair("CURR", ["TA", "TB"])
    }

    /// Set the A and B voltages in volts.
    pub fn set_transient_voltage(&self, levels: (f64, f64)) -> Result<(), S::Error> {
        self.put_pair("VOLT", ["TA", "TB"], levels)
    }

    /// Get the A and B voltages in volts.
    pub fn get_transient_voltage(&self) -> Result<Option<(f64, f64)>, S::Error> {
        self.query_pair("VOLT", ["TA", "TB"])
    }

    /// Set how long the A and B levels are held.
    pub fn set_transient_width(&self, widths: (f64, f64)) -> Result<(), S::Error> {
        self.put_pair("TIME", ["WA", "WB"], widths)
    }

    /// Get how long the A and B levels are held.
    pub fn get_transient_width(&self) -> Result<Option<(f64, f64)>, S::Error> {
        self.query_pair("TIME", ["WA", "WB"])
    }
}
