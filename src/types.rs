//! This module contains the enumerated settings of the load and their wire names.
//!
//! Every enum derives its wire name from strum: `Display`/`AsRef<str>` give the
//! exact token the load sends back, `FromStr` accepts that token (and a few
//! documented aliases) in any case.

use core::str::FromStr;

use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::decode::strip_marker;
use crate::error::{DecodeError, InvalidArgument};

/// An enumerated setting which can be chosen by name.
pub trait Choice: Copy + FromStr + IntoEnumIterator + AsRef<str> {
    /// What the setting is called in error messages.
    const WHAT: &'static str;

    /// Pick a variant by name, failing with the list of valid names.
    fn choose(value: &str) -> Result<Self, InvalidArgument> {
        Self::from_str(value.trim()).map_err(|_| InvalidArgument::Choice {
            what: Self::WHAT,
            value: value.to_owned(),
            valid: valid_names::<Self>(),
        })
    }

    /// Decode a response line naming a variant.
    fn decode(raw: &str) -> Result<Self, DecodeError> {
        Self::from_str(strip_marker(raw)).map_err(|_| DecodeError::new(Self::WHAT, raw))
    }
}

fn valid_names<T: Choice>() -> String {
    T::iter()
        .map(|variant| variant.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join("|")
}

/// Used to be less ambiguous about whether something is on or off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum State {
    #[default]
    #[strum(to_string = "OFF")]
    Off,
    #[strum(to_string = "ON")]
    On,
}

impl Choice for State {
    const WHAT: &'static str = "state";
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// Operating mode of a load channel. Only one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    /// Constant current.
    #[strum(to_string = "CC")]
    Cc,
    /// Constant voltage.
    #[strum(to_string = "CV")]
    Cv,
    /// Constant power.
    #[strum(to_string = "CP")]
    Cp,
    /// Constant resistance.
    #[strum(to_string = "CR")]
    Cr,
    /// Constant current with a voltage limit.
    #[strum(to_string = "CCCV")]
    CcCv,
    /// Constant resistance with a voltage limit.
    #[strum(to_string = "CRCV")]
    CrCv,
    /// Short circuit.
    #[strum(to_string = "SHOR", serialize = "SHORT")]
    Short,
    /// LED simulation.
    #[strum(to_string = "LED")]
    Led,
    /// Battery discharge test.
    #[strum(to_string = "BATT", serialize = "BATTERY")]
    Battery,
    /// Dynamic switching between two states.
    #[strum(to_string = "TRAN", serialize = "TRANSIENT")]
    Transient,
    /// Sequential program of up to 10 rows.
    #[strum(to_string = "LIST")]
    List,
    /// Sweep of a setpoint while checking limits.
    #[strum(to_string = "SCAN")]
    Scan,
}

impl Choice for Mode {
    const WHAT: &'static str = "mode";
}

/// Voltage or current measurement range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Range {
    #[strum(to_string = "LOW")]
    Low,
    #[strum(to_string = "HIGH")]
    High,
}

impl Choice for Range {
    const WHAT: &'static str = "range";
}

/// Where trigger events come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum TriggerSource {
    /// TRIG button on the front panel.
    #[strum(to_string = "MAN")]
    Manual,
    /// Trigger connector on the back.
    #[strum(to_string = "EXT")]
    External,
    /// Remote trigger, see [`Et54::trigger`](crate::load::Et54::trigger).
    #[strum(to_string = "TRG")]
    Remote,
}

impl Choice for TriggerSource {
    const WHAT: &'static str = "trigger source";
}

/// Protection which has tripped on a channel, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ProtectionState {
    #[strum(to_string = "NONE")]
    None,
    #[strum(to_string = "OV")]
    OverVoltage,
    #[strum(to_string = "OC")]
    OverCurrent,
    #[strum(to_string = "OP")]
    OverPower,
    #[strum(to_string = "OT")]
    OverTemperature,
    /// Reverse voltage.
    #[strum(to_string = "LRV")]
    ReverseVoltage,
    /// Fan failure.
    #[strum(to_string = "FAN")]
    Fan,
}

impl Choice for ProtectionState {
    const WHAT: &'static str = "protection state";
}

/// Verdict of the qualification test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum QualificationResult {
    #[strum(to_string = "NONE")]
    None,
    #[strum(to_string = "PASS")]
    Pass,
    #[strum(to_string = "FAIL")]
    Fail,
}

impl Choice for QualificationResult {
    const WHAT: &'static str = "qualification result";
}
