//! Identification of the connected load and the channel layout of each model.

use core::fmt;
use core::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString};

use crate::error::Error;

/// `*IDN?` model token reported by rebranded (e.g. Mustool) ET5410A+ units.
pub const REBRAND_MODEL: &str = "XXXXXX";

/// This enum represents all supported product models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Model {
    #[strum(to_string = "ET5410")]
    Et5410,
    #[strum(to_string = "ET5410A+")]
    Et5410APlus,
    #[strum(to_string = "ET5411")]
    Et5411,
    #[strum(to_string = "ET5411A+")]
    Et5411APlus,
    #[strum(to_string = "ET5420A+")]
    Et5420APlus,
}

impl Model {
    /// Number of independent load channels on this model.
    pub const fn channel_count(&self) -> u8 {
        match self {
            Model::Et5410 | Model::Et5410APlus | Model::Et5411 | Model::Et5411APlus => 1,
            Model::Et5420APlus => 2,
        }
    }

    /// Look up a model string, failing with [`Error::UnsupportedModel`].
    pub fn lookup<I: embedded_io::Error>(model: &str) -> Result<Self, Error<I>> {
        Model::from_str(model.trim()).map_err(|_| Error::UnsupportedModel(model.to_owned()))
    }
}

/// What the load reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub model: String,
    /// Rebranded units do not report a serial number.
    pub serial: Option<String>,
    pub firmware: String,
    pub hardware: String,
}

impl Identity {
    /// Parse the response to `*IDN?`.
    ///
    /// Returns `None` unless the response is either `model serial firmware hardware`
    /// or the three token rebrand form `XXXXXX firmware hardware`.
    pub fn parse(response: &str) -> Option<Self> {
        let tokens: Vec<&str> = response.split_whitespace().collect();
        match tokens.as_slice() {
            [model, serial, firmware, hardware] => Some(Identity {
                model: model.to_string(),
                serial: Some(serial.to_string()),
                firmware: firmware.to_string(),
                hardware: hardware.to_string(),
            }),
            [model, firmware, hardware] if *model == REBRAND_MODEL => Some(Identity {
                model: model.to_string(),
                serial: None,
                firmware: firmware.to_string(),
                hardware: hardware.to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model:          {}", self.model)?;
        writeln!(f, "Serial:         {}", self.serial.as_deref().unwrap_or("-"))?;
        writeln!(f, "Firmware:       {}", self.firmware)?;
        write!(f, "Hardware:       {}", self.hardware)
    }
}
