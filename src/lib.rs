//! This crate provides an interface for communicating with and controlling the East Tester ET54 series of programmable electronic loads.
//!
//! Supported models and their number of channels:
//! * ET5410 (1)
//! * ET5410A+ (1)
//! * ET5411 (1)
//! * ET5411A+ (1)
//! * ET5420A+ (2)
//!
//! Rebranded ET5410A+ units (e.g. Mustool) identify themselves as `XXXXXX`; set
//! [`LoadConfig::model`](config::LoadConfig::model) to connect to them.
//!
//! The loads speak a line based text protocol over their USB serial port. Commands
//! end in `\n`, responses in `\r\n`. Any byte stream implementing
//! [`Transport`](transport::Transport) can carry it; with the default `serial`
//! feature [`Et54::connect`](load::Et54::connect) opens a serial port directly.
//!
//! The serial port used for load comms should be configured like so:
//! * Default baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! ```no_run
//! use et54_load::{config::LoadConfig, load::Et54};
//!
//! let load = Et54::connect("/dev/ttyUSB0", &LoadConfig::default())?;
//! let ch = load.channel(1).unwrap();
//! ch.configure_cc(1.5)?;
//! ch.on()?;
//! println!("{:?}", ch.read_all()?);
//! ch.off()?;
//! # Ok::<(), et54_load::error::Error<et54_load::transport::IoError>>(())
//! ```

pub mod battery;
pub mod channel;
pub mod config;
pub mod decode;
pub mod error;
pub mod list;
pub mod load;
pub mod model;
pub mod scan;
pub mod transient;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock_load;
