//! List mode: a program of up to ten rows the load steps through.
//!
//! Rows travel as comma separated lines with integer codes for the row mode and
//! the comparison target. Each code table is one enum whose discriminants are
//! the codes, so encoding and decoding can not disagree.

use core::fmt;
use core::time::Duration;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

use crate::{
    channel::Channel,
    decode::strip_marker,
    error::{DecodeError, Error, InvalidArgument, Result},
    transport::Transport,
    types::{Choice, Mode, State},
};

/// Number of rows in the list of each channel.
pub const LIST_ROWS: u8 = 10;

/// The load builds list dumps row by row, which is slower than other queries.
pub const LIST_TIMEOUT: Duration = Duration::from_millis(2500);

/// How the load advances from one row to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ListStepMode {
    /// After the delay of each row.
    #[strum(to_string = "AUTO")]
    Auto,
    /// On each trigger event.
    #[strum(to_string = "TRIGGER")]
    Trigger,
}

impl Choice for ListStepMode {
    const WHAT: &'static str = "list step mode";
}

/// Operating mode of a single row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter, FromRepr,
)]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum ListMode {
    #[strum(to_string = "CC")]
    Cc = 0,
    #[strum(to_string = "CV")]
    Cv = 1,
    #[strum(to_string = "CP")]
    Cp = 2,
    #[strum(to_string = "CR")]
    Cr = 3,
    #[strum(to_string = "OPEN")]
    Open = 4,
    #[strum(to_string = "SHORT", serialize = "SHOR")]
    Short = 5,
}

impl Choice for ListMode {
    const WHAT: &'static str = "list mode";
}

/// Which measurement a row checks against its limits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter, FromRepr,
)]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Comparison {
    #[strum(to_string = "OFF")]
    Off = 0,
    #[strum(to_string = "CURRENT", serialize = "CURR")]
    Current = 1,
    #[strum(to_string = "VOLTAGE", serialize = "VOLT")]
    Voltage = 2,
    #[strum(to_string = "POWER", serialize = "POW")]
    Power = 3,
    #[strum(to_string = "RESISTANCE", serialize = "RES")]
    Resistance = 4,
}

impl Choice for Comparison {
    const WHAT: &'static str = "comparison";
}

/// Verdict for one row after the list has run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter, FromRepr,
)]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Outcome {
    #[strum(to_string = "NA")]
    NotApplicable = 0,
    #[strum(to_string = "PASS")]
    Pass = 1,
    #[strum(to_string = "FAIL")]
    Fail = 2,
}

/// A numeric list field, or the placeholder the load shows where a field does
/// not apply to the row (usually `---`).
#[derive(Debug, Clone, PartialEq)]
pub enum ListValue {
    Value(f64),
    Placeholder(String),
}

impl ListValue {
    fn parse(field: &str) -> Self {
        let field = field.trim();
        match field.parse() {
            Ok(value) => ListValue::Value(value),
            Err(_) => ListValue::Placeholder(field.to_owned()),
        }
    }

    /// The number, unless the load reported a placeholder.
    pub fn value(&self) -> Option<f64> {
        match self {
            ListValue::Value(value) => Some(*value),
            ListValue::Placeholder(_) => None,
        }
    }
}

impl From<f64> for ListValue {
    fn from(value: f64) -> Self {
        ListValue::Value(value)
    }
}

impl fmt::Display for ListValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListValue::Value(value) => write!(f, "{value}"),
            ListValue::Placeholder(text) => f.write_str(text),
        }
    }
}

/// One row of the list program.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    /// Row number, 1 to 10.
    pub num: u8,
    pub mode: ListMode,
    /// Setpoint in the unit of `mode`.
    pub value: ListValue,
    /// Seconds spent in this row.
    pub delay: u32,
    pub comp: Comparison,
    pub max: ListValue,
    pub min: ListValue,
}

/// Positional form `(num, mode, value, delay, comp, max, min)`.
impl From<(u8, ListMode, f64, u32, Comparison, f64, f64)> for ListRow {
    fn from(
        (num, mode, value, delay, comp, max, min): (u8, ListMode, f64, u32, Comparison, f64, f64),
    ) -> Self {
        ListRow {
            num,
            mode,
            value: value.into(),
            delay,
            comp,
            max: max.into(),
            min: min.into(),
        }
    }
}

impl fmt::Display for ListRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.num, self.mode as u8, self.value, self.delay, self.comp as u8, self.max, self.min
        )
    }
}

impl ListRow {
    fn parse(raw: &str) -> core::result::Result<Self, DecodeError> {
        let fields: Vec<&str> = strip_marker(raw).split(',').map(str::trim).collect();
        let &[num, mode, value, delay, comp, max, min] = fields.as_slice() else {
            return Err(DecodeError::new("a list row", raw));
        };
        Ok(ListRow {
            num: num.parse().map_err(|_| DecodeError::new("a row number", raw))?,
            mode: decode_code(mode, ListMode::from_repr, raw)?,
            value: ListValue::parse(value),
            delay: delay.parse().map_err(|_| DecodeError::new("a delay", raw))?,
            comp: decode_code(comp, Comparison::from_repr, raw)?,
            max: ListValue::parse(max),
            min: ListValue::parse(min),
        })
    }

    fn validate(&self) -> core::result::Result<(), InvalidArgument> {
        if (1..=LIST_ROWS).contains(&self.num) {
            Ok(())
        } else {
            Err(InvalidArgument::OutOfRange {
                what: "list row number",
                value: self.num.into(),
                min: 1,
                max: LIST_ROWS.into(),
            })
        }
    }
}

/// Result of one row after the list has run.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    pub num: u8,
    pub mode: ListMode,
    pub value: ListValue,
    pub result: Outcome,
    pub max: ListValue,
    pub min: ListValue,
}

impl ListResult {
    fn parse(raw: &str) -> core::result::Result<Self, DecodeError> {
        let fields: Vec<&str> = strip_marker(raw).split(',').map(str::trim).collect();
        let &[num, mode, value, result, max, min] = fields.as_slice() else {
            return Err(DecodeError::new("a list result", raw));
        };
        Ok(ListResult {
            num: num.parse().map_err(|_| DecodeError::new("a row number", raw))?,
            mode: decode_code(mode, ListMode::from_repr, raw)?,
            value: ListValue::parse(value),
            result: decode_code(result, Outcome::from_repr, raw)?,
            max: ListValue::parse(max),
            min: ListValue::parse(min),
        })
    }
}

fn decode_code<T>(
    field: &str,
    from_repr: fn(u8) -> Option<T>,
    raw: &str,
) -> core::result::Result<T, DecodeError> {
    field
        .parse()
        .ok()
        .and_then(from_repr)
        .ok_or_else(|| DecodeError::new("a list code", raw))
}

impl<S: Transport, const L: usize> Channel<'_, S, L> {
    /// Configure and enter list mode.
    ///
    /// Rows can be given as [`ListRow`] or as positional tuples. All row
    /// numbers are checked before the first write. The number of steps to run
    /// is set separately with [`Channel::set_list_steps`].
    pub fn configure_list<R: Into<ListRow>>(
        &self,
        step_mode: ListStepMode,
        rows: impl IntoIterator<Item = R>,
    ) -> Result<(), S::Error> {
        let rows = checked_rows(rows)?;
        self.set_list_step_mode(step_mode)?;
        self.put_list_rows(&rows)?;
        self.set_mode(Mode::List)
    }

    /// Choose whether steps advance on their own or on a trigger.
    pub fn set_list_step_mode(&self, step_mode: ListStepMode) -> Result<(), S::Error> {
        self.put("LIST", "MODE", step_mode)
    }

    /// Get how steps advance.
    pub fn get_list_step_mode(&self) -> Result<Option<ListStepMode>, S::Error> {
        self.query_choice("LIST", "MODE")
    }

    /// Write rows of the list, one command per row.
    pub fn set_list_rows<R: Into<ListRow>>(
        &self,
        rows: impl IntoIterator<Item = R>,
    ) -> Result<(), S::Error> {
        let rows = checked_rows(rows)?;
        self.put_list_rows(&rows)
    }

    /// Read all ten rows of the list.
    pub fn get_list_rows(&self) -> Result<Option<Vec<ListRow>>, S::Error> {
        self.query_rows(
            "LIST",
            "PARA",
            &format!("1,{LIST_ROWS}"),
            LIST_ROWS.into(),
            Some(LIST_TIMEOUT),
            ListRow::parse,
        )
    }

    /// Repeat the list once it reaches the last step.
    pub fn set_list_loop(&self, state: State) -> Result<(), S::Error> {
        self.put("LIST", "LOOP", state)
    }

    /// Read whether the list repeats.
    pub fn get_list_loop(&self) -> Result<Option<State>, S::Error> {
        self.query_choice("LIST", "LOOP")
    }

    /// Set how many rows of the list are run.
    pub fn set_list_steps(&self, steps: u32) -> Result<(), S::Error> {
        if !(1..=u32::from(LIST_ROWS)).contains(&steps) {
            return Err(InvalidArgument::OutOfRange {
                what: "list steps",
                value: steps,
                min: 1,
                max: LIST_ROWS.into(),
            }
            .into());
        }
        self.put("LIST", "NUM", steps)
    }

    /// Get how many rows of the list are run.
    pub fn get_list_steps(&self) -> Result<Option<u32>, S::Error> {
        self.query_u32("LIST", "NUM")
    }

    /// Read the result of every step of the last run.
    pub fn get_list_result(&self) -> Result<Option<Vec<ListResult>>, S::Error> {
        let Some(steps) = self.get_list_steps()? else {
            return Ok(None);
        };
        if steps == 0 {
            return Ok(Some(Vec::new()));
        }
        if steps > u32::from(LIST_ROWS) {
            return Err(Error::Decode {
                command: format!("{}?", self.header("LIST", "NUM")),
                source: DecodeError::new("list steps 0..=10", steps.to_string()),
            });
        }
        self.query_rows(
            "LIST",
            "OUT",
            &format!("1,{steps}"),
            steps as usize,
            Some(LIST_TIMEOUT),
            ListResult::parse,
        )
    }

    fn put_list_rows(&self, rows: &[ListRow]) -> Result<(), S::Error> {
        rows.iter().try_for_each(|row| self.put("LIST", "PARA", row))
    }
}

fn checked_rows<R: Into<ListRow>>(
    rows: impl IntoIterator<Item = R>,
) -> core::result::Result<Vec<ListRow>, InvalidArgument> {
    let rows: Vec<ListRow> = rows.into_iter().map(Into::into).collect();
    rows.iter().try_for_each(ListRow::validate)?;
    Ok(rows)
}
