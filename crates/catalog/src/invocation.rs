//! Invocation inputs and their validation into a [`Mode`].

use std::fmt;

use lakesync_core::{Day, DayError, TableName};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Raw invocation as received from the CLI or an event payload.
///
/// Event payloads use the keys `exec_type`, `targettable` and
/// `specdif_targetday`; those are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(default, alias = "exec_type")]
    pub mode: Option<String>,
    #[serde(default, alias = "targettable")]
    pub table: Option<String>,
    #[serde(default, alias = "specdif_targetday", alias = "targetDay")]
    pub target_day: Option<String>,
}

/// A validated execution mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Every configured table against the previous day.
    PrevDiff,
    /// One table against an explicit day.
    SpecDiff { table: TableName, target_day: Day },
    /// One table, full scan without diffing.
    FullScan { table: TableName },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::PrevDiff => "prevdif",
            Mode::SpecDiff { .. } => "specdif",
            Mode::FullScan { .. } => "fulscan",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::PrevDiff => write!(f, "prevdif"),
            Mode::SpecDiff { table, target_day } => write!(f, "specdif table={table} target_day={target_day}"),
            Mode::FullScan { table } => write!(f, "fulscan table={table}"),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Invocation {
    pub fn new(mode: &str) -> Self {
        Self {
            mode: Some(mode.to_string()),
            ..Self::default()
        }
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn with_target_day(mut self, day: &str) -> Self {
        self.target_day = Some(day.to_string());
        self
    }

    /// Check every required field. Pure: no external call is made.
    pub fn validate(&self) -> Result<Mode, CatalogError> {
        let mode = present(&self.mode)
            .ok_or_else(|| CatalogError::InvalidInvocation("mode is not set".into()))?;

        match mode {
            "prevdif" => Ok(Mode::PrevDiff),
            "specdif" => {
                let raw_day = present(&self.target_day).ok_or_else(|| {
                    CatalogError::InvalidInvocation("specdif requires a target day".into())
                })?;
                let target_day = Day::parse_canonical(raw_day).map_err(|e| match e {
                    DayError::Format(_) => CatalogError::InvalidInvocation(format!(
                        "target day '{raw_day}' must be YYYYMMDD"
                    )),
                    DayError::Calendar(_) => CatalogError::InvalidInvocation(format!(
                        "target day '{raw_day}' is not a valid date"
                    )),
                })?;
                let table = present(&self.table).ok_or_else(|| {
                    CatalogError::InvalidInvocation("specdif requires a target table".into())
                })?;
                Ok(Mode::SpecDiff {
                    table: TableName::new(table),
                    target_day,
                })
            }
            "fulscan" => {
                let table = present(&self.table).ok_or_else(|| {
                    CatalogError::InvalidInvocation("fulscan requires a target table".into())
                })?;
                Ok(Mode::FullScan {
                    table: TableName::new(table),
                })
            }
            other => Err(CatalogError::InvalidInvocation(format!(
                "unknown mode '{other}', expected prevdif, specdif or fulscan"
            ))),
        }
    }
}
