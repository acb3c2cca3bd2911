//! Configuration for property-based checks.
//!
//! The checks themselves are delegated to a property-testing engine; this
//! module only owns the configuration record and how per-call overrides are
//! merged over suite-level defaults.

use crate::error::{Error, Result};

/// Parameters handed to the property-testing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyCheckConfig {
    /// Passing evaluations required before the property holds.
    pub min_successful: u32,
    /// Discarded evaluations tolerated before giving up.
    pub max_skipped: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub workers: u32,
}

impl Default for PropertyCheckConfig {
    fn default() -> Self {
        PropertyCheckConfig {
            min_successful: 100,
            max_skipped: 500,
            min_size: 0,
            max_size: 100,
            workers: 1,
        }
    }
}

impl PropertyCheckConfig {
    pub fn new(
        min_successful: u32,
        max_skipped: u32,
        min_size: u32,
        max_size: u32,
        workers: u32,
    ) -> Result<Self> {
        let config = PropertyCheckConfig {
            min_successful,
            max_skipped,
            min_size,
            max_size,
            workers,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_successful == 0 {
            return Err(Error::InvalidConfiguration(
                "min_successful must be greater than zero".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfiguration(
                "workers must be greater than zero".to_string(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(Error::InvalidConfiguration(format!(
                "min_size ({}) must not exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}

/// A single per-call override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyCheckParam {
    MinSuccessful(u32),
    MaxSkipped(u32),
    MinSize(u32),
    MaxSize(u32),
    Workers(u32),
}

impl PropertyCheckParam {
    pub fn name(&self) -> &'static str {
        match self {
            PropertyCheckParam::MinSuccessful(_) => "min_successful",
            PropertyCheckParam::MaxSkipped(_) => "max_skipped",
            PropertyCheckParam::MinSize(_) => "min_size",
            PropertyCheckParam::MaxSize(_) => "max_size",
            PropertyCheckParam::Workers(_) => "workers",
        }
    }
}

/// Merge `overrides` over `defaults`, field by field.
///
/// Each parameter may appear at most once; a repeated parameter fails the
/// whole call before anything is merged. The merged record must itself be
/// valid.
///
/// ```rust
/// use specwright::property::{merge, PropertyCheckConfig, PropertyCheckParam};
///
/// let defaults = PropertyCheckConfig::default();
/// let merged = merge(&[PropertyCheckParam::Workers(4)], &defaults).unwrap();
/// assert_eq!(merged.workers, 4);
/// assert_eq!(merged.min_successful, defaults.min_successful);
/// ```
pub fn merge(
    overrides: &[PropertyCheckParam],
    defaults: &PropertyCheckConfig,
) -> Result<PropertyCheckConfig> {
    let mut min_successful = None;
    let mut max_skipped = None;
    let mut min_size = None;
    let mut max_size = None;
    let mut workers = None;

    for param in overrides {
        let (slot, value) = match *param {
            PropertyCheckParam::MinSuccessful(v) => (&mut min_successful, v),
            PropertyCheckParam::MaxSkipped(v) => (&mut max_skipped, v),
            PropertyCheckParam::MinSize(v) => (&mut min_size, v),
            PropertyCheckParam::MaxSize(v) => (&mut max_size, v),
            PropertyCheckParam::Workers(v) => (&mut workers, v),
        };
        if slot.replace(value).is_some() {
            return Err(Error::InvalidConfiguration(format!(
                "{} was given more than once",
                param.name()
            )));
        }
    }

    let merged = PropertyCheckConfig {
        min_successful: min_successful.unwrap_or(defaults.min_successful),
        max_skipped: max_skipped.unwrap_or(defaults.max_skipped),
        min_size: min_size.unwrap_or(defaults.min_size),
        max_size: max_size.unwrap_or(defaults.max_size),
        workers: workers.unwrap_or(defaults.workers),
    };
    merged.validate()?;
    Ok(merged)
}
