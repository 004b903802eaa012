use std::fmt::{self, Display};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ------------------------------------------------------------------------------------------

/// Message update schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateType {
    /// Sequential, fixed canonical edge order
    SeqFix,
    /// Sequential, fresh random permutation every iteration
    SeqRnd,
    /// Residual-driven, largest residual first
    SeqMax,
    /// Parallel: all messages computed from the previous snapshot, then
    /// committed simultaneously
    Parall,
}

impl FromStr for UpdateType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SEQFIX" => Ok(UpdateType::SeqFix),
            "SEQRND" => Ok(UpdateType::SeqRnd),
            "SEQMAX" => Ok(UpdateType::SeqMax),
            "PARALL" => Ok(UpdateType::Parall),
            _ => Err(Error::UnknownEnum {
                key: "updates",
                value: s.to_owned(),
            }),
        }
    }
}

impl Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateType::SeqFix => "SEQFIX",
            UpdateType::SeqRnd => "SEQRND",
            UpdateType::SeqMax => "SEQMAX",
            UpdateType::Parall => "PARALL",
        };
        write!(f, "{}", name)
    }
}

// ------------------------------------------------------------------------------------------

/// A bag of name-value configuration pairs
///
/// Values are stored as strings and parsed into their target types when
/// the engine reads them; unknown keys are accepted and ignored.
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    entries: IndexMap<String, String>,
}

impl PropertySet {
    pub fn new() -> Self {
        PropertySet::default()
    }

    /// Sets a key, overwriting any previous value
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.entries.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

// ------------------------------------------------------------------------------------------

/// Parsed engine configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Properties {
    /// Hard cap on full iterations
    pub maxiter: usize,

    /// Convergence threshold on the L-infinity change of single-variable
    /// beliefs between iterations
    pub tol: f64,

    /// Whether message arithmetic runs in the log domain
    pub logdomain: bool,

    /// Damping weight in `[0, 1)`: the committed message is
    /// `old^damping * new^(1-damping)`
    pub damping: f64,

    /// Message update schedule
    pub updates: UpdateType,

    /// Diagnostic level; does not affect results
    pub verbose: usize,

    /// Seed of the random source driving SEQRND permutations
    pub seed: u64,
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::MalformedProperty {
        key,
        value: value.to_owned(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::MalformedProperty {
            key,
            value: value.to_owned(),
        }),
    }
}

fn required<'a>(opts: &'a PropertySet, key: &'static str) -> Result<&'a str> {
    opts.get(key).ok_or(Error::NotSpecified(key))
}

impl Properties {
    /// Parses the configuration out of a property set
    ///
    /// # Notes
    ///
    /// `tol`, `maxiter`, `logdomain` and `updates` are mandatory; a
    /// missing one fails with [`Error::NotSpecified`]. `damping`
    /// (default 0) must lie in `[0, 1)`, `verbose` and `seed` default
    /// to 0.
    pub fn from_set(opts: &PropertySet) -> Result<Self> {
        let maxiter = parse("maxiter", required(opts, "maxiter")?)?;
        let tol: f64 = parse("tol", required(opts, "tol")?)?;
        let logdomain = parse_bool("logdomain", required(opts, "logdomain")?)?;
        let updates: UpdateType = required(opts, "updates")?.parse()?;
        let damping = match opts.get("damping") {
            Some(value) => parse::<f64>("damping", value)?,
            None => 0f64,
        };
        if !(0f64..1f64).contains(&damping) {
            return Err(Error::MalformedProperty {
                key: "damping",
                value: damping.to_string(),
            });
        }
        let verbose = match opts.get("verbose") {
            Some(value) => parse("verbose", value)?,
            None => 0,
        };
        let seed = match opts.get("seed") {
            Some(value) => parse("seed", value)?,
            None => 0,
        };
        Ok(Properties {
            maxiter,
            tol,
            logdomain,
            damping,
            updates,
            verbose,
            seed,
        })
    }

    /// Canonical serialization of the configuration, used by
    /// `identify()` and in test fixtures
    pub fn canonical(&self) -> String {
        format!(
            "damping={},logdomain={},maxiter={},seed={},tol={:e},updates={},verbose={}",
            self.damping,
            self.logdomain as u8,
            self.maxiter,
            self.seed,
            self.tol,
            self.updates,
            self.verbose
        )
    }
}
