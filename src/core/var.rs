use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A discrete random variable: a unique integer label together with the
/// number of states the variable can take
///
/// # Notes
///
/// Two variables with the same label are treated as the same variable;
/// any set or graph containing both must give them the same number of
/// states. Ordering among variables is by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Var {
    label: u64,
    states: usize,
}

impl Var {
    /// Creates a new variable
    ///
    /// # Arguments
    ///
    /// * `label` - A unique ID of the variable
    /// * `states` - A number of states (must be positive)
    #[inline]
    pub fn new(label: u64, states: usize) -> Self {
        Var { label, states }
    }

    /// Returns the label of the variable
    #[inline(always)]
    pub fn label(&self) -> u64 {
        self.label
    }

    /// Returns the number of states of the variable
    #[inline(always)]
    pub fn states(&self) -> usize {
        self.states
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.label)
    }
}
