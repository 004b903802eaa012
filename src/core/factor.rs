use std::fmt::{self, Display};

use crate::core::prob::{Prob, ProbDomain};
use crate::core::var::Var;
use crate::core::varset::VarSet;
use crate::error::{Error, Result};

/// A non-negative table over the joint state space of a variable set
///
/// The table entry at joint state `s` is the factor value for the
/// per-variable states obtained by the mixed-radix decomposition of `s`
/// (smallest label fastest).
#[derive(Debug, Clone)]
pub struct Factor {
    vars: VarSet,
    p: Prob,
}

impl Factor {
    /// Creates a factor from a variable set and its table
    ///
    /// # Notes
    ///
    /// The table length must equal the size of the joint state space.
    pub fn new(vars: VarSet, values: Vec<f64>) -> Result<Self> {
        if values.len() != vars.nr_states() {
            return Err(Error::InvalidFactorGraph(format!(
                "factor over {} has {} values, expected {}",
                vars,
                values.len(),
                vars.nr_states()
            )));
        }
        Ok(Factor {
            vars,
            p: Prob::from_vec(values),
        })
    }

    /// Creates a factor from a variable set and an already built
    /// linear-domain probability vector
    pub fn from_prob(vars: VarSet, p: Prob) -> Result<Self> {
        if p.len() != vars.nr_states() || p.domain() != ProbDomain::Linear {
            return Err(Error::Internal("factor table does not match its scope"));
        }
        Ok(Factor { vars, p })
    }

    /// Creates the uniform factor over a variable set
    pub fn uniform(vars: VarSet) -> Self {
        let p = Prob::uniform(vars.nr_states(), ProbDomain::Linear);
        Factor { vars, p }
    }

    /// Creates a unary factor over a single variable
    pub fn unary(var: Var, values: Vec<f64>) -> Result<Self> {
        Factor::new(VarSet::single(var), values)
    }

    /// Creates the trivial factor over the empty set
    pub fn unit() -> Self {
        Factor {
            vars: VarSet::empty(),
            p: Prob::from_vec(vec![1f64]),
        }
    }

    /// Returns the scope of the factor
    #[inline(always)]
    pub fn vars(&self) -> &VarSet {
        &self.vars
    }

    /// Returns the table of the factor
    #[inline(always)]
    pub fn p(&self) -> &Prob {
        &self.p
    }

    /// Sums the table onto a subset of the scope and normalizes
    ///
    /// # Arguments
    ///
    /// * `sub` - A subset of the factor scope
    pub fn marginal(&self, sub: &VarSet) -> Result<Factor> {
        if !sub.is_subset_of(&self.vars) {
            return Err(Error::BeliefNotRepresentable(sub.to_string()));
        }
        let index = self.vars.projection(sub);
        let mut marg = Prob::zeros(sub.nr_states());
        for (s, &t) in index.iter().enumerate() {
            marg.set(t, marg.get(t) + self.p.get(s));
        }
        marg.normalize()?;
        Ok(Factor {
            vars: sub.clone(),
            p: marg,
        })
    }

    /// Returns a normalized copy of the factor
    pub fn normalized(&self) -> Result<Factor> {
        let mut p = self.p.clone();
        p.normalize()?;
        Ok(Factor {
            vars: self.vars.clone(),
            p,
        })
    }

    /// Entropy of the normalized table
    pub fn entropy(&self) -> f64 {
        self.p.entropy()
    }
}

impl Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Factor({}, {})", self.vars, self.p.values())
    }
}
