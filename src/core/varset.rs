use std::fmt::{self, Display};
use std::ops::BitOr;

use crate::core::var::Var;

/// An ordered set of distinct variables, sorted by label
///
/// The joint state space of the set has size equal to the product of the
/// per-variable state counts. A joint state is a single integer in
/// `[0, nr_states())` that decomposes mixed-radix over the variables,
/// with the smallest-label variable as the fastest-varying digit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarSet {
    vars: Vec<Var>,
}

impl VarSet {
    /// Creates a variable set from an arbitrary collection of variables,
    /// sorting by label and dropping duplicates
    pub fn new(vars: impl IntoIterator<Item = Var>) -> Self {
        let mut vars: Vec<_> = vars.into_iter().collect();
        vars.sort_unstable();
        vars.dedup();
        debug_assert!(
            vars.windows(2).all(|w| w[0].label() != w[1].label()),
            "two variables with one label but different state counts"
        );
        VarSet { vars }
    }

    /// Creates a set holding a single variable
    #[inline]
    pub fn single(var: Var) -> Self {
        VarSet { vars: vec![var] }
    }

    /// Creates the empty set
    #[inline]
    pub fn empty() -> Self {
        VarSet::default()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterates the variables in label order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Var> {
        self.vars.iter()
    }

    /// Returns the variables as a slice, in label order
    #[inline(always)]
    pub fn as_slice(&self) -> &[Var] {
        &self.vars
    }

    #[inline]
    pub fn contains(&self, var: &Var) -> bool {
        self.vars.binary_search(var).is_ok()
    }

    /// Checks whether every variable of `self` is contained in `other`
    pub fn is_subset_of(&self, other: &VarSet) -> bool {
        self.vars.iter().all(|v| other.contains(v))
    }

    /// Inserts a variable, keeping the label order
    pub fn insert(&mut self, var: Var) {
        if let Err(pos) = self.vars.binary_search(&var) {
            self.vars.insert(pos, var);
        }
    }

    /// Returns the size of the joint state space
    ///
    /// # Notes
    ///
    /// The empty set has a single (trivial) joint state.
    pub fn nr_states(&self) -> usize {
        self.vars.iter().map(|v| v.states()).product()
    }

    /// Decomposes a joint state of the set into per-variable states,
    /// in label order
    pub fn decode(&self, mut state: usize) -> Vec<usize> {
        let mut states = Vec::with_capacity(self.vars.len());
        for v in &self.vars {
            states.push(state % v.states());
            state /= v.states();
        }
        states
    }

    /// Builds the mapping from joint states of `self` onto joint states of
    /// a subset
    ///
    /// # Arguments
    ///
    /// * `sub` - A subset of `self`
    ///
    /// # Notes
    ///
    /// The returned table has length `self.nr_states()`; its entry at a
    /// joint state `s` is the joint state of `sub` implied by `s`. This is
    /// the primitive on top of which all marginalization of factor-shaped
    /// tables is expressed.
    pub fn projection(&self, sub: &VarSet) -> Vec<usize> {
        debug_assert!(sub.is_subset_of(self));
        // per-variable strides: in the own radix always, in the subset's
        // radix for the variables that belong to it
        let mut strides = Vec::with_capacity(self.vars.len());
        let mut own_stride = 1usize;
        for v in &self.vars {
            let sub_stride = sub.vars.binary_search(v).ok().map(|pos| {
                sub.vars[..pos].iter().map(|w| w.states()).product::<usize>()
            });
            strides.push((own_stride, v.states(), sub_stride));
            own_stride *= v.states();
        }
        (0..self.nr_states())
            .map(|s| {
                strides
                    .iter()
                    .filter_map(|&(own, states, sub)| {
                        sub.map(|sub| (s / own) % states * sub)
                    })
                    .sum()
            })
            .collect()
    }
}

impl BitOr for &VarSet {
    type Output = VarSet;

    /// Set union
    fn bitor(self, rhs: &VarSet) -> VarSet {
        VarSet::new(self.vars.iter().chain(rhs.vars.iter()).copied())
    }
}

impl FromIterator<Var> for VarSet {
    fn from_iter<T: IntoIterator<Item = Var>>(iter: T) -> Self {
        VarSet::new(iter)
    }
}

impl Display for VarSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.vars.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "}}")
    }
}
