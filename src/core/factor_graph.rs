use std::collections::BTreeMap;

use crate::core::factor::Factor;
use crate::core::graph::{BipartiteGraph, Neighbor};
use crate::core::var::Var;
use crate::error::{Error, Result};

/// A factor graph: variables, factors and their incidence
///
/// Variable nodes are indexed in label order; factor nodes in insertion
/// order. There is an edge between variable `i` and factor `I` iff
/// `var(i)` belongs to the scope of `factor(I)`. The graph is immutable
/// once built; the inference engine treats it as read-only.
#[derive(Debug, Clone)]
pub struct FactorGraph {
    vars: Vec<Var>,
    factors: Vec<Factor>,
    graph: BipartiteGraph,
}

impl FactorGraph {
    /// Builds a factor graph from a list of factors, collecting the
    /// variables from the factor scopes
    ///
    /// # Notes
    ///
    /// Fails with [`Error::InvalidFactorGraph`] if one label carries two
    /// different state counts or a variable has no states.
    pub fn new(factors: Vec<Factor>) -> Result<Self> {
        let mut vars: BTreeMap<u64, Var> = BTreeMap::new();
        for factor in &factors {
            for &v in factor.vars().iter() {
                if let Some(prev) = vars.insert(v.label(), v) {
                    if prev.states() != v.states() {
                        return Err(Error::InvalidFactorGraph(format!(
                            "variable {} occurs with {} and {} states",
                            v,
                            prev.states(),
                            v.states()
                        )));
                    }
                }
            }
        }
        Self::assemble(vars.into_values().collect(), factors)
    }

    /// Builds a factor graph from an explicit variable list plus factors
    ///
    /// # Notes
    ///
    /// Every variable referenced by a factor must appear in `vars`;
    /// variables incident to no factor are allowed. Fails with
    /// [`Error::InvalidFactorGraph`] on duplicate labels or on a factor
    /// variable absent from `vars`.
    pub fn with_vars(vars: Vec<Var>, factors: Vec<Factor>) -> Result<Self> {
        let mut sorted = vars;
        sorted.sort_unstable();
        for w in sorted.windows(2) {
            if w[0].label() == w[1].label() {
                return Err(Error::InvalidFactorGraph(format!(
                    "duplicate variable label {}",
                    w[0].label()
                )));
            }
        }
        for factor in &factors {
            for v in factor.vars().iter() {
                if sorted.binary_search(v).is_err() {
                    return Err(Error::InvalidFactorGraph(format!(
                        "factor over {} references {} which is not a graph variable",
                        factor.vars(),
                        v
                    )));
                }
            }
        }
        Self::assemble(sorted, factors)
    }

    fn assemble(vars: Vec<Var>, factors: Vec<Factor>) -> Result<Self> {
        if let Some(v) = vars.iter().find(|v| v.states() == 0) {
            return Err(Error::InvalidFactorGraph(format!(
                "variable {} has no states",
                v
            )));
        }
        let mut graph = BipartiteGraph::new(vars.len(), factors.len());
        for (fi, factor) in factors.iter().enumerate() {
            // scopes iterate in label order, so neighbor lists come out in
            // canonical order on both sides
            for v in factor.vars().iter() {
                let vi = vars
                    .binary_search(v)
                    .map_err(|_| Error::Internal("collected variable not found"))?;
                graph.add_edge(vi, fi);
            }
        }
        Ok(FactorGraph {
            vars,
            factors,
            graph,
        })
    }

    #[inline(always)]
    pub fn nr_vars(&self) -> usize {
        self.vars.len()
    }

    #[inline(always)]
    pub fn nr_factors(&self) -> usize {
        self.factors.len()
    }

    /// Total number of variable-factor edges
    #[inline]
    pub fn nr_edges(&self) -> usize {
        self.graph.nr_edges()
    }

    #[inline(always)]
    pub fn var(&self, i: usize) -> Var {
        self.vars[i]
    }

    #[inline(always)]
    pub fn factor(&self, fi: usize) -> &Factor {
        &self.factors[fi]
    }

    #[inline(always)]
    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    #[inline(always)]
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Factors incident to variable `i`; each neighbor's `dual` is the
    /// position of variable `i` within that factor's neighbor list
    #[inline(always)]
    pub fn nb_v(&self, i: usize) -> &[Neighbor] {
        self.graph.nb1(i)
    }

    /// Variables in the scope of factor `fi`, in the canonical
    /// label-ascending order used to index the factor table
    #[inline(always)]
    pub fn nb_f(&self, fi: usize) -> &[Neighbor] {
        self.graph.nb2(fi)
    }

    /// Looks up the node index of a variable
    pub fn find_var(&self, var: &Var) -> Option<usize> {
        self.vars.binary_search(var).ok()
    }

    /// Returns the degree (number of incident factors) of each variable
    #[inline]
    pub fn var_degrees(&self) -> Vec<usize> {
        (0..self.nr_vars()).map(|i| self.nb_v(i).len()).collect()
    }
}
