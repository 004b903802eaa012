use crate::bp::PropertySet;
use crate::core::{Factor, FactorGraph, Var, VarSet};

/// A property set with the canonical test configuration
pub(super) fn opts(updates: &str) -> PropertySet {
    PropertySet::new()
        .set("tol", "1e-9")
        .set("maxiter", 10000)
        .set("logdomain", 0)
        .set("updates", updates)
}

pub(super) fn assert_close(lhs: f64, rhs: f64, tol: f64) {
    assert!(
        (lhs - rhs).abs() < tol,
        "expected {} and {} to agree within {}",
        lhs,
        rhs,
        tol
    );
}

pub(super) fn assert_distribution(values: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(values.len(), expected.len());
    for (v, e) in values.iter().zip(expected) {
        assert_close(*v, *e, tol);
    }
}

/// A chain of `n` binary variables with one shared pairwise table and
/// optional unary tables
pub(super) fn binary_chain(n: usize, pairwise: [f64; 4], unary: Option<[f64; 2]>) -> FactorGraph {
    let vars: Vec<_> = (0..n as u64).map(|l| Var::new(l, 2)).collect();
    let mut factors = Vec::new();
    for w in vars.windows(2) {
        factors.push(Factor::new(VarSet::new([w[0], w[1]]), pairwise.to_vec()).unwrap());
    }
    if let Some(unary) = unary {
        for &v in &vars {
            factors.push(Factor::unary(v, unary.to_vec()).unwrap());
        }
    }
    FactorGraph::new(factors).unwrap()
}

/// A cycle of `n` binary variables with one shared pairwise table
pub(super) fn binary_cycle(n: usize, pairwise: [f64; 4]) -> FactorGraph {
    let vars: Vec<_> = (0..n as u64).map(|l| Var::new(l, 2)).collect();
    let mut factors = Vec::new();
    for i in 0..n {
        let pair = VarSet::new([vars[i], vars[(i + 1) % n]]);
        factors.push(Factor::new(pair, pairwise.to_vec()).unwrap());
    }
    FactorGraph::new(factors).unwrap()
}

/// The exact marginal over a variable set by enumeration of the full
/// joint table
pub(super) fn exact_marginal(fg: &FactorGraph, vars: &VarSet) -> Vec<f64> {
    let all: VarSet = fg.vars().iter().copied().collect();
    let projections: Vec<Vec<usize>> = fg
        .factors()
        .iter()
        .map(|f| all.projection(f.vars()))
        .collect();
    let target = all.projection(vars);
    let mut marginal = vec![0f64; vars.nr_states()];
    let mut z = 0f64;
    for s in 0..all.nr_states() {
        let mut weight = 1f64;
        for (factor, proj) in fg.factors().iter().zip(&projections) {
            weight *= factor.p().get(proj[s]);
        }
        z += weight;
        marginal[target[s]] += weight;
    }
    for m in &mut marginal {
        *m /= z;
    }
    marginal
}

/// Exact single-variable marginals for every variable of the graph
pub(super) fn exact_marginals(fg: &FactorGraph) -> Vec<Vec<f64>> {
    (0..fg.nr_vars())
        .map(|i| exact_marginal(fg, &VarSet::single(fg.var(i))))
        .collect()
}

/// The exact log partition function by enumeration
pub(super) fn exact_log_z(fg: &FactorGraph) -> f64 {
    let all: VarSet = fg.vars().iter().copied().collect();
    let projections: Vec<Vec<usize>> = fg
        .factors()
        .iter()
        .map(|f| all.projection(f.vars()))
        .collect();
    let mut z = 0f64;
    for s in 0..all.nr_states() {
        let mut weight = 1f64;
        for (factor, proj) in fg.factors().iter().zip(&projections) {
            weight *= factor.p().get(proj[s]);
        }
        z += weight;
    }
    z.ln()
}
