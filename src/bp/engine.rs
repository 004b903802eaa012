use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::bp::priority::ResidualHeap;
use crate::bp::properties::{Properties, PropertySet, UpdateType};
use crate::core::{Factor, FactorGraph, Prob, ProbDomain, VarSet};
use crate::error::{Error, Result};

/// Algorithm name embedded in [`Bp::identify`]
pub const NAME: &str = "BP";

// ------------------------------------------------------------------------------------------

/// Message state of one variable-factor edge
///
/// `message` holds the current factor-to-variable message of length
/// `var(i).states()`; `new_message` the pending next value; `index` the
/// precomputed map from joint states of the factor scope to states of
/// the variable; `residual` the L-infinity distance between `message`
/// and `new_message`, zero right after a commit.
#[derive(Debug, Clone)]
struct EdgeProp {
    index: Vec<usize>,
    message: Prob,
    new_message: Prob,
    residual: f64,
}

// ------------------------------------------------------------------------------------------

/// Loopy belief propagation on a factor graph
///
/// The engine materializes all edge state at construction, pins the
/// graph for its lifetime and mutates only its own message store.
/// Messages start uniform; [`Bp::run`] repeatedly recomputes outgoing
/// messages according to the configured schedule until the
/// single-variable beliefs move less than `tol` between iterations or
/// `maxiter` passes complete.
#[derive(Debug)]
pub struct Bp {
    fg: FactorGraph,
    props: Properties,
    /// edge state indexed by [variable][neighbor position]
    edges: Vec<Vec<EdgeProp>>,
    /// canonical edge enumeration: (variable, neighbor position) pairs
    update_seq: Vec<(usize, usize)>,
    /// first canonical edge id of each variable
    edge_offsets: Vec<usize>,
    max_diff: f64,
    iters: usize,
    rng: StdRng,
}

impl Bp {
    /// Constructs an engine for a factor graph
    ///
    /// # Arguments
    ///
    /// * `fg` - The model to run inference on
    /// * `opts` - Configuration; see [`Properties::from_set`] for the
    ///     recognized keys
    ///
    /// # Notes
    ///
    /// All messages, index tables and the canonical edge enumeration
    /// are allocated here; `run` only reuses them.
    pub fn new(fg: FactorGraph, opts: &PropertySet) -> Result<Self> {
        let props = Properties::from_set(opts)?;
        let domain = if props.logdomain {
            ProbDomain::Log
        } else {
            ProbDomain::Linear
        };
        let mut edges = Vec::with_capacity(fg.nr_vars());
        let mut update_seq = Vec::with_capacity(fg.nr_edges());
        let mut edge_offsets = Vec::with_capacity(fg.nr_vars());
        for i in 0..fg.nr_vars() {
            let var = fg.var(i);
            let single = VarSet::single(var);
            edge_offsets.push(update_seq.len());
            let mut row = Vec::with_capacity(fg.nb_v(i).len());
            for (pos, nb) in fg.nb_v(i).iter().enumerate() {
                update_seq.push((i, pos));
                row.push(EdgeProp {
                    index: fg.factor(nb.node).vars().projection(&single),
                    message: Prob::uniform(var.states(), domain),
                    new_message: Prob::uniform(var.states(), domain),
                    residual: 0f64,
                });
            }
            edges.push(row);
        }
        let rng = StdRng::seed_from_u64(props.seed);
        Ok(Bp {
            fg,
            props,
            edges,
            update_seq,
            edge_offsets,
            max_diff: 0f64,
            iters: 0,
            rng,
        })
    }

    /// Returns the model the engine runs on
    #[inline(always)]
    pub fn factor_graph(&self) -> &FactorGraph {
        &self.fg
    }

    /// Returns the parsed configuration
    #[inline(always)]
    pub fn properties(&self) -> &Properties {
        &self.props
    }

    /// Number of completed passes over the graph
    #[inline(always)]
    pub fn iterations(&self) -> usize {
        self.iters
    }

    /// Largest per-iteration change of single-variable beliefs seen
    /// since the last full `init`
    #[inline(always)]
    pub fn max_diff(&self) -> f64 {
        self.max_diff
    }

    /// A stable string embedding the algorithm name and the canonical
    /// configuration serialization
    pub fn identify(&self) -> String {
        format!("{}[{}]", NAME, self.props.canonical())
    }

    /// Resets all messages to uniform and clears residuals, the
    /// iteration counter and the convergence state
    pub fn init(&mut self) {
        for row in &mut self.edges {
            for edge in row {
                edge.message.fill_uniform();
                edge.new_message.fill_uniform();
                edge.residual = 0f64;
            }
        }
        self.max_diff = 0f64;
        self.iters = 0;
        self.rng = StdRng::seed_from_u64(self.props.seed);
    }

    /// Resets only the messages incident to the given variables
    ///
    /// # Notes
    ///
    /// Counters and convergence state are left untouched; fails with
    /// [`Error::InvalidFactorGraph`] if a variable is not part of the
    /// graph.
    pub fn init_vars(&mut self, vars: &VarSet) -> Result<()> {
        for v in vars.iter() {
            let i = self.fg.find_var(v).ok_or_else(|| {
                Error::InvalidFactorGraph(format!("variable {} not in graph", v))
            })?;
            for edge in &mut self.edges[i] {
                edge.message.fill_uniform();
                edge.new_message.fill_uniform();
                edge.residual = 0f64;
            }
        }
        Ok(())
    }

    /// Runs the configured schedule until convergence or the iteration
    /// cap and returns the achieved L-infinity belief distance
    ///
    /// # Notes
    ///
    /// Non-convergence is not an error; a numeric failure
    /// ([`Error::NotNormalizable`]) aborts the run with `iterations()`
    /// and `max_diff()` still reflecting the completed passes.
    pub fn run(&mut self) -> Result<f64> {
        if self.props.verbose >= 1 {
            info!("starting {}", self.identify());
        }
        let mut old_beliefs = Vec::with_capacity(self.fg.nr_vars());
        for i in 0..self.fg.nr_vars() {
            old_beliefs.push(self.belief_v_prob(i)?);
        }
        if self.props.updates == UpdateType::SeqMax {
            // seed the residuals with one full compute pass
            for k in 0..self.update_seq.len() {
                let (i, pos) = self.update_seq[k];
                self.refresh_new_message(i, pos)?;
            }
        }
        let mut diff = f64::INFINITY;
        while self.iters < self.props.maxiter && diff > self.props.tol {
            match self.props.updates {
                UpdateType::Parall => self.pass_parallel()?,
                UpdateType::SeqFix => {
                    for k in 0..self.update_seq.len() {
                        let (i, pos) = self.update_seq[k];
                        self.refresh_new_message(i, pos)?;
                        self.commit_message(i, pos)?;
                    }
                }
                UpdateType::SeqRnd => {
                    let mut seq = self.update_seq.clone();
                    seq.shuffle(&mut self.rng);
                    for (i, pos) in seq {
                        self.refresh_new_message(i, pos)?;
                        self.commit_message(i, pos)?;
                    }
                }
                UpdateType::SeqMax => self.pass_seqmax()?,
            }
            diff = 0f64;
            for (i, old) in old_beliefs.iter_mut().enumerate() {
                let belief = self.belief_v_prob(i)?;
                diff = diff.max(belief.dist_linf(old));
                *old = belief;
            }
            self.iters += 1;
            if diff > self.max_diff {
                self.max_diff = diff;
            }
            if self.props.verbose >= 2 {
                debug!("iteration {}: max belief diff {:e}", self.iters, diff);
            }
        }
        if self.props.verbose >= 1 {
            if diff > self.props.tol {
                info!(
                    "not converged after {} iterations, diff {:e}",
                    self.iters, diff
                );
            } else {
                info!("converged in {} iterations, diff {:e}", self.iters, diff);
            }
        }
        Ok(diff)
    }

    /// Single-variable belief by variable node index
    pub fn belief_v(&self, i: usize) -> Result<Factor> {
        Factor::from_prob(VarSet::single(self.fg.var(i)), self.belief_v_prob(i)?)
    }

    /// Factor belief by factor node index
    pub fn belief_f(&self, fi: usize) -> Result<Factor> {
        let mut prod = self.factor_product(fi, None);
        prod.normalize()?;
        Factor::from_prob(self.fg.factor(fi).vars().clone(), prod)
    }

    /// Belief over an arbitrary variable set
    ///
    /// # Notes
    ///
    /// Supported for the empty set, single variables and subsets of a
    /// single factor scope; anything else fails with
    /// [`Error::BeliefNotRepresentable`].
    pub fn belief(&self, vars: &VarSet) -> Result<Factor> {
        if vars.is_empty() {
            return Ok(Factor::unit());
        }
        if vars.len() == 1 {
            let v = vars.as_slice()[0];
            let i = self.fg.find_var(&v).ok_or_else(|| {
                Error::InvalidFactorGraph(format!("variable {} not in graph", v))
            })?;
            return self.belief_v(i);
        }
        for fi in 0..self.fg.nr_factors() {
            if vars.is_subset_of(self.fg.factor(fi).vars()) {
                return self.belief_f(fi)?.marginal(vars);
            }
        }
        Err(Error::BeliefNotRepresentable(vars.to_string()))
    }

    /// All beliefs: one per variable followed by one per factor
    pub fn beliefs(&self) -> Result<Vec<Factor>> {
        let mut beliefs = Vec::with_capacity(self.fg.nr_vars() + self.fg.nr_factors());
        for i in 0..self.fg.nr_vars() {
            beliefs.push(self.belief_v(i)?);
        }
        for fi in 0..self.fg.nr_factors() {
            beliefs.push(self.belief_f(fi)?);
        }
        Ok(beliefs)
    }

    /// Bethe approximation of the log partition function:
    /// `sum_i (1 - deg i) H(b_i) - sum_I KL(b_I || F_I)`
    pub fn log_z(&self) -> Result<f64> {
        let mut sum = 0f64;
        for i in 0..self.fg.nr_vars() {
            let degree = self.fg.nb_v(i).len() as f64;
            sum += (1f64 - degree) * self.belief_v_prob(i)?.entropy();
        }
        for fi in 0..self.fg.nr_factors() {
            let belief = self.belief_f(fi)?;
            sum -= belief.p().kl_divergence(self.fg.factor(fi).p())?;
        }
        Ok(sum)
    }

    // message arithmetic ---------------------------------------------------------------

    #[inline(always)]
    fn domain(&self) -> ProbDomain {
        if self.props.logdomain {
            ProbDomain::Log
        } else {
            ProbDomain::Linear
        }
    }

    #[inline(always)]
    fn edge_id(&self, i: usize, pos: usize) -> usize {
        self.edge_offsets[i] + pos
    }

    /// The factor table of `fi` multiplied by the incoming messages of
    /// every scope variable except `exclude`, reduced to the linear
    /// domain (max-shifted when running in the log domain)
    fn factor_product(&self, fi: usize, exclude: Option<usize>) -> Prob {
        let logdomain = self.props.logdomain;
        let mut prod = self.fg.factor(fi).p().clone();
        if logdomain {
            prod.take_log();
        }
        for nb in self.fg.nb_f(fi) {
            let j = nb.node;
            if exclude == Some(j) {
                continue;
            }
            // the variable-to-factor message: product of the messages
            // into j from every factor other than fi
            let mut prod_j = Prob::ones(self.fg.var(j).states(), self.domain());
            for (jpos, jnb) in self.fg.nb_v(j).iter().enumerate() {
                if jnb.node != fi {
                    prod_j.mul_assign(&self.edges[j][jpos].message);
                }
            }
            // broadcast over the factor table through the edge index
            let index = &self.edges[j][nb.dual].index;
            if logdomain {
                for r in 0..prod.len() {
                    prod.set(r, prod.get(r) + prod_j.get(index[r]));
                }
            } else {
                for r in 0..prod.len() {
                    prod.set(r, prod.get(r) * prod_j.get(index[r]));
                }
            }
        }
        if logdomain {
            prod.shift_max_take_exp();
        }
        prod
    }

    /// Computes the normalized pending message of edge `(i, pos)`
    fn compute_new_message(&self, i: usize, pos: usize) -> Result<Prob> {
        let fi = self.fg.nb_v(i)[pos].node;
        let prod = self.factor_product(fi, Some(i));
        // marginalize the product onto variable i
        let index = &self.edges[i][pos].index;
        let mut marg = Prob::zeros(self.fg.var(i).states());
        for r in 0..prod.len() {
            marg.set(index[r], marg.get(index[r]) + prod.get(r));
        }
        marg.normalize()?;
        if self.props.logdomain {
            marg.take_log();
        }
        Ok(marg)
    }

    /// Recomputes the pending message and the residual of one edge
    fn refresh_new_message(&mut self, i: usize, pos: usize) -> Result<()> {
        let message = self.compute_new_message(i, pos)?;
        let edge = &mut self.edges[i][pos];
        edge.residual = message.dist_linf(&edge.message);
        edge.new_message = message;
        Ok(())
    }

    /// Commits the pending message, applying damping, and zeroes the
    /// residual
    fn commit_message(&mut self, i: usize, pos: usize) -> Result<()> {
        let damping = self.props.damping;
        let edge = &mut self.edges[i][pos];
        if damping == 0f64 {
            edge.message.clone_from(&edge.new_message);
        } else {
            // geometric interpolation; in the log domain pow/mul reduce
            // to the scalar-linear combination
            let mut damped = edge.message.clone();
            damped.pow(damping);
            let mut fresh = edge.new_message.clone();
            fresh.pow(1f64 - damping);
            damped.mul_assign(&fresh);
            damped.normalize()?;
            edge.message = damped;
        }
        edge.residual = 0f64;
        if self.props.verbose >= 3 {
            trace!("committed message to edge ({}, {})", i, pos);
        }
        Ok(())
    }

    /// Single-variable belief as a linear-domain probability vector
    fn belief_v_prob(&self, i: usize) -> Result<Prob> {
        let mut prod = Prob::ones(self.fg.var(i).states(), self.domain());
        for edge in &self.edges[i] {
            prod.mul_assign(&edge.message);
        }
        if self.props.logdomain {
            prod.shift_max_take_exp();
        }
        prod.normalize()?;
        Ok(prod)
    }

    // schedules ------------------------------------------------------------------------

    /// One synchronous pass: all pending messages computed from the
    /// previous snapshot, then committed
    ///
    /// # Notes
    ///
    /// The compute phase is sharded across workers; per-edge writes are
    /// disjoint and all reads go to the old snapshot.
    fn pass_parallel(&mut self) -> Result<()> {
        let computed = self
            .update_seq
            .par_iter()
            .map(|&(i, pos)| self.compute_new_message(i, pos))
            .collect::<Result<Vec<Prob>>>()?;
        for (&(i, pos), message) in self.update_seq.iter().zip(computed) {
            let edge = &mut self.edges[i][pos];
            edge.residual = message.dist_linf(&edge.message);
            edge.new_message = message;
        }
        for k in 0..self.update_seq.len() {
            let (i, pos) = self.update_seq[k];
            self.commit_message(i, pos)?;
        }
        Ok(())
    }

    /// One residual-driven pass: commits as many messages as there are
    /// edges, always the edge with the largest residual first
    fn pass_seqmax(&mut self) -> Result<()> {
        let keys = self
            .update_seq
            .iter()
            .map(|&(i, pos)| self.edges[i][pos].residual)
            .collect();
        let mut heap = ResidualHeap::new(keys);
        for _ in 0..self.update_seq.len() {
            let top = heap.peek();
            let (i, pos) = self.update_seq[top];
            self.commit_message(i, pos)?;
            heap.update(top, 0f64);
            // the commit changed an input of every pending message
            // m_{J->j} with J a neighbor of i other than the committed
            // factor and j a scope variable of J other than i
            let fi = self.fg.nb_v(i)[pos].node;
            let influenced: Vec<(usize, usize)> = self
                .fg
                .nb_v(i)
                .iter()
                .filter(|jnb| jnb.node != fi)
                .flat_map(|jnb| {
                    self.fg
                        .nb_f(jnb.node)
                        .iter()
                        .filter(|knb| knb.node != i)
                        .map(|knb| (knb.node, knb.dual))
                })
                .collect();
            for (j, jpos) in influenced {
                self.refresh_new_message(j, jpos)?;
                heap.update(self.edge_id(j, jpos), self.edges[j][jpos].residual);
            }
        }
        Ok(())
    }
}
