use clap::Parser;
use serde::{Deserialize, Serialize};

use loopy::bp::{Bp, PropertySet};
use loopy::core::{Factor, FactorGraph, Var, VarSet};

// Command line parameters of the demo. Can be safely skipped, does not
// affect the understanding of the example
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of binary variables on the cycle
    #[arg(short, long, default_value = "16")]
    nodes_number: usize,

    /// Pairwise coupling: neighboring agreement is favored by this weight
    #[arg(short, long, default_value = "2.0")]
    coupling: f64,

    /// Bias of the unary factor attached to the first variable
    #[arg(short, long, default_value = "0.7")]
    bias: f64,

    /// Update schedule (SEQFIX, SEQRND, SEQMAX or PARALL)
    #[arg(short, long, default_value = "SEQMAX")]
    updates: String,

    /// Damping weight in [0, 1)
    #[arg(short, long, default_value = "0.0")]
    damping: f64,

    /// Maximal number of iterations
    #[arg(short, long, default_value = "1000")]
    max_iter: usize,

    /// Convergence threshold on the belief change
    #[arg(short, long, default_value = "1e-9")]
    tol: f64,
}

// Serialization of the output into a yaml document
#[derive(Serialize, Deserialize)]
struct DemoResult {
    identify: String,
    converged: bool,
    iterations: usize,
    achieved_diff: f64,
    bethe_log_z: f64,
    marginals: Vec<Vec<f64>>,
}

fn main() {
    let cli = Cli::parse();

    // model: a ring of binary variables with attractive couplings and a
    // single biased variable that the loop has to propagate around
    let vars: Vec<_> = (0..cli.nodes_number as u64).map(|l| Var::new(l, 2)).collect();
    let mut factors = Vec::new();
    for i in 0..cli.nodes_number {
        let pair = VarSet::new([vars[i], vars[(i + 1) % cli.nodes_number]]);
        factors.push(
            Factor::new(pair, vec![cli.coupling, 1f64, 1f64, cli.coupling])
                .expect("pairwise table has four entries"),
        );
    }
    factors.push(Factor::unary(vars[0], vec![cli.bias, 1f64 - cli.bias]).unwrap());
    let fg = FactorGraph::new(factors).unwrap();

    let opts = PropertySet::new()
        .set("tol", cli.tol)
        .set("maxiter", cli.max_iter)
        .set("logdomain", 0)
        .set("updates", &cli.updates)
        .set("damping", cli.damping);
    let mut bp = Bp::new(fg, &opts).unwrap();

    let achieved_diff = bp.run().unwrap();
    let marginals = (0..cli.nodes_number)
        .map(|i| bp.belief_v(i).unwrap().p().values().to_vec())
        .collect();
    let result = DemoResult {
        identify: bp.identify(),
        converged: achieved_diff <= cli.tol,
        iterations: bp.iterations(),
        achieved_diff,
        bethe_log_z: bp.log_z().unwrap(),
        marginals,
    };
    println!("{}", serde_yaml::to_string(&result).unwrap());
}
