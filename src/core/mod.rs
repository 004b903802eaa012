mod factor;
mod factor_graph;
mod graph;
mod prob;
mod var;
mod varset;

pub use factor::Factor;
pub use factor_graph::FactorGraph;
pub use graph::{BipartiteGraph, Neighbor};
pub use prob::{Prob, ProbDomain};
pub use var::Var;
pub use varset::VarSet;
