//! Mass-minimizing design search for stiffened structures: a three-phase
//! stochastic optimizer driving an expensive, noisy evaluator that returns a
//! mass and a vector of reserve factors per design.

pub mod audit;
pub mod cli;
pub mod config;
pub mod eval;
pub mod fitness;
pub mod parallel;
pub mod progress;
pub mod rng;
pub mod search;
pub mod space;
