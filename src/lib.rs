//! # cube-worker
//!
//! Worker process for a cube-and-conquer model-counting cluster.
//!
//! The dispatcher splits a hard CNF formula into cubes (fixed partial
//! assignments) and hands them out one at a time. Each worker runs a single
//! sequential cycle:
//!
//! 1. Fetch a task from the dispatcher
//! 2. Rebuild the cube's DIMACS formula
//! 3. Run the external exact counter under the task's wall-clock budget
//! 4. Extract the model count from the counter's stdout
//! 5. Submit the result, then loop
//!
//! A timed-out solve is a normal result (`timed_out = true`); RPC and
//! subprocess failures are logged and answered with a backoff, never a
//! crash. The process stops only on an external signal.
//!
//! ## Modules
//! - `client`: dispatcher RPC boundary and wire types
//! - `config`: environment configuration
//! - `count`: count recognition over counter stdout
//! - `formula`: DIMACS assembly
//! - `solver`: counter subprocess execution
//! - `worker`: the fetch/solve/submit state machine

pub mod client;
pub mod config;
pub mod count;
pub mod formula;
pub mod solver;
pub mod worker;

pub use client::{Task, TaskClient, TaskResult};
pub use config::Config;
pub use worker::Worker;
