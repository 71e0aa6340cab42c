//! Parity Lab: deterministic zeta cases, JSON case sets and the host ⇄ GPU
//! comparison harness.

#[path = "../cpu/mod.rs"]
pub mod cpu;

pub mod case_io;
pub mod report;
pub mod wgpu_zeta_runner;
