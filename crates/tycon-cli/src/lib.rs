//! Native CLI support for the tycon binary.

pub mod args;
pub mod driver;
pub mod program;
pub mod reporter;
pub mod tracing_config;

#[cfg(test)]
#[path = "../tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "../tests/driver_tests.rs"]
mod driver_tests;
#[cfg(test)]
#[path = "../tests/program_tests.rs"]
mod program_tests;
#[cfg(test)]
#[path = "../tests/reporter_tests.rs"]
mod reporter_tests;
