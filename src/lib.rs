pub mod boundary;
pub mod chamber;
pub mod config;
pub mod constants;
pub mod energy_balance;
pub mod errors;
pub mod grid_field;
pub mod material;
pub mod math_utils;
pub mod metrics;
pub mod sim;
pub mod sim_op;

#[cfg(test)]
pub mod test_support;
