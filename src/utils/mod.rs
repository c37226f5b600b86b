//! Shared utilities: bitcoin.conf parsing, topology validation.

pub mod bitcoin_conf;
pub mod validation;

pub use bitcoin_conf::{flatten, parse_conf, parse_conf_file, unflatten};
pub use validation::{validate_template_size, validate_topology};
