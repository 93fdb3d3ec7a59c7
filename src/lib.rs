mod error;
pub use error::{Error, Result};

pub mod ext_smithy;

pub mod config;
pub mod credentials;
pub mod token;

pub mod client;
pub mod directory_client;
pub mod sts_assume_role;

pub mod chain;
pub mod source;

pub mod console;
pub mod output;

pub mod cmd;

#[cfg(test)]
pub(crate) mod test_support;
