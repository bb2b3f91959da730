pub mod advisor;
pub mod cli;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod host;
pub mod model;
pub mod percentages;
pub mod project_config;
pub mod provider;
pub mod ranges;
pub mod report;
pub mod transport;

#[cfg(test)]
mod test_support;
