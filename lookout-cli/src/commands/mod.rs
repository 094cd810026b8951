//! CLI command implementations

pub mod github;

pub use github::GithubArgs;
