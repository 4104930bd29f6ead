pub mod driver;
pub mod github;
pub mod ops;
pub mod progress;
pub mod repository;
pub mod templates;
pub mod validation;
pub mod workflow;
