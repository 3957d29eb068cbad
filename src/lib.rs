pub mod advisor;
pub mod catalog;
pub mod dialogue;
pub mod history;
pub mod limits;
pub mod llm;
pub mod model;
pub mod observability;
pub mod occupancy;
pub mod refresh;
pub mod router;
pub mod wire;
