pub mod assignment;
pub mod capacity;
pub mod day;
pub mod queue;
pub mod routing;
pub mod scoring;
pub mod suggestions;
