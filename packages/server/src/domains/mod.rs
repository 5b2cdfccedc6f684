// Business domains
pub mod certificates;
