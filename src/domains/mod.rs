//! Domain wiring: market discovery and prompt wording per sport/category

pub mod cricket;
