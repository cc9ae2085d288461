//! Paper Trading Module
//!
//! Simulated cash and positions. Nothing here touches a real venue.

mod portfolio;
mod position;

pub use portfolio::{Portfolio, PortfolioError};
pub use position::{Position, PositionStatus};
