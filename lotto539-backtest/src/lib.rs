pub mod payout;
pub mod report;
pub mod selector;
pub mod simulator;
pub mod strategy;
