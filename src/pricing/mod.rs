pub mod availability;
pub mod badges;
pub mod calculator;
