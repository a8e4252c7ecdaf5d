pub mod assignment;
pub mod booking;
pub mod guide;
pub mod option;
pub mod pricing;
pub mod schedule;
