pub mod interval;
pub mod jwt;
