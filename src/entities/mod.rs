pub mod booking;
pub mod parking_entrance;
pub mod parking_lot;
pub mod parking_space;
pub mod review;
pub mod user;
