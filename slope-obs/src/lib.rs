pub mod cache;
pub mod date_range;
pub mod jma;
pub mod normalize;
pub mod observation;
pub mod owm;
pub mod resort;
