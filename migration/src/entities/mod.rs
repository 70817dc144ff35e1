pub mod click;
pub mod conversion;
pub mod goal;
pub mod registration;
pub mod transaction;
