pub mod dispatch;
pub mod input;
pub mod validate;
