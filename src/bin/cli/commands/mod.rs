pub mod build;
pub mod count;
pub mod draw;
pub mod practice;
pub mod search;
