pub mod catalog;
pub mod practice;
pub mod skills;
