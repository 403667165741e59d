//! Row structs for the practice and catalog tables.
//!
//! Each row type converts into its `choir_core` domain type with
//! `into_domain`; string-typed columns are validated on the way out.

pub mod catalog;
pub mod practice;
pub mod skill_record;
