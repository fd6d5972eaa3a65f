//! Problem definitions built on the search engine.

pub mod assignta;
pub mod sorting;
