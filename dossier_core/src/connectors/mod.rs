pub mod context7;
pub mod metasearch;
pub mod stackexchange;
pub mod wikipedia;
