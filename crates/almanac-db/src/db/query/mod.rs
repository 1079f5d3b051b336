pub mod occurrence;
pub mod specification;
