pub mod occurrence;
pub mod specification;

pub use occurrence::EventOccurrence;
pub use specification::{EventSpecification, SpecificationDraft};
