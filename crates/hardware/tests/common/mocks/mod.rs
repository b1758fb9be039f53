//! Mock implementations of the crate's traits.
