//! Unity Graft Core
//!
//! Class identifiers and the class hierarchy shared by the binary codec.
//! Serialized objects only carry a numeric class ID; this crate answers
//! "what is class N called" and "is class N a kind of class M".

pub mod class_id;

pub use class_id::{ClassInfo, class_info, class_name, is_derived_from};
