//! Per-kind declaration generators.

pub mod aliases;
pub mod enums;
pub mod interfaces;
pub mod records;
pub mod unions;

pub use aliases::AliasGenerator;
pub use enums::EnumGenerator;
pub use interfaces::InterfaceGenerator;
pub use records::RecordGenerator;
pub use unions::UnionGenerator;

use std::borrow::Cow;

/// Rewrites identifiers that collide with Rust keywords used by the binding macros.
///
/// Only `type` is rewritten (to `type_`); every other identifier is returned
/// unchanged.
#[must_use]
pub fn sanitize(name: &str) -> Cow<'_, str> {
    match name {
        "type" => Cow::Borrowed("type_"),
        _ => Cow::Borrowed(name),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::rc::Rc;
    use tlbgen_model::{MemoryReader, TypeInfo, TypeLibrary};

    /// Opens a library built from the given manifest entries.
    pub(crate) fn manifest(entries: &str) -> (Rc<MemoryReader>, TypeLibrary) {
        let xml = format!(r#"<typelib name="Test">{entries}</typelib>"#);
        let reader = Rc::new(MemoryReader::from_manifest(&xml).expect("Failed to parse manifest"));
        let library = TypeLibrary::open(reader.clone()).expect("Failed to open library");
        (reader, library)
    }

    /// Returns the first listed entry.
    pub(crate) fn first_entry(library: &TypeLibrary) -> TypeInfo {
        library.get(0).expect("Failed to get entry")
    }

    /// Returns the listed entry with the given name.
    pub(crate) fn entry(library: &TypeLibrary, name: &str) -> TypeInfo {
        library
            .list()
            .map(|info| info.expect("Failed to get entry"))
            .find(|info| info.name() == name)
            .expect("entry not found")
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("type"), "type_");
        for name in ["Type", "types", "type_", "fn", "self", "value", ""] {
            assert_eq!(sanitize(name), name);
        }
    }
}
