//! # tlbgen
//!
//! FFI declaration generator for type-library metadata.
//!
//! tlbgen walks the entries of a type library (enums, records, unions,
//! aliases and interfaces) and renders them as `ENUM!`, `STRUCT!`, `UNION2!`
//! and `RIDL!` declarations for either winapi 0.2 or winapi 0.3.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tlbgen::prelude::*;
//!
//! let reader = Rc::new(MemoryReader::from_manifest(&xml)?);
//! let library = TypeLibrary::open(reader)?;
//! let result = Generator::new()
//!     .dialect(Dialect::Winapi02)
//!     .generate(&library, std::io::stdout())?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`model`] - Metadata model, reader trait, in-memory reader, manifest parser
//! - [`codegen`] - Type rendering, per-kind generators and the generation driver

pub mod prelude;

/// Metadata model and readers.
pub mod model {
    pub use tlbgen_model::*;
}

/// Declaration generation.
pub mod codegen {
    pub use tlbgen_codegen::*;
}

// Re-export commonly used items at the crate root
pub use tlbgen_codegen::{
    BuildResult, CodegenError, Dialect, Generator, MissingTypes, generate_from_file,
    generate_from_manifest,
};
pub use tlbgen_model::{MemoryReader, ModelError, TypeLibReader, TypeLibrary, load_manifest};

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::rc::Rc;

    #[test]
    fn test_prelude_round_trip() {
        let xml = r#"<typelib name="Facade">
            <enum name="Mode"><const name="ON" value="1"/></enum>
        </typelib>"#;
        let reader = Rc::new(MemoryReader::from_manifest(xml).unwrap());
        let library = TypeLibrary::open(reader.clone()).unwrap();

        let mut out = Vec::new();
        let result = Generator::new()
            .dialect(Dialect::Winapi02)
            .generate(&library, &mut out)
            .unwrap();
        assert_eq!(result.emitted, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ENUM! { enum Mode { ON = 1, } }\n\n"
        );

        drop(library);
        assert_eq!(reader.outstanding_handles(), 0);
    }
}
