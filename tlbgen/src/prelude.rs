//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use tlbgen::prelude::*;
//! ```

// Model types
pub use tlbgen_model::{
    Guid, InvokeKind, LibraryDef, MemoryReader, ModelError, ParamFlags, ParseError, ScalarTag,
    Status, TypeDef, TypeDescriptor, TypeInfo, TypeKind, TypeLibReader, TypeLibrary,
    load_manifest, parse_manifest,
};

// Codegen types
pub use tlbgen_codegen::{
    BuildResult, CodegenError, Dialect, Emission, Generator, MissingTypes, ReferenceResolver,
};
