//! # tlbgen Codegen
//!
//! FFI declaration generation from type-library metadata.
//!
//! This crate provides:
//! - Recursive rendering of type descriptors in two output dialects
//! - Per-kind generators for enums, records, unions, aliases and interfaces
//! - A [`Generator`] driver that walks a library and collects a [`BuildResult`]

pub mod dialect;
pub mod error;
pub mod generator;
pub mod resolver;
pub mod rust;

pub use dialect::Dialect;
pub use error::CodegenError;
pub use generator::{BuildResult, Emission, Generator};
pub use resolver::{MISSING_TYPE, MissingTypes, ReferenceResolver, TypeRenderer, scalar_name};

use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use tlbgen_model::{MemoryReader, ModelError, TypeLibrary};

/// Generates declarations from a manifest string.
///
/// # Arguments
/// * `xml` - Type-library manifest content
/// * `generator` - Configured generator
///
/// # Returns
/// Generated declarations and the run's counters.
///
/// # Errors
/// Returns `CodegenError` if parsing or generation fails.
pub fn generate_from_manifest(
    xml: &str,
    generator: &Generator,
) -> Result<(String, BuildResult), CodegenError> {
    let reader = MemoryReader::from_manifest(xml).map_err(ModelError::from)?;
    let library = TypeLibrary::open(Rc::new(reader))?;
    let mut out = Vec::new();
    let result = generator.generate(&library, &mut out)?;
    let text = String::from_utf8(out).map_err(|err| {
        CodegenError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })?;
    Ok((text, result))
}

/// Generates declarations from a manifest file and writes them to `out`.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, generation or writing fails.
/// An unreadable file is reported as a library that cannot be loaded.
pub fn generate_from_file<W: Write>(
    path: &Path,
    generator: &Generator,
    out: W,
) -> Result<BuildResult, CodegenError> {
    let definition = tlbgen_model::load_manifest(path)?;
    let library = TypeLibrary::open(Rc::new(MemoryReader::new(definition)))?;
    generator.generate(&library, out)
}
