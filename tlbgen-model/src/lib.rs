//! # tlbgen Model
//!
//! Type-library metadata model.
//!
//! This crate provides:
//! - Value types for entries, members and recursive type descriptors
//! - The [`TypeLibReader`] trait abstracting the external metadata reader
//! - Scoped, reference-counted reader handles
//! - A lazy [`TypeLibrary`] view over a reader
//! - An in-memory reader and an XML manifest parser that feeds it

pub mod error;
pub mod handle;
pub mod library;
pub mod memory;
pub mod parser;
pub mod reader;
pub mod types;

pub use error::{ModelError, ParseError};
pub use library::{Function, Members, Param, TypeInfo, TypeInfos, TypeLibrary, Var};
pub use memory::{FuncDef, LibraryDef, MemoryReader, ParamDef, TypeDef};
pub use parser::{load_manifest, parse_manifest, parse_type};
pub use reader::{Acquired, RawHandle, Status, TypeLibReader};
pub use types::{
    FuncDesc, FuncKind, Guid, InvokeKind, ParamDesc, ParamFlags, RefHandle, ScalarTag,
    TypeAttributes, TypeDescriptor, TypeKind, VarDesc, VarValue,
};
