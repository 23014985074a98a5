//! Abstraction over the external metadata reader.
//!
//! The reader is a black box provided by the host platform. Every handle it
//! returns carries one reference that the caller owns and must give back with
//! [`TypeLibReader::release`]. The model never touches raw handles outside
//! [`crate::handle::Scoped`].

use crate::error::ModelError;
use crate::types::{FuncDesc, RefHandle, TypeAttributes, VarDesc};
use std::fmt;

/// Status code reported by a failing reader call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub u32);

impl Status {
    /// A referenced library could not be loaded.
    pub const CANT_LOAD_LIBRARY: Self = Self(0x8002_9C4A);
    /// The requested element does not exist.
    pub const ELEMENT_NOT_FOUND: Self = Self(0x8002_802B);
    /// An argument (typically a handle) is not valid.
    pub const INVALID_ARG: Self = Self(0x8007_0057);
    /// An index is out of range.
    pub const OUT_OF_RANGE: Self = Self(0x8002_8CA1);

    /// Returns a symbolic name for well-known statuses.
    #[must_use]
    pub const fn name(&self) -> Option<&'static str> {
        match self.0 {
            0x8002_9C4A => Some("TYPE_E_CANTLOADLIBRARY"),
            0x8002_802B => Some("TYPE_E_ELEMENTNOTFOUND"),
            0x8007_0057 => Some("E_INVALIDARG"),
            0x8002_8CA1 => Some("TYPE_E_OUTOFBOUNDS"),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "status 0x{:08x}", self.0),
        }
    }
}

/// Opaque reader handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub u64);

/// A value returned together with the handle that keeps it alive.
#[derive(Debug)]
pub struct Acquired<T> {
    /// Handle owning one reference to the underlying descriptor.
    pub handle: RawHandle,
    /// Descriptor contents.
    pub value: T,
}

/// Calls consumed from the external metadata reader.
///
/// Methods returning a [`RawHandle`] (directly or inside [`Acquired`]) hand
/// one reference to the caller.
pub trait TypeLibReader {
    /// Opens the library and returns its handle.
    fn open_library(&self) -> Result<RawHandle, ModelError>;

    /// Returns the number of entries listed by the library.
    fn type_info_count(&self, library: RawHandle) -> Result<u32, ModelError>;

    /// Acquires the entry at `index`.
    fn type_info(&self, library: RawHandle, index: u32) -> Result<RawHandle, ModelError>;

    /// Returns the name of an entry.
    fn type_name(&self, ty: RawHandle) -> Result<String, ModelError>;

    /// Returns the attributes of an entry.
    fn type_attributes(&self, ty: RawHandle) -> Result<TypeAttributes, ModelError>;

    /// Acquires the variable member at `index`.
    fn var(&self, ty: RawHandle, index: u16) -> Result<Acquired<VarDesc>, ModelError>;

    /// Acquires the function member at `index`.
    fn func(&self, ty: RawHandle, index: u16) -> Result<Acquired<FuncDesc>, ModelError>;

    /// Acquires the parent at `index`.
    fn parent(&self, ty: RawHandle, index: u16) -> Result<RawHandle, ModelError>;

    /// Acquires the entry a reference made from `ty` points at.
    fn resolve_reference(&self, ty: RawHandle, reference: RefHandle)
    -> Result<RawHandle, ModelError>;

    /// Acquires the interface half of a dual dispatch interface.
    ///
    /// Fails with [`Status::ELEMENT_NOT_FOUND`] when `ty` is not dual.
    fn dual_interface(&self, ty: RawHandle) -> Result<RawHandle, ModelError>;

    /// Adds a reference to a handle.
    fn add_ref(&self, handle: RawHandle);

    /// Gives back one reference to a handle.
    fn release(&self, handle: RawHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(Status::CANT_LOAD_LIBRARY.to_string(), "TYPE_E_CANTLOADLIBRARY");
        assert_eq!(Status::ELEMENT_NOT_FOUND.to_string(), "TYPE_E_ELEMENTNOTFOUND");
        assert_eq!(Status(0x8000_4005).to_string(), "status 0x80004005");
    }

    #[test]
    fn test_status_name() {
        assert_eq!(Status::INVALID_ARG.name(), Some("E_INVALIDARG"));
        assert_eq!(Status(1).name(), None);
    }
}
