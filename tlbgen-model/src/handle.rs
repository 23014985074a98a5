//! Scoped reader handles.

use crate::reader::{RawHandle, TypeLibReader};
use std::fmt;
use std::rc::Rc;

/// Reference-counted guard over a reader handle.
///
/// Dropping the guard releases exactly one reference; cloning adds one.
/// Guards share the reader through `Rc` and are therefore confined to the
/// thread that created them.
pub struct Scoped {
    reader: Rc<dyn TypeLibReader>,
    raw: RawHandle,
}

impl Scoped {
    /// Takes ownership of a reference the reader already handed out.
    #[must_use]
    pub(crate) fn adopt(reader: Rc<dyn TypeLibReader>, raw: RawHandle) -> Self {
        Self { reader, raw }
    }

    /// Returns the raw handle.
    #[must_use]
    pub(crate) fn raw(&self) -> RawHandle {
        self.raw
    }

    /// Returns the reader this handle belongs to.
    #[must_use]
    pub(crate) fn reader(&self) -> &Rc<dyn TypeLibReader> {
        &self.reader
    }
}

impl Clone for Scoped {
    fn clone(&self) -> Self {
        self.reader.add_ref(self.raw);
        Self {
            reader: Rc::clone(&self.reader),
            raw: self.raw,
        }
    }
}

impl Drop for Scoped {
    fn drop(&mut self) {
        self.reader.release(self.raw);
    }
}

impl fmt::Debug for Scoped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scoped").field(&self.raw.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{LibraryDef, MemoryReader};

    fn reader() -> Rc<MemoryReader> {
        Rc::new(MemoryReader::new(LibraryDef::new("Empty")))
    }

    #[test]
    fn test_drop_releases() {
        let memory = reader();
        let raw = memory.open_library().unwrap();
        assert_eq!(memory.outstanding_handles(), 1);

        let scoped = Scoped::adopt(memory.clone(), raw);
        assert_eq!(scoped.raw(), raw);
        drop(scoped);
        assert_eq!(memory.outstanding_handles(), 0);
        assert_eq!(memory.over_releases(), 0);
    }

    #[test]
    fn test_clone_adds_reference() {
        let memory = reader();
        let raw = memory.open_library().unwrap();
        let first = Scoped::adopt(memory.clone(), raw);
        let second = first.clone();

        drop(first);
        assert_eq!(memory.outstanding_handles(), 1);
        drop(second);
        assert_eq!(memory.outstanding_handles(), 0);
        assert_eq!(memory.over_releases(), 0);
    }
}
