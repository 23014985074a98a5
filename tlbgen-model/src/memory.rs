//! In-memory metadata reader.
//!
//! [`MemoryReader`] implements [`TypeLibReader`] over an owned
//! [`LibraryDef`]. It hands out a fresh handle for every acquisition and keeps
//! exact per-handle reference counts, so callers can check that every handle
//! was given back exactly once.

use crate::error::{ModelError, ParseError};
use crate::reader::{Acquired, RawHandle, Status, TypeLibReader};
use crate::types::{
    FuncDesc, FuncKind, Guid, InvokeKind, ParamDesc, ParamFlags, RefHandle, ScalarTag,
    TypeAttributes, TypeDescriptor, TypeKind, VarDesc,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Parameter of a [`FuncDef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub descriptor: TypeDescriptor,
    /// Direction flags.
    pub flags: ParamFlags,
}

impl ParamDef {
    /// Creates a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, descriptor: TypeDescriptor, flags: ParamFlags) -> Self {
        Self {
            name: name.into(),
            descriptor,
            flags,
        }
    }
}

/// Function defined on a [`TypeDef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDef {
    /// Function name.
    pub name: String,
    /// Invocation kind.
    pub invoke_kind: InvokeKind,
    /// Binding kind.
    pub func_kind: FuncKind,
    /// Vtable offset.
    pub vtable_offset: u16,
    /// Parameters in declared order.
    pub params: Vec<ParamDef>,
    /// Declared return type.
    pub return_type: TypeDescriptor,
    /// Report one parameter name fewer than there are parameters.
    pub unnamed_last: bool,
}

impl FuncDef {
    /// Creates a pure-virtual function returning `void`.
    #[must_use]
    pub fn new(name: impl Into<String>, invoke_kind: InvokeKind, vtable_offset: u16) -> Self {
        Self {
            name: name.into(),
            invoke_kind,
            func_kind: FuncKind::PureVirtual,
            vtable_offset,
            params: Vec::new(),
            return_type: TypeDescriptor::scalar(ScalarTag::Void),
            unnamed_last: false,
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    /// Leaves the last parameter unnamed.
    #[must_use]
    pub fn unnamed_last(mut self) -> Self {
        self.unnamed_last = true;
        self
    }

    fn describe(&self) -> FuncDesc {
        let mut names = Vec::with_capacity(self.params.len() + 1);
        names.push(self.name.clone());
        let named = if self.unnamed_last {
            self.params.len().saturating_sub(1)
        } else {
            self.params.len()
        };
        names.extend(self.params[..named].iter().map(|p| p.name.clone()));

        FuncDesc {
            names,
            invoke_kind: self.invoke_kind,
            func_kind: self.func_kind,
            vtable_offset: self.vtable_offset,
            params: self
                .params
                .iter()
                .map(|p| ParamDesc {
                    descriptor: p.descriptor.clone(),
                    flags: p.flags,
                })
                .collect(),
            return_type: self.return_type.clone(),
        }
    }
}

/// Entry defined in a [`LibraryDef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    /// Entry name.
    pub name: String,
    /// Entry kind.
    pub kind: TypeKind,
    /// Entry identifier.
    pub guid: Guid,
    /// Instance size in bytes.
    pub size: u32,
    /// Alignment in bytes.
    pub alignment: u16,
    /// Vtable size.
    pub vtable_size: u16,
    /// Alias target.
    pub alias_target: Option<TypeDescriptor>,
    /// Parent names, in declared order.
    pub parents: Vec<String>,
    /// Variable members.
    pub vars: Vec<VarDesc>,
    /// Function members.
    pub funcs: Vec<FuncDef>,
    /// Interface half of a dual dispatch interface.
    pub dual: Option<String>,
    /// Defined by another library: resolvable but not listed.
    pub external: bool,
    /// Acquiring this entry fails with [`Status::CANT_LOAD_LIBRARY`].
    pub unloadable: bool,
}

impl TypeDef {
    /// Creates an empty entry.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            guid: Guid::NIL,
            size: 0,
            alignment: 4,
            vtable_size: 0,
            alias_target: None,
            parents: Vec::new(),
            vars: Vec::new(),
            funcs: Vec::new(),
            dual: None,
            external: false,
            unloadable: false,
        }
    }

    /// Sets instance size and alignment.
    #[must_use]
    pub fn layout(mut self, size: u32, alignment: u16) -> Self {
        self.size = size;
        self.alignment = alignment;
        self
    }

    /// Sets the vtable size.
    #[must_use]
    pub fn vtable_size(mut self, vtable_size: u16) -> Self {
        self.vtable_size = vtable_size;
        self
    }

    /// Sets the alias target.
    #[must_use]
    pub fn alias_of(mut self, target: TypeDescriptor) -> Self {
        self.alias_target = Some(target);
        self
    }

    /// Appends a parent by name.
    #[must_use]
    pub fn with_parent(mut self, name: impl Into<String>) -> Self {
        self.parents.push(name.into());
        self
    }

    /// Appends a variable member.
    #[must_use]
    pub fn with_var(mut self, var: VarDesc) -> Self {
        self.vars.push(var);
        self
    }

    /// Appends a function member.
    #[must_use]
    pub fn with_func(mut self, func: FuncDef) -> Self {
        self.funcs.push(func);
        self
    }

    /// Names the interface half of this dual dispatch interface.
    #[must_use]
    pub fn dual(mut self, interface: impl Into<String>) -> Self {
        self.dual = Some(interface.into());
        self
    }

    /// Marks the entry as defined by another library.
    #[must_use]
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    /// Marks the entry as unloadable.
    #[must_use]
    pub fn unloadable(mut self) -> Self {
        self.unloadable = true;
        self
    }

    fn attributes(&self) -> Result<TypeAttributes, ModelError> {
        let count = |len: usize, what: &str| {
            u16::try_from(len).map_err(|_| {
                ModelError::contract(format!("'{}' has too many {}", self.name, what))
            })
        };
        Ok(TypeAttributes {
            kind: self.kind,
            guid: self.guid,
            instance_size: self.size,
            alignment: self.alignment,
            vtable_size: self.vtable_size,
            parent_count: count(self.parents.len(), "parents")?,
            var_count: count(self.vars.len(), "variables")?,
            func_count: count(self.funcs.len(), "functions")?,
            alias_target: self.alias_target.clone(),
        })
    }
}

/// Owned definition of a whole library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryDef {
    /// Library name.
    pub name: String,
    /// Entries, listed and external, in declaration order.
    pub types: Vec<TypeDef>,
    references: Vec<String>,
}

impl LibraryDef {
    /// Creates an empty library.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Appends an entry.
    pub fn push(&mut self, ty: TypeDef) {
        self.types.push(ty);
    }

    /// Returns the reference handle for a named entry, interning it on first use.
    pub fn reference(&mut self, name: &str) -> RefHandle {
        let index = match self.references.iter().position(|r| r == name) {
            Some(index) => index,
            None => {
                self.references.push(name.to_string());
                self.references.len() - 1
            }
        };
        RefHandle(index as u32)
    }

    /// Returns the name a reference handle points at.
    #[must_use]
    pub fn reference_name(&self, reference: RefHandle) -> Option<&str> {
        self.references
            .get(reference.0 as usize)
            .map(String::as_str)
    }

    /// Finds an entry by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|ty| ty.name == name)
    }

    /// Returns the entries the library lists.
    pub fn listed(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter().filter(|ty| !ty.external)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Library,
    Type(usize),
    Var(usize, u16),
    Func(usize, u16),
}

#[derive(Debug)]
struct Slot {
    target: Target,
    refs: u32,
}

/// [`TypeLibReader`] backed by a [`LibraryDef`].
#[derive(Debug)]
pub struct MemoryReader {
    library: LibraryDef,
    listed: Vec<usize>,
    handles: RefCell<HashMap<u64, Slot>>,
    next_handle: Cell<u64>,
    over_releases: Cell<usize>,
}

impl MemoryReader {
    /// Creates a reader over `library`.
    #[must_use]
    pub fn new(library: LibraryDef) -> Self {
        let listed = library
            .types
            .iter()
            .enumerate()
            .filter(|(_, ty)| !ty.external)
            .map(|(index, _)| index)
            .collect();
        Self {
            library,
            listed,
            handles: RefCell::new(HashMap::new()),
            next_handle: Cell::new(1),
            over_releases: Cell::new(0),
        }
    }

    /// Creates a reader from manifest text.
    ///
    /// # Errors
    /// Returns an error if the manifest cannot be parsed.
    pub fn from_manifest(xml: &str) -> Result<Self, ParseError> {
        crate::parser::parse_manifest(xml).map(Self::new)
    }

    /// Returns the number of handles holding at least one reference.
    #[must_use]
    pub fn outstanding_handles(&self) -> usize {
        self.handles.borrow().len()
    }

    /// Returns how many releases targeted unknown or already released handles.
    #[must_use]
    pub fn over_releases(&self) -> usize {
        self.over_releases.get()
    }

    fn acquire(&self, target: Target) -> RawHandle {
        let id = self.next_handle.get();
        self.next_handle.set(id + 1);
        self.handles.borrow_mut().insert(id, Slot { target, refs: 1 });
        tracing::trace!(handle = id, ?target, "acquired");
        RawHandle(id)
    }

    fn target(&self, call: &'static str, handle: RawHandle) -> Result<Target, ModelError> {
        self.handles
            .borrow()
            .get(&handle.0)
            .map(|slot| slot.target)
            .ok_or(ModelError::external(call, Status::INVALID_ARG))
    }

    fn type_index(&self, call: &'static str, handle: RawHandle) -> Result<usize, ModelError> {
        match self.target(call, handle)? {
            Target::Type(index) => Ok(index),
            _ => Err(ModelError::external(call, Status::INVALID_ARG)),
        }
    }

    fn type_def(&self, call: &'static str, handle: RawHandle) -> Result<&TypeDef, ModelError> {
        let index = self.type_index(call, handle)?;
        Ok(&self.library.types[index])
    }

    /// Acquires a named entry, honouring its loadability.
    fn acquire_named(&self, call: &'static str, name: &str) -> Result<RawHandle, ModelError> {
        let index = self
            .library
            .types
            .iter()
            .position(|ty| ty.name == name)
            .ok_or(ModelError::external(call, Status::ELEMENT_NOT_FOUND))?;
        self.acquire_type(call, index)
    }

    fn acquire_type(&self, call: &'static str, index: usize) -> Result<RawHandle, ModelError> {
        if self.library.types[index].unloadable {
            return Err(ModelError::external(call, Status::CANT_LOAD_LIBRARY));
        }
        Ok(self.acquire(Target::Type(index)))
    }
}

impl TypeLibReader for MemoryReader {
    fn open_library(&self) -> Result<RawHandle, ModelError> {
        Ok(self.acquire(Target::Library))
    }

    fn type_info_count(&self, library: RawHandle) -> Result<u32, ModelError> {
        match self.target("type_info_count", library)? {
            Target::Library => Ok(self.listed.len() as u32),
            _ => Err(ModelError::external("type_info_count", Status::INVALID_ARG)),
        }
    }

    fn type_info(&self, library: RawHandle, index: u32) -> Result<RawHandle, ModelError> {
        if self.target("type_info", library)? != Target::Library {
            return Err(ModelError::external("type_info", Status::INVALID_ARG));
        }
        let type_index = *self
            .listed
            .get(index as usize)
            .ok_or(ModelError::external("type_info", Status::OUT_OF_RANGE))?;
        self.acquire_type("type_info", type_index)
    }

    fn type_name(&self, ty: RawHandle) -> Result<String, ModelError> {
        Ok(self.type_def("type_name", ty)?.name.clone())
    }

    fn type_attributes(&self, ty: RawHandle) -> Result<TypeAttributes, ModelError> {
        self.type_def("type_attributes", ty)?.attributes()
    }

    fn var(&self, ty: RawHandle, index: u16) -> Result<Acquired<VarDesc>, ModelError> {
        let type_index = self.type_index("var", ty)?;
        let value = self.library.types[type_index]
            .vars
            .get(usize::from(index))
            .cloned()
            .ok_or(ModelError::external("var", Status::OUT_OF_RANGE))?;
        let handle = self.acquire(Target::Var(type_index, index));
        Ok(Acquired { handle, value })
    }

    fn func(&self, ty: RawHandle, index: u16) -> Result<Acquired<FuncDesc>, ModelError> {
        let type_index = self.type_index("func", ty)?;
        let value = self.library.types[type_index]
            .funcs
            .get(usize::from(index))
            .map(FuncDef::describe)
            .ok_or(ModelError::external("func", Status::OUT_OF_RANGE))?;
        let handle = self.acquire(Target::Func(type_index, index));
        Ok(Acquired { handle, value })
    }

    fn parent(&self, ty: RawHandle, index: u16) -> Result<RawHandle, ModelError> {
        let name = self
            .type_def("parent", ty)?
            .parents
            .get(usize::from(index))
            .ok_or(ModelError::external("parent", Status::OUT_OF_RANGE))?;
        self.acquire_named("parent", name)
    }

    fn resolve_reference(
        &self,
        ty: RawHandle,
        reference: RefHandle,
    ) -> Result<RawHandle, ModelError> {
        self.type_index("resolve_reference", ty)?;
        let name = self
            .library
            .reference_name(reference)
            .ok_or(ModelError::external("resolve_reference", Status::INVALID_ARG))?;
        self.acquire_named("resolve_reference", name)
    }

    fn dual_interface(&self, ty: RawHandle) -> Result<RawHandle, ModelError> {
        let def = self.type_def("dual_interface", ty)?;
        match (&def.kind, &def.dual) {
            (TypeKind::Dispatch, Some(name)) => self.acquire_named("dual_interface", name),
            _ => Err(ModelError::external(
                "dual_interface",
                Status::ELEMENT_NOT_FOUND,
            )),
        }
    }

    fn add_ref(&self, handle: RawHandle) {
        match self.handles.borrow_mut().get_mut(&handle.0) {
            Some(slot) => slot.refs += 1,
            None => tracing::error!(handle = handle.0, "add_ref on a released handle"),
        }
    }

    fn release(&self, handle: RawHandle) {
        let mut handles = self.handles.borrow_mut();
        let remaining = handles.get_mut(&handle.0).map(|slot| {
            slot.refs -= 1;
            slot.refs
        });
        match remaining {
            Some(0) => {
                handles.remove(&handle.0);
                tracing::trace!(handle = handle.0, "released");
            }
            Some(_) => {}
            None => {
                tracing::error!(handle = handle.0, "release of an unknown handle");
                self.over_releases.set(self.over_releases.get() + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LibraryDef {
        let mut lib = LibraryDef::new("Sample");
        lib.push(TypeDef::new("IUnknown", TypeKind::Interface).external());
        lib.push(
            TypeDef::new("Point", TypeKind::Record)
                .layout(8, 4)
                .with_var(VarDesc::field("x", TypeDescriptor::scalar(ScalarTag::I4)))
                .with_var(VarDesc::field("y", TypeDescriptor::scalar(ScalarTag::I4))),
        );
        lib
    }

    #[test]
    fn test_external_entries_are_not_listed() {
        let reader = MemoryReader::new(sample());
        let lib = reader.open_library().unwrap();
        assert_eq!(reader.type_info_count(lib).unwrap(), 1);

        let point = reader.type_info(lib, 0).unwrap();
        assert_eq!(reader.type_name(point).unwrap(), "Point");
        let attrs = reader.type_attributes(point).unwrap();
        assert_eq!(attrs.var_count, 2);
        assert_eq!(attrs.instance_size, 8);

        let err = reader.type_info(lib, 1).unwrap_err();
        assert_eq!(err.status(), Some(Status::OUT_OF_RANGE));

        reader.release(point);
        reader.release(lib);
        assert_eq!(reader.outstanding_handles(), 0);
    }

    #[test]
    fn test_reference_counting() {
        let reader = MemoryReader::new(sample());
        let lib = reader.open_library().unwrap();
        reader.add_ref(lib);
        reader.release(lib);
        assert_eq!(reader.outstanding_handles(), 1);
        reader.release(lib);
        assert_eq!(reader.outstanding_handles(), 0);
        assert_eq!(reader.over_releases(), 0);

        reader.release(lib);
        assert_eq!(reader.over_releases(), 1);
    }

    #[test]
    fn test_member_handles() {
        let reader = MemoryReader::new(sample());
        let lib = reader.open_library().unwrap();
        let point = reader.type_info(lib, 0).unwrap();
        let var = reader.var(point, 1).unwrap();
        assert_eq!(var.value.name, "y");
        assert_eq!(reader.outstanding_handles(), 3);

        assert!(reader.var(point, 2).is_err());
        reader.release(var.handle);
        reader.release(point);
        reader.release(lib);
        assert_eq!(reader.outstanding_handles(), 0);
    }

    #[test]
    fn test_invalid_handle() {
        let reader = MemoryReader::new(sample());
        let err = reader.type_name(RawHandle(99)).unwrap_err();
        assert_eq!(err.status(), Some(Status::INVALID_ARG));

        let lib = reader.open_library().unwrap();
        let err = reader.type_attributes(lib).unwrap_err();
        assert_eq!(err.status(), Some(Status::INVALID_ARG));
        reader.release(lib);
    }

    #[test]
    fn test_reference_interning() {
        let mut lib = LibraryDef::new("Refs");
        let a = lib.reference("A");
        let b = lib.reference("B");
        assert_ne!(a, b);
        assert_eq!(lib.reference("A"), a);
        assert_eq!(lib.reference_name(b), Some("B"));
        assert_eq!(lib.reference_name(RefHandle(42)), None);
    }

    #[test]
    fn test_unnamed_last_names() {
        let func = FuncDef::new("Value", InvokeKind::PropertyPut, 28)
            .with_param(ParamDef::new(
                "v",
                TypeDescriptor::scalar(ScalarTag::I4),
                ParamFlags::IN,
            ))
            .unnamed_last();
        let desc = func.describe();
        assert_eq!(desc.names, vec!["Value".to_string()]);
        assert_eq!(desc.params.len(), 1);
    }
}
