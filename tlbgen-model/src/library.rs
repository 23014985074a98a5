//! Lazy, read-only view over a type library.
//!
//! Every view holds a [`Scoped`] handle, so it keeps its underlying reader
//! resource alive independently of the library or entry it was derived from.

use crate::error::ModelError;
use crate::handle::Scoped;
use crate::reader::{Status, TypeLibReader};
use crate::types::{
    FuncDesc, FuncKind, InvokeKind, ParamFlags, RefHandle, TypeAttributes, TypeDescriptor,
    TypeKind, VarDesc, VarValue,
};
use std::rc::Rc;

/// An opened type library.
#[derive(Debug)]
pub struct TypeLibrary {
    handle: Scoped,
    count: u32,
}

impl TypeLibrary {
    /// Opens the library exposed by `reader`.
    ///
    /// # Errors
    /// Returns an error if the reader cannot open the library or count its
    /// entries.
    pub fn open(reader: Rc<dyn TypeLibReader>) -> Result<Self, ModelError> {
        let raw = reader.open_library()?;
        let handle = Scoped::adopt(reader, raw);
        let count = handle.reader().type_info_count(handle.raw())?;
        tracing::debug!(entries = count, "opened type library");
        Ok(Self { handle, count })
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Returns true if the library lists no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Acquires the entry at `index`.
    ///
    /// # Errors
    /// Returns an error if any reader call fails.
    pub fn get(&self, index: u32) -> Result<TypeInfo, ModelError> {
        let reader = self.handle.reader();
        let raw = reader.type_info(self.handle.raw(), index)?;
        TypeInfo::from_handle(Scoped::adopt(Rc::clone(reader), raw))
    }

    /// Returns the entries in declaration order.
    ///
    /// The sequence is lazy; calling `list` again starts over from index 0.
    #[must_use]
    pub fn list(&self) -> TypeInfos<'_> {
        TypeInfos {
            library: self,
            next: 0,
        }
    }
}

/// Iterator over the entries of a [`TypeLibrary`].
#[derive(Debug)]
pub struct TypeInfos<'a> {
    library: &'a TypeLibrary,
    next: u32,
}

impl Iterator for TypeInfos<'_> {
    type Item = Result<TypeInfo, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.library.count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.library.get(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.library.count - self.next) as usize;
        (remaining, Some(remaining))
    }
}

/// A type-library entry with its name and attributes.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    handle: Scoped,
    name: String,
    attributes: TypeAttributes,
}

impl TypeInfo {
    fn from_handle(handle: Scoped) -> Result<Self, ModelError> {
        let reader = handle.reader();
        let name = reader.type_name(handle.raw())?;
        let attributes = reader.type_attributes(handle.raw())?;
        Ok(Self {
            handle,
            name,
            attributes,
        })
    }

    /// Returns the entry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry attributes.
    #[must_use]
    pub fn attributes(&self) -> &TypeAttributes {
        &self.attributes
    }

    /// Returns the entry kind.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.attributes.kind
    }

    /// Returns the variable members in index order.
    #[must_use]
    pub fn vars(&self) -> Members<'_, Var> {
        Members::new(self, self.attributes.var_count, Var::fetch)
    }

    /// Returns the function members in index order.
    #[must_use]
    pub fn functions(&self) -> Members<'_, Function> {
        Members::new(self, self.attributes.func_count, Function::fetch)
    }

    /// Returns the parents in declared order.
    #[must_use]
    pub fn parents(&self) -> Members<'_, TypeInfo> {
        Members::new(self, self.attributes.parent_count, TypeInfo::fetch_parent)
    }

    fn fetch_parent(owner: &TypeInfo, index: u16) -> Result<TypeInfo, ModelError> {
        let reader = owner.handle.reader();
        let raw = reader.parent(owner.handle.raw(), index)?;
        TypeInfo::from_handle(Scoped::adopt(Rc::clone(reader), raw))
    }

    /// Resolves a reference made from this entry.
    ///
    /// # Errors
    /// Returns [`ModelError::Resolution`] carrying the reader status if the
    /// reference cannot be resolved.
    pub fn resolve_reference(&self, reference: RefHandle) -> Result<TypeInfo, ModelError> {
        let reader = self.handle.reader();
        let raw = reader
            .resolve_reference(self.handle.raw(), reference)
            .map_err(|err| match err.status() {
                Some(status) => ModelError::Resolution { reference, status },
                None => err,
            })?;
        TypeInfo::from_handle(Scoped::adopt(Rc::clone(reader), raw))
    }

    /// Returns the interface half of a dual dispatch interface.
    ///
    /// Entries that are not dual interfaces yield `None`.
    ///
    /// # Errors
    /// Returns an error if the reader fails for any other reason.
    pub fn dual_interface(&self) -> Result<Option<TypeInfo>, ModelError> {
        let reader = self.handle.reader();
        match reader.dual_interface(self.handle.raw()) {
            Ok(raw) => TypeInfo::from_handle(Scoped::adopt(Rc::clone(reader), raw)).map(Some),
            Err(err) if err.status() == Some(Status::ELEMENT_NOT_FOUND) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Lazy iterator over indexed members of a [`TypeInfo`].
pub struct Members<'a, T> {
    owner: &'a TypeInfo,
    next: u16,
    count: u16,
    fetch: fn(&TypeInfo, u16) -> Result<T, ModelError>,
}

impl<'a, T> Members<'a, T> {
    fn new(
        owner: &'a TypeInfo,
        count: u16,
        fetch: fn(&TypeInfo, u16) -> Result<T, ModelError>,
    ) -> Self {
        Self {
            owner,
            next: 0,
            count,
            fetch,
        }
    }
}

impl<T> Iterator for Members<'_, T> {
    type Item = Result<T, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some((self.fetch)(self.owner, index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::from(self.count - self.next);
        (remaining, Some(remaining))
    }
}

/// A variable member: enum constant, record or union field, or property.
#[derive(Debug, Clone)]
pub struct Var {
    _handle: Scoped,
    name: String,
    descriptor: TypeDescriptor,
    value: Option<VarValue>,
}

impl Var {
    fn fetch(owner: &TypeInfo, index: u16) -> Result<Var, ModelError> {
        let reader = owner.handle.reader();
        let acquired = reader.var(owner.handle.raw(), index)?;
        let handle = Scoped::adopt(Rc::clone(reader), acquired.handle);
        let VarDesc {
            name,
            descriptor,
            value,
        } = acquired.value;
        Ok(Var {
            _handle: handle,
            name,
            descriptor,
            value,
        })
    }

    /// Returns the member name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the member type.
    #[must_use]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Returns the literal value of a constant.
    #[must_use]
    pub fn value(&self) -> Option<VarValue> {
        self.value
    }
}

/// A function parameter with its normalized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub descriptor: TypeDescriptor,
    /// Direction flags.
    pub flags: ParamFlags,
}

/// A function member.
#[derive(Debug, Clone)]
pub struct Function {
    _handle: Scoped,
    name: String,
    invoke_kind: InvokeKind,
    func_kind: FuncKind,
    vtable_offset: u16,
    params: Vec<Param>,
    return_type: TypeDescriptor,
}

impl Function {
    fn fetch(owner: &TypeInfo, index: u16) -> Result<Function, ModelError> {
        let reader = owner.handle.reader();
        let acquired = reader.func(owner.handle.raw(), index)?;
        let handle = Scoped::adopt(Rc::clone(reader), acquired.handle);
        Function::from_desc(handle, acquired.value)
    }

    fn from_desc(handle: Scoped, desc: FuncDesc) -> Result<Function, ModelError> {
        let FuncDesc {
            names,
            invoke_kind,
            func_kind,
            vtable_offset,
            params,
            return_type,
        } = desc;

        let mut names = names.into_iter();
        let name = names
            .next()
            .ok_or_else(|| ModelError::contract("function reported no names"))?;
        let mut param_names: Vec<String> = names.collect();

        if param_names.len() != params.len() {
            // Setters may leave their trailing value parameter unnamed.
            if invoke_kind.is_put() && param_names.len() + 1 == params.len() {
                param_names.push("value".to_string());
            } else {
                return Err(ModelError::contract(format!(
                    "function '{}' reported {} parameter names for {} parameters",
                    name,
                    param_names.len(),
                    params.len()
                )));
            }
        }

        let params = param_names
            .into_iter()
            .zip(params)
            .map(|(name, param)| Param {
                name,
                descriptor: param.descriptor,
                flags: param.flags,
            })
            .collect();

        Ok(Function {
            _handle: handle,
            name,
            invoke_kind,
            func_kind,
            vtable_offset,
            params,
            return_type,
        })
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the invocation kind.
    #[must_use]
    pub fn invoke_kind(&self) -> InvokeKind {
        self.invoke_kind
    }

    /// Returns the binding kind.
    #[must_use]
    pub fn func_kind(&self) -> FuncKind {
        self.func_kind
    }

    /// Returns the vtable offset.
    #[must_use]
    pub fn vtable_offset(&self) -> u16 {
        self.vtable_offset
    }

    /// Returns the parameters in declared order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns the declared return type.
    #[must_use]
    pub fn return_type(&self) -> &TypeDescriptor {
        &self.return_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FuncDef, LibraryDef, MemoryReader, ParamDef, TypeDef};
    use crate::types::ScalarTag;

    fn i4() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarTag::I4)
    }

    fn sample() -> LibraryDef {
        let mut lib = LibraryDef::new("Sample");
        lib.push(
            TypeDef::new("Color", TypeKind::Enum)
                .with_var(VarDesc::constant("RED", 0))
                .with_var(VarDesc::constant("GREEN", 1)),
        );
        lib.push(TypeDef::new("IUnknown", TypeKind::Interface).vtable_size(24).external());
        lib.push(
            TypeDef::new("IFoo", TypeKind::Interface)
                .vtable_size(32)
                .with_parent("IUnknown")
                .with_func(
                    FuncDef::new("Bar", InvokeKind::Func, 24)
                        .with_param(ParamDef::new("x", i4(), ParamFlags::IN)),
                ),
        );
        lib
    }

    fn open(lib: LibraryDef) -> (Rc<MemoryReader>, TypeLibrary) {
        let reader = Rc::new(MemoryReader::new(lib));
        let library = TypeLibrary::open(reader.clone()).unwrap();
        (reader, library)
    }

    #[test]
    fn test_list_is_restartable() {
        let (reader, library) = open(sample());
        assert_eq!(library.len(), 2);

        let first: Vec<String> = library
            .list()
            .map(|ty| ty.unwrap().name().to_string())
            .collect();
        let second: Vec<String> = library
            .list()
            .map(|ty| ty.unwrap().name().to_string())
            .collect();
        assert_eq!(first, vec!["Color", "IFoo"]);
        assert_eq!(first, second);

        drop(library);
        assert_eq!(reader.outstanding_handles(), 0);
        assert_eq!(reader.over_releases(), 0);
    }

    #[test]
    fn test_vars_and_parents() {
        let (reader, library) = open(sample());
        let color = library.get(0).unwrap();
        let vars: Vec<Var> = color.vars().collect::<Result<_, _>>().unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[1].name(), "GREEN");
        assert_eq!(vars[1].value(), Some(VarValue::I4(1)));

        let foo = library.get(1).unwrap();
        let parents: Vec<TypeInfo> = foo.parents().collect::<Result<_, _>>().unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].name(), "IUnknown");
        assert_eq!(parents[0].attributes().vtable_size, 24);

        drop((vars, parents, color, foo, library));
        assert_eq!(reader.outstanding_handles(), 0);
    }

    #[test]
    fn test_views_outlive_library() {
        let (reader, library) = open(sample());
        let foo = library.get(1).unwrap();
        drop(library);

        let functions: Vec<Function> = foo.functions().collect::<Result<_, _>>().unwrap();
        assert_eq!(functions[0].name(), "Bar");
        assert_eq!(functions[0].params()[0].name, "x");
        drop((foo, functions));
        assert_eq!(reader.outstanding_handles(), 0);
    }

    #[test]
    fn test_resolution_failure() {
        let mut lib = LibraryDef::new("Broken");
        let missing = lib.reference("Nowhere");
        lib.push(TypeDef::new("Alias", TypeKind::Alias).alias_of(TypeDescriptor::UserDefined(missing)));
        let (reader, library) = open(lib);

        let alias = library.get(0).unwrap();
        let err = alias.resolve_reference(missing).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Resolution {
                status: Status::ELEMENT_NOT_FOUND,
                ..
            }
        ));
        drop((alias, library));
        assert_eq!(reader.outstanding_handles(), 0);
    }

    #[test]
    fn test_dual_interface() {
        let mut lib = LibraryDef::new("Dual");
        lib.push(TypeDef::new("IDual", TypeKind::Interface).external());
        lib.push(TypeDef::new("DDual", TypeKind::Dispatch).dual("IDual"));
        lib.push(TypeDef::new("DPlain", TypeKind::Dispatch));
        let (reader, library) = open(lib);

        let dual = library.get(0).unwrap();
        let half = dual.dual_interface().unwrap().unwrap();
        assert_eq!(half.name(), "IDual");
        assert_eq!(half.kind(), TypeKind::Interface);

        let plain = library.get(1).unwrap();
        assert!(plain.dual_interface().unwrap().is_none());

        drop((dual, half, plain, library));
        assert_eq!(reader.outstanding_handles(), 0);
    }

    #[test]
    fn test_unnamed_setter_value() {
        let mut lib = LibraryDef::new("Setters");
        lib.push(
            TypeDef::new("IProps", TypeKind::Interface)
                .with_func(
                    FuncDef::new("Count", InvokeKind::PropertyPut, 0)
                        .with_param(ParamDef::new("ignored", i4(), ParamFlags::IN))
                        .unnamed_last(),
                )
                .with_func(
                    FuncDef::new("Size", InvokeKind::Func, 8)
                        .with_param(ParamDef::new("ignored", i4(), ParamFlags::IN))
                        .unnamed_last(),
                ),
        );
        let (_reader, library) = open(lib);
        let props = library.get(0).unwrap();
        let mut functions = props.functions();

        let put = functions.next().unwrap().unwrap();
        assert_eq!(put.params()[0].name, "value");

        let err = functions.next().unwrap().unwrap_err();
        assert!(matches!(err, ModelError::Contract { .. }));
    }

    #[test]
    fn test_unloadable_entry() {
        let mut lib = LibraryDef::new("Partial");
        lib.push(TypeDef::new("Gone", TypeKind::Record).unloadable());
        lib.push(TypeDef::new("Here", TypeKind::Record));
        let (reader, library) = open(lib);

        let results: Vec<_> = library.list().collect();
        assert!(results[0].as_ref().unwrap_err().is_cannot_load());
        assert_eq!(results[1].as_ref().unwrap().name(), "Here");
        drop((results, library));
        assert_eq!(reader.outstanding_handles(), 0);
    }
}
