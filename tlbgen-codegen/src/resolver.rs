//! Type descriptor rendering.
//!
//! Descriptors are rendered recursively into type strings. Named references
//! are delegated to a [`ReferenceResolver`] so that rendering itself stays a
//! pure function of the descriptor, the direction flags and the dialect.

use crate::dialect::Dialect;
use crate::error::CodegenError;
use tlbgen_model::{ParamFlags, RefHandle, ScalarTag, TypeDescriptor, TypeInfo};

/// Name rendered in place of a referenced type that cannot be loaded.
pub const MISSING_TYPE: &str = "__missing_type__";

/// Capability to turn a named reference into the referenced type's name.
pub trait ReferenceResolver {
    /// Returns the bare name of the referenced entry.
    ///
    /// # Errors
    /// Returns an error if the reference cannot be resolved.
    fn reference_name(&mut self, reference: RefHandle) -> Result<String, CodegenError>;
}

/// What to do when a referenced type lives in a library that cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTypes {
    /// Propagate the failure.
    #[default]
    Fail,
    /// Render [`MISSING_TYPE`] and keep going.
    Placeholder,
}

/// Resolves references made from one entry through the model.
#[derive(Debug)]
pub struct EntryReferences<'a> {
    info: &'a TypeInfo,
    policy: MissingTypes,
    missing: usize,
}

impl<'a> EntryReferences<'a> {
    /// Creates a resolver for references made from `info`.
    #[must_use]
    pub fn new(info: &'a TypeInfo, policy: MissingTypes) -> Self {
        Self {
            info,
            policy,
            missing: 0,
        }
    }

    /// Returns how many references were replaced with [`MISSING_TYPE`].
    #[must_use]
    pub fn missing(&self) -> usize {
        self.missing
    }
}

impl ReferenceResolver for EntryReferences<'_> {
    fn reference_name(&mut self, reference: RefHandle) -> Result<String, CodegenError> {
        match self.info.resolve_reference(reference) {
            Ok(target) => Ok(target.name().to_string()),
            Err(err) if err.is_cannot_load() && self.policy == MissingTypes::Placeholder => {
                tracing::warn!(
                    entry = self.info.name(),
                    %reference,
                    "referenced type could not be loaded; using {}",
                    MISSING_TYPE
                );
                self.missing += 1;
                Ok(MISSING_TYPE.to_string())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Returns the rendered name of a scalar tag, or `None` for unmapped tags.
///
/// Fixed-width numerics map to Rust primitives; every other tag is a
/// well-known platform name and receives the dialect's namespace prefix.
#[must_use]
pub fn scalar_name(vt: u16, dialect: Dialect) -> Option<String> {
    let tag = ScalarTag::from_raw(vt)?;
    let name = match tag {
        ScalarTag::I1 => "i8",
        ScalarTag::I2 => "i16",
        ScalarTag::I4 => "i32",
        ScalarTag::I8 => "i64",
        ScalarTag::Ui1 => "u8",
        ScalarTag::Ui2 => "u16",
        ScalarTag::Ui4 => "u32",
        ScalarTag::Ui8 => "u64",
        ScalarTag::R4 => "f32",
        ScalarTag::R8 => "f64",
        ScalarTag::Cy => "CY",
        ScalarTag::Date => "DATE",
        ScalarTag::Bstr => "BSTR",
        ScalarTag::Dispatch => "LPDISPATCH",
        ScalarTag::Error => "SCODE",
        ScalarTag::Bool => "VARIANT_BOOL",
        ScalarTag::Variant => "VARIANT",
        ScalarTag::Unknown => "LPUNKNOWN",
        ScalarTag::Decimal => "DECIMAL",
        ScalarTag::Int => "INT",
        ScalarTag::Uint => "UINT",
        ScalarTag::Void => "c_void",
        ScalarTag::Hresult => "HRESULT",
        ScalarTag::SafeArray => "SAFEARRAY",
        ScalarTag::Lpstr => "LPSTR",
        ScalarTag::Lpwstr => "LPCWSTR",
    };
    if tag.is_numeric() {
        Some(name.to_string())
    } else {
        Some(format!("{}{}", dialect.namespace_prefix(), name))
    }
}

/// Renders descriptors on behalf of one entry.
pub struct TypeRenderer<'r> {
    entry: &'r str,
    dialect: Dialect,
    references: &'r mut dyn ReferenceResolver,
}

impl<'r> TypeRenderer<'r> {
    /// Creates a renderer for the entry named `entry`.
    pub fn new(
        entry: &'r str,
        dialect: Dialect,
        references: &'r mut dyn ReferenceResolver,
    ) -> Self {
        Self {
            entry,
            dialect,
            references,
        }
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the rendered result-code type.
    #[must_use]
    pub fn result_code(&self) -> String {
        format!("{}HRESULT", self.dialect.namespace_prefix())
    }

    /// Creates a contract violation attributed to the current entry.
    pub fn contract(&self, message: impl Into<String>) -> CodegenError {
        CodegenError::contract(self.entry, message)
    }

    /// Renders `desc` as seen with the given direction flags.
    ///
    /// # Errors
    /// Returns a contract violation for multi-dimensional arrays and unmapped
    /// scalar tags, and propagates reference resolution failures.
    pub fn render(
        &mut self,
        desc: &TypeDescriptor,
        flags: ParamFlags,
    ) -> Result<String, CodegenError> {
        match desc {
            TypeDescriptor::Pointer(inner) => {
                let qualifier = if flags.is_input_only() {
                    "*const"
                } else {
                    "*mut"
                };
                Ok(format!("{} {}", qualifier, self.render(inner, flags)?))
            }
            TypeDescriptor::FixedArray { element, bounds } => {
                let [length] = bounds.as_slice() else {
                    return Err(self.contract(format!(
                        "fixed array with {} dimensions",
                        bounds.len()
                    )));
                };
                let length = *length;
                Ok(format!("[{}; {}]", self.render(element, flags)?, length))
            }
            TypeDescriptor::UserDefined(reference) => self.references.reference_name(*reference),
            TypeDescriptor::Scalar(vt) => scalar_name(*vt, self.dialect)
                .ok_or_else(|| self.contract(format!("unsupported scalar tag {}", vt))),
        }
    }
}
