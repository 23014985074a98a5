//! Declaration generation driver.

use crate::dialect::Dialect;
use crate::error::CodegenError;
use crate::resolver::{EntryReferences, MissingTypes};
use crate::rust::{
    AliasGenerator, EnumGenerator, InterfaceGenerator, RecordGenerator, UnionGenerator,
};
use std::io::Write;
use tlbgen_model::{TypeInfo, TypeKind, TypeLibrary};

/// Outcome of generating a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Complete declaration text for the entry.
    Declaration(String),
    /// The entry kind is recognized but not modeled.
    Skip,
}

/// Counters collected over a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    /// Number of declarations written.
    pub emitted: usize,
    /// Entries skipped because their kind is not modeled.
    pub skipped: Vec<String>,
    /// Entries skipped because the reader could not load them.
    pub types_not_loaded: usize,
    /// Referenced types replaced with `__missing_type__`.
    pub missing_types: usize,
    /// Dual interfaces emitted from their interface half instead of the dispatch half.
    pub dual_interfaces: Vec<String>,
}

/// Generates FFI declarations for every entry of a type library.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    dialect: Dialect,
    missing_types: MissingTypes,
    dual_interfaces: bool,
}

impl Generator {
    /// Creates a generator with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output dialect.
    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the policy for referenced types that cannot be loaded.
    #[must_use]
    pub fn missing_types(mut self, policy: MissingTypes) -> Self {
        self.missing_types = policy;
        self
    }

    /// Emits dual dispatch interfaces from their interface half.
    #[must_use]
    pub fn dual_interfaces(mut self, enabled: bool) -> Self {
        self.dual_interfaces = enabled;
        self
    }

    /// Returns the configured dialect.
    #[must_use]
    pub fn output_dialect(&self) -> Dialect {
        self.dialect
    }

    /// Generates declarations for every entry of `library` and writes them to `out`.
    ///
    /// Each entry is rendered completely before anything is written, so a
    /// failing entry leaves no partial output behind.
    ///
    /// # Errors
    /// Stops at the first model failure, contract violation or write error.
    pub fn generate<W: Write>(
        &self,
        library: &TypeLibrary,
        mut out: W,
    ) -> Result<BuildResult, CodegenError> {
        let mut result = BuildResult::default();

        for info in library.list() {
            let info = match info {
                Ok(info) => info,
                Err(err)
                    if err.is_cannot_load() && self.missing_types == MissingTypes::Placeholder =>
                {
                    tracing::warn!(error = %err, "skipping entry that could not be loaded");
                    result.types_not_loaded += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            match self.emit(&info, &mut result)? {
                Emission::Declaration(text) => {
                    out.write_all(text.as_bytes())?;
                    result.emitted += 1;
                }
                Emission::Skip => result.skipped.push(info.name().to_string()),
            }
        }

        out.flush()?;
        tracing::debug!(
            emitted = result.emitted,
            skipped = result.skipped.len(),
            "generation finished"
        );
        Ok(result)
    }

    /// Renders a single entry.
    ///
    /// # Errors
    /// Returns an error if the entry cannot be rendered.
    pub fn emit(&self, info: &TypeInfo, result: &mut BuildResult) -> Result<Emission, CodegenError> {
        let interface_half;
        let info = match self.dual_half(info)? {
            Some(half) => {
                result.dual_interfaces.push(info.name().to_string());
                interface_half = half;
                &interface_half
            }
            None => info,
        };

        tracing::debug!(entry = info.name(), kind = %info.kind(), "generating");
        let mut refs = EntryReferences::new(info, self.missing_types);
        let text = match info.kind() {
            TypeKind::Enum => EnumGenerator::new(info).generate()?,
            TypeKind::Record => RecordGenerator::new(info, self.dialect).generate(&mut refs)?,
            TypeKind::Union => UnionGenerator::new(info, self.dialect).generate(&mut refs)?,
            TypeKind::Alias => AliasGenerator::new(info, self.dialect).generate(&mut refs)?,
            TypeKind::Interface | TypeKind::Dispatch => {
                InterfaceGenerator::new(info, self.dialect).generate(&mut refs)?
            }
            TypeKind::Module | TypeKind::CoClass => {
                tracing::debug!(entry = info.name(), kind = %info.kind(), "skipping unsupported kind");
                return Ok(Emission::Skip);
            }
        };
        result.missing_types += refs.missing();

        Ok(Emission::Declaration(text))
    }

    fn dual_half(&self, info: &TypeInfo) -> Result<Option<TypeInfo>, CodegenError> {
        if !self.dual_interfaces || info.kind() != TypeKind::Dispatch {
            return Ok(None);
        }
        Ok(info.dual_interface()?)
    }
}
