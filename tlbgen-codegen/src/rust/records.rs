//! Record declaration generation.

use super::sanitize;
use crate::dialect::Dialect;
use crate::error::CodegenError;
use crate::resolver::{ReferenceResolver, TypeRenderer};
use tlbgen_model::{ParamFlags, TypeInfo};

/// Generator for `STRUCT!` declarations.
pub struct RecordGenerator<'a> {
    info: &'a TypeInfo,
    dialect: Dialect,
}

impl<'a> RecordGenerator<'a> {
    /// Creates a new record generator.
    #[must_use]
    pub fn new(info: &'a TypeInfo, dialect: Dialect) -> Self {
        Self { info, dialect }
    }

    /// Generates the record declaration.
    ///
    /// # Errors
    /// Returns an error if a field type cannot be rendered.
    pub fn generate(&self, references: &mut dyn ReferenceResolver) -> Result<String, CodegenError> {
        let name = self.info.name();
        let mut renderer = TypeRenderer::new(name, self.dialect, references);
        let mut output = format!("STRUCT! {{ struct {} {{ ", sanitize(name));

        for field in self.info.vars() {
            let field = field?;
            let ty = renderer.render(field.descriptor(), ParamFlags::OUT)?;
            output.push_str(&format!("{}: {}, ", sanitize(field.name()), ty));
        }

        output.push_str("} }\n\n");
        Ok(output)
    }
}
