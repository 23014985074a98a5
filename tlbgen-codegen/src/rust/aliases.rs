//! Alias declaration generation.

use super::sanitize;
use crate::dialect::Dialect;
use crate::error::CodegenError;
use crate::resolver::{ReferenceResolver, TypeRenderer};
use tlbgen_model::{ParamFlags, TypeInfo};

/// Generator for `type` aliases.
pub struct AliasGenerator<'a> {
    info: &'a TypeInfo,
    dialect: Dialect,
}

impl<'a> AliasGenerator<'a> {
    /// Creates a new alias generator.
    #[must_use]
    pub fn new(info: &'a TypeInfo, dialect: Dialect) -> Self {
        Self { info, dialect }
    }

    /// Generates the alias declaration.
    ///
    /// # Errors
    /// Returns an error if the entry has no target or it cannot be rendered.
    pub fn generate(&self, references: &mut dyn ReferenceResolver) -> Result<String, CodegenError> {
        let name = self.info.name();
        let target = self
            .info
            .attributes()
            .alias_target
            .as_ref()
            .ok_or_else(|| CodegenError::contract(name, "alias has no target"))?;

        let mut renderer = TypeRenderer::new(name, self.dialect, references);
        let target = renderer.render(target, ParamFlags::OUT)?;
        Ok(format!("type {} = {};\n\n", sanitize(name), target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{EntryReferences, MissingTypes};
    use crate::rust::tests::{entry, manifest};

    #[test]
    fn test_generate_alias() {
        let (_reader, library) = manifest(
            r#"<alias name="HANDLE_T" type="ptr(void)"/>
            <record name="Point"/>
            <alias name="PPOINT" type="ptr(@Point)"/>"#,
        );

        let handle = entry(&library, "HANDLE_T");
        let mut refs = EntryReferences::new(&handle, MissingTypes::Fail);
        assert_eq!(
            AliasGenerator::new(&handle, Dialect::Winapi03)
                .generate(&mut refs)
                .unwrap(),
            "type HANDLE_T = *mut c_void;\n\n"
        );
        let mut refs = EntryReferences::new(&handle, MissingTypes::Fail);
        assert_eq!(
            AliasGenerator::new(&handle, Dialect::Winapi02)
                .generate(&mut refs)
                .unwrap(),
            "type HANDLE_T = *mut ::c_void;\n\n"
        );

        let point = entry(&library, "PPOINT");
        let mut refs = EntryReferences::new(&point, MissingTypes::Fail);
        assert_eq!(
            AliasGenerator::new(&point, Dialect::Winapi03)
                .generate(&mut refs)
                .unwrap(),
            "type PPOINT = *mut Point;\n\n"
        );
    }
}
