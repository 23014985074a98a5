//! Union declaration generation.

use super::sanitize;
use crate::dialect::Dialect;
use crate::error::CodegenError;
use crate::resolver::{ReferenceResolver, TypeRenderer};
use tlbgen_model::{ParamFlags, TypeInfo};

/// Generator for union storage wrappers and their `UNION2!` accessors.
pub struct UnionGenerator<'a> {
    info: &'a TypeInfo,
    dialect: Dialect,
}

impl<'a> UnionGenerator<'a> {
    /// Creates a new union generator.
    #[must_use]
    pub fn new(info: &'a TypeInfo, dialect: Dialect) -> Self {
        Self { info, dialect }
    }

    /// Returns the storage type wrapping the union's bytes.
    ///
    /// # Errors
    /// Returns a contract violation for alignments other than 4 or 8 and for
    /// zero-sized unions.
    pub fn storage(&self) -> Result<String, CodegenError> {
        let name = self.info.name();
        let attributes = self.info.attributes();
        let word = match attributes.alignment {
            4 => "u32",
            8 => "u64",
            other => {
                return Err(CodegenError::contract(
                    name,
                    format!("union alignment {} is not supported", other),
                ));
            }
        };

        let count = attributes
            .instance_size
            .div_ceil(u32::from(attributes.alignment));
        match count {
            0 => Err(CodegenError::contract(name, "union has no storage")),
            1 => Ok(word.to_string()),
            n => Ok(format!("[{}; {}]", word, n)),
        }
    }

    /// Generates the wrapper declaration followed by one accessor pair per field.
    ///
    /// # Errors
    /// Returns an error if the storage is invalid or a field type cannot be
    /// rendered.
    pub fn generate(&self, references: &mut dyn ReferenceResolver) -> Result<String, CodegenError> {
        let name = sanitize(self.info.name());
        let storage = self.storage()?;
        let mut renderer = TypeRenderer::new(self.info.name(), self.dialect, references);

        let mut output = format!("struct {}({});\n", name, storage);
        for field in self.info.vars() {
            let field = field?;
            let field_name = sanitize(field.name());
            let ty = renderer.render(field.descriptor(), ParamFlags::OUT)?;
            output.push_str(&format!(
                "UNION2!({}, {}, {}_mut, {});\n",
                name, field_name, field_name, ty
            ));
        }

        output.push('\n');
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{EntryReferences, MissingTypes};
    use crate::rust::tests::{first_entry, manifest};

    fn storage_of(size: u32, alignment: u16) -> Result<String, CodegenError> {
        let (_reader, library) = manifest(&format!(
            r#"<union name="U" size="{size}" alignment="{alignment}"/>"#
        ));
        let info = first_entry(&library);
        UnionGenerator::new(&info, Dialect::Winapi03).storage()
    }

    #[test]
    fn test_storage_words() {
        assert_eq!(storage_of(8, 4).unwrap(), "[u32; 2]");
        assert_eq!(storage_of(4, 4).unwrap(), "u32");
        assert_eq!(storage_of(5, 4).unwrap(), "[u32; 2]");
        assert_eq!(storage_of(8, 8).unwrap(), "u64");
        assert_eq!(storage_of(24, 8).unwrap(), "[u64; 3]");
    }

    #[test]
    fn test_storage_contract() {
        assert!(storage_of(8, 2).unwrap_err().is_contract());
        assert!(storage_of(8, 16).unwrap_err().is_contract());
        assert!(storage_of(0, 4).unwrap_err().is_contract());
    }

    #[test]
    fn test_generate_union() {
        let (_reader, library) = manifest(
            r#"<union name="Value" size="8" alignment="4">
                <field name="i" type="i4"/>
                <field name="d" type="r8"/>
                <field name="type" type="ui2"/>
            </union>"#,
        );
        let info = first_entry(&library);
        let mut refs = EntryReferences::new(&info, MissingTypes::Fail);
        assert_eq!(
            UnionGenerator::new(&info, Dialect::Winapi03)
                .generate(&mut refs)
                .unwrap(),
            "struct Value([u32; 2]);\n\
             UNION2!(Value, i, i_mut, i32);\n\
             UNION2!(Value, d, d_mut, f64);\n\
             UNION2!(Value, type_, type__mut, u16);\n\n"
        );
    }
}
