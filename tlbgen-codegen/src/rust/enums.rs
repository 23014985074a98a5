//! Enum declaration generation.

use super::sanitize;
use crate::error::CodegenError;
use tlbgen_model::{TypeInfo, VarValue};

/// Generator for `ENUM!` declarations.
pub struct EnumGenerator<'a> {
    info: &'a TypeInfo,
}

impl<'a> EnumGenerator<'a> {
    /// Creates a new enum generator.
    #[must_use]
    pub fn new(info: &'a TypeInfo) -> Self {
        Self { info }
    }

    /// Generates the enum declaration.
    ///
    /// # Errors
    /// Returns a contract violation for constants whose value is missing or
    /// not a 32-bit signed integer.
    pub fn generate(&self) -> Result<String, CodegenError> {
        let name = self.info.name();
        let mut output = format!("ENUM! {{ enum {} {{ ", sanitize(name));

        for constant in self.info.vars() {
            let constant = constant?;
            let value = match constant.value() {
                Some(VarValue::I4(value)) => value,
                Some(VarValue::Other(vt)) => {
                    return Err(CodegenError::contract(
                        name,
                        format!(
                            "constant '{}' has unsupported value tag {}",
                            constant.name(),
                            vt
                        ),
                    ));
                }
                None => {
                    return Err(CodegenError::contract(
                        name,
                        format!("constant '{}' has no value", constant.name()),
                    ));
                }
            };
            output.push_str(&format!("{} = {}, ", sanitize(constant.name()), value));
        }

        output.push_str("} }\n\n");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rust::tests::{first_entry, manifest};

    #[test]
    fn test_generate_enum() {
        let (_reader, library) = manifest(
            r#"<enum name="Color">
                <const name="RED" value="0"/>
                <const name="GREEN" value="1"/>
                <const name="BLUE" value="2"/>
            </enum>"#,
        );
        let info = first_entry(&library);
        assert_eq!(
            EnumGenerator::new(&info).generate().unwrap(),
            "ENUM! { enum Color { RED = 0, GREEN = 1, BLUE = 2, } }\n\n"
        );
    }

    #[test]
    fn test_negative_and_reserved() {
        let (_reader, library) = manifest(
            r#"<enum name="Kind">
                <const name="type" value="-1"/>
                <const name="MAX" value="2147483647"/>
            </enum>"#,
        );
        let info = first_entry(&library);
        assert_eq!(
            EnumGenerator::new(&info).generate().unwrap(),
            "ENUM! { enum Kind { type_ = -1, MAX = 2147483647, } }\n\n"
        );
    }

    #[test]
    fn test_non_int_value() {
        let (_reader, library) =
            manifest(r#"<enum name="Ratio"><const name="HALF" value="0.5" vt="5"/></enum>"#);
        let info = first_entry(&library);
        assert!(EnumGenerator::new(&info).generate().unwrap_err().is_contract());
    }

    #[test]
    fn test_missing_value() {
        let (_reader, library) = manifest(r#"<enum name="E"><const name="A"/></enum>"#);
        let info = first_entry(&library);
        assert!(EnumGenerator::new(&info).generate().unwrap_err().is_contract());
    }
}
