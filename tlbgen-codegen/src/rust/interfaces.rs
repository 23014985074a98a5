//! Interface declaration generation.
//!
//! Interfaces are rendered as `RIDL!` blocks. Functions inherited from parents
//! are excluded by comparing their vtable offset with the parents' cumulative
//! vtable size, and property accessors are synthesized for var-style members.

use super::sanitize;
use crate::dialect::Dialect;
use crate::error::CodegenError;
use crate::resolver::{ReferenceResolver, TypeRenderer};
use tlbgen_model::{FuncKind, Function, InvokeKind, ParamFlags, ScalarTag, TypeInfo};

/// Generator for `RIDL!` interface declarations.
pub struct InterfaceGenerator<'a> {
    info: &'a TypeInfo,
    dialect: Dialect,
}

impl<'a> InterfaceGenerator<'a> {
    /// Creates a new interface generator.
    #[must_use]
    pub fn new(info: &'a TypeInfo, dialect: Dialect) -> Self {
        Self { info, dialect }
    }

    /// Generates the interface declaration.
    ///
    /// # Errors
    /// Returns a contract violation for static functions and unsupported
    /// property shapes, and propagates model and rendering failures.
    pub fn generate(&self, references: &mut dyn ReferenceResolver) -> Result<String, CodegenError> {
        let name = self.info.name();
        let mut renderer = TypeRenderer::new(name, self.dialect, references);

        let mut parents = Vec::new();
        let mut parent_vtable_size: u32 = 0;
        for parent in self.info.parents() {
            let parent = parent?;
            parent_vtable_size += u32::from(parent.attributes().vtable_size);
            parents.push(format!("{0}({0}Vtbl)", parent.name()));
        }

        let mut members = Vec::new();
        for function in self.info.functions() {
            let function = function?;
            if u32::from(function.vtable_offset()) < parent_vtable_size {
                continue;
            }
            if function.func_kind() == FuncKind::Static {
                return Err(renderer.contract(format!(
                    "static function '{}' on an interface",
                    function.name()
                )));
            }
            members.push(self.function(&function, &mut renderer)?);
        }

        for property in self.info.vars() {
            let property = property?;
            let property_name = sanitize(property.name());
            let getter = format!(
                "value: *mut {}",
                renderer.render(property.descriptor(), ParamFlags::OUT)?
            );
            let setter = format!(
                "value: {}",
                renderer.render(property.descriptor(), ParamFlags::IN)?
            );
            let result = renderer.result_code();
            members.push(self.signature(&format!("get_{}", property_name), vec![getter], &result));
            members.push(self.signature(&format!("put_{}", property_name), vec![setter], &result));
        }

        let mut output = self.dialect.interface_open(&self.info.attributes().guid);
        output.push_str(&format!("interface {0}({0}Vtbl)", sanitize(name)));
        if !parents.is_empty() {
            output.push_str(&format!(": {}", parents.join(", ")));
        }
        output.push_str(" {\n");
        if !members.is_empty() {
            output.push_str(&members.join(",\n"));
            output.push('\n');
        }
        output.push_str(self.dialect.interface_close());
        output.push('\n');

        tracing::trace!(interface = name, members = members.len(), "generated interface");
        Ok(output)
    }

    /// Renders one declared function.
    fn function(
        &self,
        function: &Function,
        renderer: &mut TypeRenderer<'_>,
    ) -> Result<String, CodegenError> {
        let invoke_kind = function.invoke_kind();
        let fn_name = format!("{}{}", invoke_kind.prefix(), sanitize(function.name()));
        let return_type = function.return_type();

        let mut params = Vec::with_capacity(function.params().len() + 1);
        for param in function.params() {
            params.push(format!(
                "{}: {}",
                sanitize(&param.name),
                renderer.render(&param.descriptor, param.flags)?
            ));
        }

        let result = match invoke_kind {
            InvokeKind::Func => {
                if return_type.is_scalar(ScalarTag::Void) {
                    renderer.result_code()
                } else {
                    renderer.render(return_type, ParamFlags::OUT)?
                }
            }
            InvokeKind::PropertyGet => {
                let explicit_retval = function
                    .params()
                    .iter()
                    .any(|param| param.flags.contains(ParamFlags::RETVAL));
                if explicit_retval {
                    if !return_type.is_scalar(ScalarTag::Hresult) {
                        return Err(renderer.contract(format!(
                            "getter '{}' has a retval parameter but does not return HRESULT",
                            function.name()
                        )));
                    }
                    renderer.render(return_type, ParamFlags::OUT)?
                } else {
                    params.push(format!(
                        "value: *mut {}",
                        renderer.render(return_type, ParamFlags::OUT)?
                    ));
                    renderer.result_code()
                }
            }
            InvokeKind::PropertyPut | InvokeKind::PropertyPutRef => {
                if return_type.is_scalar(ScalarTag::Void) {
                    renderer.result_code()
                } else if return_type.is_scalar(ScalarTag::Hresult) {
                    renderer.render(return_type, ParamFlags::OUT)?
                } else {
                    return Err(renderer.contract(format!(
                        "setter '{}' must return HRESULT or void",
                        function.name()
                    )));
                }
            }
        };

        Ok(self.signature(&fn_name, params, &result))
    }

    /// Formats one member line, inserting the dialect's receiver.
    fn signature(&self, name: &str, params: Vec<String>, result: &str) -> String {
        let params: Vec<String> = self
            .dialect
            .self_param()
            .map(str::to_string)
            .into_iter()
            .chain(params)
            .collect();
        format!("    fn {}({}) -> {}", name, params.join(", "), result)
    }
}
