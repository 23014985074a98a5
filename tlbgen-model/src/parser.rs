//! Type-library manifest parser.
//!
//! A manifest is an XML document describing the entries of one library. It is
//! parsed into a [`LibraryDef`] that backs a [`crate::MemoryReader`].

use crate::error::{ModelError, ParseError};
use crate::memory::{FuncDef, LibraryDef, ParamDef, TypeDef};
use crate::types::{
    FuncKind, Guid, InvokeKind, ParamFlags, ScalarTag, TypeDescriptor, TypeKind, VarDesc,
    VarValue,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;
use std::str::FromStr;

/// Reads and parses the manifest at `path`.
///
/// # Errors
/// Returns [`ModelError::CannotLoadLibrary`] if the file cannot be read and
/// [`ModelError::Parse`] if its contents are not a valid manifest.
pub fn load_manifest(path: &Path) -> Result<LibraryDef, ModelError> {
    let xml = std::fs::read_to_string(path).map_err(|err| ModelError::CannotLoadLibrary {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let library = parse_manifest(&xml)?;
    tracing::debug!(
        path = %path.display(),
        library = %library.name,
        entries = library.types.len(),
        "loaded manifest"
    );
    Ok(library)
}

/// Parses a manifest from a string.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed or describes an invalid
/// library.
pub fn parse_manifest(xml: &str) -> Result<LibraryDef, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut library: Option<LibraryDef> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                if name != "typelib" {
                    return Err(ParseError::unknown_element(name, "document"));
                }
                let mut lib = parse_typelib(e)?;
                parse_entries(&mut reader, &mut lib)?;
                library = Some(lib);
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                if name != "typelib" {
                    return Err(ParseError::unknown_element(name, "document"));
                }
                library = Some(parse_typelib(e)?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    library.ok_or_else(|| ParseError::structure("no typelib element found"))
}

/// Parses the typelib element attributes.
fn parse_typelib(e: &BytesStart<'_>) -> Result<LibraryDef, ParseError> {
    let mut name = None;
    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = std::str::from_utf8(&attr.value)?;
        if key == "name" {
            name = Some(value.to_string());
        }
    }
    let name = name.ok_or_else(|| ParseError::missing_attr("typelib", "name"))?;
    Ok(LibraryDef::new(name))
}

/// Parses every entry up to the closing typelib tag.
fn parse_entries(reader: &mut Reader<&[u8]>, lib: &mut LibraryDef) -> Result<(), ParseError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let ty = parse_entry(reader, e, true, lib)?;
                lib.push(ty);
            }
            Ok(Event::Empty(ref e)) => {
                let ty = parse_entry(reader, e, false, lib)?;
                lib.push(ty);
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(ParseError::structure("unterminated typelib element"));
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Parses one entry element and, if it has a body, its members.
fn parse_entry(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    has_body: bool,
    lib: &mut LibraryDef,
) -> Result<TypeDef, ParseError> {
    let name_bytes = e.name().as_ref().to_vec();
    let tag = std::str::from_utf8(&name_bytes)?;
    let kind = TypeKind::parse(tag).ok_or_else(|| ParseError::unknown_element(tag, "typelib"))?;

    let mut ty = TypeDef::new("", kind);
    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = std::str::from_utf8(&attr.value)?;

        match key {
            "name" => ty.name = value.to_string(),
            "guid" => {
                ty.guid = Guid::parse(value)
                    .ok_or_else(|| ParseError::invalid_attr(tag, "guid", value))?;
            }
            "size" => ty.size = parse_number(tag, key, value)?,
            "alignment" => ty.alignment = parse_number(tag, key, value)?,
            "vtable-size" => ty.vtable_size = parse_number(tag, key, value)?,
            "type" if kind == TypeKind::Alias => ty.alias_target = Some(parse_type(value, lib)?),
            "dual" => ty.dual = Some(value.to_string()),
            "external" => ty.external = parse_bool(tag, key, value)?,
            "unloadable" => ty.unloadable = parse_bool(tag, key, value)?,
            _ => {}
        }
    }

    if ty.name.is_empty() {
        return Err(ParseError::missing_attr(tag, "name"));
    }
    if kind == TypeKind::Alias && ty.alias_target.is_none() {
        return Err(ParseError::missing_attr(tag, "type"));
    }

    if has_body {
        parse_members(reader, &mut ty, lib)?;
    }

    Ok(ty)
}

/// Parses the members of an entry up to its closing tag.
fn parse_members(
    reader: &mut Reader<&[u8]>,
    ty: &mut TypeDef,
    lib: &mut LibraryDef,
) -> Result<(), ParseError> {
    let mut buf = Vec::new();

    loop {
        let (e, has_body) = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => (e.into_owned(), true),
            Ok(Event::Empty(e)) => (e.into_owned(), false),
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(ParseError::structure(format!(
                    "unterminated element '{}'",
                    ty.name
                )));
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => continue,
        };

        let name_bytes = e.name().as_ref().to_vec();
        let tag = std::str::from_utf8(&name_bytes)?;
        let interface_like = ty.kind.is_interface();

        match tag {
            "const" if ty.kind == TypeKind::Enum => ty.vars.push(parse_const(&e)?),
            "field" if matches!(ty.kind, TypeKind::Record | TypeKind::Union) => {
                ty.vars.push(parse_typed_var(&e, tag, lib)?);
            }
            "property" if interface_like => ty.vars.push(parse_typed_var(&e, tag, lib)?),
            "parent" if interface_like || ty.kind == TypeKind::CoClass => {
                ty.parents.push(required_attr(&e, tag, "name")?);
            }
            "method" if interface_like || ty.kind == TypeKind::Module => {
                let func = parse_method(reader, &e, has_body, lib)?;
                ty.funcs.push(func);
                buf.clear();
                continue;
            }
            _ => return Err(ParseError::unknown_element(tag, ty.kind.as_str())),
        }

        if has_body {
            skip_to_end(reader)?;
        }
        buf.clear();
    }

    Ok(())
}

/// Parses an enum constant.
fn parse_const(e: &BytesStart<'_>) -> Result<VarDesc, ParseError> {
    let mut name = None;
    let mut raw_value = None;
    let mut vt = ScalarTag::I4.raw();

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = std::str::from_utf8(&attr.value)?;

        match key {
            "name" => name = Some(value.to_string()),
            "value" => raw_value = Some(value.to_string()),
            "vt" => vt = parse_number("const", key, value)?,
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("const", "name"))?;
    let value = match raw_value {
        Some(raw) if vt == ScalarTag::I4.raw() => {
            Some(VarValue::I4(parse_number("const", "value", &raw)?))
        }
        Some(_) => Some(VarValue::Other(vt)),
        None => None,
    };

    Ok(VarDesc {
        name,
        descriptor: TypeDescriptor::Scalar(vt),
        value,
    })
}

/// Parses a field or property with a `type` attribute.
fn parse_typed_var(
    e: &BytesStart<'_>,
    tag: &str,
    lib: &mut LibraryDef,
) -> Result<VarDesc, ParseError> {
    let name = required_attr(e, tag, "name")?;
    let expr = required_attr(e, tag, "type")?;
    Ok(VarDesc::field(name, parse_type(&expr, lib)?))
}

/// Parses a method with its parameters and return type.
fn parse_method(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    has_body: bool,
    lib: &mut LibraryDef,
) -> Result<FuncDef, ParseError> {
    let mut func = FuncDef::new("", InvokeKind::Func, 0);

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = std::str::from_utf8(&attr.value)?;

        match key {
            "name" => func.name = value.to_string(),
            "offset" => func.vtable_offset = parse_number("method", key, value)?,
            "invoke" => {
                func.invoke_kind = InvokeKind::parse(value)
                    .ok_or_else(|| ParseError::invalid_attr("method", key, value))?;
            }
            "kind" => {
                func.func_kind = FuncKind::parse(value)
                    .ok_or_else(|| ParseError::invalid_attr("method", key, value))?;
            }
            "unnamed-last" => func.unnamed_last = parse_bool("method", key, value)?,
            _ => {}
        }
    }

    if func.name.is_empty() {
        return Err(ParseError::missing_attr("method", "name"));
    }
    if !has_body {
        return Ok(func);
    }

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag = std::str::from_utf8(&name_bytes)?;
                match tag {
                    "param" => {
                        let name = required_attr(e, tag, "name")?;
                        let expr = required_attr(e, tag, "type")?;
                        let flags = match optional_attr(e, "flags")? {
                            Some(raw) => ParamFlags::parse_list(&raw)
                                .ok_or_else(|| ParseError::invalid_attr(tag, "flags", raw))?,
                            None => ParamFlags::empty(),
                        };
                        func.params
                            .push(ParamDef::new(name, parse_type(&expr, lib)?, flags));
                    }
                    "returns" => {
                        let expr = required_attr(e, tag, "type")?;
                        func.return_type = parse_type(&expr, lib)?;
                    }
                    _ => return Err(ParseError::unknown_element(tag, "method")),
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"method" => break,
            Ok(Event::Eof) => {
                return Err(ParseError::structure(format!(
                    "unterminated method '{}'",
                    func.name
                )));
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(func)
}

/// Parses a type expression.
///
/// Accepted forms are scalar names (`i4`, `bstr`, ...), `vt(N)` for a raw
/// tag, `ptr(T)`, `carray(T; n[, m...])` and `@Name` for a named reference.
///
/// # Errors
/// Returns [`ParseError::InvalidType`] for malformed expressions.
pub fn parse_type(expr: &str, lib: &mut LibraryDef) -> Result<TypeDescriptor, ParseError> {
    let s = expr.trim();
    let invalid = || ParseError::InvalidType {
        expr: expr.to_string(),
    };

    if let Some(name) = s.strip_prefix('@') {
        if !is_identifier(name) {
            return Err(invalid());
        }
        return Ok(TypeDescriptor::UserDefined(lib.reference(name)));
    }
    if let Some(inner) = call_args(s, "ptr") {
        return Ok(TypeDescriptor::pointer(parse_type(inner, lib)?));
    }
    if let Some(args) = call_args(s, "carray") {
        let (element, bounds) = args.rsplit_once(';').ok_or_else(invalid)?;
        let bounds = bounds
            .split(',')
            .map(|bound| bound.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        return Ok(TypeDescriptor::FixedArray {
            element: Box::new(parse_type(element, lib)?),
            bounds,
        });
    }
    if let Some(raw) = call_args(s, "vt") {
        return raw
            .trim()
            .parse::<u16>()
            .map(TypeDescriptor::Scalar)
            .map_err(|_| invalid());
    }

    ScalarTag::from_manifest_name(s)
        .map(TypeDescriptor::scalar)
        .ok_or_else(invalid)
}

/// Returns the text between `head(` and the final `)`.
fn call_args<'a>(s: &'a str, head: &str) -> Option<&'a str> {
    s.strip_prefix(head)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn optional_attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, ParseError> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(std::str::from_utf8(&attr.value)?.to_string()));
        }
    }
    Ok(None)
}

fn required_attr(e: &BytesStart<'_>, element: &str, name: &str) -> Result<String, ParseError> {
    optional_attr(e, name)?.ok_or_else(|| ParseError::missing_attr(element, name))
}

fn parse_number<T: FromStr>(element: &str, attribute: &str, value: &str) -> Result<T, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| ParseError::invalid_attr(element, attribute, value))
}

fn parse_bool(element: &str, attribute: &str, value: &str) -> Result<bool, ParseError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ParseError::invalid_attr(element, attribute, value)),
    }
}

/// Skips to the end of the current element.
fn skip_to_end(reader: &mut Reader<&[u8]>) -> Result<(), ParseError> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}
