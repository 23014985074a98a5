//! # tlbgen Bench
//!
//! Synthetic libraries and timing helpers for tlbgen performance testing.

use std::rc::Rc;
use std::time::{Duration, Instant};
use tlbgen_codegen::{CodegenError, Generator};
use tlbgen_model::{MemoryReader, ModelError, TypeLibrary};

/// Builds a manifest with `interfaces` interfaces of `methods` methods each,
/// plus one record and one enum per interface.
#[must_use]
pub fn synthetic_manifest(interfaces: usize, methods: usize) -> String {
    let mut xml = String::from("<typelib name=\"Synthetic\">\n");
    xml.push_str(
        "<interface name=\"IUnknown\" external=\"true\" vtable-size=\"24\"/>\n",
    );

    for i in 0..interfaces {
        xml.push_str(&format!(
            "<enum name=\"Mode{i}\"><const name=\"OFF\" value=\"0\"/><const name=\"ON\" value=\"1\"/></enum>\n"
        ));
        xml.push_str(&format!(
            "<record name=\"Data{i}\" size=\"16\" alignment=\"8\">\
             <field name=\"id\" type=\"ui8\"/><field name=\"label\" type=\"bstr\"/></record>\n"
        ));
        xml.push_str(&format!(
            "<interface name=\"IThing{i}\" guid=\"{{{i:08x}-0000-0000-c000-000000000046}}\" vtable-size=\"{}\">\n\
             <parent name=\"IUnknown\"/>\n",
            24 + 8 * methods
        ));
        for m in 0..methods {
            xml.push_str(&format!(
                "<method name=\"Op{m}\" offset=\"{}\">\
                 <param name=\"input\" type=\"ptr(@Data{i})\" flags=\"in\"/>\
                 <param name=\"mode\" type=\"@Mode{i}\" flags=\"in\"/>\
                 <param name=\"result\" type=\"ptr(ptr(void))\" flags=\"out\"/>\
                 <returns type=\"hresult\"/></method>\n",
                24 + 8 * m
            ));
        }
        xml.push_str("<property name=\"Count\" type=\"i4\"/>\n</interface>\n");
    }

    xml.push_str("</typelib>\n");
    xml
}

/// Opens a library over an in-memory reader built from `xml`.
///
/// # Errors
/// Returns an error if the manifest is invalid.
pub fn open_library(xml: &str) -> Result<TypeLibrary, ModelError> {
    let reader = MemoryReader::from_manifest(xml)?;
    TypeLibrary::open(Rc::new(reader))
}

/// Times `iterations` full generation runs over `library`.
///
/// # Errors
/// Returns the first generation failure.
pub fn benchmark_generate(
    iterations: usize,
    library: &TypeLibrary,
    generator: &Generator,
) -> Result<Duration, CodegenError> {
    let mut out = Vec::with_capacity(64 * 1024);
    let start = Instant::now();

    for _ in 0..iterations {
        out.clear();
        generator.generate(library, &mut out)?;
    }

    Ok(start.elapsed())
}
