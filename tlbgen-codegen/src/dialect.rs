//! Output dialects.

use std::fmt;
use tlbgen_model::Guid;

/// Binding-macro dialect of the generated declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// winapi 0.2: `::`-prefixed well-known names, `&mut self` receivers,
    /// `RIDL!( ... );` blocks.
    Winapi02,
    /// winapi 0.3: bare names, no receiver, `RIDL!{#[uuid(...)] ... }}` blocks.
    #[default]
    Winapi03,
}

impl Dialect {
    /// Returns the version spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Winapi02 => "0.2",
            Self::Winapi03 => "0.3",
        }
    }

    /// Prefix applied to well-known type names.
    #[must_use]
    pub const fn namespace_prefix(&self) -> &'static str {
        match self {
            Self::Winapi02 => "::",
            Self::Winapi03 => "",
        }
    }

    /// Receiver parameter placed before declared parameters.
    #[must_use]
    pub const fn self_param(&self) -> Option<&'static str> {
        match self {
            Self::Winapi02 => Some("&mut self"),
            Self::Winapi03 => None,
        }
    }

    /// Opening line of an interface block, including the identity attribute.
    #[must_use]
    pub fn interface_open(&self, guid: &Guid) -> String {
        match self {
            Self::Winapi02 => "RIDL!(\n".to_string(),
            Self::Winapi03 => format!("RIDL!{{#[uuid({})]\n", uuid_attribute(guid)),
        }
    }

    /// Closing lines of an interface block.
    #[must_use]
    pub const fn interface_close(&self) -> &'static str {
        match self {
            Self::Winapi02 => "}\n);\n",
            Self::Winapi03 => "}}\n",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "winapi {}", self.as_str())
    }
}

/// Renders a GUID as the argument list of a `#[uuid(...)]` attribute.
#[must_use]
pub fn uuid_attribute(guid: &Guid) -> String {
    let mut out = format!(
        "0x{:08x}, 0x{:04x}, 0x{:04x}",
        guid.data1, guid.data2, guid.data3
    );
    for byte in guid.data4 {
        out.push_str(&format!(", 0x{:02x}", byte));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_spelling() {
        assert_eq!(Dialect::default(), Dialect::Winapi03);
        assert_eq!(Dialect::Winapi02.as_str(), "0.2");
        assert_eq!(Dialect::Winapi03.to_string(), "winapi 0.3");
    }

    #[test]
    fn test_uuid_attribute() {
        let guid = Guid::parse("{12345678-1234-1234-1234-56789abcdef0}").unwrap();
        assert_eq!(
            uuid_attribute(&guid),
            "0x12345678, 0x1234, 0x1234, 0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0"
        );
        assert_eq!(
            Dialect::Winapi03.interface_open(&Guid::NIL),
            "RIDL!{#[uuid(0x00000000, 0x0000, 0x0000, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00)]\n"
        );
        assert_eq!(Dialect::Winapi02.interface_open(&guid), "RIDL!(\n");
    }

    #[test]
    fn test_receiver_and_prefix() {
        assert_eq!(Dialect::Winapi02.self_param(), Some("&mut self"));
        assert_eq!(Dialect::Winapi03.self_param(), None);
        assert_eq!(Dialect::Winapi02.namespace_prefix(), "::");
        assert_eq!(Dialect::Winapi03.namespace_prefix(), "");
    }
}
