//! Type-library metadata definitions.
//!
//! This module contains the value types describing type-library entries:
//! entry kinds and attributes, the recursive type descriptor, parameter
//! direction flags and the raw member descriptors reported by a reader.

use bitflags::bitflags;
use num_derive::FromPrimitive;
use std::fmt;

/// Kind of a type-library entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Set of named integer constants.
    Enum,
    /// Plain structure.
    Record,
    /// Collection of static functions.
    Module,
    /// Vtable interface.
    Interface,
    /// Dispatch interface.
    Dispatch,
    /// Component class.
    CoClass,
    /// Type alias.
    Alias,
    /// Overlapping-storage union.
    Union,
}

impl TypeKind {
    /// Returns true for vtable-bearing kinds.
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        matches!(self, Self::Interface | Self::Dispatch)
    }

    /// Returns the lowercase name used in manifests and diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enum => "enum",
            Self::Record => "record",
            Self::Module => "module",
            Self::Interface => "interface",
            Self::Dispatch => "dispinterface",
            Self::CoClass => "coclass",
            Self::Alias => "alias",
            Self::Union => "union",
        }
    }

    /// Parses a kind from its manifest element name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "enum" => Some(Self::Enum),
            "record" => Some(Self::Record),
            "module" => Some(Self::Module),
            "interface" => Some(Self::Interface),
            "dispinterface" => Some(Self::Dispatch),
            "coclass" => Some(Self::CoClass),
            "alias" => Some(Self::Alias),
            "union" => Some(Self::Union),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 16-byte entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid {
    /// First 32-bit group.
    pub data1: u32,
    /// Second 16-bit group.
    pub data2: u16,
    /// Third 16-bit group.
    pub data3: u16,
    /// Trailing eight bytes.
    pub data4: [u8; 8],
}

impl Guid {
    /// The all-zero identifier.
    pub const NIL: Self = Self {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    /// Parses the registry form `{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}`.
    ///
    /// The surrounding braces are optional.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(s);

        let groups: Vec<&str> = s.split('-').collect();
        if groups.len() != 5 {
            return None;
        }
        let lengths = [8, 4, 4, 4, 12];
        if groups
            .iter()
            .zip(lengths)
            .any(|(group, len)| {
                group.len() != len || !group.chars().all(|c| c.is_ascii_hexdigit())
            })
        {
            return None;
        }

        let data1 = u32::from_str_radix(groups[0], 16).ok()?;
        let data2 = u16::from_str_radix(groups[1], 16).ok()?;
        let data3 = u16::from_str_radix(groups[2], 16).ok()?;

        let tail = format!("{}{}", groups[3], groups[4]);
        let mut data4 = [0u8; 8];
        for (i, byte) in data4.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&tail[i * 2..i * 2 + 2], 16).ok()?;
        }

        Some(Self {
            data1,
            data2,
            data3,
            data4,
        })
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{:08x}-{:04x}-{:04x}-{:02x}{:02x}-",
            self.data1, self.data2, self.data3, self.data4[0], self.data4[1]
        )?;
        for byte in &self.data4[2..] {
            write!(f, "{:02x}", byte)?;
        }
        f.write_str("}")
    }
}

/// Closed set of scalar variant tags.
///
/// Discriminants are the numeric tags reported by the metadata reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u16)]
pub enum ScalarTag {
    /// Signed 16-bit integer.
    I2 = 2,
    /// Signed 32-bit integer.
    I4 = 3,
    /// 32-bit float.
    R4 = 4,
    /// 64-bit float.
    R8 = 5,
    /// Currency.
    Cy = 6,
    /// Date.
    Date = 7,
    /// Length-prefixed string handle.
    Bstr = 8,
    /// Dynamic-dispatch interface pointer.
    Dispatch = 9,
    /// Error code.
    Error = 10,
    /// Boolean.
    Bool = 11,
    /// Variant.
    Variant = 12,
    /// Generic interface pointer.
    Unknown = 13,
    /// Decimal.
    Decimal = 14,
    /// Signed 8-bit integer.
    I1 = 16,
    /// Unsigned 8-bit integer.
    Ui1 = 17,
    /// Unsigned 16-bit integer.
    Ui2 = 18,
    /// Unsigned 32-bit integer.
    Ui4 = 19,
    /// Signed 64-bit integer.
    I8 = 20,
    /// Unsigned 64-bit integer.
    Ui8 = 21,
    /// Platform signed integer.
    Int = 22,
    /// Platform unsigned integer.
    Uint = 23,
    /// Void.
    Void = 24,
    /// Result code.
    Hresult = 25,
    /// Dynamic array.
    SafeArray = 27,
    /// Narrow string pointer.
    Lpstr = 30,
    /// Wide string pointer.
    Lpwstr = 31,
}

impl ScalarTag {
    /// Every supported tag, in numeric order.
    pub const ALL: [Self; 26] = [
        Self::I2,
        Self::I4,
        Self::R4,
        Self::R8,
        Self::Cy,
        Self::Date,
        Self::Bstr,
        Self::Dispatch,
        Self::Error,
        Self::Bool,
        Self::Variant,
        Self::Unknown,
        Self::Decimal,
        Self::I1,
        Self::Ui1,
        Self::Ui2,
        Self::Ui4,
        Self::I8,
        Self::Ui8,
        Self::Int,
        Self::Uint,
        Self::Void,
        Self::Hresult,
        Self::SafeArray,
        Self::Lpstr,
        Self::Lpwstr,
    ];

    /// Maps a raw numeric tag onto the closed set.
    #[must_use]
    pub fn from_raw(vt: u16) -> Option<Self> {
        num_traits::FromPrimitive::from_u16(vt)
    }

    /// Returns the raw numeric tag.
    #[must_use]
    pub const fn raw(&self) -> u16 {
        *self as u16
    }

    /// Returns true for fixed-width numeric tags.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::I1
                | Self::I2
                | Self::I4
                | Self::I8
                | Self::Ui1
                | Self::Ui2
                | Self::Ui4
                | Self::Ui8
                | Self::R4
                | Self::R8
        )
    }

    /// Returns the manifest spelling of this tag.
    #[must_use]
    pub const fn manifest_name(&self) -> &'static str {
        match self {
            Self::I2 => "i2",
            Self::I4 => "i4",
            Self::R4 => "r4",
            Self::R8 => "r8",
            Self::Cy => "cy",
            Self::Date => "date",
            Self::Bstr => "bstr",
            Self::Dispatch => "dispatch",
            Self::Error => "error",
            Self::Bool => "bool",
            Self::Variant => "variant",
            Self::Unknown => "unknown",
            Self::Decimal => "decimal",
            Self::I1 => "i1",
            Self::Ui1 => "ui1",
            Self::Ui2 => "ui2",
            Self::Ui4 => "ui4",
            Self::I8 => "i8",
            Self::Ui8 => "ui8",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Void => "void",
            Self::Hresult => "hresult",
            Self::SafeArray => "safearray",
            Self::Lpstr => "lpstr",
            Self::Lpwstr => "lpwstr",
        }
    }

    /// Parses a tag from its manifest spelling.
    #[must_use]
    pub fn from_manifest_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.manifest_name() == name)
    }
}

/// Opaque reference from one entry to another, resolvable through the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefHandle(pub u32);

impl fmt::Display for RefHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Recursive description of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// Scalar, carried as the raw numeric tag reported by the reader.
    Scalar(u16),
    /// Pointer to another type; constness depends on direction flags.
    Pointer(Box<TypeDescriptor>),
    /// Fixed-size array with one bound per dimension.
    FixedArray {
        /// Element type.
        element: Box<TypeDescriptor>,
        /// Element count per dimension.
        bounds: Vec<u32>,
    },
    /// Named reference to another entry.
    UserDefined(RefHandle),
}

impl TypeDescriptor {
    /// Creates a scalar descriptor from a known tag.
    #[must_use]
    pub const fn scalar(tag: ScalarTag) -> Self {
        Self::Scalar(tag as u16)
    }

    /// Creates a pointer descriptor.
    #[must_use]
    pub fn pointer(inner: TypeDescriptor) -> Self {
        Self::Pointer(Box::new(inner))
    }

    /// Creates a one-dimensional fixed array descriptor.
    #[must_use]
    pub fn array(element: TypeDescriptor, length: u32) -> Self {
        Self::FixedArray {
            element: Box::new(element),
            bounds: vec![length],
        }
    }

    /// Returns true if this is the scalar with the given tag.
    #[must_use]
    pub fn is_scalar(&self, tag: ScalarTag) -> bool {
        matches!(self, Self::Scalar(vt) if *vt == tag.raw())
    }
}

bitflags! {
    /// Parameter direction and attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParamFlags: u16 {
        /// Input parameter.
        const IN = 0x1;
        /// Output parameter.
        const OUT = 0x2;
        /// Locale identifier parameter.
        const LCID = 0x4;
        /// Logical return value.
        const RETVAL = 0x8;
        /// Optional parameter.
        const OPT = 0x10;
        /// Parameter has a default value.
        const HAS_DEFAULT = 0x20;
        /// Parameter carries custom data.
        const HAS_CUSTOM_DATA = 0x40;
    }
}

impl ParamFlags {
    /// Returns true when the parameter is `in` and not `out`.
    #[must_use]
    pub fn is_input_only(&self) -> bool {
        self.contains(Self::IN) && !self.contains(Self::OUT)
    }

    /// Parses a comma-separated flag list such as `in,out`.
    #[must_use]
    pub fn parse_list(s: &str) -> Option<Self> {
        let mut flags = Self::empty();
        for part in s.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            flags |= match part {
                "in" => Self::IN,
                "out" => Self::OUT,
                "lcid" => Self::LCID,
                "retval" => Self::RETVAL,
                "opt" | "optional" => Self::OPT,
                "default" => Self::HAS_DEFAULT,
                "custom" => Self::HAS_CUSTOM_DATA,
                _ => return None,
            };
        }
        Some(flags)
    }
}

/// How a function is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvokeKind {
    /// Plain method call.
    #[default]
    Func,
    /// Property getter.
    PropertyGet,
    /// Property setter by value.
    PropertyPut,
    /// Property setter by reference.
    PropertyPutRef,
}

impl InvokeKind {
    /// Returns the name prefix used for emitted accessors.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Func => "",
            Self::PropertyGet => "get_",
            Self::PropertyPut => "put_",
            Self::PropertyPutRef => "putref_",
        }
    }

    /// Returns true for property setters.
    #[must_use]
    pub const fn is_put(&self) -> bool {
        matches!(self, Self::PropertyPut | Self::PropertyPutRef)
    }

    /// Parses an invocation kind from its manifest spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "func" => Some(Self::Func),
            "get" | "propget" => Some(Self::PropertyGet),
            "put" | "propput" => Some(Self::PropertyPut),
            "putref" | "propputref" => Some(Self::PropertyPutRef),
            _ => None,
        }
    }
}

/// Binding kind of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FuncKind {
    /// Virtual with an implementation.
    Virtual,
    /// Pure virtual.
    #[default]
    PureVirtual,
    /// Non-virtual.
    NonVirtual,
    /// Static, only valid on modules.
    Static,
    /// Reachable through dynamic dispatch only.
    Dispatch,
}

impl FuncKind {
    /// Parses a function kind from its manifest spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "virtual" => Some(Self::Virtual),
            "pure-virtual" | "purevirtual" => Some(Self::PureVirtual),
            "nonvirtual" | "non-virtual" => Some(Self::NonVirtual),
            "static" => Some(Self::Static),
            "dispatch" => Some(Self::Dispatch),
            _ => None,
        }
    }
}

/// Literal value attached to a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarValue {
    /// 32-bit signed integer.
    I4(i32),
    /// Any other representation, identified by its raw variant tag.
    Other(u16),
}

/// Attributes of a type-library entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAttributes {
    /// Entry kind.
    pub kind: TypeKind,
    /// Entry identifier.
    pub guid: Guid,
    /// Instance size in bytes.
    pub instance_size: u32,
    /// Alignment in bytes.
    pub alignment: u16,
    /// Virtual table size.
    pub vtable_size: u16,
    /// Number of parents (implemented interfaces).
    pub parent_count: u16,
    /// Number of variables (constants, fields, properties).
    pub var_count: u16,
    /// Number of functions.
    pub func_count: u16,
    /// Target of an alias entry.
    pub alias_target: Option<TypeDescriptor>,
}

impl TypeAttributes {
    /// Creates attributes for an entry with no members.
    #[must_use]
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            guid: Guid::NIL,
            instance_size: 0,
            alignment: 4,
            vtable_size: 0,
            parent_count: 0,
            var_count: 0,
            func_count: 0,
            alias_target: None,
        }
    }
}

/// Variable member as reported by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDesc {
    /// Member name.
    pub name: String,
    /// Member type.
    pub descriptor: TypeDescriptor,
    /// Literal value, present for constants.
    pub value: Option<VarValue>,
}

impl VarDesc {
    /// Creates a typed variable without a literal value.
    #[must_use]
    pub fn field(name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            value: None,
        }
    }

    /// Creates a 32-bit integer constant.
    #[must_use]
    pub fn constant(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            descriptor: TypeDescriptor::scalar(ScalarTag::I4),
            value: Some(VarValue::I4(value)),
        }
    }
}

/// Parameter as reported by the reader; names are reported separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDesc {
    /// Parameter type.
    pub descriptor: TypeDescriptor,
    /// Direction flags.
    pub flags: ParamFlags,
}

/// Function member as reported by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDesc {
    /// Reported names: the function name followed by parameter names.
    pub names: Vec<String>,
    /// Invocation kind.
    pub invoke_kind: InvokeKind,
    /// Binding kind.
    pub func_kind: FuncKind,
    /// Offset of the function pointer within the vtable.
    pub vtable_offset: u16,
    /// Parameters in declared order.
    pub params: Vec<ParamDesc>,
    /// Declared return type.
    pub return_type: TypeDescriptor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_tag_from_raw() {
        assert_eq!(ScalarTag::from_raw(3), Some(ScalarTag::I4));
        assert_eq!(ScalarTag::from_raw(25), Some(ScalarTag::Hresult));
        assert_eq!(ScalarTag::from_raw(31), Some(ScalarTag::Lpwstr));
        // Structural tags are not scalars.
        assert_eq!(ScalarTag::from_raw(26), None);
        assert_eq!(ScalarTag::from_raw(29), None);
        assert_eq!(ScalarTag::from_raw(0), None);
    }

    #[test]
    fn test_scalar_tag_raw_round_trip() {
        for tag in ScalarTag::ALL {
            assert_eq!(ScalarTag::from_raw(tag.raw()), Some(tag));
            assert_eq!(ScalarTag::from_manifest_name(tag.manifest_name()), Some(tag));
        }
    }

    #[test]
    fn test_scalar_tag_is_numeric() {
        assert!(ScalarTag::I4.is_numeric());
        assert!(ScalarTag::R8.is_numeric());
        assert!(!ScalarTag::Bstr.is_numeric());
        assert!(!ScalarTag::Int.is_numeric());
        assert_eq!(ScalarTag::ALL.iter().filter(|t| t.is_numeric()).count(), 10);
    }

    #[test]
    fn test_guid_parse_and_display() {
        let guid = Guid::parse("{00000000-0000-0000-C000-000000000046}").unwrap();
        assert_eq!(guid.data1, 0);
        assert_eq!(guid.data4, [0xc0, 0, 0, 0, 0, 0, 0, 0x46]);
        assert_eq!(guid.to_string(), "{00000000-0000-0000-c000-000000000046}");

        assert_eq!(
            Guid::parse("2933bf80-7b36-11d2-b20e-00c04f983e60").map(|g| g.data1),
            Some(0x2933_bf80)
        );
        assert!(Guid::parse("not-a-guid").is_none());
        assert!(Guid::parse("{0000000-0000-0000-C000-000000000046}").is_none());
    }

    #[test]
    fn test_param_flags_input_only() {
        assert!(ParamFlags::IN.is_input_only());
        assert!(!(ParamFlags::IN | ParamFlags::OUT).is_input_only());
        assert!(!ParamFlags::OUT.is_input_only());
        assert!(!ParamFlags::empty().is_input_only());
    }

    #[test]
    fn test_param_flags_parse_list() {
        assert_eq!(ParamFlags::parse_list("in"), Some(ParamFlags::IN));
        assert_eq!(
            ParamFlags::parse_list("out, retval"),
            Some(ParamFlags::OUT | ParamFlags::RETVAL)
        );
        assert_eq!(ParamFlags::parse_list(""), Some(ParamFlags::empty()));
        assert_eq!(ParamFlags::parse_list("sideways"), None);
    }

    #[test]
    fn test_invoke_kind_prefix() {
        assert_eq!(InvokeKind::Func.prefix(), "");
        assert_eq!(InvokeKind::PropertyGet.prefix(), "get_");
        assert_eq!(InvokeKind::PropertyPut.prefix(), "put_");
        assert_eq!(InvokeKind::PropertyPutRef.prefix(), "putref_");
        assert!(InvokeKind::PropertyPutRef.is_put());
        assert!(!InvokeKind::PropertyGet.is_put());
    }

    #[test]
    fn test_type_kind_parse() {
        for kind in [
            TypeKind::Enum,
            TypeKind::Record,
            TypeKind::Module,
            TypeKind::Interface,
            TypeKind::Dispatch,
            TypeKind::CoClass,
            TypeKind::Alias,
            TypeKind::Union,
        ] {
            assert_eq!(TypeKind::parse(kind.as_str()), Some(kind));
        }
        assert!(TypeKind::Dispatch.is_interface());
        assert!(!TypeKind::Record.is_interface());
    }

    #[test]
    fn test_descriptor_helpers() {
        let ptr = TypeDescriptor::pointer(TypeDescriptor::scalar(ScalarTag::I4));
        assert!(matches!(ptr, TypeDescriptor::Pointer(_)));
        assert!(TypeDescriptor::scalar(ScalarTag::Void).is_scalar(ScalarTag::Void));
        assert!(!TypeDescriptor::scalar(ScalarTag::I4).is_scalar(ScalarTag::Void));

        let arr = TypeDescriptor::array(TypeDescriptor::scalar(ScalarTag::Ui1), 16);
        match arr {
            TypeDescriptor::FixedArray { bounds, .. } => assert_eq!(bounds, vec![16]),
            _ => panic!("expected array"),
        }
    }
}
