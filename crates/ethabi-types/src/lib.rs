//! ABI parameter type model.
//!
//! `ParamType` is the sum type the rest of this workspace builds on: the
//! encoder, decoder, and EIP-712 hasher all branch on its variants rather
//! than re-deriving type information from a signature string at call time.

use std::fmt;

use thiserror::Error;

/// Errors raised while constructing or parsing a [`ParamType`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TypeError {
    #[error("bit width {0} is not a multiple of 8 in range 8..=256")]
    InvalidBitWidth(u16),
    #[error("fixed bytes length {0} is out of range 1..=32")]
    InvalidFixedBytesLength(u8),
    #[error("tuple type requires components but none were supplied")]
    MissingTupleComponents,
    #[error("invalid type string {0:?}")]
    InvalidTypeString(String),
}

/// A Solidity ABI parameter type.
///
/// Construction of the numeric and fixed-bytes variants goes through the
/// associated functions (`uint`, `int`, `fixed_bytes`) rather than the enum
/// variants directly, so an invalid bit width or length is rejected at
/// build time instead of surfacing as an encoding failure later. The tree
/// owns its children; there is no sharing between nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Address,
    Bool,
    String,
    Bytes,
    FixedBytes(u8),
    Int(u16),
    Uint(u16),
    DynamicArray(Box<ParamType>),
    FixedArray(Box<ParamType>, usize),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    pub fn uint(bits: u16) -> Result<Self, TypeError> {
        validate_bits(bits)?;
        Ok(ParamType::Uint(bits))
    }

    pub fn int(bits: u16) -> Result<Self, TypeError> {
        validate_bits(bits)?;
        Ok(ParamType::Int(bits))
    }

    pub fn fixed_bytes(n: u8) -> Result<Self, TypeError> {
        if n == 0 || n > 32 {
            return Err(TypeError::InvalidFixedBytesLength(n));
        }
        Ok(ParamType::FixedBytes(n))
    }

    pub fn dynamic_array(element: ParamType) -> Self {
        ParamType::DynamicArray(Box::new(element))
    }

    pub fn fixed_array(element: ParamType, size: usize) -> Self {
        ParamType::FixedArray(Box::new(element), size)
    }

    /// `isDynamic(t)`: true for `string`/`bytes`/dynamic arrays, a tuple
    /// with any dynamic component, or a fixed array whose element is
    /// dynamic. Governs head/tail layout in the encoder and decoder.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::String | ParamType::Bytes | ParamType::DynamicArray(_) => true,
            ParamType::Tuple(components) => components.iter().any(ParamType::is_dynamic),
            ParamType::FixedArray(element, _) => element.is_dynamic(),
            _ => false,
        }
    }

    /// Parses a canonical Solidity type string such as `"uint256"`,
    /// `"(bool,string)[]"`, or `"address[3][]"`. Inverse of [`Display`].
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        parse_type(s.trim())
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => write!(f, "address"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::String => write!(f, "string"),
            ParamType::Bytes => write!(f, "bytes"),
            ParamType::FixedBytes(n) => write!(f, "bytes{n}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::DynamicArray(element) => write!(f, "{element}[]"),
            ParamType::FixedArray(element, size) => write!(f, "{element}[{size}]"),
            ParamType::Tuple(components) => {
                write!(f, "(")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{component}")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn validate_bits(bits: u16) -> Result<(), TypeError> {
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(TypeError::InvalidBitWidth(bits));
    }
    Ok(())
}

fn type_contains_tuple(ty: &ParamType) -> bool {
    match ty {
        ParamType::Tuple(_) => true,
        ParamType::DynamicArray(element) | ParamType::FixedArray(element, _) => {
            type_contains_tuple(element)
        }
        _ => false,
    }
}

fn parse_type(s: &str) -> Result<ParamType, TypeError> {
    if s.starts_with('(') {
        let close = find_matching_paren(s)?;
        let inner = &s[1..close];
        let components = split_top_level(inner)
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(parse_type)
            .collect::<Result<Vec<_>, _>>()?;
        apply_array_suffixes(ParamType::Tuple(components), &s[close + 1..])
    } else {
        let bracket = s.find('[');
        let (base, suffix) = match bracket {
            Some(pos) => (&s[..pos], &s[pos..]),
            None => (s, ""),
        };
        apply_array_suffixes(parse_elementary(base)?, suffix)
    }
}

fn parse_elementary(base: &str) -> Result<ParamType, TypeError> {
    match base {
        "address" => Ok(ParamType::Address),
        "bool" => Ok(ParamType::Bool),
        "string" => Ok(ParamType::String),
        "bytes" => Ok(ParamType::Bytes),
        "uint" => ParamType::uint(256),
        "int" => ParamType::int(256),
        _ if base.starts_with("uint") => base[4..]
            .parse::<u16>()
            .map_err(|_| TypeError::InvalidTypeString(base.to_string()))
            .and_then(ParamType::uint),
        _ if base.starts_with("int") => base[3..]
            .parse::<u16>()
            .map_err(|_| TypeError::InvalidTypeString(base.to_string()))
            .and_then(ParamType::int),
        _ if base.starts_with("bytes") => base[5..]
            .parse::<u8>()
            .map_err(|_| TypeError::InvalidTypeString(base.to_string()))
            .and_then(ParamType::fixed_bytes),
        _ => Err(TypeError::InvalidTypeString(base.to_string())),
    }
}

fn apply_array_suffixes(mut ty: ParamType, mut suffix: &str) -> Result<ParamType, TypeError> {
    while !suffix.is_empty() {
        if !suffix.starts_with('[') {
            return Err(TypeError::InvalidTypeString(suffix.to_string()));
        }
        let close = suffix
            .find(']')
            .ok_or_else(|| TypeError::InvalidTypeString(suffix.to_string()))?;
        let size_str = &suffix[1..close];
        ty = if size_str.is_empty() {
            ParamType::dynamic_array(ty)
        } else {
            let size = size_str
                .parse::<usize>()
                .map_err(|_| TypeError::InvalidTypeString(suffix.to_string()))?;
            ParamType::fixed_array(ty, size)
        };
        suffix = &suffix[close + 1..];
    }
    Ok(ty)
}

fn find_matching_paren(s: &str) -> Result<usize, TypeError> {
    let mut depth = 0i32;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(TypeError::InvalidTypeString(s.to_string()))
}

fn split_top_level(s: &str) -> Vec<&str> {
    if s.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// A single entry in a function, error, event, or constructor signature.
///
/// `components` is required whenever `kind` is a tuple or contains one
/// (directly or through array nesting); construction fails otherwise,
/// matching the Solidity ABI JSON convention that tuple field names live
/// alongside the type rather than inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiParameter {
    pub kind: ParamType,
    pub name: String,
    pub internal_type: Option<String>,
    pub components: Option<Vec<AbiParameter>>,
}

impl AbiParameter {
    pub fn new(kind: ParamType, name: impl Into<String>) -> Result<Self, TypeError> {
        if type_contains_tuple(&kind) {
            return Err(TypeError::MissingTupleComponents);
        }
        Ok(AbiParameter {
            kind,
            name: name.into(),
            internal_type: None,
            components: None,
        })
    }

    /// Builds a tuple-typed parameter, deriving `kind` from the field
    /// types of `components` so the two never drift out of sync.
    pub fn tuple(name: impl Into<String>, components: Vec<AbiParameter>) -> Self {
        let kind = ParamType::Tuple(components.iter().map(|c| c.kind.clone()).collect());
        AbiParameter {
            kind,
            name: name.into(),
            internal_type: None,
            components: Some(components),
        }
    }

    pub fn array(name: impl Into<String>, element: AbiParameter) -> Self {
        let components = element.components.clone();
        AbiParameter {
            kind: ParamType::dynamic_array(element.kind),
            name: name.into(),
            internal_type: None,
            components,
        }
    }

    pub fn fixed_array(name: impl Into<String>, element: AbiParameter, size: usize) -> Self {
        let components = element.components.clone();
        AbiParameter {
            kind: ParamType::fixed_array(element.kind, size),
            name: name.into(),
            internal_type: None,
            components,
        }
    }

    pub fn with_internal_type(mut self, internal_type: impl Into<String>) -> Self {
        self.internal_type = Some(internal_type.into());
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind.is_dynamic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_bit_widths() {
        assert_eq!(ParamType::uint(0), Err(TypeError::InvalidBitWidth(0)));
        assert_eq!(ParamType::uint(260), Err(TypeError::InvalidBitWidth(260)));
        assert_eq!(ParamType::int(12), Err(TypeError::InvalidBitWidth(12)));
        assert!(ParamType::uint(256).is_ok());
        assert!(ParamType::int(8).is_ok());
    }

    #[test]
    fn rejects_invalid_fixed_bytes_length() {
        assert_eq!(
            ParamType::fixed_bytes(0),
            Err(TypeError::InvalidFixedBytesLength(0))
        );
        assert_eq!(
            ParamType::fixed_bytes(33),
            Err(TypeError::InvalidFixedBytesLength(33))
        );
        assert!(ParamType::fixed_bytes(32).is_ok());
    }

    #[test]
    fn canonical_type_strings() {
        assert_eq!(ParamType::uint(256).unwrap().to_string(), "uint256");
        assert_eq!(ParamType::fixed_bytes(3).unwrap().to_string(), "bytes3");
        let tuple = ParamType::Tuple(vec![ParamType::Bool, ParamType::String]);
        assert_eq!(tuple.to_string(), "(bool,string)");
        let arr = ParamType::dynamic_array(tuple.clone());
        assert_eq!(arr.to_string(), "(bool,string)[]");
        let fixed = ParamType::fixed_array(ParamType::Address, 3);
        assert_eq!(fixed.to_string(), "address[3]");
    }

    #[test]
    fn is_dynamic_predicate() {
        assert!(!ParamType::Bool.is_dynamic());
        assert!(!ParamType::uint(256).unwrap().is_dynamic());
        assert!(ParamType::String.is_dynamic());
        assert!(ParamType::Bytes.is_dynamic());
        assert!(ParamType::dynamic_array(ParamType::Bool).is_dynamic());
        assert!(!ParamType::fixed_array(ParamType::Bool, 4).is_dynamic());
        assert!(ParamType::fixed_array(ParamType::String, 4).is_dynamic());
        assert!(ParamType::Tuple(vec![ParamType::Bool, ParamType::Bytes]).is_dynamic());
        assert!(!ParamType::Tuple(vec![ParamType::Bool, ParamType::uint(8).unwrap()]).is_dynamic());
    }

    #[test]
    fn parses_elementary_types() {
        assert_eq!(ParamType::parse("address").unwrap(), ParamType::Address);
        assert_eq!(
            ParamType::parse("uint256").unwrap(),
            ParamType::uint(256).unwrap()
        );
        assert_eq!(
            ParamType::parse("bytes32").unwrap(),
            ParamType::fixed_bytes(32).unwrap()
        );
        assert_eq!(ParamType::parse("bytes").unwrap(), ParamType::Bytes);
    }

    #[test]
    fn parses_array_and_tuple_types() {
        assert_eq!(
            ParamType::parse("uint256[]").unwrap(),
            ParamType::dynamic_array(ParamType::uint(256).unwrap())
        );
        assert_eq!(
            ParamType::parse("address[3]").unwrap(),
            ParamType::fixed_array(ParamType::Address, 3)
        );
        assert_eq!(
            ParamType::parse("(bool,string)").unwrap(),
            ParamType::Tuple(vec![ParamType::Bool, ParamType::String])
        );
        assert_eq!(
            ParamType::parse("(bool,string)[]").unwrap(),
            ParamType::dynamic_array(ParamType::Tuple(vec![ParamType::Bool, ParamType::String]))
        );
        assert_eq!(
            ParamType::parse("uint256[2][3]").unwrap(),
            ParamType::fixed_array(ParamType::fixed_array(ParamType::uint(256).unwrap(), 2), 3)
        );
    }

    #[test]
    fn round_trips_through_display_and_parse() {
        let types = [
            "bool",
            "address",
            "uint256",
            "int8",
            "bytes4",
            "string[]",
            "(uint256,bool)[3]",
        ];
        for t in types {
            let parsed = ParamType::parse(t).unwrap();
            assert_eq!(parsed.to_string(), t);
        }
    }

    #[test]
    fn abi_parameter_requires_components_for_tuples() {
        let tuple_type = ParamType::Tuple(vec![ParamType::Bool]);
        assert_eq!(
            AbiParameter::new(tuple_type, "x"),
            Err(TypeError::MissingTupleComponents)
        );

        let built = AbiParameter::tuple(
            "x",
            vec![AbiParameter::new(ParamType::Bool, "flag").unwrap()],
        );
        assert_eq!(built.kind, ParamType::Tuple(vec![ParamType::Bool]));
        assert!(built.components.is_some());
    }

    #[test]
    fn abi_parameter_array_of_tuple_carries_components() {
        let element = AbiParameter::tuple(
            "",
            vec![AbiParameter::new(ParamType::Address, "owner").unwrap()],
        );
        let array = AbiParameter::array("owners", element);
        assert_eq!(
            array.kind,
            ParamType::dynamic_array(ParamType::Tuple(vec![ParamType::Address]))
        );
        assert!(array.components.is_some());
    }
}
