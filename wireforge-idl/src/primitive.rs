//! The fixed primitive-type table consulted by the resolver and the code
//! generator: the closed set of built-in scalar types every schema gets
//! for free, mapped to the host Rust type each compiles down to.

/// `(schema name, generated Rust type)` pairs. Lookups are by schema name
/// only; order here is cosmetic.
pub const PRIMITIVES: &[(&str, &str)] = &[
    ("char", "u8"),
    ("bool", "bool"),
    ("int8", "i8"),
    ("int16", "i16"),
    ("int32", "i32"),
    ("int64", "i64"),
    ("uint8", "u8"),
    ("uint16", "u16"),
    ("uint32", "u32"),
    ("uint64", "u64"),
    ("float", "f32"),
    ("double", "f64"),
    ("string", "String"),
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.iter().any(|&(schema_name, _)| schema_name == name)
}

/// The Rust type generated code uses to represent a schema primitive.
pub fn rust_type_for(name: &str) -> Option<&'static str> {
    PRIMITIVES.iter().find(|&&(schema_name, _)| schema_name == name).map(|&(_, rust_ty)| rust_ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_primitives_recognized() {
        for &(name, _) in PRIMITIVES {
            assert!(is_primitive(name));
        }
    }

    #[test]
    fn unknown_type_not_primitive() {
        assert!(!is_primitive("persontype"));
        assert!(!is_primitive("Foo"));
    }

    #[test]
    fn rust_type_mapping() {
        assert_eq!(rust_type_for("uint64"), Some("u64"));
        assert_eq!(rust_type_for("string"), Some("String"));
        assert_eq!(rust_type_for("char"), Some("u8"));
        assert_eq!(rust_type_for("nope"), None);
    }
}
