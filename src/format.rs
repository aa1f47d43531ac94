//! Format registry.
//!
//! The registry is injected configuration: it maps primitive kinds and
//! extended format names to target-language type identifiers, plus per-entry
//! metadata an emitter needs (zero-value literal, string conversion and
//! formatting helper names). The default table targets a Go-flavored emitter;
//! callers with different targets supply their own table.
//!
//! Lookups normalize format names by stripping `-` and lowercasing, so
//! `date-time` and `datetime` hit the same entry.

use indexmap::IndexMap;

use crate::schema::Kind;

#[derive(Debug, Clone, PartialEq)]
pub struct FormatEntry {
    /// Target type identifier, e.g. `int32` or `strfmt.DateTime`.
    pub target: String,
    /// Primitive family this format belongs to.
    pub kind: Kind,
    /// Zero-value literal in the target language.
    pub zero: String,
    /// Name of the from-string conversion helper, when one exists.
    pub converter: Option<String>,
    /// Name of the to-string formatting helper, when one exists.
    pub formatter: Option<String>,
    /// Entry is a library type rather than a builtin (affects zero values
    /// and import tracking downstream).
    pub custom: bool,
    /// Entry resolves to a byte stream, not an in-memory value.
    pub stream: bool,
}

#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: IndexMap<String, FormatEntry>,
    primitives: IndexMap<Kind, FormatEntry>,
}

impl FormatRegistry {
    pub fn empty() -> Self {
        FormatRegistry {
            formats: IndexMap::new(),
            primitives: IndexMap::new(),
        }
    }

    /// Looks up an extended format by its raw (unnormalized) name.
    pub fn format(&self, raw: &str) -> Option<&FormatEntry> {
        self.formats.get(&normalize(raw))
    }

    /// The fallback entry for a bare primitive kind.
    pub fn primitive(&self, kind: Kind) -> Option<&FormatEntry> {
        self.primitives.get(&kind)
    }

    pub fn register_format(&mut self, name: &str, entry: FormatEntry) {
        self.formats.insert(normalize(name), entry);
    }

    pub fn register_primitive(&mut self, kind: Kind, entry: FormatEntry) {
        self.primitives.insert(kind, entry);
    }
}

fn normalize(raw: &str) -> String {
    raw.replace('-', "").to_ascii_lowercase()
}

fn builtin(target: &str, kind: Kind, zero: &str) -> FormatEntry {
    FormatEntry {
        target: target.to_string(),
        kind,
        zero: zero.to_string(),
        converter: None,
        formatter: None,
        custom: false,
        stream: false,
    }
}

fn converted(target: &str, kind: Kind, zero: &str, suffix: &str) -> FormatEntry {
    FormatEntry {
        converter: Some(format!("swag.Convert{suffix}")),
        formatter: Some(format!("swag.Format{suffix}")),
        ..builtin(target, kind, zero)
    }
}

fn strfmt(name: &str) -> FormatEntry {
    FormatEntry {
        target: format!("strfmt.{name}"),
        kind: Kind::String,
        zero: format!("strfmt.{name}{{}}"),
        converter: None,
        formatter: None,
        custom: true,
        stream: false,
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut reg = FormatRegistry::empty();

        reg.register_primitive(Kind::String, builtin("string", Kind::String, "\"\""));
        reg.register_primitive(Kind::Integer, converted("int64", Kind::Integer, "0", "Int64"));
        reg.register_primitive(Kind::Number, converted("float64", Kind::Number, "0", "Float64"));
        reg.register_primitive(Kind::Boolean, converted("bool", Kind::Boolean, "false", "Bool"));

        for (name, width) in [("int8", 8), ("int16", 16), ("int32", 32), ("int64", 64)] {
            reg.register_format(
                name,
                converted(name, Kind::Integer, "0", &format!("Int{width}")),
            );
        }
        for (name, width) in [("uint8", 8), ("uint16", 16), ("uint32", 32), ("uint64", 64)] {
            reg.register_format(
                name,
                converted(name, Kind::Integer, "0", &format!("Uint{width}")),
            );
        }
        reg.register_format("float", converted("float32", Kind::Number, "0", "Float32"));
        reg.register_format("double", converted("float64", Kind::Number, "0", "Float64"));

        // strfmt library types; zero is the struct literal
        for name in [
            ("date", "Date"),
            ("date-time", "DateTime"),
            ("uuid", "UUID"),
            ("uuid3", "UUID3"),
            ("uuid4", "UUID4"),
            ("uuid5", "UUID5"),
            ("isbn", "ISBN"),
            ("isbn10", "ISBN10"),
            ("isbn13", "ISBN13"),
            ("creditcard", "CreditCard"),
            ("ssn", "SSN"),
            ("hexcolor", "HexColor"),
            ("rgbcolor", "RGBColor"),
            ("mac", "MAC"),
            ("uri", "URI"),
            ("email", "Email"),
            ("hostname", "Hostname"),
            ("ipv4", "IPv4"),
            ("ipv6", "IPv6"),
            ("duration", "Duration"),
            ("password", "Password"),
            ("objectid", "ObjectId"),
        ] {
            reg.register_format(name.0, strfmt(name.1));
        }

        // base64 bytes: builtin slice, nil zero
        reg.register_format(
            "byte",
            FormatEntry {
                zero: "nil".to_string(),
                custom: true,
                ..builtin("strfmt.Base64", Kind::String, "nil")
            },
        );
        reg.register_format("char", builtin("rune", Kind::String, "0"));

        // raw octet stream
        reg.register_format(
            "binary",
            FormatEntry {
                stream: true,
                custom: true,
                ..builtin("io.ReadCloser", Kind::String, "nil")
            },
        );

        reg
    }
}
