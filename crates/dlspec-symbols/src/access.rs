use std::fmt;

use crate::error::{Error, Result};

const ACC_PUBLIC: u16 = 0x0001;
const ACC_PRIVATE: u16 = 0x0002;
const ACC_PROTECTED: u16 = 0x0004;
const ACC_STATIC: u16 = 0x0008;
const ACC_FINAL: u16 = 0x0010;
const ACC_SYNCHRONIZED: u16 = 0x0020;
const ACC_VOLATILE: u16 = 0x0040;
const ACC_BRIDGE: u16 = 0x0040;
const ACC_TRANSIENT: u16 = 0x0080;
const ACC_VARARGS: u16 = 0x0080;
const ACC_NATIVE: u16 = 0x0100;
const ACC_ABSTRACT: u16 = 0x0400;
const ACC_STRICT: u16 = 0x0800;
const ACC_SYNTHETIC: u16 = 0x1000;
const ACC_ENUM: u16 = 0x4000;

// Keyword order is the canonical print order.
const METHOD_KEYWORDS: &[(u16, &str)] = &[
    (ACC_PUBLIC, "public"),
    (ACC_PRIVATE, "private"),
    (ACC_PROTECTED, "protected"),
    (ACC_STATIC, "static"),
    (ACC_FINAL, "final"),
    (ACC_SYNCHRONIZED, "synchronized"),
    (ACC_BRIDGE, "bridge"),
    (ACC_VARARGS, "varargs"),
    (ACC_NATIVE, "native"),
    (ACC_ABSTRACT, "abstract"),
    (ACC_STRICT, "strictfp"),
    (ACC_SYNTHETIC, "synthetic"),
];

const FIELD_KEYWORDS: &[(u16, &str)] = &[
    (ACC_PUBLIC, "public"),
    (ACC_PRIVATE, "private"),
    (ACC_PROTECTED, "protected"),
    (ACC_STATIC, "static"),
    (ACC_FINAL, "final"),
    (ACC_VOLATILE, "volatile"),
    (ACC_TRANSIENT, "transient"),
    (ACC_SYNTHETIC, "synthetic"),
    (ACC_ENUM, "enum"),
];

fn parse_keywords<'a>(
    table: &[(u16, &str)],
    keywords: impl IntoIterator<Item = &'a str>,
) -> Result<u16> {
    let mut bits = 0u16;
    for keyword in keywords {
        let (flag, _) = table
            .iter()
            .find(|(_, name)| *name == keyword)
            .ok_or_else(|| Error::UnknownModifier(keyword.to_string()))?;
        bits |= flag;
    }
    Ok(bits)
}

fn fmt_keywords(table: &[(u16, &str)], bits: u16, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (flag, name) in table {
        if bits & flag != 0 {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
            first = false;
        }
    }
    Ok(())
}

macro_rules! access_flags {
    ($(#[$meta:meta])* $name:ident, $table:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name(u16);

        impl $name {
            pub const fn from_bits(bits: u16) -> Self {
                Self(bits)
            }

            pub const fn bits(self) -> u16 {
                self.0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            /// Parses space separated modifier keywords (`public static`).
            pub fn parse_keywords<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Result<Self> {
                parse_keywords($table, keywords).map(Self)
            }

            pub fn is_keyword(word: &str) -> bool {
                $table.iter().any(|(_, name)| *name == word)
            }

            pub const PUBLIC: Self = Self(ACC_PUBLIC);
            pub const PRIVATE: Self = Self(ACC_PRIVATE);
            pub const PROTECTED: Self = Self(ACC_PROTECTED);
            pub const STATIC: Self = Self(ACC_STATIC);
            pub const FINAL: Self = Self(ACC_FINAL);
            pub const SYNTHETIC: Self = Self(ACC_SYNTHETIC);
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt_keywords($table, self.0, f)
            }
        }
    };
}

access_flags!(
    /// Access bits of a method, as amended onto library members.
    MethodAccessFlags,
    METHOD_KEYWORDS
);
access_flags!(
    /// Access bits of a field, as amended onto library members.
    FieldAccessFlags,
    FIELD_KEYWORDS
);

impl MethodAccessFlags {
    pub const ABSTRACT: Self = Self(ACC_ABSTRACT);
    pub const NATIVE: Self = Self(ACC_NATIVE);
}

impl FieldAccessFlags {
    pub const VOLATILE: Self = Self(ACC_VOLATILE);
}
