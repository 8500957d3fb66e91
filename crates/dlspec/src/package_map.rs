//! Package-prefix compression of type names.
//!
//! Class types are written as `<token><simple name>` where a token is one
//! character of [`TOKEN_ALPHABET`] followed by `$`. The document carries the
//! token to package mapping, which must be a bijection.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{Origin, Result, SpecificationError};

pub const TOKEN_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789æÆøØ";

/// Whether `s` has the shape of a package token: one character then `$`.
pub fn is_token(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(first), Some('$'), None) if first != '$'
    )
}

/// Splits an encoded type name into its token and remainder if it starts
/// with a token.
fn split_token(encoded: &str) -> Option<(&str, &str)> {
    let mut indices = encoded.char_indices();
    let _ = indices.next()?;
    let (dollar, second) = indices.next()?;
    if second != '$' {
        return None;
    }
    let end = dollar + second.len_utf8();
    Some((&encoded[..end], &encoded[end..]))
}

/// Bijective mapping between package tokens and dotted package names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageMap {
    packages: IndexMap<String, String>,
    tokens: HashMap<String, String>,
}

impl PackageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `token -> package`. Re-adding the same pair is accepted; mapping
    /// either side to something else breaks the bijection and fails.
    pub fn insert(
        &mut self,
        token: impl Into<String>,
        package: impl Into<String>,
        origin: &Origin,
    ) -> Result<()> {
        let (token, package) = (token.into(), package.into());
        if let Some(existing) = self.packages.get(&token) {
            if *existing == package {
                return Ok(());
            }
            return Err(SpecificationError::PackageMapNotBijective {
                origin: origin.clone(),
                detail: format!("token {token} maps to both `{existing}` and `{package}`"),
            });
        }
        if let Some(existing) = self.tokens.get(&package) {
            return Err(SpecificationError::PackageMapNotBijective {
                origin: origin.clone(),
                detail: format!("package `{package}` has both tokens {existing} and {token}"),
            });
        }
        self.tokens.insert(package.clone(), token.clone());
        self.packages.insert(token, package);
        Ok(())
    }

    pub fn package(&self, token: &str) -> Option<&str> {
        self.packages.get(token).map(String::as_str)
    }

    pub fn token(&self, package: &str) -> Option<&str> {
        self.tokens.get(package).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// `(token, package)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.packages
            .iter()
            .map(|(token, package)| (token.as_str(), package.as_str()))
    }

    /// Expands a compressed type name into a Java type name.
    ///
    /// Names whose second character is not `$` are literal (primitives,
    /// primitive arrays, `void`). Otherwise the first two characters are a
    /// token that must be mapped.
    pub fn decode(&self, encoded: &str, origin: &Origin) -> Result<String> {
        let Some((token, rest)) = split_token(encoded) else {
            return Ok(encoded.to_string());
        };
        let package = self
            .package(token)
            .ok_or_else(|| SpecificationError::MissingPackageMapping {
                origin: origin.clone(),
                token: token.to_string(),
            })?;
        Ok(if package.is_empty() {
            rest.to_string()
        } else {
            format!("{package}.{rest}")
        })
    }
}

/// Hands out package tokens from [`TOKEN_ALPHABET`] in order.
///
/// Single use: one allocator per export.
#[derive(Debug)]
pub struct TokenAllocator {
    alphabet: std::str::Chars<'static>,
    map: PackageMap,
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self::with_alphabet(TOKEN_ALPHABET)
    }
}

impl TokenAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alphabet(alphabet: &'static str) -> Self {
        Self {
            alphabet: alphabet.chars(),
            map: PackageMap::new(),
        }
    }

    /// The token of `package`, allocating the next free one on first use.
    pub fn token_for(&mut self, package: &str) -> Result<&str> {
        if self.map.token(package).is_none() {
            let next = self
                .alphabet
                .next()
                .ok_or(SpecificationError::PackageTokensExhausted)?;
            let token = format!("{next}$");
            tracing::trace!(target: "dlspec.exporter", %token, package, "allocated package token");
            self.map.insert(token, package, &Origin::Unknown)?;
        }
        self.map
            .token(package)
            .ok_or(SpecificationError::PackageTokensExhausted)
    }

    pub fn token(&self, package: &str) -> Option<&str> {
        self.map.token(package)
    }

    pub fn into_package_map(self) -> PackageMap {
        self.map
    }
}
