use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Normalized permission code.
///
/// Backend codes arrive in whatever case they were created with
/// (`sys:user:list`, `SYS:USER:LIST`, ...); every code is upper-cased on
/// construction so comparisons are case-insensitive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(String);

impl PermissionCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PermissionCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PermissionCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// De-duplicated set of normalized codes held by a session.
///
/// Ordered so logs and renders list codes deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<PermissionCode>);

impl PermissionSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, code: PermissionCode) -> bool {
        self.0.insert(code)
    }

    pub fn contains(&self, code: &PermissionCode) -> bool {
        self.0.contains(code)
    }

    /// Case-insensitive membership test on a raw string.
    pub fn contains_str(&self, code: &str) -> bool {
        self.contains(&PermissionCode::new(code))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionCode> {
        self.0.iter()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl FromIterator<PermissionCode> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = PermissionCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(PermissionCode::new).collect()
    }
}

impl Extend<PermissionCode> for PermissionSet {
    fn extend<I: IntoIterator<Item = PermissionCode>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_upper_cased() {
        assert_eq!(PermissionCode::new("sys:user:list").as_str(), "SYS:USER:LIST");
        assert_eq!(PermissionCode::from("Posts:Write"), PermissionCode::new("POSTS:WRITE"));
    }

    #[test]
    fn set_deduplicates_across_casing() {
        let set: PermissionSet = ["a:b", "A:B", "c"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains_str("a:B"));
        assert_eq!(set.to_strings(), vec!["A:B".to_string(), "C".to_string()]);
    }
}
