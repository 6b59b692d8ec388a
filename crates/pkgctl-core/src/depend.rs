//! Dependency and conflict payloads shared across the prepare/commit error
//! surface (spec §4.8) and the deptest/vercmp operations (spec §4.9).

use std::cmp::Ordering;
use std::fmt;

/// Relational modifier attached to a version comparison in a dependency string
/// such as `glibc>=2.30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepMod {
    /// No version constraint (`foo`).
    Any,
    /// `foo=1.0`
    Eq,
    /// `foo>=1.0`
    Ge,
    /// `foo<=1.0`
    Le,
    /// `foo>1.0`
    Gt,
    /// `foo<1.0`
    Lt,
}

impl fmt::Display for DepMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DepMod::Any => "",
            DepMod::Eq => "=",
            DepMod::Ge => ">=",
            DepMod::Le => "<=",
            DepMod::Gt => ">",
            DepMod::Lt => "<",
        };
        f.write_str(s)
    }
}

/// A parsed dependency string: name plus an optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depend {
    pub name: String,
    pub modifier: DepMod,
    pub version: Option<String>,
}

impl Depend {
    /// Parse a dependency string of the form `name`, `name=ver`, `name>=ver`,
    /// `name<=ver`, `name>ver` or `name<ver`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        for (token, modifier) in [
            (">=", DepMod::Ge),
            ("<=", DepMod::Le),
            ("=", DepMod::Eq),
            (">", DepMod::Gt),
            ("<", DepMod::Lt),
        ] {
            if let Some(idx) = s.find(token) {
                let name = s[..idx].to_string();
                let version = s[idx + token.len()..].to_string();
                return Self {
                    name,
                    modifier,
                    version: Some(version),
                };
            }
        }
        Self {
            name: s.to_string(),
            modifier: DepMod::Any,
            version: None,
        }
    }
}

impl fmt::Display for Depend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}{}{v}", self.name, self.modifier),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A missing dependency reported from `Backend::prepare`.
#[derive(Debug, Clone)]
pub struct DepMissing {
    pub target: String,
    pub dep_name: String,
    pub modifier: DepMod,
    pub version: Option<String>,
}

/// A package-to-package conflict reported from `Backend::prepare`.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub target: String,
    pub conflicting_name: String,
}

/// The kind of file conflict reported from `Backend::prepare`/`commit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileConflictKind {
    /// Two targets in the same transaction both install the same file.
    Target,
    /// A target collides with a file already present on disk, owned by no
    /// package or by a package outside the transaction.
    File,
}

/// A single file-ownership conflict.
#[derive(Debug, Clone)]
pub struct FileConflict {
    pub kind: FileConflictKind,
    pub target: String,
    /// Present only for `FileConflictKind::Target`.
    pub other_target: Option<String>,
    pub path: String,
}

/// Compares two version strings the way `alpm_pkg_vercmp` does: dot/hyphen
/// separated numeric-or-alphabetic runs compared component-by-component, with
/// a missing trailing component considered older unless the other side's
/// component is non-numeric, and a `pkgrel` suffix after the final `-`.
#[must_use]
pub fn vercmp(a: &str, b: &str) -> Ordering {
    let (a_ver, a_rel) = split_pkgrel(a);
    let (b_ver, b_rel) = split_pkgrel(b);
    match compare_segments(a_ver, b_ver) {
        Ordering::Equal => match (a_rel, b_rel) {
            (Some(ar), Some(br)) => compare_segments(ar, br),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        },
        other => other,
    }
}

fn split_pkgrel(s: &str) -> (&str, Option<&str>) {
    match s.rfind('-') {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    }
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    let mut a_parts = tokenize(a).into_iter();
    let mut b_parts = tokenize(b).into_iter();
    loop {
        match (a_parts.next(), b_parts.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(at), Some(bt)) => {
                let ord = compare_token(&at, &bt);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_token(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(an), Ok(bn)) => an.cmp(&bn),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit: Option<bool> = None;
    for ch in s.chars() {
        if ch == '.' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            current_is_digit = None;
            continue;
        }
        let is_digit = ch.is_ascii_digit();
        if current_is_digit.is_some() && current_is_digit != Some(is_digit) {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(ch);
        current_is_digit = Some(is_digit);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Evaluate whether `installed_version` satisfies `dep`.
#[must_use]
pub fn satisfies(dep: &Depend, installed_version: &str) -> bool {
    let Some(required) = &dep.version else {
        return true;
    };
    let ord = vercmp(installed_version, required);
    match dep.modifier {
        DepMod::Any => true,
        DepMod::Eq => ord == Ordering::Equal,
        DepMod::Ge => ord != Ordering::Less,
        DepMod::Le => ord != Ordering::Greater,
        DepMod::Gt => ord == Ordering::Greater,
        DepMod::Lt => ord == Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operators() {
        let d = Depend::parse("glibc>=2.30");
        assert_eq!(d.name, "glibc");
        assert_eq!(d.modifier, DepMod::Ge);
        assert_eq!(d.version.as_deref(), Some("2.30"));

        let d = Depend::parse("bash");
        assert_eq!(d.modifier, DepMod::Any);
        assert!(d.version.is_none());
    }

    #[test]
    fn vercmp_basic_ordering() {
        assert_eq!(vercmp("1.0", "1.0"), Ordering::Equal);
        assert_eq!(vercmp("1.0", "1.1"), Ordering::Less);
        assert_eq!(vercmp("1.9", "1.10"), Ordering::Less);
        assert_eq!(vercmp("2.31-1", "2.31-2"), Ordering::Less);
        assert_eq!(vercmp("1.0-1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn satisfies_respects_modifier() {
        let dep = Depend::parse("glibc>=2.30");
        assert!(satisfies(&dep, "2.31"));
        assert!(!satisfies(&dep, "2.29"));

        let dep = Depend::parse("glibc>=99.0");
        assert!(!satisfies(&dep, "2.31"));
    }
}
