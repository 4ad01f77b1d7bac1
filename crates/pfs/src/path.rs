//! Path grammar, parsing, and normalization.
//!
//! `ParsedPath` is the raw result of splitting a string on `DRIVE ":"
//! ("/" SEGMENT)*`; it carries no session context and does not know
//! whether its drive-less form is valid. [`Session::path`](crate::session::Session::path)
//! resolves a `ParsedPath` against the session's current drive/cwd into a
//! fully-qualified [`VirtualPath`], which is what every other query and
//! mutation operation on the session actually takes.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A path as split straight out of its string form, before it is resolved
/// against a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub drive: Option<u8>,
    pub segments: Vec<String>,
}

impl FromStr for ParsedPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Split on `/` first, then inspect only the first resulting token
        // for a trailing drive colon. A colon inside a later segment, or
        // inside the first segment but not at its end, is just part of a
        // `SEGMENT` name (the grammar puts no other restriction on it).
        let mut segments: Vec<String> = s
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(str::to_string)
            .collect();

        let drive = if segments.first().map(|s| s.ends_with(':')).unwrap_or(false) {
            let first = segments.remove(0);
            let letter_part = &first[..first.len() - 1];
            let letter = letter_part
                .bytes()
                .next()
                .filter(|_| letter_part.len() == 1)
                .map(|b| b.to_ascii_uppercase())
                .filter(|b| (b'A'..=b'P').contains(b))
                .ok_or(Error::BadDriveName)?;
            Some(letter)
        } else {
            None
        };

        Ok(ParsedPath { drive, segments })
    }
}

impl fmt::Display for ParsedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(d) = self.drive {
            write!(f, "{}:", d as char)?;
        }
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

/// A fully-qualified path: always anchored at a specific drive letter,
/// normalized of any `.`/`..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    pub drive: u8,
    pub segments: Vec<String>,
}

impl VirtualPath {
    pub fn drive_root(drive: u8) -> Self {
        VirtualPath {
            drive,
            segments: Vec::new(),
        }
    }

    pub fn is_drive_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Pure string composition with `/`, no validation against the tree.
    pub fn joinpath(&self, segs: &[&str]) -> Self {
        let mut segments = self.segments.clone();
        for seg in segs {
            segments.extend(seg.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        }
        VirtualPath {
            drive: self.drive,
            segments,
        }
    }

    pub fn parent(&self) -> Result<Self> {
        if self.segments.is_empty() {
            return Err(Error::NoParent);
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Ok(VirtualPath {
            drive: self.drive,
            segments,
        })
    }

    /// Normalizes `.` (dropped) and `..` (pops one segment), failing if a
    /// `..` would ascend above the drive root.
    pub fn resolve(&self) -> Result<Self> {
        let mut out: Vec<String> = Vec::new();
        for seg in &self.segments {
            match seg.as_str() {
                "." => {}
                ".." => {
                    if out.pop().is_none() {
                        return Err(Error::EscapesRoot);
                    }
                }
                other => out.push(other.to_string()),
            }
        }
        Ok(VirtualPath {
            drive: self.drive,
            segments: out,
        })
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.drive as char)?;
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute() {
        let p: ParsedPath = "A:/x/y".parse().unwrap();
        assert_eq!(p.drive, Some(b'A'));
        assert_eq!(p.segments, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_parse_relative() {
        let p: ParsedPath = "x/y".parse().unwrap();
        assert_eq!(p.drive, None);
        assert_eq!(p.segments, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        let p: ParsedPath = "A:/x//y/".parse().unwrap();
        assert_eq!(p.segments, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_bad_drive_name() {
        let err = "ZZ:/x".parse::<ParsedPath>().unwrap_err();
        assert!(matches!(err, Error::BadDriveName));
    }

    #[test]
    fn test_colon_inside_first_segment_is_not_a_drive_spec() {
        let p: ParsedPath = "notes:v2/file".parse().unwrap();
        assert_eq!(p.drive, None);
        assert_eq!(p.segments, vec!["notes:v2".to_string(), "file".to_string()]);
    }

    #[test]
    fn test_resolve_dotdot() {
        let p = VirtualPath {
            drive: b'A',
            segments: vec!["x".into(), "..".into(), "y".into()],
        };
        let resolved = p.resolve().unwrap();
        assert_eq!(resolved.segments, vec!["y".to_string()]);
    }

    #[test]
    fn test_resolve_escapes_root() {
        let p = VirtualPath {
            drive: b'A',
            segments: vec!["..".into()],
        };
        assert!(matches!(p.resolve(), Err(Error::EscapesRoot)));
    }

    #[test]
    fn test_parent_at_root_fails() {
        let p = VirtualPath::drive_root(b'A');
        assert!(matches!(p.parent(), Err(Error::NoParent)));
    }

    #[test]
    fn test_joinpath_is_pure_composition() {
        let p = VirtualPath::drive_root(b'A');
        let joined = p.joinpath(&["x", "y"]);
        assert_eq!(joined.to_string(), "A:/x/y");
    }
}
