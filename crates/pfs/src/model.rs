//! Tree model & mutation API: the nested, arena-free representation
//! built by [`crate::tree`] and mutated directly by session operations.

use crate::error::{Error, Result};
use crate::path::VirtualPath;

pub const MIN_DIRECTORY_ID: u16 = 0x10;
pub const MAX_DIRECTORY_ID: u16 = 0x7FFF;
pub const MAX_DRIVES: usize = 16;
pub const MAX_NAME_LEN: usize = 255;

/// Which byte-attribute is being read or written. Used by the uniform
/// attribute getter/setter so each inapplicable combination can report
/// `AttrNotApplicable` from one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    ReadOnly,
    Hidden,
    System,
}

/// An insertion-ordered name -> node map. `iterdir`'s order guarantee
/// comes from this being append-only except on `remove`.
#[derive(Debug, Clone, Default)]
pub struct ChildMap(Vec<(String, Node)>);

impl ChildMap {
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.0.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn insert(&mut self, name: String, node: Node) -> Result<()> {
        if self.contains(&name) {
            return Err(Error::NameTaken);
        }
        self.0.push((name, node));
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        let idx = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Node)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FileNode {
    pub read_only: bool,
    pub hidden: bool,
    pub system: bool,
    pub data: Vec<u8>,
}

impl FileNode {
    pub fn empty() -> Self {
        FileNode {
            read_only: false,
            hidden: false,
            system: false,
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirNode {
    pub id: u16,
    pub hidden: bool,
    pub children: ChildMap,
}

#[derive(Debug, Clone)]
pub enum Node {
    File(FileNode),
    Directory(DirNode),
}

#[derive(Debug, Clone)]
pub struct Drive {
    pub name: u8,
    pub id: u8,
    pub children: ChildMap,
}

/// Result of resolving a [`VirtualPath`] to whatever it currently names.
pub enum Lookup<'a> {
    Drive,
    Directory(&'a DirNode),
    File(&'a FileNode),
}

/// The full in-memory tree: drives plus the monotonically increasing
/// directory-id counter used by `mkdir`.
#[derive(Debug, Clone)]
pub struct Tree {
    pub drives: Vec<Drive>,
    next_dir_id: u16,
}

impl Tree {
    pub fn new() -> Self {
        Tree {
            drives: Vec::new(),
            next_dir_id: MIN_DIRECTORY_ID,
        }
    }

    /// Used by the reconstructor to seed the id counter above every
    /// id present in a loaded blob.
    pub fn bump_next_dir_id(&mut self, at_least: u16) {
        if at_least >= self.next_dir_id {
            self.next_dir_id = at_least + 1;
        }
    }

    fn drive(&self, letter: u8) -> Result<&Drive> {
        self.drives
            .iter()
            .find(|d| d.name == letter)
            .ok_or(Error::NoSuchDrive)
    }

    fn drive_mut(&mut self, letter: u8) -> Result<&mut Drive> {
        self.drives
            .iter_mut()
            .find(|d| d.name == letter)
            .ok_or(Error::NoSuchDrive)
    }

    pub fn add_drive(&mut self, letter: u8) -> Result<()> {
        if !(b'A'..=b'P').contains(&letter) {
            return Err(Error::BadDriveName);
        }
        if self.drives.len() >= MAX_DRIVES {
            return Err(Error::TooManyDrives);
        }
        if self.drives.iter().any(|d| d.name == letter) {
            return Err(Error::DriveExists);
        }
        let used_ids: std::collections::HashSet<u8> = self.drives.iter().map(|d| d.id).collect();
        let id = (0u8..=15).find(|i| !used_ids.contains(i)).ok_or(Error::TooManyDrives)?;
        self.drives.push(Drive {
            name: letter,
            id,
            children: ChildMap::default(),
        });
        Ok(())
    }

    pub fn remove_drive(&mut self, letter: u8) -> Result<()> {
        let idx = self
            .drives
            .iter()
            .position(|d| d.name == letter)
            .ok_or(Error::NoSuchDrive)?;
        self.drives.remove(idx);
        Ok(())
    }

    /// Resolves a path to whatever it currently names.
    pub fn lookup(&self, path: &VirtualPath) -> Result<Lookup<'_>> {
        let drive = self.drive(path.drive)?;
        let mut children = &drive.children;
        for (i, seg) in path.segments.iter().enumerate() {
            let is_last = i == path.segments.len() - 1;
            let node = children.get(seg).ok_or(Error::NoSuchPath)?;
            match node {
                Node::Directory(d) => {
                    if is_last {
                        return Ok(Lookup::Directory(d));
                    }
                    children = &d.children;
                }
                Node::File(f) => {
                    if is_last {
                        return Ok(Lookup::File(f));
                    }
                    return Err(Error::NotADirectory);
                }
            }
        }
        Ok(Lookup::Drive)
    }

    pub fn exists(&self, path: &VirtualPath) -> bool {
        self.lookup(path).is_ok()
    }

    fn children_of(&self, path: &VirtualPath) -> Result<&ChildMap> {
        if path.is_drive_root() {
            return Ok(&self.drive(path.drive)?.children);
        }
        match self.lookup(path)? {
            Lookup::Directory(d) => Ok(&d.children),
            Lookup::Drive => Ok(&self.drive(path.drive)?.children),
            Lookup::File(_) => Err(Error::NotADirectory),
        }
    }

    pub fn iterdir(&self, path: &VirtualPath) -> Result<Vec<VirtualPath>> {
        let children = self.children_of(path)?;
        Ok(children
            .iter()
            .map(|(name, _)| path.joinpath(&[name.as_str()]))
            .collect())
    }

    /// Read-only counterpart of `parent_children_mut`, used where a
    /// mutation needs to check that the parent resolves before it can also
    /// read other `&self` state (e.g. `next_dir_id`) without fighting the
    /// borrow checker over a held `&mut ChildMap`.
    fn parent_children(&self, path: &VirtualPath) -> Result<&ChildMap> {
        let drive = self.drive(path.drive)?;
        if path.segments.len() <= 1 {
            return Ok(&drive.children);
        }
        let mut children = &drive.children;
        for seg in &path.segments[..path.segments.len() - 1] {
            match children.get(seg) {
                Some(Node::Directory(d)) => children = &d.children,
                Some(Node::File(_)) => return Err(Error::NotADirectory),
                None => return Err(Error::NoSuchParent),
            }
        }
        Ok(children)
    }

    /// Mutable access to the `ChildMap` that directly contains `path`'s
    /// last segment (i.e. `path`'s parent's children), failing
    /// `NoSuchParent` if any interior segment is missing or not a
    /// directory.
    fn parent_children_mut(&mut self, path: &VirtualPath) -> Result<&mut ChildMap> {
        let drive = self.drive_mut(path.drive)?;
        if path.segments.len() <= 1 {
            return Ok(&mut drive.children);
        }
        let mut children = &mut drive.children;
        for seg in &path.segments[..path.segments.len() - 1] {
            match children.get_mut(seg) {
                Some(Node::Directory(d)) => children = &mut d.children,
                Some(Node::File(_)) => return Err(Error::NotADirectory),
                None => return Err(Error::NoSuchParent),
            }
        }
        Ok(children)
    }

    pub fn mkdir(&mut self, path: &VirtualPath) -> Result<()> {
        let name = path.name().ok_or(Error::IsDrive)?.to_string();
        self.parent_children(path)?;
        if name.len() > MAX_NAME_LEN {
            return Err(Error::Codec(pfs_codec::CodecError::NameTooLong));
        }
        let id = self.next_dir_id;
        if id > MAX_DIRECTORY_ID {
            return Err(Error::Codec(pfs_codec::CodecError::DirIdOverflow(id as usize)));
        }
        let children = self.parent_children_mut(path)?;
        children.insert(
            name,
            Node::Directory(DirNode {
                id,
                hidden: false,
                children: ChildMap::default(),
            }),
        )?;
        self.next_dir_id += 1;
        Ok(())
    }

    pub fn touch(&mut self, path: &VirtualPath) -> Result<()> {
        let name = path.name().ok_or(Error::IsDrive)?.to_string();
        self.parent_children(path)?;
        if name.len() > MAX_NAME_LEN {
            return Err(Error::Codec(pfs_codec::CodecError::NameTooLong));
        }
        let children = self.parent_children_mut(path)?;
        children.insert(name, Node::File(FileNode::empty()))
    }

    pub fn unlink(&mut self, path: &VirtualPath) -> Result<()> {
        let name = path.name().ok_or(Error::IsDrive)?.to_string();
        let children = self.parent_children_mut(path)?;
        match children.get(&name) {
            Some(Node::File(f)) if f.system => return Err(Error::IsSystemFile),
            Some(_) => {}
            None => return Err(Error::NoSuchPath),
        }
        children.remove(&name);
        Ok(())
    }

    pub fn get_attr(&self, path: &VirtualPath, attr: Attr) -> Result<bool> {
        match self.lookup(path)? {
            Lookup::File(f) => match attr {
                Attr::ReadOnly => Ok(f.read_only),
                Attr::Hidden => Ok(f.hidden),
                Attr::System => Ok(f.system),
            },
            Lookup::Directory(d) => match attr {
                Attr::Hidden => Ok(d.hidden),
                _ => Err(Error::AttrNotApplicable),
            },
            Lookup::Drive => Err(Error::AttrNotApplicable),
        }
    }

    pub fn set_attr(&mut self, path: &VirtualPath, attr: Attr, value: bool) -> Result<()> {
        let name = path.name().ok_or(Error::AttrNotApplicable)?.to_string();
        let children = self.parent_children_mut(path)?;
        match children.get_mut(&name) {
            Some(Node::File(f)) => match attr {
                Attr::ReadOnly => f.read_only = value,
                Attr::Hidden => f.hidden = value,
                Attr::System => f.system = value,
            },
            Some(Node::Directory(d)) => match attr {
                Attr::Hidden => d.hidden = value,
                _ => return Err(Error::AttrNotApplicable),
            },
            None => return Err(Error::NoSuchPath),
        }
        Ok(())
    }

    pub fn file_mut(&mut self, path: &VirtualPath) -> Result<&mut FileNode> {
        let name = path.name().ok_or(Error::IsDrive)?.to_string();
        let children = self.parent_children_mut(path)?;
        match children.get_mut(&name) {
            Some(Node::File(f)) => Ok(f),
            Some(Node::Directory(_)) => Err(Error::NotADirectory),
            None => Err(Error::NoSuchPath),
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Tree {
        let mut t = Tree::new();
        t.add_drive(b'A').unwrap();
        t
    }

    #[test]
    fn test_add_drive_allocates_free_id() {
        let mut t = Tree::new();
        t.add_drive(b'A').unwrap();
        t.add_drive(b'B').unwrap();
        assert_eq!(t.drives[0].id, 0);
        assert_eq!(t.drives[1].id, 1);
    }

    #[test]
    fn test_add_drive_rejects_duplicate() {
        let mut t = sample_tree();
        assert!(matches!(t.add_drive(b'A'), Err(Error::DriveExists)));
    }

    #[test]
    fn test_mkdir_touch_and_iterdir() {
        let mut t = sample_tree();
        let root = VirtualPath::drive_root(b'A');
        t.mkdir(&root.joinpath(&["x"])).unwrap();
        t.touch(&root.joinpath(&["x", "y.txt"])).unwrap();
        let listing = t.iterdir(&root.joinpath(&["x"])).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name(), Some("y.txt"));
    }

    #[test]
    fn test_mkdir_then_unlink_restores_tree() {
        let mut t = sample_tree();
        let root = VirtualPath::drive_root(b'A');
        let p = root.joinpath(&["x"]);
        t.mkdir(&p).unwrap();
        t.unlink(&p).unwrap();
        assert!(!t.exists(&p));
    }

    #[test]
    fn test_mkdir_missing_parent_reported_before_name_too_long() {
        let mut t = sample_tree();
        let long_name = "x".repeat(MAX_NAME_LEN + 1);
        let p = VirtualPath::drive_root(b'A').joinpath(&["no-such-dir", &long_name]);
        assert!(matches!(t.mkdir(&p), Err(Error::NoSuchParent)));
    }

    #[test]
    fn test_touch_name_taken() {
        let mut t = sample_tree();
        let p = VirtualPath::drive_root(b'A').joinpath(&["a.txt"]);
        t.touch(&p).unwrap();
        assert!(matches!(t.touch(&p), Err(Error::NameTaken)));
    }

    #[test]
    fn test_attr_not_applicable_on_directory_read_only() {
        let mut t = sample_tree();
        let p = VirtualPath::drive_root(b'A').joinpath(&["x"]);
        t.mkdir(&p).unwrap();
        assert!(matches!(
            t.get_attr(&p, Attr::ReadOnly),
            Err(Error::AttrNotApplicable)
        ));
    }

    #[test]
    fn test_directory_id_not_reused_after_unlink() {
        let mut t = sample_tree();
        let root = VirtualPath::drive_root(b'A');
        t.mkdir(&root.joinpath(&["x"])).unwrap();
        let first_id = match t.lookup(&root.joinpath(&["x"])).unwrap() {
            Lookup::Directory(d) => d.id,
            _ => unreachable!(),
        };
        t.unlink(&root.joinpath(&["x"])).unwrap();
        t.mkdir(&root.joinpath(&["y"])).unwrap();
        let second_id = match t.lookup(&root.joinpath(&["y"])).unwrap() {
            Lookup::Directory(d) => d.id,
            _ => unreachable!(),
        };
        assert!(second_id > first_id);
    }
}
