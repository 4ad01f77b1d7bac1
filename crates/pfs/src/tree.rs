//! Tree reconstructor: turns a [`pfs_codec::RawContainer`]'s flat,
//! parent-id-addressed records into the nested [`crate::model::Tree`].

use crate::error::{Error, Result};
use crate::model::{ChildMap, DirNode, FileNode, Node, Tree};
use pfs_codec::{CodecError, DirectoryRecord, DriveRecord, FileRecord, RawContainer};
use std::collections::HashMap;

const MAX_STALL_SWEEPS: usize = 50;

enum PendingKind {
    Directory(DirectoryRecord),
    File(FileRecord),
}

impl PendingKind {
    fn parent_id(&self) -> u16 {
        match self {
            PendingKind::Directory(d) => d.parent_id,
            PendingKind::File(f) => f.parent_id,
        }
    }
}

pub fn build(container: &RawContainer) -> Result<Tree> {
    let mut tree = Tree::new();
    for DriveRecord { name, id } in &container.drives {
        tree.add_drive(*name).map_err(|_| Error::Codec(CodecError::OrphanOrCycle))?;
        // add_drive assigns its own id; override with the persisted one so
        // parent_id references in the tables resolve correctly.
        if let Some(d) = tree.drives.iter_mut().find(|d| d.name == *name) {
            d.id = *id;
        }
    }

    let mut pending: Vec<PendingKind> = Vec::new();
    for dir in &container.directories {
        if dir.id == dir.parent_id {
            return Err(Error::Codec(CodecError::OrphanOrCycle));
        }
        pending.push(PendingKind::Directory(dir.clone()));
    }
    for file in &container.files {
        pending.push(PendingKind::File(file.clone()));
    }
    pending.sort_by_key(|p| p.parent_id());

    // known_paths maps an id (drive id or directory id) to the segment
    // path from its drive root, so newly placed directories can be found
    // by later sweeps.
    let mut known_paths: HashMap<u16, (u8, Vec<String>)> = HashMap::new();
    for drive in &tree.drives {
        known_paths.insert(drive.id as u16, (drive.name, Vec::new()));
    }

    let mut remaining: Vec<PendingKind> = Vec::new();
    let mut placed_this_round: Vec<PendingKind> = Vec::new();
    std::mem::swap(&mut remaining, &mut pending);

    let mut stalls = 0usize;
    let mut max_dir_id = 0u16;

    while !remaining.is_empty() {
        let mut progressed = false;
        let mut still_remaining = Vec::new();

        for item in remaining.drain(..) {
            if let Some((drive_name, segs)) = known_paths.get(&item.parent_id()).cloned() {
                progressed = true;
                match item {
                    PendingKind::Directory(d) => {
                        max_dir_id = max_dir_id.max(d.id);
                        let mut child_segs = segs.clone();
                        child_segs.push(d.name.clone());
                        known_paths.insert(d.id, (drive_name, child_segs));
                        placed_this_round.push(PendingKind::Directory(d));
                    }
                    PendingKind::File(f) => {
                        placed_this_round.push(PendingKind::File(f));
                    }
                }
            } else {
                still_remaining.push(item);
            }
        }

        if !progressed {
            stalls += 1;
            if stalls > MAX_STALL_SWEEPS {
                return Err(Error::Codec(CodecError::OrphanOrCycle));
            }
        } else {
            stalls = 0;
        }
        remaining = still_remaining;
    }

    // Second pass: actually insert into the nested tree now that every
    // item's drive-relative path prefix is known.
    for item in placed_this_round {
        match item {
            PendingKind::Directory(d) => {
                let (drive_name, mut prefix) = known_paths[&d.id].clone();
                prefix.pop(); // drop self, leaving the parent's path
                let drive = tree
                    .drives
                    .iter_mut()
                    .find(|dr| dr.name == drive_name)
                    .ok_or(Error::Codec(CodecError::OrphanOrCycle))?;
                let children = descend(&mut drive.children, &prefix)?;
                children.remove(&d.name);
                children
                    .insert(
                        d.name.clone(),
                        Node::Directory(DirNode {
                            id: d.id,
                            hidden: d.hidden,
                            children: ChildMap::default(),
                        }),
                    )
                    .ok();
            }
            PendingKind::File(f) => {
                let (drive_name, prefix) = resolve_file_prefix(&known_paths, &f)?;
                let drive = tree
                    .drives
                    .iter_mut()
                    .find(|dr| dr.name == drive_name)
                    .ok_or(Error::Codec(CodecError::OrphanOrCycle))?;
                let children = descend(&mut drive.children, &prefix)?;
                let start = f.offset as usize;
                let end = f.end() as usize;
                let data = container
                    .data
                    .get(start..end)
                    .ok_or(CodecError::PayloadTooShort {
                        required: f.end(),
                        actual: container.data.len() as u64,
                    })?
                    .to_vec();
                children.remove(&f.name);
                children
                    .insert(
                        f.name.clone(),
                        Node::File(FileNode {
                            read_only: f.read_only,
                            hidden: f.hidden,
                            system: f.system,
                            data,
                        }),
                    )
                    .ok();
            }
        }
    }

    tree.bump_next_dir_id(max_dir_id);
    Ok(tree)
}

fn resolve_file_prefix(
    known_paths: &HashMap<u16, (u8, Vec<String>)>,
    file: &FileRecord,
) -> Result<(u8, Vec<String>)> {
    known_paths
        .get(&file.parent_id)
        .cloned()
        .ok_or(Error::Codec(CodecError::OrphanOrCycle))
}

fn descend<'a>(root: &'a mut ChildMap, prefix: &[String]) -> Result<&'a mut ChildMap> {
    let mut children = root;
    for seg in prefix {
        match children.get_mut(seg) {
            Some(Node::Directory(d)) => children = &mut d.children,
            _ => return Err(Error::Codec(CodecError::OrphanOrCycle)),
        }
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfs_codec::header::{Header, Version};

    fn container_with(
        drives: Vec<DriveRecord>,
        directories: Vec<DirectoryRecord>,
        files: Vec<FileRecord>,
        data: Vec<u8>,
    ) -> RawContainer {
        RawContainer {
            header: Header {
                version: Version::V2,
                compression: Some((false, 0)),
                name: "t".to_string(),
            },
            drives,
            directories,
            files,
            data,
        }
    }

    #[test]
    fn test_build_flat_file_under_drive() {
        let container = container_with(
            vec![DriveRecord { name: b'A', id: 1 }],
            vec![],
            vec![FileRecord {
                name: "a.txt".to_string(),
                read_only: false,
                hidden: false,
                system: false,
                parent_id: 1,
                offset: 0,
                size: 2,
            }],
            b"hi".to_vec(),
        );
        let tree = build(&container).unwrap();
        let root = crate::path::VirtualPath::drive_root(b'A');
        assert!(tree.exists(&root.joinpath(&["a.txt"])));
    }

    #[test]
    fn test_build_nested_directories() {
        let container = container_with(
            vec![DriveRecord { name: b'A', id: 1 }],
            vec![
                DirectoryRecord {
                    id: 0x10,
                    name: "x".to_string(),
                    hidden: false,
                    parent_id: 1,
                },
                DirectoryRecord {
                    id: 0x11,
                    name: "y".to_string(),
                    hidden: false,
                    parent_id: 0x10,
                },
            ],
            vec![FileRecord {
                name: "z".to_string(),
                read_only: false,
                hidden: false,
                system: false,
                parent_id: 0x11,
                offset: 0,
                size: 0,
            }],
            Vec::new(),
        );
        let tree = build(&container).unwrap();
        let root = crate::path::VirtualPath::drive_root(b'A');
        let listing = tree.iterdir(&root.joinpath(&["x", "y"])).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name(), Some("z"));
    }

    #[test]
    fn test_orphan_parent_fails() {
        let container = container_with(
            vec![DriveRecord { name: b'A', id: 1 }],
            vec![DirectoryRecord {
                id: 0x10,
                name: "x".to_string(),
                hidden: false,
                parent_id: 0xFFFE,
            }],
            vec![],
            Vec::new(),
        );
        let err = build(&container).unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::OrphanOrCycle)));
    }

    #[test]
    fn test_self_referential_directory_fails() {
        let container = container_with(
            vec![DriveRecord { name: b'A', id: 1 }],
            vec![DirectoryRecord {
                id: 0x10,
                name: "x".to_string(),
                hidden: false,
                parent_id: 0x10,
            }],
            vec![],
            Vec::new(),
        );
        let err = build(&container).unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::OrphanOrCycle)));
    }
}
