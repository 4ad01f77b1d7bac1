//! Flattens a [`crate::model::Tree`] back into the flat records and data
//! region that [`pfs_codec::RawContainer`] expects, for `save` (inverse of
//! [`crate::tree::build`]).
//!
//! Emission order is a depth-first walk of each drive's tree, in
//! drive-declaration order, with children visited in their `ChildMap`
//! insertion order. File offsets are reassigned densely in that order; no
//! other field is recomputed.

use crate::model::{Node, Tree};
use pfs_codec::{DirectoryRecord, DriveRecord, FileRecord};

pub struct Flattened {
    pub drives: Vec<DriveRecord>,
    pub directories: Vec<DirectoryRecord>,
    pub files: Vec<FileRecord>,
    pub data: Vec<u8>,
}

pub fn flatten(tree: &Tree) -> Flattened {
    let mut drives = Vec::new();
    let mut directories = Vec::new();
    let mut files = Vec::new();
    let mut data = Vec::new();

    for drive in &tree.drives {
        drives.push(DriveRecord {
            name: drive.name,
            id: drive.id,
        });
        walk(&drive.children, drive.id as u16, &mut directories, &mut files, &mut data);
    }

    Flattened {
        drives,
        directories,
        files,
        data,
    }
}

fn walk(
    children: &crate::model::ChildMap,
    parent_id: u16,
    directories: &mut Vec<DirectoryRecord>,
    files: &mut Vec<FileRecord>,
    data: &mut Vec<u8>,
) {
    for (name, node) in children.iter() {
        match node {
            Node::Directory(dir) => {
                directories.push(DirectoryRecord {
                    id: dir.id,
                    name: name.clone(),
                    hidden: dir.hidden,
                    parent_id,
                });
                walk(&dir.children, dir.id, directories, files, data);
            }
            Node::File(file) => {
                let offset = data.len() as u64;
                let size = file.data.len() as u64;
                data.extend_from_slice(&file.data);
                files.push(FileRecord {
                    name: name.clone(),
                    read_only: file.read_only,
                    hidden: file.hidden,
                    system: file.system,
                    parent_id,
                    offset,
                    size,
                });
            }
        }
    }
}
