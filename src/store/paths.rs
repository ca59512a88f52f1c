//-
// Copyright (c) 2026, the maildot developers
//
// This file is part of maildot.
//
// Maildot is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Maildot is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along
// with maildot. If not, see <http://www.gnu.org/licenses/>.

//! Mapping from the mailbox URLs stored in the Envelope Index to the
//! physical directories holding message files.
//!
//! Mail.app lays a mailbox out as `<account-uuid>/<name>.mbox/<opaque
//! uuid>/Data/...`, where the `.mbox` container is recognisable by the
//! `Info.plist` directly inside it and the opaque child directory differs
//! per machine. The index, however, records mailboxes as
//! `imap://<account-uuid>/<name>`. [`mailbox_path_map`] reconciles the two
//! by walking the store once and keying each discovered `Data` directory by
//! the URL form of its `.mbox` container.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::support::error::Error;

/// Presence of this file directly inside a directory marks it as a mailbox
/// container.
const MARKER_FILE: &str = "Info.plist";

/// Container-naming extension, absent from the URLs in the index.
const MBOX_EXT: &str = ".mbox";

/// Directory name holding the message files below a mailbox's opaque
/// child directory. Also a reserved name the walk never descends into.
const DATA_DIR: &str = "Data";

/// Sibling container of the Envelope Index; never holds message files.
const INDEX_DATA_DIR: &str = "MailData";

/// Walks the mail store under `root` and returns a map from the relative
/// path embedded in each mailbox URL (minus the `imap://` scheme) to the
/// absolute directory containing that mailbox's message files.
///
/// The map is built in a single pre-order pass: a directory is marked the
/// first time the marker file is found inside it, and every directory
/// visited afterwards whose direct parent is marked records an entry. If a
/// marked directory has several children the last one visited wins.
///
/// Any I/O failure during the walk aborts it and propagates.
pub fn mailbox_path_map(
    root: &Path,
) -> Result<HashMap<String, PathBuf>, Error> {
    let mut marked = HashSet::new();
    let mut map = HashMap::new();
    walk(root, root, &mut marked, &mut map)?;
    Ok(map)
}

fn walk(
    root: &Path,
    dir: &Path,
    marked: &mut HashSet<PathBuf>,
    map: &mut HashMap<String, PathBuf>,
) -> Result<(), Error> {
    // A failed stat (missing marker, unreadable entry) just means this
    // directory is not a mailbox container.
    if fs::metadata(dir.join(MARKER_FILE)).is_ok() {
        marked.insert(dir.to_owned());
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name();
        if name == DATA_DIR || name == INDEX_DATA_DIR {
            continue;
        }

        let child = entry.path();
        if marked.contains(dir) {
            // `child` is the opaque per-machine directory nested directly
            // inside a mailbox container; its `Data` subdirectory is where
            // the message files live.
            map.insert(logical_key(root, dir), child.join(DATA_DIR));
        }

        walk(root, &child, marked, map)?;
    }

    Ok(())
}

/// Converts a marked container path to the relative form stored in the
/// index URLs: the walk root is stripped and every `.mbox` occurrence is
/// removed.
fn logical_key(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    relative.to_string_lossy().replace(MBOX_EXT, "")
}

/// Expands a message row id to its sharded path below a mailbox's `Data`
/// directory.
///
/// Mail.app nests message files three levels deep, named by the id's
/// characters at positions 2, 1 and 0: `"0447630"` becomes
/// `"4/4/0/Messages/0447630"`. Ids are opaque strings; the digits are
/// never interpreted numerically. The id must be at least three bytes
/// long.
pub fn emlx_path_from_row_id(row_id: &str) -> String {
    let b = row_id.as_bytes();
    format!(
        "{}/{}/{}/Messages/{}",
        b[2] as char, b[1] as char, b[0] as char, row_id
    )
}
