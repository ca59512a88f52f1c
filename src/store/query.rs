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

//! Queries over the Envelope Index, translating result rows into handles
//! on the physical message files.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use rusqlite::types::Value;

use super::emlx::{self, MessageReader};
use super::paths;
use super::{Mailbox, Store};
use crate::support::error::Error;

const IMAP_SCHEME: &str = "imap://";

/// Extension of a fully downloaded message file.
const COMPLETE_EXT: &str = ".emlx";
/// Extension of a partially downloaded message file.
const PARTIAL_EXT: &str = ".partial.emlx";

const SELECT_MESSAGES: &str =
    "SELECT m.ROWID, mbx.url FROM messages m \
     LEFT JOIN mailboxes mbx ON m.mailbox = mbx.ROWID";

/// Parameters for one message query.
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    /// Restrict results to this mailbox; `None` queries the whole store.
    pub mailbox: Option<Mailbox>,
    /// When positive, each call to [`Messages::next_batch`] fetches at
    /// most this many rows. Zero fetches everything at once.
    pub batch_size: usize,
}

/// A reusable query over the store's messages, newest first.
///
/// Obtained from [`Store::messages`]. Each instance owns its own page
/// counter; the underlying store is shared.
pub struct Messages<'a> {
    store: &'a Store,
    sql: String,
    query: MessageQuery,
    page: usize,
}

impl<'a> Messages<'a> {
    pub(super) fn new(store: &'a Store, query: MessageQuery) -> Self {
        let mut sql = SELECT_MESSAGES.to_owned();
        if query.mailbox.is_some() {
            sql.push_str(" WHERE mbx.url = ?");
        }
        sql.push_str(" ORDER BY m.date_received DESC");
        if query.batch_size > 0 {
            sql.push_str(" LIMIT ? OFFSET ?");
        }

        Self {
            store,
            sql,
            query,
            page: 0,
        }
    }

    /// Fetches the next batch of messages, ordered by received date
    /// descending.
    ///
    /// The page counter advances exactly once per call, whether or not the
    /// previous call filled its batch; there is no end-of-results
    /// detection, so a short or empty batch is the caller's cue to stop.
    ///
    /// A result row whose mailbox URL has no entry in the path map fails
    /// the whole call with [`Error::UnresolvedMailboxPath`]; the index and
    /// the directory tree are out of sync at that point and partial
    /// results would be misleading.
    pub fn next_batch(&mut self) -> Result<Vec<MessageRef>, Error> {
        let page = self.page;
        self.page += 1;

        let mut params = Vec::<Value>::new();
        if let Some(ref mailbox) = self.query.mailbox {
            params.push(Value::Text(mailbox.url()));
        }
        if self.query.batch_size > 0 {
            params.push(Value::Integer(self.query.batch_size as i64));
            params.push(Value::Integer(
                (self.query.batch_size * page) as i64,
            ));
        }

        let mut stmt = self.store.db.prepare_cached(&self.sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
        let mut refs = Vec::new();
        while let Some(row) = rows.next()? {
            let row_id: i64 = row.get(0)?;
            let url: String = row.get(1)?;

            let relative = mailbox_relative_path(&url);
            let base =
                self.store.paths.get(&relative).ok_or_else(|| {
                    Error::UnresolvedMailboxPath(relative.clone())
                })?;
            refs.push(MessageRef {
                base: base
                    .join(paths::emlx_path_from_row_id(&row_id.to_string())),
            });
        }

        Ok(refs)
    }
}

/// Reduces a stored mailbox URL to the relative-path form keying the path
/// map: scheme stripped, percent-escapes decoded.
fn mailbox_relative_path(url: &str) -> String {
    let rest = url.strip_prefix(IMAP_SCHEME).unwrap_or(url);
    percent_decode_str(rest).decode_utf8_lossy().into_owned()
}

/// A handle on one message file, identified by its base path without the
/// download-state extension.
///
/// Produced per query row; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    base: PathBuf,
}

impl MessageRef {
    /// The resolved path of the message file, minus its extension.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Opens the message file and strips its emlx framing.
    ///
    /// A fully downloaded `.emlx` file is preferred; if it does not exist
    /// the `.partial.emlx` variant is tried. Any other open failure is
    /// fatal. The inner pair is [`emlx::strip`]'s dual-return contract.
    pub fn open(
        &self,
    ) -> Result<(MessageReader<File>, Option<Error>), Error> {
        match File::open(with_suffix(&self.base, COMPLETE_EXT)) {
            Ok(f) => Ok(emlx::strip(f)),
            Err(ref e) if io::ErrorKind::NotFound == e.kind() => {
                let f = File::open(with_suffix(&self.base, PARTIAL_EXT))?;
                Ok(emlx::strip(f))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}
