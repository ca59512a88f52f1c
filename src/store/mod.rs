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

//! Access to one on-disk Mail.app store.
//!
//! A [`Store`] is assembled once, from three independent sources:
//!
//! 1. the AppleScript enumeration of accounts and mailboxes (the
//!    [`catalog`] module),
//! 2. a walk of the directory tree under `~/Library/Mail/V10` (the
//!    [`paths`] module), and
//! 3. a read-only connection to the `Envelope Index` SQLite database.
//!
//! The three are correlated by mailbox URL. Everything is synchronous and
//! nothing here retries or locks: the store assumes Mail.app is not
//! concurrently rewriting the index or the tree underneath it, which is an
//! external assumption this library cannot enforce.

pub mod catalog;
pub mod emlx;
pub mod paths;
pub mod query;

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::support::error::Error;

pub use self::catalog::{Account, Catalog, Mailbox, MailboxEntry, INBOX};
pub use self::emlx::MessageReader;
pub use self::query::{MessageQuery, MessageRef, Messages};

/// Locations of the mail store on disk, fixed by Mail.app's layout but
/// injected explicitly so the library can be pointed at synthetic trees.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// The root of the versioned store, normally `~/Library/Mail/V10`.
    pub mail_root: PathBuf,
    /// The Envelope Index database, normally
    /// `<mail_root>/MailData/Envelope Index`.
    pub envelope_index: PathBuf,
}

impl StoreConfig {
    /// The standard layout below the given home directory.
    pub fn for_home(home: impl AsRef<Path>) -> Self {
        let mail_root = home.as_ref().join("Library/Mail/V10");
        let envelope_index = mail_root.join("MailData/Envelope Index");
        Self {
            mail_root,
            envelope_index,
        }
    }

    /// The standard layout below the current user's home directory.
    pub fn from_env() -> Result<Self, Error> {
        dirs::home_dir().map(Self::for_home).ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "home directory not found",
            ))
        })
    }
}

/// A read-only view of one Mail.app message store.
pub struct Store {
    catalog: Catalog,
    paths: HashMap<String, PathBuf>,
    db: rusqlite::Connection,
}

impl Store {
    /// Opens the store described by `config`, enumerating accounts and
    /// mailboxes from the running Mail.app instance.
    pub fn open(config: &StoreConfig) -> Result<Self, Error> {
        let catalog = Catalog::from_entries(catalog::enumerate_mailboxes()?);
        Self::with_catalog(catalog, config)
    }

    /// Opens the store with an already-built catalog.
    ///
    /// This is the seam that keeps everything below the AppleScript call
    /// testable against synthetic stores.
    pub fn with_catalog(
        catalog: Catalog,
        config: &StoreConfig,
    ) -> Result<Self, Error> {
        let paths = paths::mailbox_path_map(&config.mail_root)
            .map_err(Error::wrap_full_disk_access)?;
        info!(
            "mapped {} mailbox directories under {}",
            paths.len(),
            config.mail_root.display()
        );

        let db = rusqlite::Connection::open_with_flags(
            &config.envelope_index,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )
        .map_err(|e| Error::from(e).wrap_full_disk_access())?;

        Ok(Self {
            catalog,
            paths,
            db,
        })
    }

    /// Gets a specific mailbox, given an account name and mailbox name.
    pub fn mailbox(
        &self,
        account: &str,
        name: &str,
    ) -> Result<Mailbox, Error> {
        self.catalog.lookup(account, name).cloned()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Starts a query over the store's messages.
    pub fn messages(&self, query: MessageQuery) -> Messages<'_> {
        Messages::new(self, query)
    }

    /// Releases the index connection, reporting any failure to do so.
    ///
    /// Dropping the store has the same effect, minus the error.
    pub fn close(self) -> Result<(), Error> {
        self.db.close().map_err(|(_, e)| e.into())
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io::Read;

    use tempfile::TempDir;

    use super::*;

    const ACCOUNT_UUID: &str = "9AF23B6C";

    /// Lays out a miniature but complete store: one marked mailbox
    /// container, an Envelope Index with two messages, one `.emlx` file
    /// and one `.partial.emlx` file.
    fn synthetic_store(root: &Path) -> (StoreConfig, Vec<&'static [u8]>) {
        let container = root.join(ACCOUNT_UUID).join("INBOX.mbox");
        let data = container.join("8F2C0D11").join("Data");
        fs::create_dir_all(&data).unwrap();
        fs::write(container.join("Info.plist"), b"<plist/>").unwrap();

        let newest: &[u8] = b"Subject: newest\n\nhello";
        let oldest: &[u8] = b"Subject: oldest\n\nworld";

        let newest_path = data.join("3/2/1/Messages");
        fs::create_dir_all(&newest_path).unwrap();
        fs::write(
            newest_path.join("123.emlx"),
            frame(newest, b"<plist>trailer</plist>"),
        )
        .unwrap();

        let oldest_path = data.join("6/5/4/Messages");
        fs::create_dir_all(&oldest_path).unwrap();
        fs::write(oldest_path.join("456.partial.emlx"), frame(oldest, b""))
            .unwrap();

        let mail_data = root.join("MailData");
        fs::create_dir_all(&mail_data).unwrap();
        let index = mail_data.join("Envelope Index");
        let db = rusqlite::Connection::open(&index).unwrap();
        db.execute_batch(
            "CREATE TABLE mailboxes (url TEXT); \
             CREATE TABLE messages (mailbox INTEGER, \
                                    date_received INTEGER);",
        )
        .unwrap();
        db.execute(
            "INSERT INTO mailboxes (ROWID, url) VALUES (1, ?)",
            (format!("imap://{}/INBOX", ACCOUNT_UUID),),
        )
        .unwrap();
        db.execute_batch(
            "INSERT INTO messages (ROWID, mailbox, date_received) \
             VALUES (123, 1, 200); \
             INSERT INTO messages (ROWID, mailbox, date_received) \
             VALUES (456, 1, 100);",
        )
        .unwrap();
        db.close().unwrap();

        (
            StoreConfig {
                mail_root: root.to_owned(),
                envelope_index: index,
            },
            vec![newest, oldest],
        )
    }

    fn frame(body: &[u8], trailer: &[u8]) -> Vec<u8> {
        let mut data = format!("{}\n", body.len()).into_bytes();
        data.extend_from_slice(body);
        data.extend_from_slice(trailer);
        data
    }

    fn test_catalog() -> Catalog {
        Catalog::from_entries(vec![MailboxEntry {
            account_uuid: ACCOUNT_UUID.to_owned(),
            account_name: "Test".to_owned(),
            mailbox_name: INBOX.to_owned(),
        }])
    }

    #[test]
    fn end_to_end_query_and_read() {
        let tmp = TempDir::new().unwrap();
        let (config, bodies) = synthetic_store(tmp.path());

        let store = Store::with_catalog(test_catalog(), &config).unwrap();
        let mailbox = store.mailbox("Test", INBOX).unwrap();
        assert_eq!(
            format!("imap://{}/INBOX", ACCOUNT_UUID),
            mailbox.url()
        );

        let mut messages = store.messages(MessageQuery {
            mailbox: Some(mailbox),
            batch_size: 0,
        });
        let batch = messages.next_batch().unwrap();
        assert_eq!(2, batch.len());

        for (message, expected) in batch.iter().zip(&bodies) {
            let (mut reader, framing_error) = message.open().unwrap();
            assert!(framing_error.is_none());

            let mut body = Vec::new();
            reader.read_to_end(&mut body).unwrap();
            assert_eq!(*expected, &body[..]);
        }

        store.close().unwrap();
    }

    #[test]
    fn missing_message_file_propagates_not_found() {
        let tmp = TempDir::new().unwrap();
        let (config, _) = synthetic_store(tmp.path());

        let store = Store::with_catalog(test_catalog(), &config).unwrap();
        let batch = store
            .messages(MessageQuery::default())
            .next_batch()
            .unwrap();

        // The newest message only exists as `.emlx`; with that gone,
        // opening it must surface the I/O error instead of a reader.
        fs::remove_file(batch[0].base().with_extension("emlx")).unwrap();
        assert_matches!(Err(Error::Io(..)), batch[0].open());
    }

    #[test]
    fn unknown_mailbox_name_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let (config, _) = synthetic_store(tmp.path());

        let store = Store::with_catalog(test_catalog(), &config).unwrap();
        assert_matches!(
            Err(Error::MailboxNotFound { .. }),
            store.mailbox("Test", "Archive")
        );
    }

    #[test]
    fn config_follows_the_fixed_layout() {
        let config = StoreConfig::for_home("/Users/someone");
        assert_eq!(
            Path::new("/Users/someone/Library/Mail/V10"),
            &config.mail_root
        );
        assert_eq!(
            Path::new(
                "/Users/someone/Library/Mail/V10/MailData/Envelope Index"
            ),
            &config.envelope_index
        );
    }
}
