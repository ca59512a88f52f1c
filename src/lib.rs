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

//! Read-only access to the message store Apple's Mail.app keeps under
//! `~/Library/Mail/V10`.
//!
//! The store is opaque in two ways: mailboxes live in directories named by
//! environment-specific UUIDs that only the Envelope Index database and
//! Mail.app itself can relate to account and mailbox names, and every
//! message file wraps its RFC 5322 payload in a proprietary length-prefixed
//! `.emlx` framing. This crate resolves the former and strips the latter,
//! so messages can be handed to any standard parser.
//!
//! Nothing here ever writes to the store, parses message bodies, or talks
//! IMAP; `imap://` appears only as the scheme of the mailbox URLs the index
//! stores.
//!
//! ```no_run
//! use maildot::{MessageQuery, Store, StoreConfig, INBOX};
//!
//! # fn main() -> Result<(), maildot::Error> {
//! let store = Store::open(&StoreConfig::from_env()?)?;
//! let mailbox = store.mailbox("Work", INBOX)?;
//! let mut messages = store.messages(MessageQuery {
//!     mailbox: Some(mailbox),
//!     batch_size: 100,
//! });
//!
//! for message in messages.next_batch()? {
//!     let (_reader, _framing_error) = message.open()?;
//!     // feed the reader to any RFC 5322 parser
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Reading a live store requires Full Disk Access; without it, macOS fails
//! the directory walk and the index open with "operation not permitted",
//! which [`Error::FullDiskAccess`] rewraps with guidance.

#[cfg(test)]
macro_rules! assert_matches {
    ($expected:pat, $actual:expr) => {
        match $actual {
            $expected => (),
            unexpected => panic!(
                "Expected {} matches {}, got {:?}",
                stringify!($expected),
                stringify!($actual),
                unexpected
            ),
        }
    };
}

pub mod store;
pub mod support;

pub use self::store::{
    Account, Catalog, Mailbox, MailboxEntry, MessageQuery, MessageReader,
    MessageRef, Messages, Store, StoreConfig, INBOX,
};
pub use self::support::error::Error;
