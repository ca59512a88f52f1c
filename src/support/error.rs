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

use std::io;

use thiserror::Error;

/// The suffix macOS puts on I/O errors caused by the sandbox denying a
/// process access to protected locations such as `~/Library/Mail`.
const PERMISSION_PHRASE: &str = "operation not permitted";

#[derive(Error, Debug)]
pub enum Error {
    #[error("couldn't find mailbox '{name}' for account '{account}'")]
    MailboxNotFound { account: String, name: String },
    #[error("malformed emlx framing: {0}")]
    MalformedFraming(&'static str),
    #[error("unmatched mailbox path: {0}")]
    UnresolvedMailboxPath(String),
    #[error("mailbox enumeration failed: {0}")]
    Enumeration(String),
    #[error(
        "Querying Mail.app messages requires Full Disk Access permissions.\n\
         You can grant these permissions in System Settings > \
         Privacy & Security.\n\nOriginal error:\n{0}"
    )]
    FullDiskAccess(#[source] Box<Error>),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// Rewraps I/O and database errors that look like a macOS sandbox
    /// denial, pointing the user at the Full Disk Access setting.
    ///
    /// The original error stays reachable through `source()`.
    pub(crate) fn wrap_full_disk_access(self) -> Self {
        let denied = match self {
            Self::Io(ref e) => e.to_string().ends_with(PERMISSION_PHRASE),
            Self::Sqlite(ref e) => e.to_string().ends_with(PERMISSION_PHRASE),
            _ => false,
        };

        if denied {
            Self::FullDiskAccess(Box::new(self))
        } else {
            self
        }
    }
}

#[cfg(test)]
mod test {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn permission_denials_get_wrapped() {
        let err = Error::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "open /Users/x/Library/Mail: operation not permitted",
        ));

        let wrapped = err.wrap_full_disk_access();
        assert_matches!(Error::FullDiskAccess(..), &wrapped);
        assert!(wrapped.to_string().contains("Full Disk Access"));
        assert!(wrapped
            .source()
            .expect("original error lost")
            .to_string()
            .ends_with("operation not permitted"));
    }

    #[test]
    fn other_errors_pass_through() {
        let err = Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "no such file or directory",
        ));
        assert_matches!(Error::Io(..), err.wrap_full_disk_access());

        let err = Error::UnresolvedMailboxPath("UUID/INBOX".to_owned());
        assert_matches!(
            Error::UnresolvedMailboxPath(..),
            err.wrap_full_disk_access()
        );
    }
}
