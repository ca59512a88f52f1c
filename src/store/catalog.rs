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

//! Account and mailbox identity data.
//!
//! The environment-specific account UUIDs that key the on-disk layout are
//! not stored anywhere the library could read directly; Mail.app itself is
//! the only authority. [`enumerate_mailboxes`] asks it through AppleScript
//! once at startup, and [`Catalog`] holds the result for name-based lookup.

use std::collections::HashMap;
use std::process::Command;
use std::sync::Arc;

use log::info;

use crate::support::error::Error;

/// Emits one `uuid,account,mailbox` record per mailbox. AppleScript's
/// `log` writes to stderr, which is where the records are collected from.
const LIST_MAILBOXES_SCRIPT: &str = r#"
tell application "Mail"
	set theAccounts to every account
	repeat with anAccount in theAccounts
		set theMailboxes to mailboxes of anAccount
		repeat with aMailbox in theMailboxes
			set accountId to id of anAccount
			set accountName to name of anAccount
			set mailboxName to name of aMailbox
			set csvData to accountId & "," & accountName & "," & mailboxName & return
			log csvData
		end repeat
	end repeat
end tell
"#;

/// The standard name Mail.app gives every account's inbox.
pub const INBOX: &str = "INBOX";

/// A Mail.app account holding one or more mailboxes.
///
/// The `uuid` is the account's identity and also names the account's
/// directory inside the mail store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub uuid: String,
}

/// A specific folder within an [`Account`].
#[derive(Debug, Clone)]
pub struct Mailbox {
    name: String,
    account: Arc<Account>,
}

impl Mailbox {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// The logical key identifying this mailbox independently of its
    /// physical location, in the form the Envelope Index stores it.
    pub fn url(&self) -> String {
        format!("imap://{}/{}", self.account.uuid, self.name)
    }
}

/// One record from the AppleScript enumeration.
#[derive(Debug, Clone)]
pub struct MailboxEntry {
    pub account_uuid: String,
    pub account_name: String,
    pub mailbox_name: String,
}

/// Asks Mail.app for every `(account uuid, account name, mailbox name)`
/// triple via `osascript`.
///
/// Failure here is fatal to opening a store; there is no other source for
/// the account UUIDs.
pub fn enumerate_mailboxes() -> Result<Vec<MailboxEntry>, Error> {
    let mut cmd = Command::new("osascript");
    for line in LIST_MAILBOXES_SCRIPT.lines().filter(|l| !l.is_empty()) {
        cmd.arg("-e").arg(line);
    }

    let output = cmd.output().map_err(|e| {
        Error::Enumeration(format!("couldn't run osascript: {}", e))
    })?;
    if !output.status.success() {
        return Err(Error::Enumeration(format!(
            "osascript exited with {}",
            output.status
        )));
    }

    let records = String::from_utf8_lossy(&output.stderr);
    let entries = parse_records(&records)?;
    info!("enumerated {} mailboxes from Mail.app", entries.len());
    Ok(entries)
}

fn parse_records(records: &str) -> Result<Vec<MailboxEntry>, Error> {
    let mut entries = Vec::new();
    for line in records.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let mut fields = line.splitn(3, ',');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(uuid), Some(account), Some(mailbox)) => {
                entries.push(MailboxEntry {
                    account_uuid: uuid.to_owned(),
                    account_name: account.to_owned(),
                    mailbox_name: mailbox.to_owned(),
                });
            }
            _ => {
                return Err(Error::Enumeration(format!(
                    "malformed record from osascript: {:?}",
                    line
                )))
            }
        }
    }
    Ok(entries)
}

/// All known mailboxes, grouped by account name then mailbox name.
///
/// Built once from the enumeration output; read-only afterwards.
pub struct Catalog {
    by_account: HashMap<String, HashMap<String, Mailbox>>,
}

impl Catalog {
    pub fn from_entries(
        entries: impl IntoIterator<Item = MailboxEntry>,
    ) -> Self {
        let mut accounts: HashMap<String, Arc<Account>> = HashMap::new();
        let mut by_account: HashMap<String, HashMap<String, Mailbox>> =
            HashMap::new();

        for entry in entries {
            let account = Arc::clone(
                accounts
                    .entry(entry.account_uuid.clone())
                    .or_insert_with(|| {
                        Arc::new(Account {
                            name: entry.account_name.clone(),
                            uuid: entry.account_uuid.clone(),
                        })
                    }),
            );
            by_account.entry(entry.account_name).or_default().insert(
                entry.mailbox_name.clone(),
                Mailbox {
                    name: entry.mailbox_name,
                    account,
                },
            );
        }

        Self { by_account }
    }

    /// Gets a specific mailbox, given an account name and mailbox name.
    pub fn lookup(
        &self,
        account: &str,
        name: &str,
    ) -> Result<&Mailbox, Error> {
        self.by_account
            .get(account)
            .and_then(|mailboxes| mailboxes.get(name))
            .ok_or_else(|| Error::MailboxNotFound {
                account: account.to_owned(),
                name: name.to_owned(),
            })
    }

    /// Iterates over every known mailbox, in no particular order.
    pub fn mailboxes(&self) -> impl Iterator<Item = &Mailbox> + '_ {
        self.by_account.values().flat_map(|mailboxes| mailboxes.values())
    }
}
