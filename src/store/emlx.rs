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

//! Support for reading the `.emlx` framing Mail.app wraps around every
//! message it stores on disk.
//!
//! The format is as follows:
//!
//! - first line: the byte length of the embedded message as ASCII decimal,
//!   possibly padded with spaces, terminated by `\n`
//! - exactly that many bytes of an ordinary RFC 5322 message
//! - an XML property-list trailer holding Mail.app metadata
//!
//! Only the middle part is of interest here; standard message parsers choke
//! on the length line and the trailer, so [`strip`] exposes a bounded view
//! over exactly the embedded message.

use std::io::{self, Read, Seek, SeekFrom};

use crate::support::error::Error;

/// A read-only view over one `.emlx` file produced by [`strip`].
#[derive(Debug)]
pub enum MessageReader<R> {
    /// A view bounded to exactly the embedded RFC 5322 message.
    Stripped(io::Take<R>),
    /// The whole file, rewound to the start; handed out when the framing
    /// could not be decoded.
    Raw(R),
}

impl<R: Read> Read for MessageReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match *self {
            MessageReader::Stripped(ref mut r) => r.read(buf),
            MessageReader::Raw(ref mut r) => r.read(buf),
        }
    }
}

/// Strips the emlx framing from `src`, returning a reader over exactly the
/// embedded message.
///
/// This is a dual-return contract: the caller always gets a usable reader.
/// When the length line is missing or does not parse, the reader is the
/// original stream rewound to the start and the problem is reported through
/// the second element. Callers must check the error but may still consume
/// the raw, unstripped bytes.
///
/// Only the length line is ever buffered; the message body stays on disk
/// until read.
pub fn strip<R: Read + Seek>(
    mut src: R,
) -> (MessageReader<R>, Option<Error>) {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    let mut saw_any = false;
    loop {
        match src.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                saw_any = true;
                if b'\n' == byte[0] {
                    break;
                }
                line.push(byte[0]);
            }
            Err(ref e) if io::ErrorKind::Interrupted == e.kind() => continue,
            Err(_) => return raw_fallback(src, "unreadable byte-count line"),
        }
    }

    if !saw_any {
        return raw_fallback(src, "missing byte-count line");
    }

    let count = String::from_utf8_lossy(&line);
    match count.trim_matches(' ').parse::<u64>() {
        Ok(n) => {
            // The length line may carry space padding, so the payload
            // offset is the raw line length plus the terminator.
            if let Err(e) = src.seek(SeekFrom::Start(line.len() as u64 + 1)) {
                return (MessageReader::Raw(src), Some(e.into()));
            }
            (MessageReader::Stripped(src.take(n)), None)
        }
        Err(_) => raw_fallback(src, "byte-count line is not an integer"),
    }
}

fn raw_fallback<R: Read + Seek>(
    mut src: R,
    problem: &'static str,
) -> (MessageReader<R>, Option<Error>) {
    // Rewind so the fallback reader really is the original stream and not
    // whatever tail the header scan left behind.
    let _ = src.seek(SeekFrom::Start(0));
    (MessageReader::Raw(src), Some(Error::MalformedFraming(problem)))
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;

    fn framed(line: &str, body: &[u8], trailer: &[u8]) -> Cursor<Vec<u8>> {
        let mut data = line.as_bytes().to_vec();
        data.extend_from_slice(body);
        data.extend_from_slice(trailer);
        Cursor::new(data)
    }

    fn read_all<R: Read>(mut r: R) -> Vec<u8> {
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn strips_exactly_declared_length() {
        let body = vec![b'a'; 120];
        let trailer = vec![b'b'; 40];
        let (reader, err) = strip(framed("120\n", &body, &trailer));

        assert!(err.is_none());
        assert_eq!(body, read_all(reader));
    }

    #[test]
    fn space_padded_count_still_isolates_message() {
        let (reader, err) =
            strip(framed("  16  \n", b"0123456789abcdef", b"<plist/>"));

        assert!(err.is_none());
        assert_eq!(b"0123456789abcdef".to_vec(), read_all(reader));
    }

    #[test]
    fn empty_stream_degrades_to_raw_reader() {
        let (reader, err) = strip(Cursor::new(Vec::new()));

        assert_matches!(Some(Error::MalformedFraming(..)), err);
        assert!(read_all(reader).is_empty());
    }

    #[test]
    fn unparsable_count_returns_raw_stream_and_error() {
        let original = b"From: someone@example.com\n\nHi\n";
        let (reader, err) = strip(Cursor::new(original.to_vec()));

        assert_matches!(Some(Error::MalformedFraming(..)), err);
        // The fallback reader covers the whole original stream.
        assert_eq!(original.to_vec(), read_all(reader));
    }

    #[test]
    fn count_line_without_terminator_yields_empty_message() {
        // The declared offset lands past EOF; reading just hits EOF rather
        // than failing.
        let (reader, err) = strip(Cursor::new(b"42".to_vec()));

        assert!(err.is_none());
        assert!(read_all(reader).is_empty());
    }

    #[test]
    fn declared_length_beyond_eof_is_truncated() {
        let (reader, err) = strip(framed("100\n", b"short", b""));

        assert!(err.is_none());
        assert_eq!(b"short".to_vec(), read_all(reader));
    }
}
