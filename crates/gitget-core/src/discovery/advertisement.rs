//! Reference advertisement sent by `git-upload-pack` (protocol v0/v1).
//!
//! ```text
//! [# service=git-upload-pack LF  flush]      (smart HTTP only)
//! [version 1 LF]
//! <oid> SP <refname> NUL <capabilities> LF
//! <oid> SP <refname> LF
//! ...
//! flush
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tokio::io::AsyncRead;

use super::pktline::{PktLine, PktLineError, PktLineReader};

/// Symbolic name of the checked-out branch.
pub const HEAD: &str = "HEAD";
/// Branch namespace.
pub const REFS_HEADS: &str = "refs/heads/";

/// Extract a branch name from a full ref.
#[must_use]
pub fn branch_name(full_ref: &str) -> Option<&str> {
    full_ref.strip_prefix(REFS_HEADS)
}

/// A hex object name (SHA-1 or SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse a 40 or 64 character hex object name.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid_len = matches!(hex.len(), 40 | 64);
        (valid_len && hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .then(|| Self(hex.to_ascii_lowercase()))
    }

    /// Whether this is the all-zero id used by empty repositories.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    /// Hex form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An advertised reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ref {
    /// Points at an object.
    Direct(ObjectId),
    /// Points at another ref (e.g. `HEAD` -> `refs/heads/main`).
    Symbolic(String),
}

/// Everything a server advertised before negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdvertisedRefs {
    /// Reference name to reference.
    pub refs: BTreeMap<String, Ref>,
    /// Capabilities from the first line.
    pub capabilities: Vec<String>,
}

/// Why an advertisement could not be read.
#[derive(Debug, thiserror::Error)]
pub enum AdvertisementError {
    /// The server sent an `ERR` packet.
    #[error("remote error: {0}")]
    Remote(String),

    /// A reference line did not have the expected shape.
    #[error("malformed reference line: {0:?}")]
    MalformedLine(String),

    /// Framing error.
    #[error(transparent)]
    Framing(#[from] PktLineError),
}

impl AdvertisedRefs {
    /// Parse the reference lines of an advertisement (everything between
    /// the optional service preamble and the terminating flush).
    ///
    /// # Errors
    ///
    /// Returns an error for `ERR` packets and malformed lines.
    pub fn parse<L: AsRef<[u8]>>(lines: &[L]) -> Result<Self, AdvertisementError> {
        let mut adv = Self::default();

        for raw in lines {
            let line = String::from_utf8_lossy(raw.as_ref());
            let line = line.trim_end_matches('\n');

            if let Some(message) = line.strip_prefix("ERR ") {
                return Err(AdvertisementError::Remote(message.to_owned()));
            }
            if line == "version 1" {
                continue;
            }

            let (ref_part, caps) = match line.split_once('\0') {
                Some((r, c)) => (r, Some(c)),
                None => (line, None),
            };
            if let Some(caps) = caps {
                adv.capabilities = caps
                    .split(' ')
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect();
            }

            let (oid, name) = ref_part
                .split_once(' ')
                .ok_or_else(|| AdvertisementError::MalformedLine(line.to_owned()))?;
            let oid = ObjectId::from_hex(oid)
                .ok_or_else(|| AdvertisementError::MalformedLine(line.to_owned()))?;

            // Empty repository placeholder, and peeled tags.
            if name == "capabilities^{}" || name.ends_with("^{}") {
                continue;
            }
            adv.refs.insert(name.to_owned(), Ref::Direct(oid));
        }

        let symrefs: Vec<(String, String)> = adv
            .symrefs()
            .map(|(from, to)| (from.to_owned(), to.to_owned()))
            .collect();
        for (from, to) in symrefs {
            adv.refs.insert(from, Ref::Symbolic(to));
        }

        Ok(adv)
    }

    /// `symref=FROM:TO` capabilities.
    pub fn symrefs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.capabilities
            .iter()
            .filter_map(|c| c.strip_prefix("symref="))
            .filter_map(|s| s.split_once(':'))
    }

    /// Full ref name that `HEAD` points at.
    ///
    /// Uses the symbolic `HEAD` when the server advertised one. Otherwise
    /// guesses from object ids: `refs/heads/master` if it matches, else
    /// the first branch (by name) that does.
    #[must_use]
    pub fn head_target(&self) -> Option<&str> {
        match self.refs.get(HEAD)? {
            Ref::Symbolic(target) => Some(target.as_str()),
            Ref::Direct(head) => {
                let master = "refs/heads/master";
                if self.refs.get(master) == Some(&Ref::Direct(head.clone())) {
                    return Some(master);
                }
                self.refs.iter().find_map(|(name, r)| match r {
                    Ref::Direct(oid) if oid == head && name.starts_with(REFS_HEADS) => {
                        Some(name.as_str())
                    },
                    _ => None,
                })
            },
        }
    }

    /// Short name of the default branch (`main` for `refs/heads/main`).
    #[must_use]
    pub fn default_branch(&self) -> Option<&str> {
        self.head_target().map(|t| branch_name(t).unwrap_or(t))
    }
}

/// Read an advertisement from a stream, skipping the smart-HTTP
/// `# service=` preamble when present.
///
/// # Errors
///
/// Returns an error on framing problems, `ERR` packets and malformed lines.
pub async fn read_advertisement<R: AsyncRead + Unpin>(
    reader: &mut PktLineReader<R>,
) -> Result<AdvertisedRefs, AdvertisementError> {
    let mut lines = Vec::new();

    match reader.read().await? {
        Some(PktLine::Data(first)) if first.starts_with(b"# service=") => {
            reader.read_until_flush().await?;
        },
        Some(PktLine::Data(first)) => lines.push(first),
        Some(PktLine::Flush | PktLine::ResponseEnd) | None => return Ok(AdvertisedRefs::default()),
        Some(PktLine::Delimiter) => {},
    }

    lines.extend(reader.read_until_flush().await?);
    AdvertisedRefs::parse(&lines)
}
