//! Canonical encoding of wrapped-key lists.
//!
//! The encoding is deterministic regardless of the order entries appear in
//! [`Metadata`](eepack_core::Metadata), so it can be signed and re-derived by
//! any reader.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Count: u32 BE                                │
//! ├──────────────────────────────────────────────┤
//! │ Entry (sorted by user name bytes), repeated: │
//! │   User length: u16 BE                        │
//! │   User name (UTF-8)                          │
//! │   Key length: u16 BE                         │
//! │   Wrapped key                                │
//! └──────────────────────────────────────────────┘
//! ```

use eepack_core::{PackError, PackResult, UserName, WrappedKey};

/// Encode a wrapped-key list canonically.
///
/// Fails with `InvalidMetadata` on duplicate users or oversized fields.
pub fn encode_wrapped_keys(keys: &[WrappedKey]) -> PackResult<Vec<u8>> {
    let mut sorted: Vec<&WrappedKey> = keys.iter().collect();
    sorted.sort_by(|a, b| a.user.as_bytes().cmp(b.user.as_bytes()));

    if let Some(pair) = sorted.windows(2).find(|w| w[0].user == w[1].user) {
        return Err(PackError::InvalidMetadata(format!(
            "duplicate wrapped key for {}",
            pair[0].user
        )));
    }

    let count = u32::try_from(sorted.len())
        .map_err(|_| PackError::InvalidMetadata("too many wrapped keys".to_string()))?;

    let mut out = Vec::with_capacity(4 + sorted.len() * 96);
    out.extend_from_slice(&count.to_be_bytes());
    for entry in sorted {
        put_field(&mut out, entry.user.as_bytes(), "user name")?;
        put_field(&mut out, &entry.key, "wrapped key")?;
    }
    Ok(out)
}

/// Decode a canonical wrapped-key list.
///
/// Packers only ever encode; this is for tools that persist or inspect the
/// signed form, such as `eepack readers`.
///
/// Rejects truncation, trailing bytes, invalid user names, unsorted input,
/// and duplicate users.
pub fn decode_wrapped_keys(data: &[u8]) -> PackResult<Vec<WrappedKey>> {
    let mut reader = Reader { data, pos: 0 };

    let count = u32::from_be_bytes(
        reader
            .take(4)?
            .try_into()
            .map_err(|_| truncated())?,
    ) as usize;

    // Each entry needs at least 4 bytes of length prefixes.
    if count > data.len() / 4 {
        return Err(PackError::InvalidMetadata(format!(
            "count {} exceeds available data",
            count
        )));
    }

    let mut keys: Vec<WrappedKey> = Vec::with_capacity(count);
    for _ in 0..count {
        let user_bytes = reader.take_field()?;
        let user_str = std::str::from_utf8(user_bytes)
            .map_err(|_| PackError::InvalidMetadata("user name is not UTF-8".to_string()))?;
        let user = UserName::parse(user_str)
            .map_err(|e| PackError::InvalidMetadata(e.to_string()))?;
        let key = reader.take_field()?.to_vec();

        if let Some(prev) = keys.last() {
            if prev.user.as_bytes() >= user.as_bytes() {
                return Err(PackError::InvalidMetadata(format!(
                    "entries not in canonical order at {}",
                    user
                )));
            }
        }
        keys.push(WrappedKey { user, key });
    }

    if reader.pos != data.len() {
        return Err(PackError::InvalidMetadata(format!(
            "{} trailing bytes after wrapped keys",
            data.len() - reader.pos
        )));
    }
    Ok(keys)
}

fn put_field(out: &mut Vec<u8>, bytes: &[u8], what: &str) -> PackResult<()> {
    let len = u16::try_from(bytes.len())
        .map_err(|_| PackError::InvalidMetadata(format!("{} too long", what)))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

fn truncated() -> PackError {
    PackError::InvalidMetadata("wrapped key list is truncated".to_string())
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> PackResult<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or_else(truncated)?;
        let slice = self.data.get(self.pos..end).ok_or_else(truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn take_field(&mut self) -> PackResult<&'a [u8]> {
        let len = self.take(2)?;
        let len = u16::from_be_bytes([len[0], len[1]]) as usize;
        self.take(len)
    }
}
