//! Interface of the deployed GIF portal program.
//!
//! The program is an Anchor program, so its wire conventions are fixed:
//! every instruction starts with `sha256("global:<name>")[..8]`, every
//! account with `sha256("account:<Type>")[..8]`, and the rest is Borsh.
//! These layouts mirror the program's Rust definitions byte for byte.
//!
//! The layout assumes the deployment whose `ItemStruct` carries
//! `comment: Option<String>` after `user_address`, and whose `add_gif`
//! takes the comment as its second argument. A deployment without the
//! comment field stores items as `gif_link, user_address` only. A single
//! such item still decodes, its option tag read from the zeroed tail of the
//! allocation, but from the second item on the next link's length prefix
//! lands on the tag and decoding fails with `InvalidOptionTag`.
//! `fetch_list` reports that as an error, never as an empty list.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::keys::{Pubkey, PUBKEY_LEN};

/// Devnet deployment of the portal program.
pub const PROGRAM_ID: &str = "6NthZpToN6MSrbnSir1e8oYioV6Ko1cTSqPip6gXaYiz";

pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

pub const IX_START_STUFF_OFF: &str = "start_stuff_off";
pub const IX_ADD_GIF: &str = "add_gif";
pub const IX_CLEAR_GIFS: &str = "clear_gifs";

pub const BASE_ACCOUNT_TYPE: &str = "BaseAccount";

pub const DISCRIMINATOR_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("account discriminator mismatch")]
    Discriminator,

    #[error("unexpected end of data at offset {0}")]
    UnexpectedEof(usize),

    #[error("invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    #[error("invalid option tag {tag} at offset {offset}")]
    InvalidOptionTag { tag: u8, offset: usize },
}

pub fn instruction_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("global", name)
}

pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("account", name)
}

fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    out
}

/// One submission as stored in the program account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStruct {
    pub gif_link: String,
    pub user_address: Pubkey,
    pub comment: Option<String>,
}

/// The storage account created by `start_stuff_off`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BaseAccount {
    pub total_gifs: u64,
    pub gif_list: Vec<ItemStruct>,
}

impl BaseAccount {
    /// Decode raw account data, discriminator included. Trailing bytes are
    /// the unused part of the fixed-size allocation and are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(DecodeError::UnexpectedEof(data.len()));
        }
        if data[..DISCRIMINATOR_LEN] != account_discriminator(BASE_ACCOUNT_TYPE) {
            return Err(DecodeError::Discriminator);
        }

        let mut r = Reader::new(data, DISCRIMINATOR_LEN);
        let total_gifs = r.u64()?;
        let len = r.u32()? as usize;
        let mut gif_list = Vec::with_capacity(len.min(256));
        for _ in 0..len {
            gif_list.push(ItemStruct {
                gif_link: r.string()?,
                user_address: r.pubkey()?,
                comment: r.option_string()?,
            });
        }
        Ok(Self { total_gifs, gif_list })
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut w = Writer::with_discriminator(account_discriminator(BASE_ACCOUNT_TYPE));
        w.u64(self.total_gifs);
        w.u32(self.gif_list.len() as u32);
        for item in &self.gif_list {
            w.string(&item.gif_link);
            w.bytes(item.user_address.as_bytes());
            w.option_string(item.comment.as_deref());
        }
        w.finish()
    }
}

pub fn start_stuff_off_data() -> Vec<u8> {
    instruction_discriminator(IX_START_STUFF_OFF).to_vec()
}

pub fn add_gif_data(gif_link: &str, comment: Option<&str>) -> Vec<u8> {
    let mut w = Writer::with_discriminator(instruction_discriminator(IX_ADD_GIF));
    w.string(gif_link);
    w.option_string(comment);
    w.finish()
}

pub fn clear_gifs_data() -> Vec<u8> {
    instruction_discriminator(IX_CLEAR_GIFS).to_vec()
}

// ---------------------------------------------------------------------------
// Borsh primitives
// ---------------------------------------------------------------------------

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn with_discriminator(disc: [u8; DISCRIMINATOR_LEN]) -> Self {
        Self { buf: disc.to_vec() }
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[cfg(test)]
    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    fn string(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.bytes(s.as_bytes());
    }

    fn option_string(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.buf.push(1);
                self.string(s);
            }
            None => self.buf.push(0),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::UnexpectedEof(self.pos))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        let mut b = [0u8; 4];
        b.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(b))
    }

    fn u64(&mut self) -> Result<u64, DecodeError> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(b))
    }

    fn pubkey(&mut self) -> Result<Pubkey, DecodeError> {
        let mut b = [0u8; PUBKEY_LEN];
        b.copy_from_slice(self.take(PUBKEY_LEN)?);
        Ok(Pubkey::new_from_array(b))
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.u32()? as usize;
        let start = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8(start))
    }

    fn option_string(&mut self) -> Result<Option<String>, DecodeError> {
        let offset = self.pos;
        match self.u8()? {
            0 => Ok(None),
            1 => self.string().map(Some),
            tag => Err(DecodeError::InvalidOptionTag { tag, offset }),
        }
    }
}
