//! Legacy Solana transaction building.
//!
//! Only what the portal needs: compile instructions into a message, collect
//! one signature per required signer, encode for `sendTransaction`.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{PortalError, Result};
use crate::keys::{Pubkey, SIGNATURE_LEN};

const MAX_TRANSACTION_LEN: usize = 1232;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: true }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: false }
    }
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled message: header, ordered account keys and instructions that
/// refer to those keys by index.
#[derive(Debug, Clone)]
pub struct Message {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: [u8; 32],
    instructions: Vec<CompiledInstruction>,
}

#[derive(Debug, Clone)]
struct CompiledInstruction {
    program_id_index: u8,
    accounts: Vec<u8>,
    data: Vec<u8>,
}

impl Message {
    /// Order accounts the way the runtime expects: writable signers (fee
    /// payer first), readonly signers, writable non-signers, readonly
    /// non-signers. Duplicate keys are merged, keeping the strongest role.
    pub fn compile(
        payer: &Pubkey,
        instructions: &[Instruction],
        recent_blockhash: [u8; 32],
    ) -> Result<Self> {
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::new(*payer, true)];
        let mut merge = |meta: AccountMeta| {
            if let Some(existing) = metas.iter_mut().find(|m| m.pubkey == meta.pubkey) {
                existing.is_signer |= meta.is_signer;
                existing.is_writable |= meta.is_writable;
            } else {
                metas.push(meta);
            }
        };
        for ix in instructions {
            for meta in &ix.accounts {
                merge(meta.clone());
            }
            merge(AccountMeta::new_readonly(ix.program_id, false));
        }

        // Stable sort keeps first-seen order within each class, so the payer
        // stays at index 0.
        metas.sort_by_key(|m| match (m.is_signer, m.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        if metas.len() > u8::MAX as usize {
            return Err(PortalError::Transaction("too many accounts".into()));
        }

        let count = |signer: bool, writable: bool| {
            metas
                .iter()
                .filter(|m| m.is_signer == signer && m.is_writable == writable)
                .count() as u8
        };
        let num_required_signatures = count(true, true) + count(true, false);
        let num_readonly_signed = count(true, false);
        let num_readonly_unsigned = count(false, false);

        let account_keys: Vec<Pubkey> = metas.iter().map(|m| m.pubkey).collect();
        let index_of = |key: &Pubkey| {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| PortalError::Transaction(format!("account {key} not in message")))
        };

        let instructions = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: index_of(&ix.program_id)?,
                    accounts: ix
                        .accounts
                        .iter()
                        .map(|m| index_of(&m.pubkey))
                        .collect::<Result<Vec<u8>>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..self.num_required_signatures as usize]
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(MAX_TRANSACTION_LEN);

        // Header
        msg.push(self.num_required_signatures);
        msg.push(self.num_readonly_signed);
        msg.push(self.num_readonly_unsigned);

        // Account keys
        append_shortvec(&mut msg, self.account_keys.len());
        for key in &self.account_keys {
            msg.extend_from_slice(key.as_bytes());
        }

        msg.extend_from_slice(&self.recent_blockhash);

        append_shortvec(&mut msg, self.instructions.len());
        for ix in &self.instructions {
            msg.push(ix.program_id_index);
            append_shortvec(&mut msg, ix.accounts.len());
            msg.extend_from_slice(&ix.accounts);
            append_shortvec(&mut msg, ix.data.len());
            msg.extend_from_slice(&ix.data);
        }
        msg
    }
}

/// A message plus one signature slot per required signer.
#[derive(Debug, Clone)]
pub struct Transaction {
    message: Message,
    message_bytes: Vec<u8>,
    signatures: Vec<Option<[u8; SIGNATURE_LEN]>>,
}

impl Transaction {
    pub fn new(message: Message) -> Self {
        let message_bytes = message.serialize();
        let signatures = vec![None; message.num_required_signatures as usize];
        Self { message, message_bytes, signatures }
    }

    /// The bytes every signer signs.
    pub fn message_bytes(&self) -> &[u8] {
        &self.message_bytes
    }

    pub fn add_signature(&mut self, signer: &Pubkey, signature: [u8; SIGNATURE_LEN]) -> Result<()> {
        let slot = self
            .message
            .signer_keys()
            .iter()
            .position(|k| k == signer)
            .ok_or_else(|| PortalError::Transaction(format!("{signer} is not a signer")))?;
        self.signatures[slot] = Some(signature);
        Ok(())
    }

    /// Base58 of the fee payer's signature, the transaction id.
    pub fn signature(&self) -> Option<String> {
        self.signatures
            .first()
            .copied()
            .flatten()
            .map(|sig| bs58::encode(sig).into_string())
    }

    /// Wire encoding: `[sig_count][signatures][message]`, base64.
    pub fn to_base64(&self) -> Result<String> {
        let mut tx = Vec::with_capacity(MAX_TRANSACTION_LEN);
        append_shortvec(&mut tx, self.signatures.len());
        for (i, sig) in self.signatures.iter().enumerate() {
            let sig = sig.ok_or_else(|| {
                PortalError::Transaction(format!(
                    "missing signature for {}",
                    self.message.account_keys[i]
                ))
            })?;
            tx.extend_from_slice(&sig);
        }
        tx.extend_from_slice(&self.message_bytes);

        if tx.len() > MAX_TRANSACTION_LEN {
            return Err(PortalError::Transaction(format!(
                "transaction too large: {} > {MAX_TRANSACTION_LEN}",
                tx.len()
            )));
        }
        Ok(STANDARD.encode(tx))
    }
}

/// Append a compact-u16 encoded value (Solana "shortvec").
fn append_shortvec(buf: &mut Vec<u8>, mut value: usize) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(b: u8) -> Pubkey {
        Pubkey::new_from_array([b; 32])
    }

    #[test]
    fn test_shortvec_encoding() {
        let mut buf = Vec::new();
        append_shortvec(&mut buf, 0);
        assert_eq!(buf, vec![0]);

        buf.clear();
        append_shortvec(&mut buf, 127);
        assert_eq!(buf, vec![127]);

        buf.clear();
        append_shortvec(&mut buf, 128);
        assert_eq!(buf, vec![0x80, 0x01]);

        buf.clear();
        append_shortvec(&mut buf, 0x3FFF);
        assert_eq!(buf, vec![0xFF, 0x7F]);
    }

    #[test]
    fn test_compile_orders_and_merges_accounts() {
        let payer = key(1);
        let base = key(2);
        let program = key(3);
        let system = Pubkey::default();

        let ix = Instruction {
            program_id: program,
            accounts: vec![
                AccountMeta::new(base, true),
                AccountMeta::new(payer, true),
                AccountMeta::new_readonly(system, false),
            ],
            data: vec![9],
        };
        let msg = Message::compile(&payer, &[ix], [0u8; 32]).unwrap();

        assert_eq!(msg.account_keys, vec![payer, base, system, program]);
        assert_eq!(msg.num_required_signatures, 2);
        assert_eq!(msg.num_readonly_signed, 0);
        assert_eq!(msg.num_readonly_unsigned, 2);
        assert_eq!(msg.signer_keys(), &[payer, base]);

        let bytes = msg.serialize();
        assert_eq!(&bytes[..4], &[2, 0, 2, 4]);
        // program index, 3 accounts (base, payer, system), 1 data byte
        assert_eq!(&bytes[bytes.len() - 7..], &[3, 3, 1, 0, 2, 1, 9]);
    }

    #[test]
    fn test_writable_flag_wins_on_merge() {
        let payer = key(1);
        let shared = key(5);
        let program = key(6);
        let ixs = [
            Instruction {
                program_id: program,
                accounts: vec![AccountMeta::new_readonly(shared, false)],
                data: vec![],
            },
            Instruction {
                program_id: program,
                accounts: vec![AccountMeta::new(shared, false)],
                data: vec![],
            },
        ];
        let msg = Message::compile(&payer, &ixs, [0u8; 32]).unwrap();
        assert_eq!(msg.account_keys, vec![payer, shared, program]);
        assert_eq!(msg.num_readonly_unsigned, 1);
    }

    #[test]
    fn test_unsigned_transaction_refuses_to_encode() {
        let payer = key(1);
        let ix = Instruction { program_id: key(2), accounts: vec![], data: vec![] };
        let msg = Message::compile(&payer, &[ix], [0u8; 32]).unwrap();
        let mut tx = Transaction::new(msg);
        assert!(tx.to_base64().is_err());
        assert!(tx.signature().is_none());

        tx.add_signature(&payer, [4u8; 64]).unwrap();
        assert!(tx.to_base64().is_ok());
        assert_eq!(tx.signature().unwrap(), bs58::encode([4u8; 64]).into_string());
        assert!(tx.add_signature(&key(9), [0u8; 64]).is_err());
    }
}
