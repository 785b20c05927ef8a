// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::{short_address, strip_0x};
use crate::domain::error::AppError;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::str::FromStr;

/// Wallet identity: signing key plus the address derived from it.
#[derive(Clone)]
pub struct Account {
    signer: PrivateKeySigner,
    address: Address,
    label: String,
}

impl Account {
    pub fn from_private_key(raw: &str) -> Result<Self, AppError> {
        let signer = PrivateKeySigner::from_str(strip_0x(raw.trim()))
            .map_err(|e| AppError::Config(format!("Invalid private key: {e}")))?;
        Ok(Self::from_signer(signer))
    }

    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self {
            label: short_address(&address),
            signer,
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

// Never print key material.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish()
    }
}
