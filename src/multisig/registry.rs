//! Signer registry
//!
//! Tracks the ordered set of authorized signers. The registry never holds
//! fewer than [`MIN_SIGNERS`] entries, never a duplicate and never the null
//! identity.

use crate::core::{Address, MultisigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Smallest signer set a wallet may have
pub const MIN_SIGNERS: usize = 3;

/// Ordered signer list plus a membership index
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<Address>", into = "Vec<Address>")]
pub struct SignerRegistry {
    signers: Vec<Address>,
    members: HashSet<Address>,
}

impl SignerRegistry {
    /// Create a registry from an initial signer list
    ///
    /// # Errors
    /// `MinimumParticipantsViolation` for fewer than three signers,
    /// `InvalidParticipant` for a null entry, `DuplicateParticipant` for a
    /// repeated entry.
    pub fn new(signers: Vec<Address>) -> Result<Self> {
        if signers.len() < MIN_SIGNERS {
            return Err(MultisigError::MinimumParticipantsViolation {
                min: MIN_SIGNERS,
                have: signers.len(),
            });
        }

        let mut members = HashSet::with_capacity(signers.len());
        for signer in &signers {
            if signer.is_null() {
                return Err(MultisigError::InvalidParticipant(
                    "null identity cannot be a signer".to_string(),
                ));
            }
            if !members.insert(signer.clone()) {
                return Err(MultisigError::DuplicateParticipant(signer.clone()));
            }
        }

        Ok(Self { signers, members })
    }

    pub fn is_signer(&self, identity: &Address) -> bool {
        self.members.contains(identity)
    }

    /// Fail with `Unauthorized` unless `caller` is a current signer
    pub fn authorize(&self, caller: &Address) -> Result<()> {
        if self.is_signer(caller) {
            Ok(())
        } else {
            Err(MultisigError::Unauthorized(caller.clone()))
        }
    }

    /// Signers in registry order
    pub fn signers(&self) -> &[Address] {
        &self.signers
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Check that `candidate` may join the registry
    pub fn validate_add(&self, candidate: &Address) -> Result<()> {
        if candidate.is_null() {
            return Err(MultisigError::InvalidParticipant(
                "null identity cannot be a signer".to_string(),
            ));
        }
        if self.is_signer(candidate) {
            return Err(MultisigError::DuplicateParticipant(candidate.clone()));
        }
        Ok(())
    }

    /// Check that `target` may leave without dropping below `floor`
    pub fn validate_remove(&self, target: &Address, floor: usize) -> Result<()> {
        if !self.is_signer(target) {
            return Err(MultisigError::InvalidParticipant(format!(
                "{} is not a signer",
                target
            )));
        }
        if self.signers.len() <= floor {
            return Err(MultisigError::MinimumParticipantsViolation {
                min: floor,
                have: self.signers.len(),
            });
        }
        Ok(())
    }

    pub fn add(&mut self, signer: Address) -> Result<()> {
        self.validate_add(&signer)?;
        self.members.insert(signer.clone());
        self.signers.push(signer);
        Ok(())
    }

    /// Remove a signer; the last signer takes its slot
    pub fn remove(&mut self, target: &Address, floor: usize) -> Result<()> {
        self.validate_remove(target, floor)?;
        if let Some(pos) = self.signers.iter().position(|s| s == target) {
            self.signers.swap_remove(pos);
        }
        self.members.remove(target);
        Ok(())
    }

    /// Swap `old` for `new` in place, keeping the slot
    pub fn replace(&mut self, old: &Address, new: Address) -> Result<()> {
        if !self.is_signer(old) {
            return Err(MultisigError::InvalidParticipant(format!(
                "{} is not a signer",
                old
            )));
        }
        self.validate_add(&new)?;

        if let Some(slot) = self.signers.iter_mut().find(|s| *s == old) {
            *slot = new.clone();
        }
        self.members.remove(old);
        self.members.insert(new);
        Ok(())
    }
}

impl TryFrom<Vec<Address>> for SignerRegistry {
    type Error = MultisigError;

    fn try_from(signers: Vec<Address>) -> Result<Self> {
        Self::new(signers)
    }
}

impl From<SignerRegistry> for Vec<Address> {
    fn from(registry: SignerRegistry) -> Self {
        registry.signers
    }
}
