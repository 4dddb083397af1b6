//! Account book execution target
//!
//! Holds the wallet's treasury and the balances of everyone it has paid.
//! Executing a transaction moves `value` out of the treasury to the
//! destination and records the payload as delivered.

use crate::core::Address;
use crate::multisig::{ExecutionRequest, ExecutionTarget, TargetError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A payload handed to its destination
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Delivery {
    pub index: u64,
    pub destination: Address,
    pub value: u128,
    #[serde(with = "hex")]
    pub payload: Vec<u8>,
    pub delivered_at: DateTime<Utc>,
}

/// Treasury plus recipient balances
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BalanceBook {
    treasury: u128,
    balances: HashMap<Address, u128>,
    deliveries: Vec<Delivery>,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add funds to the treasury
    pub fn deposit(&mut self, amount: u128) -> u128 {
        self.treasury = self.treasury.saturating_add(amount);
        log::info!("Treasury deposit: {} (balance {})", amount, self.treasury);
        self.treasury
    }

    pub fn treasury(&self) -> u128 {
        self.treasury
    }

    pub fn balance_of(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Payloads delivered so far, oldest first
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }
}

impl ExecutionTarget for BalanceBook {
    fn apply(&mut self, request: &ExecutionRequest) -> Result<(), TargetError> {
        if request.destination.is_null() {
            return Err(TargetError::new("cannot transfer to the null address"));
        }
        if self.treasury < request.value {
            return Err(TargetError::new(format!(
                "insufficient treasury balance: have {}, need {}",
                self.treasury, request.value
            )));
        }

        let credited = self
            .balance_of(&request.destination)
            .checked_add(request.value)
            .ok_or_else(|| TargetError::new("recipient balance overflow"))?;

        self.treasury -= request.value;
        self.balances.insert(request.destination.clone(), credited);
        self.deliveries.push(Delivery {
            index: request.index,
            destination: request.destination.clone(),
            value: request.value,
            payload: request.payload.clone(),
            delivered_at: Utc::now(),
        });

        log::info!(
            "Transferred {} to {} for transaction {}",
            request.value,
            request.destination,
            request.index
        );
        Ok(())
    }
}
