//! SPL token ledger
//!
//! Reads balances and delegations from associated token accounts and moves
//! delegated tokens with the sweeper's delegate keypair.

use solana_client::client_error::ClientError;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use spl_token::solana_program::{program_option::COption, program_pack::Pack};
use spl_token::state::Account as TokenAccount;
use tracing::{debug, info};

use super::{AccountId, AssetId, AssetLedger, LedgerError};

/// SPL ledger options
#[derive(Debug, Clone)]
pub struct SplLedgerConfig {
    /// Create the destination's token account if it does not exist yet
    pub create_destination_accounts: bool,
}

impl Default for SplLedgerConfig {
    fn default() -> Self {
        Self {
            create_destination_accounts: true,
        }
    }
}

/// Asset ledger backed by SPL token accounts
pub struct SplTokenLedger {
    rpc_client: RpcClient,
    delegate: Keypair,
    config: SplLedgerConfig,
}

impl SplTokenLedger {
    /// Create a new SPL ledger. `delegate` signs every transfer and also pays fees.
    pub fn new(rpc_client: RpcClient, delegate: Keypair, config: SplLedgerConfig) -> Self {
        Self {
            rpc_client,
            delegate,
            config,
        }
    }

    /// Public key the source owners must have approved as delegate
    pub fn delegate_pubkey(&self) -> Pubkey {
        self.delegate.pubkey()
    }

    /// Fetch and decode the owner's associated token account for `mint`.
    ///
    /// Returns `None` when the account does not exist.
    fn token_account(
        &self,
        owner: &AccountId,
        mint: &AssetId,
    ) -> Result<Option<TokenAccount>, LedgerError> {
        let address = get_associated_token_address(owner, mint);

        let response = self
            .rpc_client
            .get_account_with_commitment(&address, self.rpc_client.commitment())
            .map_err(|e| LedgerError::Rpc(format!("Failed to fetch {}: {}", address, e)))?;

        let Some(account) = response.value else {
            debug!("Token account {} does not exist", address);
            return Ok(None);
        };

        if account.owner != spl_token::id() {
            return Err(LedgerError::Malformed(format!(
                "{} is owned by {}, not the token program",
                address, account.owner
            )));
        }

        let decoded = TokenAccount::unpack(&account.data)
            .map_err(|e| LedgerError::Malformed(format!("Cannot decode {}: {}", address, e)))?;

        if decoded.mint != *mint || decoded.owner != *owner {
            return Err(LedgerError::Malformed(format!(
                "{} does not belong to owner {} / mint {}",
                address, owner, mint
            )));
        }

        Ok(Some(decoded))
    }

    /// Build the instructions for one delegated transfer
    fn build_transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
        mint: &AssetId,
    ) -> Result<Vec<Instruction>, LedgerError> {
        let source = get_associated_token_address(from, mint);
        let destination = get_associated_token_address(to, mint);
        let mut instructions = Vec::with_capacity(2);

        if self.config.create_destination_accounts {
            instructions.push(create_associated_token_account_idempotent(
                &self.delegate.pubkey(),
                to,
                mint,
                &spl_token::id(),
            ));
        }

        let transfer = spl_token::instruction::transfer(
            &spl_token::id(),
            &source,
            &destination,
            &self.delegate.pubkey(),
            &[],
            amount,
        )
        .map_err(|e| LedgerError::Rejected(format!("Cannot build transfer: {}", e)))?;
        instructions.push(transfer);

        Ok(instructions)
    }

    fn send(&self, instructions: &[Instruction]) -> Result<Signature, LedgerError> {
        let blockhash = self
            .rpc_client
            .get_latest_blockhash()
            .map_err(|e| LedgerError::Rpc(format!("Failed to get blockhash: {}", e)))?;

        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.delegate.pubkey()),
            &[&self.delegate],
            blockhash,
        );

        self.rpc_client
            .send_and_confirm_transaction(&transaction)
            .map_err(classify_send_error)
    }
}

impl AssetLedger for SplTokenLedger {
    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Result<u64, LedgerError> {
        Ok(self
            .token_account(account, asset)?
            .map(|a| a.amount)
            .unwrap_or(0))
    }

    fn authorized_amount(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
    ) -> Result<u64, LedgerError> {
        let Some(account) = self.token_account(owner, asset)? else {
            return Ok(0);
        };
        Ok(delegated_to(&account, spender))
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
        asset: &AssetId,
    ) -> Result<bool, LedgerError> {
        debug!(
            "Executing token transfer: {} of mint {} from {} to {}",
            amount, asset, from, to
        );

        let instructions = self.build_transfer(from, to, amount, asset)?;
        let signature = self.send(&instructions)?;

        info!(
            "Token transfer confirmed: {} of mint {} to {} (sig: {})",
            amount, asset, to, signature
        );

        Ok(true)
    }
}

/// Amount delegated to `spender`, or zero when someone else (or nobody) is delegate
fn delegated_to(account: &TokenAccount, spender: &Pubkey) -> u64 {
    match account.delegate {
        COption::Some(delegate) if delegate == *spender => account.delegated_amount,
        _ => 0,
    }
}

/// A transaction error means the cluster refused the transfer. Anything else
/// (transport failure, confirmation timeout) leaves its fate unknown.
fn classify_send_error(e: ClientError) -> LedgerError {
    match e.get_transaction_error() {
        Some(tx_err) => LedgerError::Rejected(format!("Transfer failed: {}", tx_err)),
        None => LedgerError::Unavailable(format!("Transfer not confirmed: {}", e)),
    }
}
