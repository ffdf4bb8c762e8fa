//! Escrow state machine and transaction shaping.

use crate::{
    config::ContractConfig,
    error::{EscrowError, TransitionError},
    transactions::TransactionGroup,
    types::{Address, EscrowAction, EscrowSnapshot, SuggestedParams, Transaction},
};

/// Inner transactions issued by the contract when funds are released or refunded.
const PAYOUT_INNER_TRANSACTIONS: u64 = 1;

/// Composes unsigned transaction groups for escrow actions.
///
/// Holds no key material and performs no network calls.
#[derive(Debug, Clone, Default)]
pub struct ActionComposer {
    contract: ContractConfig,
}

impl ActionComposer {
    /// Creates a composer for the given contract ABI.
    pub fn new(contract: ContractConfig) -> Self {
        Self { contract }
    }

    /// Returns the contract configuration.
    pub fn contract(&self) -> &ContractConfig {
        &self.contract
    }

    /// Validates that `actor` may perform `action` on the escrow described by `snapshot`.
    ///
    /// The status is checked first, then the actor.
    pub fn check(
        &self,
        action: EscrowAction,
        snapshot: &EscrowSnapshot,
        actor: &Address,
    ) -> Result<(), TransitionError> {
        let current = snapshot.status();
        let required = action.required_status();
        if current != required {
            return Err(TransitionError::WrongStatus { action, current, required });
        }

        if !snapshot.is_client(actor) {
            return Err(TransitionError::NotClient {
                action,
                actor: *actor,
                client: snapshot.client_address,
            });
        }

        Ok(())
    }

    /// Composes the transaction group performing `action`.
    ///
    /// Preconditions are checked again, so a group is never built for a disallowed action.
    pub fn compose(
        &self,
        action: EscrowAction,
        snapshot: &EscrowSnapshot,
        actor: Address,
        params: &SuggestedParams,
    ) -> Result<TransactionGroup, EscrowError> {
        self.check(action, snapshot, &actor)?;

        let transactions = match action {
            EscrowAction::Approve => self.approve(snapshot, actor, params)?,
            EscrowAction::Cancel => self.cancel(snapshot, actor, params)?,
        };

        TransactionGroup::new(transactions)
    }

    fn approve(
        &self,
        snapshot: &EscrowSnapshot,
        actor: Address,
        params: &SuggestedParams,
    ) -> Result<Vec<Transaction>, EscrowError> {
        let method = &self.contract.approve_method;
        // payout target, empty until the contract records a freelancer
        let accounts = snapshot.freelancer_address.into_iter().collect();

        let mut transactions = Vec::with_capacity(2);
        if method.transaction_args() > 0 {
            let payment = Transaction::payment(
                actor,
                snapshot.application_id.address(),
                self.contract.approve_payment,
                params,
            );
            transactions.push(payment.with_suggested_fee(params, 0)?);
        }

        let call = Transaction::application_call(
            actor,
            snapshot.application_id,
            vec![method.selector().to_vec()],
            accounts,
            params,
        );
        transactions.push(call.with_suggested_fee(params, PAYOUT_INNER_TRANSACTIONS)?);

        Ok(transactions)
    }

    fn cancel(
        &self,
        snapshot: &EscrowSnapshot,
        actor: Address,
        params: &SuggestedParams,
    ) -> Result<Vec<Transaction>, EscrowError> {
        // refund target, which check() already matched against the actor
        let client = snapshot.client_address.unwrap_or(actor);

        let call = Transaction::application_call(
            actor,
            snapshot.application_id,
            vec![self.contract.cancel_method.selector().to_vec()],
            vec![client],
            params,
        );

        Ok(vec![call.with_suggested_fee(params, PAYOUT_INNER_TRANSACTIONS)?])
    }
}
