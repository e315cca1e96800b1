use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind, TransferCmd,
    locks::AccountKey,
    transactions::Parties,
    util::{normalize_code, normalize_username},
};

use super::{Engine, with_tx};

/// Both log entries written by a successful transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Sender side, negative amount.
    pub outgoing: Transaction,
    /// Recipient side, positive amount.
    pub incoming: Transaction,
}

impl Engine {
    /// Move `amount_minor` of a currency from the caller to another user.
    ///
    /// Checks run in order and the first failure wins: positive amount,
    /// known sender and recipient, distinct parties, sender holds the
    /// currency, sender has enough funds. On success the sender is debited,
    /// the recipient credited (opening an account if needed) and two
    /// transactions sharing one timestamp are logged. Nothing is written on
    /// failure.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        let TransferCmd {
            from_identity,
            to_username,
            amount_minor,
            currency_code,
        } = cmd;

        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        let code = normalize_code(&currency_code)?;
        let to_username = normalize_username(&to_username)?;

        let sender = self.require_active_user(&self.database, from_identity).await?;
        let recipient = self
            .require_active_user_by_username(&self.database, &to_username)
            .await?;
        if sender.identity == recipient.identity {
            return Err(EngineError::SelfTransfer(format!(
                "user {} cannot transfer to themselves",
                sender.identity
            )));
        }

        let _guards = self
            .locks
            .acquire([
                AccountKey::new(sender.identity, &code),
                AccountKey::new(recipient.identity, &code),
            ])
            .await;

        let receipt = with_tx!(self, |db_tx| {
            // Re-read both parties: either may have changed before the locks
            // were granted.
            let sender = self.require_active_user(&db_tx, sender.identity).await?;
            let recipient = self
                .require_active_user(&db_tx, recipient.identity)
                .await?;
            if !recipient.username.eq_ignore_ascii_case(&to_username) {
                return Err(EngineError::KeyNotFound(format!("user {to_username}")));
            }

            let sender_account = self
                .find_account(&db_tx, sender.id, &code)
                .await?
                .ok_or_else(|| {
                    EngineError::CurrencyNotHeld(format!(
                        "user {} holds no {code}",
                        sender.identity
                    ))
                })?;
            if sender_account.amount_minor < amount_minor {
                return Err(EngineError::InsufficientFunds(format!(
                    "user {} has {} {code}, needs {amount_minor}",
                    sender.identity, sender_account.amount_minor
                )));
            }

            let now = Utc::now();
            let recipient_account = self
                .get_or_create_account(&db_tx, &recipient, &code, now)
                .await?;
            let sender_account = self
                .adjust_balance(&db_tx, &sender_account, -amount_minor, now)
                .await?;
            let recipient_account = self
                .adjust_balance(&db_tx, &recipient_account, amount_minor, now)
                .await?;

            let parties = Parties {
                from: &sender,
                to: &recipient,
            };
            let outgoing = Transaction::new(
                &sender,
                sender_account.id,
                &code,
                -amount_minor,
                TransactionKind::TransferOut,
                &parties,
                now,
                sender_account.amount_minor,
            );
            let incoming = Transaction::new(
                &recipient,
                recipient_account.id,
                &code,
                amount_minor,
                TransactionKind::TransferIn,
                &parties,
                now,
                recipient_account.amount_minor,
            );
            self.append_transaction(&db_tx, &outgoing).await?;
            self.append_transaction(&db_tx, &incoming).await?;

            Ok(TransferReceipt { outgoing, incoming })
        });

        match &receipt {
            Ok(receipt) => tracing::info!(
                "transfer {} {code}: {} -> {}",
                amount_minor,
                receipt.outgoing.from_identity,
                receipt.outgoing.to_identity
            ),
            Err(err) => tracing::warn!("transfer from {from_identity} rejected: {err}"),
        }
        receipt
    }
}
