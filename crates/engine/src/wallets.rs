//! The module contains the `Wallet` struct and its persistence model.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, util};

/// A wallet.
///
/// A wallet is a representation of a real wallet, a bank account, a crypto
/// account or anything else where money is kept, denominated in a single
/// currency. `balance` is a denormalized running counter in minor units; the
/// authoritative value is the signed sum of all ledger entries referencing
/// the wallet, which [`Engine::recalculate`](crate::Engine::recalculate)
/// restores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Stable identifier, generated once and persisted so the wallet can be
    /// renamed without breaking ledger references.
    pub id: Uuid,
    pub name: String,
    pub balance: i64,
    pub currency: Currency,
    pub archived: bool,
}

impl Wallet {
    pub fn new(name: String, balance_minor: i64, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            balance: balance_minor,
            currency,
            archived: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub balance: i64,
    pub currency: String,
    pub archived: bool,
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            balance: ActiveValue::Set(value.balance),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            archived: ActiveValue::Set(value.archived),
            user_id: ActiveValue::NotSet,
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: util::parse_uuid(&model.id, "wallet")?,
            name: model.name,
            balance: model.balance,
            currency: util::model_currency(&model.currency)?,
            archived: model.archived,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(currency: &str) -> Model {
        Model {
            id: Uuid::new_v4().to_string(),
            name: "Cash".to_string(),
            balance: 1040,
            currency: currency.to_string(),
            archived: false,
            user_id: "alice".to_string(),
        }
    }

    #[test]
    fn maps_valid_model() {
        let wallet = Wallet::try_from(model("EUR")).unwrap();
        assert_eq!(wallet.name, "Cash");
        assert_eq!(wallet.balance, 1040);
        assert_eq!(wallet.currency, Currency::Eur);
        assert!(!wallet.archived);
    }

    #[test]
    fn rejects_unknown_currency() {
        let err = Wallet::try_from(model("DOGE")).unwrap_err();
        assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    }

    #[test]
    fn rejects_malformed_id() {
        let mut bad = model("EUR");
        bad.id = "not-a-uuid".to_string();
        let err = Wallet::try_from(bad).unwrap_err();
        assert!(matches!(err, EngineError::InvalidId(_)));
    }
}
