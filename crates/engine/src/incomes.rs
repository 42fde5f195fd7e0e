//! Income ledger entries.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, util};

/// Money entering a wallet: salary, refunds, gifts.
///
/// Contributes `+amount_minor` to the balance of `wallet_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Income {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount_minor: i64,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Income {
    pub fn new(
        wallet_id: Uuid,
        amount_minor: i64,
        currency: Currency,
        occurred_at: DateTime<Utc>,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            wallet_id,
            amount_minor: util::validate_entry_amount(amount_minor)?,
            currency,
            occurred_at,
            note,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "incomes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub wallet_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub occurred_at: DateTimeUtc,
    pub note: Option<String>,
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Income> for ActiveModel {
    fn from(value: &Income) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            wallet_id: ActiveValue::Set(value.wallet_id.to_string()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            occurred_at: ActiveValue::Set(value.occurred_at),
            note: ActiveValue::Set(value.note.clone()),
            user_id: ActiveValue::NotSet,
        }
    }
}

impl TryFrom<Model> for Income {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: util::parse_uuid(&model.id, "income")?,
            wallet_id: util::parse_uuid(&model.wallet_id, "wallet")?,
            amount_minor: util::validate_entry_amount(model.amount_minor)?,
            currency: util::model_currency(&model.currency)?,
            occurred_at: model.occurred_at,
            note: model.note,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn rejects_non_positive_amount() {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        assert!(Income::new(Uuid::new_v4(), 0, Currency::Eur, at, None).is_err());
        assert!(Income::new(Uuid::new_v4(), -10, Currency::Eur, at, None).is_err());
    }

    #[test]
    fn rejects_model_with_invalid_amount() {
        let model = Model {
            id: Uuid::new_v4().to_string(),
            wallet_id: Uuid::new_v4().to_string(),
            amount_minor: -5,
            currency: "EUR".to_string(),
            occurred_at: Utc.timestamp_opt(0, 0).unwrap(),
            note: None,
            user_id: "alice".to_string(),
        };
        let err = Income::try_from(model).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
