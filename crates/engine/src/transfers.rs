//! Transfer ledger entries.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, util};

/// Money moved between two wallets of the same user.
///
/// Contributes `-amount_minor` to `from_wallet_id` and `+amount_minor` to
/// `to_wallet_id`. During recalculation the two endpoints are judged
/// independently, so a transfer whose counterpart wallet was deleted still
/// applies on the surviving side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub from_wallet_id: Uuid,
    pub to_wallet_id: Uuid,
    pub amount_minor: i64,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Transfer {
    pub fn new(
        from_wallet_id: Uuid,
        to_wallet_id: Uuid,
        amount_minor: i64,
        currency: Currency,
        occurred_at: DateTime<Utc>,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        if from_wallet_id == to_wallet_id {
            return Err(EngineError::InvalidAmount(
                "from_wallet_id and to_wallet_id must differ".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            from_wallet_id,
            to_wallet_id,
            amount_minor: util::validate_entry_amount(amount_minor)?,
            currency,
            occurred_at,
            note,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub from_wallet_id: String,
    pub to_wallet_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub occurred_at: DateTimeUtc,
    pub note: Option<String>,
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transfer> for ActiveModel {
    fn from(value: &Transfer) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            from_wallet_id: ActiveValue::Set(value.from_wallet_id.to_string()),
            to_wallet_id: ActiveValue::Set(value.to_wallet_id.to_string()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            occurred_at: ActiveValue::Set(value.occurred_at),
            note: ActiveValue::Set(value.note.clone()),
            user_id: ActiveValue::NotSet,
        }
    }
}

impl TryFrom<Model> for Transfer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: util::parse_uuid(&model.id, "transfer")?,
            from_wallet_id: util::parse_uuid(&model.from_wallet_id, "wallet")?,
            to_wallet_id: util::parse_uuid(&model.to_wallet_id, "wallet")?,
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
    fn rejects_same_endpoint() {
        let wallet_id = Uuid::new_v4();
        let err = Transfer::new(
            wallet_id,
            wallet_id,
            100,
            Currency::Eur,
            Utc.timestamp_opt(0, 0).unwrap(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
