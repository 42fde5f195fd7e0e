use std::collections::HashMap;

use serde::Serialize;

use sea_orm::{QueryFilter, Statement, prelude::*};

use crate::{Currency, ResultEngine, util, wallets};

use super::Engine;

/// Summary numbers for one currency of a user.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct CurrencyTotals {
    /// Summed running balances of the active wallets.
    pub balance_minor: i64,
    /// Lifetime income total from the ledger.
    pub income_minor: i64,
    /// Lifetime outcome total from the ledger.
    pub outcome_minor: i64,
}

impl Engine {
    /// Returns per-currency totals for a user.
    ///
    /// Transfers move money between wallets of the same currency and are
    /// excluded from the income/outcome totals. Archived wallets are
    /// excluded from the balance total.
    pub async fn user_statistics(
        &self,
        user_id: &str,
    ) -> ResultEngine<HashMap<Currency, CurrencyTotals>> {
        self.require_user(&self.database, user_id).await?;

        let mut totals: HashMap<Currency, CurrencyTotals> = HashMap::new();

        let wallet_models = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .filter(wallets::Column::Archived.eq(false))
            .all(&self.database)
            .await?;
        for model in wallet_models {
            let currency = util::model_currency(&model.currency)?;
            totals.entry(currency).or_default().balance_minor += model.balance;
        }

        let backend = self.database.get_database_backend();
        for (table, is_income) in [("incomes", true), ("outcomes", false)] {
            let stmt = Statement::from_sql_and_values(
                backend,
                format!(
                    "SELECT currency, COALESCE(SUM(amount_minor), 0) AS sum \
                     FROM {table} \
                     WHERE user_id = ? \
                     GROUP BY currency"
                ),
                vec![user_id.into()],
            );
            for row in self.database.query_all(stmt).await? {
                let currency_code: String = row.try_get("", "currency")?;
                let sum: i64 = row.try_get("", "sum")?;
                let currency = util::model_currency(&currency_code)?;
                let entry = totals.entry(currency).or_default();
                if is_income {
                    entry.income_minor = sum;
                } else {
                    entry.outcome_minor = sum;
                }
            }
        }

        Ok(totals)
    }
}
