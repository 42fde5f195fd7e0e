//! Initial schema migration - creates all tables from scratch.
//!
//! The schema mirrors the per-user collections of the tracker:
//!
//! - `users`: ownership scoping (username only, no credentials here)
//! - `wallets`: money locations with a denormalized running balance
//! - `incomes` / `outcomes`: single-wallet ledger entries
//! - `transfers`: two-wallet ledger entries
//!
//! The ledger tables deliberately carry **no** foreign key to `wallets`:
//! wallets can be hard-deleted while their history stays behind, and the
//! recalculation routine reports those rows as orphans.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    Name,
    Balance,
    Currency,
    Archived,
    UserId,
}

#[derive(Iden)]
enum Incomes {
    Table,
    Id,
    WalletId,
    AmountMinor,
    Currency,
    OccurredAt,
    Note,
    UserId,
}

#[derive(Iden)]
enum Outcomes {
    Table,
    Id,
    WalletId,
    AmountMinor,
    Currency,
    OccurredAt,
    Note,
    UserId,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    FromWalletId,
    ToWalletId,
    AmountMinor,
    Currency,
    OccurredAt,
    Note,
    UserId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wallets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wallets::Name).string().not_null())
                    .col(
                        ColumnDef::new(Wallets::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::Currency)
                            .string()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(
                        ColumnDef::new(Wallets::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Wallets::UserId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallets-user_id")
                            .from(Wallets::Table, Wallets::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallets-user_id")
                    .table(Wallets::Table)
                    .col(Wallets::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Incomes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Incomes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Incomes::WalletId).string().not_null())
                    .col(ColumnDef::new(Incomes::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Incomes::Currency).string().not_null())
                    .col(ColumnDef::new(Incomes::OccurredAt).timestamp().not_null())
                    .col(ColumnDef::new(Incomes::Note).string())
                    .col(ColumnDef::new(Incomes::UserId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-incomes-user_id")
                            .from(Incomes::Table, Incomes::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-incomes-user_id")
                    .table(Incomes::Table)
                    .col(Incomes::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Outcomes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Outcomes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Outcomes::WalletId).string().not_null())
                    .col(
                        ColumnDef::new(Outcomes::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Outcomes::Currency).string().not_null())
                    .col(ColumnDef::new(Outcomes::OccurredAt).timestamp().not_null())
                    .col(ColumnDef::new(Outcomes::Note).string())
                    .col(ColumnDef::new(Outcomes::UserId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-outcomes-user_id")
                            .from(Outcomes::Table, Outcomes::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-outcomes-user_id")
                    .table(Outcomes::Table)
                    .col(Outcomes::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::FromWalletId).string().not_null())
                    .col(ColumnDef::new(Transfers::ToWalletId).string().not_null())
                    .col(
                        ColumnDef::new(Transfers::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transfers::Currency).string().not_null())
                    .col(ColumnDef::new(Transfers::OccurredAt).timestamp().not_null())
                    .col(ColumnDef::new(Transfers::Note).string())
                    .col(ColumnDef::new(Transfers::UserId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-user_id")
                            .from(Transfers::Table, Transfers::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-user_id")
                    .table(Transfers::Table)
                    .col(Transfers::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Outcomes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Incomes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
