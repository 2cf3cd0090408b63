use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Binding::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Binding::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Binding::BackendId).string().not_null())
                    .col(
                        ColumnDef::new(Binding::RemoteAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Binding::IsPrimary)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Binding::Enabled)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Binding::CreatedAt).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(Binding::UserId)
                            .col(Binding::BackendId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Code::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Code::Code)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Code::Issuer).big_integer().not_null())
                    .col(ColumnDef::new(Code::DurationDays).big_integer().not_null())
                    .col(ColumnDef::new(Code::Kind).string().not_null())
                    .col(ColumnDef::new(Code::ConsumedBy).big_integer().null())
                    .col(ColumnDef::new(Code::ConsumedAt).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Profile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profile::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profile::AccountId).string().null())
                    .col(ColumnDef::new(Profile::AccountName).string().null())
                    .col(ColumnDef::new(Profile::Password).string().null())
                    .col(
                        ColumnDef::new(Profile::Level)
                            .string()
                            .not_null()
                            .default("unregistered"),
                    )
                    .col(ColumnDef::new(Profile::ExpiresAt).string().null())
                    .col(
                        ColumnDef::new(Profile::CreditDays)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Profile::CreatedAt).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Favorite::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Favorite::AccountId).string().not_null())
                    .col(ColumnDef::new(Favorite::BackendId).string().not_null())
                    .col(ColumnDef::new(Favorite::ItemId).string().not_null())
                    .col(ColumnDef::new(Favorite::ItemName).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(Favorite::AccountId)
                            .col(Favorite::BackendId)
                            .col(Favorite::ItemId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bindings_backend")
                    .table(Binding::Table)
                    .col(Binding::BackendId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_bindings_user_primary")
                    .table(Binding::Table)
                    .col(Binding::UserId)
                    .col(Binding::IsPrimary)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_favorites_account_backend")
                    .table(Favorite::Table)
                    .col(Favorite::AccountId)
                    .col(Favorite::BackendId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Favorite::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profile::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Code::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Binding::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Binding {
    #[sea_orm(iden = "bindings")]
    Table,
    UserId,
    BackendId,
    RemoteAccountId,
    IsPrimary,
    Enabled,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Code {
    #[sea_orm(iden = "codes")]
    Table,
    Code,
    Issuer,
    DurationDays,
    Kind,
    ConsumedBy,
    ConsumedAt,
}

#[derive(DeriveIden)]
enum Profile {
    #[sea_orm(iden = "profiles")]
    Table,
    UserId,
    AccountId,
    AccountName,
    Password,
    Level,
    ExpiresAt,
    CreditDays,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Favorite {
    #[sea_orm(iden = "favorites")]
    Table,
    AccountId,
    BackendId,
    ItemId,
    ItemName,
}
