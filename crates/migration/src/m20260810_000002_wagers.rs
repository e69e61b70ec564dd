use sea_orm_migration::prelude::*;

use crate::m20260810_000001_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Wagers {
    Table,
    Id,
    CommunityId,
    ChannelId,
    MessageId,
    CreatorId,
    Amount,
    Description,
    CreatedAt,
    TakerId,
    Accepted,
    Completed,
    WinnerId,
    LoserId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Wagers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wagers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wagers::CommunityId).big_integer().not_null())
                    .col(ColumnDef::new(Wagers::ChannelId).big_integer().not_null())
                    .col(ColumnDef::new(Wagers::MessageId).big_integer())
                    .col(ColumnDef::new(Wagers::CreatorId).big_integer().not_null())
                    .col(ColumnDef::new(Wagers::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Wagers::Description).string().not_null())
                    .col(ColumnDef::new(Wagers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Wagers::TakerId).big_integer())
                    .col(ColumnDef::new(Wagers::Accepted).boolean().not_null())
                    .col(ColumnDef::new(Wagers::Completed).boolean().not_null())
                    .col(ColumnDef::new(Wagers::WinnerId).big_integer())
                    .col(ColumnDef::new(Wagers::LoserId).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wagers-creator_id")
                            .from(Wagers::Table, Wagers::CreatorId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wagers-taker_id")
                            .from(Wagers::Table, Wagers::TakerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Marker events correlate by announcement message id.
        manager
            .create_index(
                Index::create()
                    .name("idx-wagers-message_id")
                    .table(Wagers::Table)
                    .col(Wagers::MessageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wagers-creator_id-completed")
                    .table(Wagers::Table)
                    .col(Wagers::CreatorId)
                    .col(Wagers::Completed)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wagers-taker_id-completed")
                    .table(Wagers::Table)
                    .col(Wagers::TakerId)
                    .col(Wagers::Completed)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Wagers::Table).to_owned())
            .await
    }
}
