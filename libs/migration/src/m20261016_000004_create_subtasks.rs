use sea_orm_migration::{prelude::*, schema::*};

use crate::m20261016_000003_create_todos::Todos;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subtasks::Table)
                    .if_not_exists()
                    .col(pk_auto(Subtasks::Id))
                    .col(string(Subtasks::Title))
                    .col(boolean(Subtasks::IsCompleted).default(false))
                    .col(integer(Subtasks::TodoId))
                    .col(
                        timestamp_with_time_zone(Subtasks::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subtasks_todo_id")
                            .from(Subtasks::Table, Subtasks::TodoId)
                            .to(Todos::Table, Todos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subtasks_todo_id")
                    .table(Subtasks::Table)
                    .col(Subtasks::TodoId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subtasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Subtasks {
    Table,
    Id,
    Title,
    IsCompleted,
    TodoId,
    CreatedAt,
}
