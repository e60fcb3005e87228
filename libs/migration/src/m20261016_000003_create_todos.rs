use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use crate::m20261016_000001_create_users::Users;
use crate::m20261016_000002_create_categories::Categories;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(TodoPriority::Enum)
                    .values([TodoPriority::Low, TodoPriority::Medium, TodoPriority::High])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Todos::Table)
                    .if_not_exists()
                    .col(pk_auto(Todos::Id))
                    .col(string(Todos::Title))
                    .col(text_null(Todos::Description))
                    .col(boolean(Todos::IsCompleted).default(false))
                    .col(
                        ColumnDef::new(Todos::Priority)
                            .enumeration(
                                TodoPriority::Enum,
                                [TodoPriority::Low, TodoPriority::Medium, TodoPriority::High],
                            )
                            .not_null()
                            .default("medium"),
                    )
                    .col(date_null(Todos::DueDate))
                    .col(boolean(Todos::HasReminder).default(false))
                    .col(integer(Todos::Progress).default(0))
                    .col(integer(Todos::UserId))
                    .col(integer_null(Todos::CategoryId))
                    .col(integer_null(Todos::ParentId))
                    .col(
                        timestamp_with_time_zone(Todos::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Todos::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Todos::Progress).between(0, 100))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todos_user_id")
                            .from(Todos::Table, Todos::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todos_category_id")
                            .from(Todos::Table, Todos::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todos_parent_id")
                            .from(Todos::Table, Todos::ParentId)
                            .to(Todos::Table, Todos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_todos_user_id", Todos::UserId),
            ("idx_todos_category_id", Todos::CategoryId),
            ("idx_todos_parent_id", Todos::ParentId),
            ("idx_todos_created_at", Todos::CreatedAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Todos::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER todos_touch_updated_at
                    BEFORE UPDATE ON todos
                    FOR EACH ROW
                    EXECUTE FUNCTION util.touch_updated_at()
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS todos_touch_updated_at ON todos")
            .await?;

        manager
            .drop_table(Table::drop().table(Todos::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(TodoPriority::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Todos {
    Table,
    Id,
    Title,
    Description,
    IsCompleted,
    Priority,
    DueDate,
    HasReminder,
    Progress,
    UserId,
    CategoryId,
    ParentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TodoPriority {
    #[sea_orm(iden = "todo_priority")]
    Enum,
    #[sea_orm(iden = "low")]
    Low,
    #[sea_orm(iden = "medium")]
    Medium,
    #[sea_orm(iden = "high")]
    High,
}
