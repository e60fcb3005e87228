use sea_orm::entity::prelude::*;

use crate::models::SubTask;

/// Sea-ORM Entity for the subtasks table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subtasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub is_completed: bool,
    pub todo_id: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::todo::Entity",
        from = "Column::TodoId",
        to = "super::todo::Column::Id",
        on_delete = "Cascade"
    )]
    Todo,
}

impl Related<super::todo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Todo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SubTask {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            is_completed: model.is_completed,
            todo_id: model.todo_id,
            created_at: model.created_at.into(),
        }
    }
}
