use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::categories::{Category, NewCategory};

/// Sea-ORM Entity for the categories table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub user_id: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::todo::Entity")]
    Todos,
}

impl Related<super::todo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Todos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            color: model.color,
            icon: model.icon,
            user_id: model.user_id,
            created_at: model.created_at.into(),
        }
    }
}

impl From<NewCategory> for ActiveModel {
    fn from(input: NewCategory) -> Self {
        ActiveModel {
            name: Set(input.name),
            color: Set(input.color),
            icon: Set(input.icon),
            user_id: Set(input.user_id),
            ..Default::default()
        }
    }
}
