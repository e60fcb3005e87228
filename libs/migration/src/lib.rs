pub use sea_orm_migration::prelude::*;

mod m20261016_000000_bootstrap;
mod m20261016_000001_create_users;
mod m20261016_000002_create_categories;
mod m20261016_000003_create_todos;
mod m20261016_000004_create_subtasks;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261016_000000_bootstrap::Migration),
            Box::new(m20261016_000001_create_users::Migration),
            Box::new(m20261016_000002_create_categories::Migration),
            Box::new(m20261016_000003_create_todos::Migration),
            Box::new(m20261016_000004_create_subtasks::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 5);
    }
}
