pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m020251102_000001_initial_tables;
mod m020251214_000001_registrations;
mod m20260125_000001_conversion_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m020251102_000001_initial_tables::Migration),
            Box::new(m020251214_000001_registrations::Migration),
            Box::new(m20260125_000001_conversion_indexes::Migration),
        ]
    }
}
