use sea_orm_migration::prelude::*;

mod m20250101_create_weather_records;
mod m20250102_add_city_created_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_create_weather_records::Migration),
            Box::new(m20250102_add_city_created_index::Migration),
        ]
    }
}
