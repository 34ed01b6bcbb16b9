pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_regions_table;
mod m20250301_000003_create_source_images_table;
mod m20250301_000004_create_analysis_requests_table;
mod m20250301_000005_create_results_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_regions_table::Migration),
            Box::new(m20250301_000003_create_source_images_table::Migration),
            Box::new(m20250301_000004_create_analysis_requests_table::Migration),
            Box::new(m20250301_000005_create_results_table::Migration),
        ]
    }
}
