use archivist::config::Settings;
use archivist::repository::run_all_migrations;

pub async fn cmd_migrate(settings: &Settings) -> anyhow::Result<()> {
    let db_path = settings.database_path();
    let tables = run_all_migrations(&db_path)?;

    println!("migrated database at {}", db_path.display());
    for table in &tables {
        println!("  {table}");
    }

    Ok(())
}
