#![allow(dead_code)]

use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{Engine, MoneyCents, RegisterCmd, Role, User};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// File backed store, so that concurrent tasks really use separate connections.
pub async fn engine_with_file_db() -> (Engine, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    (engine, path)
}

pub async fn register(engine: &Engine, name: &str) -> User {
    engine
        .register(RegisterCmd {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password: "password".to_string(),
        })
        .await
        .unwrap()
}

pub async fn register_admin(engine: &Engine, name: &str) -> User {
    let user = register(engine, name).await;
    engine.assign_role(&user.email, Role::Admin).await.unwrap()
}

pub fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}
