use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::entity::{category, importation, product};

/// Categories available on a fresh deployment.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Books",
    "Clothing",
    "Electronics",
    "Groceries",
    "Home",
    "Toys",
];

/// Seed the `category` table with defaults. Existing names are left alone.
pub async fn seed_categories(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for &name in DEFAULT_CATEGORIES {
        let model = category::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        let result = category::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(category::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(rows) if rows > 0 => inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new categories", inserted);
    }

    Ok(())
}

/// Ensure foreign-key lookup indexes exist.
///
/// Schema sync creates the foreign keys but not the indexes backing them.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes = [
        Index::create()
            .if_not_exists()
            .name("idx_product_category")
            .table(product::Entity)
            .col(product::Column::CategoryId)
            .to_string(PostgresQueryBuilder),
        Index::create()
            .if_not_exists()
            .name("idx_importation_user")
            .table(importation::Entity)
            .col(importation::Column::UserId)
            .col(importation::Column::CreatedAt)
            .to_string(PostgresQueryBuilder),
    ];

    for stmt in indexes {
        if let Err(e) = db.execute_unprepared(&stmt).await {
            tracing::warn!("Failed to create index: {}", e);
        }
    }

    info!("Ensured catalog indexes exist");
    Ok(())
}
