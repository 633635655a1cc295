#![allow(dead_code)]

use book_market_api::{
    config::AppConfig,
    entity::{
        AuditLogs, Books, CartItems, Categories, Favorites, OrderItems, Orders, Reviews, Users,
        books::ActiveModel as BookActive, categories::ActiveModel as CategoryActive,
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    models::{BookCondition, Role},
    state::AppState,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DbBackend, Schema, Set,
};
use uuid::Uuid;

/// Fresh in-memory database with every table created from the entities.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    // One connection: each in-memory SQLite connection is its own database.
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opts).await?;

    let schema = Schema::new(DbBackend::Sqlite);
    let backend = db.get_database_backend();
    let tables = [
        schema.create_table_from_entity(Users),
        schema.create_table_from_entity(Categories),
        schema.create_table_from_entity(Books),
        schema.create_table_from_entity(CartItems),
        schema.create_table_from_entity(Favorites),
        schema.create_table_from_entity(Orders),
        schema.create_table_from_entity(OrderItems),
        schema.create_table_from_entity(Reviews),
        schema.create_table_from_entity(AuditLogs),
    ];
    for stmt in &tables {
        db.execute(backend.build(stmt)).await?;
    }

    let config = AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
    };
    Ok(AppState::new(db, config))
}

pub async fn create_user(state: &AppState, name: &str, role: Role) -> anyhow::Result<AuthUser> {
    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(name.to_string()),
        email: Set(format!("{name}@example.com")),
        password_hash: Set("not-a-real-hash".into()),
        phone: Set("01000000000".into()),
        role: Set(role),
        last_review_id: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_category(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        parent_id: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn create_book(
    state: &AppState,
    seller: &AuthUser,
    category_id: Uuid,
    title: &str,
    price: i64,
    quantity: i32,
) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let book = BookActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set(None),
        author: Set("Anonymous".into()),
        published_year: Set(2001),
        price: Set(price),
        quantity: Set(quantity),
        images: Set(None),
        condition: Set(BookCondition::Good),
        category_id: Set(category_id),
        sub_category_id: Set(None),
        is_sold_out: Set(quantity == 0),
        sold_count: Set(0),
        seller_id: Set(seller.user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(book.id)
}
