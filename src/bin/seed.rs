use book_market_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin123", "admin").await?;
    let seller_id = ensure_user(&pool, "seller", "seller@example.com", "seller123", "seller").await?;
    let buyer_id = ensure_user(&pool, "reader", "user@example.com", "user123", "user").await?;

    let fiction = ensure_category(&pool, "Fiction", None).await?;
    let fantasy = ensure_category(&pool, "Fantasy", Some(fiction)).await?;
    let science = ensure_category(&pool, "Science", None).await?;
    let physics = ensure_category(&pool, "Physics", Some(science)).await?;

    seed_books(&pool, seller_id, &[(fiction, Some(fantasy)), (science, Some(physics))]).await?;

    println!("Seed completed. Admin: {admin_id}, Seller: {seller_id}, Buyer: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, phone, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind("01000000000")
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn ensure_category(pool: &DbPool, name: &str, parent_id: Option<Uuid>) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, parent_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET parent_id = EXCLUDED.parent_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(parent_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_books(
    pool: &DbPool,
    seller_id: Uuid,
    categories: &[(Uuid, Option<Uuid>)],
) -> anyhow::Result<()> {
    let books = [
        ("The Hobbit", "J.R.R. Tolkien", 1937, 120_i64, 3_i32, "very_good", 0_usize),
        ("A Wizard of Earthsea", "Ursula K. Le Guin", 1968, 95, 1, "good", 0),
        ("Six Easy Pieces", "Richard Feynman", 1994, 150, 2, "excellent", 1),
        ("A Brief History of Time", "Stephen Hawking", 1988, 100, 5, "old", 1),
    ];

    for (title, author, year, price, quantity, condition, cat) in books {
        let (category_id, sub_category_id) = categories[cat];
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, published_year, price, quantity, condition,
                               category_id, sub_category_id, is_sold_out, seller_id)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
            WHERE NOT EXISTS (SELECT 1 FROM books WHERE title = $2 AND seller_id = $11)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(author)
        .bind(year)
        .bind(price)
        .bind(quantity)
        .bind(condition)
        .bind(category_id)
        .bind(sub_category_id)
        .bind(quantity == 0)
        .bind(seller_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded books");
    Ok(())
}
