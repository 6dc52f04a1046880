use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use elika_store_api::{config::AppConfig, db::create_pool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_admin(&pool, "admin", "admin123").await?;
    let customer_id = ensure_customer(&pool, "Demo Customer", "customer@example.com", "customer123").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();
    Ok(hash)
}

async fn ensure_admin(pool: &sqlx::PgPool, username: &str, password: &str) -> anyhow::Result<i64> {
    let password_hash = hash_password(password)?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, password_hash, role)
        VALUES ($1, $2, 'admin')
        ON CONFLICT (username) DO UPDATE SET role = 'admin'
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured admin {username}");
    Ok(id)
}

async fn ensure_customer(
    pool: &sqlx::PgPool,
    full_name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<i64> {
    let password_hash = hash_password(password)?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO customers (full_name, email, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
        RETURNING id
        "#,
    )
    .bind(full_name)
    .bind(email.to_lowercase())
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured customer {email}");
    Ok(id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let (category_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO categories (name, slug, image)
        VALUES ('Lighting', 'lighting', NULL)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await?;

    // Prices are stored in minor units.
    let products: Vec<(&str, &str, i64, i32)> = vec![
        ("Brass Table Lamp", "Warm reading light with a linen shade", 549_00, 25),
        ("Pendant Light Trio", "Three-bulb pendant for dining spaces", 1_299_00, 10),
        ("Floor Lamp Arc", "Arched floor lamp with marble base", 899_00, 15),
        ("Ceramic Bedside Lamp", "Compact lamp with a soft glow", 349_00, 40),
    ];

    for (name, desc, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (name, description, price, stock_count, category_id)
            SELECT $1, $2, $3, $4, $5
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)
            "#,
        )
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(category_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
