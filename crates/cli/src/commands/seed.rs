//! Seed the storefront with the sample catalog.
//!
//! Safe to re-run: products and testimonials are skipped by name, and an
//! existing admin account only has its role ensured.
//!
//! # Environment Variables
//!
//! - `ADMIN_EMAIL` - Admin account email (default: admin@example.com)
//! - `ADMIN_PASSWORD` - Admin account password; the admin step is skipped
//!   when unset
//! - `ADMIN_NAME` - Admin display name (default: Store Admin)

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};

use terracotta_core::{Email, Role};
use terracotta_storefront::db::{ProductRepository, TestimonialRepository, UserRepository};
use terracotta_storefront::models::NewProduct;
use terracotta_storefront::services::auth::{AuthError, AuthService};

use super::{CommandError, connect};

const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_NAME: &str = "Store Admin";

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    /// Price in cents.
    price_cents: i64,
    category: &'static str,
    images: &'static [&'static str],
    stock: i32,
    featured: bool,
}

impl SeedProduct {
    fn to_new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.to_owned(),
            description: self.description.to_owned(),
            price: Decimal::new(self.price_cents, 2),
            category: self.category.to_owned(),
            images: self.images.iter().map(|s| (*s).to_owned()).collect(),
            stock: self.stock,
            featured: self.featured,
        }
    }
}

struct SeedTestimonial {
    name: &'static str,
    role: &'static str,
    image: &'static str,
    content: &'static str,
    rating: i32,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Handcrafted Clay Vase",
        description: "Beautiful terracotta vase, handmade by local artisans. \
            Perfect for fresh flowers or dried arrangements.",
        price_cents: 4599,
        category: "Vases",
        images: &[
            "https://images.unsplash.com/photo-1578749556568-bc2c40e68b61?w=800&q=80",
            "https://images.unsplash.com/photo-1610701596007-11502861dcfa?w=800&q=80",
        ],
        stock: 15,
        featured: true,
    },
    SeedProduct {
        name: "Rustic Clay Pot Set",
        description: "Set of 3 rustic clay pots in varying sizes. \
            Ideal for herbs, succulents, or small plants.",
        price_cents: 3250,
        category: "Pots",
        images: &["https://images.unsplash.com/photo-1485955900006-10f4d324d411?w=800&q=80"],
        stock: 20,
        featured: true,
    },
    SeedProduct {
        name: "Artisan Clay Bowl",
        description: "Hand-thrown ceramic bowl with natural glaze. Microwave and dishwasher safe.",
        price_cents: 2800,
        category: "Bowls",
        images: &["https://images.unsplash.com/photo-1610701596061-2ecf227e85b2?w=800&q=80"],
        stock: 12,
        featured: false,
    },
    SeedProduct {
        name: "Decorative Planter",
        description: "Modern geometric planter with drainage hole. Perfect for indoor plants.",
        price_cents: 3999,
        category: "Planters",
        images: &["https://images.unsplash.com/photo-1459411552884-841db9b3cc2a?w=800&q=80"],
        stock: 18,
        featured: true,
    },
    SeedProduct {
        name: "Clay Mug Set",
        description: "Set of 4 handcrafted mugs with earthy glaze. Each piece is unique.",
        price_cents: 5200,
        category: "Mugs",
        images: &["https://images.unsplash.com/photo-1514228742587-6b1558fcca3d?w=800&q=80"],
        stock: 10,
        featured: false,
    },
    SeedProduct {
        name: "Terracotta Serving Dish",
        description: "Large serving dish perfect for family meals. Oven-safe up to 450°F.",
        price_cents: 4875,
        category: "Dishes",
        images: &["https://images.unsplash.com/photo-1610701596007-11502861dcfa?w=800&q=80"],
        stock: 8,
        featured: false,
    },
];

const TESTIMONIALS: &[SeedTestimonial] = &[
    SeedTestimonial {
        name: "Sarah Johnson",
        role: "Interior Designer",
        image: "https://images.unsplash.com/photo-1494790108377-be9c29b29330",
        content: "The quality of these ceramics is outstanding. Each \
            piece tells a story and brings warmth to any space.",
        rating: 5,
    },
    SeedTestimonial {
        name: "Michael Chen",
        role: "Coffee Shop Owner",
        image: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e",
        content: "We use their pour-over coffee makers in our shop. Our \
            customers love the look and the coffee tastes amazing.",
        rating: 5,
    },
    SeedTestimonial {
        name: "Emily Rodriguez",
        role: "Home Chef",
        image: "https://images.unsplash.com/photo-1438761681033-6461ffad8d80",
        content: "The dining set I purchased is both beautiful and practical. \
            It's become the centerpiece of my dinner parties.",
        rating: 4,
    },
];

/// Seed products, testimonials and the admin account.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    seed_admin(&pool).await?;

    let products = ProductRepository::new(&pool);
    let mut created = 0_usize;
    for product in PRODUCTS {
        if products.exists_by_name(product.name).await? {
            continue;
        }
        products.create(&product.to_new_product()).await?;
        created += 1;
    }
    info!(
        created,
        skipped = PRODUCTS.len() - created,
        "Products seeded"
    );

    let testimonials = TestimonialRepository::new(&pool);
    let mut created = 0_usize;
    for t in TESTIMONIALS {
        if testimonials
            .insert_if_absent(t.name, t.role, Some(t.image), t.content, t.rating)
            .await?
        {
            created += 1;
        }
    }
    info!(
        created,
        skipped = TESTIMONIALS.len() - created,
        "Testimonials seeded"
    );

    info!("Seed complete!");
    Ok(())
}

/// Create the admin account, or make sure an existing one is an admin.
///
/// An existing account keeps its password.
async fn seed_admin(pool: &PgPool) -> Result<(), CommandError> {
    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_owned());
    let Ok(password) = std::env::var("ADMIN_PASSWORD") else {
        warn!("ADMIN_PASSWORD not set, skipping admin account");
        return Ok(());
    };
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| DEFAULT_ADMIN_NAME.to_owned());

    match AuthService::new(pool)
        .create_account(&name, &email, &password, Role::Admin)
        .await
    {
        Ok(user) => info!(user_id = %user.id, email = %user.email, "Admin account created"),
        Err(AuthError::UserAlreadyExists) => {
            let email = Email::parse(&email)?;
            let user = UserRepository::new(pool)
                .set_role_by_email(&email, Role::Admin)
                .await?;
            info!(
                user_id = %user.id,
                email = %user.email,
                "Admin account already exists, role ensured"
            );
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_seed_products_are_valid() {
        let names: HashSet<_> = PRODUCTS.iter().map(|p| p.name).collect();
        assert_eq!(names.len(), PRODUCTS.len());

        for product in PRODUCTS {
            let new = product.to_new_product();
            assert!(new.price > Decimal::ZERO);
            assert!(new.stock >= 0);
            assert!(!new.images.is_empty());
        }
    }

    #[test]
    fn test_seed_price_conversion() {
        let vase = PRODUCTS
            .iter()
            .find(|p| p.name == "Handcrafted Clay Vase")
            .expect("vase");
        assert_eq!(vase.to_new_product().price.to_string(), "45.99");
    }

    #[test]
    fn test_seed_testimonial_ratings_in_range() {
        assert!(TESTIMONIALS.iter().all(|t| (1..=5).contains(&t.rating)));
    }
}
