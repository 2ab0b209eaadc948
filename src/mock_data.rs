use std::collections::HashMap;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::handlers::{products::Product, users::User};

// ─── Constants ───────────────────────────────────────────────────

pub const NUM_USERS: usize = 1_000;
pub const NUM_PRODUCTS: usize = 200;

// ─── Name pools ──────────────────────────────────────────────────

static FIRST: &[&str] = &[
    "Emma", "Liam", "Olivia", "Noah", "Ava", "Ethan", "Sophia", "Mason", "Mia", "James",
];

static LAST: &[&str] = &[
    "Smith", "Johnson", "Brown", "Garcia", "Miller", "Davis", "Lopez", "Wilson", "Lee", "Clark",
];

static ROLES: &[&str] = &["admin", "editor", "viewer"];

static ADJ: &[&str] = &["Wireless", "Compact", "Ergonomic", "Portable", "Classic", "Turbo"];

static NOUN: &[&str] = &["Keyboard", "Mouse", "Monitor", "Headphones", "Dock", "Webcam"];

// ─── Store ───────────────────────────────────────────────────────

/// In-memory data behind the demo routes.
pub struct Store {
    pub users: RwLock<HashMap<String, User>>,
    pub products: HashMap<String, Product>,
}

/// Deterministic seed so re-runs serve the same data.
pub fn seed() -> Store {
    let mut rng = StdRng::seed_from_u64(42);

    let users = (1..=NUM_USERS)
        .map(|i| {
            let first = FIRST[rng.gen_range(0..FIRST.len())];
            let last = LAST[rng.gen_range(0..LAST.len())];
            let user = User {
                id: user_id(i),
                name: format!("{first} {last}"),
                email: format!("{}.{}{i}@example.com", first.to_lowercase(), last.to_lowercase()),
                role: ROLES[rng.gen_range(0..ROLES.len())].into(),
            };
            (user.id.clone(), user)
        })
        .collect();

    let products = (1..=NUM_PRODUCTS)
        .map(|i| {
            let adj = ADJ[rng.gen_range(0..ADJ.len())];
            let noun = NOUN[rng.gen_range(0..NOUN.len())];
            let product = Product {
                id: product_id(i),
                title: format!("{adj} {noun}"),
                price: rng.gen_range(999..=99_999u64),
                stock: rng.gen_range(0..=1000u32),
            };
            (product.id.clone(), product)
        })
        .collect();

    tracing::debug!(users = NUM_USERS, products = NUM_PRODUCTS, "mock data seeded");

    Store {
        users: RwLock::new(users),
        products,
    }
}

pub fn user_id(i: usize) -> String {
    format!("usr_{i:08}")
}

pub fn product_id(i: usize) -> String {
    format!("prod_{i:04}")
}
