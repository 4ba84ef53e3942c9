//! Database seeder for OpLots development and testing.
//!
//! Seeds one lot per interesting document state and prints bearer tokens for
//! the demo owner and a concierge.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, Utc};
use uuid::Uuid;

use oplots_core::lot::{Lot, LotRepository as _, LotStatus, Period};
use oplots_db::LotRepository;
use oplots_shared::types::{LotId, UserId};
use oplots_shared::{AppConfig, JwtConfig, JwtService, UserRole};

/// Broker owning every seeded lot.
const OWNER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
/// Concierge used for the demo token.
const CONCIERGE_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);

/// Seeded lots: fixed id, status, and rectification window.
const LOTS: [(u128, LotStatus, Option<i64>); 4] = [
    (0x10, LotStatus::Draft, None),
    (0x11, LotStatus::Pending, Some(7)),
    (0x12, LotStatus::Pending, Some(-1)),
    (0x13, LotStatus::Verification, None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = oplots_db::connect(&config.database.url).await?;
    let repo = LotRepository::new(db);

    println!("Seeding lots...");
    let owner = UserId::from_uuid(OWNER_ID);
    for (id, status, rectification_days) in LOTS {
        let id = LotId::from_uuid(Uuid::from_u128(id));
        if repo.find_by_id(id).await?.is_some() {
            println!("  Lot {id} already exists, skipping...");
            continue;
        }

        let mut lot = Lot::new(owner, status);
        lot.id = id;
        lot.rectification_period = rectification_days.map(|days| Period {
            start_date: Some(Utc::now() - Duration::days(7)),
            end_date: Some(Utc::now() + Duration::days(days)),
        });
        repo.create(&lot).await?;
        println!("  Created {} lot {id}", status.as_str());
    }

    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: 24 * 60,
    });
    println!();
    println!(
        "Owner token:     {}",
        jwt.generate_access_token(owner, UserRole::Broker)?
    );
    println!(
        "Concierge token: {}",
        jwt.generate_access_token(UserId::from_uuid(CONCIERGE_ID), UserRole::Concierge)?
    );

    println!("Seeding complete!");
    Ok(())
}
