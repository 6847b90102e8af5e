//! Demo data seeding and database inspection

use miette::Result;
use owo_colors::OwoColorize;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use commons_core::profile::{create_profile, find_profile_by_email};

const DEMO_PROFILES: &[(&str, &str)] = &[
    ("Jordan Kim", "jordan@commons.test"),
    ("Maya Patel", "maya@commons.test"),
    ("Liam Chen", "liam@commons.test"),
];

/// Insert the demo profiles, skipping any that already exist
pub async fn run(db: &Surreal<Any>) -> Result<()> {
    for (name, email) in DEMO_PROFILES {
        if find_profile_by_email(db, email).await?.is_some() {
            println!("{} {}", "Already present:".dimmed(), email);
            continue;
        }
        let profile = create_profile(db, *name, *email).await?;
        println!(
            "{} {} {}",
            "Seeded".bright_green(),
            email,
            format!("({})", profile.id).dimmed()
        );
    }
    println!("Done.");
    Ok(())
}

/// Print row counts per table
pub async fn stats(db: &Surreal<Any>) -> Result<()> {
    #[derive(Deserialize)]
    struct Count {
        count: usize,
    }

    for table in ["profiles", "conversations", "participants", "messages"] {
        let mut response = db
            .query(format!("SELECT count() FROM {} GROUP ALL", table))
            .await
            .map_err(|e| commons_core::error::CoreError::query_failed(table, e))?;
        let rows: Vec<Count> = response
            .take(0)
            .map_err(|e| commons_core::error::CoreError::query_failed(table, e))?;
        let count = rows.first().map(|c| c.count).unwrap_or(0);
        println!("{:>14}: {}", table, count);
    }
    Ok(())
}
