use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::database;
use wardrobe_core::stores::RepositoryError;

pub const DEMO_OWNER_ID: &str = "demo-owner";

/// (id suffix, name, slot, category, subcategory, color)
const DEMO_ITEMS: &[(&str, &str, &str, &str, &str, &str)] = &[
    ("upper-001", "White tee", "upper", "t-shirt", "crew-neck", "#FFFFFF"),
    ("upper-002", "Navy oxford", "upper", "shirt", "oxford", "#000080"),
    ("upper-003", "Gray pullover", "upper", "sweater", "pullover", "#808080"),
    ("upper-004", "Black hoodie", "upper", "hoodie", "zip-hoodie", "#000000"),
    ("bottom-001", "Blue jeans", "bottom", "jeans", "straight", "#0000FF"),
    ("bottom-002", "Khaki chinos", "bottom", "pants", "chinos", "#F0E68C"),
    ("bottom-003", "Black skinny jeans", "bottom", "jeans", "skinny", "#000000"),
];

const DEMO_CREATED_AT: &str = "2026-01-05T09:00:00+00:00";

/// Reference categories plus a small wardrobe, enough to generate a full
/// week for one owner.
pub struct DemoWardrobeSeed;

impl DemoWardrobeSeed {
    pub const REFERENCE_SQL: &str = include_str!("../../../config/fixtures/reference_data.sql");

    /// Idempotent: rows are inserted or replaced by id.
    pub async fn load(pool: &DbPool, owner_id: &str) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await.map_err(database)?;
        tx.execute(sqlx::query(Self::REFERENCE_SQL)).await.map_err(database)?;

        for (suffix, name, slot, category, subcategory, color) in DEMO_ITEMS {
            sqlx::query(
                "INSERT OR REPLACE INTO clothing_item
                    (id, owner_id, name, image_ref, slot, category_id, subcategory_id, color, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(demo_item_id(owner_id, suffix))
            .bind(owner_id)
            .bind(*name)
            .bind(format!("images/demo/{suffix}.jpg"))
            .bind(*slot)
            .bind(*category)
            .bind(*subcategory)
            .bind(*color)
            .bind(DEMO_CREATED_AT)
            .execute(&mut *tx)
            .await
            .map_err(database)?;
        }
        tx.commit().await.map_err(database)?;

        Ok(SeedResult {
            owner_id: owner_id.to_string(),
            uppers_seeded: count_slot("upper"),
            bottoms_seeded: count_slot("bottom"),
        })
    }

    pub async fn verify(pool: &DbPool, owner_id: &str) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let category_count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM category")
            .fetch_one(pool)
            .await
            .map_err(database)?;
        checks.push(("reference-categories", category_count > 0));

        for (label, slot) in [("demo-uppers", "upper"), ("demo-bottoms", "bottom")] {
            let ids = DEMO_ITEMS
                .iter()
                .filter(|item| item.2 == slot)
                .map(|item| demo_item_id(owner_id, item.0))
                .collect::<Vec<_>>();
            let placeholders = sql_array_from_ids(&ids);
            let present: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(1) FROM clothing_item
                 WHERE owner_id = ?1 AND slot = ?2 AND id IN {placeholders}"
            ))
            .bind(owner_id)
            .bind(slot)
            .fetch_one(pool)
            .await
            .map_err(database)?;
            checks.push((label, present == ids.len() as i64));
        }

        let dangling_categories: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM clothing_item
             WHERE owner_id = ?1 AND category_id NOT IN (SELECT id FROM category)",
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await
        .map_err(database)?;
        checks.push(("demo-item-categories", dangling_categories == 0));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the owner's items and everything derived from them.
    pub async fn clean(pool: &DbPool, owner_id: &str) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await.map_err(database)?;

        for statement in [
            "DELETE FROM outfit WHERE owner_id = ?",
            "DELETE FROM suggestion_cache WHERE owner_id = ?",
            "DELETE FROM clothing_item WHERE owner_id = ?",
        ] {
            sqlx::query(statement).bind(owner_id).execute(&mut *tx).await.map_err(database)?;
        }

        tx.commit().await.map_err(database)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub owner_id: String,
    pub uppers_seeded: usize,
    pub bottoms_seeded: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl VerificationResult {
    pub fn failed_checks(&self) -> Vec<&'static str> {
        self.checks.iter().filter(|(_, ok)| !ok).map(|(label, _)| *label).collect()
    }
}

fn demo_item_id(owner_id: &str, suffix: &str) -> String {
    format!("{owner_id}:{suffix}")
}

fn count_slot(slot: &str) -> usize {
    DEMO_ITEMS.iter().filter(|item| item.2 == slot).count()
}

fn sql_array_from_ids(ids: &[String]) -> String {
    let quoted =
        ids.iter().map(|id| format!("'{}'", id.replace('\'', "''"))).collect::<Vec<_>>().join(", ");
    format!("({quoted})")
}

#[cfg(test)]
mod tests {
    use super::{sql_array_from_ids, DemoWardrobeSeed, DEMO_OWNER_ID};
    use crate::repositories::test_support::setup;

    #[test]
    fn id_lists_render_as_escaped_sql_arrays() {
        assert_eq!(
            sql_array_from_ids(&["a".to_string(), "o'b:c".to_string()]),
            "('a', 'o''b:c')"
        );
    }

    #[tokio::test]
    async fn seed_loads_verifies_and_cleans() {
        let pool = setup().await;

        let result = DemoWardrobeSeed::load(&pool, DEMO_OWNER_ID).await.expect("load");
        assert_eq!(result.uppers_seeded, 4);
        assert_eq!(result.bottoms_seeded, 3);
        DemoWardrobeSeed::load(&pool, DEMO_OWNER_ID).await.expect("second load is idempotent");

        let verification = DemoWardrobeSeed::verify(&pool, DEMO_OWNER_ID).await.expect("verify");
        assert!(verification.all_present, "failed checks: {:?}", verification.failed_checks());

        DemoWardrobeSeed::clean(&pool, DEMO_OWNER_ID).await.expect("clean");
        let verification = DemoWardrobeSeed::verify(&pool, DEMO_OWNER_ID).await.expect("verify");
        assert_eq!(verification.failed_checks(), vec!["demo-uppers", "demo-bottoms"]);
    }

    #[tokio::test]
    async fn owners_get_separate_copies() {
        let pool = setup().await;
        DemoWardrobeSeed::load(&pool, "alice").await.expect("alice");
        DemoWardrobeSeed::load(&pool, "bob").await.expect("bob");

        DemoWardrobeSeed::clean(&pool, "alice").await.expect("clean alice");
        let bob = DemoWardrobeSeed::verify(&pool, "bob").await.expect("verify bob");
        assert!(bob.all_present);
    }
}
