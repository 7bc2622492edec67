use crate::commands::{open_migrated_pool, prepare, require_owner, CommandResult, StepFailure};
use wardrobe_db::{DemoWardrobeSeed, SeedResult};

pub fn run(owner: &str) -> CommandResult {
    let owner = match require_owner("seed", owner) {
        Ok(owner) => owner,
        Err(result) => return result,
    };
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated_pool(&config).await?;

        let seed_result = DemoWardrobeSeed::load(&pool, &owner)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoWardrobeSeed::verify(&pool, &owner)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedResult, StepFailure> = if verification.all_present {
            Ok(seed_result)
        } else {
            Err(("seed_verification", verification_message(&verification.failed_checks()), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "demo wardrobe loaded for {}: {} uppers, {} bottoms",
                seeded.owner_id, seeded.uppers_seeded, seeded.bottoms_seeded
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
