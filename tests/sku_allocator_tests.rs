use anyhow::Result;
use epg_sku::sku::{SkuError, UnitRequest, MAX_COLLISION_RETRIES, MAX_SEQUENCE};
use epg_sku::SkuEngine;
use std::sync::Arc;
use tempfile::TempDir;

struct TestEngine {
    engine: SkuEngine,
    lighting_id: i64,
    _dir: TempDir,
}

/// Engine over a fresh SQLite catalog with a "Lighting" category (prefix LT).
///
/// Every test gets its own kill switch variable so parallel tests never
/// observe each other's environment.
async fn setup(kill_switch_env: &str) -> Result<TestEngine> {
    let dir = tempfile::tempdir()?;
    let engine = SkuEngine::builder()
        .base_dir(dir.path())
        .kill_switch_env(kill_switch_env)
        .build()
        .await?;
    let lighting = engine.add_category("Lighting", Some("LT")).await?;

    Ok(TestEngine {
        engine,
        lighting_id: lighting.id,
        _dir: dir,
    })
}

fn chauvet(category_id: i64) -> UnitRequest {
    UnitRequest::auto(category_id, "Chauvet")
}

async fn seed_unit(engine: &SkuEngine, sku: &str) -> Result<()> {
    let inserted = engine.catalog().add_equipment_unit(sku, None, None).await?;
    assert!(inserted.is_some(), "seed SKU {} should be new", sku);
    Ok(())
}

#[tokio::test]
async fn test_first_generation_starts_at_one() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_FIRST").await?;

    let sku = ctx
        .engine
        .allocator()
        .generate_sku(&chauvet(ctx.lighting_id))
        .await?;
    assert_eq!(sku, "EPG-LT-CHV-00001");

    Ok(())
}

#[tokio::test]
async fn test_second_generation_increments() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_SECOND").await?;
    let allocator = ctx.engine.allocator();
    let request = chauvet(ctx.lighting_id);

    assert_eq!(allocator.generate_sku(&request).await?, "EPG-LT-CHV-00001");
    assert_eq!(allocator.generate_sku(&request).await?, "EPG-LT-CHV-00002");

    Ok(())
}

#[tokio::test]
async fn test_collision_advances_past_existing_unit() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_COLLISION").await?;
    let allocator = ctx.engine.allocator();
    let request = chauvet(ctx.lighting_id);

    allocator.generate_sku(&request).await?;
    allocator.generate_sku(&request).await?;

    // Counter is at 3; a manual unit already holds that number
    seed_unit(&ctx.engine, "EPG-LT-CHV-00003").await?;

    let sku = allocator.generate_sku(&request).await?;
    assert_eq!(sku, "EPG-LT-CHV-00004");

    Ok(())
}

#[tokio::test]
async fn test_reset_then_generate_reuses_free_number() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_RESET").await?;
    let allocator = ctx.engine.allocator();
    let request = chauvet(ctx.lighting_id);

    allocator.generate_sku(&request).await?;
    allocator.generate_sku(&request).await?;
    seed_unit(&ctx.engine, "EPG-LT-CHV-00003").await?;
    allocator.generate_sku(&request).await?;

    let reset = allocator.reset_sequence("LT", "CHV", 1).await?;
    assert_eq!(reset.old_sequence, 5);
    assert_eq!(reset.new_sequence, 1);
    assert_eq!(reset.next_sku, "EPG-LT-CHV-00001");

    // Only 00003 exists as a unit, so 00001 is free again
    let sku = allocator.generate_sku(&request).await?;
    assert_eq!(sku, "EPG-LT-CHV-00001");

    Ok(())
}

#[tokio::test]
async fn test_generation_disabled_requires_manual_sku() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_TOGGLE").await?;
    let allocator = ctx.engine.allocator();

    let status = allocator.toggle_auto_generation(false).await?;
    assert!(!status.enabled);
    assert!(!status.stored);

    let err = allocator
        .generate_sku(&chauvet(ctx.lighting_id))
        .await
        .unwrap_err();
    assert!(matches!(err, SkuError::Validation(_)), "got {:?}", err);

    // Manual SKUs still go through
    let sku = allocator
        .generate_sku(&UnitRequest::manual("rig-001"))
        .await?;
    assert_eq!(sku, "RIG-001");

    // Nothing was allocated while disabled
    let sequences = allocator.list_sequences().await?;
    assert!(sequences.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_kill_switch_overrides_stored_setting() -> Result<()> {
    let env_var = "EPG_SKU_TEST_KS_ENGAGED";
    let ctx = setup(env_var).await?;
    let allocator = ctx.engine.allocator();

    std::env::set_var(env_var, "true");

    let status = allocator.toggle_auto_generation(true).await?;
    assert!(status.stored);
    assert!(status.disabled_by_environment);
    assert!(!status.enabled);
    assert!(!allocator.auto_generation_enabled().await?);

    let err = allocator
        .generate_sku(&chauvet(ctx.lighting_id))
        .await
        .unwrap_err();
    assert!(matches!(err, SkuError::Validation(_)));

    // "1" engages as well; anything else does not
    std::env::set_var(env_var, "1");
    assert!(!allocator.auto_generation_enabled().await?);
    std::env::set_var(env_var, "no");
    assert!(allocator.auto_generation_enabled().await?);

    std::env::remove_var(env_var);
    assert!(allocator.auto_generation_enabled().await?);

    Ok(())
}

#[tokio::test]
async fn test_short_manual_sku_rejected_before_lookup() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_SHORT").await?;

    let err = ctx
        .engine
        .allocator()
        .validate_manual_sku("ab")
        .await
        .unwrap_err();
    match err {
        SkuError::Validation(message) => assert!(message.contains("at least 3")),
        other => panic!("expected validation error, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_manual_sku_rejects_invalid_characters() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_CHARS").await?;

    let err = ctx
        .engine
        .allocator()
        .validate_manual_sku("EPG LT 001")
        .await
        .unwrap_err();
    assert!(matches!(err, SkuError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_manual_sku_duplicate_is_case_insensitive() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_DUP").await?;
    seed_unit(&ctx.engine, "EPG-LT-CHV-00042").await?;

    let err = ctx
        .engine
        .allocator()
        .validate_manual_sku("epg-lt-chv-00042")
        .await
        .unwrap_err();
    match err {
        SkuError::Validation(message) => assert!(message.contains("already in use")),
        other => panic!("expected validation error, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_manual_sku_is_stored_uppercase() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_UPPER").await?;

    let unit = ctx
        .engine
        .create_equipment_unit(&UnitRequest::manual("  custom-par-7 "))
        .await?;
    assert_eq!(unit.sku, "CUSTOM-PAR-7");
    assert!(ctx.engine.catalog().sku_exists("custom-par-7").await?);

    Ok(())
}

#[tokio::test]
async fn test_blank_manual_sku_falls_back_to_generation() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_BLANK").await?;

    let request = UnitRequest {
        sku: Some("   ".to_string()),
        ..chauvet(ctx.lighting_id)
    };
    let sku = ctx.engine.allocator().generate_sku(&request).await?;
    assert_eq!(sku, "EPG-LT-CHV-00001");

    Ok(())
}

#[tokio::test]
async fn test_successive_generations_are_strictly_increasing() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_MONO").await?;

    let mut previous = 0;
    for _ in 0..10 {
        let unit = ctx
            .engine
            .create_equipment_unit(&chauvet(ctx.lighting_id))
            .await?;
        let parts = epg_sku::sku::parse_sku(&unit.sku).expect("generated SKU should parse");
        assert_eq!(parts.category_prefix, "LT");
        assert_eq!(parts.brand_prefix, "CHV");
        assert!(parts.sequence > previous);
        previous = parts.sequence;
    }
    assert_eq!(previous, 10);

    Ok(())
}

#[tokio::test]
async fn test_preview_is_idempotent_and_does_not_reserve() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_PREVIEW").await?;
    let allocator = ctx.engine.allocator();

    assert_eq!(allocator.preview_sku("LT", "CHV").await?, "EPG-LT-CHV-00001");
    assert_eq!(allocator.preview_sku("lt", "chv").await?, "EPG-LT-CHV-00001");

    // Preview never creates a counter
    assert!(allocator.list_sequences().await?.is_empty());

    allocator.generate_sku(&chauvet(ctx.lighting_id)).await?;
    assert_eq!(allocator.preview_sku("LT", "CHV").await?, "EPG-LT-CHV-00002");
    assert_eq!(allocator.preview_sku("LT", "CHV").await?, "EPG-LT-CHV-00002");
    assert_eq!(
        allocator.generate_sku(&chauvet(ctx.lighting_id)).await?,
        "EPG-LT-CHV-00002"
    );

    Ok(())
}

#[tokio::test]
async fn test_preview_rejects_malformed_prefixes() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_PREVIEW_BAD").await?;

    let err = ctx
        .engine
        .allocator()
        .preview_sku("LIGHT", "CHV")
        .await
        .unwrap_err();
    assert!(matches!(err, SkuError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_bounded_retries_exhaust() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_EXHAUST").await?;

    let attempts = MAX_COLLISION_RETRIES + 1;
    for n in 1..=attempts {
        seed_unit(&ctx.engine, &format!("EPG-LT-CHV-{:05}", n)).await?;
    }

    let err = ctx
        .engine
        .allocator()
        .generate_sku(&chauvet(ctx.lighting_id))
        .await
        .unwrap_err();
    match &err {
        SkuError::AllocationExhausted {
            attempts: reported,
            last_candidate,
        } => {
            assert_eq!(*reported, attempts);
            assert_eq!(last_candidate, "EPG-LT-CHV-00006");
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }
    assert!(err.is_retryable());

    // Every collision advanced the counter, so a resubmission succeeds
    let sku = ctx
        .engine
        .allocator()
        .generate_sku(&chauvet(ctx.lighting_id))
        .await?;
    assert_eq!(sku, "EPG-LT-CHV-00007");

    Ok(())
}

#[tokio::test]
async fn test_retry_budget_covers_five_collisions() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_FIVE").await?;

    for n in 1..=MAX_COLLISION_RETRIES {
        seed_unit(&ctx.engine, &format!("EPG-LT-CHV-{:05}", n)).await?;
    }

    let sku = ctx
        .engine
        .allocator()
        .generate_sku(&chauvet(ctx.lighting_id))
        .await?;
    assert_eq!(sku, "EPG-LT-CHV-00006");

    Ok(())
}

#[tokio::test]
async fn test_capacity_exceeded_at_max_sequence() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_CAPACITY").await?;
    let allocator = ctx.engine.allocator();
    let request = chauvet(ctx.lighting_id);

    allocator.generate_sku(&request).await?;
    allocator.reset_sequence("LT", "CHV", MAX_SEQUENCE).await?;

    assert_eq!(allocator.generate_sku(&request).await?, "EPG-LT-CHV-99999");

    let err = allocator.generate_sku(&request).await.unwrap_err();
    assert!(matches!(err, SkuError::CapacityExceeded { .. }), "got {:?}", err);

    let err = allocator.preview_sku("LT", "CHV").await.unwrap_err();
    assert!(matches!(err, SkuError::CapacityExceeded { .. }));

    let sequences = allocator.list_sequences().await?;
    assert_eq!(sequences.len(), 1);
    assert!(sequences[0].next_sku.is_none());

    // The stored counter is the next number to issue, one past capacity
    let stats = allocator.statistics().await?;
    let usage = &stats.sequences_by_category["LT"][0];
    assert_eq!(usage.current_sequence, MAX_SEQUENCE + 1);
    assert_eq!(usage.remaining_capacity, 0);

    Ok(())
}

#[tokio::test]
async fn test_reset_validation() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_RESET_BAD").await?;
    let allocator = ctx.engine.allocator();

    let err = allocator.reset_sequence("LT", "CHV", 0).await.unwrap_err();
    assert!(matches!(err, SkuError::InvalidReset(_)));

    let err = allocator
        .reset_sequence("LT", "CHV", MAX_SEQUENCE + 1)
        .await
        .unwrap_err();
    assert!(matches!(err, SkuError::InvalidReset(_)));

    let err = allocator.reset_sequence("LT", "CHV", 5).await.unwrap_err();
    assert!(matches!(err, SkuError::SequenceNotFound { .. }));

    Ok(())
}

#[tokio::test]
async fn test_category_resolution_is_strict() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_CATEGORY").await?;
    let allocator = ctx.engine.allocator();

    let err = allocator.generate_sku(&chauvet(9_999)).await.unwrap_err();
    assert!(matches!(err, SkuError::Resolution(_)));

    let no_prefix = ctx.engine.add_category("Cables", None).await?;
    let err = allocator
        .generate_sku(&chauvet(no_prefix.id))
        .await
        .unwrap_err();
    assert!(matches!(err, SkuError::Resolution(_)));

    let err = allocator
        .generate_sku(&UnitRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SkuError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_brand_resolution_strategies() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_BRAND").await?;
    let allocator = ctx.engine.allocator();
    let category_id = ctx.lighting_id;

    // Exact, case-insensitive
    let sku = allocator
        .generate_sku(&UnitRequest::auto(category_id, "CHAUVET"))
        .await?;
    assert_eq!(sku, "EPG-LT-CHV-00001");

    // Substring match
    let sku = allocator
        .generate_sku(&UnitRequest::auto(category_id, "Chauvet DJ"))
        .await?;
    assert_eq!(sku, "EPG-LT-CHV-00002");

    // Unknown brand falls back to the generic prefix
    let sku = allocator
        .generate_sku(&UnitRequest::auto(category_id, "Zzyzx Audio"))
        .await?;
    assert_eq!(sku, "EPG-LT-GEN-00001");

    // Missing brand reference
    let request = UnitRequest {
        category_id: Some(category_id),
        ..UnitRequest::default()
    };
    let err = allocator.generate_sku(&request).await.unwrap_err();
    assert!(matches!(err, SkuError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_brand_by_id_and_inactive_brand() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_BRAND_ID").await?;
    let allocator = ctx.engine.allocator();

    let brand = ctx.engine.upsert_brand("Robe", "ROB").await?;
    let request = UnitRequest {
        category_id: Some(ctx.lighting_id),
        brand_id: Some(brand.id),
        ..UnitRequest::default()
    };

    let generated = allocator.generate(&request).await?;
    assert_eq!(generated.sku, "EPG-LT-ROB-00001");
    assert_eq!(generated.brand_id, Some(brand.id));

    ctx.engine.set_brand_active(brand.id, false).await?;
    assert_eq!(allocator.generate_sku(&request).await?, "EPG-LT-GEN-00001");

    // Inactive brands are skipped by name as well
    let sku = allocator
        .generate_sku(&UnitRequest::auto(ctx.lighting_id, "Robe"))
        .await?;
    assert_eq!(sku, "EPG-LT-GEN-00002");

    let missing = UnitRequest {
        brand_id: Some(9_999),
        ..request
    };
    let err = allocator.generate_sku(&missing).await.unwrap_err();
    assert!(matches!(err, SkuError::BrandNotFound(9_999)));

    Ok(())
}

#[tokio::test]
async fn test_statistics_and_sequence_listing() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_STATS").await?;
    let audio = ctx.engine.add_category("Audio", Some("AUD")).await?;

    for _ in 0..3 {
        ctx.engine
            .create_equipment_unit(&chauvet(ctx.lighting_id))
            .await?;
    }
    ctx.engine
        .create_equipment_unit(&UnitRequest::auto(audio.id, "Shure"))
        .await?;
    ctx.engine
        .create_equipment_unit(&UnitRequest::manual("SPARE-01"))
        .await?;

    let stats = ctx.engine.allocator().statistics().await?;
    assert_eq!(stats.total_instances, 5);

    let lighting = &stats.sequences_by_category["LT"];
    assert_eq!(lighting.len(), 1);
    assert_eq!(lighting[0].brand_prefix, "CHV");
    assert_eq!(lighting[0].current_sequence, 4);
    assert_eq!(lighting[0].remaining_capacity, MAX_SEQUENCE - 3);

    let audio_usage = &stats.sequences_by_category["AUD"];
    assert_eq!(audio_usage[0].brand_prefix, "SHU");

    let sequences = ctx.engine.allocator().list_sequences().await?;
    assert_eq!(sequences.len(), 2);
    let lt = sequences
        .iter()
        .find(|s| s.category_prefix == "LT")
        .expect("LT sequence listed");
    assert_eq!(lt.category_name.as_deref(), Some("Lighting"));
    assert_eq!(lt.brand_name.as_deref(), Some("Chauvet"));
    assert_eq!(lt.next_sku.as_deref(), Some("EPG-LT-CHV-00004"));
    assert!(lt.last_used.is_some());

    Ok(())
}

#[tokio::test]
async fn test_duplicate_manual_unit_rejected() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_DUP_UNIT").await?;

    ctx.engine
        .create_equipment_unit(&UnitRequest::manual("RIG-7"))
        .await?;
    let err = ctx
        .engine
        .create_equipment_unit(&UnitRequest::manual("rig-7"))
        .await
        .unwrap_err();
    assert!(matches!(err, SkuError::Validation(_)));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generation_succeeds_first_time() -> Result<()> {
    let ctx = setup("EPG_SKU_TEST_KS_CONCURRENT").await?;
    let engine = Arc::new(ctx.engine);
    let category_id = ctx.lighting_id;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .create_equipment_unit(&chauvet(category_id))
                    .await
            })
        })
        .collect();

    // No units collide, so every request succeeds on its only submission
    let mut sequences = Vec::new();
    for handle in handles {
        let unit = handle.await??;
        let parts = epg_sku::sku::parse_sku(&unit.sku).expect("generated SKU should parse");
        sequences.push(parts.sequence);
    }
    sequences.sort_unstable();

    assert_eq!(sequences, (1..=16).collect::<Vec<i64>>());
    assert_eq!(engine.catalog().count_equipment_units().await?, 16);
    assert_eq!(
        engine.allocator().preview_sku("LT", "CHV").await?,
        "EPG-LT-CHV-00017"
    );

    Ok(())
}
