// Integration tests for SyllabX
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use syllabx_core::{Embedder, Error, HashingEmbedder, ProgramKey, VectorIndex};
use syllabx_ranking::{AlignmentStrength, RankResponse, RankingEngine, ScoringPolicy, SimilaritySource};
use syllabx_storage::{
    ContextConfig, ContextHandle, IndexBuilder, Ingestor, RegisterOutcome, Registry, RegistryEntry,
    ServiceContext, SyllabusIndex, METADATA_FILE, PROGRAM_METADATA_FILE, REGISTRY_FILE,
};

fn syllabus(topics: &[&str]) -> String {
    let mut text = String::new();
    for (i, topic) in topics.iter().enumerate() {
        text.push_str(&format!("MODULE {}:\n", ["ONE", "TWO", "THREE", "FOUR"][i % 4]));
        for lecture in 0..5 {
            text.push_str(&format!("Lecture {} covers {} and applied {}.\n", lecture, topic, topic));
        }
    }
    text
}

fn entry(college: &str, program: &str, file: &str, active: bool, checked: &str) -> RegistryEntry {
    RegistryEntry {
        college: college.to_string(),
        program: program.to_string(),
        file_path: file.to_string(),
        hash: format!("sha-{}", file),
        academic_year: Some("2025-2026".to_string()),
        is_active: active,
        last_checked: NaiveDate::parse_from_str(checked, "%Y-%m-%d").ok(),
        source_url: None,
    }
}

/// data/ with three programs, vector_store/ built from it
fn setup(root: &Path) -> ContextConfig {
    let data = root.join("data");
    fs::create_dir_all(data.join("raw_pdfs")).unwrap();

    fs::write(
        data.join("raw_pdfs/ai.txt"),
        syllabus(&["machine learning", "deep neural networks", "reinforcement learning", "computer vision"]),
    )
    .unwrap();
    fs::write(
        data.join("raw_pdfs/ds.txt"),
        syllabus(&["statistics", "machine learning", "data visualization", "databases"]),
    )
    .unwrap();
    fs::write(
        data.join("raw_pdfs/civil.txt"),
        syllabus(&["structural analysis", "concrete design", "surveying", "hydraulics"]),
    )
    .unwrap();

    let registry = Registry::new(vec![
        entry("IIT Delhi", "M.Tech AI", "raw_pdfs/ai.txt", true, "2025-07-01"),
        entry("IIT Bombay", "M.Tech Data Science", "raw_pdfs/ds.txt", true, "2025-07-01"),
        entry("NIT Trichy", "B.Tech Civil", "raw_pdfs/civil.txt", true, "2025-07-01"),
    ]);
    registry.save(data.join(REGISTRY_FILE)).unwrap();

    fs::write(
        data.join(PROGRAM_METADATA_FILE),
        r#"{
            "M.Tech AI": {"college": "IIT Delhi", "syllabus_pdf": "raw_pdfs/ai.pdf", "entrances": ["GATE"]},
            "B.Tech Civil": {"college": "NIT Trichy", "official_website": "https://nitt.edu"}
        }"#,
    )
    .unwrap();

    let embedder = HashingEmbedder::default();
    let registry = Registry::load(data.join(REGISTRY_FILE)).unwrap();
    IndexBuilder::new(&embedder, &data)
        .build_and_save(&registry, root.join("vector_store"))
        .unwrap();

    ContextConfig {
        index_dir: root.join("vector_store"),
        metadata_path: data.join(PROGRAM_METADATA_FILE),
        policy: ScoringPolicy::default(),
    }
}

#[test]
fn test_build_load_rank() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let context = ServiceContext::load(config, Arc::new(HashingEmbedder::default())).unwrap();

    let ranking = context.rank("machine learning and deep neural networks", None).unwrap();
    assert!(!ranking.results.is_empty());
    assert_eq!(ranking.results[0].key, ProgramKey::new("IIT Delhi", "M.Tech AI"));

    for pair in ranking.results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for result in &ranking.results {
        assert!(result.top_units.len() <= 3);
        assert!(result.top_units.iter().all(|u| u.similarity >= 0.28));
        assert_eq!(result.syllabus_pdf.as_deref().map(|p| p.starts_with("raw_pdfs/")), Some(true));
    }
}

#[test]
fn test_ranking_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let context = ServiceContext::load(config, Arc::new(HashingEmbedder::default())).unwrap();

    let first = context.rank("statistics and databases", None).unwrap();
    let second = context.rank("statistics and databases", None).unwrap();
    assert_eq!(first, second);

    let a = serde_json::to_string(&RankResponse::from_ranked(&first.results)).unwrap();
    let b = serde_json::to_string(&RankResponse::from_ranked(&second.results)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unrelated_interest_yields_nothing_above_floor() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let context = ServiceContext::load(config, Arc::new(HashingEmbedder::default())).unwrap();

    let ranking = context.rank("zzzz qqqq xxxx", None).unwrap();
    assert!(ranking.results.iter().all(|r| r.explainability.peak_similarity >= 0.28));
    assert!(context.rank("", None).unwrap().results.is_empty());
}

#[test]
fn test_k_larger_than_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let index = SyllabusIndex::load(&config.index_dir).unwrap();
    let embedder = HashingEmbedder::default();

    let query = embedder.encode("concrete design").unwrap();
    let hits = index.search(&query, index.len() + 100).unwrap();
    assert_eq!(hits.len(), index.len());

    let raw = index.index().search(&query, index.len() + 100).unwrap();
    assert_eq!(raw.ids.len(), index.len() + 100);
    assert_eq!(raw.matches().count(), index.len());
}

#[test]
fn test_min_max_policy_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path());
    config.policy = ScoringPolicy::min_max();
    let context = ServiceContext::load(config, Arc::new(HashingEmbedder::default())).unwrap();

    let ranking = context.rank("machine learning", None).unwrap();
    assert!(ranking.results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    if ranking.results.len() > 1 {
        assert_eq!(ranking.results[0].score, 1.0);
        assert_eq!(ranking.results[0].alignment_strength(), AlignmentStrength::Strong);
    }
}

#[test]
fn test_reload_swaps_new_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let data = dir.path().join("data");
    let handle = ContextHandle::load(config, Arc::new(HashingEmbedder::default())).unwrap();
    let before = handle.current();

    fs::write(
        data.join("raw_pdfs/bio.txt"),
        syllabus(&["molecular biology", "genetics", "bioinformatics", "protein folding"]),
    )
    .unwrap();
    let mut registry = Registry::load(data.join(REGISTRY_FILE)).unwrap();
    registry.register_version(
        entry("IISc", "M.Sc Biology", "raw_pdfs/bio.txt", true, "2025-08-01"),
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
    );
    registry.save(data.join(REGISTRY_FILE)).unwrap();

    let embedder = HashingEmbedder::default();
    IndexBuilder::new(&embedder, &data)
        .build_and_save(&registry, dir.path().join("vector_store"))
        .unwrap();

    let after = handle.reload().unwrap();
    assert!(after.index().len() > before.index().len());

    let ranking = handle.current().rank("genetics and bioinformatics", Some(1)).unwrap();
    assert_eq!(ranking.results[0].key.college, "IISc");
    assert!(before.rank("genetics and bioinformatics", None).unwrap().results.iter().all(|r| r.key.college != "IISc"));
}

#[test]
fn test_integrity_failure_keeps_old_context() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let store = config.index_dir.clone();
    let handle = ContextHandle::load(config, Arc::new(HashingEmbedder::default())).unwrap();
    let units = handle.current().index().len();

    let mut meta = fs::read_to_string(store.join(METADATA_FILE)).unwrap();
    meta = meta.replacen("IIT Delhi", "IIT Madras", 1);
    fs::write(store.join(METADATA_FILE), meta).unwrap();

    assert!(matches!(handle.reload(), Err(Error::Integrity(_))));
    assert_eq!(handle.current().index().len(), units);
    assert!(handle.current().rank("machine learning", None).is_ok());

    let fresh = ServiceContext::load(handle.current().config().clone(), Arc::new(HashingEmbedder::default()));
    assert!(fresh.is_err_and(|e| e.is_fatal_at_load()));
}

#[test]
fn test_program_metadata_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let context = ServiceContext::load(config, Arc::new(HashingEmbedder::default())).unwrap();

    let record = context.program_details(None, "m.tech ai").unwrap();
    assert_eq!(record.syllabus_pdf.as_deref(), Some("raw_pdfs/ai.pdf"));

    let record = context.program_details(Some("NIT Trichy"), "B.Tech Civil").unwrap();
    assert_eq!(record.official_website.as_deref(), Some("https://nitt.edu"));

    assert!(matches!(
        context.program_details(None, "M.Tech Data Science"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_duplicate_active_registry_entries() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("v1.txt"), syllabus(&["fluid mechanics", "thermodynamics", "heat transfer", "combustion"])).unwrap();
    fs::write(data.join("v2.txt"), syllabus(&["robotics", "control systems", "mechatronics", "embedded systems"])).unwrap();

    let registry = Registry::new(vec![
        entry("IIT Madras", "B.Tech Mechanical", "v1.txt", true, "2024-06-01"),
        entry("IIT Madras", "B.Tech Mechanical", "v2.txt", true, "2025-06-01"),
    ]);
    let violations = registry.integrity_violations();
    assert_eq!(violations.len(), 1);
    assert_eq!(registry.entries()[violations[0].chosen].file_path, "v2.txt");

    let embedder = HashingEmbedder::default();
    let (index, report) = IndexBuilder::new(&embedder, &data).build(&registry).unwrap();
    assert_eq!(report.programs_indexed, 1);
    assert!(index.units().iter().all(|u| u.file_path.as_deref() == Some("v2.txt")));
}

#[test]
fn test_ingest_then_build() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    let source = dir.path().join("download.txt");
    fs::write(&source, syllabus(&["cryptography", "network security", "number theory", "protocols"])).unwrap();

    let mut registry = Registry::default();
    let key = ProgramKey::new("IIIT Hyderabad", "M.Tech CSE");
    let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let ingestor = Ingestor::new(&data);

    let first = ingestor.ingest_file(&mut registry, &key, Some("2025"), &source, today).unwrap();
    assert_eq!(first.outcome, RegisterOutcome::Added);
    let again = ingestor.ingest_file(&mut registry, &key, Some("2025"), &source, today).unwrap();
    assert_eq!(again.outcome, RegisterOutcome::Unchanged);

    let embedder = HashingEmbedder::default();
    let store = dir.path().join("vector_store");
    IndexBuilder::new(&embedder, &data).build_and_save(&registry, &store).unwrap();

    let index = SyllabusIndex::load(&store).unwrap();
    let engine = RankingEngine::new(ScoringPolicy::default()).unwrap();
    let ranking = engine.rank_interest("network security protocols", &embedder, &index, None).unwrap();
    assert_eq!(ranking.results[0].key, key);
}
