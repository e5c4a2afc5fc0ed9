use super::*;
use crate::config::error::ConfigError;
use crate::hierarchy::{ContentHierarchy, HierarchyBuilder, RawElement};
use crate::similarity::{NodeVectors, SimilarityEngine, SimilarityMatrix};

fn build(elements: &[(&str, &str)]) -> ContentHierarchy {
    let raw: Vec<RawElement> = elements
        .iter()
        .enumerate()
        .map(|(i, (kind, text))| RawElement::new(*kind, *text, i as u32))
        .collect();
    HierarchyBuilder::build(&raw).expect("fixture builds")
}

fn evaluator() -> ChecklistEvaluator {
    ChecklistEvaluator::new(RuleConfig::default()).expect("default config is valid")
}

fn no_vectors(h: &ContentHierarchy) -> SimilarityMatrix {
    SimilarityEngine::compute(h, &NodeVectors::new())
}

fn axis() -> Vec<f32> {
    vec![1.0, 0.0]
}

/// Unit vector whose cosine against `axis()` is exactly `cosine`.
fn unit_at(cosine: f32) -> Vec<f32> {
    vec![cosine, (1.0 - cosine * cosine).max(0.0).sqrt()]
}

fn result_for(results: &[ChecklistResult], code: RuleCode) -> &ChecklistResult {
    results
        .iter()
        .find(|r| r.code == code)
        .expect("every code appears once")
}

/// A page that satisfies every Critical and High rule.
fn healthy_page() -> (ContentHierarchy, SimilarityMatrix) {
    let h = build(&[
        ("title", "Ciche zmywarki do zabudowy przeglad modeli na rok 2025"),
        ("meta", "Poznaj ranking cichych zmywarek, poziomy halasu i koszty."),
        ("h1", "Ciche zmywarki do zabudowy"),
        ("h2", "Jakie ciche zmywarki wybrac do malego mieszkania?"),
        ("h3", "Modele do zabudowy na wymiar"),
        ("h3", "Modele wolnostojace pod blat"),
        ("h2", "Ile kosztuje cicha zmywarka do zabudowy?"),
        ("h2", "Jak mierzony jest poziom halasu zmywarki?"),
        ("h2", "Czy cicha zmywarka zuzywa wiecej pradu?"),
    ]);
    let mut vectors = NodeVectors::new();
    vectors.insert(0, axis());
    vectors.insert(1, axis());
    vectors.insert(2, axis());
    vectors.insert(3, unit_at(0.90));
    vectors.insert(4, unit_at(0.85));
    vectors.insert(5, unit_at(0.80));
    vectors.insert(6, unit_at(0.80));
    vectors.insert(7, unit_at(0.85));
    vectors.insert(8, unit_at(0.95));
    let m = SimilarityEngine::compute(&h, &vectors);
    (h, m)
}

#[test]
fn catalogue_order_matches_codes() {
    assert_eq!(RULES.len(), 36);
    for (def, code) in RULES.iter().zip(RuleCode::ALL) {
        assert_eq!(def.code, code);
    }
    assert_eq!(rule_def(RuleCode::Cv036).priority, Priority::Critical);
    assert_eq!(rule_def(RuleCode::Cv013).priority, Priority::High);
}

#[test]
fn codes_roundtrip_their_labels() {
    for code in RuleCode::ALL {
        assert_eq!(RuleCode::parse(code.as_str()), Some(code));
    }
    assert_eq!(RuleCode::parse("CV-099"), None);
    assert_eq!(RuleCode::Cv001.to_string(), "CV-001");
}

#[test]
fn weights_and_contributions() {
    assert_eq!(Priority::Critical.weight(), 3.0);
    assert_eq!(Priority::High.weight(), 2.0);
    assert_eq!(Priority::Medium.weight(), 1.0);
    assert_eq!(RuleStatus::Pass.contribution(), 1.0);
    assert_eq!(RuleStatus::Warn.contribution(), 0.5);
    assert_eq!(RuleStatus::Fail.contribution(), 0.0);
}

#[test]
fn band_bounds_are_inclusive() {
    let band = Band::new(0.75, 0.80, 0.90);
    assert_eq!(band.status(0.80), RuleStatus::Pass);
    assert_eq!(band.status(0.95), RuleStatus::Pass);
    assert_eq!(band.status(0.75), RuleStatus::Warn);
    assert_eq!(band.status(0.79), RuleStatus::Warn);
    assert_eq!(band.status(0.74), RuleStatus::Fail);
}

#[test]
fn every_evaluation_yields_the_full_ordered_catalogue() {
    let (h, m) = healthy_page();
    let results = evaluator().evaluate(&h, &m);
    assert_eq!(results.len(), 36);
    for (result, code) in results.iter().zip(RuleCode::ALL) {
        assert_eq!(result.code, code);
    }
    assert_eq!(results.last().map(|r| r.code), Some(RuleCode::Cv036));
}

#[test]
fn healthy_page_scores_a_perfect_aggregate() {
    let (h, m) = healthy_page();
    let results = evaluator().evaluate(&h, &m);
    for result in &results {
        if matches!(result.priority, Priority::Critical | Priority::High) {
            assert!(
                result.is_pass(),
                "{} should pass: {}",
                result.code,
                result.message
            );
        }
    }
    assert_eq!(ChecklistEvaluator::overall_score(&results), 100.0);
    assert!(result_for(&results, RuleCode::Cv036).is_pass());
}

#[test]
fn title_length_53_passes_and_31_fails() {
    for (len, expected) in [
        (53usize, RuleStatus::Pass),
        (31, RuleStatus::Fail),
        (65, RuleStatus::Warn),
        (71, RuleStatus::Fail),
    ] {
        let title = "x".repeat(len);
        let h = build(&[("title", title.as_str())]);
        let results = evaluator().evaluate(&h, &no_vectors(&h));
        let result = result_for(&results, RuleCode::Cv002);
        assert_eq!(result.status, expected, "length {len}");
        assert_eq!(result.evidence, Evidence::Length { chars: len });
    }
}

#[test]
fn two_h1_elements_fail_the_single_h1_rule() {
    let h = build(&[
        ("title", "Ranking pomp ciepla"),
        ("h1", "Pompy ciepla"),
        ("h1", "Ranking 2025"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv008);
    assert!(result.is_fail());
    assert_eq!(result.evidence, Evidence::Count { actual: 2 });
}

#[test]
fn title_h1_alignment_follows_the_default_band() {
    for (cosine, expected) in [
        (0.85f32, RuleStatus::Pass),
        (0.77, RuleStatus::Warn),
        (0.40, RuleStatus::Fail),
    ] {
        let h = build(&[
            ("title", "Ciche zmywarki do zabudowy"),
            ("h1", "Ranking cichych zmywarek"),
        ]);
        let mut vectors = NodeVectors::new();
        vectors.insert(0, axis());
        vectors.insert(1, unit_at(cosine));
        let m = SimilarityEngine::compute(&h, &vectors);
        let results = evaluator().evaluate(&h, &m);
        let result = result_for(&results, RuleCode::Cv009);
        assert_eq!(result.status, expected, "cosine {cosine}");
    }
}

#[test]
fn h2_count_band_cases() {
    for (count, expected) in [
        (3usize, RuleStatus::Fail),
        (6, RuleStatus::Pass),
        (9, RuleStatus::Warn),
    ] {
        let mut elements = vec![("title".to_string(), "Ranking zmywarek".to_string())];
        for i in 0..count {
            elements.push(("h2".to_string(), format!("Sekcja numer {i} o zmywarkach")));
        }
        let raw: Vec<RawElement> = elements
            .iter()
            .enumerate()
            .map(|(i, (kind, text))| RawElement::new(kind.clone(), text.clone(), i as u32))
            .collect();
        let h = HierarchyBuilder::build(&raw).expect("fixture builds");
        let results = evaluator().evaluate(&h, &no_vectors(&h));
        let result = result_for(&results, RuleCode::Cv013);
        assert_eq!(result.status, expected, "count {count}");
        assert_eq!(result.evidence, Evidence::Count { actual: count });
    }
}

#[test]
fn orphan_h3_fails_the_level_skip_rule() {
    let h = build(&[
        ("title", "Ranking pomp ciepla"),
        ("h1", "Pompy ciepla"),
        ("h3", "Koszty montazu"),
        ("h2", "Jak dziala pompa ciepla?"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let skip = result_for(&results, RuleCode::Cv018);
    assert!(skip.is_fail());
    assert_eq!(skip.evidence, Evidence::Nodes { indices: vec![2] });
    let nesting = result_for(&results, RuleCode::Cv017);
    assert!(nesting.is_warn());
}

#[test]
fn missing_meta_fails_presence_and_leaves_relations_inconclusive() {
    let h = build(&[
        ("title", "Ciche zmywarki do zabudowy"),
        ("h1", "Ranking cichych zmywarek"),
    ]);
    let mut vectors = NodeVectors::new();
    vectors.insert(0, axis());
    vectors.insert(1, axis());
    let m = SimilarityEngine::compute(&h, &vectors);
    let results = evaluator().evaluate(&h, &m);

    assert!(result_for(&results, RuleCode::Cv005).is_fail());
    assert!(result_for(&results, RuleCode::Cv006).is_fail());
    assert!(result_for(&results, RuleCode::Cv007).is_fail());
    let title_meta = result_for(&results, RuleCode::Cv020);
    assert!(title_meta.is_warn());
    assert_eq!(title_meta.evidence, Evidence::Unavailable);
    let h1_meta = result_for(&results, RuleCode::Cv021);
    assert!(h1_meta.is_warn());
    assert_eq!(h1_meta.evidence, Evidence::Unavailable);
    // Absence is CV-005 territory; the duplicate rule has nothing to flag.
    assert!(result_for(&results, RuleCode::Cv033).is_pass());
}

#[test]
fn keyword_stuffing_warns_on_a_triple_repeat() {
    let h = build(&[("title", "pompa pompa pompa ciepla do domu")]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv004);
    assert!(result.is_warn());
    assert_eq!(result.evidence, Evidence::Count { actual: 3 });
    assert!(result.message.contains("pompa"));
}

#[test]
fn meta_extension_ratio_bands() {
    let title = "ranking pomp ciepla do domu";
    for (meta, expected) in [
        ("ranking pomp ciepla koszty montaz serwis", RuleStatus::Pass),
        ("ranking pomp ciepla do serwisu", RuleStatus::Warn),
        ("ranking pomp ciepla do domu", RuleStatus::Fail),
    ] {
        let h = build(&[("title", title), ("meta", meta)]);
        let results = evaluator().evaluate(&h, &no_vectors(&h));
        let result = result_for(&results, RuleCode::Cv005);
        assert_eq!(result.status, expected, "meta '{meta}'");
    }
}

#[test]
fn question_share_is_inclusive_at_half() {
    let h = build(&[
        ("title", "Pompy ciepla poradnik"),
        ("h2", "Jak dziala pompa ciepla?"),
        ("h2", "Ile kosztuje montaz pompy?"),
        ("h2", "Koszty instalacji krok po kroku"),
        ("h2", "Najlepsze pompy ciepla 2025"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv015);
    assert!(result.is_pass());
    assert_eq!(
        result.evidence,
        Evidence::Ratio {
            numerator: 2,
            denominator: 4
        }
    );

    let h = build(&[
        ("title", "Pompy ciepla poradnik"),
        ("h2", "Jak dziala pompa ciepla?"),
        ("h2", "Koszty instalacji krok po kroku"),
        ("h2", "Najlepsze pompy ciepla 2025"),
        ("h2", "Serwis i przeglady gwarancyjne"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    assert!(result_for(&results, RuleCode::Cv015).is_fail());
}

#[test]
fn duplicate_h2_headings_fail_with_the_later_index() {
    let h = build(&[
        ("title", "Ranking zmywarek"),
        ("h2", "Ranking modeli"),
        ("h2", "  ranking   MODELI "),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv016);
    assert!(result.is_fail());
    assert_eq!(result.evidence, Evidence::Nodes { indices: vec![2] });
}

#[test]
fn drift_counts_band_between_warn_and_fail() {
    let page = |cosines: &[f32]| {
        let mut elements = vec![
            ("title".to_string(), "Ciche zmywarki ranking".to_string()),
            ("h1".to_string(), "Ciche zmywarki".to_string()),
        ];
        for i in 0..cosines.len() {
            elements.push(("h2".to_string(), format!("Sekcja {i} o zmywarkach")));
        }
        let raw: Vec<RawElement> = elements
            .iter()
            .enumerate()
            .map(|(i, (kind, text))| RawElement::new(kind.clone(), text.clone(), i as u32))
            .collect();
        let h = HierarchyBuilder::build(&raw).expect("fixture builds");
        let mut vectors = NodeVectors::new();
        vectors.insert(0, axis());
        vectors.insert(1, axis());
        for (i, cosine) in cosines.iter().enumerate() {
            vectors.insert(2 + i, unit_at(*cosine));
        }
        let m = SimilarityEngine::compute(&h, &vectors);
        (h, m)
    };

    let (h, m) = page(&[0.9, 0.9, 0.9, 0.9]);
    let results = evaluator().evaluate(&h, &m);
    assert!(result_for(&results, RuleCode::Cv012).is_pass());

    let (h, m) = page(&[0.2, 0.9, 0.9, 0.9]);
    let results = evaluator().evaluate(&h, &m);
    let result = result_for(&results, RuleCode::Cv012);
    assert!(result.is_warn());
    assert_eq!(result.evidence, Evidence::Nodes { indices: vec![2] });

    let (h, m) = page(&[0.2, 0.2, 0.2, 0.9]);
    let results = evaluator().evaluate(&h, &m);
    assert!(result_for(&results, RuleCode::Cv012).is_fail());
}

#[test]
fn aggregate_weighs_critical_and_high_only() {
    let synthetic = |code, priority, status| ChecklistResult {
        code,
        priority,
        status,
        evidence: Evidence::None,
        message: String::new(),
        node: None,
    };
    let results = vec![
        synthetic(RuleCode::Cv001, Priority::Critical, RuleStatus::Pass),
        synthetic(RuleCode::Cv002, Priority::High, RuleStatus::Fail),
        synthetic(RuleCode::Cv006, Priority::Medium, RuleStatus::Fail),
        synthetic(RuleCode::Cv036, Priority::Critical, RuleStatus::Fail),
    ];
    // 3.0 weighted pass out of 5.0 total; the medium fail and the aggregate
    // itself never enter the sum.
    assert_eq!(ChecklistEvaluator::overall_score(&results), 60.0);

    let mut with_warn = results.clone();
    with_warn.push(synthetic(RuleCode::Cv010, Priority::High, RuleStatus::Warn));
    let score = ChecklistEvaluator::overall_score(&with_warn);
    assert!((score - 400.0 / 7.0).abs() < 1e-9);
}

#[test]
fn band_override_reshapes_a_relation_rule() {
    let config =
        RuleConfig::default().with_band_override("CV-009", Band::new(0.10, 0.20, 0.90));
    let evaluator = ChecklistEvaluator::new(config).expect("override is valid");
    let h = build(&[("title", "Ciche zmywarki"), ("h1", "Pralki automatyczne")]);
    let mut vectors = NodeVectors::new();
    vectors.insert(0, axis());
    vectors.insert(1, unit_at(0.25));
    let m = SimilarityEngine::compute(&h, &vectors);
    let results = evaluator.evaluate(&h, &m);
    assert!(result_for(&results, RuleCode::Cv009).is_pass());
}

#[test]
fn rejects_unknown_override_code() {
    let config = RuleConfig::default().with_band_override("CV-099", Band::new(0.1, 0.2, 0.3));
    let err = ChecklistEvaluator::new(config).expect_err("unknown code is fatal");
    assert!(matches!(err, ConfigError::UnknownRuleCode { .. }));
}

#[test]
fn rejects_override_on_a_rule_without_a_band() {
    let config = RuleConfig::default().with_band_override("CV-015", Band::new(0.1, 0.2, 0.3));
    let err = ChecklistEvaluator::new(config).expect_err("no band to replace");
    assert!(matches!(err, ConfigError::RuleNotBanded { .. }));
}

#[test]
fn rejects_an_unordered_band() {
    let mut config = RuleConfig::default();
    config.title_h1_band = Band::new(0.9, 0.8, 0.7);
    let err = ChecklistEvaluator::new(config).expect_err("band out of order");
    assert!(matches!(err, ConfigError::InvalidBand { .. }));
}

#[test]
fn rejects_inverted_h2_count_band() {
    let config = RuleConfig::default().with_h2_count(6, 2);
    let err = ChecklistEvaluator::new(config).expect_err("min above max");
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn rejects_drift_threshold_outside_unit_range() {
    let config = RuleConfig::default().with_drift_threshold(1.5);
    let err = ChecklistEvaluator::new(config).expect_err("threshold out of range");
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn rules_without_a_subject_warn_with_nothing_to_evaluate() {
    let h = build(&[
        ("title", "Ciche zmywarki do zabudowy ranking"),
        ("meta", "Poznaj najcichsze modele zmywarek i ich realne koszty."),
        ("h1", "Ciche zmywarki"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    for code in [
        RuleCode::Cv012,
        RuleCode::Cv014,
        RuleCode::Cv015,
        RuleCode::Cv016,
        RuleCode::Cv017,
        RuleCode::Cv018,
        RuleCode::Cv019,
        RuleCode::Cv024,
        RuleCode::Cv025,
        RuleCode::Cv026,
        RuleCode::Cv027,
        RuleCode::Cv031,
        RuleCode::Cv035,
    ] {
        let result = result_for(&results, code);
        assert!(result.is_warn(), "{code} should warn");
        assert_eq!(result.evidence, Evidence::None, "{code}");
    }
    // The count rule judges the count itself, so zero H2 is a hard fail.
    assert!(result_for(&results, RuleCode::Cv013).is_fail());
}

#[test]
fn all_caps_heading_warns_with_its_index() {
    let h = build(&[
        ("title", "Ranking zmywarek 2025"),
        ("h1", "Ciche zmywarki"),
        ("h2", "RANKING ZMYWAREK 2025"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv030);
    assert!(result.is_warn());
    assert_eq!(result.evidence, Evidence::Nodes { indices: vec![2] });
}

#[test]
fn h2_before_h1_fails_the_order_rule() {
    let h = build(&[
        ("title", "Ranking zmywarek"),
        ("h2", "Najlepsze modele roku"),
        ("h1", "Ciche zmywarki"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv031);
    assert!(result.is_fail());
    assert_eq!(result.evidence, Evidence::Nodes { indices: vec![1] });
}

#[test]
fn whitespace_h1_fails_the_non_empty_rule() {
    let h = build(&[("title", "Ranking zmywarek"), ("h1", "   ")]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    assert!(result_for(&results, RuleCode::Cv010).is_fail());
}

#[test]
fn lonely_h3_group_warns_with_the_h2_index() {
    let h = build(&[
        ("title", "Ranking zmywarek"),
        ("h2", "Modele do zabudowy"),
        ("h3", "Zmywarki 45 cm"),
        ("h2", "Modele wolnostojace"),
        ("h3", "Zmywarki 60 cm"),
        ("h3", "Zmywarki kompaktowe"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv024);
    assert!(result.is_warn());
    assert_eq!(result.evidence, Evidence::Nodes { indices: vec![1] });
}

#[test]
fn h3_volume_limit_is_three_per_h2() {
    let h = build(&[
        ("title", "Ranking zmywarek"),
        ("h2", "Modele do zabudowy"),
        ("h3", "Zmywarki 45 cm"),
        ("h3", "Zmywarki 60 cm"),
        ("h3", "Zmywarki kompaktowe"),
        ("h3", "Zmywarki modulowe"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv027);
    assert!(result.is_fail());
    assert_eq!(
        result.evidence,
        Evidence::Ratio {
            numerator: 4,
            denominator: 1
        }
    );
}

#[test]
fn weakest_h3_fails_the_floor_while_the_mean_holds() {
    let h = build(&[
        ("title", "Ranking zmywarek"),
        ("h2", "Modele do zabudowy"),
        ("h3", "Zmywarki 45 cm"),
        ("h3", "Pielegnacja ogrodu zima"),
    ]);
    let mut vectors = NodeVectors::new();
    vectors.insert(1, axis());
    vectors.insert(2, unit_at(0.90));
    vectors.insert(3, unit_at(0.35));
    let m = SimilarityEngine::compute(&h, &vectors);
    let results = evaluator().evaluate(&h, &m);

    // Mean (0.9 + 0.35) / 2 clears the 0.60 floor.
    assert!(result_for(&results, RuleCode::Cv019).is_pass());
    let weakest = result_for(&results, RuleCode::Cv035);
    assert!(weakest.is_fail());
    assert_eq!(weakest.node, Some(3));
}

#[test]
fn separator_count_uses_the_original_title_text() {
    let h = build(&[("title", "Zmywarki: ranking | opinie - testy")]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv028);
    assert!(result.is_warn());
    assert_eq!(result.evidence, Evidence::Count { actual: 3 });
}

#[test]
fn keyword_echo_warns_when_the_keyword_stays_in_the_title() {
    let h = build(&[
        ("title", "Zmywarki ranking 2025"),
        ("h1", "Pralki automatyczne"),
    ]);
    let results = evaluator().evaluate(&h, &no_vectors(&h));
    let result = result_for(&results, RuleCode::Cv029);
    assert!(result.is_warn());
    assert_eq!(result.evidence, Evidence::Count { actual: 1 });
    assert!(result.message.contains("zmywarki"));
}

#[test]
fn polish_audit_scenario_matches_the_expected_verdicts() {
    let h = build(&[
        ("title", "Ciche Zmywarki - Top 12 Modeli 2025"),
        ("h1", "Ranking cichych zmywarek do zabudowy"),
        ("h2", "Jak wybrac cicha zmywarke?"),
        ("h2", "Ranking modeli 45 cm"),
        ("h2", "Opinie uzytkownikow"),
    ]);
    let mut vectors = NodeVectors::new();
    vectors.insert(0, axis());
    vectors.insert(1, unit_at(0.85));
    vectors.insert(2, unit_at(0.90));
    vectors.insert(3, unit_at(0.88));
    vectors.insert(4, unit_at(0.82));
    let m = SimilarityEngine::compute(&h, &vectors);
    let results = evaluator().evaluate(&h, &m);

    assert_eq!(results.len(), 36);
    // 35 characters, under the 50-60 band.
    assert!(result_for(&results, RuleCode::Cv002).is_fail());
    assert!(result_for(&results, RuleCode::Cv005).is_fail());
    assert!(result_for(&results, RuleCode::Cv008).is_pass());
    assert!(result_for(&results, RuleCode::Cv009).is_pass());
    assert!(result_for(&results, RuleCode::Cv013).is_fail());
    let overall = ChecklistEvaluator::overall_score(&results);
    assert!(overall < 100.0);
    assert_eq!(
        result_for(&results, RuleCode::Cv036).evidence,
        Evidence::Score {
            value: overall as f32
        }
    );
}

#[test]
fn results_serialize_with_catalogue_labels() {
    let (h, m) = healthy_page();
    let results = evaluator().evaluate(&h, &m);
    let value = serde_json::to_value(&results[0]).expect("result serializes");
    assert_eq!(value["code"], "CV-001");
    assert_eq!(value["priority"], "critical");
    assert_eq!(value["status"], "pass");
}
