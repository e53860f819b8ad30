use mapf_structs::{DestroyStrategy, LnsConfig, RepairStrategy, SizeMode};

#[test]
fn test_destroy_strategy_from_str() {
    assert_eq!(
        "adaptive".parse::<DestroyStrategy>().unwrap(),
        DestroyStrategy::Adaptive
    );
    assert_eq!(
        "RandomWalk".parse::<DestroyStrategy>().unwrap(),
        DestroyStrategy::RandomWalk
    );
    assert_eq!(
        "random".parse::<DestroyStrategy>().unwrap(),
        DestroyStrategy::RandomAgents
    );
    assert!("nope".parse::<DestroyStrategy>().is_err());
}

#[test]
fn test_repair_strategy_from_str() {
    assert_eq!(
        "pp".parse::<RepairStrategy>().unwrap(),
        RepairStrategy::Prioritized
    );
    assert_eq!(
        "exact".parse::<RepairStrategy>().unwrap(),
        RepairStrategy::ExactJoint
    );
    assert_eq!(
        "pibt".parse::<RepairStrategy>().unwrap(),
        RepairStrategy::PriorityInheritance
    );
    assert_eq!(
        "winPIBT".parse::<RepairStrategy>().unwrap(),
        RepairStrategy::PriorityInheritanceWindowed
    );
}

#[test]
fn test_display_roundtrip() {
    for s in [
        DestroyStrategy::RandomAgents,
        DestroyStrategy::RandomWalk,
        DestroyStrategy::Intersection,
        DestroyStrategy::Adaptive,
    ] {
        assert_eq!(s.to_string().parse::<DestroyStrategy>().unwrap(), s);
    }
    for s in [SizeMode::Fixed, SizeMode::Uniform, SizeMode::Bandit] {
        assert_eq!(s.to_string().parse::<SizeMode>().unwrap(), s);
    }
}

#[test]
fn test_config_defaults() {
    let config = LnsConfig::default();
    assert_eq!(config.time_limit, 60.0);
    assert_eq!(config.max_iterations, 0);
    assert_eq!(config.neighborhood_size, 8);
    assert_eq!(config.size_mode, SizeMode::Fixed);
    assert_eq!(config.destroy_strategy, DestroyStrategy::Adaptive);
    assert_eq!(config.repair_strategy, RepairStrategy::Prioritized);
    assert_eq!(config.replan_time_limit, 0.6);
    assert!(!config.accept_equal_cost);
    assert!(config.random_restarts);
    assert_eq!(config.verbosity, 0);
}

#[test]
fn test_config_partial_json() {
    let config: LnsConfig = serde_json::from_str(
        r#"{
            "time_limit": 5.0,
            "destroy_strategy": "Intersection",
            "repair_strategy": "ExactJoint",
            "size_mode": "Bandit",
            "random_restarts": false
        }"#,
    )
    .unwrap();
    assert_eq!(config.time_limit, 5.0);
    assert_eq!(config.destroy_strategy, DestroyStrategy::Intersection);
    assert_eq!(config.repair_strategy, RepairStrategy::ExactJoint);
    assert_eq!(config.size_mode, SizeMode::Bandit);
    assert!(!config.random_restarts);
    // untouched fields keep their defaults
    assert_eq!(config.neighborhood_size, 8);
    assert_eq!(config.pibt_window, 5);
}

#[test]
fn test_config_json_roundtrip() {
    let config = LnsConfig::default();
    let text = serde_json::to_string(&config).unwrap();
    let restored: LnsConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, config);
}
