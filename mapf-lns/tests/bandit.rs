use mapf_lns::bandit::{AdaptiveBandit, BanditStats, SIZE_CANDIDATES};
use rand::{rngs::SmallRng, SeedableRng};

fn rng() -> SmallRng {
    SmallRng::from_seed([4u8; 32])
}

#[test]
fn test_initial_state() {
    let stats = BanditStats::new(3);
    assert_eq!(stats.arms(), 3);
    assert_eq!(stats.weights, vec![1.0; 3]);
    assert_eq!(stats.weights_squared, vec![1.0; 3]);
    assert_eq!(stats.counts, vec![0; 3]);
}

#[test]
fn test_update_is_exponential_smoothing() {
    let mut stats = BanditStats::new(2);
    stats.update(0, 10.0);
    assert!((stats.weights[0] - 1.9).abs() < 1e-12);
    assert!((stats.weights_squared[0] - 10.9).abs() < 1e-12);
    assert_eq!(stats.counts[0], 1);
    // the other arm is untouched
    assert_eq!(stats.weights[1], 1.0);
    assert_eq!(stats.counts[1], 0);
}

#[test]
fn test_zero_reward_decays_the_weight() {
    let mut stats = BanditStats::new(2);
    for _ in 0..50 {
        stats.update(0, 0.0);
    }
    assert!(stats.weights[0] < 0.01);
}

#[test]
fn test_sample_single_arm() {
    let stats = BanditStats::new(1);
    let mut rng = rng();
    for _ in 0..10 {
        assert_eq!(stats.sample(&mut rng), 0);
    }
}

#[test]
fn test_sample_favors_the_rewarded_arm() {
    let mut stats = BanditStats::new(3);
    for _ in 0..100 {
        stats.update(0, 20.0);
        stats.update(1, 0.0);
        stats.update(2, 0.0);
    }
    let mut rng = rng();
    let hits = (0..1000).filter(|_| stats.sample(&mut rng) == 0).count();
    assert!(hits > 700, "arm 0 sampled {} of 1000 times", hits);
}

#[test]
fn test_sample_never_starves_an_arm() {
    let mut stats = BanditStats::new(2);
    for _ in 0..10 {
        stats.update(0, 20.0);
        stats.update(1, 0.0);
    }
    let mut rng = rng();
    let losing_hits = (0..2000).filter(|_| stats.sample(&mut rng) == 1).count();
    assert!(losing_hits > 0);
}

#[test]
fn test_adaptive_bandit_sampling_ranges() {
    let bandit = AdaptiveBandit::new(3, SIZE_CANDIDATES.len());
    let mut rng = rng();
    for _ in 0..50 {
        let (heuristic, size) = bandit.sample(&mut rng);
        assert!(heuristic < 3);
        assert!(size.unwrap() < SIZE_CANDIDATES.len());
    }
}

#[test]
fn test_adaptive_bandit_without_size_buckets() {
    let bandit = AdaptiveBandit::new(3, 0);
    let mut rng = rng();
    let (heuristic, size) = bandit.sample(&mut rng);
    assert!(heuristic < 3);
    assert_eq!(size, None);
}

#[test]
fn test_single_heuristic_stays_fixed() {
    let mut bandit = AdaptiveBandit::new(1, 0);
    bandit.update(0, None, 100.0);
    assert_eq!(bandit.heuristic_stats().weights, vec![1.0]);
    assert_eq!(bandit.heuristic_stats().counts, vec![0]);
}
