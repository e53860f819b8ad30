use mapf_instance::{path_from_locations, GridMap, Instance};
use mapf_lns::agent::{build_registry, Agent};
use mapf_lns::destroy::{DestroyHeuristic, NeighborSelector, DESTROY_COUNT};
use mapf_lns::{seeded_hasher, PathTable};
use rand::{rngs::SmallRng, SeedableRng};

fn selector() -> NeighborSelector {
    NeighborSelector::new(seeded_hasher(&[5u8; 32]))
}

fn rng() -> SmallRng {
    SmallRng::from_seed([9u8; 32])
}

fn six_agents() -> (Instance, Vec<Agent>, PathTable) {
    let map = GridMap::open(4, 4);
    let instance =
        Instance::new(map, vec![0, 1, 2, 3, 4, 5], vec![10, 11, 12, 13, 14, 15]).unwrap();
    let agents = build_registry(&instance);
    let table = PathTable::new(instance.map.size());
    (instance, agents, table)
}

#[test]
fn test_arm_mapping() {
    assert_eq!(DESTROY_COUNT, 3);
    assert_eq!(DestroyHeuristic::from_arm(0), DestroyHeuristic::RandomWalk);
    assert_eq!(DestroyHeuristic::from_arm(1), DestroyHeuristic::Intersection);
    assert_eq!(DestroyHeuristic::from_arm(2), DestroyHeuristic::RandomAgents);
}

#[test]
fn test_random_agents_exact_k() {
    let (instance, agents, table) = six_agents();
    let mut selector = selector();
    let mut rng = rng();
    for _ in 0..20 {
        let ids = selector
            .generate(
                DestroyHeuristic::RandomAgents,
                &agents,
                &table,
                &instance.map,
                3,
                &mut rng,
            )
            .unwrap()
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(ids.iter().all(|&id| id < agents.len()));
    }
}

#[test]
fn test_random_agents_caps_at_population() {
    let (instance, agents, table) = six_agents();
    let ids = selector()
        .generate(
            DestroyHeuristic::RandomAgents,
            &agents,
            &table,
            &instance.map,
            10,
            &mut rng(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_random_walk_takes_everyone_when_k_exceeds_population() {
    let (instance, agents, table) = six_agents();
    let ids = selector()
        .generate(
            DestroyHeuristic::RandomWalk,
            &agents,
            &table,
            &instance.map,
            10,
            &mut rng(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_random_walk_needs_a_delayed_agent() {
    // every agent already runs its shortest path, so there is no anchor
    let map = GridMap::open(2, 3);
    let instance = Instance::new(map, vec![0, 2, 3], vec![1, 5, 4]).unwrap();
    let mut agents = build_registry(&instance);
    let mut table = PathTable::new(instance.map.size());
    agents[0].path = path_from_locations(vec![0, 1]);
    agents[1].path = path_from_locations(vec![2, 5]);
    agents[2].path = path_from_locations(vec![3, 4]);
    for agent in &agents {
        table.insert_path(agent.id, &agent.path);
    }

    let generated = selector()
        .generate(
            DestroyHeuristic::RandomWalk,
            &agents,
            &table,
            &instance.map,
            2,
            &mut rng(),
        )
        .unwrap();
    assert_eq!(generated, None);
}

#[test]
fn test_random_walk_collects_a_blocking_agent() {
    // agent 0 idles in front of agent 1's long reservation on a 2x3 grid;
    // the walk from the delayed anchor must run into it
    let map = GridMap::open(2, 3);
    let instance = Instance::new(map, vec![0, 3, 2], vec![1, 4, 5]).unwrap();
    let mut agents = build_registry(&instance);
    let mut table = PathTable::new(instance.map.size());
    agents[0].path = path_from_locations(vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    agents[1].path = path_from_locations(vec![3, 3, 3, 3, 3, 3, 3, 3, 3, 4]);
    agents[2].path = path_from_locations(vec![2, 5]);
    for agent in &agents {
        table.insert_path(agent.id, &agent.path);
    }

    let ids = selector()
        .generate(
            DestroyHeuristic::RandomWalk,
            &agents,
            &table,
            &instance.map,
            2,
            &mut rng(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&0));
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_intersection_requires_intersections() {
    // a corridor has no cell of degree > 2
    let map = GridMap::open(1, 5);
    let instance = Instance::new(map, vec![0, 4], vec![4, 0]).unwrap();
    let agents = build_registry(&instance);
    let table = PathTable::new(instance.map.size());
    let result = selector().generate(
        DestroyHeuristic::Intersection,
        &agents,
        &table,
        &instance.map,
        2,
        &mut rng(),
    );
    assert!(result.is_err());
}

#[test]
fn test_intersection_collects_agents_near_intersections() {
    let map = GridMap::open(3, 3);
    let instance = Instance::new(map, vec![3, 1], vec![5, 7]).unwrap();
    let mut agents = build_registry(&instance);
    let mut table = PathTable::new(instance.map.size());
    agents[0].path = path_from_locations(vec![3, 4, 5]);
    agents[1].path = path_from_locations(vec![1, 1, 4, 7]);
    for agent in &agents {
        table.insert_path(agent.id, &agent.path);
    }

    let mut selector = selector();
    let mut rng = rng();
    for _ in 0..10 {
        let ids = selector
            .generate(
                DestroyHeuristic::Intersection,
                &agents,
                &table,
                &instance.map,
                2,
                &mut rng,
            )
            .unwrap()
            .unwrap();
        assert_eq!(ids, vec![0, 1]);
    }
}
