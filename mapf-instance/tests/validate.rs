use mapf_instance::{path_from_locations, GridMap, Instance, Path};

// Two agents swapping rows on an open 2x4 grid.
//
//   0  1  2  3
//   4  5  6  7
fn two_agents() -> Instance {
    let map = GridMap::open(2, 4);
    Instance::new(map, vec![0, 4], vec![3, 7]).unwrap()
}

fn straight_paths() -> Vec<Path> {
    vec![
        path_from_locations(vec![0, 1, 2, 3]),
        path_from_locations(vec![4, 5, 6, 7]),
    ]
}

#[test]
fn test_valid_solution_cost() {
    let instance = two_agents();
    assert_eq!(instance.verify_solution(&straight_paths()).unwrap(), 6);
}

#[test]
fn test_wait_steps_are_counted() {
    let instance = two_agents();
    let paths = vec![
        path_from_locations(vec![0, 0, 1, 2, 3]),
        path_from_locations(vec![4, 5, 6, 7]),
    ];
    assert_eq!(instance.verify_solution(&paths).unwrap(), 7);
}

#[test]
fn test_rejects_wrong_path_count() {
    let instance = two_agents();
    let paths = vec![path_from_locations(vec![0, 1, 2, 3])];
    assert!(instance.verify_solution(&paths).is_err());
}

#[test]
fn test_rejects_empty_path() {
    let instance = two_agents();
    let paths = vec![path_from_locations(vec![0, 1, 2, 3]), Path::new()];
    let err = instance.verify_solution(&paths).unwrap_err().to_string();
    assert!(err.contains("no solution for agent 1"), "{}", err);
}

#[test]
fn test_rejects_wrong_start() {
    let instance = two_agents();
    let paths = vec![
        path_from_locations(vec![1, 2, 3]),
        path_from_locations(vec![4, 5, 6, 7]),
    ];
    let err = instance.verify_solution(&paths).unwrap_err().to_string();
    assert!(err.contains("starts from location 1"), "{}", err);
}

#[test]
fn test_rejects_wrong_goal() {
    let instance = two_agents();
    let paths = vec![
        path_from_locations(vec![0, 1, 2]),
        path_from_locations(vec![4, 5, 6, 7]),
    ];
    let err = instance.verify_solution(&paths).unwrap_err().to_string();
    assert!(err.contains("ends at location 2"), "{}", err);
}

#[test]
fn test_rejects_discontinuous_path() {
    let instance = two_agents();
    let paths = vec![
        path_from_locations(vec![0, 2, 3]),
        path_from_locations(vec![4, 5, 6, 7]),
    ];
    let err = instance.verify_solution(&paths).unwrap_err().to_string();
    assert!(
        err.contains("jumps from 0 to 2") && err.contains("between timesteps 0 and 1"),
        "{}",
        err
    );
}

#[test]
fn test_detects_vertex_conflict() {
    let instance = two_agents();
    // both agents stand on cell 5 at timestep 2
    let paths = vec![
        path_from_locations(vec![0, 1, 5, 1, 2, 3]),
        path_from_locations(vec![4, 5, 5, 6, 7]),
    ];
    let err = instance.verify_solution(&paths).unwrap_err().to_string();
    assert!(
        err.contains("vertex conflict") && err.contains("at location 5 at timestep 2"),
        "{}",
        err
    );
}

#[test]
fn test_detects_edge_conflict() {
    let instance = two_agents();
    // agents 0 and 1 swap across the edge (1, 5) between timesteps 1 and 2
    let paths = vec![
        path_from_locations(vec![0, 1, 5, 6, 7, 3]),
        path_from_locations(vec![4, 5, 1, 2, 3, 7]),
    ];
    let err = instance.verify_solution(&paths).unwrap_err().to_string();
    assert!(err.contains("edge conflict"), "{}", err);
}

#[test]
fn test_detects_target_conflict() {
    let map = GridMap::open(1, 4);
    let instance = Instance::new(map, vec![0, 3], vec![1, 2]).unwrap();
    // agent 0 parks at cell 1 at timestep 1; agent 1 passes through cell 1
    // at timestep 2 on a detour
    let paths = vec![
        path_from_locations(vec![0, 1]),
        path_from_locations(vec![3, 2, 1, 2]),
    ];
    let err = instance.verify_solution(&paths).unwrap_err().to_string();
    assert!(err.contains("target conflict"), "{}", err);
}
