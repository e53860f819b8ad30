use mapf_instance::path_from_locations;
use mapf_lns::path_table::PathTable;
use mapf_lns::HashSet;

#[test]
fn test_occupancy_and_parking() {
    let mut table = PathTable::new(16);
    table.insert_path(0, &path_from_locations(vec![0, 1, 2]));

    assert_eq!(table.occupant(0, 0), Some(0));
    assert_eq!(table.occupant(1, 1), Some(0));
    assert_eq!(table.occupant(2, 2), Some(0));
    assert_eq!(table.occupant(1, 0), None);
    assert_eq!(table.occupant(3, 0), None);
    // parked at its goal forever after arrival
    assert_eq!(table.occupant(2, 50), Some(0));
    assert_eq!(table.occupant(2, 1), None);
    assert_eq!(table.makespan(), 2);
}

#[test]
fn test_constrained_vertex() {
    let mut table = PathTable::new(16);
    table.insert_path(1, &path_from_locations(vec![4, 5, 6, 7]));
    // arriving at 6 at timestep 2 hits agent 1's reservation
    assert!(table.constrained(5, 6, 2));
    assert!(!table.constrained(5, 6, 1));
}

#[test]
fn test_constrained_swap() {
    let mut table = PathTable::new(16);
    table.insert_path(1, &path_from_locations(vec![6, 7]));
    // moving 7 -> 6 arriving at timestep 1 swaps with agent 1
    assert!(table.constrained(7, 6, 1));
    // a wait is never a swap
    assert!(!table.constrained(6, 6, 2));
}

#[test]
fn test_constrained_parked() {
    let mut table = PathTable::new(16);
    table.insert_path(1, &path_from_locations(vec![4, 5]));
    // agent 1 parks on 5 from timestep 1 on
    assert!(table.constrained(6, 5, 1));
    assert!(table.constrained(6, 5, 99));
    assert!(!table.constrained(4, 5, 0));
}

#[test]
fn test_can_park() {
    let mut table = PathTable::new(16);
    table.insert_path(0, &path_from_locations(vec![4, 5, 6]));
    // goal cell is taken
    assert!(!table.can_park(6, 0));
    // agent 0 traverses 5 at timestep 1, so parking there at 0 fails
    assert!(!table.can_park(5, 0));
    // but parking at 5 after the traversal is fine
    assert!(table.can_park(5, 1));
    assert!(table.can_park(9, 0));
}

#[test]
fn test_delete_restores_the_table() {
    let mut table = PathTable::new(16);
    let path = path_from_locations(vec![0, 1, 2, 3]);
    table.insert_path(0, &path);
    table.delete_path(0, &path);

    for t in 0..6 {
        for loc in 0..16 {
            assert_eq!(table.occupant(loc, t), None);
        }
    }
    assert!(!table.constrained(2, 3, 3));
    assert!(table.can_park(3, 0));
    // the makespan is a planning horizon and never shrinks
    assert_eq!(table.makespan(), 3);
}

#[test]
fn test_conflicting_agents_reports_occupant() {
    let mut table = PathTable::new(16);
    table.insert_path(1, &path_from_locations(vec![4, 5, 6, 7]));

    // agent 1 sits on cell 7 at timestep 3; moving 6 -> 7 arriving at 3
    // must report it
    let mut set: HashSet<usize> = HashSet::default();
    table.conflicting_agents(0, &mut set, 6, 7, 3);
    assert!(set.contains(&1));
    assert_eq!(set.len(), 1);

    // the querying agent never reports itself
    let mut set: HashSet<usize> = HashSet::default();
    table.conflicting_agents(1, &mut set, 6, 7, 3);
    assert!(set.is_empty());
}

#[test]
fn test_conflicting_agents_reports_swap_and_parked() {
    let mut table = PathTable::new(16);
    table.insert_path(1, &path_from_locations(vec![6, 7]));
    table.insert_path(2, &path_from_locations(vec![9, 10]));

    let mut set: HashSet<usize> = HashSet::default();
    // swapping against agent 1 across the (7, 6) edge
    table.conflicting_agents(0, &mut set, 7, 6, 1);
    // agent 2 parked on 10
    table.conflicting_agents(0, &mut set, 9, 10, 40);
    assert!(set.contains(&1));
    assert!(set.contains(&2));
}

#[test]
fn test_agents_near_caps_at_k() {
    let mut table = PathTable::new(16);
    table.insert_path(0, &path_from_locations(vec![0, 1]));
    table.insert_path(1, &path_from_locations(vec![2, 2, 1, 5]));
    table.insert_path(2, &path_from_locations(vec![5, 5, 5, 1, 2]));

    let mut set: HashSet<usize> = HashSet::default();
    table.agents_near(&mut set, 2, 1);
    assert_eq!(set.len(), 2);

    let mut set: HashSet<usize> = HashSet::default();
    table.agents_near(&mut set, 8, 1);
    assert_eq!(set.len(), 3);
}
