use skirmish_core::{Creature, CreatureSize, Dimension, Direction, Location, MapFeature, Rectangle};
use skirmish_grid::BattleMap;
use skirmish_system_movement::{compute_movement, MovementError, MovementMap, UNREACHABLE};

fn at(column: u32, row: u32) -> Location {
    Location::new(column, row).expect("valid location")
}

fn open_map() -> BattleMap {
    BattleMap::new(Dimension::new(13, 12).expect("valid dimension"), "movement")
}

/// Column 9 is difficult terrain from bottom to top.
fn difficult_column_map() -> BattleMap {
    let mut map = open_map();
    for row in 0..12 {
        let _ = map
            .add_feature(at(9, row), MapFeature::Difficult)
            .expect("on map");
    }
    map
}

/// A solid block in columns 3 to 5, rows 3 to 6, and a wall east of column 8.
fn walled_map() -> BattleMap {
    let mut map = open_map();
    map.mark_solid_area(&Rectangle::new(at(3, 3), at(5, 6)))
        .expect("block on map");
    for row in 3..=6 {
        map.add_double_wall(at(8, row), Direction::East)
            .expect("wall on map");
    }
    map
}

fn costs(map: &BattleMap, size: CreatureSize, start: Location) -> MovementMap {
    compute_movement(map, &Creature::new(size, start)).expect("movement")
}

#[test]
fn medium_creature_pays_extra_for_difficult_terrain() {
    let movement = costs(&difficult_column_map(), CreatureSize::Medium, at(2, 2));
    assert_eq!(movement.get_move(at(2, 2)), 0);
    assert_eq!(movement.get_move(at(3, 3)), 1);
    assert_eq!(movement.get_move(at(4, 4)), 3);
    assert_eq!(movement.get_move(at(5, 5)), 4);
    assert_eq!(movement.get_move(at(6, 6)), 6);
    assert_eq!(movement.get_move(at(8, 2)), 6);
    assert_eq!(movement.get_move(at(9, 2)), 8);
    assert_eq!(movement.get_move(at(10, 2)), 9);
}

#[test]
fn medium_creature_walks_around_walls() {
    let movement = costs(&walled_map(), CreatureSize::Medium, at(2, 2));
    assert_eq!(movement.get_move(at(3, 7)), 6);
    assert_eq!(movement.get_move(at(0, 0)), 3);
    assert_eq!(movement.get_move(at(4, 4)), UNREACHABLE);
}

#[test]
fn large_creature_costs_cover_its_footprint() {
    let movement = costs(&difficult_column_map(), CreatureSize::Large, at(1, 1));
    assert_eq!(movement.get_move(at(1, 1)), 0);
    assert_eq!(movement.get_move(at(2, 2)), 0);
    assert_eq!(movement.get_move(at(3, 3)), 1);
    assert_eq!(movement.get_move(at(4, 4)), 3);
    assert_eq!(movement.get_move(at(5, 5)), 4);
    assert_eq!(movement.get_move(at(6, 6)), 6);
    assert_eq!(movement.get_move(at(8, 1)), 6);
    assert_eq!(movement.get_move(at(9, 1)), 8);
    assert_eq!(movement.get_move(at(10, 1)), 10);
    assert_eq!(movement.get_move(at(11, 1)), 11);
}

#[test]
fn large_creature_walks_around_walls() {
    let movement = costs(&walled_map(), CreatureSize::Large, at(1, 1));
    assert_eq!(movement.get_move(at(4, 7)), 8);
}

#[test]
fn huge_creature_moves_on_an_open_map() {
    let movement = costs(&open_map(), CreatureSize::Huge, at(0, 0));
    assert_eq!(movement.get_move(at(2, 2)), 0);
    assert_eq!(movement.get_move(at(3, 3)), 1);
    assert_eq!(movement.get_move(at(4, 4)), 3);
}

#[test]
fn open_map_costs_from_the_corner() {
    let movement = costs(&open_map(), CreatureSize::Medium, at(0, 0));
    assert_eq!(movement.get_move(at(3, 3)), 4);
    assert_eq!(movement.get_move(at(1, 0)), 1);
    assert_eq!(movement.reachable().count(), 13 * 12);
}

#[test]
fn every_reached_square_has_a_cheaper_neighbour() {
    for map in [difficult_column_map(), walled_map()] {
        let start = at(2, 2);
        let movement = costs(&map, CreatureSize::Medium, start);
        for (location, cost) in movement.reachable() {
            if location == start {
                continue;
            }
            let cheaper = movement
                .reachable()
                .any(|(other, other_cost)| other != location && location.is_neighbor_of(other) && other_cost < cost);
            assert!(cheaper, "{location} at {cost} has no cheaper neighbour");
        }
    }
}

#[test]
fn pits_and_lava_cannot_be_entered() {
    let mut map = open_map();
    let ring = Rectangle::new(at(1, 1), at(3, 3));
    for (index, location) in ring.locations().filter(|l| *l != at(2, 2)).enumerate() {
        let feature = if index % 2 == 0 {
            MapFeature::Pit
        } else {
            MapFeature::Lava
        };
        let _ = map.add_feature(location, feature).expect("on map");
    }
    let movement = costs(&map, CreatureSize::Medium, at(2, 2));
    assert_eq!(movement.reachable().collect::<Vec<_>>(), vec![(at(2, 2), 0)]);
}

#[test]
fn unsupported_requests_are_rejected() {
    let map = open_map();
    assert_eq!(
        compute_movement(&map, &Creature::new(CreatureSize::Gargantuan, at(0, 0))),
        Err(MovementError::UnsupportedCreatureSize(CreatureSize::Gargantuan))
    );
    assert_eq!(
        compute_movement(&map, &Creature::new(CreatureSize::Medium, at(20, 3))),
        Err(MovementError::CreatureOutOfBounds(at(20, 3)))
    );
    assert_eq!(
        compute_movement(&map, &Creature::new(CreatureSize::Large, at(12, 11))),
        Err(MovementError::CreatureOutOfBounds(at(12, 11)))
    );
    assert_eq!(
        compute_movement(&map, &Creature::new(CreatureSize::Huge, at(11, 0))),
        Err(MovementError::CreatureOutOfBounds(at(11, 0)))
    );
    assert!(compute_movement(&map, &Creature::new(CreatureSize::Huge, at(10, 9))).is_ok());

    let mut small = MovementMap::new(Dimension::new(4, 4).expect("valid dimension"));
    assert_eq!(
        small.compute(&map, &Creature::new(CreatureSize::Medium, at(0, 0))),
        Err(MovementError::DimensionMismatch {
            expected: Dimension::new(4, 4).expect("valid dimension"),
            found: map.dimension(),
        })
    );
}
