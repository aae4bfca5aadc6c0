use super::{ViolationEvent, ViolationKind};
use crate::components::{Animal, Car, Pedestrian};
use crate::geometry::overlaps;

/// Both cars of every overlapping pair are charged, so a single crash yields
/// two events.
pub fn detect_accidents(cars: &[Car], tick: u64) -> Vec<ViolationEvent> {
    let mut events = Vec::new();
    for (i, first) in cars.iter().enumerate() {
        for second in &cars[i + 1..] {
            if overlaps(&first.bounding_box(), &second.bounding_box()) {
                events.push(ViolationEvent::new(
                    first.id.clone(),
                    ViolationKind::Accident,
                    tick,
                ));
                events.push(ViolationEvent::new(
                    second.id.clone(),
                    ViolationKind::Accident,
                    tick,
                ));
            }
        }
    }
    events
}

pub fn detect_hit_and_runs(
    cars: &[Car],
    pedestrians: &[Pedestrian],
    tick: u64,
) -> Vec<ViolationEvent> {
    let mut events = Vec::new();
    for car in cars {
        let car_box = car.bounding_box();
        for pedestrian in pedestrians {
            if overlaps(&car_box, &pedestrian.bounding_box()) {
                events.push(ViolationEvent::new(
                    car.id.clone(),
                    ViolationKind::HitAndRun,
                    tick,
                ));
            }
        }
    }
    events
}

pub fn detect_animal_collisions(cars: &[Car], animals: &[Animal], tick: u64) -> Vec<ViolationEvent> {
    let mut events = Vec::new();
    for car in cars {
        let car_box = car.bounding_box();
        for animal in animals {
            if overlaps(&car_box, &animal.bounding_box()) {
                events.push(ViolationEvent::new(
                    car.id.clone(),
                    ViolationKind::AnimalCollision,
                    tick,
                ));
            }
        }
    }
    events
}
