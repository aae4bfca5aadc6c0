use serde::{Deserialize, Serialize};

use crate::components::{Animal, Car, Color, LightState, Pedestrian, TrafficLight, VerticalBand};
use crate::geometry::BoundingBox;

/// Canvas size and the road's vertical extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub width: i32,
    pub height: i32,
    pub road_top: i32,
    pub road_bottom: i32,
}

impl Scene {
    pub fn road_band(&self) -> VerticalBand {
        VerticalBand {
            min: self.road_top,
            max: self.road_bottom,
        }
    }

    /// Strictly between the road edges.
    pub fn within_road(&self, y: i32) -> bool {
        y > self.road_top && y < self.road_bottom
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            road_top: 250,
            road_bottom: 350,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarView {
    pub id: String,
    pub bounds: BoundingBox,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightView {
    pub x: i32,
    pub y: i32,
    pub state: LightState,
}

/// Everything a renderer needs to draw one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub scene: Scene,
    pub cars: Vec<CarView>,
    pub pedestrians: Vec<BoundingBox>,
    pub animals: Vec<BoundingBox>,
    pub light: LightView,
}

#[derive(Debug)]
pub struct World {
    scene: Scene,
    pub(crate) cars: Vec<Car>,
    pub(crate) pedestrians: Vec<Pedestrian>,
    pub(crate) animals: Vec<Animal>,
    pub(crate) light: TrafficLight,
}

impl World {
    pub fn new(scene: Scene, light: TrafficLight) -> Self {
        Self {
            scene,
            cars: Vec::new(),
            pedestrians: Vec::new(),
            animals: Vec::new(),
            light,
        }
    }

    pub fn spawn_car(&mut self, car: Car) {
        self.cars.push(car);
    }

    pub fn spawn_pedestrian(&mut self, pedestrian: Pedestrian) {
        self.pedestrians.push(pedestrian);
    }

    pub fn spawn_animal(&mut self, animal: Animal) {
        self.animals.push(animal);
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn car(&self, id: &str) -> Option<&Car> {
        self.cars.iter().find(|car| car.id == id)
    }

    pub fn pedestrians(&self) -> &[Pedestrian] {
        &self.pedestrians
    }

    pub fn animals(&self) -> &[Animal] {
        &self.animals
    }

    pub fn light(&self) -> &TrafficLight {
        &self.light
    }

    pub fn entity_count(&self) -> usize {
        self.cars.len() + self.pedestrians.len() + self.animals.len() + 1
    }

    pub fn snapshot(&self, tick: u64) -> FrameSnapshot {
        FrameSnapshot {
            tick,
            scene: self.scene,
            cars: self
                .cars
                .iter()
                .map(|car| CarView {
                    id: car.id.clone(),
                    bounds: car.bounding_box(),
                    color: car.color,
                })
                .collect(),
            pedestrians: self.pedestrians.iter().map(|p| p.bounding_box()).collect(),
            animals: self.animals.iter().map(|a| a.bounding_box()).collect(),
            light: LightView {
                x: self.light.x,
                y: self.light.y,
                state: self.light.state,
            },
        }
    }
}
