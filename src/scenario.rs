use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    components::{Animal, Car, Color, EntityError, Pedestrian, TrafficLight, VerticalBand},
    engine::EngineSettings,
    rng::RngManager,
    rules::RuleConfig,
    sink::{FineTable, Ledger, Owner, VehicleRegistry, DEFAULT_PAYMENT_PORTAL},
    world::{Scene, World},
};

fn default_pacing_ms() -> u64 {
    40
}

fn default_light_period() -> u64 {
    150
}

fn default_car_width() -> i32 {
    60
}

fn default_car_height() -> i32 {
    30
}

fn default_min_speed() -> i32 {
    5
}

fn default_max_speed() -> i32 {
    15
}

fn default_pedestrian_radius() -> i32 {
    12
}

fn default_pedestrian_speed() -> i32 {
    3
}

fn default_pedestrian_margin() -> i32 {
    50
}

fn default_animal_width() -> i32 {
    40
}

fn default_animal_height() -> i32 {
    25
}

fn default_animal_speed() -> i32 {
    2
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_payment_portal() -> String {
    DEFAULT_PAYMENT_PORTAL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default)]
    pub scene: Scene,
    #[serde(default)]
    pub rules: RuleConfig,
    pub traffic_light: LightSpec,
    #[serde(default)]
    pub car_defaults: CarDefaults,
    #[serde(default)]
    pub pedestrian_defaults: PedestrianDefaults,
    #[serde(default)]
    pub animal_defaults: AnimalDefaults,
    #[serde(default)]
    pub cars: Vec<CarSpec>,
    #[serde(default)]
    pub pedestrians: Vec<WalkerSpec>,
    #[serde(default)]
    pub animals: Vec<WalkerSpec>,
    #[serde(default)]
    pub vehicles: VehicleRegistry,
    #[serde(default)]
    pub fines: FineTable,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightSpec {
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_light_period")]
    pub period: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarDefaults {
    #[serde(default = "default_car_width")]
    pub width: i32,
    #[serde(default = "default_car_height")]
    pub height: i32,
    #[serde(default = "default_min_speed")]
    pub min_speed: i32,
    #[serde(default = "default_max_speed")]
    pub max_speed: i32,
}

impl Default for CarDefaults {
    fn default() -> Self {
        Self {
            width: default_car_width(),
            height: default_car_height(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedestrianDefaults {
    #[serde(default = "default_pedestrian_radius")]
    pub radius: i32,
    #[serde(default = "default_pedestrian_speed")]
    pub speed: i32,
    /// Distance kept from the top and bottom of the scene.
    #[serde(default = "default_pedestrian_margin")]
    pub margin: i32,
}

impl Default for PedestrianDefaults {
    fn default() -> Self {
        Self {
            radius: default_pedestrian_radius(),
            speed: default_pedestrian_speed(),
            margin: default_pedestrian_margin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalDefaults {
    #[serde(default = "default_animal_width")]
    pub width: i32,
    #[serde(default = "default_animal_height")]
    pub height: i32,
    #[serde(default = "default_animal_speed")]
    pub speed: i32,
}

impl Default for AnimalDefaults {
    fn default() -> Self {
        Self {
            width: default_animal_width(),
            height: default_animal_height(),
            speed: default_animal_speed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarSpec {
    pub id: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub color: Color,
    /// Pins the speed instead of drawing it from the default range.
    #[serde(default)]
    pub speed: Option<i32>,
}

/// Placement of a pedestrian or animal. A pinned `speed` is signed; without
/// one the default magnitude is used with a random direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerSpec {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub speed: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_payment_portal")]
    pub payment_portal: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            payment_portal: default_payment_portal(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario validation error: {0}")]
    Validation(String),
    #[error("invalid {entity}: {source}")]
    Entity {
        entity: String,
        #[source]
        source: EntityError,
    },
}

fn entity_error(entity: impl Into<String>) -> impl FnOnce(EntityError) -> ScenarioError {
    let entity = entity.into();
    move |source| ScenarioError::Entity { entity, source }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        let scene = &self.scene;
        if scene.width <= 0 || scene.height <= 0 {
            return Err(ScenarioError::Validation(format!(
                "scene must have a positive size, got {}x{}",
                scene.width, scene.height
            )));
        }
        if scene.road_top >= scene.road_bottom {
            return Err(ScenarioError::Validation(format!(
                "road_top ({}) must be above road_bottom ({})",
                scene.road_top, scene.road_bottom
            )));
        }
        let defaults = &self.car_defaults;
        if defaults.min_speed < 0 || defaults.min_speed > defaults.max_speed {
            return Err(ScenarioError::Validation(format!(
                "car speed range {}..={} is invalid",
                defaults.min_speed, defaults.max_speed
            )));
        }
        let mut seen = HashSet::new();
        for car in &self.cars {
            if !seen.insert(car.id.as_str()) {
                return Err(ScenarioError::Validation(format!(
                    "car id {} defined more than once",
                    car.id
                )));
            }
        }
        Ok(())
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            scenario_name: self.name.clone(),
            rules: self.rules,
            pacing: self.pacing(),
        }
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.vehicles.clone(), self.fines.clone())
            .with_payment_portal(self.output.payment_portal.clone())
    }

    /// Place the roster. Unpinned speeds and directions come from `rng`.
    pub fn build_world(&self, rng: &mut RngManager) -> Result<World, ScenarioError> {
        let scene = self.scene;
        let light = TrafficLight::new(
            self.traffic_light.x,
            self.traffic_light.y,
            self.traffic_light.period,
        )
        .map_err(entity_error("traffic light"))?;
        let mut world = World::new(scene, light);

        let cars = &self.car_defaults;
        for spec in &self.cars {
            let speed = spec
                .speed
                .unwrap_or_else(|| rng.stream("cars").gen_range(cars.min_speed..=cars.max_speed));
            let car = Car::new(spec.id.clone(), spec.x, spec.y, cars.width, cars.height, speed)
                .map_err(entity_error(format!("car {}", spec.id)))?
                .with_color(spec.color);
            world.spawn_car(car);
        }

        let walkers = &self.pedestrian_defaults;
        let sidewalk = VerticalBand::new(walkers.margin, scene.height - walkers.margin)
            .map_err(entity_error("pedestrian band"))?;
        for (index, spec) in self.pedestrians.iter().enumerate() {
            let speed = spec
                .speed
                .unwrap_or_else(|| random_direction(rng, "pedestrians", walkers.speed));
            let pedestrian = Pedestrian::new(spec.x, spec.y, walkers.radius, speed, sidewalk)
                .map_err(entity_error(format!("pedestrian #{index}")))?;
            world.spawn_pedestrian(pedestrian);
        }

        let animals = &self.animal_defaults;
        for (index, spec) in self.animals.iter().enumerate() {
            let speed = spec
                .speed
                .unwrap_or_else(|| random_direction(rng, "animals", animals.speed));
            let animal = Animal::new(
                spec.x,
                spec.y,
                animals.width,
                animals.height,
                speed,
                scene.road_band(),
            )
            .map_err(entity_error(format!("animal #{index}")))?;
            world.spawn_animal(animal);
        }

        Ok(world)
    }

    /// The intersection the simulation was first tuned for: seven cars,
    /// three pedestrians, three animals and one light on a 1000x600 canvas.
    pub fn downtown() -> Self {
        let car = |id: &str, x: i32, y: i32, color: [u8; 3]| CarSpec {
            id: id.to_string(),
            x,
            y,
            color: Color(color),
            speed: None,
        };
        let walker = |x: i32, y: i32| WalkerSpec { x, y, speed: None };
        let owner = |name: &str, number: &str| Owner {
            owner_name: name.to_string(),
            vehicle_number: number.to_string(),
        };
        Self {
            name: "downtown".to_string(),
            description: Some("Single road with one signalised crossing".to_string()),
            seed: 7,
            pacing_ms: default_pacing_ms(),
            scene: Scene::default(),
            rules: RuleConfig::default(),
            traffic_light: LightSpec {
                x: 900,
                y: 220,
                period: default_light_period(),
            },
            car_defaults: CarDefaults::default(),
            pedestrian_defaults: PedestrianDefaults::default(),
            animal_defaults: AnimalDefaults::default(),
            cars: vec![
                car("car_1", 50, 270, [0, 0, 255]),
                car("car_2", 200, 300, [0, 255, 0]),
                car("car_3", 400, 320, [255, 0, 0]),
                car("car_4", 600, 280, [0, 255, 255]),
                car("car_5", 800, 310, [255, 255, 0]),
                car("car_6", 100, 260, [200, 100, 200]),
                car("car_7", 350, 290, [150, 200, 100]),
            ],
            pedestrians: vec![walker(500, 100), walker(750, 500), walker(200, 450)],
            animals: vec![walker(300, 260), walker(700, 340), walker(150, 300)],
            vehicles: VehicleRegistry::from([
                ("car_1".to_string(), owner("John Doe", "ABC123")),
                ("car_2".to_string(), owner("Jane Smith", "XYZ456")),
                ("car_3".to_string(), owner("Mike Johnson", "LMN789")),
                ("car_4".to_string(), owner("Emma Davis", "PQR321")),
                ("car_5".to_string(), owner("Chris Brown", "JKL654")),
                ("car_6".to_string(), owner("Sophia Lee", "TUV987")),
                ("car_7".to_string(), owner("Liam White", "DEF741")),
            ]),
            fines: FineTable::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn random_direction(rng: &mut RngManager, stream: &str, magnitude: i32) -> i32 {
    if rng.stream(stream).gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}
