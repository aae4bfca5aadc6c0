use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{BoundingBox, GeometryError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("{entity} speed must be non-negative, got {speed}")]
    NegativeSpeed { entity: String, speed: i32 },
    #[error("{entity} starts at y={y}, outside its band [{min}, {max}]")]
    OutsideBand {
        entity: String,
        y: i32,
        min: i32,
        max: i32,
    },
    #[error("vertical band [{min}, {max}] is empty")]
    EmptyBand { min: i32, max: i32 },
    #[error("traffic light period must be greater than zero")]
    ZeroPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const PEDESTRIAN: Color = Color([255, 0, 0]);
    pub const ANIMAL: Color = Color([0, 75, 150]);
}

impl Default for Color {
    fn default() -> Self {
        Color([0, 0, 255])
    }
}

/// Inclusive range of y values a vertically moving entity may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerticalBand {
    pub min: i32,
    pub max: i32,
}

impl VerticalBand {
    pub fn new(min: i32, max: i32) -> Result<Self, EntityError> {
        if min > max {
            return Err(EntityError::EmptyBand { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, y: i32) -> bool {
        y >= self.min && y <= self.max
    }

    fn check(&self, entity: &str, y: i32) -> Result<(), EntityError> {
        if self.contains(y) {
            Ok(())
        } else {
            Err(EntityError::OutsideBand {
                entity: entity.to_string(),
                y,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Step `y` by `speed`, clamping to the band edge and pointing the speed back
/// inward whenever the edge is reached.
fn bounce(y: &mut i32, speed: &mut i32, band: VerticalBand) {
    let next = *y + *speed;
    if next >= band.max {
        *y = band.max;
        *speed = -speed.abs();
    } else if next <= band.min {
        *y = band.min;
        *speed = speed.abs();
    } else {
        *y = next;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Car {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub prev_x: i32,
    pub prev_y: i32,
    pub width: i32,
    pub height: i32,
    pub speed: i32,
    pub color: Color,
}

impl Car {
    pub fn new(
        id: impl Into<String>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        speed: i32,
    ) -> Result<Self, EntityError> {
        let id = id.into();
        BoundingBox::new(x, y, width, height)?;
        if speed < 0 {
            return Err(EntityError::NegativeSpeed { entity: id, speed });
        }
        Ok(Self {
            id,
            x,
            y,
            prev_x: x,
            prev_y: y,
            width,
            height,
            speed,
            color: Color::default(),
        })
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Move right by the fixed speed, re-entering just left of the scene once
    /// the car passes `right_edge`.
    pub fn advance(&mut self, right_edge: i32) {
        self.prev_x = self.x;
        self.prev_y = self.y;
        self.x += self.speed;
        if self.x > right_edge {
            self.x = -self.width;
        }
    }

    pub fn displacement(&self) -> i32 {
        self.x - self.prev_x
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pedestrian {
    pub x: i32,
    pub y: i32,
    pub radius: i32,
    pub speed: i32,
    pub band: VerticalBand,
}

impl Pedestrian {
    pub fn new(
        x: i32,
        y: i32,
        radius: i32,
        speed: i32,
        band: VerticalBand,
    ) -> Result<Self, EntityError> {
        BoundingBox::new(x - radius, y - radius, 2 * radius, 2 * radius)?;
        band.check("pedestrian", y)?;
        Ok(Self {
            x,
            y,
            radius,
            speed,
            band,
        })
    }

    pub fn advance(&mut self) {
        bounce(&mut self.y, &mut self.speed, self.band);
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            x: self.x - self.radius,
            y: self.y - self.radius,
            width: 2 * self.radius,
            height: 2 * self.radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animal {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub speed: i32,
    pub band: VerticalBand,
}

impl Animal {
    pub fn new(
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        speed: i32,
        band: VerticalBand,
    ) -> Result<Self, EntityError> {
        BoundingBox::new(x, y, width, height)?;
        band.check("animal", y)?;
        Ok(Self {
            x,
            y,
            width,
            height,
            speed,
            band,
        })
    }

    pub fn advance(&mut self) {
        bounce(&mut self.y, &mut self.speed, self.band);
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightState {
    Green,
    Red,
}

impl LightState {
    pub fn toggled(self) -> Self {
        match self {
            LightState::Green => LightState::Red,
            LightState::Red => LightState::Green,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LightState::Green => "green",
            LightState::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficLight {
    pub x: i32,
    pub y: i32,
    pub state: LightState,
    period: u64,
}

impl TrafficLight {
    pub fn new(x: i32, y: i32, period: u64) -> Result<Self, EntityError> {
        if period == 0 {
            return Err(EntityError::ZeroPeriod);
        }
        Ok(Self {
            x,
            y,
            state: LightState::Green,
            period,
        })
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn advance(&mut self, tick: u64) {
        if tick % self.period == 0 {
            self.state = self.state.toggled();
        }
    }

    pub fn is_red(&self) -> bool {
        self.state == LightState::Red
    }
}
