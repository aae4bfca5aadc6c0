use super::{RuleConfig, ViolationEvent, ViolationKind};
use crate::components::{Car, TrafficLight};
use crate::world::Scene;

/// Fires when the car moved further than the limit since the previous tick.
/// A wrap back to the left edge yields a negative displacement and never fires.
pub fn detect_speeding(car: &Car, rules: &RuleConfig, tick: u64) -> Option<ViolationEvent> {
    (car.displacement() > rules.speed_limit)
        .then(|| ViolationEvent::new(car.id.clone(), ViolationKind::Speeding, tick))
}

/// Fires while the light is red and the car's front edge is past the stop
/// line on the road.
pub fn detect_red_light(
    car: &Car,
    light: &TrafficLight,
    scene: &Scene,
    rules: &RuleConfig,
    tick: u64,
) -> Option<ViolationEvent> {
    let stop_line = light.x - rules.stop_line_offset;
    let in_stop_zone = car.x + car.width > stop_line && scene.within_road(car.y);
    (light.is_red() && in_stop_zone)
        .then(|| ViolationEvent::new(car.id.clone(), ViolationKind::RedLight, tick))
}
