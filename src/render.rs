//! Rasterise a [`FrameSnapshot`] into an RGB image.

use image::{Rgb, RgbImage};

use crate::components::{Color, LightState};
use crate::geometry::BoundingBox;
use crate::world::FrameSnapshot;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const ROAD: Rgb<u8> = Rgb([50, 50, 50]);
const LIGHT_RADIUS: i32 = 20;

fn rgb(color: Color) -> Rgb<u8> {
    Rgb(color.0)
}

fn fill_rect(image: &mut RgbImage, bounds: &BoundingBox, color: Rgb<u8>) {
    let x0 = bounds.x.max(0);
    let y0 = bounds.y.max(0);
    let x1 = bounds.right().min(image.width() as i32 - 1);
    let y1 = bounds.bottom().min(image.height() as i32 - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn fill_circle(image: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

pub fn rasterize(frame: &FrameSnapshot) -> RgbImage {
    let scene = frame.scene;
    let mut image = RgbImage::from_pixel(scene.width.max(1) as u32, scene.height.max(1) as u32, BACKGROUND);

    let road = BoundingBox {
        x: 0,
        y: scene.road_top,
        width: scene.width,
        height: scene.road_bottom - scene.road_top,
    };
    fill_rect(&mut image, &road, ROAD);

    let light_color = match frame.light.state {
        LightState::Green => Rgb([0, 255, 0]),
        LightState::Red => Rgb([255, 0, 0]),
    };
    fill_circle(&mut image, frame.light.x, frame.light.y, LIGHT_RADIUS, light_color);

    for car in &frame.cars {
        fill_rect(&mut image, &car.bounds, rgb(car.color));
    }
    for pedestrian in &frame.pedestrians {
        let radius = pedestrian.width / 2;
        fill_circle(
            &mut image,
            pedestrian.x + radius,
            pedestrian.y + radius,
            radius,
            rgb(Color::PEDESTRIAN),
        );
    }
    for animal in &frame.animals {
        fill_rect(&mut image, animal, rgb(Color::ANIMAL));
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Car, TrafficLight};
    use crate::world::{Scene, World};

    #[test]
    fn draws_road_cars_and_light() {
        let mut world = World::new(Scene::default(), TrafficLight::new(900, 220, 150).unwrap());
        world.spawn_car(
            Car::new("car_1", 100, 270, 60, 30, 5)
                .unwrap()
                .with_color(Color([10, 20, 30])),
        );
        let image = rasterize(&world.snapshot(1));

        assert_eq!(image.dimensions(), (1000, 600));
        assert_eq!(image.get_pixel(5, 5), &BACKGROUND);
        assert_eq!(image.get_pixel(5, 300), &ROAD);
        assert_eq!(image.get_pixel(120, 280), &Rgb([10, 20, 30]));
        assert_eq!(image.get_pixel(900, 220), &Rgb([0, 255, 0]));
    }

    #[test]
    fn clips_entities_outside_the_canvas() {
        let mut world = World::new(Scene::default(), TrafficLight::new(990, 10, 150).unwrap());
        world.spawn_car(Car::new("car_1", -60, 270, 60, 30, 5).unwrap());
        let image = rasterize(&world.snapshot(1));
        assert_eq!(image.get_pixel(0, 280), &rgb(Color::default()));
    }
}
