use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    rules::{
        detect_accidents, detect_animal_collisions, detect_hit_and_runs, detect_red_light,
        detect_speeding, RuleConfig, ViolationCounts, ViolationEvent,
    },
    signal::StopSignal,
    sink::{NullSink, ViolationSink},
    world::{FrameSnapshot, World},
};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub scenario_name: String,
    pub rules: RuleConfig,
    /// Delay between ticks; the stop signal is watched while waiting.
    pub pacing: Duration,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    world: World,
    sink: Box<dyn ViolationSink>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings, world: World) -> Self {
        Self {
            settings,
            world,
            sink: Box::new(NullSink),
        }
    }

    pub fn with_sink(mut self, sink: impl ViolationSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            settings: self.settings,
            world: self.world,
            sink: self.sink,
            counts: ViolationCounts::new(),
            phase: EnginePhase::Initializing,
            tick: 0,
            sink_failures: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Initializing,
    Running,
    Stopped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine is stopped; no further ticks can run")]
    Stopped,
}

#[derive(Debug, Clone)]
pub struct TickSummary {
    pub tick: u64,
    pub events: Vec<ViolationEvent>,
    pub frame: FrameSnapshot,
    pub counts: ViolationCounts,
    pub sink_failures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub ticks: u64,
    pub counts: ViolationCounts,
    pub sink_failures: u64,
}

pub struct Engine {
    settings: EngineSettings,
    world: World,
    sink: Box<dyn ViolationSink>,
    counts: ViolationCounts,
    phase: EnginePhase,
    tick: u64,
    sink_failures: u64,
}

impl Engine {
    /// Advance the scene by one tick, evaluate every rule and hand each
    /// violation to the sink.
    pub fn tick(&mut self) -> Result<TickSummary, EngineError> {
        match self.phase {
            EnginePhase::Stopped => return Err(EngineError::Stopped),
            EnginePhase::Initializing => {
                info!(
                    scenario = %self.settings.scenario_name,
                    cars = self.world.cars().len(),
                    pedestrians = self.world.pedestrians().len(),
                    animals = self.world.animals().len(),
                    sink = self.sink.name(),
                    "simulation running"
                );
                self.phase = EnginePhase::Running;
            }
            EnginePhase::Running => {}
        }

        self.tick += 1;
        let tick = self.tick;
        let events = self.advance_and_detect(tick);
        let frame = self.world.snapshot(tick);

        let mut sink_failures = 0;
        for event in &events {
            if !self.record_violation(event, &frame) {
                sink_failures += 1;
            }
        }
        debug!(tick, violations = events.len(), sink_failures, "tick complete");

        Ok(TickSummary {
            tick,
            events,
            frame,
            counts: self.counts.clone(),
            sink_failures,
        })
    }

    fn advance_and_detect(&mut self, tick: u64) -> Vec<ViolationEvent> {
        let rules = self.settings.rules;
        let world = &mut self.world;
        let scene = world.scene();
        let mut events = Vec::new();

        world.light.advance(tick);

        for car in world.cars.iter_mut() {
            car.advance(scene.width);
            events.extend(detect_speeding(car, &rules, tick));
            events.extend(detect_red_light(car, &world.light, &scene, &rules, tick));
        }
        for pedestrian in world.pedestrians.iter_mut() {
            pedestrian.advance();
        }
        for animal in world.animals.iter_mut() {
            animal.advance();
        }

        events.extend(detect_accidents(&world.cars, tick));
        events.extend(detect_hit_and_runs(&world.cars, &world.pedestrians, tick));
        events.extend(detect_animal_collisions(&world.cars, &world.animals, tick));
        events
    }

    /// The only place counts change. The count grows whether or not the sink
    /// managed to persist its artifacts; returns false on sink failure.
    fn record_violation(&mut self, event: &ViolationEvent, frame: &FrameSnapshot) -> bool {
        let delivered = match self.sink.record(event, frame) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    sink = self.sink.name(),
                    vehicle = %event.vehicle_id,
                    violation = %event.kind,
                    tick = event.tick,
                    error = %err,
                    "failed to persist violation"
                );
                self.sink_failures += 1;
                false
            }
        };
        self.counts.increment(event.kind);
        delivered
    }

    pub fn run(
        &mut self,
        stop: &StopSignal,
        max_ticks: Option<u64>,
    ) -> Result<RunSummary, EngineError> {
        self.run_with_hook(stop, max_ticks, |_| {})
    }

    /// Tick until `stop` fires or `max_ticks` have run, pacing between ticks.
    /// `hook` sees every tick's summary, e.g. to draw the frame. The engine is
    /// stopped afterwards.
    pub fn run_with_hook<F>(
        &mut self,
        stop: &StopSignal,
        max_ticks: Option<u64>,
        mut hook: F,
    ) -> Result<RunSummary, EngineError>
    where
        F: FnMut(&TickSummary),
    {
        let mut ran = 0_u64;
        loop {
            if stop.is_triggered() || max_ticks.is_some_and(|max| ran >= max) {
                break;
            }
            let summary = self.tick()?;
            ran += 1;
            hook(&summary);

            let more = max_ticks.map_or(true, |max| ran < max);
            if more && stop.wait_timeout(self.settings.pacing) {
                break;
            }
        }
        self.stop();
        Ok(self.summary())
    }

    pub fn stop(&mut self) {
        if self.phase != EnginePhase::Stopped {
            info!(
                scenario = %self.settings.scenario_name,
                ticks = self.tick,
                violations = self.counts.total(),
                "simulation stopped"
            );
            self.phase = EnginePhase::Stopped;
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            scenario: self.settings.scenario_name.clone(),
            ticks: self.tick,
            counts: self.counts.clone(),
            sink_failures: self.sink_failures,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn counts(&self) -> &ViolationCounts {
        &self.counts
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
