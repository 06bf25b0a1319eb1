#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use telemap::constants::FeatureId;
use telemap::features::{LonLat, TelemetryPoint, TelemetryProperties, TelemetryTrack};
use telemap::markers::MarkerKind;
use telemap::reconcile::{LatestIcon, RenderHandle};
use telemap::time::parse_date_recorded;

/// Render calls observed across every mock handle of a map.
#[derive(Debug, Default)]
pub struct RenderLog {
    pub restyle: usize,
    pub bring_to_front: usize,
    pub replace_icon: usize,
    pub set_line_color: usize,
    pub detached: HashSet<(MarkerKind, FeatureId)>,
}

impl RenderLog {
    pub fn writes(&self) -> usize {
        self.restyle + self.replace_icon + self.set_line_color
    }
}

/// Handle recording its calls in a shared [`RenderLog`].
#[derive(Debug, Clone)]
pub struct MockHandle {
    pub kind: MarkerKind,
    pub id: FeatureId,
    pub log: Rc<RefCell<RenderLog>>,
}

impl RenderHandle for MockHandle {
    fn is_attached(&self) -> bool {
        !self
            .log
            .borrow()
            .detached
            .contains(&(self.kind, self.id.clone()))
    }

    fn restyle(&mut self, _fill: &str, _outline: &str, _opacity: f64) {
        self.log.borrow_mut().restyle += 1;
    }

    fn bring_to_front(&mut self) {
        self.log.borrow_mut().bring_to_front += 1;
    }

    fn replace_icon(&mut self, _icon: LatestIcon) {
        self.log.borrow_mut().replace_icon += 1;
    }

    fn set_line_color(&mut self, _color: &str) {
        self.log.borrow_mut().set_line_color += 1;
    }
}

/// Handle factory for [`Telemap::mount`](telemap::telemap::Telemap::mount).
pub fn attach(
    log: &Rc<RefCell<RenderLog>>,
) -> impl FnMut(MarkerKind, &FeatureId) -> MockHandle + '_ {
    move |kind, id| MockHandle {
        kind,
        id: id.clone(),
        log: Rc::clone(log),
    }
}

pub fn date(day: u32) -> String {
    format!("2021-01-{day:02}T00:00:00")
}

pub fn point(id: u64, animal: &str, lon: f64, lat: f64, day: u32) -> TelemetryPoint {
    TelemetryPoint::new(
        id,
        LonLat::new(lon, lat),
        TelemetryProperties {
            animal_id: Some(animal.to_string()),
            device_id: Some(FeatureId::Int(1000 + id)),
            date_recorded: Some(parse_date_recorded(&date(day)).unwrap()),
            status_code: Some("Alive".into()),
            category_color_token: Some("#00ff44,#ffffff".into()),
            ..Default::default()
        },
    )
}

pub fn track(id: u64, animal: &str, coordinates: Vec<LonLat>) -> TelemetryTrack {
    TelemetryTrack::new(
        id,
        coordinates,
        TelemetryProperties {
            animal_id: Some(animal.to_string()),
            category_color_token: Some("#00ff44,#ffffff".into()),
            ..Default::default()
        },
    )
}

/// Two animals with 12 fixes each at strictly increasing timestamps, and their full tracks.
pub fn two_animals_twelve_fixes() -> (Vec<TelemetryPoint>, Vec<TelemetryTrack>) {
    let mut points = Vec::new();
    let mut tracks = Vec::new();
    for (offset, animal) in [(0u64, "A1"), (100, "A2")] {
        let fixes: Vec<_> = (1..=12u32)
            .map(|day| {
                let id = offset + day as u64;
                point(id, animal, -120.0 - id as f64 / 100.0, 54.0 + day as f64 / 100.0, day)
            })
            .collect();
        tracks.push(track(
            offset + 500,
            animal,
            fixes.iter().map(|p| p.coordinates).collect(),
        ));
        points.extend(fixes);
    }
    (points, tracks)
}
