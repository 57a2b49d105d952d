use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

use super::dataset::{PM25_HEADLINE_FIELD, PM25_RATING_FIELD, PSI_HEADLINE_FIELD, PSI_RATING_FIELD};

pub const LAST_UPDATE_FIELD: &str = "last_update";
pub const API_ERROR_EVENT: &str = "APIerror";
pub const SENSOR_CAPABILITY: &str = "MultiLevelSensor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Number,
    String,
}

/// Metadata for one exposed sensor field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    pub read_only: bool,
    #[serde(skip)]
    pub sub_index: bool,
}

const fn field(name: &'static str, title: &'static str, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor {
        name,
        title,
        kind,
        description: None,
        unit: None,
        minimum: None,
        maximum: None,
        read_only: true,
        sub_index: false,
    }
}

const fn sub_index(name: &'static str, title: &'static str, description: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        description: Some(description),
        sub_index: true,
        ..field(name, title, FieldKind::Integer)
    }
}

pub const SENSOR_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        description: Some("Pollutant Standards Index"),
        minimum: Some(0.0),
        maximum: Some(500.0),
        ..field(PSI_HEADLINE_FIELD, "Pollutant Standards Index", FieldKind::Integer)
    },
    sub_index(
        "pm25_sub_index",
        "2.5 micron Particulate Matter sub-index",
        "computed based on 24-hour average PM2.5 reading, then normalised to 0-500 range",
    ),
    sub_index(
        "pm10_sub_index",
        "10 micron Particulate Matter sub-index",
        "computed based on 24-hour average PM10 reading, then normalised to 0-500 range",
    ),
    sub_index(
        "o3_sub_index",
        "Ozone sub-index",
        "computed based on 8-hour average Ozone reading, then normalised to 0-500 range",
    ),
    sub_index(
        "so2_sub_index",
        "Sulphur Dioxide sub-index",
        "computed based on 24-hour average Sulphur Dioxide reading, then normalised to 0-500 range",
    ),
    sub_index(
        "co_sub_index",
        "Carbon Monoxide sub-index",
        "computed based on 8-hour average Carbon Monoxide reading, then normalised to 0-500 range",
    ),
    sub_index(
        "no2_sub_index",
        "Nitrogen Dioxide sub-index",
        "computed based on 1-hour average Nitrogen Dioxide reading, then normalised to 0-500 range",
    ),
    field(PSI_RATING_FIELD, "PSI Air Quality Indicator", FieldKind::String),
    FieldDescriptor {
        description: Some("One-hour PM2.5 concentration"),
        unit: Some("µg/m³"),
        minimum: Some(0.0),
        ..field(PM25_HEADLINE_FIELD, "PM2.5 one-hour reading", FieldKind::Integer)
    },
    field(PM25_RATING_FIELD, "PM2.5 Air Quality Indicator", FieldKind::String),
    field(LAST_UPDATE_FIELD, "Last update", FieldKind::String),
];

/// Field slots an entity exposes, minus sub-indices when they are hidden.
pub fn sensor_schema(hide_sub_index: bool) -> Vec<&'static FieldDescriptor> {
    SENSOR_FIELDS
        .iter()
        .filter(|f| !(hide_sub_index && f.sub_index))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    FieldNotPresent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    PropertyChanged {
        entity_id: String,
        field: String,
        value: FieldValue,
    },
    Event {
        entity_id: String,
        name: String,
        message: String,
    },
}

/// What the registry is told about an entity when it is first sighted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDescription {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "@type")]
    pub capabilities: Vec<&'static str>,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone)]
struct FieldSlot {
    descriptor: &'static FieldDescriptor,
    value: Option<FieldValue>,
}

/// A per-region air quality sensor
#[derive(Debug)]
pub struct Entity {
    id: String,
    location: String,
    slots: BTreeMap<&'static str, FieldSlot>,
    saved: bool,
    last_event: Option<String>,
    notifier: broadcast::Sender<Notification>,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        location: impl Into<String>,
        schema: &[&'static FieldDescriptor],
        notifier: broadcast::Sender<Notification>,
    ) -> Self {
        let slots = schema
            .iter()
            .map(|&d| (d.name, FieldSlot { descriptor: d, value: None }))
            .collect();
        Self {
            id: id.into(),
            location: location.into(),
            slots,
            saved: false,
            last_event: None,
            notifier,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> String {
        format!("Singapore {}", self.location)
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn set_saved(&mut self, saved: bool) {
        self.saved = saved;
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.slots.get(name).and_then(|s| s.value.as_ref())
    }

    pub fn last_event(&self) -> Option<&str> {
        self.last_event.as_deref()
    }

    /// Cache `value` and notify observers. Unchanged values are notified too.
    pub fn write_field(&mut self, name: &str, value: impl Into<FieldValue>) -> WriteOutcome {
        let Some(slot) = self.slots.get_mut(name) else {
            return WriteOutcome::FieldNotPresent;
        };
        let value = value.into();
        slot.value = Some(value.clone());
        // no receivers is not an error
        let _ = self.notifier.send(Notification::PropertyChanged {
            entity_id: self.id.clone(),
            field: name.to_string(),
            value,
        });
        WriteOutcome::Written
    }

    pub fn emit_event(&mut self, name: &str, message: impl Into<String>) {
        let message = message.into();
        self.last_event = Some(message.clone());
        let _ = self.notifier.send(Notification::Event {
            entity_id: self.id.clone(),
            name: name.to_string(),
            message,
        });
    }

    pub fn describe(&self) -> EntityDescription {
        EntityDescription {
            id: self.id.clone(),
            title: self.title(),
            description: format!("Singapore atmospheric pollution - {}", self.location),
            capabilities: vec![SENSOR_CAPABILITY],
            fields: self.slots.values().map(|s| s.descriptor.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(hide_sub_index: bool) -> (Entity, broadcast::Receiver<Notification>) {
        let (tx, rx) = broadcast::channel(64);
        let e = Entity::new("psi-sg-north", "north", &sensor_schema(hide_sub_index), tx);
        (e, rx)
    }

    #[test]
    fn test_schema_hides_sub_indices() {
        let full = sensor_schema(false);
        let hidden = sensor_schema(true);
        assert_eq!(full.len(), SENSOR_FIELDS.len());
        assert_eq!(full.len() - hidden.len(), 6);
        assert!(hidden.iter().all(|f| !f.sub_index));
    }

    #[test]
    fn test_write_missing_field_is_not_present() {
        let (mut e, mut rx) = entity(true);
        assert_eq!(e.write_field("pm10_sub_index", 12.0), WriteOutcome::FieldNotPresent);
        assert_eq!(e.write_field("o3_eight_hour_max", 12.0), WriteOutcome::FieldNotPresent);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unchanged_value_is_notified_again() {
        let (mut e, mut rx) = entity(false);
        assert_eq!(e.write_field(PSI_HEADLINE_FIELD, 45.0), WriteOutcome::Written);
        assert_eq!(e.write_field(PSI_HEADLINE_FIELD, 45.0), WriteOutcome::Written);

        let mut count = 0;
        while let Ok(n) = rx.try_recv() {
            assert!(matches!(n, Notification::PropertyChanged { ref field, .. } if field == PSI_HEADLINE_FIELD));
            count += 1;
        }
        assert_eq!(count, 2);
        assert_eq!(e.value(PSI_HEADLINE_FIELD), Some(&FieldValue::Number(45.0)));
    }

    #[test]
    fn test_emit_event_records_last_message() {
        let (mut e, mut rx) = entity(false);
        e.emit_event(API_ERROR_EVENT, "api response status: 500");
        assert_eq!(e.last_event(), Some("api response status: 500"));
        match rx.try_recv() {
            Ok(Notification::Event { name, .. }) => assert_eq!(name, API_ERROR_EVENT),
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[test]
    fn test_describe() {
        let (e, _rx) = entity(false);
        let d = e.describe();
        assert_eq!(d.title, "Singapore north");
        assert_eq!(d.description, "Singapore atmospheric pollution - north");
        assert_eq!(d.capabilities, vec![SENSOR_CAPABILITY]);
        assert_eq!(d.fields.len(), SENSOR_FIELDS.len());
    }
}
