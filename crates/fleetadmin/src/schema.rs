//! Entity catalog: the record types this console administers.
//!
//! Each entity is described declaratively as a column array; the grid
//! engine and the REST layer are both driven from these descriptors and
//! know nothing about concrete entities.

use grid_engine::{CellValue, Column, DataType};
use serde_json::{json, Value as JsonValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Vehicles,
    Drivers,
    Devices,
    Alerts,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Vehicles,
        EntityKind::Drivers,
        EntityKind::Devices,
        EntityKind::Alerts,
    ];

    pub fn title(self) -> &'static str {
        match self {
            EntityKind::Vehicles => "Vehicles",
            EntityKind::Drivers => "Drivers",
            EntityKind::Devices => "Devices",
            EntityKind::Alerts => "Alerts",
        }
    }

    /// REST collection segment under the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            EntityKind::Vehicles => "vehicles",
            EntityKind::Drivers => "drivers",
            EntityKind::Devices => "devices",
            EntityKind::Alerts => "alerts",
        }
    }

    /// Sidebar grouping.
    pub fn category(self) -> &'static str {
        match self {
            EntityKind::Vehicles | EntityKind::Drivers => "Fleet",
            EntityKind::Devices => "Telecom",
            EntityKind::Alerts => "Operations",
        }
    }

    pub fn by_path(path: &str) -> Option<EntityKind> {
        EntityKind::ALL.iter().copied().find(|e| e.path() == path)
    }

    pub fn columns(self) -> Vec<Column> {
        match self {
            EntityKind::Vehicles => vec![
                Column::new("plate", "Plate", DataType::String).editable().with_width(10),
                Column::new("model", "Model", DataType::String).editable().with_width(18),
                Column::new("odometer_km", "Odometer (km)", DataType::Number).editable(),
                Column::new("in_service", "In Service", DataType::Boolean)
                    .editable()
                    .render_with(yes_no),
                Column::new("commissioned", "Commissioned", DataType::Date),
                Column::new("last_seen", "Last Seen", DataType::Date),
            ],
            EntityKind::Drivers => vec![
                Column::new("name", "Name", DataType::String).editable().with_width(20),
                Column::new("license_no", "License", DataType::String).editable().with_width(12),
                Column::new("phone", "Phone", DataType::String).editable().with_width(14),
                Column::new("active", "Active", DataType::Boolean).editable().render_with(yes_no),
                Column::new("hired_on", "Hired", DataType::Date),
            ],
            EntityKind::Devices => vec![
                Column::new("imei", "IMEI", DataType::String).with_width(17),
                Column::new("sim_msisdn", "SIM MSISDN", DataType::String).editable().with_width(14),
                Column::new("firmware", "Firmware", DataType::String),
                Column::new("battery_pct", "Battery", DataType::Number).render_with(|value, _| {
                    match value.as_number() {
                        Some(pct) => format!("{pct}%"),
                        None => String::new(),
                    }
                }),
                Column::new("online", "Online", DataType::Boolean).render_with(yes_no),
                Column::new("installed_on", "Installed", DataType::Date),
            ],
            EntityKind::Alerts => vec![
                Column::new("severity", "Severity", DataType::String)
                    .render_with(|value, _| value.display().to_uppercase()),
                Column::new("message", "Message", DataType::String).with_width(32),
                Column::new("vehicle_plate", "Vehicle", DataType::String).with_width(10),
                Column::new("acknowledged", "Ack", DataType::Boolean).editable().render_with(yes_no),
                Column::new("raised_at", "Raised", DataType::Date),
            ],
        }
    }

    /// Seed records for `--demo` mode and tests.
    pub fn demo_records(self) -> Vec<JsonValue> {
        match self {
            EntityKind::Vehicles => vec![
                json!({"id": 1, "plate": "KA-4821", "model": "Volvo FH16", "odometer_km": 412_350,
                       "in_service": true, "commissioned": "2019-05-12", "last_seen": "2026-08-06T22:15:00Z"}),
                json!({"id": 2, "plate": "KA-5110", "model": "Scania R450", "odometer_km": 287_410,
                       "in_service": true, "commissioned": "2021-02-03", "last_seen": "2026-08-07T04:02:00Z"}),
                json!({"id": 3, "plate": "KA-1077", "model": "MAN TGX", "odometer_km": 598_204,
                       "in_service": false, "commissioned": "2016-11-20", "last_seen": "2026-07-29T17:44:00Z"}),
                json!({"id": 4, "plate": "KA-9093", "model": "Volvo FMX", "odometer_km": 93_120,
                       "in_service": true, "commissioned": "2024-08-01", "last_seen": "2026-08-07T05:31:00Z"}),
            ],
            EntityKind::Drivers => vec![
                json!({"id": 11, "name": "Marta Kowalski", "license_no": "D-229441", "phone": "+48 601 220 118",
                       "active": true, "hired_on": "2018-03-05"}),
                json!({"id": 12, "name": "Jonas Berg", "license_no": "D-102930", "phone": "+46 70 311 4487",
                       "active": true, "hired_on": "2022-09-19"}),
                json!({"id": 13, "name": "Pavel Horak", "license_no": "D-558201", "phone": "+420 723 555 901",
                       "active": false, "hired_on": "2015-06-30"}),
            ],
            EntityKind::Devices => vec![
                json!({"id": 21, "imei": "356938035643809", "sim_msisdn": "+48 790 100 221",
                       "firmware": "4.18.2", "battery_pct": 92, "online": true, "installed_on": "2023-01-14"}),
                json!({"id": 22, "imei": "490154203237518", "sim_msisdn": "+48 790 100 222",
                       "firmware": "4.17.9", "battery_pct": 41, "online": false, "installed_on": "2021-10-02"}),
            ],
            EntityKind::Alerts => vec![
                json!({"id": 31, "severity": "critical", "message": "Engine temperature above threshold",
                       "vehicle_plate": "KA-1077", "acknowledged": false, "raised_at": "2026-08-06T23:58:00Z"}),
                json!({"id": 32, "severity": "warning", "message": "Device offline for 6h",
                       "vehicle_plate": "KA-5110", "acknowledged": true, "raised_at": "2026-08-05T09:12:00Z"}),
                json!({"id": 33, "severity": "info", "message": "Scheduled service due in 500 km",
                       "vehicle_plate": "KA-4821", "acknowledged": false, "raised_at": "2026-08-01T08:00:00Z"}),
            ],
        }
    }
}

fn yes_no(value: &CellValue, _row: &grid_engine::Row) -> String {
    match value.as_bool() {
        Some(true) => "yes".to_string(),
        Some(false) => "no".to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_engine::Row;
    use std::collections::HashSet;

    #[test]
    fn test_fields_are_unique_per_entity() {
        for entity in EntityKind::ALL {
            let columns = entity.columns();
            let fields: HashSet<&str> = columns.iter().map(|c| c.field.as_str()).collect();
            assert_eq!(fields.len(), columns.len(), "{} has duplicate fields", entity.title());
        }
    }

    #[test]
    fn test_demo_records_load_into_rows() {
        for entity in EntityKind::ALL {
            let columns = entity.columns();
            for record in entity.demo_records() {
                let row = Row::from_record(&record, &columns);
                assert!(row.is_some(), "{} demo record rejected: {record}", entity.title());
            }
        }
    }

    #[test]
    fn test_every_entity_has_an_editable_column() {
        for entity in EntityKind::ALL {
            assert!(
                entity.columns().iter().any(|c| c.editable),
                "{} has nothing to edit inline",
                entity.title()
            );
        }
    }

    #[test]
    fn test_by_path_round_trips() {
        for entity in EntityKind::ALL {
            assert_eq!(EntityKind::by_path(entity.path()), Some(entity));
        }
        assert_eq!(EntityKind::by_path("unknown"), None);
    }

    #[test]
    fn test_boolean_render_override() {
        let columns = EntityKind::Vehicles.columns();
        let column = columns.iter().find(|c| c.field == "in_service").unwrap();
        let row = Row::from_record(&EntityKind::Vehicles.demo_records()[0], &columns).unwrap();
        assert_eq!(column.display_value(&row), "yes");
    }
}
