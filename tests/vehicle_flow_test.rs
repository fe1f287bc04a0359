//! End-to-end flows over the SQLite store
//! Run with: cargo test --test vehicle_flow_test

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use vehicle_care_bot::application::errors::BotError;
use vehicle_care_bot::application::messaging::MessageParser;
use vehicle_care_bot::application::services::{vehicle_commands, CommandService, DecayService, PassReport};
use vehicle_care_bot::domain::entities::{LevelField, Matched, NewVehicle, User};
use vehicle_care_bot::domain::traits::{Bot, BotInfo, VehicleStore};
use vehicle_care_bot::infrastructure::database::SqliteVehicleStore;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Bot double that records what it sends and rejects blocked chats
#[derive(Default)]
struct FakeBot {
    blocked: Vec<String>,
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Bot for FakeBot {
    async fn start(&self) -> Result<(), BotError> {
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        if self.blocked.iter().any(|c| c == chat_id) {
            return Err(BotError::Network("Forbidden: bot was blocked by the user".to_string()));
        }
        self.sent.lock().unwrap().push((chat_id.to_string(), text.to_string()));
        Ok("1".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo { id: "1".to_string(), name: "fake".to_string(), username: "fake_bot".to_string() }
    }
}

fn open_store(dir: &tempfile::TempDir) -> Arc<SqliteVehicleStore> {
    Arc::new(SqliteVehicleStore::open(dir.path().join("vehicles.db")).expect("open store"))
}

fn chat(service: &CommandService, owner: &str, text: &str) -> Option<String> {
    let parser = MessageParser::new(service.prefix());
    let msg = parser.parse(owner, text, Some(User::new(owner)));
    service.respond(&msg)
}

#[test]
fn test_command_session_over_sqlite() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let mut service = CommandService::new("/");
    vehicle_commands::register(&mut service, store.clone());

    assert_eq!(chat(&service, "11", "/add Family Car").as_deref(), Some("Vehicle 'Family Car' added!"));
    assert_eq!(chat(&service, "11", "/add Bike").as_deref(), Some("Vehicle 'Bike' added!"));
    assert_eq!(
        chat(&service, "11", "/update Bike fuel 15").as_deref(),
        Some("Vehicle 'Bike' updated: fuel = 15 km")
    );

    let suggest = chat(&service, "11", "/suggest").unwrap();
    assert!(suggest.contains("Family Car: healthy"));
    assert!(suggest.contains("Bike: critical fuel"));

    // Multi-word names cannot be targeted by update, which takes exactly three args
    assert_eq!(
        chat(&service, "11", "/update Family Car oil 100").as_deref(),
        Some(vehicle_commands::UPDATE_USAGE)
    );

    assert_eq!(chat(&service, "11", "/remove Family Car").as_deref(), Some("Vehicle 'Family Car' removed."));
    let list = chat(&service, "11", "/list").unwrap();
    assert!(!list.contains("Family Car"));
    assert!(list.contains("Bike | Fuel: 15 km"));

    assert_eq!(chat(&service, "22", "/list").as_deref(), Some(vehicle_commands::NO_VEHICLES));
    assert_eq!(chat(&service, "11", "hello"), None);
    assert_eq!(chat(&service, "11", "/unknown"), None);
}

#[test]
fn test_duplicate_names_are_bulk_targets() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    store.create(&NewVehicle::new(1, "Car")).unwrap();
    store.create(&NewVehicle::new(1, "Car")).unwrap();
    assert_eq!(store.list(1).unwrap().len(), 2);

    assert_eq!(store.update_field(1, "Car", LevelField::Fuel, 10).unwrap(), Matched::Found(2));
    assert!(store.list(1).unwrap().iter().all(|v| v.fuel_km_left == 10));

    assert_eq!(store.remove_by_name(1, "Car").unwrap(), Matched::Found(2));
    assert!(store.list(1).unwrap().is_empty());
    assert_eq!(store.remove_by_name(1, "Car").unwrap(), Matched::NotFound);
}

#[test]
fn test_reset_on_fresh_store() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    assert_eq!(store.reset_owner(2).unwrap(), Matched::NotFound);
    assert!(store.list(2).unwrap().is_empty());
}

#[test]
fn test_reopen_keeps_data_and_schema() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    {
        let store = open_store(&dir);
        store.create(&NewVehicle::new(3, "Truck").with_oil(250)).unwrap();
    }
    let store = open_store(&dir);
    let vehicles = store.list(3).unwrap();
    assert_eq!(vehicles.len(), 1);
    assert_eq!((vehicles[0].fuel_km_left, vehicles[0].oil_km_left, vehicles[0].tyre_pct), (100, 250, 100));
}

#[tokio::test]
async fn test_decay_pass_over_all_owners() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    store.create(&NewVehicle::new(1, "Car")).unwrap();
    store.create(&NewVehicle::new(2, "Van").with_oil(205)).unwrap();
    store.create(&NewVehicle::new(3, "Scooter")).unwrap();

    let bot = Arc::new(FakeBot { blocked: vec!["3".to_string()], ..Default::default() });
    let decay = DecayService::new(store.clone(), bot.clone());

    let report = decay.run_pass().await.unwrap();
    assert_eq!(report, PassReport { processed: 3, delivered: 2, failed: 1 });

    let car = &store.list(1).unwrap()[0];
    assert_eq!((car.fuel_km_left, car.oil_km_left, car.tyre_pct), (95, 990, 99));
    assert_eq!(store.list(3).unwrap()[0].fuel_km_left, 95);

    let sent = bot.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    let to_car = sent.iter().find(|(chat, _)| chat == "1").unwrap();
    assert!(to_car.1.ends_with("Suggestion: All good! You can drive safely."));
    let to_van = sent.iter().find(|(chat, _)| chat == "2").unwrap();
    assert!(to_van.1.contains("Oil: 195 km"));
    assert!(to_van.1.contains("Schedule maintenance"));
}
