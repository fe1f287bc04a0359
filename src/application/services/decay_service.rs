//! Periodic decay of vehicle levels with a status push per vehicle.
//!
//! Each pass reads every vehicle, applies [`rules::decay`], writes the result back and
//! notifies the owner. A failed delivery is logged and the pass moves on to the next
//! vehicle. A storage failure aborts the pass.

use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::StorageError;
use crate::domain::entities::{Levels, Vehicle};
use crate::domain::rules::{self, UsageAdvice};
use crate::domain::traits::{Bot, VehicleStore};

/// Counts from one decay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub processed: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Text pushed to the owner after a vehicle decays
pub fn notification_text(name: &str, levels: &Levels) -> String {
    format!(
        "{}\nFuel: {} km\nOil: {} km\nTyre: {}%\n\nSuggestion: {}",
        name,
        levels.fuel_km_left,
        levels.oil_km_left,
        levels.tyre_pct,
        UsageAdvice::for_levels(levels)
    )
}

pub struct DecayService<B: Bot + ?Sized> {
    store: Arc<dyn VehicleStore>,
    bot: Arc<B>,
}

impl<B: Bot + ?Sized> DecayService<B> {
    pub fn new(store: Arc<dyn VehicleStore>, bot: Arc<B>) -> Self {
        Self { store, bot }
    }

    /// Run one pass over every vehicle of every owner
    pub async fn run_pass(&self) -> Result<PassReport, StorageError> {
        let vehicles = self.store.list_all()?;
        let mut report = PassReport::default();

        // Levels come from the snapshot above: an /update landing mid-pass is
        // overwritten by the decayed snapshot value. Nothing serializes the two.
        for vehicle in vehicles {
            let levels = rules::decay(vehicle.levels());
            if !self.store.write_decayed(vehicle.id, levels)?.is_found() {
                tracing::debug!(vehicle_id = vehicle.id, "Vehicle gone before decay write");
                continue;
            }
            report.processed += 1;

            if self.notify(&vehicle, &levels).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }

        Ok(report)
    }

    async fn notify(&self, vehicle: &Vehicle, levels: &Levels) -> bool {
        let text = notification_text(&vehicle.name, levels);
        match self.bot.send_message(&vehicle.owner_id.to_string(), &text).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    owner_id = vehicle.owner_id,
                    vehicle_id = vehicle.id,
                    "Failed to send status notification: {}",
                    e
                );
                false
            }
        }
    }

    /// Run passes forever: the first after `first_delay`, then every `interval`.
    ///
    /// A pass always runs to completion. Missed ticks are delayed, not bunched.
    pub async fn run(&self, first_delay: Duration, interval: Duration) {
        tracing::info!(
            first_delay_secs = first_delay.as_secs(),
            interval_secs = interval.as_secs(),
            "Decay job started"
        );

        let start = tokio::time::Instant::now() + first_delay;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.run_pass().await {
                Ok(report) => {
                    if report.failed > 0 {
                        tracing::warn!(
                            processed = report.processed,
                            failed = report.failed,
                            "Decay pass finished with delivery failures"
                        );
                    } else {
                        tracing::debug!(processed = report.processed, "Decay pass finished");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Decay pass aborted");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::BotError;
    use crate::domain::entities::{LevelField, Matched, NewVehicle, OwnerId, VehicleId};
    use crate::domain::traits::BotInfo;
    use crate::infrastructure::storage::MemoryVehicleStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records deliveries and refuses chats listed in `blocked`
    #[derive(Default)]
    struct RecordingBot {
        blocked: Vec<String>,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn start(&self) -> Result<(), BotError> {
            Ok(())
        }

        async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
            if self.blocked.iter().any(|b| b == chat_id) {
                return Err(BotError::Network("Forbidden: bot was blocked by the user".to_string()));
            }
            self.sent.lock().unwrap().push((chat_id.to_string(), text.to_string()));
            Ok("1".to_string())
        }

        fn bot_info(&self) -> BotInfo {
            BotInfo { id: "0".into(), name: "test".into(), username: "test".into() }
        }
    }

    /// Removes "Gone" and edits "Kept" of owner 2 while the first push is in flight
    struct MeddlingBot {
        store: Arc<MemoryVehicleStore>,
        inner: RecordingBot,
    }

    #[async_trait]
    impl Bot for MeddlingBot {
        async fn start(&self) -> Result<(), BotError> {
            Ok(())
        }

        async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
            if self.inner.sent.lock().unwrap().is_empty() {
                self.store.remove_by_name(2, "Gone").unwrap();
                self.store.update_field(2, "Kept", LevelField::Fuel, 500).unwrap();
            }
            self.inner.send_message(chat_id, text).await
        }

        fn bot_info(&self) -> BotInfo {
            self.inner.bot_info()
        }
    }

    /// Fails `write_decayed` from the given call on
    struct FailingStore {
        inner: MemoryVehicleStore,
        fail_from: usize,
        writes: AtomicUsize,
    }

    impl VehicleStore for FailingStore {
        fn create(&self, vehicle: &NewVehicle) -> Result<VehicleId, StorageError> {
            self.inner.create(vehicle)
        }

        fn list(&self, owner_id: OwnerId) -> Result<Vec<Vehicle>, StorageError> {
            self.inner.list(owner_id)
        }

        fn list_all(&self) -> Result<Vec<Vehicle>, StorageError> {
            self.inner.list_all()
        }

        fn update_field(
            &self,
            owner_id: OwnerId,
            name: &str,
            field: LevelField,
            value: i64,
        ) -> Result<Matched, StorageError> {
            self.inner.update_field(owner_id, name, field, value)
        }

        fn remove_by_name(&self, owner_id: OwnerId, name: &str) -> Result<Matched, StorageError> {
            self.inner.remove_by_name(owner_id, name)
        }

        fn reset_owner(&self, owner_id: OwnerId) -> Result<Matched, StorageError> {
            self.inner.reset_owner(owner_id)
        }

        fn write_decayed(&self, id: VehicleId, levels: Levels) -> Result<Matched, StorageError> {
            if self.writes.fetch_add(1, Ordering::SeqCst) + 1 >= self.fail_from {
                return Err(StorageError::LockPoisoned);
            }
            self.inner.write_decayed(id, levels)
        }
    }

    #[test]
    fn test_notification_text() {
        let levels = Levels { fuel_km_left: 95, oil_km_left: 990, tyre_pct: 99 };
        assert_eq!(
            notification_text("Car", &levels),
            "Car\nFuel: 95 km\nOil: 990 km\nTyre: 99%\n\nSuggestion: All good! You can drive safely."
        );
    }

    #[tokio::test]
    async fn test_single_pass_decays_and_notifies() {
        let store = Arc::new(MemoryVehicleStore::new());
        store.create(&NewVehicle::new(7, "Car")).unwrap();
        let bot = Arc::new(RecordingBot::default());
        let service = DecayService::new(store.clone(), bot.clone());

        let report = service.run_pass().await.unwrap();
        assert_eq!(report, PassReport { processed: 1, delivered: 1, failed: 0 });

        let v = &store.list(7).unwrap()[0];
        assert_eq!((v.fuel_km_left, v.oil_km_left, v.tyre_pct), (95, 990, 99));

        let sent = bot.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "7");
        assert!(sent[0].1.contains("All good!"));
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_abort_pass() {
        let store = Arc::new(MemoryVehicleStore::new());
        store.create(&NewVehicle::new(1, "Blocked")).unwrap();
        store.create(&NewVehicle::new(2, "Fine").with_fuel(12)).unwrap();
        let bot = Arc::new(RecordingBot { blocked: vec!["1".to_string()], ..Default::default() });
        let service = DecayService::new(store.clone(), bot.clone());

        let report = service.run_pass().await.unwrap();
        assert_eq!(report, PassReport { processed: 2, delivered: 1, failed: 1 });

        // Both vehicles decayed even though one owner was unreachable
        assert_eq!(store.list(1).unwrap()[0].fuel_km_left, 95);
        assert_eq!(store.list(2).unwrap()[0].fuel_km_left, 7);

        let sent = bot.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Low fuel! Please refuel soon."));
    }

    #[tokio::test]
    async fn test_repeated_passes_floor_at_zero() {
        let store = Arc::new(MemoryVehicleStore::new());
        store.create(&NewVehicle::new(1, "Old").with_fuel(8).with_oil(15)).unwrap();
        let service = DecayService::new(store.clone(), Arc::new(RecordingBot::default()));

        for _ in 0..5 {
            service.run_pass().await.unwrap();
        }
        let v = &store.list(1).unwrap()[0];
        assert_eq!((v.fuel_km_left, v.oil_km_left, v.tyre_pct), (0, 0, 95));
    }

    #[tokio::test]
    async fn test_vehicle_removed_mid_pass_is_skipped() {
        let store = Arc::new(MemoryVehicleStore::new());
        store.create(&NewVehicle::new(1, "First")).unwrap();
        store.create(&NewVehicle::new(2, "Gone")).unwrap();
        store.create(&NewVehicle::new(2, "Kept")).unwrap();
        let bot = Arc::new(MeddlingBot { store: store.clone(), inner: RecordingBot::default() });
        let service = DecayService::new(store.clone(), bot.clone());

        let report = service.run_pass().await.unwrap();
        assert_eq!(report, PassReport { processed: 2, delivered: 2, failed: 0 });

        let sent = bot.inner.sent.lock().unwrap();
        let names: Vec<&str> = sent.iter().map(|(_, text)| text.lines().next().unwrap()).collect();
        assert_eq!(names, vec!["First", "Kept"]);

        // The mid-pass edit loses to the snapshot value
        let owner2 = store.list(2).unwrap();
        assert_eq!(owner2.len(), 1);
        assert_eq!(owner2[0].fuel_km_left, 95);
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_pass() {
        let store = Arc::new(FailingStore {
            inner: MemoryVehicleStore::new(),
            fail_from: 2,
            writes: AtomicUsize::new(0),
        });
        store.create(&NewVehicle::new(1, "A")).unwrap();
        store.create(&NewVehicle::new(2, "B")).unwrap();
        store.create(&NewVehicle::new(3, "C")).unwrap();
        let bot = Arc::new(RecordingBot::default());
        let service = DecayService::new(store.clone(), bot.clone());

        let result = service.run_pass().await;
        assert!(matches!(result, Err(StorageError::LockPoisoned)));

        let sent = bot.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "1");

        assert_eq!(store.list(1).unwrap()[0].fuel_km_left, 95);
        assert_eq!(store.list(2).unwrap()[0].fuel_km_left, 100);
        assert_eq!(store.list(3).unwrap()[0].fuel_km_left, 100);
    }

    #[tokio::test]
    async fn test_empty_store_pass() {
        let service = DecayService::new(
            Arc::new(MemoryVehicleStore::new()),
            Arc::new(RecordingBot::default()),
        );
        assert_eq!(service.run_pass().await.unwrap(), PassReport::default());
    }
}
