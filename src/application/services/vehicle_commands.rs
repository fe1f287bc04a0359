//! Vehicle care commands

use std::fmt::Write as _;
use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::application::services::CommandService;
use crate::domain::entities::{Command, LevelField, Message, NewVehicle, OwnerId, Vehicle};
use crate::domain::rules::HealthReport;
use crate::domain::traits::VehicleStore;

pub const ADD_USAGE: &str = "Usage: /add <vehicle_name>";
pub const UPDATE_USAGE: &str = "Usage: /update <vehicle_name> fuel/oil <km>";
pub const REMOVE_USAGE: &str = "Usage: /remove <vehicle_name>";
pub const NO_VEHICLES: &str = "You have no vehicles yet.";
pub const FIELD_INVALID: &str = "Field must be 'fuel' or 'oil'";
pub const KM_INVALID: &str = "KM must be a number";

const WELCOME: &str = "Hello! I'm your Vehicle Care Bot\n\
Commands:\n\
/add <vehicle_name> - Add a vehicle\n\
/list - List your vehicles\n\
/update <vehicle_name> fuel/oil <km> - Update fuel or oil\n\
/status - Check vehicle status\n\
/remove <vehicle_name> - Remove a vehicle\n\
/suggest - Get suggestions on which vehicle to use\n\
/resetme - Reset all your vehicle data";

/// Register every vehicle command on the service
pub fn register(service: &mut CommandService, store: Arc<dyn VehicleStore>) {
    service.register(Command::new("start")
        .with_description("Start the bot")
        .with_aliases(vec!["help".to_string()])
        .with_handler(|_| Ok(WELCOME.to_string())));

    let s = store.clone();
    service.register(Command::new("add")
        .with_description("Add a vehicle")
        .with_handler(move |msg| add(s.as_ref(), msg)));

    let s = store.clone();
    service.register(Command::new("list")
        .with_description("List your vehicles")
        .with_handler(move |msg| list(s.as_ref(), msg)));

    let s = store.clone();
    service.register(Command::new("update")
        .with_description("Update fuel or oil")
        .with_handler(move |msg| update(s.as_ref(), msg)));

    let s = store.clone();
    service.register(Command::new("status")
        .with_description("Check vehicle status")
        .with_handler(move |msg| status(s.as_ref(), msg)));

    let s = store.clone();
    service.register(Command::new("remove")
        .with_description("Remove a vehicle")
        .with_handler(move |msg| remove(s.as_ref(), msg)));

    let s = store.clone();
    service.register(Command::new("suggest")
        .with_description("Get vehicle suggestions")
        .with_handler(move |msg| suggest(s.as_ref(), msg)));

    service.register(Command::new("resetme")
        .with_description("Reset all your vehicle data")
        .with_handler(move |msg| reset(store.as_ref(), msg)));
}

fn owner(msg: &Message) -> Result<OwnerId, CommandError> {
    msg.owner_id()
        .ok_or_else(|| CommandError::usage("Could not tell who sent this message."))
}

/// Remaining arguments joined back into one name
fn joined_name(msg: &Message) -> Option<String> {
    let args = msg.args();
    if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    }
}

fn add(store: &dyn VehicleStore, msg: &Message) -> Result<String, CommandError> {
    let owner_id = owner(msg)?;
    let name = joined_name(msg).ok_or_else(|| CommandError::usage(ADD_USAGE))?;

    let id = store.create(&NewVehicle::new(owner_id, name.clone()))?;
    tracing::info!(owner_id, vehicle_id = id, "Vehicle added");
    Ok(format!("Vehicle '{}' added!", name))
}

fn list(store: &dyn VehicleStore, msg: &Message) -> Result<String, CommandError> {
    let vehicles = store.list(owner(msg)?)?;
    if vehicles.is_empty() {
        return Ok(NO_VEHICLES.to_string());
    }

    let mut reply = "Your vehicles:\n".to_string();
    for v in &vehicles {
        let _ = writeln!(
            reply,
            "{} | Fuel: {} km | Oil: {} km | Tyre: {}%",
            v.name, v.fuel_km_left, v.oil_km_left, v.tyre_pct
        );
    }
    Ok(reply)
}

fn update(store: &dyn VehicleStore, msg: &Message) -> Result<String, CommandError> {
    let owner_id = owner(msg)?;
    let [name, field, km] = msg.args() else {
        return Err(CommandError::usage(UPDATE_USAGE));
    };

    let field: LevelField = field.parse().map_err(|_| CommandError::usage(FIELD_INVALID))?;
    let km: i64 = km.parse().map_err(|_| CommandError::usage(KM_INVALID))?;
    let km = field.clamp(km);

    let matched = store.update_field(owner_id, name, field, km)?;
    if !matched.is_found() {
        tracing::debug!(owner_id, name = %name, "Update matched no vehicle");
    }
    Ok(format!("Vehicle '{}' updated: {} = {} km", name, field, km))
}

fn status(store: &dyn VehicleStore, msg: &Message) -> Result<String, CommandError> {
    let vehicles = store.list(owner(msg)?)?;
    if vehicles.is_empty() {
        return Ok(NO_VEHICLES.to_string());
    }

    let mut reply = "Vehicle Status:\n".to_string();
    for v in &vehicles {
        let _ = write!(
            reply,
            "\n{}:\n   Fuel left: {} km\n   Oil left: {} km\n   Tyre: {}%\n",
            v.name, v.fuel_km_left, v.oil_km_left, v.tyre_pct
        );
    }
    Ok(reply)
}

fn remove(store: &dyn VehicleStore, msg: &Message) -> Result<String, CommandError> {
    let owner_id = owner(msg)?;
    let name = joined_name(msg).ok_or_else(|| CommandError::usage(REMOVE_USAGE))?;

    // The reply is the same whether or not anything matched
    let matched = store.remove_by_name(owner_id, &name)?;
    tracing::info!(owner_id, removed = matched.rows(), "Remove by name");
    Ok(format!("Vehicle '{}' removed.", name))
}

/// One line per vehicle with its alert classification
pub fn suggestion_text(vehicles: &[Vehicle]) -> String {
    let mut reply = "Vehicle Suggestions:\n".to_string();
    for v in vehicles {
        let report = HealthReport::new(v.fuel_km_left, v.oil_km_left);
        let _ = writeln!(reply, "{}: {}", v.name, report);
    }
    reply
}

fn suggest(store: &dyn VehicleStore, msg: &Message) -> Result<String, CommandError> {
    let vehicles = store.list(owner(msg)?)?;
    if vehicles.is_empty() {
        return Ok(NO_VEHICLES.to_string());
    }
    Ok(suggestion_text(&vehicles))
}

fn reset(store: &dyn VehicleStore, msg: &Message) -> Result<String, CommandError> {
    let owner_id = owner(msg)?;
    let matched = store.reset_owner(owner_id)?;
    tracing::info!(owner_id, removed = matched.rows(), "Owner reset");
    Ok("All your vehicle data has been reset!".to_string())
}
