//! Writes the TypeScript declarations of the API types to `shared/types.ts`.

use std::{env, fs, path::PathBuf};

use ts_rs::TS;

fn generate_types_content() -> String {
    let header = "// This file was generated by `cargo run --bin generate-types`.\n\
                  // Do not edit it by hand.\n\n";

    let decls = [
        utils::response::ApiResponse::<()>::decl(),
        db::models::service::Service::decl(),
        db::models::service::CreateService::decl(),
        db::models::therapist::Therapist::decl(),
        db::models::therapist::CreateTherapist::decl(),
        db::models::appointment::AppointmentStatus::decl(),
        db::models::appointment::Appointment::decl(),
        db::models::appointment::AppointmentDetails::decl(),
        db::models::appointment::CreateAppointment::decl(),
        db::models::appointment::RescheduleAppointment::decl(),
        services::services::availability::Slot::decl(),
        services::services::availability::AvailableSlot::decl(),
        services::services::booking::AvailabilityQuery::decl(),
        services::services::booking::Availability::decl(),
        services::services::booking::ListAppointmentsQuery::decl(),
        services::services::identity::Role::decl(),
        services::services::identity::CurrentClient::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|d| {
            let trimmed = d.trim_start();
            if trimmed.starts_with("export") {
                d
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{header}{body}\n")
}

fn main() {
    let check_mode = env::args().any(|arg| arg == "--check");

    let shared_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared");
    let types_path = shared_path.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&types_path).unwrap_or_default();
        if current == generated {
            println!("shared/types.ts is up to date.");
            std::process::exit(0);
        }
        eprintln!("shared/types.ts is out of date. Run `cargo run --bin generate-types`.");
        std::process::exit(1);
    }

    if let Err(e) = fs::create_dir_all(&shared_path).and_then(|_| fs::write(&types_path, generated))
    {
        eprintln!("Failed to write {}: {e}", types_path.display());
        std::process::exit(1);
    }
    println!("Wrote {}", types_path.display());
}
