//! Maps parsed subcommands onto operator commands.

use anyhow::{anyhow, Context};
use chrono::{Local, Months, NaiveDate};
use tokio::io::{AsyncBufReadExt, BufReader};

use gympass_core::commands::{attendance, backup, barcodes, clients};
use gympass_core::Gym;
use gympass_store::NewClient;

use crate::args::{AttendanceAction, BackupAction, BarcodeAction, ClientAction, Command};
use crate::output::{emit, emit_rows, emit_with};

pub async fn dispatch(gym: &Gym, command: Command, json: bool) -> anyhow::Result<()> {
    match command {
        Command::Client { action } => client(gym, action, json),
        Command::Barcode { action } => barcode(gym, action, json).await,
        Command::Scan { token: Some(token) } => emit(json, barcodes::scan(gym, &token)),
        Command::Scan { token: None } => scan_loop(gym, json).await,
        Command::Attendance { action } => attendance_cmd(gym, action, json),
        Command::Backup { action } => match action {
            BackupAction::Save { out } => emit(json, backup::save_backup(gym, out.as_deref())),
            BackupAction::Restore { file } => emit(json, backup::restore_backup(gym, &file)),
        },
    }
}

fn client(gym: &Gym, action: ClientAction, json: bool) -> anyhow::Result<()> {
    match action {
        ClientAction::Add {
            name,
            phone,
            email,
            plan,
            start,
            end,
        } => {
            let start = start.unwrap_or_else(|| Local::now().date_naive());
            let end = match end {
                Some(end) => end,
                None => one_month_after(start)?,
            };
            let new = NewClient {
                name,
                phone,
                email,
                subscription_type: plan,
                subscription_start: start,
                subscription_end: end,
            };
            emit(json, clients::add_client(gym, new))
        }
        ClientAction::Update {
            id,
            name,
            phone,
            email,
            plan,
            start,
            end,
        } => {
            let mut client = gym
                .db()
                .get_client(id)
                .with_context(|| format!("Client {id} not found"))?;
            if let Some(name) = name {
                client.name = name;
            }
            if let Some(phone) = phone {
                client.phone = phone;
            }
            if let Some(email) = email {
                client.email = email;
            }
            if let Some(plan) = plan {
                client.subscription_type = plan;
            }
            if let Some(start) = start {
                client.subscription_start = start;
            }
            if let Some(end) = end {
                client.subscription_end = end;
            }
            emit(json, clients::update_client(gym, client))
        }
        ClientAction::Status { id, status } => emit(json, clients::set_client_status(gym, id, status)),
        ClientAction::Delete { id } => emit(json, clients::delete_client(gym, id)),
        ClientAction::Show { id } => emit(json, clients::get_client(gym, id)),
        ClientAction::List => emit_rows(json, clients::list_clients(gym), |c| {
            format!(
                "#{:<5} {:<24} {:<14} {} until {} ({})",
                c.id, c.name, c.phone, c.subscription_type, c.subscription_end, c.status
            )
        }),
        ClientAction::Search { query } => emit_rows(json, clients::search_clients(gym, &query), |c| {
            format!("#{:<5} {:<24} {}", c.id, c.name, c.phone)
        }),
    }
}

async fn barcode(gym: &Gym, action: BarcodeAction, json: bool) -> anyhow::Result<()> {
    match action {
        BarcodeAction::Generate { client_id } => emit(json, barcodes::generate_barcode(gym, client_id)),
        BarcodeAction::Renew { client_id } => emit(json, barcodes::renew_barcode(gym, client_id)),
        BarcodeAction::Activate { record_id } => emit(json, barcodes::activate_barcode(gym, record_id)),
        BarcodeAction::Deactivate { record_id } => {
            emit(json, barcodes::deactivate_barcode(gym, record_id))
        }
        BarcodeAction::List { status } => emit_rows(json, barcodes::list_barcodes(gym, status), |l| {
            format!(
                "#{:<5} {:<9} {} ({})",
                l.record.id, l.record.status, l.record.token, l.client_name
            )
        }),
        BarcodeAction::History { client_id } => {
            emit_rows(json, barcodes::client_barcodes(gym, client_id), |r| {
                format!("#{:<5} {:<9} {} issued {}", r.id, r.status, r.token, r.created_at)
            })
        }
        BarcodeAction::Search { query } => {
            emit_rows(json, barcodes::search_barcodes(gym, &query), |l| {
                format!("#{:<5} {} ({})", l.record.id, l.record.token, l.client_name)
            })
        }
        BarcodeAction::Export { record_id, dest } => {
            emit(json, barcodes::export_barcode(gym, record_id, &dest))
        }
        BarcodeAction::Render => emit_rows(json, barcodes::rerender_active(gym).await, |p| {
            p.display().to_string()
        }),
    }
}

fn attendance_cmd(gym: &Gym, action: AttendanceAction, json: bool) -> anyhow::Result<()> {
    match action {
        AttendanceAction::CheckIn {
            client_id,
            no_duplicate,
            allow_duplicate,
        } => {
            let policy = match (allow_duplicate, no_duplicate) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            emit(json, attendance::check_in(gym, client_id, policy))
        }
        AttendanceAction::CheckOut { attendance_id } => {
            emit(json, attendance::check_out(gym, attendance_id))
        }
        AttendanceAction::Report { date } => {
            emit_with(json, attendance::daily_report(gym, date), |report| {
                report
                    .entries
                    .iter()
                    .map(|e| {
                        format!(
                            "{} {}",
                            e.record.check_in_time.with_timezone(&Local).format("%H:%M"),
                            e.client_name
                        )
                    })
                    .collect()
            })
        }
        AttendanceAction::History { client_id } => {
            emit_rows(json, attendance::client_attendance(gym, client_id), |a| {
                format!("#{:<5} {} {}", a.id, a.date, a.status)
            })
        }
    }
}

/// Resolve scanner input line by line until EOF. A failed scan is reported
/// and the loop carries on.
async fn scan_loop(gym: &Gym, json: bool) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Err(e) = emit(json, barcodes::scan(gym, &line)) {
            eprintln!("{e}");
        }
    }
    Ok(())
}

fn one_month_after(start: NaiveDate) -> anyhow::Result<NaiveDate> {
    start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| anyhow!("subscription start {start} is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_month_after_clamps_to_month_end() {
        let jan31 = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(
            one_month_after(jan31).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[tokio::test]
    async fn test_dispatch_against_temp_database() {
        use gympass_core::config::GymConfig;

        let tmp = tempfile::TempDir::new().unwrap();
        let config = GymConfig {
            db_path: tmp.path().join("gym.db"),
            barcode_dir: tmp.path().join("barcodes"),
            backup_dir: tmp.path().join("backups"),
            ..GymConfig::default()
        };
        let gym = Gym::open(config).unwrap();

        let add = ClientAction::Add {
            name: "Sam Rivera".to_string(),
            phone: "0550000000".to_string(),
            email: String::new(),
            plan: gympass_shared::SubscriptionType::Monthly,
            start: None,
            end: None,
        };
        dispatch(&gym, Command::Client { action: add }, true).await.unwrap();
        dispatch(
            &gym,
            Command::Barcode {
                action: BarcodeAction::Generate { client_id: 1 },
            },
            true,
        )
        .await
        .unwrap();

        let token = gym.db().find_barcode_by_client(1).unwrap().unwrap().token;
        dispatch(&gym, Command::Scan { token: Some(token) }, false).await.unwrap();
        assert_eq!(gym.db().list_attendance_for_client(1).unwrap().len(), 1);

        let missing = dispatch(
            &gym,
            Command::Barcode {
                action: BarcodeAction::Activate { record_id: 99 },
            },
            false,
        )
        .await;
        assert!(missing.is_err());
    }
}
