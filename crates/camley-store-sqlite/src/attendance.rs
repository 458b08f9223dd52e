//! [`AttendanceStore`] for [`SqliteStore`].

use camley_core::{
  account::Caller,
  attendance::{AttendanceRecord, ManualSummary, ManualSummaryInput, NewAttendance},
  auth::{Action, authorize},
  fleet::RunStatus,
  notification::NotificationKind,
  store::AttendanceStore,
};
use rusqlite::params;
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    MANUAL_COLUMNS, RawManualSummary, count, encode_date, encode_time, encode_uuid, query_one,
  },
  store::{account, admin_id, route, route_of_driver, student, unique_or},
};

impl AttendanceStore for SqliteStore {
  async fn record_attendance(
    &self,
    caller: Caller,
    input: NewAttendance,
  ) -> Result<AttendanceRecord> {
    authorize(&caller, Action::RecordAttendance)?;

    let record = self
      .transact(move |conn, outbox, ctx| {
        let student = student(conn, input.student_id)?;
        let on_route = match student.route_id {
          Some(route_id) => route(conn, route_id)?.driver_id == Some(caller.account_id),
          None => false,
        };
        if !on_route {
          return Err(
            camley_core::Error::Forbidden(format!("{} is not on your route", student.name)).into(),
          );
        }

        let today = ctx.now.date_naive();
        let existing = count(
          conn,
          "SELECT COUNT(*) FROM attendance WHERE student_id = ?1 AND date = ?2",
          params![encode_uuid(student.student_id), encode_date(today)],
        )?;
        let duplicate = || format!("attendance for {} already recorded on {today}", student.name);
        if existing > 0 {
          return Err(camley_core::Error::Conflict(duplicate()).into());
        }

        let record = AttendanceRecord {
          attendance_id: Uuid::new_v4(),
          student_id:    student.student_id,
          date:          today,
          time:          ctx.now.time(),
          status:        input.status,
          observations:  input.observations,
          driver_id:     Some(caller.account_id),
        };
        conn
          .execute(
            "INSERT INTO attendance (
               attendance_id, student_id, date, time, status, observations, driver_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
              encode_uuid(record.attendance_id),
              encode_uuid(record.student_id),
              encode_date(record.date),
              encode_time(record.time),
              record.status.as_ref(),
              record.observations,
              encode_uuid(caller.account_id),
            ],
          )
          .map_err(|e| unique_or(e, duplicate))?;

        if let Some(parent_id) = student.parent_id {
          outbox.notify(
            conn,
            ctx.now,
            parent_id,
            NotificationKind::Attendance,
            ctx.locale.attendance_marked(&student.name, record.status),
            Some("/parent/dashboard"),
          )?;
        }
        Ok(record)
      })
      .await?;

    tracing::info!(
      student_id = %record.student_id,
      status = %record.status,
      "attendance recorded",
    );
    Ok(record)
  }

  async fn save_manual_summary(
    &self,
    caller: Caller,
    input: ManualSummaryInput,
  ) -> Result<ManualSummary> {
    authorize(&caller, Action::RecordAttendance)?;
    self
      .transact(move |conn, _, ctx| {
        let driver_id = encode_uuid(caller.account_id);
        let date = encode_date(ctx.now.date_naive());
        conn.execute(
          "INSERT INTO manual_attendance (summary_id, driver_id, date, present, absent, notes)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (driver_id, date) DO UPDATE SET
             present = excluded.present,
             absent  = excluded.absent,
             notes   = excluded.notes",
          params![
            encode_uuid(Uuid::new_v4()),
            driver_id,
            date,
            input.present,
            input.absent,
            input.notes,
          ],
        )?;
        query_one::<RawManualSummary>(
          conn,
          &format!(
            "SELECT {MANUAL_COLUMNS} FROM manual_attendance m
             WHERE m.driver_id = ?1 AND m.date = ?2"
          ),
          params![driver_id, date],
        )?
        .ok_or_else(|| camley_core::Error::not_found("manual summary", caller.account_id).into())
      })
      .await
  }

  async fn set_run_status(&self, caller: Caller, status: RunStatus) -> Result<()> {
    authorize(&caller, Action::SetRunStatus)?;
    self
      .transact(move |conn, outbox, ctx| {
        let driver = account(conn, caller.account_id)?;
        if route_of_driver(conn, driver.account_id)?.is_none() {
          return Err(camley_core::Error::validation("route", "no route is assigned to you").into());
        }
        match status {
          RunStatus::Started => {
            let cleared = conn.execute(
              "DELETE FROM attendance WHERE driver_id = ?1 AND date = ?2",
              params![encode_uuid(driver.account_id), encode_date(ctx.now.date_naive())],
            )?;
            tracing::debug!(driver_id = %driver.account_id, cleared, "run started");
          }
          RunStatus::Paused => {}
          RunStatus::Finished => {
            if let Some(admin) = admin_id(conn)? {
              outbox.notify(
                conn,
                ctx.now,
                admin,
                NotificationKind::System,
                ctx.locale.run_finished(&driver.name),
                Some("/admin/attendance"),
              )?;
            }
          }
        }
        Ok(())
      })
      .await?;
    tracing::info!(driver_id = %caller.account_id, status = %status, "run status changed");
    Ok(())
  }
}
