//! [`TrackingStore`] for [`SqliteStore`].

use camley_core::{
  account::{Caller, Role},
  auth::{Action, authorize},
  location::{Coordinates, FleetPosition, Location, LocationPoint, MAX_HISTORY},
  store::TrackingStore,
};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    RawFleetPosition, RawLocation, RawLocationPoint, count, encode_dt, encode_uuid, query_one,
    query_rows,
  },
};

/// Whether `caller` may see where `driver_id` is.
fn can_locate(conn: &Connection, caller: &Caller, driver_id: Uuid) -> Result<bool> {
  Ok(match caller.role {
    Role::Admin => true,
    Role::Driver => caller.account_id == driver_id,
    Role::Parent => {
      count(
        conn,
        "SELECT COUNT(*) FROM students s JOIN routes r ON r.route_id = s.route_id
         WHERE s.parent_id = ?1 AND r.driver_id = ?2",
        params![encode_uuid(caller.account_id), encode_uuid(driver_id)],
      )? > 0
    }
  })
}

impl TrackingStore for SqliteStore {
  async fn update_location(&self, caller: Caller, position: Coordinates) -> Result<Location> {
    authorize(&caller, Action::ReportLocation)?;
    position.validate()?;
    self
      .transact(move |conn, _, ctx| {
        let driver_id = encode_uuid(caller.account_id);
        let at = encode_dt(ctx.now);
        conn.execute(
          "INSERT INTO locations (driver_id, lat, lng, updated_at) VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (driver_id) DO UPDATE SET
             lat = excluded.lat, lng = excluded.lng, updated_at = excluded.updated_at",
          params![driver_id, position.lat, position.lng, at],
        )?;
        conn.execute(
          "INSERT INTO location_history (driver_id, lat, lng, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![driver_id, position.lat, position.lng, at],
        )?;
        Ok(Location { driver_id: caller.account_id, position, updated_at: ctx.now })
      })
      .await
  }

  async fn latest_location(&self, caller: Caller, driver_id: Uuid) -> Result<Location> {
    authorize(&caller, Action::ViewLocation)?;
    self
      .read(move |conn, _| {
        if !can_locate(conn, &caller, driver_id)? {
          return Err(camley_core::Error::Forbidden("not your driver".into()).into());
        }
        query_one::<RawLocation>(
          conn,
          "SELECT driver_id, lat, lng, updated_at FROM locations WHERE driver_id = ?1",
          params![encode_uuid(driver_id)],
        )?
        .ok_or_else(|| camley_core::Error::not_found("location", driver_id).into())
      })
      .await
  }

  async fn location_history(
    &self,
    caller: Caller,
    driver_id: Uuid,
    limit: u32,
  ) -> Result<Vec<LocationPoint>> {
    authorize(&caller, Action::ViewFleetPositions)?;
    let limit = limit.clamp(1, MAX_HISTORY);
    self
      .read(move |conn, _| {
        let mut points = query_rows::<RawLocationPoint>(
          conn,
          "SELECT lat, lng, recorded_at FROM location_history
           WHERE driver_id = ?1 ORDER BY point_id DESC LIMIT ?2",
          params![encode_uuid(driver_id), limit],
        )?;
        points.reverse();
        Ok(points)
      })
      .await
  }

  async fn fleet_positions(&self, caller: Caller) -> Result<Vec<FleetPosition>> {
    authorize(&caller, Action::ViewFleetPositions)?;
    self
      .read(|conn, _| {
        query_rows::<RawFleetPosition>(
          conn,
          "SELECT a.account_id, a.name, a.active,
                  (SELECT r.name FROM routes r WHERE r.driver_id = a.account_id
                   ORDER BY r.active DESC, r.name LIMIT 1),
                  l.lat, l.lng, l.updated_at
           FROM locations l JOIN accounts a ON a.account_id = l.driver_id
           WHERE a.role = 'driver'
           ORDER BY a.name",
          [],
        )
      })
      .await
  }
}
