//! [`FleetStore`] for [`SqliteStore`].

use camley_core::{
  account::{Caller, Role},
  auth::{Action, authorize},
  fleet::{NewRoute, NewVehicle, Route, Vehicle, VehiclePatch, VehicleStatus, normalize_plate},
  notification::NotificationKind,
  roster::Student,
  store::FleetStore,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    ROUTE_COLUMNS, RawRoute, RawStudent, RawVehicle, STUDENT_COLUMNS, VEHICLE_COLUMNS, count,
    encode_dt, encode_opt_uuid, encode_uuid, query_rows,
  },
  store::{Ctx, Outbox, driver, route, route_of_driver, unique_or, vehicle},
};

const DRIVER_LINK: &str = "/driver/dashboard";

// ── Routes ──────────────────────────────────────────────────────────────────

fn check_route_links(conn: &Connection, input: &NewRoute) -> Result<()> {
  if let Some(driver_id) = input.driver_id {
    driver(conn, driver_id)?;
  }
  if let Some(vehicle_id) = input.vehicle_id {
    vehicle(conn, vehicle_id)?;
  }
  Ok(())
}

/// Reject a second route with the same name and schedule window.
fn check_route_unique(conn: &Connection, input: &NewRoute, except: Option<Uuid>) -> Result<()> {
  let clashes = count(
    conn,
    "SELECT COUNT(*) FROM routes
     WHERE name = ?1 AND starts_at = ?2 AND ends_at = ?3 AND (?4 IS NULL OR route_id != ?4)",
    params![input.name.trim(), input.starts_at, input.ends_at, encode_opt_uuid(except)],
  )?;
  if clashes > 0 {
    return Err(
      camley_core::Error::Conflict(format!(
        "route {} {}-{} already exists",
        input.name.trim(),
        input.starts_at,
        input.ends_at
      ))
      .into(),
    );
  }
  Ok(())
}

/// Tell the incoming driver about the assignment and the outgoing one about
/// losing it. No-op when the driver did not change.
fn announce_driver_change(
  conn: &Connection,
  outbox: &mut Outbox,
  ctx: Ctx,
  route_name: &str,
  previous: Option<Uuid>,
  next: Option<Uuid>,
) -> Result<()> {
  if previous == next {
    return Ok(());
  }
  if let Some(next) = next {
    outbox.notify(
      conn,
      ctx.now,
      next,
      NotificationKind::System,
      ctx.locale.route_assigned(route_name),
      Some(DRIVER_LINK),
    )?;
  }
  if let Some(previous) = previous {
    outbox.notify(
      conn,
      ctx.now,
      previous,
      NotificationKind::System,
      ctx.locale.route_unassigned(route_name),
      Some(DRIVER_LINK),
    )?;
  }
  Ok(())
}

// ── Vehicles ────────────────────────────────────────────────────────────────

/// Last maintenance stamp after a status change: entering maintenance
/// stamps "now", anything else keeps the previous stamp.
fn maintenance_stamp(
  status: VehicleStatus,
  previous: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
  if status == VehicleStatus::Maintenance { Some(now) } else { previous }
}

impl FleetStore for SqliteStore {
  async fn create_route(&self, caller: Caller, input: NewRoute) -> Result<Route> {
    authorize(&caller, Action::ManageRoutes)?;
    input.validate()?;

    self
      .transact(move |conn, outbox, ctx| {
        check_route_links(conn, &input)?;
        check_route_unique(conn, &input, None)?;
        let route = Route {
          route_id:    Uuid::new_v4(),
          name:        input.name.trim().to_owned(),
          description: input.description,
          starts_at:   input.starts_at,
          ends_at:     input.ends_at,
          driver_id:   input.driver_id,
          vehicle_id:  input.vehicle_id,
          active:      true,
        };
        conn.execute(
          "INSERT INTO routes (
             route_id, name, description, starts_at, ends_at, driver_id, vehicle_id, active
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
          params![
            encode_uuid(route.route_id),
            route.name,
            route.description,
            route.starts_at,
            route.ends_at,
            encode_opt_uuid(route.driver_id),
            encode_opt_uuid(route.vehicle_id),
          ],
        )?;
        announce_driver_change(conn, outbox, ctx, &route.name, None, route.driver_id)?;
        Ok(route)
      })
      .await
  }

  async fn get_route(&self, caller: Caller, id: Uuid) -> Result<Route> {
    authorize(&caller, Action::ViewFleet)?;
    self.read(move |conn, _| route(conn, id)).await
  }

  async fn list_routes(&self, caller: Caller) -> Result<Vec<Route>> {
    authorize(&caller, Action::ViewFleet)?;
    self
      .read(|conn, _| {
        query_rows::<RawRoute>(
          conn,
          &format!("SELECT {ROUTE_COLUMNS} FROM routes r ORDER BY r.name, r.starts_at"),
          [],
        )
      })
      .await
  }

  async fn update_route(&self, caller: Caller, id: Uuid, input: NewRoute) -> Result<Route> {
    authorize(&caller, Action::ManageRoutes)?;
    input.validate()?;

    self
      .transact(move |conn, outbox, ctx| {
        let before = route(conn, id)?;
        check_route_links(conn, &input)?;
        check_route_unique(conn, &input, Some(id))?;
        conn.execute(
          "UPDATE routes SET
             name = ?2, description = ?3, starts_at = ?4, ends_at = ?5,
             driver_id = ?6, vehicle_id = ?7
           WHERE route_id = ?1",
          params![
            encode_uuid(id),
            input.name.trim(),
            input.description,
            input.starts_at,
            input.ends_at,
            encode_opt_uuid(input.driver_id),
            encode_opt_uuid(input.vehicle_id),
          ],
        )?;
        let after = route(conn, id)?;
        announce_driver_change(conn, outbox, ctx, &after.name, before.driver_id, after.driver_id)?;
        Ok(after)
      })
      .await
  }

  async fn set_route_active(&self, caller: Caller, id: Uuid, active: bool) -> Result<Route> {
    authorize(&caller, Action::ManageRoutes)?;
    self
      .transact(move |conn, _, _| {
        route(conn, id)?;
        conn.execute(
          "UPDATE routes SET active = ?2 WHERE route_id = ?1",
          params![encode_uuid(id), active],
        )?;
        route(conn, id)
      })
      .await
  }

  async fn delete_route(&self, caller: Caller, id: Uuid) -> Result<Route> {
    authorize(&caller, Action::ManageRoutes)?;
    self
      .transact(move |conn, outbox, ctx| {
        let route = route(conn, id)?;
        conn.execute("DELETE FROM routes WHERE route_id = ?1", params![encode_uuid(id)])?;
        announce_driver_change(conn, outbox, ctx, &route.name, route.driver_id, None)?;
        Ok(route)
      })
      .await
  }

  async fn route_students(&self, caller: Caller, id: Uuid) -> Result<Vec<Student>> {
    authorize(&caller, Action::ViewStudents)?;
    self
      .read(move |conn, _| {
        let route = route(conn, id)?;
        let allowed = match caller.role {
          Role::Admin => true,
          Role::Driver => route.driver_id == Some(caller.account_id),
          Role::Parent => false,
        };
        if !allowed {
          return Err(camley_core::Error::Forbidden("not your route".into()).into());
        }
        query_rows::<RawStudent>(
          conn,
          &format!("SELECT {STUDENT_COLUMNS} FROM students s WHERE s.route_id = ?1 ORDER BY s.name"),
          params![encode_uuid(id)],
        )
      })
      .await
  }

  async fn assign_route_driver(
    &self,
    caller: Caller,
    route_id: Uuid,
    driver_id: Uuid,
  ) -> Result<Route> {
    authorize(&caller, Action::ManageRoutes)?;
    let route = self
      .transact(move |conn, outbox, ctx| {
        let before = route(conn, route_id)?;
        driver(conn, driver_id)?;
        conn.execute(
          "UPDATE routes SET driver_id = ?2 WHERE route_id = ?1",
          params![encode_uuid(route_id), encode_uuid(driver_id)],
        )?;
        announce_driver_change(
          conn,
          outbox,
          ctx,
          &before.name,
          before.driver_id,
          Some(driver_id),
        )?;
        route(conn, route_id)
      })
      .await?;
    tracing::info!(route_id = %route_id, driver_id = %driver_id, "driver assigned to route");
    Ok(route)
  }

  async fn create_vehicle(&self, caller: Caller, input: NewVehicle) -> Result<Vehicle> {
    authorize(&caller, Action::ManageVehicles)?;
    input.validate()?;
    let plate = normalize_plate(&input.plate)?;

    self
      .transact(move |conn, _, ctx| {
        if let Some(driver_id) = input.driver_id {
          driver(conn, driver_id)?;
        }
        let vehicle = Vehicle {
          vehicle_id: Uuid::new_v4(),
          plate,
          brand: input.brand,
          model: input.model,
          year: input.year,
          capacity: input.capacity,
          color: input.color,
          status: input.status,
          active: input.status.is_active(),
          driver_id: input.driver_id,
          mileage: input.mileage,
          last_maintenance_at: maintenance_stamp(input.status, None, ctx.now),
          notes: input.notes,
        };
        conn
          .execute(
            "INSERT INTO vehicles (
               vehicle_id, plate, brand, model, year, capacity, color, status,
               driver_id, mileage, last_maintenance_at, notes
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
              encode_uuid(vehicle.vehicle_id),
              vehicle.plate,
              vehicle.brand,
              vehicle.model,
              vehicle.year,
              vehicle.capacity,
              vehicle.color,
              vehicle.status.as_ref(),
              encode_opt_uuid(vehicle.driver_id),
              vehicle.mileage,
              vehicle.last_maintenance_at.map(encode_dt),
              vehicle.notes,
            ],
          )
          .map_err(|e| unique_or(e, || format!("plate {} is already registered", vehicle.plate)))?;
        Ok(vehicle)
      })
      .await
  }

  async fn get_vehicle(&self, caller: Caller, id: Uuid) -> Result<Vehicle> {
    authorize(&caller, Action::ViewFleet)?;
    self.read(move |conn, _| vehicle(conn, id)).await
  }

  async fn list_vehicles(&self, caller: Caller) -> Result<Vec<Vehicle>> {
    authorize(&caller, Action::ViewFleet)?;
    self
      .read(|conn, _| {
        query_rows::<RawVehicle>(
          conn,
          &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles v ORDER BY v.plate"),
          [],
        )
      })
      .await
  }

  async fn update_vehicle(&self, caller: Caller, id: Uuid, patch: VehiclePatch) -> Result<Vehicle> {
    authorize(&caller, Action::ManageVehicles)?;
    let plate = patch.plate.as_deref().map(normalize_plate).transpose()?;

    self
      .transact(move |conn, _, ctx| {
        let before = vehicle(conn, id)?;
        let plate = plate.unwrap_or(before.plate);
        let status = patch.status.unwrap_or(before.status);
        let stamp = if status == before.status {
          before.last_maintenance_at
        } else {
          maintenance_stamp(status, before.last_maintenance_at, ctx.now)
        };
        conn
          .execute(
            "UPDATE vehicles SET
               plate = ?2, brand = ?3, model = ?4, year = ?5, capacity = ?6, color = ?7,
               status = ?8, mileage = ?9, last_maintenance_at = ?10, notes = ?11
             WHERE vehicle_id = ?1",
            params![
              encode_uuid(id),
              plate,
              patch.brand.or(before.brand),
              patch.model.or(before.model),
              patch.year.or(before.year),
              patch.capacity.or(before.capacity),
              patch.color.or(before.color),
              status.as_ref(),
              patch.mileage.or(before.mileage),
              stamp.map(encode_dt),
              patch.notes.or(before.notes),
            ],
          )
          .map_err(|e| unique_or(e, || format!("plate {plate} is already registered")))?;
        vehicle(conn, id)
      })
      .await
  }

  async fn set_vehicle_status(
    &self,
    caller: Caller,
    id: Uuid,
    status: VehicleStatus,
  ) -> Result<Vehicle> {
    authorize(&caller, Action::ManageVehicles)?;
    self
      .transact(move |conn, _, ctx| {
        let before = vehicle(conn, id)?;
        conn.execute(
          "UPDATE vehicles SET status = ?2, last_maintenance_at = ?3 WHERE vehicle_id = ?1",
          params![
            encode_uuid(id),
            status.as_ref(),
            maintenance_stamp(status, before.last_maintenance_at, ctx.now).map(encode_dt),
          ],
        )?;
        vehicle(conn, id)
      })
      .await
  }

  async fn assign_vehicle(&self, caller: Caller, driver_id: Uuid, vehicle_id: Uuid) -> Result<Vehicle> {
    authorize(&caller, Action::ManageVehicles)?;
    let vehicle = self
      .transact(move |conn, _, _| {
        driver(conn, driver_id)?;
        vehicle(conn, vehicle_id)?;
        conn.execute(
          "UPDATE vehicles SET driver_id = ?2 WHERE vehicle_id = ?1",
          params![encode_uuid(vehicle_id), encode_uuid(driver_id)],
        )?;
        if let Some(route) = route_of_driver(conn, driver_id)? {
          conn.execute(
            "UPDATE routes SET vehicle_id = ?2 WHERE route_id = ?1",
            params![encode_uuid(route.route_id), encode_uuid(vehicle_id)],
          )?;
        }
        vehicle(conn, vehicle_id)
      })
      .await?;
    tracing::info!(driver_id = %driver_id, vehicle_id = %vehicle_id, "vehicle assigned to driver");
    Ok(vehicle)
  }

  async fn delete_vehicle(&self, caller: Caller, id: Uuid) -> Result<Vehicle> {
    authorize(&caller, Action::ManageVehicles)?;
    self
      .transact(move |conn, _, _| {
        let vehicle = vehicle(conn, id)?;
        conn.execute("DELETE FROM vehicles WHERE vehicle_id = ?1", params![encode_uuid(id)])?;
        Ok(vehicle)
      })
      .await
  }
}
