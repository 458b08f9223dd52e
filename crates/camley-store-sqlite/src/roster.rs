//! [`RosterStore`] for [`SqliteStore`].

use camley_core::{
  account::{Caller, Role},
  auth::{Action, authorize},
  billing::{Payment, PaymentStatus},
  notification::NotificationKind,
  roster::{Enrollment, NewStudent, Student, StudentPatch, StudentQuery, StudentRemoval},
  store::RosterStore,
};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  billing::insert_payment,
  encode::{
    RawStudent, STUDENT_COLUMNS, count, encode_dt, encode_opt_uuid, encode_uuid, query_rows,
  },
  store::{parent, route, student},
};

/// Whether `caller` may see `student`: administrators always, parents their
/// own children, drivers the students riding their route.
pub(crate) fn can_see_student(conn: &Connection, caller: &Caller, student: &Student) -> Result<bool> {
  Ok(match caller.role {
    Role::Admin => true,
    Role::Parent => student.parent_id == Some(caller.account_id),
    Role::Driver => match student.route_id {
      Some(route_id) => route(conn, route_id)?.driver_id == Some(caller.account_id),
      None => false,
    },
  })
}

/// Check the optional parent and route links point at real records.
fn check_links(conn: &Connection, parent_id: Option<Uuid>, route_id: Option<Uuid>) -> Result<()> {
  if let Some(parent_id) = parent_id {
    parent(conn, parent_id)?;
  }
  if let Some(route_id) = route_id {
    route(conn, route_id)?;
  }
  Ok(())
}

impl RosterStore for SqliteStore {
  async fn enroll(&self, caller: Caller, input: NewStudent) -> Result<Enrollment> {
    authorize(&caller, Action::EnrollStudent)?;
    input.validate()?;

    let enrollment = self
      .transact(move |conn, outbox, ctx| {
        check_links(conn, input.parent_id, input.route_id)?;

        let name = input.name.trim().to_owned();
        let duplicates = count(
          conn,
          "SELECT COUNT(*) FROM students
           WHERE name = ?1 AND grade = ?2 AND school = ?3 AND parent_id IS ?4",
          params![name, input.grade, input.school, encode_opt_uuid(input.parent_id)],
        )?;
        if duplicates > 0 {
          return Err(
            camley_core::Error::Conflict(format!("{name} is already enrolled")).into(),
          );
        }

        let student = Student {
          student_id:  Uuid::new_v4(),
          name,
          age:         input.age,
          gender:      input.gender.unwrap_or_default(),
          grade:       input.grade,
          school:      input.school,
          condition:   input.condition,
          parent_id:   input.parent_id,
          route_id:    input.route_id,
          active:      true,
          enrolled_at: ctx.now,
        };
        conn.execute(
          "INSERT INTO students (
             student_id, name, age, gender, grade, school, condition,
             parent_id, route_id, active, enrolled_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10)",
          params![
            encode_uuid(student.student_id),
            student.name,
            student.age,
            student.gender,
            student.grade,
            student.school,
            student.condition,
            encode_opt_uuid(student.parent_id),
            encode_opt_uuid(student.route_id),
            encode_dt(ctx.now),
          ],
        )?;

        let first_payment = Payment {
          payment_id:     Uuid::new_v4(),
          student_id:     student.student_id,
          amount:         ctx.policy.default_amount,
          status:         PaymentStatus::Pending,
          due_at:         ctx.policy.due_from(ctx.now),
          paid_at:        None,
          created_at:     ctx.now,
          months_covered: 1,
          method:         None,
          reference:      None,
          description:    None,
          seen_by_parent: false,
        };
        insert_payment(conn, &first_payment)?;

        if let Some(parent_id) = student.parent_id {
          outbox.notify(
            conn,
            ctx.now,
            parent_id,
            NotificationKind::Student,
            ctx.locale.enrolled(&student.name, first_payment.due_at),
            Some("/parent/dashboard"),
          )?;
        }

        Ok(Enrollment { student, first_payment })
      })
      .await?;

    tracing::info!(
      student_id = %enrollment.student.student_id,
      payment_id = %enrollment.first_payment.payment_id,
      due_at = %enrollment.first_payment.due_at,
      "student enrolled",
    );
    Ok(enrollment)
  }

  async fn get_student(&self, caller: Caller, id: Uuid) -> Result<Student> {
    authorize(&caller, Action::ViewStudents)?;
    self
      .read(move |conn, _| {
        let student = student(conn, id)?;
        if !can_see_student(conn, &caller, &student)? {
          return Err(camley_core::Error::Forbidden("not your student".into()).into());
        }
        Ok(student)
      })
      .await
  }

  async fn list_students(&self, caller: Caller, query: StudentQuery) -> Result<Vec<Student>> {
    authorize(&caller, Action::ViewStudents)?;
    let (parent_id, driver_id) = match caller.role {
      Role::Admin => (query.parent_id, None),
      Role::Parent => (Some(caller.account_id), None),
      Role::Driver => (None, Some(caller.account_id)),
    };
    self
      .read(move |conn, _| {
        query_rows::<RawStudent>(
          conn,
          &format!(
            "SELECT {STUDENT_COLUMNS} FROM students s
             LEFT JOIN routes r ON r.route_id = s.route_id
             WHERE (?1 IS NULL OR s.parent_id = ?1)
               AND (?2 IS NULL OR s.route_id = ?2)
               AND (?3 IS NULL OR r.driver_id = ?3)
             ORDER BY s.name"
          ),
          params![
            encode_opt_uuid(parent_id),
            encode_opt_uuid(query.route_id),
            encode_opt_uuid(driver_id),
          ],
        )
      })
      .await
  }

  async fn update_student(&self, caller: Caller, id: Uuid, patch: StudentPatch) -> Result<Student> {
    authorize(&caller, Action::EditStudent)?;
    let checked = NewStudent {
      name:      patch.name,
      age:       patch.age,
      gender:    patch.gender,
      grade:     patch.grade,
      school:    patch.school,
      condition: patch.condition,
      parent_id: patch.parent_id,
      route_id:  patch.route_id,
    };
    checked.validate()?;

    self
      .transact(move |conn, _, _| {
        student(conn, id)?;
        check_links(conn, checked.parent_id, checked.route_id)?;
        conn.execute(
          "UPDATE students SET
             name = ?2, age = ?3, gender = ?4, grade = ?5, school = ?6,
             condition = ?7, parent_id = ?8, route_id = ?9
           WHERE student_id = ?1",
          params![
            encode_uuid(id),
            checked.name.trim(),
            checked.age,
            checked.gender.unwrap_or_default(),
            checked.grade,
            checked.school,
            checked.condition,
            encode_opt_uuid(checked.parent_id),
            encode_opt_uuid(checked.route_id),
          ],
        )?;
        student(conn, id)
      })
      .await
  }

  async fn delete_student(&self, caller: Caller, id: Uuid) -> Result<StudentRemoval> {
    authorize(&caller, Action::DeleteStudent)?;
    let removal = self
      .transact(move |conn, outbox, ctx| {
        let student = student(conn, id)?;
        let key = encode_uuid(id);
        let payments_removed =
          count(conn, "SELECT COUNT(*) FROM payments WHERE student_id = ?1", params![key])?;
        let attendance_removed =
          count(conn, "SELECT COUNT(*) FROM attendance WHERE student_id = ?1", params![key])?;
        // Payments and attendance go with the row via ON DELETE CASCADE.
        conn.execute("DELETE FROM students WHERE student_id = ?1", params![key])?;

        if let Some(parent_id) = student.parent_id {
          outbox.notify(
            conn,
            ctx.now,
            parent_id,
            NotificationKind::Student,
            ctx.locale.student_withdrawn(&student.name),
            None,
          )?;
        }
        Ok(StudentRemoval { student, payments_removed, attendance_removed })
      })
      .await?;

    tracing::info!(
      student_id = %id,
      payments = removal.payments_removed,
      attendance = removal.attendance_removed,
      "student deleted",
    );
    Ok(removal)
  }
}
