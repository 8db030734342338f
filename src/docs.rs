use crate::api::asset::{
    AssignAsset, AssignmentItem, CreateAsset, ReturnAsset,
};
use crate::api::attendance::AttendanceSummaryResponse;
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::grievance::{FileGrievance, GrievanceTransition};
use crate::api::holiday::CreateHoliday;
use crate::api::invoice::{
    CreateInvoice, InvoiceDetail, InvoiceListResponse, NewTask,
};
use crate::api::learning::{AssignCourse, CreateCourse, EnrollmentItem, ProgressUpdate};
use crate::api::leave::{ApplyLeave, DecisionNote, LeaveItem, LeaveListResponse};
use crate::api::notification::NotificationListResponse;
use crate::api::payroll::RunMonth;
use crate::api::referral::{ReferralDecision, SubmitReferral};
use crate::audit::{InvoiceEdit, TaskEdit};
use crate::model::asset::{Asset, AssetAssignment, AssetStatus};
use crate::model::employee::Employee;
use crate::model::grievance::{Grievance, GrievanceCategory, GrievanceStatus};
use crate::model::holiday::Holiday;
use crate::model::invoice::{Invoice, InvoiceLog, InvoiceStatus, InvoiceTask};
use crate::model::learning::{Course, CourseEnrollment, EnrollmentStatus};
use crate::model::leave::{LeaveApplication, LeaveStatus, LeaveType};
use crate::model::notification::{Notification, NotificationKind};
use crate::model::payroll::PayrollStatement;
use crate::model::referral::{Referral, ReferralStatus};
use crate::models::{LoginReqDto, RegisterReq};
use crate::payroll::MonthRun as PayrollMonthRun;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Suite API",
        version = "1.0.0",
        description = r#"
## HR Suite

This API powers an HR suite covering the day-to-day operations of an
organization, backed by two MySQL databases (the HR schema and a read-only
time tracker joined by employee e-mail).

### 🔹 Key Features
- **Employee Management** — profiles, compensation structure, deactivation
- **Leave Management** — apply, approve/reject, withdraw, admin correction
- **Attendance** — monthly summaries derived from raw tracker time entries
- **Payroll** — statement preview, sequential bulk runs, archived history
- **Holidays** — company calendar feeding the working-day counts
- **Finance** — invoices with an append-only field-level change log
- **Assets, Referrals, Learning, Grievances** — typed CRUD with in-app
  notifications after every write
- **Notifications** — per-user in-app feed

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Sensitive operations require **Admin**, **HR** or **Finance** roles.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::deactivate_employee,

        crate::api::leave::create_leave,
        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::withdraw_leave,
        crate::api::leave::correct_leave,

        crate::api::attendance::month_attendance,

        crate::api::payroll::preview_statement,
        crate::api::payroll::run_payroll,
        crate::api::payroll::list_statements,

        crate::api::holiday::create_holiday,
        crate::api::holiday::list_holidays,
        crate::api::holiday::delete_holiday,

        crate::api::invoice::create_invoice,
        crate::api::invoice::get_invoice,
        crate::api::invoice::list_invoices,
        crate::api::invoice::update_invoice,
        crate::api::invoice::invoice_logs,

        crate::api::asset::create_asset,
        crate::api::asset::list_assets,
        crate::api::asset::assign_asset,
        crate::api::asset::return_asset,
        crate::api::asset::list_assignments,

        crate::api::referral::submit_referral,
        crate::api::referral::list_referrals,
        crate::api::referral::update_referral_status,

        crate::api::learning::create_course,
        crate::api::learning::list_courses,
        crate::api::learning::assign_course,
        crate::api::learning::my_enrollments,
        crate::api::learning::update_progress,

        crate::api::grievance::file_grievance,
        crate::api::grievance::list_grievances,
        crate::api::grievance::transition_grievance,

        crate::api::notification::my_notifications,
        crate::api::notification::mark_read,
        crate::api::notification::mark_all_read,
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,

            Employee,
            CreateEmployee,
            EmployeeListResponse,

            LeaveApplication,
            LeaveStatus,
            LeaveType,
            ApplyLeave,
            DecisionNote,
            LeaveItem,
            LeaveListResponse,

            AttendanceSummaryResponse,

            PayrollStatement,
            PayrollMonthRun,
            RunMonth,

            Holiday,
            CreateHoliday,

            Invoice,
            InvoiceTask,
            InvoiceLog,
            InvoiceStatus,
            CreateInvoice,
            NewTask,
            InvoiceEdit,
            TaskEdit,
            InvoiceDetail,
            InvoiceListResponse,

            Asset,
            AssetAssignment,
            AssetStatus,
            CreateAsset,
            AssignAsset,
            ReturnAsset,
            AssignmentItem,

            Referral,
            ReferralStatus,
            SubmitReferral,
            ReferralDecision,

            Course,
            CourseEnrollment,
            EnrollmentStatus,
            CreateCourse,
            AssignCourse,
            ProgressUpdate,
            EnrollmentItem,

            Grievance,
            GrievanceStatus,
            GrievanceCategory,
            FileGrievance,
            GrievanceTransition,

            Notification,
            NotificationKind,
            NotificationListResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Tracker-derived attendance APIs"),
        (name = "Payroll", description = "Payroll derivation and archive APIs"),
        (name = "Holiday", description = "Company holiday calendar APIs"),
        (name = "Invoice", description = "Finance billing APIs with change logging"),
        (name = "Asset", description = "Asset inventory and assignment APIs"),
        (name = "Referral", description = "Candidate referral APIs"),
        (name = "Learning", description = "Course catalog and enrollment APIs"),
        (name = "Grievance", description = "Grievance filing and handling APIs"),
        (name = "Notification", description = "In-app notification APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
