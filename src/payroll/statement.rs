use crate::model::employee::Employee;
use crate::model::payroll::PayrollStatement;
use crate::payroll::attendance::MonthAttendance;

/// Folds attendance, resolved leave and paid weekends into one statement.
///
/// Payable days are capped at the month's working days and floored at zero,
/// and the attendance ratio scales every earning and deduction line
/// linearly. Net pay is the contractual take-home salary scaled by the same
/// ratio; it is not recomputed as gross minus deductions.
pub fn compose(
    employee: &Employee,
    year: u32,
    month: u32,
    attendance: &MonthAttendance,
    paid_leave_days: f64,
    weekend_days_paid: u32,
) -> PayrollStatement {
    let total_working_days = attendance.total_working_days;
    let raw_payable =
        attendance.days_present as f64 + paid_leave_days + weekend_days_paid as f64;
    let payable_days = raw_payable.min(total_working_days as f64).max(0.0);
    let attendance_ratio = if total_working_days == 0 {
        0.0
    } else {
        payable_days / total_working_days as f64
    };

    let full_gross = employee.monthly_gross();

    PayrollStatement {
        id: None,
        employee_id: employee.id,
        year,
        month,
        total_working_days,
        days_present: attendance.days_present,
        paid_leave_days,
        weekend_days_paid,
        payable_days,
        attendance_ratio,
        hours_worked: attendance.hours_worked,
        basic_pay: employee.basic_pay * attendance_ratio,
        hra: employee.hra * attendance_ratio,
        night_allowance: employee.night_allowance * attendance_ratio,
        special_allowance: employee.special_allowance * attendance_ratio,
        gross_pay: full_gross * attendance_ratio,
        pf_deduction: employee.basic_pay * employee.pf_rate / 100.0 * attendance_ratio,
        esi_deduction: full_gross * employee.esi_rate / 100.0 * attendance_ratio,
        tds_deduction: employee.tds_monthly * attendance_ratio,
        professional_tax: employee.professional_tax * attendance_ratio,
        voluntary_fund: employee.voluntary_fund * attendance_ratio,
        total_deductions: (employee.basic_pay * employee.pf_rate / 100.0
            + full_gross * employee.esi_rate / 100.0
            + employee.tds_monthly
            + employee.professional_tax
            + employee.voluntary_fund)
            * attendance_ratio,
        net_pay: employee.take_home_salary * attendance_ratio,
        generated_by: None,
        generated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    const EPS: f64 = 1e-9;

    fn employee() -> Employee {
        Employee {
            id: 1001,
            employee_code: "EMP-1001".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Nair".to_string(),
            email: "asha.nair@company.com".to_string(),
            phone: None,
            department: "Engineering".to_string(),
            designation: "Senior Developer".to_string(),
            hire_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
            status: "active".to_string(),
            basic_pay: 60000.0,
            hra: 24000.0,
            night_allowance: 3000.0,
            special_allowance: 8000.0,
            pf_rate: 12.0,
            esi_rate: 0.75,
            tds_monthly: 4500.0,
            professional_tax: 200.0,
            voluntary_fund: 1000.0,
            take_home_salary: 78000.0,
        }
    }

    fn attendance(total: u32, present: u32, hours: f64) -> MonthAttendance {
        MonthAttendance {
            total_working_days: total,
            days_present: present,
            hours_worked: hours,
            worked_dates: BTreeSet::new(),
        }
    }

    #[test]
    fn partial_month_scales_everything_by_the_ratio() {
        // 22 working days, 18 present, 2 paid leave days, 1 paid weekend.
        let statement = compose(&employee(), 2026, 2, &attendance(22, 18, 150.0), 2.0, 1);
        assert!((statement.payable_days - 21.0).abs() < EPS);
        assert!((statement.attendance_ratio - 21.0 / 22.0).abs() < EPS);
        assert!((statement.basic_pay - 60000.0 * 21.0 / 22.0).abs() < EPS);
        assert!((statement.gross_pay - 95000.0 * 21.0 / 22.0).abs() < EPS);
        assert!((statement.net_pay - 78000.0 * 21.0 / 22.0).abs() < EPS);
    }

    #[test]
    fn payable_days_never_exceed_working_days() {
        let statement = compose(&employee(), 2026, 2, &attendance(22, 20, 176.0), 3.0, 2);
        assert!((statement.payable_days - 22.0).abs() < EPS);
        assert!((statement.attendance_ratio - 1.0).abs() < EPS);
    }

    #[test]
    fn payable_days_never_go_negative() {
        // Corrupt leave rows can resolve to negative paid days.
        let statement = compose(&employee(), 2026, 2, &attendance(22, 2, 16.0), -5.0, 0);
        assert_eq!(statement.payable_days, 0.0);
        assert_eq!(statement.attendance_ratio, 0.0);
        assert_eq!(statement.net_pay, 0.0);
    }

    #[test]
    fn month_with_no_working_days_pays_nothing() {
        let statement = compose(&employee(), 2026, 2, &attendance(0, 0, 0.0), 0.0, 0);
        assert_eq!(statement.attendance_ratio, 0.0);
        assert_eq!(statement.gross_pay, 0.0);
        assert_eq!(statement.total_deductions, 0.0);
        assert_eq!(statement.net_pay, 0.0);
    }

    #[test]
    fn full_attendance_pays_the_contract_figures() {
        let statement = compose(&employee(), 2026, 2, &attendance(20, 20, 160.0), 0.0, 0);
        assert!((statement.basic_pay - 60000.0).abs() < EPS);
        assert!((statement.gross_pay - 95000.0).abs() < EPS);
        assert!((statement.pf_deduction - 7200.0).abs() < EPS);
        assert!((statement.esi_deduction - 712.5).abs() < EPS);
        assert!((statement.net_pay - 78000.0).abs() < EPS);
    }

    #[test]
    fn net_pay_follows_the_contract_not_the_deduction_lines() {
        let statement = compose(&employee(), 2026, 2, &attendance(20, 20, 160.0), 0.0, 0);
        let gross_minus_deductions = statement.gross_pay - statement.total_deductions;
        assert!((statement.net_pay - 78000.0).abs() < EPS);
        assert!((statement.net_pay - gross_minus_deductions).abs() > 1.0);
    }

    #[test]
    fn deduction_lines_sum_to_the_total() {
        let statement = compose(&employee(), 2026, 2, &attendance(22, 17, 140.0), 1.5, 1);
        let summed = statement.pf_deduction
            + statement.esi_deduction
            + statement.tds_deduction
            + statement.professional_tax
            + statement.voluntary_fund;
        assert!((statement.total_deductions - summed).abs() < EPS);
    }
}
