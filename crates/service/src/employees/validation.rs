use chrono::{Months, NaiveDate};
use configs::EmployeesConfig;

use super::domain::{EmployeePatch, NewEmployee};
use super::errors::EmployeeError;

/// Business rules applied to incoming employee payloads.
#[derive(Debug, Clone)]
pub struct EmployeeRules {
    departments: Vec<String>,
    min_salary: i64,
    max_salary: i64,
    earliest_birth: NaiveDate,
    latest_birth: NaiveDate,
}

impl EmployeeRules {
    /// Birth-date bounds are computed relative to `today`.
    pub fn from_config(cfg: &EmployeesConfig, today: NaiveDate) -> Self {
        let years_back = |age: u32| today.checked_sub_months(Months::new(age.saturating_mul(12))).unwrap_or(NaiveDate::MIN);
        Self {
            departments: cfg.departments.clone(),
            min_salary: cfg.min_salary,
            max_salary: cfg.max_salary,
            earliest_birth: years_back(cfg.max_age),
            latest_birth: years_back(cfg.min_age),
        }
    }

    pub fn departments(&self) -> &[String] { &self.departments }

    /// Check a full record; every failed rule is reported.
    pub fn validate_new(&self, e: &NewEmployee) -> Result<(), EmployeeError> {
        let mut failures = Vec::new();
        if let Some(id) = &e.id {
            if uuid::Uuid::parse_str(id).is_err() {
                failures.push("id must be a valid UUID".to_string());
            }
        }
        self.check_full_name(&e.full_name, &mut failures);
        self.check_avatar(&e.avatar, &mut failures);
        self.check_department(&e.department, &mut failures);
        self.check_birth_date(&e.birth_date, &mut failures);
        self.check_salary(e.salary, &mut failures);
        finish(failures)
    }

    /// Same rules, applied only to the fields present in the patch.
    pub fn validate_patch(&self, p: &EmployeePatch) -> Result<(), EmployeeError> {
        let mut failures = Vec::new();
        if let Some(v) = &p.full_name { self.check_full_name(v, &mut failures); }
        if let Some(v) = &p.avatar { self.check_avatar(v, &mut failures); }
        if let Some(v) = &p.department { self.check_department(v, &mut failures); }
        if let Some(v) = &p.birth_date { self.check_birth_date(v, &mut failures); }
        if let Some(v) = p.salary { self.check_salary(v, &mut failures); }
        finish(failures)
    }

    fn check_full_name(&self, name: &str, out: &mut Vec<String>) {
        if name.trim().chars().count() < 2 {
            out.push("Full Name must be at least 2 characters long".into());
        }
    }

    fn check_avatar(&self, avatar: &str, out: &mut Vec<String>) {
        if !is_http_url(avatar) {
            out.push("Avatar must be a valid URL".into());
        }
    }

    fn check_department(&self, department: &str, out: &mut Vec<String>) {
        if !self.departments.iter().any(|d| d == department) {
            out.push(format!("Department must be one of: {}", self.departments.join(", ")));
        }
    }

    fn check_birth_date(&self, raw: &str, out: &mut Vec<String>) {
        let in_range = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|d| d >= self.earliest_birth && d <= self.latest_birth)
            .unwrap_or(false);
        if !in_range {
            out.push(format!(
                "Birth date must be between {} and {} (ISO format)",
                self.earliest_birth.format("%Y-%m-%d"),
                self.latest_birth.format("%Y-%m-%d")
            ));
        }
    }

    fn check_salary(&self, salary: i64, out: &mut Vec<String>) {
        if salary < self.min_salary {
            out.push(format!("Salary must be greater than {}", self.min_salary));
        }
        if salary > self.max_salary {
            out.push(format!("Salary must be less than {}", self.max_salary));
        }
    }
}

fn finish(failures: Vec<String>) -> Result<(), EmployeeError> {
    if failures.is_empty() { Ok(()) } else { Err(EmployeeError::Validation(failures.join("; "))) }
}

fn is_http_url(raw: &str) -> bool {
    let rest = match raw.strip_prefix("https://").or_else(|| raw.strip_prefix("http://")) {
        Some(r) => r,
        None => return false,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    !host.is_empty() && !host.starts_with(':') && !raw.chars().any(char::is_whitespace)
}
