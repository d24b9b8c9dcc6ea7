use serde::{Deserialize, Serialize};

/// Stored employee record. Wire format is camelCase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub full_name: String,
    pub avatar: String,
    pub department: String,
    pub birth_date: String,
    pub salary: i64,
}

/// Payload for creating an employee; the backend assigns `id` when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub avatar: String,
    pub department: String,
    pub birth_date: String,
    pub salary: i64,
}

impl NewEmployee {
    /// Materialize the record with its final id.
    pub fn into_employee(self, id: String) -> Employee {
        Employee {
            id,
            full_name: self.full_name,
            avatar: self.avatar,
            department: self.department,
            birth_date: self.birth_date,
            salary: self.salary,
        }
    }
}

impl From<Employee> for NewEmployee {
    fn from(e: Employee) -> Self {
        Self {
            id: Some(e.id),
            full_name: e.full_name,
            avatar: e.avatar,
            department: e.department,
            birth_date: e.birth_date,
            salary: e.salary,
        }
    }
}

/// Partial update. `id` is not a field, so an incoming body carrying it is
/// rejected at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmployeePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.avatar.is_none()
            && self.department.is_none()
            && self.birth_date.is_none()
            && self.salary.is_none()
    }

    /// Shallow merge: only present fields overwrite.
    pub fn apply_to(&self, target: &mut Employee) {
        if let Some(v) = &self.full_name { target.full_name = v.clone(); }
        if let Some(v) = &self.avatar { target.avatar = v.clone(); }
        if let Some(v) = &self.department { target.department = v.clone(); }
        if let Some(v) = &self.birth_date { target.birth_date = v.clone(); }
        if let Some(v) = self.salary { target.salary = v; }
    }
}
