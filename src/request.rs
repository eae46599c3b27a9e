//! Request record, its classification enums and the draft used to submit one
use super::error::ValidationError;
use super::utils::new_uuid_to_bech32;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a request.
///
/// `Approved` is a legacy status. The admin actions move a pending request
/// straight to `InProgress`; `Approved` is kept so stored data and the
/// transition table stay complete.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    InProgress,
    #[n(3)]
    Denied,
    #[n(4)]
    Completed,
    #[n(5)]
    Cancelled,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    #[n(0)]
    Requester,
    #[n(1)]
    Admin,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    #[n(0)]
    Low,
    #[default]
    #[n(1)]
    Medium,
    #[n(2)]
    High,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    #[n(0)]
    Access,
    #[n(1)]
    Hardware,
    #[n(2)]
    Software,
    #[n(3)]
    AccountManagement,
    #[n(4)]
    Onboarding,
    #[n(5)]
    Offboarding,
    #[n(6)]
    Facilities,
    #[n(7)]
    Security,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Pending,
        Status::Approved,
        Status::InProgress,
        Status::Denied,
        Status::Completed,
        Status::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::InProgress => "in_progress",
            Status::Denied => "denied",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
        }
    }

    /// Denied, completed and cancelled accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Denied | Status::Completed | Status::Cancelled)
    }

    /// Statuses on which the live SLA clock runs.
    pub fn is_sla_tracked(&self) -> bool {
        matches!(self, Status::Pending | Status::InProgress)
    }
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Requester, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Admin => "admin",
        }
    }
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Access,
        Category::Hardware,
        Category::Software,
        Category::AccountManagement,
        Category::Onboarding,
        Category::Offboarding,
        Category::Facilities,
        Category::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Access => "Access",
            Category::Hardware => "Hardware",
            Category::Software => "Software",
            Category::AccountManagement => "Account Management",
            Category::Onboarding => "Onboarding",
            Category::Offboarding => "Offboarding",
            Category::Facilities => "Facilities",
            Category::Security => "Security",
        }
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    // "user" is the name the account table uses for requesters
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "requester" => Ok(Role::Requester),
            "admin" => Ok(Role::Admin),
            other => Err(ValidationError::InvalidRole(other.to_string())),
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidPriority(s.to_string()))
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidCategory(s.to_string()))
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        })*
    };
}

display_as_str!(Status, Role, Priority, Category);

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

// Utc itself is not Ord, so ordering is written against the instant
impl PartialOrd for TimeStamp<Utc> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeStamp<Utc> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }

    /// # Panics
    /// When the components do not form a valid UTC date-time.
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .expect("invalid calendar date")
            .into()
    }

    /// Reads RFC 3339 text or the `YYYY-MM-DD HH:MM:SS` form the store writes, as UTC.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(|naive| Self(naive.and_utc()))
    }

    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }

    /// Fractional hours of real elapsed time from `self` to `later`. Negative when `later` is earlier.
    pub fn hours_until(&self, later: &TimeStamp<Utc>) -> f64 {
        let elapsed = later.0 - self.0;
        match elapsed.num_microseconds() {
            Some(micros) => micros as f64 / 3_600_000_000.0,
            None => elapsed.num_milliseconds() as f64 / 3_600_000.0,
        }
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// Form input for a new request. Fields stay as submitted text until
/// [`RequestDraft::finalise`] checks them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    request_type: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    department: Option<String>,
}

impl RequestDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_request_type(mut self, request_type: &str) -> Self {
        self.request_type = Some(request_type.to_string());
        self
    }
    pub fn set_category(mut self, category: Category) -> Self {
        self.category = Some(category.as_str().to_string());
        self
    }
    pub fn set_category_name(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
    pub fn set_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority.as_str().to_string());
        self
    }
    pub fn set_priority_name(mut self, priority: &str) -> Self {
        self.priority = Some(priority.to_string());
        self
    }
    pub fn set_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    /// Validates the draft and produces a pending request owned by `requester_id`.
    pub fn finalise(
        self,
        requester_id: &str,
        created_at: TimeStamp<Utc>,
    ) -> anyhow::Result<Request> {
        let request_type = match self.request_type.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(ValidationError::MissingRequestType.into()),
        };
        if requester_id.trim().is_empty() {
            return Err(ValidationError::MissingRequester.into());
        }
        let category: Category = match self.category.as_deref() {
            Some(name) if !name.trim().is_empty() => name.trim().parse()?,
            _ => return Err(ValidationError::MissingCategory.into()),
        };
        // an empty priority field means the form left it at its default
        let priority = match self.priority.as_deref().map(str::trim) {
            None | Some("") => Priority::default(),
            Some(name) => name.parse()?,
        };
        let department = self
            .department
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Request {
            id: new_uuid_to_bech32("req_")?,
            requester_id: requester_id.to_string(),
            request_type,
            category,
            department,
            priority,
            status: Status::Pending,
            created_at,
            reviewed_at: None,
            reviewed_by: None,
            admin_review_notes: None,
        })
    }
}

/// A stored request. Status and review fields only change through
/// [`crate::context::RequestContext::apply_transition`].
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Request {
    #[n(0)]
    id: String, // bech32m encoded uuid7
    #[n(1)]
    requester_id: String,
    #[n(2)]
    request_type: String,
    #[n(3)]
    category: Category,
    #[n(4)]
    department: Option<String>,
    #[n(5)]
    priority: Priority,
    #[n(6)]
    status: Status,
    #[n(7)]
    created_at: TimeStamp<Utc>,
    #[n(8)]
    reviewed_at: Option<TimeStamp<Utc>>,
    #[n(9)]
    reviewed_by: Option<String>,
    #[n(10)]
    admin_review_notes: Option<String>,
}

impl Request {
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn requester_id(&self) -> &str {
        &self.requester_id
    }
    pub fn request_type(&self) -> &str {
        &self.request_type
    }
    pub fn category(&self) -> Category {
        self.category
    }
    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }
    pub fn priority(&self) -> Priority {
        self.priority
    }
    pub fn status(&self) -> Status {
        self.status
    }
    pub fn created_at(&self) -> &TimeStamp<Utc> {
        &self.created_at
    }
    pub fn reviewed_at(&self) -> Option<&TimeStamp<Utc>> {
        self.reviewed_at.as_ref()
    }
    pub fn reviewed_by(&self) -> Option<&str> {
        self.reviewed_by.as_deref()
    }
    pub fn admin_review_notes(&self) -> Option<&str> {
        self.admin_review_notes.as_deref()
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    // reviewed_at and reviewed_by are only ever written as a pair
    pub(crate) fn mark_reviewed(
        &mut self,
        reviewer: &str,
        at: TimeStamp<Utc>,
        notes: Option<String>,
    ) {
        self.reviewed_at = Some(at);
        self.reviewed_by = Some(reviewer.to_string());
        if notes.is_some() {
            self.admin_review_notes = notes;
        }
    }
}
