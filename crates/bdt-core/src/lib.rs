//! Core domain model for the business development tool.
//!
//! Records serialize to the same field names the JSON data file uses
//! (`size`, `type`, `created_date`, ...). Open-ended labels (sector, need type,
//! looking-for role) parse into closed enums with an `Other` fallback so they
//! never fail to load; fixed buckets are plain enums.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod compat;

pub use compat::parse_timestamp;

pub const CRATE_NAME: &str = "bdt-core";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

fn parse_fixed<T: Copy>(
    all: &[T],
    as_str: impl Fn(&T) -> &'static str,
    kind: &'static str,
    input: &str,
) -> Result<T, ParseEnumError> {
    let input = input.trim();
    all.iter()
        .copied()
        .find(|v| as_str(v).eq_ignore_ascii_case(input))
        .ok_or_else(|| ParseEnumError {
            kind,
            value: input.to_string(),
        })
}

/// Industry sector of a company or a need's target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sector {
    Technology,
    Finance,
    Healthcare,
    Manufacturing,
    Retail,
    Education,
    RealEstate,
    Other(String),
}

impl Sector {
    pub const KNOWN: [Sector; 7] = [
        Sector::Technology,
        Sector::Finance,
        Sector::Healthcare,
        Sector::Manufacturing,
        Sector::Retail,
        Sector::Education,
        Sector::RealEstate,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Sector::Technology => "Technology",
            Sector::Finance => "Finance",
            Sector::Healthcare => "Healthcare",
            Sector::Manufacturing => "Manufacturing",
            Sector::Retail => "Retail",
            Sector::Education => "Education",
            Sector::RealEstate => "Real Estate",
            Sector::Other(label) => label,
        }
    }

    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        Self::KNOWN
            .iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(label))
            .cloned()
            .unwrap_or_else(|| Sector::Other(label.to_string()))
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<String> for Sector {
    fn from(value: String) -> Self {
        Sector::parse(&value)
    }
}

impl From<&str> for Sector {
    fn from(value: &str) -> Self {
        Sector::parse(value)
    }
}

impl From<Sector> for String {
    fn from(value: Sector) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headcount bucket, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompanySize {
    #[serde(rename = "1-10")]
    Micro,
    #[serde(rename = "11-50")]
    Small,
    #[serde(rename = "51-200")]
    Medium,
    #[serde(rename = "201-1000")]
    Large,
    #[serde(rename = "1000+")]
    Enterprise,
}

impl CompanySize {
    pub const ALL: [CompanySize; 5] = [
        CompanySize::Micro,
        CompanySize::Small,
        CompanySize::Medium,
        CompanySize::Large,
        CompanySize::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySize::Micro => "1-10",
            CompanySize::Small => "11-50",
            CompanySize::Medium => "51-200",
            CompanySize::Large => "201-1000",
            CompanySize::Enterprise => "1000+",
        }
    }
}

impl FromStr for CompanySize {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(&Self::ALL, Self::as_str, "company size", s)
    }
}

impl fmt::Display for CompanySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget bucket of a business need, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BudgetRange {
    #[serde(rename = "$0-10K")]
    UpTo10K,
    #[serde(rename = "$10K-50K")]
    From10KTo50K,
    #[serde(rename = "$50K-100K")]
    From50KTo100K,
    #[serde(rename = "$100K-500K")]
    From100KTo500K,
    #[serde(rename = "$500K+")]
    Over500K,
}

impl BudgetRange {
    pub const ALL: [BudgetRange; 5] = [
        BudgetRange::UpTo10K,
        BudgetRange::From10KTo50K,
        BudgetRange::From50KTo100K,
        BudgetRange::From100KTo500K,
        BudgetRange::Over500K,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetRange::UpTo10K => "$0-10K",
            BudgetRange::From10KTo50K => "$10K-50K",
            BudgetRange::From50KTo100K => "$50K-100K",
            BudgetRange::From100KTo500K => "$100K-500K",
            BudgetRange::Over500K => "$500K+",
        }
    }
}

impl FromStr for BudgetRange {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(&Self::ALL, Self::as_str, "budget range", s)
    }
}

impl fmt::Display for BudgetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeline {
    Immediate,
    #[serde(rename = "1-3 months")]
    OneToThreeMonths,
    #[serde(rename = "3-6 months")]
    ThreeToSixMonths,
    #[serde(rename = "6-12 months")]
    SixToTwelveMonths,
    #[serde(rename = "12+ months")]
    OverTwelveMonths,
}

impl Timeline {
    pub const ALL: [Timeline; 5] = [
        Timeline::Immediate,
        Timeline::OneToThreeMonths,
        Timeline::ThreeToSixMonths,
        Timeline::SixToTwelveMonths,
        Timeline::OverTwelveMonths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeline::Immediate => "Immediate",
            Timeline::OneToThreeMonths => "1-3 months",
            Timeline::ThreeToSixMonths => "3-6 months",
            Timeline::SixToTwelveMonths => "6-12 months",
            Timeline::OverTwelveMonths => "12+ months",
        }
    }
}

impl FromStr for Timeline {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(&Self::ALL, Self::as_str, "timeline", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(&Self::ALL, Self::as_str, "priority", s)
    }
}

/// Why a business need was raised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NeedType {
    PreSaleAction,
    NewCustomerAcquisition,
    ProactiveCustomerContact,
    SignificantBusinessEvent,
    ProfessionalManagement,
    LowCommunicationFrequency,
    Other(String),
}

impl NeedType {
    pub const KNOWN: [NeedType; 6] = [
        NeedType::PreSaleAction,
        NeedType::NewCustomerAcquisition,
        NeedType::ProactiveCustomerContact,
        NeedType::SignificantBusinessEvent,
        NeedType::ProfessionalManagement,
        NeedType::LowCommunicationFrequency,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NeedType::PreSaleAction => "Pre-sale action",
            NeedType::NewCustomerAcquisition => "New customer acquisition",
            NeedType::ProactiveCustomerContact => "Proactive customer contact",
            NeedType::SignificantBusinessEvent => "Significant business event",
            NeedType::ProfessionalManagement => "Professional management",
            NeedType::LowCommunicationFrequency => "Low communication frequency",
            NeedType::Other(label) => label,
        }
    }

    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        Self::KNOWN
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(label))
            .cloned()
            .unwrap_or_else(|| NeedType::Other(label.to_string()))
    }
}

impl From<String> for NeedType {
    fn from(value: String) -> Self {
        NeedType::parse(&value)
    }
}

impl From<NeedType> for String {
    fn from(value: NeedType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of counterpart a business need is looking for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LookingFor {
    Investor,
    Customer,
    Supplier,
    Partner,
    ServiceProvider,
    Mentor,
    /// `"Other"` itself, or any label outside the known roles.
    Other(String),
}

impl LookingFor {
    pub const KNOWN: [LookingFor; 6] = [
        LookingFor::Investor,
        LookingFor::Customer,
        LookingFor::Supplier,
        LookingFor::Partner,
        LookingFor::ServiceProvider,
        LookingFor::Mentor,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            LookingFor::Investor => "Investor",
            LookingFor::Customer => "Customer",
            LookingFor::Supplier => "Supplier",
            LookingFor::Partner => "Partner",
            LookingFor::ServiceProvider => "Service Provider",
            LookingFor::Mentor => "Mentor",
            LookingFor::Other(label) => label,
        }
    }

    /// Case-insensitive; anything unrecognized lands in `Other`.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        Self::KNOWN
            .iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(label))
            .cloned()
            .unwrap_or_else(|| LookingFor::Other(label.to_string()))
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<String> for LookingFor {
    fn from(value: String) -> Self {
        LookingFor::parse(&value)
    }
}

impl From<&str> for LookingFor {
    fn from(value: &str) -> Self {
        LookingFor::parse(value)
    }
}

impl From<LookingFor> for String {
    fn from(value: LookingFor) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LookingFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedStatus {
    #[default]
    Active,
    Inactive,
}

impl NeedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeedStatus::Active => "active",
            NeedStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for NeedStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(
            &[NeedStatus::Active, NeedStatus::Inactive],
            Self::as_str,
            "need status",
            s,
        )
    }
}

/// Lifecycle stage of a connection, in the order it usually progresses.
/// `Closed` can follow any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Initiated,
    Contacted,
    Responded,
    MeetingScheduled,
    MeetingCompleted,
    Connected,
    Closed,
}

impl ConnectionStatus {
    pub const ALL: [ConnectionStatus; 7] = [
        ConnectionStatus::Initiated,
        ConnectionStatus::Contacted,
        ConnectionStatus::Responded,
        ConnectionStatus::MeetingScheduled,
        ConnectionStatus::MeetingCompleted,
        ConnectionStatus::Connected,
        ConnectionStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Initiated => "initiated",
            ConnectionStatus::Contacted => "contacted",
            ConnectionStatus::Responded => "responded",
            ConnectionStatus::MeetingScheduled => "meeting_scheduled",
            ConnectionStatus::MeetingCompleted => "meeting_completed",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Closed => "closed",
        }
    }

    /// Stages counted as a success by connection statistics.
    pub fn is_successful(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::Connected | ConnectionStatus::MeetingCompleted
        )
    }
}

impl FromStr for ConnectionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(&Self::ALL, Self::as_str, "connection status", s)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactRole {
    #[serde(rename = "Decision Maker")]
    DecisionMaker,
    Influencer,
    User,
    Technical,
    Financial,
}

impl ContactRole {
    pub const ALL: [ContactRole; 5] = [
        ContactRole::DecisionMaker,
        ContactRole::Influencer,
        ContactRole::User,
        ContactRole::Technical,
        ContactRole::Financial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactRole::DecisionMaker => "Decision Maker",
            ContactRole::Influencer => "Influencer",
            ContactRole::User => "User",
            ContactRole::Technical => "Technical",
            ContactRole::Financial => "Financial",
        }
    }
}

impl FromStr for ContactRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(&Self::ALL, Self::as_str, "contact role", s)
    }
}

/// A company in the catalog. `name` is the key other records refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub sector: Option<Sector>,
    #[serde(default, deserialize_with = "compat::blank_as_none")]
    pub size: Option<CompanySize>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "compat::timestamp")]
    pub created_date: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sector: None,
            size: None,
            location: String::new(),
            website: String::new(),
            founded_year: None,
            description: String::new(),
            tags: Vec::new(),
            created_date: Utc::now(),
        }
    }

    pub fn with_sector(mut self, sector: impl Into<Sector>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_size(mut self, size: CompanySize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Replaces the tag list, dropping repeats but keeping first-seen order.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        self.tags = unique;
        self
    }

    /// The sector, treating a blank label as absent.
    pub fn sector(&self) -> Option<&Sector> {
        self.sector.as_ref().filter(|s| !s.is_blank())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default, deserialize_with = "compat::blank_as_none")]
    pub role_type: Option<ContactRole>,
    #[serde(default)]
    pub notes: String,
    #[serde(deserialize_with = "compat::timestamp")]
    pub created_date: DateTime<Utc>,
}

impl Contact {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        company_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            company_name: company_name.into(),
            position: String::new(),
            phone: String::new(),
            linkedin: String::new(),
            role_type: None,
            notes: String::new(),
            created_date: Utc::now(),
        }
    }
}

/// What a company is trying to find. Owned by company *name*, not id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessNeed {
    pub id: Uuid,
    pub company_name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub need_type: NeedType,
    pub priority: Priority,
    #[serde(default)]
    pub looking_for: Option<LookingFor>,
    #[serde(default)]
    pub target_sectors: Vec<Sector>,
    #[serde(default, deserialize_with = "compat::blank_as_none")]
    pub budget_range: Option<BudgetRange>,
    #[serde(default, deserialize_with = "compat::blank_as_none")]
    pub timeline: Option<Timeline>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: NeedStatus,
    #[serde(deserialize_with = "compat::timestamp")]
    pub created_date: DateTime<Utc>,
}

impl BusinessNeed {
    pub fn new(
        company_name: impl Into<String>,
        title: impl Into<String>,
        need_type: NeedType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_name: company_name.into(),
            title: title.into(),
            need_type,
            priority: Priority::Medium,
            looking_for: None,
            target_sectors: Vec::new(),
            budget_range: None,
            timeline: None,
            description: String::new(),
            status: NeedStatus::Active,
            created_date: Utc::now(),
        }
    }

    pub fn looking_for(mut self, role: impl Into<LookingFor>) -> Self {
        self.looking_for = Some(role.into());
        self
    }

    pub fn with_target_sectors<I, S>(mut self, sectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Sector>,
    {
        self.target_sectors = sectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_budget(mut self, budget: BudgetRange) -> Self {
        self.budget_range = Some(budget);
        self
    }

    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.timeline = Some(timeline);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == NeedStatus::Active
    }

    /// The looking-for role, treating a blank label as absent.
    pub fn role(&self) -> Option<&LookingFor> {
        self.looking_for.as_ref().filter(|r| !r.is_blank())
    }
}

/// A tracked pursuit of one match. `from_entity` owns the originating need.
///
/// `status`, `notes` and `updated_date` are written only through the
/// lifecycle functions in `bdt-connect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub business_need_id: Uuid,
    pub from_entity: String,
    pub to_entity: String,
    pub match_score: f64,
    #[serde(default)]
    pub status: ConnectionStatus,
    #[serde(deserialize_with = "compat::timestamp")]
    pub created_date: DateTime<Utc>,
    #[serde(deserialize_with = "compat::timestamp")]
    pub updated_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl Connection {
    pub fn new(
        business_need_id: Uuid,
        from_entity: impl Into<String>,
        to_entity: impl Into<String>,
        match_score: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_need_id,
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            match_score: match_score.clamp(0.0, 1.0),
            status: ConnectionStatus::Initiated,
            created_date: created_at,
            updated_date: created_at,
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpTask {
    pub id: Uuid,
    pub connection_id: Uuid,
    #[serde(deserialize_with = "compat::timestamp")]
    pub scheduled_date: DateTime<Utc>,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "compat::timestamp")]
    pub created_date: DateTime<Utc>,
}
