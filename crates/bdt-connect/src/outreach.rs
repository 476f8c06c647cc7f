//! Outreach email templates and the helpers that fill them.
//!
//! Templates use `{name}` placeholders. Rendering refuses to leave a
//! placeholder unfilled; `missing_variables` reports gaps up front instead.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use bdt_core::{BusinessNeed, Company, Connection, Contact, LookingFor, NeedType, Sector};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

pub type Variables = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template `{0}` not found")]
    UnknownTemplate(String),
    #[error("missing required variable `{0}`")]
    MissingVariable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TemplateName {
    #[serde(rename = "initial_outreach")]
    InitialOutreach,
    #[serde(rename = "follow_up_1")]
    FollowUp1,
    #[serde(rename = "follow_up_2")]
    FollowUp2,
    #[serde(rename = "introduction_email")]
    IntroductionEmail,
}

impl TemplateName {
    pub const ALL: [TemplateName; 4] = [
        TemplateName::InitialOutreach,
        TemplateName::FollowUp1,
        TemplateName::FollowUp2,
        TemplateName::IntroductionEmail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateName::InitialOutreach => "initial_outreach",
            TemplateName::FollowUp1 => "follow_up_1",
            TemplateName::FollowUp2 => "follow_up_2",
            TemplateName::IntroductionEmail => "introduction_email",
        }
    }

    /// Follow-up template for the n-th reminder; anything past the first
    /// uses the final follow-up.
    pub fn follow_up(ordinal: u32) -> Self {
        if ordinal == 1 {
            TemplateName::FollowUp1
        } else {
            TemplateName::FollowUp2
        }
    }

    pub fn template(&self) -> EmailTemplate {
        match self {
            TemplateName::InitialOutreach => EmailTemplate {
                subject: "Introduction - {from_company} & {to_company}",
                body: INITIAL_OUTREACH_BODY,
            },
            TemplateName::FollowUp1 => EmailTemplate {
                subject: "Re: Introduction - {from_company} & {to_company}",
                body: FOLLOW_UP_1_BODY,
            },
            TemplateName::FollowUp2 => EmailTemplate {
                subject: "Final follow-up - {from_company} collaboration opportunity",
                body: FOLLOW_UP_2_BODY,
            },
            TemplateName::IntroductionEmail => EmailTemplate {
                subject: "Introduction: {party1_name} <> {party2_name}",
                body: INTRODUCTION_BODY,
            },
        }
    }
}

impl FromStr for TemplateName {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| TemplateError::UnknownTemplate(s.to_string()))
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailTemplate {
    pub subject: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
    pub template_name: TemplateName,
    pub generated_at: DateTime<Utc>,
}

const INITIAL_OUTREACH_BODY: &str = "Dear {contact_name},

I hope this email finds you well. My name is {sender_name} from {from_company}.

{introduction_reason}

{value_proposition}

I believe there could be valuable synergies between our organizations. Would you be open to a brief conversation to explore potential collaboration opportunities?

I'd be happy to schedule a 15-20 minute call at your convenience.

Best regards,
{sender_name}
{sender_title}
{from_company}
{sender_contact}";

const FOLLOW_UP_1_BODY: &str = "Hi {contact_name},

I wanted to follow up on my previous email regarding potential collaboration between {from_company} and {to_company}.

{follow_up_reason}

If now isn't the right time, I'd appreciate any guidance on when might be better or who else might be the right person to connect with.

Thank you for your time.

Best regards,
{sender_name}";

const FOLLOW_UP_2_BODY: &str = "Hi {contact_name},

This is my final follow-up regarding the potential collaboration opportunity between {from_company} and {to_company}.

I understand you're likely very busy, and I don't want to be persistent. If there's interest in the future, please feel free to reach out.

Thank you for your time and consideration.

Best regards,
{sender_name}";

const INTRODUCTION_BODY: &str = "Hi {party1_name} and {party2_name},

I'm pleased to introduce you both as I believe there could be valuable synergies between your organizations.

{party1_name} - {party1_description}

{party2_name} - {party2_description}

{connection_reason}

I'll let you both take it from here. Wishing you a productive conversation!

Best regards,
{introducer_name}";

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"\{(\w+)\}").expect("placeholder regex should compile")
    })
}

/// Every placeholder referenced by the subject or body.
pub fn required_variables(template: TemplateName) -> BTreeSet<String> {
    let EmailTemplate { subject, body } = template.template();
    [subject, body]
        .into_iter()
        .flat_map(|text| placeholder_regex().captures_iter(text))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Required names that are absent or blank in `vars`, sorted.
pub fn missing_variables(template: TemplateName, vars: &Variables) -> Vec<String> {
    required_variables(template)
        .into_iter()
        .filter(|name| vars.get(name).map_or(true, |v| v.trim().is_empty()))
        .collect()
}

fn fill(text: &str, vars: &Variables) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in placeholder_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let name = &caps[1];
        let value = vars
            .get(name)
            .ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

pub fn render(template: TemplateName, vars: &Variables) -> Result<RenderedEmail, TemplateError> {
    let EmailTemplate { subject, body } = template.template();
    Ok(RenderedEmail {
        subject: fill(subject, vars)?,
        body: fill(body, vars)?,
        template_name: template,
        generated_at: Utc::now(),
    })
}

/// Like [`render`], for a template given by name.
pub fn render_named(name: &str, vars: &Variables) -> Result<RenderedEmail, TemplateError> {
    render(name.parse()?, vars)
}

fn role_label(looking_for: Option<&LookingFor>) -> String {
    looking_for
        .map(|r| r.as_str().to_lowercase())
        .unwrap_or_default()
}

/// Opening line keyed by need type. Unrecognized types fall back to a
/// generic sentence built from the looking-for role.
pub fn introduction_reason(need_type: &NeedType, looking_for: Option<&LookingFor>) -> String {
    let role = role_label(looking_for);
    match need_type {
        NeedType::PreSaleAction => {
            "We are currently in our pre-sales process and exploring strategic partnerships.".into()
        }
        NeedType::NewCustomerAcquisition => "We are expanding our customer base and believe your company could benefit from our solutions.".into(),
        NeedType::ProactiveCustomerContact => "We are reaching out to existing clients to explore additional collaboration opportunities.".into(),
        NeedType::SignificantBusinessEvent => format!(
            "Following recent developments in our business, we are seeking {role} partnerships."
        ),
        NeedType::ProfessionalManagement => "As part of our ongoing business development efforts, we are connecting with industry leaders.".into(),
        NeedType::LowCommunicationFrequency => {
            "We wanted to reconnect and explore current collaboration opportunities.".into()
        }
        NeedType::Other(_) => format!(
            "We are currently looking for {role} partnerships and believe your company could be a great fit."
        ),
    }
}

/// Value pitch keyed by looking-for role. Mentor, Other and missing roles
/// get the generic synergy sentence.
pub fn value_proposition(
    looking_for: Option<&LookingFor>,
    target_sectors: &[Sector],
    company_sector: Option<&Sector>,
) -> String {
    let sector = company_sector
        .map(|s| s.as_str().to_lowercase())
        .unwrap_or_default();
    match looking_for {
        Some(LookingFor::Investor) => {
            let targets = target_sectors
                .iter()
                .map(Sector::as_str)
                .collect::<Vec<_>>()
                .join(", ")
                .to_lowercase();
            format!(
                "We are seeking investment to scale our operations in the {targets} sector(s). Your expertise in {sector} could provide valuable strategic guidance."
            )
        }
        Some(LookingFor::Customer) => format!(
            "Our solutions could help streamline your operations in {sector} and drive significant value for your business."
        ),
        Some(LookingFor::Supplier) => format!(
            "We believe your capabilities in {sector} could perfectly complement our business needs and help us serve our customers better."
        ),
        Some(LookingFor::Partner) => format!(
            "A strategic partnership between our companies could create mutual value and help us both expand in the {sector} market."
        ),
        Some(LookingFor::ServiceProvider) => format!(
            "Your expertise in {sector} could help us enhance our service offerings and operational efficiency."
        ),
        Some(LookingFor::Mentor | LookingFor::Other(_)) | None => format!(
            "We believe there could be valuable synergies between our organizations in the {sector} space."
        ),
    }
}

pub fn follow_up_reason(ordinal: u32) -> &'static str {
    match ordinal {
        1 => "I wanted to check if you had a chance to review my previous message about potential collaboration opportunities.",
        2 => "I realize you must be very busy, but I wanted to reach out one more time as I believe this opportunity could be mutually beneficial.",
        _ => "I wanted to make one final attempt to connect, as I believe there could be significant value in exploring this opportunity together.",
    }
}

pub fn connection_reason(match_score: f64) -> String {
    format!(
        "Based on my understanding of both your businesses, I believe there could be valuable synergies worth exploring. The match score for this connection is {:.0}%.",
        match_score * 100.0
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderInfo {
    pub name: String,
    pub title: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyInfo {
    pub name: String,
    pub description: String,
}

fn vars<const N: usize>(pairs: [(&str, String); N]) -> Variables {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub fn initial_outreach(
    need: &BusinessNeed,
    target: &Company,
    sender: &SenderInfo,
    contact: Option<&Contact>,
) -> Result<RenderedEmail, TemplateError> {
    let contact_name = contact
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "there".to_string());
    render(
        TemplateName::InitialOutreach,
        &vars([
            ("contact_name", contact_name),
            ("sender_name", sender.name.clone()),
            ("sender_title", sender.title.clone()),
            ("sender_contact", sender.email.clone()),
            ("from_company", need.company_name.clone()),
            ("to_company", target.name.clone()),
            (
                "introduction_reason",
                introduction_reason(&need.need_type, need.role()),
            ),
            (
                "value_proposition",
                value_proposition(need.role(), &need.target_sectors, target.sector()),
            ),
        ]),
    )
}

pub fn follow_up(
    connection: &Connection,
    ordinal: u32,
    contact_name: Option<&str>,
    sender_name: &str,
) -> Result<RenderedEmail, TemplateError> {
    render(
        TemplateName::follow_up(ordinal),
        &vars([
            ("contact_name", contact_name.unwrap_or("there").to_string()),
            ("sender_name", sender_name.to_string()),
            ("from_company", connection.from_entity.clone()),
            ("to_company", connection.to_entity.clone()),
            ("follow_up_reason", follow_up_reason(ordinal).to_string()),
        ]),
    )
}

pub fn introduction(
    connection: &Connection,
    party1: &PartyInfo,
    party2: &PartyInfo,
    introducer_name: &str,
) -> Result<RenderedEmail, TemplateError> {
    render(
        TemplateName::IntroductionEmail,
        &vars([
            ("party1_name", party1.name.clone()),
            ("party2_name", party2.name.clone()),
            ("party1_description", party1.description.clone()),
            ("party2_description", party2.description.clone()),
            ("connection_reason", connection_reason(connection.match_score)),
            ("introducer_name", introducer_name.to_string()),
        ]),
    )
}
