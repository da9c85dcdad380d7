//! Best-effort resume text parser.
//!
//! Contact fields come from fixed regexes; sections are located by a small
//! two-state scope tracker (inside/outside) transitioned by header keyword
//! lines. Arbitrary resume formatting is not a regular language, so false
//! positives and negatives are expected and accepted: a regex that finds
//! nothing leaves the field empty, and every consumer treats an empty
//! field as "no data", never as a fault.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

use askfolio_core::error::{AskfolioError, Result};

/// Header candidate lines longer than this are treated as body text.
const MAX_HEADER_LEN: usize = 50;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})").unwrap());
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\+?[\d\s\-()]{10,})").unwrap());
static LINKEDIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(linkedin\.com/in/\S+)").unwrap());
static GITHUB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(github\.com/\S+)").unwrap());
static DEGREE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(bachelor|master|phd|doctorate|associate|diploma|certificate)(?:\s+(?:in|of))?\s*([^,\n]*)")
        .unwrap()
});
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").unwrap());
static INSTITUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)((?:university|college|institute|school)\s+[^,\n]+)").unwrap());
static DATE_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{4})\s*[-–—]\s*(\d{4}|present|current)").unwrap());
static COMPANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\bat|@)\s+([^,\n]+)").unwrap());

const SECTION_HEADERS: &[&str] = &[
    "experience", "education", "skills", "projects", "certifications", "achievements",
    "summary", "objective",
];
const EDUCATION_HEADERS: &[&str] = &[
    "education", "academic", "university", "college", "school", "degree", "bachelor",
    "master", "phd", "diploma",
];
const DEGREE_KEYWORDS: &[&str] =
    &["bachelor", "master", "phd", "doctorate", "associate", "diploma", "certificate"];
const EXPERIENCE_HEADERS: &[&str] = &["experience", "employment", "work", "career", "professional"];
const JOB_TITLE_KEYWORDS: &[&str] = &[
    "developer", "engineer", "manager", "analyst", "consultant", "specialist", "lead",
    "senior", "junior",
];
const SKILLS_HEADERS: &[&str] =
    &["skills", "technologies", "technical", "programming", "languages", "tools"];
const COMMON_SKILLS: &[&str] = &[
    "javascript", "python", "java", "react", "node", "angular", "vue", "html", "css",
    "sql", "mongodb", "postgresql", "mysql", "aws", "azure", "docker", "kubernetes",
    "git", "linux", "windows", "mac", "photoshop", "figma", "sketch",
];
const PROJECT_HEADERS: &[&str] = &["projects", "portfolio", "built", "developed", "created"];
const CERT_KEYWORDS: &[&str] = &["certification", "certificate", "certified", "license"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
}

impl PersonalInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.email.is_empty()
            && self.phone.is_empty()
            && self.linkedin.is_empty()
            && self.github.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub field: String,
    pub institution: String,
    pub year: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub start_year: String,
    pub end_year: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: String,
}

/// Structured record extracted from an uploaded resume. Rebuilt wholesale
/// on every re-upload; persistence belongs to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub personal: PersonalInfo,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
    pub certifications: Vec<String>,
    pub raw_text: String,
}

impl ResumeProfile {
    /// Load and parse a resume file. Text extraction from PDF/DOCX happens
    /// upstream in the uploader; this side only accepts plain text.
    pub fn load(path: &Path) -> Result<Self> {
        let supported = matches!(
            path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref(),
            Some("txt" | "md" | "markdown" | "text")
        );
        if !supported {
            return Err(AskfolioError::Parse(format!(
                "unsupported resume format: {} (expected .txt or .md)",
                path.display()
            )));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&raw))
    }

    /// Parse raw resume text. Never fails; missing data leaves fields empty.
    pub fn from_text(raw: &str) -> Self {
        let lines: Vec<&str> =
            raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

        let mut profile = Self { raw_text: raw.to_string(), ..Default::default() };
        profile.personal = extract_personal(&lines);
        profile.education = extract_education(&lines);
        profile.experience = extract_experience(&lines);
        profile.skills = extract_skills(&lines);
        profile.projects = extract_projects(&lines);
        profile.certifications = extract_certifications(&lines);

        tracing::debug!(
            education = profile.education.len(),
            experience = profile.experience.len(),
            skills = profile.skills.len(),
            projects = profile.projects.len(),
            "resume parsed"
        );
        profile
    }

    /// Sentences of the raw text containing `query` (case-insensitive),
    /// up to three, for the general-search intent.
    pub fn search_raw(&self, query: &str) -> Option<String> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let hits: Vec<&str> = self
            .raw_text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.to_lowercase().contains(&needle))
            .take(3)
            .collect();
        if hits.is_empty() { None } else { Some(hits.join(". ")) }
    }
}

/// Two-state section scope tracker: a header keyword line (bounded by
/// `MAX_HEADER_LEN`) enters the section, the next section header leaves it.
struct SectionTracker {
    headers: &'static [&'static str],
    inside: bool,
}

impl SectionTracker {
    fn new(headers: &'static [&'static str]) -> Self {
        Self { headers, inside: false }
    }

    /// Advance on one lowercased line. Returns true when the line was a
    /// boundary (header) and carries no content of its own.
    fn advance(&mut self, line: &str) -> bool {
        if contains_any(line, self.headers) && line.len() < MAX_HEADER_LEN {
            self.inside = true;
            return true;
        }
        if self.inside && is_section_header(line) {
            self.inside = false;
            return true;
        }
        false
    }
}

fn is_section_header(line: &str) -> bool {
    contains_any(line, SECTION_HEADERS) && line.len() < MAX_HEADER_LEN
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn extract_personal(lines: &[&str]) -> PersonalInfo {
    let mut personal = PersonalInfo::default();
    for line in lines {
        if let Some(m) = EMAIL_RE.captures(line) {
            personal.email = m[1].to_string();
        }
        if personal.phone.is_empty() {
            if let Some(m) = PHONE_RE.captures(line) {
                personal.phone = m[1].trim().to_string();
            }
        }
        if let Some(m) = LINKEDIN_RE.captures(line) {
            personal.linkedin = m[1].to_string();
        }
        if let Some(m) = GITHUB_RE.captures(line) {
            personal.github = m[1].to_string();
        }
    }
    // The name is usually the first non-empty line.
    if let Some(first) = lines.first() {
        personal.name = first.to_string();
    }
    personal
}

fn extract_education(lines: &[&str]) -> Vec<Education> {
    let mut tracker = SectionTracker::new(EDUCATION_HEADERS);
    let mut out = Vec::new();
    for line in lines {
        let lower = line.to_lowercase();
        if tracker.advance(&lower) {
            continue;
        }
        if tracker.inside || contains_any(&lower, DEGREE_KEYWORDS) {
            if let Some(entry) = parse_education_entry(line) {
                out.push(entry);
            }
        }
    }
    out
}

fn parse_education_entry(line: &str) -> Option<Education> {
    let degree = DEGREE_RE.captures(line);
    let institution = INSTITUTION_RE.captures(line);
    let year = YEAR_RE.find_iter(line).last();
    if degree.is_none() && institution.is_none() && year.is_none() {
        return None;
    }
    Some(Education {
        degree: degree.as_ref().map(|m| m[0].trim().to_string()).unwrap_or_default(),
        field: degree
            .as_ref()
            .and_then(|m| m.get(2))
            .map(|f| f.as_str().trim().to_string())
            .unwrap_or_default(),
        institution: institution.map(|m| m[1].trim().to_string()).unwrap_or_default(),
        year: year.map(|m| m.as_str().to_string()).unwrap_or_default(),
    })
}

fn extract_experience(lines: &[&str]) -> Vec<Experience> {
    let mut tracker = SectionTracker::new(EXPERIENCE_HEADERS);
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if tracker.advance(&lower) {
            continue;
        }
        if tracker.inside || contains_any(&lower, JOB_TITLE_KEYWORDS) {
            let end = (i + 5).min(lines.len());
            if let Some(entry) = parse_experience_entry(line, &lines[i..end]) {
                out.push(entry);
            }
        }
    }
    out
}

fn parse_experience_entry(line: &str, context: &[&str]) -> Option<Experience> {
    let lower = line.to_lowercase();
    let years: Vec<&str> = YEAR_RE.find_iter(line).map(|m| m.as_str()).collect();
    let range = DATE_RANGE_RE.captures(line);
    let company = COMPANY_RE.captures(line);
    let has_title = contains_any(&lower, JOB_TITLE_KEYWORDS);

    if !has_title && years.is_empty() && company.is_none() {
        return None;
    }

    let (start_year, end_year) = match &range {
        Some(m) => (m[1].to_string(), m[2].to_string()),
        None => (
            years.first().copied().unwrap_or_default().to_string(),
            years.get(1).copied().unwrap_or_default().to_string(),
        ),
    };

    Some(Experience {
        title: line.trim().to_string(),
        company: company.map(|m| m[1].trim().to_string()).unwrap_or_default(),
        start_year,
        end_year,
        description: context.get(1..).unwrap_or_default().join(" ").trim().to_string(),
    })
}

fn extract_skills(lines: &[&str]) -> Vec<String> {
    let mut tracker = SectionTracker::new(SKILLS_HEADERS);
    let mut skills: Vec<String> = Vec::new();
    for line in lines {
        let lower = line.to_lowercase();
        if tracker.advance(&lower) {
            continue;
        }
        for skill in COMMON_SKILLS {
            if lower.contains(skill) {
                skills.push((*skill).to_string());
            }
        }
        if tracker.inside && !line.is_empty() {
            skills.push(line.to_string());
        }
    }
    dedup_preserving_order(skills)
}

fn extract_projects(lines: &[&str]) -> Vec<Project> {
    let mut tracker = SectionTracker::new(PROJECT_HEADERS);
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if tracker.advance(&lower) {
            continue;
        }
        if tracker.inside {
            let end = (i + 3).min(lines.len());
            out.push(Project {
                name: line.to_string(),
                description: lines.get(i + 1..end).unwrap_or_default().join(" "),
            });
        }
    }
    out
}

fn extract_certifications(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .filter(|l| contains_any(&l.to_lowercase(), CERT_KEYWORDS))
        .map(|l| l.to_string())
        .collect()
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|s| seen.insert(s.clone())).collect()
}
