//! Question intent classification.
//!
//! An ordered list of (predicate, intent) checks evaluated first-match-wins.
//! The ordering is load-bearing because the keyword sets overlap: every
//! current-job phrasing also contains a generic work keyword ("job",
//! "position", "company"), so the current-job probe runs before the generic
//! experience check. Current-job keywords are short enough to collide as
//! substrings ("now" inside "know"), so that predicate alone matches whole
//! words; the remaining predicates keep plain substring membership.

/// Classified category of a visitor question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionIntent {
    Education,
    CurrentJob,
    Experience,
    Skills,
    Projects,
    PersonalInfo,
    JobDescriptionAnalysis,
    GeneralSearch,
}

/// Questions longer than this are treated as a pasted job posting.
pub const JOB_DESCRIPTION_MIN_CHARS: usize = 200;

const EDUCATION_KEYWORDS: &[&str] = &[
    "education", "degree", "university", "college", "school", "study", "studied",
    "bachelor", "master", "phd", "graduation", "graduated", "academic", "qualification",
];

const WORK_KEYWORDS: &[&str] = &[
    "work", "job", "experience", "employment", "career", "position", "role",
    "worked", "employed", "company", "companies", "employer", "professional",
];

const SKILLS_KEYWORDS: &[&str] = &[
    "skills", "skill", "technology", "technologies", "programming", "languages",
    "tools", "software", "technical", "expertise", "proficient", "know",
];

const PROJECT_KEYWORDS: &[&str] = &[
    "project", "projects", "built", "build", "developed", "created", "made",
    "portfolio", "application", "app", "website", "system",
];

const CURRENT_JOB_WORDS: &[&str] = &["current", "currently", "now", "present", "today"];
const CURRENT_JOB_PHRASES: &[&str] =
    &["working at", "current job", "current position", "current role", "current company"];

const PERSONAL_KEYWORDS: &[&str] = &[
    "name", "email", "phone", "contact", "linkedin", "github", "profile",
    "reach", "connect", "who are you", "about you",
];

fn contains_any(question: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| question.contains(k))
}

fn contains_word(question: &str, words: &[&str]) -> bool {
    question
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}

fn is_education(q: &str) -> bool {
    contains_any(q, EDUCATION_KEYWORDS)
}

fn is_current_job(q: &str) -> bool {
    contains_any(q, CURRENT_JOB_PHRASES) || contains_word(q, CURRENT_JOB_WORDS)
}

fn is_experience(q: &str) -> bool {
    contains_any(q, WORK_KEYWORDS)
}

fn is_skills(q: &str) -> bool {
    contains_any(q, SKILLS_KEYWORDS)
}

fn is_projects(q: &str) -> bool {
    contains_any(q, PROJECT_KEYWORDS)
}

fn is_personal(q: &str) -> bool {
    contains_any(q, PERSONAL_KEYWORDS)
}

/// Ordered intent checks, first match wins.
const CHECKS: &[(fn(&str) -> bool, QuestionIntent)] = &[
    (is_education, QuestionIntent::Education),
    (is_current_job, QuestionIntent::CurrentJob),
    (is_experience, QuestionIntent::Experience),
    (is_skills, QuestionIntent::Skills),
    (is_projects, QuestionIntent::Projects),
    (is_personal, QuestionIntent::PersonalInfo),
];

/// Classify a question. Pure keyword membership over the lowercased text;
/// long unmatched input is assumed to be a pasted job description.
pub fn classify(question: &str) -> QuestionIntent {
    let q = question.to_lowercase();
    for (predicate, intent) in CHECKS {
        if predicate(&q) {
            return *intent;
        }
    }
    if question.len() > JOB_DESCRIPTION_MIN_CHARS {
        QuestionIntent::JobDescriptionAnalysis
    } else {
        QuestionIntent::GeneralSearch
    }
}
