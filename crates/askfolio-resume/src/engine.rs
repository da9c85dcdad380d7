//! Rule-based answer rendering over a parsed resume profile.
//!
//! Every intent handler returns a templated answer and never fails: an
//! empty profile field produces a "couldn't find" message instead of an
//! error, so this engine is safe as the pipeline of last resort.

use chrono::Datelike;

use crate::intent::{QuestionIntent, classify};
use crate::parser::{Experience, ResumeProfile};

const PROGRAMMING_KEYWORDS: &[&str] =
    &["javascript", "python", "java", "react", "node", "angular", "vue", "html", "css"];
const DATABASE_KEYWORDS: &[&str] = &["sql", "mongodb", "postgresql", "mysql", "database"];
const CLOUD_KEYWORDS: &[&str] = &["aws", "azure", "cloud", "docker", "kubernetes"];

/// Flat skills list partitioned into display buckets. A skill matching
/// several buckets lands in the first matching one only.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SkillBuckets {
    pub programming: Vec<String>,
    pub databases: Vec<String>,
    pub cloud: Vec<String>,
    pub other: Vec<String>,
}

pub fn categorize_skills(skills: &[String]) -> SkillBuckets {
    let mut buckets = SkillBuckets::default();
    for skill in skills {
        let lower = skill.to_lowercase();
        if PROGRAMMING_KEYWORDS.iter().any(|k| lower.contains(k)) {
            buckets.programming.push(skill.clone());
        } else if DATABASE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            buckets.databases.push(skill.clone());
        } else if CLOUD_KEYWORDS.iter().any(|k| lower.contains(k)) {
            buckets.cloud.push(skill.clone());
        } else {
            buckets.other.push(skill.clone());
        }
    }
    buckets
}

/// Answers questions from the parsed resume without any external calls.
pub struct ResumeEngine {
    profile: ResumeProfile,
}

impl ResumeEngine {
    pub fn new(profile: ResumeProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ResumeProfile {
        &self.profile
    }

    /// Answer a question. Infallible by contract.
    pub fn answer(&self, question: &str) -> String {
        let intent = classify(question);
        tracing::debug!(?intent, "resume question classified");
        let lower = question.to_lowercase();
        match intent {
            QuestionIntent::Education => self.education_answer(&lower),
            QuestionIntent::CurrentJob => self.current_job_answer(),
            QuestionIntent::Experience => self.experience_answer(),
            QuestionIntent::Skills => self.skills_answer(),
            QuestionIntent::Projects => self.projects_answer(),
            QuestionIntent::PersonalInfo => self.personal_info_answer(),
            QuestionIntent::JobDescriptionAnalysis => self.job_fit_answer(&lower),
            QuestionIntent::GeneralSearch => self.general_search_answer(question),
        }
    }

    fn education_answer(&self, question: &str) -> String {
        let education = &self.profile.education;
        if education.is_empty() {
            return "I couldn't find specific education information in your resume. You might \
                    want to add more details about your educational background."
                .into();
        }

        let mut answer = String::from("Based on your resume, here's your educational background:\n\n");
        for (i, edu) in education.iter().enumerate() {
            answer.push_str(&format!("{}. ", i + 1));
            if !edu.degree.is_empty() {
                answer.push_str(&edu.degree);
            }
            if !edu.field.is_empty() {
                answer.push_str(&format!(" in {}", edu.field));
            }
            if !edu.institution.is_empty() {
                answer.push_str(&format!(" from {}", edu.institution));
            }
            if !edu.year.is_empty() {
                answer.push_str(&format!(" ({})", edu.year));
            }
            answer.push('\n');
        }

        if question.contains("where") || question.contains("which university") {
            let institutions: Vec<&str> = education
                .iter()
                .map(|e| e.institution.as_str())
                .filter(|i| !i.is_empty())
                .collect();
            if !institutions.is_empty() {
                answer.push_str(&format!("\nYou studied at: {}", institutions.join(", ")));
            }
        }
        if question.contains("when") || question.contains("year") {
            let years: Vec<&str> =
                education.iter().map(|e| e.year.as_str()).filter(|y| !y.is_empty()).collect();
            if !years.is_empty() {
                answer.push_str(&format!("\nGraduation years: {}", years.join(", ")));
            }
        }
        answer
    }

    fn experience_answer(&self) -> String {
        let experience = &self.profile.experience;
        if experience.is_empty() {
            return "I couldn't find specific work experience information in your resume. You \
                    might want to add more details about your professional background."
                .into();
        }

        let mut answer = String::from("Here's your work experience based on your resume:\n\n");
        for (i, exp) in experience.iter().enumerate() {
            answer.push_str(&format!("{}. {}", i + 1, exp.title));
            if !exp.company.is_empty() {
                answer.push_str(&format!(" at {}", exp.company));
            }
            if !exp.start_year.is_empty() || !exp.end_year.is_empty() {
                let start = if exp.start_year.is_empty() { "?" } else { &exp.start_year };
                let end = if exp.end_year.is_empty() { "Present" } else { &exp.end_year };
                answer.push_str(&format!(" ({start} - {end})"));
            }
            if !exp.description.trim().is_empty() {
                answer.push_str(&format!("\n   {}", truncate(&exp.description, 200)));
            }
            answer.push_str("\n\n");
        }
        answer.trim_end().to_string()
    }

    /// The entry considered current: end year mentions "present"/"current",
    /// is empty, or falls within one year of today; otherwise the entry
    /// with the latest start year.
    pub fn current_job(&self) -> Option<&Experience> {
        let this_year = chrono::Utc::now().year();
        let current = self.profile.experience.iter().find(|exp| {
            let end = exp.end_year.to_lowercase();
            end.contains("present")
                || end.contains("current")
                || end.is_empty()
                || end.trim().parse::<i32>().is_ok_and(|y| y >= this_year - 1)
        });
        current.or_else(|| {
            self.profile
                .experience
                .iter()
                .filter(|e| !e.start_year.is_empty())
                .max_by_key(|e| e.start_year.trim().parse::<i32>().unwrap_or(i32::MIN))
        })
    }

    fn current_job_answer(&self) -> String {
        let Some(job) = self.current_job() else {
            return "I couldn't find clear information about your current employment in your \
                    resume."
                .into();
        };

        let mut answer = format!("Currently, you are working as {}", job.title);
        if !job.company.is_empty() {
            answer.push_str(&format!(" at {}", job.company));
        }
        if !job.start_year.is_empty() {
            answer.push_str(&format!(" since {}", job.start_year));
        }
        if !job.description.trim().is_empty() {
            answer.push_str(&format!(".\n\nYour role involves: {}", job.description));
        }
        answer
    }

    fn skills_answer(&self) -> String {
        let skills = &self.profile.skills;
        if skills.is_empty() {
            return "I couldn't find a specific skills section in your resume. You might want \
                    to add more details about your technical skills and expertise."
                .into();
        }

        let buckets = categorize_skills(skills);
        let mut answer = String::from("Based on your resume, your skills include:\n\n");
        if !buckets.programming.is_empty() {
            answer.push_str(&format!(
                "**Programming & Development:** {}\n\n",
                buckets.programming.join(", ")
            ));
        }
        if !buckets.databases.is_empty() {
            answer.push_str(&format!("**Databases:** {}\n\n", buckets.databases.join(", ")));
        }
        if !buckets.cloud.is_empty() {
            answer.push_str(&format!("**Cloud & DevOps:** {}\n\n", buckets.cloud.join(", ")));
        }
        if !buckets.other.is_empty() {
            let shown: Vec<&str> =
                buckets.other.iter().take(10).map(String::as_str).collect();
            answer.push_str(&format!("**Other Skills:** {}", shown.join(", ")));
        }
        answer.trim_end().to_string()
    }

    fn projects_answer(&self) -> String {
        let projects = &self.profile.projects;
        if projects.is_empty() {
            return "I couldn't find specific project information in your resume. You might \
                    want to add more details about projects you've worked on."
                .into();
        }

        let mut answer = String::from("Based on your resume, here are your projects:\n\n");
        for (i, project) in projects.iter().enumerate() {
            answer.push_str(&format!("{}. **{}**", i + 1, project.name));
            if !project.description.trim().is_empty() {
                answer.push_str(&format!("\n   {}", project.description));
            }
            answer.push_str("\n\n");
        }
        answer.trim_end().to_string()
    }

    fn personal_info_answer(&self) -> String {
        let personal = &self.profile.personal;
        if personal.is_empty() {
            return "I couldn't extract specific contact information from your resume. Make \
                    sure your name, email, and other contact details are clearly visible."
                .into();
        }

        let mut answer = String::from("Here's your contact information from your resume:\n\n");
        if !personal.name.is_empty() {
            answer.push_str(&format!("**Name:** {}\n", personal.name));
        }
        if !personal.email.is_empty() {
            answer.push_str(&format!("**Email:** {}\n", personal.email));
        }
        if !personal.phone.is_empty() {
            answer.push_str(&format!("**Phone:** {}\n", personal.phone));
        }
        if !personal.linkedin.is_empty() {
            answer.push_str(&format!("**LinkedIn:** {}\n", personal.linkedin));
        }
        if !personal.github.is_empty() {
            answer.push_str(&format!("**GitHub:** {}\n", personal.github));
        }
        answer
    }

    /// Compare a pasted job posting against the profile: intersect skills,
    /// surface experience whose title/company/description tokens occur in
    /// the posting, and close with strong-candidate bullets.
    fn job_fit_answer(&self, posting: &str) -> String {
        let matching_skills: Vec<&str> = self
            .profile
            .skills
            .iter()
            .map(String::as_str)
            .filter(|skill| {
                let lower = skill.to_lowercase();
                posting.contains(&lower)
                    || lower.split_whitespace().any(|word| posting.contains(word))
            })
            .collect();

        let relevant_experience: Vec<&Experience> = self
            .profile
            .experience
            .iter()
            .filter(|exp| {
                posting.contains(&exp.title.to_lowercase())
                    || (!exp.company.is_empty() && posting.contains(&exp.company.to_lowercase()))
                    || exp
                        .description
                        .to_lowercase()
                        .split_whitespace()
                        .any(|word| posting.contains(word))
            })
            .collect();

        let mut analysis = String::from("## Job Fit Analysis\n\n**Your Matching Skills:**\n");
        if matching_skills.is_empty() {
            analysis.push_str("⚠️ No direct skill matches found, but you may have transferable skills.\n\n");
        } else {
            analysis.push_str(&format!("✅ {}\n\n", matching_skills.join(", ")));
        }

        analysis.push_str("**Relevant Experience:**\n");
        if relevant_experience.is_empty() {
            analysis.push_str("⚠️ No directly matching experience, but your background may still be relevant.\n");
        } else {
            for exp in &relevant_experience {
                analysis.push_str(&format!("✅ {}", exp.title));
                if !exp.company.is_empty() {
                    analysis.push_str(&format!(" at {}", exp.company));
                }
                analysis.push('\n');
            }
        }

        analysis.push_str("\n**Why You're a Strong Candidate:**\n");
        analysis.push_str(&format!(
            "• {} professional roles showing career progression\n",
            self.profile.experience.len()
        ));
        analysis.push_str(&format!(
            "• {} technical skills demonstrating versatility\n",
            self.profile.skills.len()
        ));
        if let Some(edu) = self.profile.education.first() {
            analysis.push_str(&format!(
                "• Strong educational foundation with {}\n",
                edu.degree
            ));
        }
        analysis
    }

    fn general_search_answer(&self, question: &str) -> String {
        if let Some(hits) = self.profile.search_raw(question) {
            return format!(
                "Based on your resume, here's what I found related to your question:\n\n{hits}"
            );
        }

        let mut summary = String::from(
            "I couldn't find specific information about that in your resume. Here's a summary \
             of what I know about you:\n\n",
        );
        if !self.profile.personal.name.is_empty() {
            summary.push_str(&format!("You are {}. ", self.profile.personal.name));
        }
        if let Some(job) = self.profile.experience.first() {
            summary.push_str(&format!("You work as {}", job.title));
            if !job.company.is_empty() {
                summary.push_str(&format!(" at {}", job.company));
            }
            summary.push_str(". ");
        }
        if let Some(edu) = self.profile.education.first() {
            summary.push_str(&format!("You have {}", edu.degree));
            if !edu.field.is_empty() {
                summary.push_str(&format!(" in {}", edu.field));
            }
            summary.push_str(". ");
        }
        summary.push_str(
            "\n\nCould you please rephrase your question or ask about something more specific \
             like your education, work experience, or skills?",
        );
        summary
    }

    /// Render the profile into a labelled context block for the generative
    /// backend, so resume mode can also drive the chat pipeline.
    pub fn format_context(&self) -> String {
        let mut context = String::new();
        let personal = &self.profile.personal;
        if !personal.is_empty() {
            context.push_str("\nPERSONAL INFORMATION:\n");
            if !personal.name.is_empty() {
                context.push_str(&format!("Name: {}\n", personal.name));
            }
            if !personal.email.is_empty() {
                context.push_str(&format!("Email: {}\n", personal.email));
            }
            if !personal.phone.is_empty() {
                context.push_str(&format!("Phone: {}\n", personal.phone));
            }
            if !personal.linkedin.is_empty() {
                context.push_str(&format!("LinkedIn: {}\n", personal.linkedin));
            }
            if !personal.github.is_empty() {
                context.push_str(&format!("GitHub: {}\n", personal.github));
            }
        }

        if !self.profile.education.is_empty() {
            context.push_str("\nEDUCATION:\n");
            for (i, edu) in self.profile.education.iter().enumerate() {
                context.push_str(&format!("{}. {}", i + 1, edu.degree));
                if !edu.field.is_empty() {
                    context.push_str(&format!(" in {}", edu.field));
                }
                if !edu.institution.is_empty() {
                    context.push_str(&format!(" from {}", edu.institution));
                }
                if !edu.year.is_empty() {
                    context.push_str(&format!(" ({})", edu.year));
                }
                context.push('\n');
            }
        }

        if !self.profile.experience.is_empty() {
            context.push_str("\nWORK EXPERIENCE:\n");
            for (i, exp) in self.profile.experience.iter().enumerate() {
                context.push_str(&format!("{}. {}", i + 1, exp.title));
                if !exp.company.is_empty() {
                    context.push_str(&format!(" at {}", exp.company));
                }
                if !exp.start_year.is_empty() || !exp.end_year.is_empty() {
                    let start = if exp.start_year.is_empty() { "?" } else { &exp.start_year };
                    let end = if exp.end_year.is_empty() { "Present" } else { &exp.end_year };
                    context.push_str(&format!(" ({start} - {end})"));
                }
                if !exp.description.trim().is_empty() {
                    context.push_str(&format!(
                        "\n   Description: {}",
                        truncate(&exp.description, 300)
                    ));
                }
                context.push('\n');
            }
        }

        if !self.profile.skills.is_empty() {
            let shown: Vec<&str> =
                self.profile.skills.iter().take(20).map(String::as_str).collect();
            context.push_str(&format!("\nSKILLS:\n{}\n", shown.join(", ")));
        }

        if !self.profile.projects.is_empty() {
            context.push_str("\nPROJECTS:\n");
            for (i, project) in self.profile.projects.iter().enumerate() {
                context.push_str(&format!("{}. {}", i + 1, project.name));
                if !project.description.is_empty() {
                    context.push_str(&format!(" - {}", truncate(&project.description, 200)));
                }
                context.push('\n');
            }
        }

        if !self.profile.certifications.is_empty() {
            context.push_str("\nCERTIFICATIONS:\n");
            for (i, cert) in self.profile.certifications.iter().enumerate() {
                context.push_str(&format!("{}. {}\n", i + 1, cert));
            }
        }

        if !self.profile.raw_text.is_empty() {
            context.push_str("\nADDITIONAL CONTEXT (excerpt):\n");
            context.push_str(&truncate(&self.profile.raw_text, 500));
            context.push('\n');
        }
        context
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Education, PersonalInfo};

    fn experience(title: &str, start: &str, end: &str) -> Experience {
        Experience {
            title: title.into(),
            company: String::new(),
            start_year: start.into(),
            end_year: end.into(),
            description: String::new(),
        }
    }

    fn profile_with_experience(entries: Vec<Experience>) -> ResumeProfile {
        ResumeProfile { experience: entries, ..Default::default() }
    }

    #[test]
    fn skills_categorize_into_expected_buckets() {
        let skills: Vec<String> =
            ["python", "postgresql", "aws", "figma"].iter().map(|s| s.to_string()).collect();
        let buckets = categorize_skills(&skills);
        assert_eq!(buckets.programming, vec!["python"]);
        assert_eq!(buckets.databases, vec!["postgresql"]);
        assert_eq!(buckets.cloud, vec!["aws"]);
        assert_eq!(buckets.other, vec!["figma"]);
    }

    #[test]
    fn multi_bucket_skill_lands_in_first_match_only() {
        // "node.js on aws" matches programming first; it must not repeat in cloud
        let skills = vec!["node.js on aws".to_string()];
        let buckets = categorize_skills(&skills);
        assert_eq!(buckets.programming.len(), 1);
        assert!(buckets.cloud.is_empty());
    }

    #[test]
    fn present_end_year_wins_current_job() {
        let engine = ResumeEngine::new(profile_with_experience(vec![
            experience("A", "2020", "2022"),
            experience("B", "2022", "present"),
        ]));
        assert_eq!(engine.current_job().unwrap().title, "B");
    }

    #[test]
    fn latest_start_year_is_fallback() {
        let engine = ResumeEngine::new(profile_with_experience(vec![
            experience("old", "2010", "2012"),
            experience("newer", "2015", "2017"),
        ]));
        assert_eq!(engine.current_job().unwrap().title, "newer");
    }

    #[test]
    fn no_experience_never_panics() {
        let engine = ResumeEngine::new(ResumeProfile::default());
        let answer = engine.answer("what is your current job?");
        assert!(answer.contains("couldn't find"));
    }

    #[test]
    fn empty_fields_yield_templated_messages() {
        let engine = ResumeEngine::new(ResumeProfile::default());
        assert!(engine.answer("tell me about your education").contains("couldn't find"));
        assert!(engine.answer("list your technical skills").contains("couldn't find"));
        assert!(engine.answer("what have you built?").contains("couldn't find"));
    }

    #[test]
    fn job_description_reports_matching_skills() {
        let profile = ResumeProfile {
            skills: vec!["python".into(), "terraform".into()],
            experience: vec![experience("Platform Engineer", "2020", "present")],
            ..Default::default()
        };
        let engine = ResumeEngine::new(profile);
        let posting = "we are looking for a platform engineer with strong python experience \
                       and infrastructure automation background";
        let answer = engine.job_fit_answer(posting);
        assert!(answer.contains("Job Fit Analysis"));
        assert!(answer.contains("python"));
        assert!(answer.contains("Platform Engineer"));
        assert!(!answer.contains("terraform"));
    }

    #[test]
    fn keyword_free_long_text_routes_to_job_fit() {
        let profile = ResumeProfile { skills: vec!["python".into()], ..Default::default() };
        let engine = ResumeEngine::new(profile);
        // no intent keyword anywhere, just length
        let posting = "python automation infrastructure reliability on-call rotations and \
                       incident response for a growing fintech platform in a distributed team "
            .repeat(2);
        assert!(posting.len() > crate::intent::JOB_DESCRIPTION_MIN_CHARS);
        let answer = engine.answer(&posting);
        assert!(answer.contains("Job Fit Analysis"));
    }

    #[test]
    fn general_search_falls_back_to_summary() {
        let profile = ResumeProfile {
            personal: PersonalInfo { name: "Jordan Reyes".into(), ..Default::default() },
            education: vec![Education {
                degree: "Bachelor of Computer Science".into(),
                ..Default::default()
            }],
            raw_text: "Jordan Reyes. Bachelor of Computer Science.".into(),
            ..Default::default()
        };
        let engine = ResumeEngine::new(profile);
        let answer = engine.answer("zzz unfindable");
        assert!(answer.contains("Jordan Reyes"));
        assert!(answer.contains("rephrase"));
    }

    #[test]
    fn general_search_quotes_raw_sentences() {
        let profile = ResumeProfile {
            raw_text: "Maintained a fleet of build servers. Other sentence.".into(),
            ..Default::default()
        };
        let engine = ResumeEngine::new(profile);
        let answer = engine.answer("fleet");
        assert!(answer.contains("fleet of build servers"));
    }

    #[test]
    fn format_context_includes_labelled_sections() {
        let profile = ResumeProfile {
            personal: PersonalInfo { name: "Jordan".into(), email: "j@example.com".into(), ..Default::default() },
            skills: vec!["python".into()],
            raw_text: "Jordan. Engineer.".into(),
            ..Default::default()
        };
        let context = ResumeEngine::new(profile).format_context();
        assert!(context.contains("PERSONAL INFORMATION:"));
        assert!(context.contains("SKILLS:"));
        assert!(context.contains("Name: Jordan"));
    }
}
