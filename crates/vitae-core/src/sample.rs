//! The fixed payload returned when no backend is reachable.
//!
//! Everything except the file name, identifier, and timestamp is constant, so
//! the offline path is deterministic for a given clock.

use chrono::{DateTime, Utc};

use crate::resume::{AnalysisResult, Certification, Education, Project, WorkExperience};

fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| (*s).to_string()).collect()
}

/// Build the simulated analysis of `file_name`, stamped with `id` and `at`.
pub fn simulated_result(file_name: &str, id: i64, at: DateTime<Utc>) -> AnalysisResult {
  AnalysisResult {
    id:                  Some(id),
    file_name:           file_name.to_string(),
    uploaded_at:         Some(at),
    name:                Some("John Doe".into()),
    email:               Some("john.doe@email.com".into()),
    phone:               Some("+1 (555) 123-4567".into()),
    linkedin_url:        Some("https://linkedin.com/in/johndoe".into()),
    portfolio_url:       Some("https://johndoe.dev".into()),
    summary:             Some(
      "Experienced full-stack developer with 5+ years in React and Node.js".into(),
    ),
    work_experience:     vec![WorkExperience {
      role:        "Senior Full Stack Developer".into(),
      company:     "Tech Corp".into(),
      duration:    "2022 - Present".into(),
      description: strings(&[
        "Led development of React-based web applications",
        "Implemented REST APIs using Node.js and Express",
        "Managed PostgreSQL databases and optimized queries",
      ]),
    }],
    education:           vec![Education {
      degree:          "Bachelor of Science in Computer Science".into(),
      institution:     "University of Technology".into(),
      graduation_year: "2019".into(),
    }],
    technical_skills:    strings(&["React", "Node.js", "TypeScript", "PostgreSQL", "AWS"]),
    soft_skills:         strings(&[
      "Leadership",
      "Communication",
      "Problem Solving",
      "Team Collaboration",
    ]),
    projects:            vec![Project {
      name:         "E-commerce Platform".into(),
      description:  "Built a full-stack e-commerce solution".into(),
      technologies: strings(&["React", "Node.js", "MongoDB"]),
    }],
    certifications:      vec![Certification {
      name:   "AWS Certified Developer".into(),
      issuer: "Amazon Web Services".into(),
      date:   Some("2023".into()),
    }],
    resume_rating:       Some(8.0),
    improvement_areas:   Some(
      "Consider adding more quantifiable achievements and metrics to demonstrate \
       impact. Include more recent technologies like Next.js or cloud platforms."
        .into(),
    ),
    upskill_suggestions: strings(&["Next.js", "Docker", "Kubernetes", "GraphQL", "React Native"]),
  }
}
