//! Static portfolio profile served on the landing route.
//!
//! Page rendering is a frontend concern; the service only exposes the
//! profile data the portfolio page is built from.

use serde_json::{json, Value};

pub fn profile() -> Value {
    json!({
        "name": "Alex Morgan",
        "title": "AI-Enabled Full-Stack Developer & Data Systems Analyst",
        "contact": {
            "email": "alex.morgan@example.com",
        },
        "experience": [
            {
                "company": "Advance AI Lab",
                "role": "Software Developer",
                "period": "Sep 2023 - Present",
                "highlights": [
                    "Built backend services with async support for real-time translation at scale.",
                    "Integrated LLM APIs with caching and fallback logic for resilience.",
                    "Developed RESTful APIs for translation, multilingual chat and batch processing.",
                ]
            },
            {
                "company": "IO Solutions",
                "role": "Software Developer",
                "period": "Aug 2022 - Oct 2023",
                "highlights": [
                    "Designed and deployed a scalable REST API backend for a job-matching platform.",
                    "Automated resume parsing and keyword extraction into PostgreSQL.",
                    "Integrated background task queues, improving response times by 60%.",
                ]
            }
        ],
        "education": [
            {
                "degree": "MEng, Electrical and Computer Engineering",
                "school": "Concordia University, Montreal",
                "period": "2021 - 2022"
            }
        ],
        "skills": [
            "Python", "Rust", "JavaScript", "SQL", "Docker", "AWS",
            "Redis", "PostgreSQL", "CI/CD", "LLM integrations"
        ]
    })
}
