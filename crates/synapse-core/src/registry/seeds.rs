//! Built-in cluster and agent seed data.
//!
//! These values are part of the external interface: tests and reproducible
//! allocations depend on them bit-for-bit. Confidence seeds set the initial
//! ranking inside each cluster; average execution times are in seconds.

use super::{Agent, Cluster};
use crate::types::ComplexityLevel;
use chrono::Utc;

use ComplexityLevel::{Complex, Medium, Simple};

pub fn builtin_clusters() -> Vec<Cluster> {
    [
        ("research", "Research & Discovery", "Investigation, search, and source comparison"),
        ("coding", "Coding & Implementation", "Code generation, refactoring, and debugging"),
        ("devops", "DevOps & Infrastructure", "Deployment, CI, and infrastructure operations"),
        ("uiux", "UI & UX Design", "Interface design and prototyping"),
        ("analysis", "Data & Analysis", "Data processing, profiling, and reporting"),
        ("evaluation", "Review & Evaluation", "Quality review and verification"),
    ]
    .into_iter()
    .map(|(id, name, description)| Cluster {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        members: Vec::new(),
    })
    .collect()
}

pub fn builtin_agents() -> Vec<Agent> {
    let created_at = Utc::now();
    let agent = |id: &str,
                 role: &str,
                 cluster: &str,
                 skills: &[&str],
                 levels: &[ComplexityLevel],
                 confidence: f64,
                 avg_secs: f64| Agent {
        id: id.to_string(),
        role: role.to_string(),
        cluster: cluster.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        supported_levels: levels.to_vec(),
        confidence_score: confidence,
        avg_execution_time: avg_secs,
        total_executions: 0,
        failure_rate: 0.0,
        created_at,
    };

    vec![
        agent(
            "research_agent_v1",
            "researcher",
            "research",
            &["search", "summarize", "compare"],
            &[Simple, Medium, Complex],
            0.80,
            2.0,
        ),
        agent(
            "web_scout_v1",
            "web scout",
            "research",
            &["search", "crawl", "extract"],
            &[Simple, Medium],
            0.70,
            1.5,
        ),
        agent(
            "code_agent_v2",
            "senior implementer",
            "coding",
            &["codegen", "refactor", "debug", "api"],
            &[Simple, Medium, Complex],
            0.90,
            3.0,
        ),
        agent(
            "code_agent_v1",
            "implementer",
            "coding",
            &["codegen", "test"],
            &[Simple, Medium],
            0.75,
            3.5,
        ),
        agent(
            "refactor_agent_v1",
            "refactoring specialist",
            "coding",
            &["refactor", "cleanup"],
            &[Medium, Complex],
            0.72,
            4.0,
        ),
        agent(
            "devops_agent_v1",
            "devops engineer",
            "devops",
            &["deploy", "ci", "docker"],
            &[Simple, Medium, Complex],
            0.78,
            5.0,
        ),
        agent(
            "infra_agent_v1",
            "infrastructure engineer",
            "devops",
            &["provision", "monitor", "scale"],
            &[Medium, Complex],
            0.74,
            6.0,
        ),
        agent(
            "design_agent_v1",
            "product designer",
            "uiux",
            &["wireframe", "layout", "prototype"],
            &[Simple, Medium, Complex],
            0.76,
            4.5,
        ),
        agent(
            "analysis_agent_v1",
            "data analyst",
            "analysis",
            &["profile", "aggregate", "visualize"],
            &[Simple, Medium, Complex],
            0.77,
            3.0,
        ),
        agent(
            "data_agent_v1",
            "data engineer",
            "analysis",
            &["etl", "schema", "query"],
            &[Medium, Complex],
            0.73,
            5.5,
        ),
        agent(
            "review_agent_v1",
            "reviewer",
            "evaluation",
            &["critique", "score", "verify"],
            &[Simple, Medium, Complex],
            0.79,
            2.5,
        ),
    ]
}
