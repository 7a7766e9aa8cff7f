use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NewsroomError;

// ---------------------------------------------------------------------------
// Job descriptor: the exact input the generation pipeline consumes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobMode {
    /// Raw text supplied by an operator.
    Manual,
    /// A feed URL plus an optional keyword filter.
    SpecificRss,
    /// Event Registry, either category browse or topic search.
    NewsApiAi,
}

impl JobMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobMode::Manual => "MANUAL",
            JobMode::SpecificRss => "SPECIFIC_RSS",
            JobMode::NewsApiAi => "NEWS_API_AI",
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NewsMode {
    /// Category-browse discovery.
    Automatic,
    /// Topic-keyword search.
    Tailored,
}

/// Reading level requested from the writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Complexity {
    Easy,
    #[default]
    General,
    Technical,
}

/// Resolved generation parameters. Descriptors built by the planner fill every
/// field the selected mode needs; operator-submitted ones may leave tone and
/// structure fields empty and get the writer's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    // Source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rss_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_mode: Option<NewsMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_category: Option<String>,

    // Identity and tone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_sentiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_direction: Option<String>,

    // Structure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_sidebar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_social: Option<bool>,

    /// Soft hint drawn from the strategy's image weights. The visuals chain
    /// may reorder its tiers around it but is free to end up elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_image_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub mode: JobMode,
    pub config: JobConfig,
}

// ---------------------------------------------------------------------------
// Queue jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = NewsroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "PROCESSING" => Ok(JobStatus::Processing),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(NewsroomError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueJob {
    pub id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: JobStatus,
    pub job_params: JobDescriptor,
    pub retry_count: u32,
    pub log_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A job ticket before the store assigns it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub scheduled_at: DateTime<Utc>,
    pub job_params: JobDescriptor,
}

/// Admin edit of a pending job.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobPatch {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub job_params: Option<JobDescriptor>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        self.scheduled_at.is_none() && self.job_params.is_none()
    }
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    Success,
    Failure,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failure => "FAILURE",
        }
    }
}

impl FromStr for ExecutionStatus {
    type Err = NewsroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(ExecutionStatus::Success),
            "FAILURE" => Ok(ExecutionStatus::Failure),
            other => Err(NewsroomError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultSummary {
    Published { title: String, entity_id: Uuid },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: Uuid,
    pub queue_job_id: Uuid,
    pub status: ExecutionStatus,
    pub result_summary: ResultSummary,
    pub executed_at: DateTime<Utc>,
}

/// One execution attempt's outcome, ready to append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub queue_job_id: Uuid,
    pub status: ExecutionStatus,
    pub result_summary: ResultSummary,
    pub executed_at: DateTime<Utc>,
}

impl NewLogEntry {
    pub fn success(job_id: Uuid, title: &str, entity_id: Uuid, at: DateTime<Utc>) -> Self {
        Self {
            queue_job_id: job_id,
            status: ExecutionStatus::Success,
            result_summary: ResultSummary::Published {
                title: title.to_string(),
                entity_id,
            },
            executed_at: at,
        }
    }

    pub fn failure(job_id: Uuid, error: &str, at: DateTime<Utc>) -> Self {
        Self {
            queue_job_id: job_id,
            status: ExecutionStatus::Failure,
            result_summary: ResultSummary::Error {
                error: error.to_string(),
            },
            executed_at: at,
        }
    }
}
