//! Sift Core Library
//!
//! Shared functionality for the Sift expense classification engine:
//! - Database access and migrations
//! - Versioned rule store with a seeded catalog
//! - Rule-weighted fixed/variable classifier with explainable confidence
//! - Classification service (suggestions, decisions, pending queue)
//! - Feedback learner for bounded rule weight adjustment
//! - Cancellable auto-tag batch jobs with persisted progress

pub mod autotag;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod learner;
pub mod models;
pub mod normalize;
pub mod seed;
pub mod service;

pub use autotag::{AutoTagger, CancellationFlag, JobRegistry};
pub use classify::{classify, ClassifySignals};
pub use config::{CategoryCaps, EngineConfig, LearningConfig};
pub use db::{Database, TransactionInsertResult};
pub use error::{Error, Result};
pub use learner::FeedbackLearner;
pub use models::{
    AutoTagJob, AutoTagOutcome, ClassificationResult, ConfidenceBand, Decision, ExpenseType,
    FeedbackEvent, ImproveOutcome, JobStatus, MatchedRule, NewFeedbackEvent, NewRule,
    NewTransaction, PatternKind, PendingClassification, PendingStats, Rule, RuleSnapshot,
    Transaction, TransactionSource,
};
pub use service::{validate_month, ClassificationService};
