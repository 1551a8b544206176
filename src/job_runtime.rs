//! The job-runtime metadata collaborator. Only the trait boundary lives in
//! this crate — a concrete clock/environment source is an external concern.

/// Supplies the default job name when the caller hasn't set one explicitly.
pub trait JobRuntime: std::fmt::Debug {
    fn default_job_name(&self) -> String;
}

#[derive(Debug, Default)]
pub struct DefaultJobRuntime;

impl JobRuntime for DefaultJobRuntime {
    fn default_job_name(&self) -> String {
        "app".to_string()
    }
}
