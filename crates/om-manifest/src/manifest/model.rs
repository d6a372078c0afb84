//! Manifest, instance group and job types
//!
//! Staged manifests have gone through several schema generations. Older ones
//! list jobs at the top level with generated partition suffixes
//! (`mysql-partition-0a1b2c`); newer ones use instance groups that own their
//! jobs. [`Manifest::job_named`] tolerates both.

use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::error::{ManifestError, Result};
use super::properties::Properties;

/// Anything that behaves like a job: a name and a property tree
pub trait OmJob {
    fn name(&self) -> &str;
    fn properties(&self) -> &Properties;
}

/// A named job with its properties
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Job {
    name: String,
    #[serde(default)]
    properties: Properties,
}

impl Job {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl OmJob for Job {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// An instance group: properties, its own jobs, and an instance count
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InstanceGroup {
    name: String,
    #[serde(default)]
    properties: Properties,
    #[serde(default, deserialize_with = "null_as_default")]
    jobs: Vec<Job>,
    /// Missing in the document reads as zero
    #[serde(default, deserialize_with = "null_as_default")]
    instances: u32,
}

impl InstanceGroup {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_jobs(mut self, jobs: Vec<Job>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_instances(mut self, instances: u32) -> Self {
        self.instances = instances;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn instances(&self) -> u32 {
        self.instances
    }

    /// Find a job by its exact name
    ///
    /// Unlike [`Manifest::job_named`] there is no prefix matching: jobs inside
    /// an instance group are addressed by their full generated name.
    pub fn find_job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name == name)
    }

    /// Find a job by exact name together with its position in [`Self::jobs`]
    ///
    /// When nothing matches the job is `None` and the index is `0`; check the
    /// job, not the index.
    pub fn find_job_with_index(&self, name: &str) -> (Option<&Job>, usize) {
        match self.jobs.iter().position(|job| job.name == name) {
            Some(index) => (Some(&self.jobs[index]), index),
            None => (None, 0),
        }
    }

    pub fn must_find_job(&self, name: &str) -> Result<&Job> {
        self.find_job(name).ok_or_else(|| ManifestError::JobNotFound {
            name: name.to_string(),
        })
    }
}

impl OmJob for InstanceGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// Result of [`Manifest::job_named`]: a top-level job or an instance group
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobRef<'a> {
    Job(&'a Job),
    InstanceGroup(&'a InstanceGroup),
}

impl<'a> JobRef<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            JobRef::Job(job) => &job.name,
            JobRef::InstanceGroup(group) => &group.name,
        }
    }

    pub fn properties(&self) -> &'a Properties {
        match self {
            JobRef::Job(job) => &job.properties,
            JobRef::InstanceGroup(group) => &group.properties,
        }
    }

    pub fn as_job(&self) -> Option<&'a Job> {
        match self {
            JobRef::Job(job) => Some(job),
            JobRef::InstanceGroup(_) => None,
        }
    }

    pub fn as_instance_group(&self) -> Option<&'a InstanceGroup> {
        match self {
            JobRef::Job(_) => None,
            JobRef::InstanceGroup(group) => Some(group),
        }
    }
}

impl OmJob for JobRef<'_> {
    fn name(&self) -> &str {
        JobRef::name(self)
    }

    fn properties(&self) -> &Properties {
        JobRef::properties(self)
    }
}

/// A deployment manifest
///
/// Read-only once built. Construct it from a document with
/// [`Manifest::from_yaml`] and friends, or by hand with the `with_*` builders.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "null_as_default")]
    jobs: Vec<Job>,
    #[serde(default, deserialize_with = "null_as_default")]
    instance_groups: Vec<InstanceGroup>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(mut self, jobs: Vec<Job>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_instance_groups(mut self, instance_groups: Vec<InstanceGroup>) -> Self {
        self.instance_groups = instance_groups;
        self
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn instance_groups(&self) -> &[InstanceGroup] {
        &self.instance_groups
    }

    /// Resolve a logical job name against every manifest generation
    ///
    /// Rules are tried in order and the first match wins:
    ///
    /// 1. a top-level job whose name starts with `"<name>-partition"`
    /// 2. a top-level job whose name starts with `"<name>"`
    /// 3. an instance group named exactly `name`
    ///
    /// No match is a fatal [`ManifestError::JobNotFound`].
    pub fn job_named(&self, name: &str) -> Result<JobRef<'_>> {
        let partition_prefix = format!("{}-partition", name);
        if let Some(job) = self.jobs.iter().find(|j| j.name.starts_with(&partition_prefix)) {
            debug!("Job '{}' resolved to partitioned job '{}'", name, job.name);
            return Ok(JobRef::Job(job));
        }

        if let Some(job) = self.jobs.iter().find(|j| j.name.starts_with(name)) {
            debug!("Job '{}' resolved by prefix to job '{}'", name, job.name);
            return Ok(JobRef::Job(job));
        }

        if let Some(group) = self.instance_group_named(name) {
            debug!("Job '{}' resolved to instance group", name);
            return Ok(JobRef::InstanceGroup(group));
        }

        Err(ManifestError::JobNotFound {
            name: name.to_string(),
        })
    }

    /// Find an instance group by exact name
    pub fn instance_group_named(&self, name: &str) -> Option<&InstanceGroup> {
        self.instance_groups.iter().find(|group| group.name == name)
    }

    pub fn must_find_instance_group_named(&self, name: &str) -> Result<&InstanceGroup> {
        self.instance_group_named(name)
            .ok_or_else(|| ManifestError::InstanceGroupNotFound {
                name: name.to_string(),
            })
    }

    /// Like [`Self::instance_group_named`], but a group scaled to zero
    /// instances counts as absent
    pub fn instance_group_named_if_non_empty(&self, name: &str) -> Option<&InstanceGroup> {
        self.instance_group_named(name)
            .filter(|group| group.instances > 0)
    }

    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(|job| job.name.as_str())
    }

    pub fn instance_group_names(&self) -> impl Iterator<Item = &str> {
        self.instance_groups.iter().map(|group| group.name.as_str())
    }
}

/// Treat an explicit `~` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
