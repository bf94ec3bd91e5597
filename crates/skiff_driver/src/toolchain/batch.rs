//! Merging single-file compile jobs into batch jobs.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::action::{Action, ActionKind};
use crate::compilation::Compilation;
use crate::error::{DriverError, DriverResult};
use crate::job::{Job, JobParts};
use crate::job_context::JobContext;
use crate::output::{CommandOutput, CompilerMode};

use super::ToolChain;

/// Appends the items of `from` not already in `into`, by identity.
fn union_into<T>(into: &mut Vec<Arc<T>>, from: &[Arc<T>]) {
    for item in from {
        if !into.iter().any(|seen| Arc::ptr_eq(seen, item)) {
            into.push(Arc::clone(item));
        }
    }
}

fn environment_set(job: &Job) -> BTreeSet<&(String, String)> {
    job.extra_environment().iter().collect()
}

impl ToolChain {
    /// Whether `job` may be folded into a batch: a compile job, in standard
    /// compile mode, with exactly one source-language input.
    pub fn job_is_batchable(&self, compilation: &Compilation, job: &Job) -> bool {
        matches!(job.source().kind(), ActionKind::Compile)
            && compilation.output_info().compiler_mode == CompilerMode::StandardCompile
            && job.source().find_single_swift_input().is_some()
    }

    /// Whether `a` and `b` may share one batch job.
    ///
    /// Both must be batchable and agree on executable, main output type,
    /// supplementary output types and environment. Inputs are the one thing
    /// allowed to differ.
    pub fn jobs_are_batch_combinable(&self, compilation: &Compilation, a: &Job, b: &Job) -> bool {
        self.job_is_batchable(compilation, a)
            && self.job_is_batchable(compilation, b)
            && a.executable() == b.executable()
            && a.output().primary_output_type() == b.output().primary_output_type()
            && a.output().supplementary_output_types() == b.output().supplementary_output_types()
            && environment_set(a) == environment_set(b)
    }

    /// Builds one job replacing all of `jobs`.
    ///
    /// Every pair of `jobs` must be batch-combinable. Only the first job is
    /// trusted for executable and environment, and the others are only
    /// checked to be compile jobs. An empty set is an internal error.
    pub fn construct_batch_job(&self, jobs: &[Arc<Job>], compilation: &Compilation) -> DriverResult<Job> {
        let Some(representative) = jobs.first() else {
            return Err(DriverError::internal("cannot build a batch job from no jobs"));
        };
        if let Some(job) = jobs
            .iter()
            .find(|job| !matches!(job.source().kind(), ActionKind::Compile))
        {
            return Err(DriverError::internal(format!(
                "cannot batch a {} job",
                job.source().kind().name()
            )));
        }

        let mut inputs: Vec<Arc<Job>> = Vec::new();
        let mut input_actions: Vec<Arc<Action>> = Vec::new();
        let mut output = CommandOutput::new(representative.output().primary_output_type());
        for job in jobs {
            union_into(&mut inputs, job.inputs());
            union_into(&mut input_actions, job.input_actions());
            output.add_outputs(job.output());
        }

        let batch_info = compilation
            .output_info()
            .with_mode(CompilerMode::BatchModeCompile);
        let source = Action::compile(representative.source().output_type(), input_actions.clone());
        debug!(
            jobs = jobs.len(),
            primaries = input_actions.len(),
            "forming batch job"
        );

        let mut invocation = {
            let context = JobContext::new(
                &source,
                compilation,
                &inputs,
                &input_actions,
                &output,
                &batch_info,
            );
            self.construct_invocation(&context)?
        };
        invocation.extra_environment = representative.extra_environment().to_vec();

        self.finish_job(
            compilation,
            JobParts {
                source,
                inputs,
                input_actions,
                output,
                executable: representative.executable().to_path_buf(),
                arguments: Vec::new(),
                extra_environment: Vec::new(),
                filelist_infos: Vec::new(),
                response_file: None,
                batched_jobs: jobs.to_vec(),
            },
            invocation,
        )
    }

    /// Replaces runs of combinable jobs with batch jobs of at most
    /// `size_limit` members.
    ///
    /// Jobs are grouped with the first earlier job they combine with; each
    /// group is emitted where its first member was. Groups are cut into
    /// consecutive chunks, and a chunk of one keeps its original job.
    pub fn form_batch_jobs(
        &self,
        compilation: &Compilation,
        jobs: Vec<Arc<Job>>,
        size_limit: usize,
    ) -> DriverResult<Vec<Arc<Job>>> {
        enum Slot {
            Single(Arc<Job>),
            Group(usize),
        }

        let size_limit = size_limit.max(1);
        let mut slots = Vec::new();
        let mut groups: Vec<Vec<Arc<Job>>> = Vec::new();
        for job in jobs {
            if !self.job_is_batchable(compilation, &job) {
                slots.push(Slot::Single(job));
                continue;
            }
            let existing = groups
                .iter()
                .position(|group| self.jobs_are_batch_combinable(compilation, &group[0], &job));
            match existing {
                Some(index) => groups[index].push(job),
                None => {
                    slots.push(Slot::Group(groups.len()));
                    groups.push(vec![job]);
                }
            }
        }

        let mut result = Vec::new();
        for slot in slots {
            match slot {
                Slot::Single(job) => result.push(job),
                Slot::Group(index) => {
                    for chunk in groups[index].chunks(size_limit) {
                        if let [only] = chunk {
                            result.push(Arc::clone(only));
                        } else {
                            result.push(Arc::new(self.construct_batch_job(chunk, compilation)?));
                        }
                    }
                }
            }
        }
        Ok(result)
    }
}
