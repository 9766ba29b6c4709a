//! Background job queue
//!
//! Generation and analysis are synchronous; the queue runs them on tokio's
//! blocking pool, at most `workers` at a time. Every submission gets its own
//! result channel. Dropping a [`JobTicket`] discards the result and nothing
//! else.

use std::path::PathBuf;
use std::sync::Arc;

use reliefkit_camtools::{generate_from_file, GenerationMode, MotionPlan, TargetSize};
use reliefkit_settings::Config;
use reliefkit_visualizer::{AnalysisReport, ProgramAnalyzer};
use tokio::sync::{oneshot, Semaphore};
use uuid::Uuid;

/// Unit of work
#[derive(Debug, Clone)]
pub enum Job {
    /// Image to program; written to `output` when given
    Generate {
        image: PathBuf,
        output: Option<PathBuf>,
        mode: GenerationMode,
        size: TargetSize,
    },
    /// Program statistics
    Analyze { program: PathBuf },
}

/// Result of a job
#[derive(Debug)]
pub enum JobOutcome {
    Generated {
        plan: MotionPlan,
        output: Option<PathBuf>,
    },
    Analyzed(AnalysisReport),
    Failed(String),
}

impl JobOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, JobOutcome::Failed(_))
    }
}

/// Handle for a submitted job
#[derive(Debug)]
pub struct JobTicket {
    pub id: Uuid,
    receiver: oneshot::Receiver<JobOutcome>,
}

impl JobTicket {
    /// Wait for the job to finish
    pub async fn wait(self) -> anyhow::Result<JobOutcome> {
        self.receiver
            .await
            .map_err(|_| anyhow::anyhow!("job {} ended without a result", self.id))
    }
}

/// Bounded pool of blocking workers
#[derive(Debug, Clone)]
pub struct JobQueue {
    config: Arc<Config>,
    permits: Arc<Semaphore>,
}

impl JobQueue {
    /// Queue running at most `workers` jobs at once (at least one)
    pub fn new(config: Config, workers: usize) -> Self {
        Self {
            config: Arc::new(config),
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Submit a job; must be called from within a tokio runtime
    pub fn submit(&self, job: Job) -> JobTicket {
        let id = Uuid::new_v4();
        let (sender, receiver) = oneshot::channel();
        let config = Arc::clone(&self.config);
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            tracing::debug!("Job {} started", id);

            let outcome = tokio::task::spawn_blocking(move || run_job(&config, job))
                .await
                .unwrap_or_else(|e| JobOutcome::Failed(format!("worker panicked: {}", e)));

            if let JobOutcome::Failed(reason) = &outcome {
                tracing::error!("Job {} failed: {}", id, reason);
            } else {
                tracing::debug!("Job {} finished", id);
            }
            // receiver may have been dropped; that discards the result
            let _ = sender.send(outcome);
        });

        JobTicket { id, receiver }
    }
}

/// Run one job synchronously
pub fn run_job(config: &Config, job: Job) -> JobOutcome {
    match job {
        Job::Generate {
            image,
            output,
            mode,
            size,
        } => match generate_from_file(&image, &config.generator, mode, size) {
            Ok(plan) => {
                if let Some(path) = &output {
                    if let Err(e) = plan.write_to_file(path) {
                        return JobOutcome::Failed(format!(
                            "failed to write {}: {}",
                            path.display(),
                            e
                        ));
                    }
                }
                JobOutcome::Generated { plan, output }
            }
            Err(e) => JobOutcome::Failed(e.to_string()),
        },
        Job::Analyze { program } => {
            match ProgramAnalyzer::new(config.analyzer.clone()).analyze_file(&program) {
                Ok(report) => JobOutcome::Analyzed(report),
                Err(e) => JobOutcome::Failed(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_job_missing_program() {
        let outcome = run_job(
            &Config::default(),
            Job::Analyze {
                program: PathBuf::from("/no/such/program.gcode"),
            },
        );
        assert!(outcome.is_failure());
    }

    #[tokio::test]
    async fn test_queue_runs_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.gcode");
        std::fs::write(&path, "G0 Z5\nG1 X10 F600\n").unwrap();

        let queue = JobQueue::new(Config::default(), 2);
        let ticket = queue.submit(Job::Analyze { program: path });
        match ticket.wait().await.unwrap() {
            JobOutcome::Analyzed(report) => assert_eq!(report.summary.cut_moves, 1),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropped_ticket_does_not_block_queue() {
        let queue = JobQueue::new(Config::default(), 1);
        drop(queue.submit(Job::Analyze {
            program: PathBuf::from("/no/such/a.gcode"),
        }));

        let ticket = queue.submit(Job::Analyze {
            program: PathBuf::from("/no/such/b.gcode"),
        });
        assert!(ticket.wait().await.unwrap().is_failure());
    }
}
