use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};

use crate::LosError;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of named worker threads draining a shared job queue.
///
/// Dropping the pool closes the queue and joins every worker once the
/// already queued jobs have run.
#[derive(Debug)]
pub(crate) struct WorkerPool {
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn new(size: usize) -> Result<Self, LosError> {
        if size == 0 {
            return Err(LosError::NoWorkers);
        }
        let (jobs, queue) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let queue = queue.clone();
            let handle = thread::Builder::new()
                .name(format!("los-worker-{index}"))
                .spawn(move || {
                    for job in queue.iter() {
                        job();
                    }
                })
                .map_err(LosError::SpawnWorker)?;
            workers.push(handle);
        }
        log::info!(
            "using {size} thread{} to compute line of sight",
            if size == 1 { "" } else { "s" }
        );
        Ok(Self {
            jobs: Some(jobs),
            workers,
        })
    }

    pub(crate) fn size(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn submit(&self, job: Job) -> Result<(), LosError> {
        self.jobs
            .as_ref()
            .ok_or(LosError::WorkerLost)?
            .send(job)
            .map_err(|_| LosError::WorkerLost)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.jobs.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::warn!("line-of-sight worker exited by panic");
            }
        }
    }
}
