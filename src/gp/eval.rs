//! Concurrent fitness evaluation.
//!
//! The [`Evaluator`] owns a fixed-size rayon pool. A batch is split into one
//! contiguous chunk per worker (the last chunk absorbs the remainder); each
//! worker scores the unevaluated individuals of its chunk and the driver
//! blocks until every chunk is done.
//!
//! The run-wide aggregates (best-so-far, evaluation count, optimum flag,
//! last improvement) live behind a single [`Mutex`] and are the only state
//! workers share. Workers never draw random numbers.

use super::individual::Individual;
use super::types::Problem;
use crate::error::GpError;
use crate::tree::Primitive;
use log::error;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard};

/// Run-wide evaluation aggregates.
#[derive(Debug, Clone)]
pub struct EvalState<P> {
    /// Fittest individual seen so far (a deep copy).
    pub best: Option<Individual<P>>,
    /// Individuals scored so far.
    pub evaluations: u64,
    /// Whether the best fitness reached the optimum.
    pub found_optimal: bool,
    /// Generation in which `best` was found.
    pub last_improvement_generation: usize,
    /// Evaluation count at which `best` was found.
    pub last_improvement_evaluations: u64,
}

impl<P> Default for EvalState<P> {
    fn default() -> Self {
        Self {
            best: None,
            evaluations: 0,
            found_optimal: false,
            last_improvement_generation: 0,
            last_improvement_evaluations: 0,
        }
    }
}

/// Parallel fitness evaluator.
pub struct Evaluator<P> {
    pool: ThreadPool,
    threads: usize,
    optimal_fitness: f64,
    state: Mutex<EvalState<P>>,
}

impl<P: Primitive> Evaluator<P> {
    /// Creates an evaluator with `threads` workers.
    pub fn new(threads: usize, optimal_fitness: f64) -> Result<Self, GpError> {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("gp-eval-{i}"))
            .build()
            .map_err(|e| GpError::WorkerFailed(e.to_string()))?;
        Ok(Self {
            pool,
            threads,
            optimal_fitness,
            state: Mutex::new(EvalState::default()),
        })
    }

    /// Scores every unevaluated individual of `batch`.
    ///
    /// `generation` is recorded when the batch yields a new best.
    ///
    /// # Errors
    ///
    /// [`GpError::WorkerFailed`] if a worker panicked or the shared state
    /// was poisoned. The run cannot continue after this.
    pub fn evaluate<Pr>(
        &self,
        problem: &Pr,
        batch: &mut [Individual<P>],
        generation: usize,
    ) -> Result<(), GpError>
    where
        Pr: Problem<Primitive = P>,
    {
        if batch.is_empty() {
            return Ok(());
        }
        let chunk = batch.len() / self.threads;
        let failure: Mutex<Option<GpError>> = Mutex::new(None);

        self.pool.scope(|scope| {
            let failure = &failure;
            let mut rest = batch;
            for t in 0..self.threads {
                let take = if t + 1 == self.threads {
                    rest.len()
                } else {
                    chunk
                };
                let (head, tail) = std::mem::take(&mut rest).split_at_mut(take);
                rest = tail;
                if head.is_empty() {
                    continue;
                }
                scope.spawn(move |_| {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        self.evaluate_chunk(problem, head, generation)
                    }));
                    let err = match outcome {
                        Ok(Ok(())) => return,
                        Ok(Err(e)) => e,
                        Err(payload) => GpError::WorkerFailed(panic_message(payload.as_ref())),
                    };
                    if let Ok(mut slot) = failure.lock() {
                        slot.get_or_insert(err);
                    }
                });
            }
        });

        let failure = failure
            .into_inner()
            .map_err(|_| GpError::WorkerFailed("failure slot poisoned".into()))?;
        match failure {
            Some(e) => {
                error!("evaluation aborted: {e}");
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn evaluate_chunk<Pr>(
        &self,
        problem: &Pr,
        chunk: &mut [Individual<P>],
        generation: usize,
    ) -> Result<(), GpError>
    where
        Pr: Problem<Primitive = P>,
    {
        for individual in chunk.iter_mut() {
            if individual.is_evaluated() {
                continue;
            }
            let evaluation = problem.evaluate(individual);
            individual.record_evaluation(evaluation);

            let mut state = self.lock()?;
            state.evaluations += 1;
            let improved = state
                .best
                .as_ref()
                .map_or(true, |best| individual.fitness() > best.fitness());
            if improved {
                state.best = Some(individual.deep_copy());
                state.last_improvement_generation = generation;
                state.last_improvement_evaluations = state.evaluations;
                if individual.fitness() >= self.optimal_fitness {
                    state.found_optimal = true;
                }
            }
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, EvalState<P>>, GpError> {
        self.state
            .lock()
            .map_err(|_| GpError::WorkerFailed("evaluation state poisoned".into()))
    }

    /// Snapshot of the aggregates.
    pub fn state(&self) -> Result<EvalState<P>, GpError> {
        Ok(self.lock()?.clone())
    }

    /// Individuals scored so far.
    pub fn evaluations(&self) -> Result<u64, GpError> {
        Ok(self.lock()?.evaluations)
    }

    pub fn found_optimal(&self) -> Result<bool, GpError> {
        Ok(self.lock()?.found_optimal)
    }

    /// Fitness of the best individual so far, if any.
    pub fn best_fitness(&self) -> Result<Option<f64>, GpError> {
        Ok(self.lock()?.best.as_ref().map(Individual::fitness))
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
