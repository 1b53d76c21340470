//! Agent job queues: the only write channel the gating engine uses.
//!
//! The engine never manipulates job internals. It issues three commands
//! through [`JobQueue`] (enqueue at front, enqueue at tail, interrupt the
//! running job) and asks one question back (is this job still queued?).
//! Logical asynchrony lives here: a queued fetch represents future ticks of
//! an agent walking to an item, not a blocking call.
//!
//! [`JobBoard`] keeps one queue per agent. Front-priority entries form an
//! urgent lane at the head of the queue: a new front entry lands behind the
//! existing urgent entries but ahead of every normal one.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use toolgate_types::{AgentId, CellPos, ItemId, JobId, JobPriority, StatId, WorkId};
use tracing::debug;

/// A job the gating engine can ask an agent to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueuedJob {
    /// Walk to a ground item, pick it up, and equip it.
    FetchAndEquip {
        /// The item to fetch.
        item: ItemId,
        /// The stat the item is being fetched for.
        stat: StatId,
    },
    /// Drop a carried tool where the agent stands.
    DropTool {
        /// The tool to drop.
        item: ItemId,
    },
    /// Perform a unit of work at a target cell.
    Work {
        /// The work to perform.
        work: WorkId,
        /// Target cell.
        target: CellPos,
    },
}

/// An entry on an agent's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    /// Unique identifier of this queued job.
    pub id: JobId,
    /// What to do.
    pub job: QueuedJob,
    /// Lane the entry was queued in.
    pub priority: JobPriority,
}

/// Job queue commands exposed to the gating engine.
pub trait JobQueue {
    /// Queue `job` ahead of every non-urgent job.
    fn enqueue_front(&mut self, agent: AgentId, job: QueuedJob) -> JobId;

    /// Append `job` at the tail.
    fn enqueue_tail(&mut self, agent: AgentId, job: QueuedJob) -> JobId;

    /// Stop the running job so the head of the queue starts now.
    fn interrupt_current(&mut self, agent: AgentId);

    /// Whether `job` is still running or waiting for `agent`.
    fn is_queued(&self, agent: AgentId, job: JobId) -> bool;

    /// Queue `job` according to `priority`.
    fn enqueue(&mut self, agent: AgentId, job: QueuedJob, priority: JobPriority) -> JobId {
        match priority {
            JobPriority::Front => self.enqueue_front(agent, job),
            JobPriority::Normal => self.enqueue_tail(agent, job),
        }
    }
}

/// One agent's running job and pending queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentQueue {
    current: Option<JobEntry>,
    pending: VecDeque<JobEntry>,
}

impl AgentQueue {
    /// Index of the first non-urgent pending entry.
    fn urgent_lane_end(&self) -> usize {
        self.pending
            .iter()
            .position(|e| e.priority != JobPriority::Front)
            .unwrap_or(self.pending.len())
    }

    fn contains(&self, id: JobId) -> bool {
        self.current.is_some_and(|e| e.id == id) || self.pending.iter().any(|e| e.id == id)
    }
}

/// In-memory per-agent job queues.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobBoard {
    queues: BTreeMap<AgentId, AgentQueue>,
}

impl JobBoard {
    /// Create an empty board.
    pub const fn new() -> Self {
        Self {
            queues: BTreeMap::new(),
        }
    }

    /// The job `agent` is running, if any.
    pub fn current(&self, agent: AgentId) -> Option<&JobEntry> {
        self.queues.get(&agent).and_then(|q| q.current.as_ref())
    }

    /// Jobs waiting for `agent`, in execution order.
    pub fn pending(&self, agent: AgentId) -> impl Iterator<Item = &JobEntry> {
        self.queues.get(&agent).into_iter().flat_map(|q| q.pending.iter())
    }

    /// Running plus waiting jobs for `agent`.
    pub fn len(&self, agent: AgentId) -> usize {
        self.queues.get(&agent).map_or(0, |q| {
            q.pending.len().saturating_add(usize::from(q.current.is_some()))
        })
    }

    /// Whether `agent` has nothing running or waiting.
    pub fn is_idle(&self, agent: AgentId) -> bool {
        self.len(agent) == 0
    }

    /// Start the head of the queue if nothing is running.
    pub fn start_next(&mut self, agent: AgentId) -> Option<&JobEntry> {
        let queue = self.queues.get_mut(&agent)?;
        if queue.current.is_none() {
            queue.current = queue.pending.pop_front();
        }
        queue.current.as_ref()
    }

    /// Finish the running job and return it.
    pub fn complete_current(&mut self, agent: AgentId) -> Option<JobEntry> {
        self.queues.get_mut(&agent)?.current.take()
    }

    /// Drop every job for `agent` (death, capture).
    pub fn clear_agent(&mut self, agent: AgentId) {
        self.queues.remove(&agent);
    }

    fn insert(&mut self, agent: AgentId, job: QueuedJob, priority: JobPriority) -> JobId {
        let entry = JobEntry {
            id: JobId::new(),
            job,
            priority,
        };
        let queue = self.queues.entry(agent).or_default();
        match priority {
            JobPriority::Front => {
                let at = queue.urgent_lane_end();
                queue.pending.insert(at, entry);
            }
            JobPriority::Normal => queue.pending.push_back(entry),
        }
        debug!(agent = %agent, job = ?job, ?priority, "job queued");
        entry.id
    }
}

impl JobQueue for JobBoard {
    fn enqueue_front(&mut self, agent: AgentId, job: QueuedJob) -> JobId {
        self.insert(agent, job, JobPriority::Front)
    }

    fn enqueue_tail(&mut self, agent: AgentId, job: QueuedJob) -> JobId {
        self.insert(agent, job, JobPriority::Normal)
    }

    fn interrupt_current(&mut self, agent: AgentId) {
        let Some(queue) = self.queues.get_mut(&agent) else {
            return;
        };
        if let Some(running) = queue.current.take() {
            // Resume after the urgent lane.
            let at = queue.urgent_lane_end();
            queue.pending.insert(at, running);
            debug!(agent = %agent, job = %running.id, "current job interrupted");
        }
    }

    fn is_queued(&self, agent: AgentId, job: JobId) -> bool {
        self.queues.get(&agent).is_some_and(|q| q.contains(job))
    }
}
